//! Storage layer
//!
//! The account store and ledger are traits so the engine can run over
//! PostgreSQL in production and an in-process store in tests. The only
//! way to change a balance is `WalletStore::commit`, which applies a set
//! of adjustments together with their ledger entries as one unit.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{
    Account, AccountNumber, BalanceAdjustment, Page, PageRequest, PinHash, Transaction,
    WalletError,
};

/// Default limit for a single storage call
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Account records: identity, balances and PIN hash
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, WalletError>;

    async fn get_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, WalletError>;

    /// Persist a freshly opened account.
    ///
    /// Fails with `DuplicateAccount` when the email or account number is taken.
    async fn create_account(&self, account: Account) -> Result<Account, WalletError>;

    async fn set_pin_hash(&self, id: Uuid, hash: PinHash) -> Result<(), WalletError>;
}

/// Append-only transaction record
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append a single entry. Fails with `AccountNotFound` for an unknown owner.
    async fn append(&self, entry: Transaction) -> Result<(), WalletError>;

    /// Entries owned by an account, newest first
    async fn query_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> Result<Page<Transaction>, WalletError>;
}

#[async_trait]
pub trait WalletStore: AccountStore + Ledger {
    /// Apply every adjustment and append its ledger entry, or none of them.
    ///
    /// An adjustment that would take a balance below zero fails the whole
    /// unit with `InsufficientFunds`. Returned entries are in input order.
    async fn commit(
        &self,
        adjustments: Vec<BalanceAdjustment>,
    ) -> Result<Vec<Transaction>, WalletError>;

    /// An account together with a page of its ledger, read from one
    /// snapshot: no commit lands between the two reads.
    async fn account_with_history(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> Result<Option<(Account, Page<Transaction>)>, WalletError>;

    /// Single-adjustment case of `commit`
    async fn adjust_balance(
        &self,
        adjustment: BalanceAdjustment,
    ) -> Result<Transaction, WalletError> {
        let mut entries = self.commit(vec![adjustment]).await?;
        entries
            .pop()
            .ok_or_else(|| WalletError::Internal("commit returned no ledger entry".to_string()))
    }
}

/// Bound a storage call; expiry surfaces as `StorageUnavailable`.
pub(crate) async fn with_timeout<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, WalletError>
where
    F: Future<Output = Result<T, WalletError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "Storage call timed out");
            Err(WalletError::StorageUnavailable(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}
