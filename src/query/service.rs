//! Query Service
//!
//! Read-side access to balances, history and the account summary.
//! Every call is a pure read over the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Account, AccountNumber, Balances, PageMeta, PageRequest, Transaction, WalletError,
    WalletResponse,
};
use crate::store::WalletStore;

pub const DEFAULT_RECENT_ACTIVITY_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    /// Entries shown in the summary's recent activity excerpt
    pub recent_activity_limit: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            recent_activity_limit: DEFAULT_RECENT_ACTIVITY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistory {
    pub transactions: Vec<Transaction>,
    pub metadata: PageMeta,
}

/// Public profile; never carries the PIN hash
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub account_number: AccountNumber,
    pub firstname: String,
    pub surname: String,
    pub othernames: String,
    pub email: String,
    pub phonenumber: String,
    pub has_pin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            account_number: account.account_number().clone(),
            firstname: account.firstname().to_string(),
            surname: account.surname().to_string(),
            othernames: account.othernames().to_string(),
            email: account.email().to_string(),
            phonenumber: account.phonenumber().to_string(),
            has_pin: account.has_pin(),
            created_at: account.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account: AccountProfile,
    pub balances: Balances,
    pub recent_transactions: Vec<Transaction>,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn WalletStore>,
    settings: QuerySettings,
}

impl QueryService {
    pub fn new(store: Arc<dyn WalletStore>, settings: QuerySettings) -> Self {
        Self { store, settings }
    }

    async fn load(&self, account_id: Uuid) -> Result<Account, WalletError> {
        self.store
            .get_by_id(account_id)
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))
    }

    /// Current balance in every currency
    pub async fn balance(&self, account_id: Uuid) -> Result<WalletResponse<Balances>, WalletError> {
        let account = self.load(account_id).await?;
        Ok(WalletResponse::ok(
            "Account balance retrieved successfully",
            account.balances().clone(),
        ))
    }

    /// Paginated ledger, newest first
    pub async fn history(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<WalletResponse<TransactionHistory>, WalletError> {
        self.load(account_id).await?;
        let page = self.store.query_by_owner(account_id, page).await?;

        tracing::debug!(
            account_id = %account_id,
            page = page.page,
            returned = page.items.len(),
            total = page.total_count,
            "Transaction history fetched"
        );

        let metadata = page.metadata();
        Ok(WalletResponse::ok(
            "Transaction history retrieved successfully",
            TransactionHistory {
                transactions: page.items,
                metadata,
            },
        ))
    }

    /// Profile, balances and the most recent entries, from one snapshot
    pub async fn summary(
        &self,
        account_id: Uuid,
    ) -> Result<WalletResponse<AccountSummary>, WalletError> {
        let (account, recent) = self
            .store
            .account_with_history(
                account_id,
                PageRequest::new(Some(1), Some(self.settings.recent_activity_limit)),
            )
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?;

        Ok(WalletResponse::ok(
            "Account summary retrieved successfully",
            AccountSummary {
                account: AccountProfile::from(&account),
                balances: account.balances().clone(),
                recent_transactions: recent.items,
            },
        ))
    }
}
