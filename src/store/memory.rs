//! In-process wallet store
//!
//! Each account lives in its own slot together with the ledger entries it
//! owns, behind an async mutex. A commit locks every slot it touches in
//! ascending account-id order, validates all adjustments against the
//! locked balances and only then applies them, so there is no await point
//! between the first write and the last.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::{with_timeout, AccountStore, Ledger, WalletStore, DEFAULT_STORAGE_TIMEOUT};
use crate::domain::{
    Account, AccountNumber, Balance, BalanceAdjustment, Currency, DuplicateKey, Page,
    PageRequest, PinHash, Transaction, WalletError,
};

struct AccountSlot {
    account: Account,
    ledger: Vec<Transaction>,
}

#[derive(Default)]
struct Index {
    slots: HashMap<Uuid, Arc<Mutex<AccountSlot>>>,
    by_number: HashMap<AccountNumber, Uuid>,
    by_email: HashMap<String, Uuid>,
}

#[derive(Clone)]
pub struct MemoryStore {
    index: Arc<RwLock<Index>>,
    timeout: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            index: Arc::new(RwLock::new(Index::default())),
            timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn slot(&self, id: Uuid) -> Option<Arc<Mutex<AccountSlot>>> {
        self.index.read().await.slots.get(&id).cloned()
    }

    async fn require_slot(&self, id: Uuid) -> Result<Arc<Mutex<AccountSlot>>, WalletError> {
        self.slot(id)
            .await
            .ok_or_else(|| WalletError::AccountNotFound(id.to_string()))
    }

    async fn commit_locked(
        &self,
        adjustments: Vec<BalanceAdjustment>,
    ) -> Result<Vec<Transaction>, WalletError> {
        // Ascending id order for every caller rules out lock cycles
        let ids: BTreeSet<Uuid> = adjustments.iter().map(|a| a.account_id).collect();
        let mut slots = Vec::with_capacity(ids.len());
        for id in &ids {
            slots.push((*id, self.require_slot(*id).await?));
        }

        let mut guards: BTreeMap<Uuid, OwnedMutexGuard<AccountSlot>> = BTreeMap::new();
        for (id, slot) in slots {
            guards.insert(id, slot.lock_owned().await);
        }

        // Validate everything before touching anything
        let mut staged: BTreeMap<(Uuid, Currency), Balance> = BTreeMap::new();
        let mut balances_after = Vec::with_capacity(adjustments.len());
        for adj in &adjustments {
            let key = (adj.account_id, adj.currency);
            let current = match staged.get(&key) {
                Some(balance) => *balance,
                None => guards[&adj.account_id].account.balance(adj.currency),
            };
            let next = current.adjust(adj.delta())?;
            staged.insert(key, next);
            balances_after.push(next);
        }

        let now = Utc::now();
        for ((id, currency), balance) in staged {
            if let Some(guard) = guards.get_mut(&id) {
                guard.account.balances.set(currency, balance);
                guard.account.updated_at = now;
            }
        }

        let mut entries = Vec::with_capacity(adjustments.len());
        for (adj, balance_after) in adjustments.into_iter().zip(balances_after) {
            let entry = adj.into_transaction(balance_after);
            if let Some(guard) = guards.get_mut(&entry.account_id) {
                guard.ledger.push(entry.clone());
            }
            entries.push(entry);
        }

        Ok(entries)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, WalletError> {
        with_timeout(self.timeout, "get_by_id", async {
            match self.slot(id).await {
                Some(slot) => Ok(Some(slot.lock().await.account.clone())),
                None => Ok(None),
            }
        })
        .await
    }

    async fn get_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, WalletError> {
        with_timeout(self.timeout, "get_by_account_number", async {
            let id = self.index.read().await.by_number.get(number).copied();
            match id {
                Some(id) => self.get_by_id(id).await,
                None => Ok(None),
            }
        })
        .await
    }

    async fn create_account(&self, account: Account) -> Result<Account, WalletError> {
        with_timeout(self.timeout, "create_account", async {
            let mut index = self.index.write().await;
            if index.by_email.contains_key(account.email()) {
                return Err(WalletError::DuplicateAccount(DuplicateKey::Email));
            }
            if index.by_number.contains_key(account.account_number()) {
                return Err(WalletError::DuplicateAccount(DuplicateKey::AccountNumber));
            }

            let id = account.id();
            index.by_email.insert(account.email().to_string(), id);
            index.by_number.insert(account.account_number().clone(), id);
            index.slots.insert(
                id,
                Arc::new(Mutex::new(AccountSlot {
                    account: account.clone(),
                    ledger: Vec::new(),
                })),
            );
            Ok(account)
        })
        .await
    }

    async fn set_pin_hash(&self, id: Uuid, hash: PinHash) -> Result<(), WalletError> {
        with_timeout(self.timeout, "set_pin_hash", async {
            let slot = self.require_slot(id).await?;
            let mut slot = slot.lock().await;
            slot.account.pin_hash = Some(hash);
            slot.account.updated_at = Utc::now();
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl Ledger for MemoryStore {
    async fn append(&self, entry: Transaction) -> Result<(), WalletError> {
        with_timeout(self.timeout, "append", async {
            let slot = self.require_slot(entry.account_id).await?;
            slot.lock().await.ledger.push(entry);
            Ok(())
        })
        .await
    }

    async fn query_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> Result<Page<Transaction>, WalletError> {
        with_timeout(self.timeout, "query_by_owner", async {
            let Some(slot) = self.slot(owner).await else {
                return Ok(Page::empty(page));
            };
            let slot = slot.lock().await;
            Ok(page_of(&slot.ledger, page))
        })
        .await
    }
}

/// Newest-first page over an owner's entries
fn page_of(ledger: &[Transaction], page: PageRequest) -> Page<Transaction> {
    let items = ledger
        .iter()
        .rev()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    Page::new(items, page, ledger.len() as u64)
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn commit(
        &self,
        adjustments: Vec<BalanceAdjustment>,
    ) -> Result<Vec<Transaction>, WalletError> {
        if adjustments.is_empty() {
            return Ok(Vec::new());
        }
        with_timeout(self.timeout, "commit", self.commit_locked(adjustments)).await
    }

    async fn account_with_history(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> Result<Option<(Account, Page<Transaction>)>, WalletError> {
        with_timeout(self.timeout, "account_with_history", async {
            let Some(slot) = self.slot(id).await else {
                return Ok(None);
            };
            let slot = slot.lock().await;
            Ok(Some((slot.account.clone(), page_of(&slot.ledger, page))))
        })
        .await
    }
}
