//! PostgreSQL wallet store
//!
//! Balance changes are conditional updates inside one database
//! transaction; a row whose balance would leave `[0, cap]` is simply not
//! updated, which the store reports as `InsufficientFunds` (or
//! `InvalidAmount` past the cap) and rolls back.
//!
//! Writes are bounded server-side with `statement_timeout` and
//! `lock_timeout` rather than by cancelling the future, so a caller never
//! sees `StorageUnavailable` for a write that Postgres went on to commit.
//! Reads are bounded client-side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

use super::{with_timeout, AccountStore, Ledger, WalletStore, DEFAULT_STORAGE_TIMEOUT};
use crate::domain::amount::max_amount;
use crate::domain::{
    Account, AccountNumber, Amount, AmountError, Balance, BalanceAdjustment, Balances, Currency,
    DuplicateKey, Page, PageRequest, PinHash, Transaction, TransactionStatus, TransactionType,
    WalletError,
};

type AccountRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type TransactionRow = (
    Uuid,
    Uuid,
    Uuid,
    Option<Uuid>,
    Option<String>,
    String,
    Decimal,
    String,
    String,
    Decimal,
    String,
    DateTime<Utc>,
);

const ACCOUNT_COLUMNS: &str = "id, account_number, firstname, surname, othernames, email, \
     phonenumber, pin_hash, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, operation_id, account_id, counterparty_account_id, \
     counterparty_account_number, currency, amount, transaction_type, status, balance_after, \
     description, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Read-only transaction over one consistent snapshot
    async fn snapshot(&self) -> Result<sqlx::Transaction<'static, Postgres>, WalletError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        Ok(tx)
    }

    async fn load_account(&self, key: AccountKey<'_>) -> Result<Option<Account>, WalletError> {
        let mut tx = self.snapshot().await?;
        let account = fetch_account(&mut tx, key).await?;
        tx.commit().await.map_err(storage_error)?;
        Ok(account)
    }

    async fn fetch_history(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> Result<Page<Transaction>, WalletError> {
        let mut tx = self.snapshot().await?;
        let history = fetch_page(&mut tx, owner, page).await?;
        tx.commit().await.map_err(storage_error)?;
        Ok(history)
    }

    async fn load_account_with_history(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> Result<Option<(Account, Page<Transaction>)>, WalletError> {
        let mut tx = self.snapshot().await?;
        let Some(account) = fetch_account(&mut tx, AccountKey::Id(id)).await? else {
            return Ok(None);
        };
        let history = fetch_page(&mut tx, id, page).await?;
        tx.commit().await.map_err(storage_error)?;
        Ok(Some((account, history)))
    }

    /// Write transaction whose statements and lock waits are bounded by
    /// the storage timeout on the server
    async fn write_tx(&self) -> Result<sqlx::Transaction<'static, Postgres>, WalletError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // 0 would disable the limits
        let limit_ms = self.timeout.as_millis().max(1);
        sqlx::query(&format!("SET LOCAL statement_timeout = {limit_ms}"))
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        sqlx::query(&format!("SET LOCAL lock_timeout = {limit_ms}"))
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        Ok(tx)
    }

    async fn commit_in_tx(
        &self,
        adjustments: Vec<BalanceAdjustment>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let mut tx = self.write_tx().await?;

        // Row locks are taken in ascending (account, currency) order
        let mut order: Vec<usize> = (0..adjustments.len()).collect();
        order.sort_by_key(|&i| (adjustments[i].account_id, adjustments[i].currency));

        let cap = max_amount();
        let mut balances_after: Vec<Option<Decimal>> = vec![None; adjustments.len()];
        for i in order {
            let adj = &adjustments[i];
            let delta = adj.delta();
            let updated: Option<Decimal> = sqlx::query_scalar(
                r#"
                UPDATE wallet_balances
                SET balance = balance + $3, updated_at = NOW()
                WHERE account_id = $1 AND currency = $2
                  AND balance + $3 >= 0 AND balance + $3 <= $4
                RETURNING balance
                "#,
            )
            .bind(adj.account_id)
            .bind(adj.currency.as_str())
            .bind(delta)
            .bind(cap)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?;

            match updated {
                Some(balance) => balances_after[i] = Some(balance),
                None => {
                    let available: Option<Decimal> = sqlx::query_scalar(
                        "SELECT balance FROM wallet_balances WHERE account_id = $1 AND currency = $2",
                    )
                    .bind(adj.account_id)
                    .bind(adj.currency.as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(storage_error)?;

                    return Err(match available {
                        Some(_) if delta > Decimal::ZERO => AmountError::Overflow.into(),
                        Some(available) => WalletError::insufficient_funds(-delta, available),
                        None => WalletError::AccountNotFound(adj.account_id.to_string()),
                    });
                }
            }
        }

        let touched: Vec<Uuid> = adjustments.iter().map(|a| a.account_id).collect();
        sqlx::query("UPDATE wallet_accounts SET updated_at = NOW() WHERE id = ANY($1)")
            .bind(touched)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let mut entries = Vec::with_capacity(adjustments.len());
        for (adj, after) in adjustments.into_iter().zip(balances_after) {
            let after = after.ok_or_else(|| {
                WalletError::Internal("adjustment skipped during commit".to_string())
            })?;
            let balance_after = Balance::new(after).map_err(|e| {
                WalletError::Internal(format!("stored balance out of range: {e}"))
            })?;
            let entry = adj.into_transaction(balance_after);
            insert_transaction(&mut tx, &entry).await?;
            entries.push(entry);
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(entries)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), WalletError> {
        let mut tx = self.write_tx().await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_accounts (
                id, account_number, firstname, surname, othernames,
                email, phonenumber, pin_hash, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $9)
            "#,
        )
        .bind(account.id())
        .bind(account.account_number().as_str())
        .bind(account.firstname())
        .bind(account.surname())
        .bind(account.othernames())
        .bind(account.email())
        .bind(account.phonenumber())
        .bind(account.created_at())
        .bind(account.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        for (currency, balance) in account.balances().iter() {
            sqlx::query(
                r#"
                INSERT INTO wallet_balances (account_id, currency, balance)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(account.id())
            .bind(currency.as_str())
            .bind(balance.value())
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }
}

enum AccountKey<'a> {
    Id(Uuid),
    Number(&'a AccountNumber),
}

async fn fetch_account(
    conn: &mut PgConnection,
    key: AccountKey<'_>,
) -> Result<Option<Account>, WalletError> {
    let column = match key {
        AccountKey::Id(_) => "id",
        AccountKey::Number(_) => "account_number",
    };
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM wallet_accounts WHERE {column} = $1");
    let query = sqlx::query_as::<_, AccountRow>(&sql);
    let query = match key {
        AccountKey::Id(id) => query.bind(id),
        AccountKey::Number(number) => query.bind(number.as_str()),
    };
    let Some(row) = query.fetch_optional(&mut *conn).await.map_err(storage_error)? else {
        return Ok(None);
    };

    let balances: Vec<(String, Decimal)> =
        sqlx::query_as("SELECT currency, balance FROM wallet_balances WHERE account_id = $1")
            .bind(row.0)
            .fetch_all(&mut *conn)
            .await
            .map_err(storage_error)?;

    account_from_row(row, balances).map(Some)
}

async fn fetch_page(
    conn: &mut PgConnection,
    owner: Uuid,
    page: PageRequest,
) -> Result<Page<Transaction>, WalletError> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM wallet_transactions WHERE account_id = $1")
            .bind(owner)
            .fetch_one(&mut *conn)
            .await
            .map_err(storage_error)?;

    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM wallet_transactions \
         WHERE account_id = $1 ORDER BY seq DESC LIMIT $2 OFFSET $3"
    );
    let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
        .bind(owner)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&mut *conn)
        .await
        .map_err(storage_error)?;

    let items = rows
        .into_iter()
        .map(transaction_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total.max(0) as u64))
}

#[async_trait]
impl AccountStore for PgStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, WalletError> {
        with_timeout(self.timeout, "get_by_id", self.load_account(AccountKey::Id(id))).await
    }

    async fn get_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, WalletError> {
        with_timeout(
            self.timeout,
            "get_by_account_number",
            self.load_account(AccountKey::Number(number)),
        )
        .await
    }

    async fn create_account(&self, account: Account) -> Result<Account, WalletError> {
        self.insert_account(&account).await?;
        Ok(account)
    }

    async fn set_pin_hash(&self, id: Uuid, hash: PinHash) -> Result<(), WalletError> {
        let mut tx = self.write_tx().await?;
        let rows = sqlx::query(
            "UPDATE wallet_accounts SET pin_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hash.as_str())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?
        .rows_affected();

        if rows == 0 {
            return Err(WalletError::AccountNotFound(id.to_string()));
        }
        tx.commit().await.map_err(storage_error)
    }
}

#[async_trait]
impl Ledger for PgStore {
    async fn append(&self, entry: Transaction) -> Result<(), WalletError> {
        let mut tx = self.write_tx().await?;
        insert_transaction(&mut tx, &entry).await?;
        tx.commit().await.map_err(storage_error)
    }

    async fn query_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> Result<Page<Transaction>, WalletError> {
        with_timeout(self.timeout, "query_by_owner", self.fetch_history(owner, page)).await
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn commit(
        &self,
        adjustments: Vec<BalanceAdjustment>,
    ) -> Result<Vec<Transaction>, WalletError> {
        if adjustments.is_empty() {
            return Ok(Vec::new());
        }
        // Not wrapped in with_timeout: the transaction carries its own limits
        self.commit_in_tx(adjustments).await
    }

    async fn account_with_history(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> Result<Option<(Account, Page<Transaction>)>, WalletError> {
        with_timeout(
            self.timeout,
            "account_with_history",
            self.load_account_with_history(id, page),
        )
        .await
    }
}

async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    entry: &Transaction,
) -> Result<(), WalletError> {
    sqlx::query(
        r#"
        INSERT INTO wallet_transactions (
            id, operation_id, account_id, counterparty_account_id,
            counterparty_account_number, currency, amount, transaction_type,
            status, balance_after, description, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(entry.id)
    .bind(entry.operation_id)
    .bind(entry.account_id)
    .bind(entry.counterparty_account_id)
    .bind(entry.counterparty_account_number.as_ref().map(|n| n.as_str()))
    .bind(entry.currency.as_str())
    .bind(entry.amount.value())
    .bind(entry.transaction_type.as_str())
    .bind(entry.status.as_str())
    .bind(entry.balance_after.value())
    .bind(&entry.description)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        // 23503: foreign key violation, the owner does not exist
        let unknown_owner = matches!(
            &e,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")
        );
        if unknown_owner {
            WalletError::AccountNotFound(entry.account_id.to_string())
        } else {
            storage_error(e)
        }
    })?;
    Ok(())
}

fn account_from_row(
    row: AccountRow,
    balances: Vec<(String, Decimal)>,
) -> Result<Account, WalletError> {
    let (id, number, firstname, surname, othernames, email, phonenumber, pin_hash, created_at, updated_at) =
        row;

    let balances = balances
        .into_iter()
        .map(|(currency, balance)| -> Result<(Currency, Balance), WalletError> {
            let currency = currency.parse::<Currency>().map_err(corrupt)?;
            let balance = Balance::new(balance).map_err(corrupt)?;
            Ok((currency, balance))
        })
        .collect::<Result<Balances, WalletError>>()?;

    Ok(Account {
        id,
        account_number: number.parse::<AccountNumber>().map_err(corrupt)?,
        firstname,
        surname,
        othernames,
        email,
        phonenumber,
        balances,
        pin_hash: pin_hash.map(PinHash::new),
        created_at,
        updated_at,
    })
}

fn transaction_from_row(row: TransactionRow) -> Result<Transaction, WalletError> {
    let (
        id,
        operation_id,
        account_id,
        counterparty_account_id,
        counterparty_account_number,
        currency,
        amount,
        transaction_type,
        status,
        balance_after,
        description,
        created_at,
    ) = row;

    Ok(Transaction {
        id,
        operation_id,
        account_id,
        counterparty_account_id,
        counterparty_account_number: counterparty_account_number
            .map(|n| n.parse::<AccountNumber>())
            .transpose()
            .map_err(corrupt)?,
        currency: currency.parse::<Currency>().map_err(corrupt)?,
        amount: Amount::new(amount).map_err(corrupt)?,
        transaction_type: transaction_type
            .parse::<TransactionType>()
            .map_err(corrupt)?,
        status: status.parse::<TransactionStatus>().map_err(corrupt)?,
        balance_after: Balance::new(balance_after).map_err(corrupt)?,
        description,
        created_at,
    })
}

fn corrupt(err: impl std::fmt::Display) -> WalletError {
    WalletError::Internal(format!("corrupt row: {err}"))
}

/// Classify a driver error as transient, a uniqueness conflict, or a fault
pub(crate) fn storage_error(err: sqlx::Error) -> WalletError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::WorkerCrashed => WalletError::StorageUnavailable(err.to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // serialization failure, deadlock, lock timeout, statement timeout
            Some("40001") | Some("40P01") | Some("55P03") | Some("57014") => {
                WalletError::StorageUnavailable(db.message().to_string())
            }
            Some("23505") => {
                let key = if db.constraint().is_some_and(|c| c.contains("account_number")) {
                    DuplicateKey::AccountNumber
                } else {
                    DuplicateKey::Email
                };
                WalletError::DuplicateAccount(key)
            }
            _ => {
                tracing::error!(error = %err, "Database error");
                WalletError::Internal(db.message().to_string())
            }
        },
        _ => {
            tracing::error!(error = %err, "Database error");
            WalletError::Internal(err.to_string())
        }
    }
}
