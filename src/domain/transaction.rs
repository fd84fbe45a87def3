//! Ledger entries
//!
//! A `Transaction` is an immutable ledger record. A `BalanceAdjustment` is
//! the pending form of one: a signed change to a single balance together
//! with the entry that will record it once the store commits the change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Account, AccountNumber, Amount, Balance, Currency};

pub const DEPOSIT_DESCRIPTION: &str = "Wallet Deposit";
pub const TRANSFER_DESCRIPTION: &str = "Wallet Transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    TransferOut,
    TransferIn,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "Deposit",
            TransactionType::TransferOut => "TransferOut",
            TransactionType::TransferIn => "TransferIn",
        }
    }

    /// Whether this entry type decreases the owner's balance
    pub fn is_debit(&self) -> bool {
        matches!(self, TransactionType::TransferOut)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(TransactionType::Deposit),
            "TransferOut" => Ok(TransactionType::TransferOut),
            "TransferIn" => Ok(TransactionType::TransferIn),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Outcome recorded on a ledger entry. The engine only ever commits
/// `Success` entries; a rejected operation leaves no entry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "Success",
            TransactionStatus::Failed => "Failed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(TransactionStatus::Success),
            "Failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// The other side of a transfer, as seen from one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterparty {
    pub account_id: Uuid,
    pub account_number: AccountNumber,
}

impl From<&Account> for Counterparty {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id(),
            account_number: account.account_number().clone(),
        }
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    /// Shared by both legs of a transfer
    pub operation_id: Uuid,
    pub account_id: Uuid,
    pub counterparty_account_id: Option<Uuid>,
    pub counterparty_account_number: Option<AccountNumber>,
    pub currency: Currency,
    /// Magnitude; direction comes from `transaction_type`
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub balance_after: Balance,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign of its effect on the owner's balance
    pub fn signed_amount(&self) -> Decimal {
        if self.transaction_type.is_debit() {
            -self.amount.value()
        } else {
            self.amount.value()
        }
    }
}

/// A pending change to one balance plus the ledger entry that records it.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceAdjustment {
    pub entry_id: Uuid,
    pub operation_id: Uuid,
    pub account_id: Uuid,
    pub currency: Currency,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub counterparty: Option<Counterparty>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl BalanceAdjustment {
    /// Credit from outside the system
    pub fn deposit(
        account_id: Uuid,
        currency: Currency,
        amount: Amount,
        operation_id: Uuid,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            operation_id,
            account_id,
            currency,
            amount,
            transaction_type: TransactionType::Deposit,
            counterparty: None,
            description: DEPOSIT_DESCRIPTION.to_string(),
            created_at: at,
        }
    }

    /// Matched debit/credit legs of a transfer sharing one operation id
    pub fn transfer(
        sender: &Account,
        receiver: &Account,
        currency: Currency,
        amount: Amount,
        operation_id: Uuid,
        at: DateTime<Utc>,
    ) -> (Self, Self) {
        let debit = Self {
            entry_id: Uuid::new_v4(),
            operation_id,
            account_id: sender.id(),
            currency,
            amount,
            transaction_type: TransactionType::TransferOut,
            counterparty: Some(Counterparty::from(receiver)),
            description: TRANSFER_DESCRIPTION.to_string(),
            created_at: at,
        };
        let credit = Self {
            entry_id: Uuid::new_v4(),
            operation_id,
            account_id: receiver.id(),
            currency,
            amount,
            transaction_type: TransactionType::TransferIn,
            counterparty: Some(Counterparty::from(sender)),
            description: TRANSFER_DESCRIPTION.to_string(),
            created_at: at,
        };
        (debit, credit)
    }

    /// Signed change to the balance
    pub fn delta(&self) -> Decimal {
        if self.transaction_type.is_debit() {
            -self.amount.value()
        } else {
            self.amount.value()
        }
    }

    /// Seal the adjustment into its ledger entry once the new balance is known
    pub fn into_transaction(self, balance_after: Balance) -> Transaction {
        let (counterparty_account_id, counterparty_account_number) = match self.counterparty {
            Some(c) => (Some(c.account_id), Some(c.account_number)),
            None => (None, None),
        };
        Transaction {
            id: self.entry_id,
            operation_id: self.operation_id,
            account_id: self.account_id,
            counterparty_account_id,
            counterparty_account_number,
            currency: self.currency,
            amount: self.amount,
            transaction_type: self.transaction_type,
            status: TransactionStatus::Success,
            balance_after,
            description: self.description,
            created_at: self.created_at,
        }
    }
}
