//! Domain module
//!
//! Core wallet types: money, accounts, ledger entries and the result
//! envelope. Nothing here touches storage or the network.

pub mod account;
pub mod amount;
pub mod context;
pub mod currency;
pub mod error;
pub mod page;
pub mod response;
pub mod transaction;

pub use account::{
    Account, AccountNumber, Balances, DuplicateKey, InvalidAccountNumber, NewAccount, PinHash,
};
pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use currency::{Currency, UnsupportedCurrency};
pub use error::WalletError;
pub use page::{Page, PageMeta, PageRequest};
pub use response::{ResponseStatus, WalletResponse};
pub use transaction::{
    BalanceAdjustment, Counterparty, Transaction, TransactionStatus, TransactionType,
};
