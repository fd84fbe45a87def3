//! Wallet Engine Library
//!
//! Multi-currency wallets with PIN-authorized transfers and an append-only
//! transaction ledger. Re-exports modules for integration testing and the
//! server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod query;
pub mod store;

pub use config::{Config, StorageBackend};
pub use domain::{Amount, AmountError, Balance, Currency, OperationContext, WalletError};
pub use error::AppError;
