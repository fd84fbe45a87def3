//! Command Handlers module
//!
//! The transaction engine: each handler runs one balance-changing
//! operation against the wallet store.

mod account_handler;
mod commands;
mod deposit_handler;
mod transfer_handler;


pub use account_handler::CreateAccountHandler;
pub use commands::*;
pub use deposit_handler::DepositHandler;
pub use transfer_handler::TransferHandler;
