//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::{AmountError, DuplicateKey};

/// Wallet engine errors
///
/// Everything except `StorageUnavailable` and `Internal` is a business
/// outcome: surfaced to the caller as-is and never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    /// Amount is zero, negative, non-numeric or out of range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// PIN is not exactly four digits
    #[error("Invalid pin. Kindly enter a valid 4 digit pin")]
    InvalidPinFormat,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transfer receiver could not be resolved from its account number
    #[error("Receiver account not found: {0}")]
    ReceiverNotFound(String),

    #[error("Cannot transfer funds to your own account")]
    SelfTransferNotAllowed,

    #[error("Transaction pin has not been set. Kindly create a pin")]
    PinNotSet,

    #[error("Invalid transaction pin")]
    AuthorizationFailed,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Account already exists: duplicate {0}")]
    DuplicateAccount(DuplicateKey),

    /// Transient: storage timed out or could not be reached. Safe to retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Non-transient fault (corrupt row, hashing failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// HTTP-equivalent status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidPinFormat
            | Self::ReceiverNotFound(_)
            | Self::SelfTransferNotAllowed
            | Self::PinNotSet
            | Self::InsufficientFunds { .. } => 400,
            Self::AuthorizationFailed => 401,
            Self::AccountNotFound(_) => 404,
            Self::DuplicateAccount(_) => 409,
            Self::StorageUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidPinFormat => "invalid_pin_format",
            Self::AccountNotFound(_) => "account_not_found",
            Self::ReceiverNotFound(_) => "receiver_not_found",
            Self::SelfTransferNotAllowed => "self_transfer_not_allowed",
            Self::PinNotSet => "pin_not_set",
            Self::AuthorizationFailed => "authorization_failed",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::DuplicateAccount(_) => "duplicate_account",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::StorageUnavailable(_) | Self::Internal(_))
    }

    /// Only transient storage failures may be retried by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<AmountError> for WalletError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
