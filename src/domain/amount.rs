//! Amount type
//!
//! Domain primitives for monetary values. Amounts are validated at
//! construction time so an invalid value cannot reach the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::WalletError;

/// Maximum allowed amount or balance in any wallet currency
const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Maximum decimal places (minor currency units)
const MAX_SCALE: u32 = 2;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - At most 2 significant decimal places
/// - Maximum value is 1 trillion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use wallet_engine::domain::Amount;
///
/// let amount: Amount = "250.50".parse().unwrap();
/// assert_eq!(amount.value(), Decimal::new(25050, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount or Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("balance cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("amount is not numeric: {0}")]
    ParseError(String),
}

/// Upper bound shared by amounts and balances
pub(crate) fn max_amount() -> Decimal {
    Decimal::from(MAX_AMOUNT)
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 significant decimal places
    /// - `AmountError::Overflow` if value > 1 trillion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        // "100.000" is fine, "100.001" is not
        let normalized = value.normalize();
        if normalized.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(normalized.scale()));
        }

        if value > max_amount() {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Digit separators and an explicit plus sign are not amounts
        if s.contains('_') || s.starts_with('+') {
            return Err(AmountError::ParseError(s.to_string()));
        }
        let decimal = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| AmountError::ParseError(s.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

/// Balance represents a wallet balance (zero or positive).
/// Unlike Amount, Balance can be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }

        if value > max_amount() {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Apply a signed delta, refusing to go below zero.
    ///
    /// A negative result is reported as `InsufficientFunds`, never clamped.
    pub fn adjust(&self, delta: Decimal) -> Result<Balance, WalletError> {
        let next = self.0 + delta;
        if next < Decimal::ZERO {
            return Err(WalletError::insufficient_funds(-delta, self.0));
        }
        Ok(Balance::new(next)?)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<String> for Balance {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let decimal = Decimal::from_str(value.trim())
            .map_err(|_| AmountError::ParseError(value.clone()))?;
        Balance::new(decimal)
    }
}

impl From<Balance> for String {
    fn from(balance: Balance) -> Self {
        balance.to_string()
    }
}
