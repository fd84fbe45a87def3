//! Wallet currencies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A wallet currency. The variant names double as the wire names used by
/// the `wallet` request field and as balance keys in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    DollarWallet,
    NairaWallet,
}

impl Currency {
    /// Every supported wallet, in display order
    pub const ALL: [Currency; 2] = [Currency::DollarWallet, Currency::NairaWallet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::DollarWallet => "DollarWallet",
            Currency::NairaWallet => "NairaWallet",
        }
    }

    /// ISO 4217 code of the underlying currency
    pub fn iso_code(&self) -> &'static str {
        match self {
            Currency::DollarWallet => "USD",
            Currency::NairaWallet => "NGN",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported wallet: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "DollarWallet" => Ok(Currency::DollarWallet),
            "NairaWallet" => Ok(Currency::NairaWallet),
            other => Err(UnsupportedCurrency(other.to_string())),
        }
    }
}
