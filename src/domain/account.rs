//! Wallet account record
//!
//! An account holds one balance per supported currency and an optional
//! transaction PIN hash. Balances change only through the store's atomic
//! commit; the PIN hash changes only through the PIN guard.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Balance, Currency};

// =========================================================================
// Account number
// =========================================================================

/// Public, fixed-length numeric identifier used to address transfers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid account number: {0:?}")]
pub struct InvalidAccountNumber(pub String);

impl AccountNumber {
    pub const LENGTH: usize = 10;

    /// Generate a random account number. The leading digit is never zero.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut digits = String::with_capacity(Self::LENGTH);
        digits.push(char::from(b'0' + rng.gen_range(1..10u8)));
        for _ in 1..Self::LENGTH {
            digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
        }
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountNumber {
    type Err = InvalidAccountNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == Self::LENGTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidAccountNumber(s.to_string()))
        }
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = InvalidAccountNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =========================================================================
// Balances
// =========================================================================

/// Per-currency balances, serialized as `{"DollarWallet": "0.00", ...}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<Currency, Balance>);

impl Balances {
    /// A zero balance in every supported currency
    pub fn zeroed() -> Self {
        Self(Currency::ALL.iter().map(|c| (*c, Balance::zero())).collect())
    }

    /// Balance for a currency; a currency never credited reads as zero
    pub fn get(&self, currency: Currency) -> Balance {
        self.0.get(&currency).copied().unwrap_or_default()
    }

    pub(crate) fn set(&mut self, currency: Currency, balance: Balance) {
        self.0.insert(currency, balance);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, Balance)> + '_ {
        self.0.iter().map(|(c, b)| (*c, *b))
    }
}

impl FromIterator<(Currency, Balance)> for Balances {
    fn from_iter<I: IntoIterator<Item = (Currency, Balance)>>(iter: I) -> Self {
        let mut balances = Self::zeroed();
        for (currency, balance) in iter {
            balances.set(currency, balance);
        }
        balances
    }
}

// =========================================================================
// PIN hash
// =========================================================================

/// One-way hash of a transaction PIN (PHC string format).
#[derive(Clone, PartialEq, Eq)]
pub struct PinHash(String);

impl PinHash {
    pub fn new(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinHash([REDACTED])")
    }
}

// =========================================================================
// Account
// =========================================================================

/// Which unique key a duplicate registration collided on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKey {
    Email,
    AccountNumber,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateKey::Email => f.write_str("email"),
            DuplicateKey::AccountNumber => f.write_str("account number"),
        }
    }
}

/// Registration details for a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub firstname: String,
    pub surname: String,
    pub othernames: String,
    pub email: String,
    pub phonenumber: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub(crate) id: Uuid,
    pub(crate) account_number: AccountNumber,
    pub(crate) firstname: String,
    pub(crate) surname: String,
    pub(crate) othernames: String,
    pub(crate) email: String,
    pub(crate) phonenumber: String,
    pub(crate) balances: Balances,
    #[serde(skip)]
    pub(crate) pin_hash: Option<PinHash>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Account {
    /// Open a new account with zero balances and no PIN.
    /// The email is stored lowercase.
    pub fn open(details: NewAccount, account_number: AccountNumber) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_number,
            firstname: details.firstname.trim().to_string(),
            surname: details.surname.trim().to_string(),
            othernames: details.othernames.trim().to_string(),
            email: details.email.trim().to_lowercase(),
            phonenumber: details.phonenumber.trim().to_string(),
            balances: Balances::zeroed(),
            pin_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn firstname(&self) -> &str {
        &self.firstname
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn othernames(&self) -> &str {
        &self.othernames
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phonenumber(&self) -> &str {
        &self.phonenumber
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn balance(&self, currency: Currency) -> Balance {
        self.balances.get(currency)
    }

    pub fn pin_hash(&self) -> Option<&PinHash> {
        self.pin_hash.as_ref()
    }

    pub fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
