//! Command definitions
//!
//! Commands represent intentions to change wallet state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{Amount, Balance, Currency, NewAccount, Transaction};

// =========================================================================
// CreateAccountCommand
// =========================================================================

/// Command to register a new wallet account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub firstname: String,
    pub surname: String,
    pub othernames: Option<String>,
    pub email: String,
    pub phonenumber: String,
}

impl CreateAccountCommand {
    pub fn new(firstname: String, surname: String, email: String, phonenumber: String) -> Self {
        Self {
            firstname,
            surname,
            othernames: None,
            email,
            phonenumber,
        }
    }

    pub fn with_othernames(mut self, othernames: String) -> Self {
        self.othernames = Some(othernames);
        self
    }

    pub(crate) fn into_details(self) -> NewAccount {
        NewAccount {
            firstname: self.firstname,
            surname: self.surname,
            othernames: self.othernames.unwrap_or_default(),
            email: self.email,
            phonenumber: self.phonenumber,
        }
    }
}

// =========================================================================
// DepositCommand
// =========================================================================

/// Command to credit a wallet from outside the system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub account_id: Uuid,
    pub currency: Currency,
    /// Amount as string for precise decimal
    pub amount: String,
}

impl DepositCommand {
    pub fn new(account_id: Uuid, currency: Currency, amount: String) -> Self {
        Self {
            account_id,
            currency,
            amount,
        }
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// Command to move funds to another account, authorized by PIN
#[derive(Clone, Deserialize)]
pub struct TransferCommand {
    pub sender_id: Uuid,
    pub receiver_account_number: String,
    pub currency: Currency,
    /// Amount as string for precise decimal
    pub amount: String,
    pub pin: String,
}

impl TransferCommand {
    pub fn new(
        sender_id: Uuid,
        receiver_account_number: String,
        currency: Currency,
        amount: String,
        pin: String,
    ) -> Self {
        Self {
            sender_id,
            receiver_account_number,
            currency,
            amount,
            pin,
        }
    }
}

impl fmt::Debug for TransferCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferCommand")
            .field("sender_id", &self.sender_id)
            .field("receiver_account_number", &self.receiver_account_number)
            .field("currency", &self.currency)
            .field("amount", &self.amount)
            .field("pin", &"****")
            .finish()
    }
}

// =========================================================================
// Results
// =========================================================================

/// Result of a successful deposit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResult {
    pub operation_id: Uuid,
    pub currency: Currency,
    pub amount: Amount,
    pub balance: Balance,
    pub transaction: Transaction,
}

/// Result of a successful transfer, from the sender's point of view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub operation_id: Uuid,
    pub currency: Currency,
    pub amount: Amount,
    pub receiver_account_number: String,
    pub balance: Balance,
    pub transaction: Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_command_debug_hides_pin() {
        let cmd = TransferCommand::new(
            Uuid::new_v4(),
            "1234567890".to_string(),
            Currency::NairaWallet,
            "100.00".to_string(),
            "4321".to_string(),
        );
        let printed = format!("{:?}", cmd);
        assert!(!printed.contains("4321"));
        assert!(printed.contains("100.00"));
    }

    #[test]
    fn test_create_account_command_defaults_othernames() {
        let details = CreateAccountCommand::new(
            "Ada".to_string(),
            "Obi".to_string(),
            "ada@example.com".to_string(),
            "0803".to_string(),
        )
        .into_details();
        assert_eq!(details.othernames, "");

        let details = CreateAccountCommand::new(
            "Ada".to_string(),
            "Obi".to_string(),
            "ada@example.com".to_string(),
            "0803".to_string(),
        )
        .with_othernames("Ngozi".to_string())
        .into_details();
        assert_eq!(details.othernames, "Ngozi");
    }
}
