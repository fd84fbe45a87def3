//! Transfer Handler
//!
//! Moves funds between two accounts after PIN authorization. The debit,
//! the credit and both ledger entries commit as one unit; the sufficiency
//! check happens inside that unit against the stored balance.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    AccountNumber, Amount, BalanceAdjustment, OperationContext, WalletError, WalletResponse,
};
use crate::guard::{PinCheck, PinGuard};
use crate::store::WalletStore;

use super::{TransferCommand, TransferResult};

/// Handler for peer-to-peer transfers
pub struct TransferHandler {
    store: Arc<dyn WalletStore>,
    guard: PinGuard,
}

impl TransferHandler {
    pub fn new(store: Arc<dyn WalletStore>, guard: PinGuard) -> Self {
        Self { store, guard }
    }

    /// Execute the transfer command
    pub async fn execute(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> Result<WalletResponse<TransferResult>, WalletError> {
        let amount: Amount = command.amount.parse()?;

        let sender = self
            .store
            .get_by_id(command.sender_id)
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(command.sender_id.to_string()))?;

        // A malformed number cannot name an account either
        let receiver_number: AccountNumber = command
            .receiver_account_number
            .parse()
            .map_err(|_| WalletError::ReceiverNotFound(command.receiver_account_number.clone()))?;

        let receiver = self
            .store
            .get_by_account_number(&receiver_number)
            .await?
            .ok_or_else(|| WalletError::ReceiverNotFound(receiver_number.to_string()))?;

        if receiver.id() == sender.id() {
            return Err(WalletError::SelfTransferNotAllowed);
        }

        match self.guard.verify_pin(sender.id(), &command.pin).await? {
            PinCheck::Authorized => {}
            PinCheck::Denied => return Err(WalletError::AuthorizationFailed),
        }

        let operation_id = Uuid::new_v4();
        let (debit, credit) = BalanceAdjustment::transfer(
            &sender,
            &receiver,
            command.currency,
            amount,
            operation_id,
            Utc::now(),
        );

        let mut entries = match self.store.commit(vec![debit, credit]).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    sender_id = %sender.id(),
                    operation_id = %operation_id,
                    error = %err,
                    "Transfer rejected"
                );
                return Err(err);
            }
        };

        if entries.is_empty() {
            return Err(WalletError::Internal("transfer committed no entries".to_string()));
        }
        // Entries come back in input order: debit first
        let debit_entry = entries.swap_remove(0);

        tracing::info!(
            sender_id = %sender.id(),
            receiver_id = %receiver.id(),
            operation_id = %operation_id,
            correlation_id = ?context.correlation_id,
            currency = %command.currency,
            amount = %amount,
            "Transfer committed"
        );

        Ok(WalletResponse::created(
            "Transfer successful",
            TransferResult {
                operation_id,
                currency: command.currency,
                amount,
                receiver_account_number: receiver_number.to_string(),
                balance: debit_entry.balance_after,
                transaction: debit_entry,
            },
        ))
    }
}
