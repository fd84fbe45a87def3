//! Deposit Handler
//!
//! Credits a wallet and records one Deposit entry in the same unit.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Amount, BalanceAdjustment, OperationContext, WalletError, WalletResponse};
use crate::store::WalletStore;

use super::{DepositCommand, DepositResult};

pub struct DepositHandler {
    store: Arc<dyn WalletStore>,
}

impl DepositHandler {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// Execute the deposit command
    pub async fn execute(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> Result<WalletResponse<DepositResult>, WalletError> {
        let amount: Amount = command.amount.parse()?;

        let operation_id = Uuid::new_v4();
        let adjustment = BalanceAdjustment::deposit(
            command.account_id,
            command.currency,
            amount,
            operation_id,
            Utc::now(),
        );

        // Unknown accounts surface from the store as AccountNotFound
        let entry = self.store.adjust_balance(adjustment).await?;

        tracing::info!(
            account_id = %command.account_id,
            operation_id = %operation_id,
            correlation_id = ?context.correlation_id,
            currency = %command.currency,
            amount = %amount,
            "Deposit committed"
        );

        Ok(WalletResponse::created(
            "Deposit successful",
            DepositResult {
                operation_id,
                currency: command.currency,
                amount,
                balance: entry.balance_after,
                transaction: entry,
            },
        ))
    }
}
