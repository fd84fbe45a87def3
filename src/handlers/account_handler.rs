//! Account Creation Handler
//!
//! Registers a wallet account with a freshly generated account number
//! and zero balances in every currency.

use std::sync::Arc;

use crate::domain::{
    Account, AccountNumber, DuplicateKey, OperationContext, WalletError, WalletResponse,
};
use crate::query::AccountProfile;
use crate::store::WalletStore;

use super::CreateAccountCommand;

/// Attempts before giving up on finding a free account number
const MAX_NUMBER_ATTEMPTS: usize = 5;

type NumberSource = Arc<dyn Fn() -> AccountNumber + Send + Sync>;

pub struct CreateAccountHandler {
    store: Arc<dyn WalletStore>,
    next_number: NumberSource,
}

impl CreateAccountHandler {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            store,
            next_number: Arc::new(|| AccountNumber::generate(&mut rand::thread_rng())),
        }
    }

    /// Replace the account number generator
    pub fn with_number_source(
        mut self,
        source: impl Fn() -> AccountNumber + Send + Sync + 'static,
    ) -> Self {
        self.next_number = Arc::new(source);
        self
    }

    /// Execute the create account command
    pub async fn execute(
        &self,
        command: CreateAccountCommand,
        context: &OperationContext,
    ) -> Result<WalletResponse<AccountProfile>, WalletError> {
        let details = command.into_details();

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let account = Account::open(details.clone(), (self.next_number)());

            match self.store.create_account(account).await {
                Ok(account) => {
                    tracing::info!(
                        account_id = %account.id(),
                        account_number = %account.account_number(),
                        correlation_id = ?context.correlation_id,
                        "Account created"
                    );
                    return Ok(WalletResponse::created(
                        "Account created successfully",
                        AccountProfile::from(&account),
                    ));
                }
                Err(WalletError::DuplicateAccount(DuplicateKey::AccountNumber)) => {
                    tracing::warn!(attempt, "Account number collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }

        Err(WalletError::Internal(format!(
            "no free account number after {MAX_NUMBER_ATTEMPTS} attempts"
        )))
    }
}
