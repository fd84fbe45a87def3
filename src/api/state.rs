//! Shared application state

use std::sync::Arc;

use crate::guard::{PinGuard, PinHashing};
use crate::handlers::{CreateAccountHandler, DepositHandler, TransferHandler};
use crate::query::{QueryService, QuerySettings};
use crate::store::WalletStore;

/// Everything a route needs, wired over one store
#[derive(Clone)]
pub struct AppState {
    pub guard: PinGuard,
    pub query: QueryService,
    pub accounts: Arc<CreateAccountHandler>,
    pub deposits: Arc<DepositHandler>,
    pub transfers: Arc<TransferHandler>,
}

impl AppState {
    pub fn new(store: Arc<dyn WalletStore>, hashing: PinHashing, settings: QuerySettings) -> Self {
        let guard = PinGuard::new(store.clone(), hashing);
        Self {
            query: QueryService::new(store.clone(), settings),
            accounts: Arc::new(CreateAccountHandler::new(store.clone())),
            deposits: Arc::new(DepositHandler::new(store.clone())),
            transfers: Arc::new(TransferHandler::new(store, guard.clone())),
            guard,
        }
    }
}
