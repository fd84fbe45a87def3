//! Authorization Guard
//!
//! Sets and verifies the transaction PIN. The plaintext PIN never leaves
//! this module and the stored hash is never returned to callers.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{PinHash, WalletError, WalletResponse};
use crate::store::WalletStore;

pub const PIN_LENGTH: usize = 4;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinHashing {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PinHashing {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

impl PinHashing {
    fn hasher(&self) -> Result<Argon2<'static>, WalletError> {
        let params = Params::new(self.memory_kib, self.iterations, 1, None)
            .map_err(|e| WalletError::Internal(format!("invalid pin hashing params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a PIN with a fresh random salt (PHC string)
    pub fn hash(&self, pin: &str) -> Result<PinHash, WalletError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = self
            .hasher()?
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|e| WalletError::Internal(format!("pin hashing failed: {e}")))?
            .to_string();
        Ok(PinHash::new(phc))
    }

    /// Verify against a stored hash; cost parameters come from the hash itself
    pub fn verify(&self, pin: &str, stored: &PinHash) -> Result<bool, WalletError> {
        let parsed = PasswordHash::new(stored.as_str())
            .map_err(|e| WalletError::Internal(format!("stored pin hash unreadable: {e}")))?;
        match self.hasher()?.verify_password(pin.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(WalletError::Internal(format!("pin verification failed: {e}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCheck {
    Authorized,
    Denied,
}

/// Exactly four ASCII digits
pub fn validate_pin_format(pin: &str) -> Result<(), WalletError> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(WalletError::InvalidPinFormat)
    }
}

#[derive(Clone)]
pub struct PinGuard {
    store: Arc<dyn WalletStore>,
    hashing: PinHashing,
}

impl PinGuard {
    pub fn new(store: Arc<dyn WalletStore>, hashing: PinHashing) -> Self {
        Self { store, hashing }
    }

    /// Set or replace the account's transaction PIN
    pub async fn set_pin(
        &self,
        account_id: Uuid,
        pin: &str,
    ) -> Result<WalletResponse<()>, WalletError> {
        validate_pin_format(pin)?;

        if self.store.get_by_id(account_id).await?.is_none() {
            return Err(WalletError::AccountNotFound(account_id.to_string()));
        }

        let hashing = self.hashing;
        let pin = pin.to_string();
        let hash = tokio::task::spawn_blocking(move || hashing.hash(&pin))
            .await
            .map_err(|e| WalletError::Internal(format!("pin hashing task failed: {e}")))??;

        self.store.set_pin_hash(account_id, hash).await?;

        tracing::info!(account_id = %account_id, "Transaction pin set");

        Ok(WalletResponse::message_only("Transaction pin created successfully"))
    }

    /// Check a presented PIN against the stored hash
    pub async fn verify_pin(&self, account_id: Uuid, candidate: &str) -> Result<PinCheck, WalletError> {
        let account = self
            .store
            .get_by_id(account_id)
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?;

        let Some(stored) = account.pin_hash().cloned() else {
            return Err(WalletError::PinNotSet);
        };

        // A malformed candidate can never match
        if validate_pin_format(candidate).is_err() {
            return Ok(PinCheck::Denied);
        }

        let hashing = self.hashing;
        let candidate = candidate.to_string();
        let matched = tokio::task::spawn_blocking(move || hashing.verify(&candidate, &stored))
            .await
            .map_err(|e| WalletError::Internal(format!("pin verification task failed: {e}")))??;

        if matched {
            Ok(PinCheck::Authorized)
        } else {
            tracing::warn!(account_id = %account_id, "Transaction pin rejected");
            Ok(PinCheck::Denied)
        }
    }
}
