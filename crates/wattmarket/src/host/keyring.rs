//! Named local accounts — the host's "signers".
//!
//! Each account is backed by a freshly generated Ed25519 key; only the
//! public material is retained (the id and the base64 public key), so
//! there is nothing secret at rest. The stores see only the opaque
//! account id.

use serde::{Deserialize, Serialize};

use crate::account::{self, AccountId};
use crate::error::{MarketError, Result};

/// A named account known to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Host-local alias (e.g. "alice").
    pub alias: String,
    /// The derived account id.
    pub id: AccountId,
    /// Base64 Ed25519 public key.
    pub public_key: String,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
}

/// Alias-addressable set of accounts, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyring {
    accounts: Vec<Account>,
}

impl Keyring {
    /// Create an empty keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh account under `alias`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAlias` if the alias is already taken.
    pub fn create(&mut self, alias: &str) -> Result<&Account> {
        if self.accounts.iter().any(|a| a.alias == alias) {
            return Err(MarketError::DuplicateAlias(alias.to_string()));
        }
        let (id, key) = account::generate();
        log::debug!("keyring: created account {id} for alias {alias}");
        self.accounts.push(Account {
            alias: alias.to_string(),
            id,
            public_key: account::verifying_key_base64(&key),
            created_at: crate::time::now_micros(),
        });
        // Just pushed, so the list is non-empty.
        Ok(&self.accounts[self.accounts.len() - 1])
    }

    /// Adopt an existing account under `alias` (e.g. the genesis admin,
    /// generated before the keyring existed).
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAlias` if the alias is already taken.
    pub fn adopt(&mut self, alias: &str, id: AccountId, public_key: String) -> Result<&Account> {
        if self.accounts.iter().any(|a| a.alias == alias) {
            return Err(MarketError::DuplicateAlias(alias.to_string()));
        }
        self.accounts.push(Account {
            alias: alias.to_string(),
            id,
            public_key,
            created_at: crate::time::now_micros(),
        });
        Ok(&self.accounts[self.accounts.len() - 1])
    }

    /// Look up an account by alias or by full account id.
    pub fn resolve(&self, alias_or_id: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.alias == alias_or_id || a.id.0 == alias_or_id)
    }

    /// All accounts, in creation order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }
}
