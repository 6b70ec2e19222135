//! Account identities — opaque caller addresses for the marketplace.
//!
//! An account id is derived from an Ed25519 public key. The public key
//! IS the account; the stores never verify signatures themselves — the
//! host runtime is trusted to authenticate callers and every store
//! operation receives the caller id as an opaque address.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Unique identifier for an account.
///
/// Format: `acct_` + base58 of first 16 bytes of SHA-256(public_key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Compute an account id from a verifying (public) key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let hash = Sha256::digest(key.as_bytes());
        let truncated = &hash[..16];
        let encoded = bs58::encode(truncated).into_string();
        Self(format!("acct_{encoded}"))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a fresh account from a random Ed25519 key pair.
///
/// Returns the derived id together with the verifying key so the host
/// can retain the public material.
pub fn generate() -> (AccountId, VerifyingKey) {
    let signing_key = SigningKey::generate(&mut rand::thread_rng());
    let verifying_key = signing_key.verifying_key();
    (AccountId::from_verifying_key(&verifying_key), verifying_key)
}

/// Return a verifying key as base64.
pub fn verifying_key_base64(key: &VerifyingKey) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, key.as_bytes())
}
