//! Grid records and content-addressed grid ids.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::AccountId;

/// Unique identifier for a grid.
///
/// Format: `grid_` + base58 of first 16 bytes of
/// SHA-256(`"grid:{name}:{country_code}"`). The id is a public, opaque
/// namespace key: the trading engine scopes trades by it without
/// consulting the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridId(pub String);

impl GridId {
    /// Derive the grid id for a `(name, country_code)` pair.
    pub fn derive(name: &str, country_code: &str) -> Self {
        let hash = Sha256::digest(format!("grid:{name}:{country_code}").as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("grid_{encoded}"))
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named regional energy market.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid {
    /// Content-addressed id, unique across all grids.
    pub id: GridId,
    /// Grid name.
    pub name: String,
    /// ISO-style country code.
    pub country_code: String,
    /// Country name.
    pub country_name: String,
    /// Number of users who joined this grid.
    pub member_count: u64,
    /// Identity that created the grid.
    pub created_by: AccountId,
    /// Always true for any grid ever created; grids are never deleted.
    pub exists: bool,
}
