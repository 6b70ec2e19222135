//! Trade records, source types, and settlement data.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::AccountId;
use crate::grid::GridId;

/// Minimum tradable quantity, in kWh.
pub const MIN_TRADE_KWH: u64 = 5;

/// Source types applied when a trade is created without any.
pub const DEFAULT_SOURCE_TYPE_IDS: [u32; 2] = [1, 2];

/// Unique identifier for a trade.
///
/// Format: `trade_` + base58 of first 16 bytes of
/// SHA-256(`"trade:{seller}:{grid_id}:{seq}"`), where `seq` is a
/// monotonically increasing sequence for the engine's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub String);

impl TradeId {
    /// Derive a trade id for the given seller, grid, and sequence number.
    pub fn derive(seller: &AccountId, grid_id: &GridId, seq: u64) -> Self {
        let hash = Sha256::digest(format!("trade:{seller}:{grid_id}:{seq}").as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("trade_{encoded}"))
    }
}

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A seller's open offer, scoped to one grid.
///
/// Lifecycle: created active; deactivated exactly once, by cancellation
/// or purchase, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trade {
    /// Unique trade id.
    pub trade_id: TradeId,
    /// The listing account. Its energy is escrowed at creation.
    pub seller: AccountId,
    /// Quantity on offer, in kWh.
    pub kwh: u64,
    /// Unit price, in the smallest currency unit.
    pub price_per_kwh: u128,
    /// Source types describing the energy's origin.
    pub source_type_ids: Vec<u32>,
    /// False once cancelled or sold.
    pub is_active: bool,
}

impl Trade {
    /// The exact payment required to buy this trade.
    pub fn total_price(&self) -> u128 {
        self.kwh as u128 * self.price_per_kwh
    }
}

/// A labeled category describing the origin of traded energy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceType {
    /// Display name (e.g. "Solar").
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

impl SourceType {
    /// Create a source type from name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// What happens to escrowed energy when a trade is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelPolicy {
    /// Escrowed energy stays debited (the conservative reading).
    #[default]
    Forfeit,
    /// Escrowed energy is credited back to the seller on cancellation.
    Refund,
}

/// Outcome of a successful purchase, returned to the host so it can
/// forward the attached payment to the seller.
///
/// By the time a `Settlement` leaves the engine the trade is already
/// inactive, so a reentrant invocation during payment observes a
/// settled trade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    /// The settled trade.
    pub trade_id: TradeId,
    /// Grid the trade was scoped to.
    pub grid_id: GridId,
    /// Seller to receive the payment.
    pub seller: AccountId,
    /// Buyer who received the energy.
    pub buyer: AccountId,
    /// Energy transferred, in kWh.
    pub kwh: u64,
    /// Payment to forward to the seller.
    pub payment: u128,
}
