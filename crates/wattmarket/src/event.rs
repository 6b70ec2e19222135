//! Observable market events for external indexers and clients.
//!
//! Each store appends events to its own log as operations succeed; the
//! host runtime drains them into a single, globally ordered sequence.
//! A failed invocation emits nothing.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::grid::GridId;
use crate::trading::TradeId;

/// An event emitted by one of the three stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarketEvent {
    /// The ledger's privileged trading-engine caller was (re)configured.
    TradingEngineSet { engine: AccountId },
    /// The trading engine's settlement ledger was (re)configured.
    EnergyLedgerSet { ledger: AccountId },
    /// A new grid was registered.
    GridCreated { grid_id: GridId, created_by: AccountId },
    /// A device was added to the authorized-device set.
    DeviceAuthorized { device: AccountId },
    /// A user joined a grid.
    MemberJoined { grid_id: GridId, user: AccountId },
    /// A trade was listed.
    TradeCreated {
        grid_id: GridId,
        trade_id: TradeId,
        seller: AccountId,
        kwh: u64,
        price_per_kwh: u128,
    },
    /// A trade was cancelled by its seller.
    TradeCancelled { grid_id: GridId, trade_id: TradeId },
    /// A trade was bought and settled.
    TradeSettled {
        grid_id: GridId,
        trade_id: TradeId,
        seller: AccountId,
        buyer: AccountId,
        payment: u128,
    },
    /// A source type was added to the catalog.
    SourceTypeAdded { id: u32, name: String },
}

impl MarketEvent {
    /// Return a stable string tag for logs and indexers.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::TradingEngineSet { .. } => "trading_engine_set",
            Self::EnergyLedgerSet { .. } => "energy_ledger_set",
            Self::GridCreated { .. } => "grid_created",
            Self::DeviceAuthorized { .. } => "device_authorized",
            Self::MemberJoined { .. } => "member_joined",
            Self::TradeCreated { .. } => "trade_created",
            Self::TradeCancelled { .. } => "trade_cancelled",
            Self::TradeSettled { .. } => "trade_settled",
            Self::SourceTypeAdded { .. } => "source_type_added",
        }
    }
}
