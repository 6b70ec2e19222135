//! WattMarket — a peer-to-peer local-energy marketplace.
//!
//! Three cooperating stores with strict cross-store authorization:
//! an energy ledger (per-account kWh balances with one privileged
//! delegated caller), a grid registry (named regional markets with
//! device authorization and one-grid-per-user membership), and a
//! trading engine (per-grid trade lifecycle with escrow-on-create and
//! atomic exact-payment settlement).
//!
//! The stores assume a host that serializes invocations, authenticates
//! callers, and applies each operation all-or-nothing; the [`host`]
//! module provides an in-process implementation of that contract.

pub mod account;
pub mod error;
pub mod event;
pub mod grid;
pub mod host;
pub mod ledger;
pub mod time;
pub mod trading;

// Re-export primary types
pub use account::AccountId;
pub use error::{MarketError, Result};
pub use event::MarketEvent;
pub use grid::{Grid, GridId, GridRegistry};
pub use ledger::EnergyLedger;
pub use trading::{
    CancelPolicy, Settlement, SourceType, Trade, TradeId, TradingEngine, MIN_TRADE_KWH,
};

// Re-export host types
pub use host::{
    Account, Call, EventRecord, Keyring, LedgerCall, RegistryCall, Reply, Runtime, RuntimeBuilder,
    Target, TradingCall,
};
