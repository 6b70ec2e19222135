//! Trade listing, cancellation, and settlement.
//!
//! The trading engine owns per-grid trade records and the source-type
//! catalog. It is the one privileged caller of the energy ledger: trade
//! creation escrows the seller's energy out of circulation, and a
//! purchase atomically pairs the buyer's energy credit with payment
//! forwarding to the seller.

pub mod engine;
pub mod types;

pub use engine::TradingEngine;
pub use types::{
    CancelPolicy, Settlement, SourceType, Trade, TradeId, DEFAULT_SOURCE_TYPE_IDS, MIN_TRADE_KWH,
};
