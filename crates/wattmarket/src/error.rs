//! Error types for WattMarket.
//!
//! Every failure is a distinct, named condition. Operations abort with
//! zero state change: a store never mutates before its last fallible
//! check has passed.

use crate::grid::GridId;

/// Market error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    // ── Authorization ─────────────────────────────────────────────────────

    #[error("Caller is not permitted to perform this operation")]
    Unauthorized,

    #[error("Caller is neither the administrator nor an authorized device")]
    NotAuthorized,

    #[error("Caller is not the administrator")]
    NotAdmin,

    // ── Validation ────────────────────────────────────────────────────────

    #[error("Quantity too low: minimum {minimum} kWh")]
    QuantityTooLow { minimum: u64 },

    #[error("Price per kWh must be greater than zero")]
    PriceTooLow,

    #[error("Incorrect payment: expected {expected}, attached {attached}")]
    IncorrectPayment { expected: u128, attached: u128 },

    // ── State conflict ────────────────────────────────────────────────────

    #[error("Grid already exists: {0}")]
    DuplicateGridId(GridId),

    #[error("User already belongs to a grid")]
    UserAlreadyInGrid,

    #[error("Trade is no longer active")]
    TradeInactive,

    #[error("Source type already registered: {0}")]
    SourceTypeExists(u32),

    // ── Not found ─────────────────────────────────────────────────────────

    #[error("No grid found for the given id")]
    NoGridFound,

    #[error("User is not connected to any grid")]
    NoUserInGrid,

    #[error("No trade found for the given id")]
    TradeNotFound,

    // ── Resource ──────────────────────────────────────────────────────────

    #[error("Insufficient energy: {available} kWh available, {requested} kWh requested")]
    InsufficientEnergy { available: u64, requested: u64 },

    #[error("Insufficient balance: {available} kWh available, {requested} kWh requested")]
    InsufficientBalance { available: u64, requested: u64 },

    // ── Dispatch ──────────────────────────────────────────────────────────

    #[error("Invocation matches no declared operation")]
    InvalidCall,

    #[error("Fallback invocations are not supported")]
    FallbackUnsupported,

    #[error("Direct payments are rejected; value is accepted only through buyTrade")]
    DirectPaymentRejected,

    // ── Configuration ─────────────────────────────────────────────────────

    #[error("Energy ledger is not configured for settlement")]
    LedgerNotConfigured,

    // ── Host runtime ──────────────────────────────────────────────────────

    #[error("Insufficient funds: {available} available, {required} required")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("Account alias already in use: {0}")]
    DuplicateAlias(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, MarketError>;
