//! The host dispatch surface.
//!
//! A host invocation is a `(caller, value, Call)` triple. Typed variants
//! map one-to-one onto store operations; [`Call::Raw`] models an
//! invocation that matches no declared operation and is answered with
//! the target store's dispatch failure. Calls are serializable so hosts
//! can log and replay them.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::grid::{Grid, GridId};
use crate::trading::{Settlement, SourceType, Trade, TradeId};

/// The store an invocation is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Ledger,
    Registry,
    Trading,
}

/// Energy-ledger operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerCall {
    Credit { user: AccountId, amount: u64 },
    Debit { user: AccountId, amount: u64 },
    SetTradingEngine { engine: AccountId },
    Balance { user: AccountId },
}

/// Grid-registry operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryCall {
    CreateGrid {
        name: String,
        country_code: String,
        country_name: String,
    },
    AddAuthorizedDevice {
        device: AccountId,
    },
    ListGridIds,
    ListGrids,
    JoinGrid {
        grid_id: GridId,
    },
    IsConnected {
        user: AccountId,
    },
    UserGridData {
        user: AccountId,
    },
}

/// Trading-engine operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TradingCall {
    SetEnergyLedger {
        ledger: AccountId,
    },
    CreateTrade {
        grid_id: GridId,
        kwh: u64,
        price_per_kwh: u128,
        source_type_ids: Vec<u32>,
    },
    CancelTrade {
        grid_id: GridId,
        trade_id: TradeId,
    },
    ActiveTrades {
        grid_id: GridId,
    },
    BuyTrade {
        grid_id: GridId,
        trade_id: TradeId,
    },
    AddSourceType {
        id: u32,
        name: String,
        description: String,
    },
    SourceType {
        id: u32,
    },
}

/// A dispatchable invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Call {
    Ledger(LedgerCall),
    Registry(RegistryCall),
    Trading(TradingCall),
    /// An invocation matching no declared operation: raw data bytes (a
    /// bare payment carries none) addressed to a store.
    Raw { target: Target, data: Vec<u8> },
}

impl Call {
    /// Whether attached value is accepted for this call. Payment enters
    /// the system only through `buyTrade`.
    pub fn accepts_value(&self) -> bool {
        matches!(self, Call::Trading(TradingCall::BuyTrade { .. }))
    }
}

/// Reply from a successful invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reply {
    Unit,
    Balance(u64),
    GridIds(Vec<GridId>),
    Grids(Vec<Grid>),
    Connected(bool),
    GridData(Grid),
    TradeId(TradeId),
    Trades(Vec<Trade>),
    SourceType(SourceType),
    Settlement(Settlement),
}
