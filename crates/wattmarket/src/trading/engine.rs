//! Trading engine — trade lifecycle, payment validation, and settlement.
//!
//! Every operation is written validate-before-mutate: all failure paths
//! are exhausted before the first state change, and the one fallible
//! cross-store call (the ledger credit or debit) is ordered before the
//! engine's own mutations. An `Err` therefore always means zero state
//! change, in the engine and in the ledger alike.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::{MarketError, Result};
use crate::event::MarketEvent;
use crate::grid::GridId;
use crate::ledger::EnergyLedger;
use crate::trading::types::{
    CancelPolicy, Settlement, SourceType, Trade, TradeId, DEFAULT_SOURCE_TYPE_IDS, MIN_TRADE_KWH,
};

/// Per-grid trade records and the source-type catalog.
///
/// The engine holds its own address, which the energy ledger must have
/// registered as the privileged caller for escrow and settlement to
/// work. Grid ids are opaque namespace keys: the engine never consults
/// the grid registry, and id correctness is the caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingEngine {
    /// This store's own address; the ledger's privileged caller.
    account: AccountId,
    /// Administrator (the constructing identity).
    admin: AccountId,
    /// Address of the ledger to settle against. Must be set before any
    /// trade can be created or settled.
    ledger: Option<AccountId>,
    /// What happens to escrowed energy on cancellation.
    cancel_policy: CancelPolicy,
    /// Trades per grid, in creation order.
    trades: HashMap<GridId, Vec<Trade>>,
    /// Source-type catalog.
    source_types: BTreeMap<u32, SourceType>,
    /// Lifetime trade counter, part of every derived trade id.
    trade_seq: u64,
    /// Emitted events, in emission order.
    events: Vec<MarketEvent>,
}

impl TradingEngine {
    /// Create an engine owned by `admin`, addressable as `account`.
    ///
    /// Seeds the source-type catalog with `1 = Solar` and `2 = Wind`,
    /// the defaults applied to trades created without source types.
    pub fn new(account: AccountId, admin: AccountId) -> Self {
        let mut source_types = BTreeMap::new();
        source_types.insert(1, SourceType::new("Solar", "Energy from solar panels."));
        source_types.insert(2, SourceType::new("Wind", "Energy from wind turbines."));
        Self {
            account,
            admin,
            ledger: None,
            cancel_policy: CancelPolicy::default(),
            trades: HashMap::new(),
            source_types,
            trade_seq: 0,
            events: Vec::new(),
        }
    }

    /// Select the cancellation policy (defaults to [`CancelPolicy::Forfeit`]).
    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    /// This store's own address.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// The active cancellation policy.
    pub fn cancel_policy(&self) -> CancelPolicy {
        self.cancel_policy
    }

    /// Record the ledger to settle against.
    ///
    /// Admin-only; last writer wins.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the caller is not the administrator.
    pub fn set_energy_ledger(&mut self, caller: &AccountId, ledger: AccountId) -> Result<()> {
        if caller != &self.admin {
            return Err(MarketError::Unauthorized);
        }
        self.ledger = Some(ledger.clone());
        self.events.push(MarketEvent::EnergyLedgerSet { ledger });
        Ok(())
    }

    /// Check that `ledger` is the configured settlement ledger.
    fn ensure_ledger(&self, ledger: &EnergyLedger) -> Result<()> {
        match &self.ledger {
            Some(id) if id == ledger.account() => Ok(()),
            _ => Err(MarketError::LedgerNotConfigured),
        }
    }

    /// List a trade, escrowing the seller's energy.
    ///
    /// The caller is the seller. An empty `source_type_ids` defaults to
    /// the seeded pair `[1, 2]`.
    ///
    /// # Errors
    ///
    /// Returns `QuantityTooLow` below the 5 kWh minimum, `PriceTooLow`
    /// for a zero unit price, `LedgerNotConfigured` if settlement is not
    /// wired, and `InsufficientEnergy` if the seller's ledger balance is
    /// less than `kwh`.
    pub fn create_trade(
        &mut self,
        ledger: &mut EnergyLedger,
        seller: &AccountId,
        grid_id: &GridId,
        kwh: u64,
        price_per_kwh: u128,
        source_type_ids: Vec<u32>,
    ) -> Result<TradeId> {
        if kwh < MIN_TRADE_KWH {
            return Err(MarketError::QuantityTooLow {
                minimum: MIN_TRADE_KWH,
            });
        }
        if price_per_kwh == 0 {
            return Err(MarketError::PriceTooLow);
        }
        self.ensure_ledger(ledger)?;
        let available = ledger.balance_of(seller);
        if available < kwh {
            return Err(MarketError::InsufficientEnergy {
                available,
                requested: kwh,
            });
        }

        // Escrow the offered energy out of circulation. This is the last
        // fallible step; everything after it must not fail.
        ledger.debit(&self.account, seller, kwh)?;

        self.trade_seq += 1;
        let trade_id = TradeId::derive(seller, grid_id, self.trade_seq);
        let source_type_ids = if source_type_ids.is_empty() {
            DEFAULT_SOURCE_TYPE_IDS.to_vec()
        } else {
            source_type_ids
        };
        self.trades.entry(grid_id.clone()).or_default().push(Trade {
            trade_id: trade_id.clone(),
            seller: seller.clone(),
            kwh,
            price_per_kwh,
            source_type_ids,
            is_active: true,
        });
        self.events.push(MarketEvent::TradeCreated {
            grid_id: grid_id.clone(),
            trade_id: trade_id.clone(),
            seller: seller.clone(),
            kwh,
            price_per_kwh,
        });
        Ok(trade_id)
    }

    /// Cancel an active trade. Seller-only.
    ///
    /// Under [`CancelPolicy::Refund`] the escrowed energy is credited
    /// back to the seller; under [`CancelPolicy::Forfeit`] it stays
    /// debited.
    ///
    /// # Errors
    ///
    /// Returns `TradeNotFound` for an unknown trade, `Unauthorized` if
    /// the caller is not the trade's seller, and `TradeInactive` if the
    /// trade was already cancelled or sold.
    pub fn cancel_trade(
        &mut self,
        ledger: &mut EnergyLedger,
        caller: &AccountId,
        grid_id: &GridId,
        trade_id: &TradeId,
    ) -> Result<()> {
        let engine_account = self.account.clone();
        let configured = self.ledger.clone();
        let refund = self.cancel_policy == CancelPolicy::Refund;

        let trades = self
            .trades
            .get_mut(grid_id)
            .ok_or(MarketError::TradeNotFound)?;
        let idx = trades
            .iter()
            .position(|t| &t.trade_id == trade_id)
            .ok_or(MarketError::TradeNotFound)?;
        let trade = &mut trades[idx];
        if &trade.seller != caller {
            return Err(MarketError::Unauthorized);
        }
        if !trade.is_active {
            return Err(MarketError::TradeInactive);
        }

        if refund {
            match &configured {
                Some(id) if id == ledger.account() => {}
                _ => return Err(MarketError::LedgerNotConfigured),
            }
            // Restore the escrow before the lifecycle flip so a failed
            // refund leaves the trade active and the ledger untouched.
            ledger.credit(&engine_account, caller, trade.kwh)?;
        }

        trade.is_active = false;
        self.events.push(MarketEvent::TradeCancelled {
            grid_id: grid_id.clone(),
            trade_id: trade_id.clone(),
        });
        Ok(())
    }

    /// The grid's active trades, in creation order.
    pub fn active_trades(&self, grid_id: &GridId) -> Vec<Trade> {
        self.trades
            .get(grid_id)
            .map(|trades| trades.iter().filter(|t| t.is_active).cloned().collect())
            .unwrap_or_default()
    }

    /// Buy an active trade with the attached payment.
    ///
    /// The buyer's energy credit and the payment forwarding are one
    /// atomic settlement: the trade is flipped inactive before the
    /// returned [`Settlement`] instructs the host to pay the seller, so
    /// a reentrant invocation during payment observes an inactive trade.
    ///
    /// # Errors
    ///
    /// Returns `TradeNotFound` for an unknown trade, `TradeInactive` if
    /// it was already cancelled or sold, `IncorrectPayment` unless
    /// `value` equals `kwh × price_per_kwh` exactly, and
    /// `LedgerNotConfigured` if settlement is not wired.
    pub fn buy_trade(
        &mut self,
        ledger: &mut EnergyLedger,
        buyer: &AccountId,
        value: u128,
        grid_id: &GridId,
        trade_id: &TradeId,
    ) -> Result<Settlement> {
        let engine_account = self.account.clone();
        let configured = self.ledger.clone();

        let trades = self
            .trades
            .get_mut(grid_id)
            .ok_or(MarketError::TradeNotFound)?;
        let idx = trades
            .iter()
            .position(|t| &t.trade_id == trade_id)
            .ok_or(MarketError::TradeNotFound)?;
        let trade = &mut trades[idx];
        if !trade.is_active {
            return Err(MarketError::TradeInactive);
        }
        let expected = trade.total_price();
        if value != expected {
            return Err(MarketError::IncorrectPayment {
                expected,
                attached: value,
            });
        }
        match &configured {
            Some(id) if id == ledger.account() => {}
            _ => return Err(MarketError::LedgerNotConfigured),
        }

        // Move the energy first; the credit is the last fallible step.
        ledger.credit(&engine_account, buyer, trade.kwh)?;

        // Deactivate before the payment instruction leaves the engine.
        trade.is_active = false;
        let settlement = Settlement {
            trade_id: trade.trade_id.clone(),
            grid_id: grid_id.clone(),
            seller: trade.seller.clone(),
            buyer: buyer.clone(),
            kwh: trade.kwh,
            payment: value,
        };
        self.events.push(MarketEvent::TradeSettled {
            grid_id: settlement.grid_id.clone(),
            trade_id: settlement.trade_id.clone(),
            seller: settlement.seller.clone(),
            buyer: settlement.buyer.clone(),
            payment: settlement.payment,
        });
        Ok(settlement)
    }

    /// Register a source type. Admin-only.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the caller is not the administrator and
    /// `SourceTypeExists` if `id` is already registered.
    pub fn add_source_type(
        &mut self,
        caller: &AccountId,
        id: u32,
        name: &str,
        description: &str,
    ) -> Result<()> {
        if caller != &self.admin {
            return Err(MarketError::Unauthorized);
        }
        if self.source_types.contains_key(&id) {
            return Err(MarketError::SourceTypeExists(id));
        }
        self.source_types
            .insert(id, SourceType::new(name, description));
        self.events.push(MarketEvent::SourceTypeAdded {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    /// The catalog entry for `id`, or an empty default if unregistered.
    pub fn source_type(&self, id: u32) -> SourceType {
        self.source_types.get(&id).cloned().unwrap_or_default()
    }

    /// Events emitted so far, in emission order.
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }
}
