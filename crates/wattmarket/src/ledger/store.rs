//! The energy ledger — gated mutation of per-account kWh balances.
//!
//! Mutation is self-service: an account may credit or debit only its own
//! balance (e.g. metering hardware acting as the user). The single
//! exception is the registered trading engine, which may move energy for
//! any account during trade escrow and settlement. No third party can
//! move another account's energy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::{MarketError, Result};
use crate::event::MarketEvent;

/// Balance store for traded energy, denominated in whole kWh.
///
/// Balances are `u64`, so non-negativity is structural: a debit that
/// would overdraw is rejected before any mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyLedger {
    /// This store's own address.
    account: AccountId,
    /// Administrator (the constructing identity).
    admin: AccountId,
    /// The one privileged caller allowed to move energy for any account.
    /// Last writer wins on reconfiguration; the grant is single-holder.
    trading_engine: Option<AccountId>,
    /// kWh per account. An absent entry means zero.
    balances: HashMap<AccountId, u64>,
    /// Emitted events, in emission order.
    events: Vec<MarketEvent>,
}

impl EnergyLedger {
    /// Create a ledger owned by `admin`, addressable as `account`.
    pub fn new(account: AccountId, admin: AccountId) -> Self {
        Self {
            account,
            admin,
            trading_engine: None,
            balances: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// This store's own address.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// The currently registered privileged caller, if any.
    pub fn trading_engine(&self) -> Option<&AccountId> {
        self.trading_engine.as_ref()
    }

    /// Check that `caller` may mutate `user`'s balance.
    fn authorize(&self, caller: &AccountId, user: &AccountId) -> Result<()> {
        if caller == user || self.trading_engine.as_ref() == Some(caller) {
            Ok(())
        } else {
            Err(MarketError::Unauthorized)
        }
    }

    /// Credit `amount` kWh to `user`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the caller is `user` itself or the
    /// registered trading engine, and `QuantityTooLow` if `amount` is
    /// zero.
    pub fn credit(&mut self, caller: &AccountId, user: &AccountId, amount: u64) -> Result<()> {
        self.authorize(caller, user)?;
        if amount == 0 {
            return Err(MarketError::QuantityTooLow { minimum: 1 });
        }
        *self.balances.entry(user.clone()).or_insert(0) += amount;
        Ok(())
    }

    /// Debit `amount` kWh from `user`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` under the same rule as [`credit`], and
    /// `InsufficientBalance` if `amount` exceeds the current balance.
    ///
    /// [`credit`]: EnergyLedger::credit
    pub fn debit(&mut self, caller: &AccountId, user: &AccountId, amount: u64) -> Result<()> {
        self.authorize(caller, user)?;
        let available = self.balance_of(user);
        if amount > available {
            return Err(MarketError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.balances.insert(user.clone(), available - amount);
        Ok(())
    }

    /// Register the privileged trading-engine caller.
    ///
    /// Admin-only. Reconfiguration replaces the previous holder, so the
    /// grant is revocable by pointing it elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the caller is not the administrator.
    pub fn set_trading_engine(&mut self, caller: &AccountId, engine: AccountId) -> Result<()> {
        if caller != &self.admin {
            return Err(MarketError::Unauthorized);
        }
        self.trading_engine = Some(engine.clone());
        self.events.push(MarketEvent::TradingEngineSet { engine });
        Ok(())
    }

    /// Current balance of `user`. Pure read, any caller.
    pub fn balance_of(&self, user: &AccountId) -> u64 {
        self.balances.get(user).copied().unwrap_or(0)
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
