//! The host runtime — store ownership, dispatch, and settlement plumbing.
//!
//! One `Runtime` is one serialized execution domain: every state-changing
//! invocation runs to completion before the next begins, and every store
//! operation is validate-before-mutate, so a failed invocation leaves
//! the whole market untouched. The runtime also owns the native-currency
//! table used for trade payments and the globally ordered event log.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::account::{self, AccountId};
use crate::error::{MarketError, Result};
use crate::event::MarketEvent;
use crate::grid::GridRegistry;
use crate::host::call::{Call, LedgerCall, RegistryCall, Reply, Target, TradingCall};
use crate::host::keyring::Keyring;
use crate::ledger::EnergyLedger;
use crate::trading::{CancelPolicy, TradingEngine};

/// One entry of the global event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Strictly increasing sequence number.
    pub seq: u64,
    /// Emission timestamp (microseconds since Unix epoch).
    pub at: u64,
    /// The emitted event.
    pub event: MarketEvent,
}

/// Builder for a [`Runtime`].
pub struct RuntimeBuilder {
    admin: AccountId,
    strict_grids: bool,
    cancel_policy: CancelPolicy,
}

impl RuntimeBuilder {
    /// Start building a runtime administered by `admin`.
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            strict_grids: false,
            cancel_policy: CancelPolicy::default(),
        }
    }

    /// Validate `create_trade` grid ids against the registry.
    pub fn strict_grids(mut self, strict: bool) -> Self {
        self.strict_grids = strict;
        self
    }

    /// Select the trade-cancellation policy.
    pub fn cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    /// Construct the runtime and perform genesis wiring: the three
    /// stores are created with fresh addresses, the trading engine is
    /// registered as the ledger's privileged caller, and the ledger is
    /// registered as the engine's settlement target.
    ///
    /// # Errors
    ///
    /// Genesis wiring runs as the administrator and does not fail under
    /// normal construction; errors propagate from the configuration
    /// operations.
    pub fn build(self) -> Result<Runtime> {
        let ledger_account = account::generate().0;
        let registry_account = account::generate().0;
        let trading_account = account::generate().0;

        let mut runtime = Runtime {
            admin: self.admin.clone(),
            keyring: Keyring::new(),
            coins: HashMap::new(),
            ledger: EnergyLedger::new(ledger_account.clone(), self.admin.clone()),
            registry: GridRegistry::new(registry_account, self.admin.clone()),
            trading: TradingEngine::new(trading_account.clone(), self.admin.clone())
                .with_cancel_policy(self.cancel_policy),
            strict_grids: self.strict_grids,
            log: Vec::new(),
            next_seq: 0,
        };
        runtime
            .ledger
            .set_trading_engine(&self.admin, trading_account)?;
        runtime
            .trading
            .set_energy_ledger(&self.admin, ledger_account)?;
        runtime.pump_events();
        log::info!("runtime: genesis complete, admin {}", runtime.admin);
        Ok(runtime)
    }
}

/// In-process implementation of the execution-host contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runtime {
    /// The deploying identity; administrator of all three stores.
    admin: AccountId,
    /// Named local accounts.
    keyring: Keyring,
    /// Native-currency balances, in the smallest unit.
    coins: HashMap<AccountId, u128>,
    ledger: EnergyLedger,
    registry: GridRegistry,
    trading: TradingEngine,
    /// Validate trade-creation grid ids against the registry.
    strict_grids: bool,
    /// Globally ordered event log.
    log: Vec<EventRecord>,
    next_seq: u64,
}

impl Runtime {
    /// Create a runtime with default policies. See [`RuntimeBuilder`].
    ///
    /// # Errors
    ///
    /// Propagates genesis-wiring failures (none under normal
    /// construction).
    pub fn new(admin: AccountId) -> Result<Self> {
        RuntimeBuilder::new(admin).build()
    }

    /// Start building a runtime with explicit policies.
    pub fn builder(admin: AccountId) -> RuntimeBuilder {
        RuntimeBuilder::new(admin)
    }

    /// The administrator identity.
    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    /// The energy ledger.
    pub fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    /// The grid registry.
    pub fn registry(&self) -> &GridRegistry {
        &self.registry
    }

    /// The trading engine.
    pub fn trading(&self) -> &TradingEngine {
        &self.trading
    }

    /// The account keyring.
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// The global event log, in emission order.
    pub fn events(&self) -> &[EventRecord] {
        &self.log
    }

    /// Native-currency balance of `account`.
    pub fn coins_of(&self, account: &AccountId) -> u128 {
        self.coins.get(account).copied().unwrap_or(0)
    }

    /// Generate a named account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAlias` if the alias is already taken.
    pub fn create_account(&mut self, alias: &str) -> Result<AccountId> {
        Ok(self.keyring.create(alias)?.id.clone())
    }

    /// Adopt an existing account into the keyring under `alias`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAlias` if the alias is already taken.
    pub fn adopt_account(&mut self, alias: &str, id: AccountId, public_key: String) -> Result<()> {
        self.keyring.adopt(alias, id, public_key)?;
        Ok(())
    }

    /// Faucet: mint native currency to `account`.
    pub fn fund(&mut self, account: &AccountId, amount: u128) {
        *self.coins.entry(account.clone()).or_insert(0) += amount;
        log::debug!("runtime: funded {account} with {amount}");
    }

    /// Execute one invocation on behalf of `caller`, with `value`
    /// attached payment.
    ///
    /// All-or-nothing: on `Err` no store, coin, or log state changed.
    pub fn execute(&mut self, caller: &AccountId, value: u128, call: Call) -> Result<Reply> {
        log::debug!("runtime: execute caller={caller} value={value}");
        let reply = self.dispatch(caller, value, call)?;
        self.pump_events();
        Ok(reply)
    }

    fn dispatch(&mut self, caller: &AccountId, value: u128, call: Call) -> Result<Reply> {
        match call {
            Call::Raw { target, data } => Self::raw_failure(target, &data, value),
            call if value > 0 && !call.accepts_value() => {
                Err(MarketError::DirectPaymentRejected)
            }
            Call::Ledger(call) => self.dispatch_ledger(caller, call),
            Call::Registry(call) => self.dispatch_registry(caller, call),
            Call::Trading(call) => self.dispatch_trading(caller, value, call),
        }
    }

    /// Answer an invocation that matches no declared operation.
    fn raw_failure(target: Target, data: &[u8], value: u128) -> Result<Reply> {
        match target {
            Target::Ledger | Target::Registry => Err(MarketError::InvalidCall),
            // An empty invocation is the engine's receive path (a bare
            // payment); anything with data is the fallback path.
            Target::Trading if data.is_empty() => Err(MarketError::DirectPaymentRejected),
            Target::Trading => Err(MarketError::FallbackUnsupported),
        }
    }

    fn dispatch_ledger(&mut self, caller: &AccountId, call: LedgerCall) -> Result<Reply> {
        match call {
            LedgerCall::Credit { user, amount } => {
                self.ledger.credit(caller, &user, amount)?;
                Ok(Reply::Unit)
            }
            LedgerCall::Debit { user, amount } => {
                self.ledger.debit(caller, &user, amount)?;
                Ok(Reply::Unit)
            }
            LedgerCall::SetTradingEngine { engine } => {
                self.ledger.set_trading_engine(caller, engine)?;
                Ok(Reply::Unit)
            }
            LedgerCall::Balance { user } => Ok(Reply::Balance(self.ledger.balance_of(&user))),
        }
    }

    fn dispatch_registry(&mut self, caller: &AccountId, call: RegistryCall) -> Result<Reply> {
        match call {
            RegistryCall::CreateGrid {
                name,
                country_code,
                country_name,
            } => {
                self.registry
                    .create_grid(caller, &name, &country_code, &country_name)?;
                Ok(Reply::Unit)
            }
            RegistryCall::AddAuthorizedDevice { device } => {
                self.registry.add_authorized_device(caller, device)?;
                Ok(Reply::Unit)
            }
            RegistryCall::ListGridIds => Ok(Reply::GridIds(self.registry.grid_ids().to_vec())),
            RegistryCall::ListGrids => Ok(Reply::Grids(self.registry.grids())),
            RegistryCall::JoinGrid { grid_id } => {
                self.registry.join_grid(caller, &grid_id)?;
                Ok(Reply::Unit)
            }
            RegistryCall::IsConnected { user } => {
                Ok(Reply::Connected(self.registry.is_connected(&user)?))
            }
            RegistryCall::UserGridData { user } => {
                Ok(Reply::GridData(self.registry.user_grid(&user)?.clone()))
            }
        }
    }

    fn dispatch_trading(
        &mut self,
        caller: &AccountId,
        value: u128,
        call: TradingCall,
    ) -> Result<Reply> {
        match call {
            TradingCall::SetEnergyLedger { ledger } => {
                self.trading.set_energy_ledger(caller, ledger)?;
                Ok(Reply::Unit)
            }
            TradingCall::CreateTrade {
                grid_id,
                kwh,
                price_per_kwh,
                source_type_ids,
            } => {
                if self.strict_grids && !self.registry.contains_grid(&grid_id) {
                    return Err(MarketError::NoGridFound);
                }
                let trade_id = self.trading.create_trade(
                    &mut self.ledger,
                    caller,
                    &grid_id,
                    kwh,
                    price_per_kwh,
                    source_type_ids,
                )?;
                Ok(Reply::TradeId(trade_id))
            }
            TradingCall::CancelTrade { grid_id, trade_id } => {
                self.trading
                    .cancel_trade(&mut self.ledger, caller, &grid_id, &trade_id)?;
                Ok(Reply::Unit)
            }
            TradingCall::ActiveTrades { grid_id } => {
                Ok(Reply::Trades(self.trading.active_trades(&grid_id)))
            }
            TradingCall::BuyTrade { grid_id, trade_id } => {
                let available = self.coins_of(caller);
                if available < value {
                    return Err(MarketError::InsufficientFunds {
                        available,
                        required: value,
                    });
                }
                let settlement =
                    self.trading
                        .buy_trade(&mut self.ledger, caller, value, &grid_id, &trade_id)?;
                // The trade is already inactive; forward the payment.
                self.coins.insert(caller.clone(), available - value);
                *self.coins.entry(settlement.seller.clone()).or_insert(0) += value;
                log::info!(
                    "runtime: settled {} for {} to seller {}",
                    settlement.trade_id,
                    settlement.payment,
                    settlement.seller
                );
                Ok(Reply::Settlement(settlement))
            }
            TradingCall::AddSourceType {
                id,
                name,
                description,
            } => {
                self.trading
                    .add_source_type(caller, id, &name, &description)?;
                Ok(Reply::Unit)
            }
            TradingCall::SourceType { id } => Ok(Reply::SourceType(self.trading.source_type(id))),
        }
    }

    /// Drain store event logs into the global ordered log.
    fn pump_events(&mut self) {
        let at = crate::time::now_micros();
        let ledger_events = self.ledger.take_events();
        let registry_events = self.registry.take_events();
        let trading_events = self.trading.take_events();
        for event in ledger_events
            .into_iter()
            .chain(registry_events)
            .chain(trading_events)
        {
            self.next_seq += 1;
            self.log.push(EventRecord {
                seq: self.next_seq,
                at,
                event,
            });
        }
    }
}
