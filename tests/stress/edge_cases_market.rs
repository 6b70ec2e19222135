//! Edge cases across the three stores and the host runtime.

use wattmarket::account;
use wattmarket::grid::registry::{SEED_GRID_COUNTRY_CODE, SEED_GRID_NAME};
use wattmarket::{
    AccountId, Call, EnergyLedger, GridId, LedgerCall, MarketError, Reply, Runtime, TradingCall,
    TradingEngine,
};

fn wired_market() -> (EnergyLedger, TradingEngine, AccountId) {
    let admin = account::generate().0;
    let ledger_account = account::generate().0;
    let engine_account = account::generate().0;

    let mut ledger = EnergyLedger::new(ledger_account.clone(), admin.clone());
    let mut engine = TradingEngine::new(engine_account.clone(), admin.clone());
    ledger.set_trading_engine(&admin, engine_account).unwrap();
    engine.set_energy_ledger(&admin, ledger_account).unwrap();
    (ledger, engine, admin)
}

#[test]
fn double_cancel_fails_the_second_time() {
    let (mut ledger, mut engine, _) = wired_market();
    let seller = account::generate().0;
    let grid = GridId::derive("Grid-1", "SE");
    ledger.credit(&seller, &seller, 10).unwrap();

    let trade_id = engine
        .create_trade(&mut ledger, &seller, &grid, 5, 100, vec![])
        .unwrap();
    engine
        .cancel_trade(&mut ledger, &seller, &grid, &trade_id)
        .unwrap();
    assert!(matches!(
        engine.cancel_trade(&mut ledger, &seller, &grid, &trade_id),
        Err(MarketError::TradeInactive)
    ));
}

#[test]
fn trades_are_scoped_per_grid() {
    let (mut ledger, mut engine, _) = wired_market();
    let seller = account::generate().0;
    let buyer = account::generate().0;
    let here = GridId::derive("Grid-1", "SE");
    let elsewhere = GridId::derive("Grid-2", "SE");
    ledger.credit(&seller, &seller, 10).unwrap();

    let trade_id = engine
        .create_trade(&mut ledger, &seller, &here, 5, 100, vec![])
        .unwrap();

    // The same trade id does not resolve under another grid's scope.
    assert!(matches!(
        engine.buy_trade(&mut ledger, &buyer, 500, &elsewhere, &trade_id),
        Err(MarketError::TradeNotFound)
    ));
    assert!(engine.active_trades(&elsewhere).is_empty());
    assert_eq!(engine.active_trades(&here).len(), 1);
}

#[test]
fn grid_ids_are_an_opaque_namespace_by_default() {
    // Without strict mode the engine records trades against grids the
    // registry has never heard of; id correctness is the caller's
    // responsibility.
    let (mut ledger, mut engine, _) = wired_market();
    let seller = account::generate().0;
    let phantom = GridId::derive("Atlantis", "XX");
    ledger.credit(&seller, &seller, 10).unwrap();

    engine
        .create_trade(&mut ledger, &seller, &phantom, 5, 100, vec![])
        .unwrap();
    assert_eq!(engine.active_trades(&phantom).len(), 1);
}

#[test]
fn seller_may_buy_back_their_own_trade() {
    // Any buyer includes the seller; the energy and payment round-trip.
    let (mut ledger, mut engine, _) = wired_market();
    let seller = account::generate().0;
    let grid = GridId::derive("Grid-1", "SE");
    ledger.credit(&seller, &seller, 10).unwrap();

    let trade_id = engine
        .create_trade(&mut ledger, &seller, &grid, 5, 100, vec![])
        .unwrap();
    let settlement = engine
        .buy_trade(&mut ledger, &seller, 500, &grid, &trade_id)
        .unwrap();
    assert_eq!(settlement.seller, settlement.buyer);
    assert_eq!(ledger.balance_of(&seller), 10);
}

#[test]
fn exact_balance_debit_reaches_zero_not_below() {
    let (mut ledger, _, _) = wired_market();
    let user = account::generate().0;

    ledger.credit(&user, &user, 7).unwrap();
    ledger.debit(&user, &user, 7).unwrap();
    assert_eq!(ledger.balance_of(&user), 0);
    assert!(matches!(
        ledger.debit(&user, &user, 1),
        Err(MarketError::InsufficientBalance { .. })
    ));
}

#[test]
fn replaced_engine_loses_the_ledger_grant_mid_flight() {
    let (mut ledger, mut engine, admin) = wired_market();
    let seller = account::generate().0;
    let grid = GridId::derive("Grid-1", "SE");
    ledger.credit(&seller, &seller, 10).unwrap();

    // The admin re-points the ledger's privileged grant elsewhere.
    let usurper = account::generate().0;
    ledger.set_trading_engine(&admin, usurper).unwrap();

    // The old engine can no longer escrow: the whole create aborts and
    // the seller's balance is untouched.
    let err = engine
        .create_trade(&mut ledger, &seller, &grid, 5, 100, vec![])
        .unwrap_err();
    assert!(matches!(err, MarketError::Unauthorized));
    assert_eq!(ledger.balance_of(&seller), 10);
    assert!(engine.active_trades(&grid).is_empty());
}

#[test]
fn buyer_with_exact_zero_coins_cannot_attach_value() {
    let admin = account::generate().0;
    let mut runtime = Runtime::new(admin).unwrap();
    let seller = runtime.create_account("seller").unwrap();
    let broke = runtime.create_account("broke").unwrap();

    runtime
        .execute(
            &seller,
            0,
            Call::Ledger(LedgerCall::Credit {
                user: seller.clone(),
                amount: 10,
            }),
        )
        .unwrap();
    let grid = GridId::derive(SEED_GRID_NAME, SEED_GRID_COUNTRY_CODE);
    let reply = runtime
        .execute(
            &seller,
            0,
            Call::Trading(TradingCall::CreateTrade {
                grid_id: grid.clone(),
                kwh: 5,
                price_per_kwh: 100,
                source_type_ids: vec![],
            }),
        )
        .unwrap();
    let trade_id = match reply {
        Reply::TradeId(id) => id,
        other => panic!("expected trade id, got {other:?}"),
    };

    let err = runtime
        .execute(
            &broke,
            500,
            Call::Trading(TradingCall::BuyTrade {
                grid_id: grid,
                trade_id,
            }),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::InsufficientFunds {
            available: 0,
            required: 500
        }
    ));
}
