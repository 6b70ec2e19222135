//! Integration test: full end-to-end market lifecycle.
//!
//! Tests the complete flow:
//! 1. Genesis (stores wired, seeded grid and source types present)
//! 2. Accounts funded with energy and currency
//! 3. Grid creation and membership
//! 4. Trade creation (escrow)
//! 5. Settlement (energy credit paired with payment forwarding)
//! 6. Exactly-once lifecycle enforcement

use wattmarket::account;
use wattmarket::grid::registry::{SEED_GRID_COUNTRY_CODE, SEED_GRID_NAME};
use wattmarket::{
    Call, GridId, LedgerCall, MarketError, RegistryCall, Reply, Runtime, TradingCall,
};

fn seeded_grid() -> GridId {
    GridId::derive(SEED_GRID_NAME, SEED_GRID_COUNTRY_CODE)
}

#[test]
fn full_lifecycle_from_genesis_to_settlement() {
    // ── Step 1: Genesis ─────────────────────────────────────────────────
    let admin = account::generate().0;
    let mut runtime = Runtime::new(admin.clone()).unwrap();

    let ids = runtime.registry().grid_ids();
    assert_eq!(ids, &[seeded_grid()], "registry seeds exactly one grid");
    assert_eq!(runtime.trading().source_type(1).name, "Solar");
    assert_eq!(runtime.trading().source_type(2).name, "Wind");

    // ── Step 2: Accounts ────────────────────────────────────────────────
    let seller = runtime.create_account("seller").unwrap();
    let buyer = runtime.create_account("buyer").unwrap();
    runtime.fund(&buyer, 100_000);

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
    assert_eq!(runtime.ledger().balance_of(&seller), 10);

    // ── Step 3: Grid membership ─────────────────────────────────────────
    runtime
        .execute(
            &admin,
            0,
            Call::Registry(RegistryCall::CreateGrid {
                name: "Helsingborg".into(),
                country_code: "SE".into(),
                country_name: "Sweden".into(),
            }),
        )
        .unwrap();
    let market = GridId::derive("Helsingborg", "SE");

    for user in [&seller, &buyer] {
        runtime
            .execute(
                user,
                0,
                Call::Registry(RegistryCall::JoinGrid {
                    grid_id: market.clone(),
                }),
            )
            .unwrap();
    }
    assert_eq!(runtime.registry().user_grid(&seller).unwrap().member_count, 2);

    // ── Step 4: Trade creation escrows the energy ───────────────────────
    let reply = runtime
        .execute(
            &seller,
            0,
            Call::Trading(TradingCall::CreateTrade {
                grid_id: market.clone(),
                kwh: 5,
                price_per_kwh: 1_000,
                source_type_ids: vec![1, 2],
            }),
        )
        .unwrap();
    let trade_id = match reply {
        Reply::TradeId(id) => id,
        other => panic!("expected trade id, got {other:?}"),
    };
    assert_eq!(runtime.ledger().balance_of(&seller), 5);
    assert_eq!(runtime.trading().active_trades(&market).len(), 1);

    // ── Step 5: Settlement ──────────────────────────────────────────────
    runtime
        .execute(
            &buyer,
            5_000,
            Call::Trading(TradingCall::BuyTrade {
                grid_id: market.clone(),
                trade_id: trade_id.clone(),
            }),
        )
        .unwrap();

    assert_eq!(runtime.ledger().balance_of(&buyer), 5);
    assert_eq!(runtime.ledger().balance_of(&seller), 5);
    assert_eq!(runtime.coins_of(&seller), 5_000);
    assert_eq!(runtime.coins_of(&buyer), 95_000);
    assert!(runtime.trading().active_trades(&market).is_empty());

    // ── Step 6: The settled trade is terminal ───────────────────────────
    let err = runtime
        .execute(
            &seller,
            0,
            Call::Trading(TradingCall::CancelTrade {
                grid_id: market.clone(),
                trade_id: trade_id.clone(),
            }),
        )
        .unwrap_err();
    assert!(matches!(err, MarketError::TradeInactive));

    let err = runtime
        .execute(
            &buyer,
            5_000,
            Call::Trading(TradingCall::BuyTrade {
                grid_id: market,
                trade_id,
            }),
        )
        .unwrap_err();
    assert!(matches!(err, MarketError::TradeInactive));

    // Every successful step is on the event log, in order.
    let tags: Vec<_> = runtime.events().iter().map(|r| r.event.as_tag()).collect();
    assert_eq!(
        tags,
        vec![
            "trading_engine_set",
            "grid_created",
            "energy_ledger_set",
            "grid_created",
            "member_joined",
            "member_joined",
            "trade_created",
            "trade_settled",
        ]
    );
}

#[test]
fn undersized_trade_is_rejected_without_touching_the_escrow() {
    let admin = account::generate().0;
    let mut runtime = Runtime::new(admin).unwrap();
    let seller = runtime.create_account("seller").unwrap();

    runtime
        .execute(
            &seller,
            0,
            Call::Ledger(LedgerCall::Credit {
                user: seller.clone(),
                amount: 20,
            }),
        )
        .unwrap();

    let err = runtime
        .execute(
            &seller,
            0,
            Call::Trading(TradingCall::CreateTrade {
                grid_id: seeded_grid(),
                kwh: 2,
                price_per_kwh: 1_000,
                source_type_ids: vec![1, 2],
            }),
        )
        .unwrap_err();
    assert!(matches!(err, MarketError::QuantityTooLow { minimum: 5 }));
    assert_eq!(runtime.ledger().balance_of(&seller), 20);
    assert!(runtime.trading().active_trades(&seeded_grid()).is_empty());
}

#[test]
fn fresh_user_can_join_the_seeded_grid() {
    let admin = account::generate().0;
    let mut runtime = Runtime::new(admin).unwrap();
    let user = runtime.create_account("user").unwrap();

    let reply = runtime
        .execute(&user, 0, Call::Registry(RegistryCall::ListGridIds))
        .unwrap();
    let ids = match reply {
        Reply::GridIds(ids) => ids,
        other => panic!("expected grid ids, got {other:?}"),
    };
    assert_eq!(ids, vec![seeded_grid()]);

    runtime
        .execute(
            &user,
            0,
            Call::Registry(RegistryCall::JoinGrid {
                grid_id: seeded_grid(),
            }),
        )
        .unwrap();
    assert!(runtime.registry().is_connected(&user).unwrap());
}

#[test]
fn membership_is_exactly_once_across_grids() {
    let admin = account::generate().0;
    let mut runtime = Runtime::new(admin.clone()).unwrap();
    let user = runtime.create_account("user").unwrap();

    runtime
        .execute(
            &admin,
            0,
            Call::Registry(RegistryCall::CreateGrid {
                name: "Lund".into(),
                country_code: "SE".into(),
                country_name: "Sweden".into(),
            }),
        )
        .unwrap();

    runtime
        .execute(
            &user,
            0,
            Call::Registry(RegistryCall::JoinGrid {
                grid_id: seeded_grid(),
            }),
        )
        .unwrap();

    for grid_id in [seeded_grid(), GridId::derive("Lund", "SE")] {
        let err = runtime
            .execute(&user, 0, Call::Registry(RegistryCall::JoinGrid { grid_id }))
            .unwrap_err();
        assert!(matches!(err, MarketError::UserAlreadyInGrid));
    }
}

#[test]
fn payment_must_be_exact_to_the_unit() {
    let admin = account::generate().0;
    let mut runtime = Runtime::new(admin).unwrap();
    let seller = runtime.create_account("seller").unwrap();
    let buyer = runtime.create_account("buyer").unwrap();
    runtime.fund(&buyer, 100_000);

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
    let reply = runtime
        .execute(
            &seller,
            0,
            Call::Trading(TradingCall::CreateTrade {
                grid_id: seeded_grid(),
                kwh: 5,
                price_per_kwh: 1_000,
                source_type_ids: vec![],
            }),
        )
        .unwrap();
    let trade_id = match reply {
        Reply::TradeId(id) => id,
        other => panic!("expected trade id, got {other:?}"),
    };

    for payment in [4_999u128, 5_001] {
        let err = runtime
            .execute(
                &buyer,
                payment,
                Call::Trading(TradingCall::BuyTrade {
                    grid_id: seeded_grid(),
                    trade_id: trade_id.clone(),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, MarketError::IncorrectPayment { .. }));
        assert_eq!(runtime.coins_of(&buyer), 100_000);
    }

    runtime
        .execute(
            &buyer,
            5_000,
            Call::Trading(TradingCall::BuyTrade {
                grid_id: seeded_grid(),
                trade_id,
            }),
        )
        .unwrap();
    assert_eq!(runtime.coins_of(&buyer), 95_000);
}
