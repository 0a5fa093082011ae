// File: market/tests/keeper_tests.rs


use common::error::Error;
use common::model::coin::AccAddress;
use common::model::market::MarketInfo;
use common::model::order::{Order, OrderId, OrderType, Side, TimeInForce};
use common::store::{CacheStore, KvStore, MemStore};
use market::{handle_msg, DelistKeeper, GlobalOrderKeeper, MarketRegistry, OrderKeeper};
use rust_decimal_macros::dec;
use test_helpers::*;

fn eth_cet() -> MarketInfo {
    MarketInfo::new("eth".to_string(), "cet".to_string(), addr(ALICE), 8)
}

fn create_test_order(sender: &str, sequence: u64, quantity: i64) -> Order {
    Order {
        sender: AccAddress::from(sender),
        sequence,
        symbol: "eth/cet".to_string(),
        order_type: OrderType::Limit,
        price: dec!(2),
        quantity,
        side: Side::Buy,
        time_in_force: TimeInForce::GTC,
        height: 1,
        left_stock: quantity,
        freeze: 2 * quantity,
        deal_money: 0,
        deal_stock: 0,
        frozen_commission: 0,
        frozen_fee: 0,
    }
}

#[test]
fn test_market_registry() {
    let registry = MarketRegistry::new();
    let mut store = MemStore::new();

    assert!(matches!(
        registry.get_market_info(&store, "eth/cet"),
        Err(Error::SymbolNotFound(_))
    ));

    let event = registry.create_market(&mut store, &eth_cet()).unwrap();
    assert_eq!(event.attribute("price-precision"), Some("8"));
    assert!(registry.has_market(&store, "eth/cet"));
    assert_eq!(registry.get_market_info(&store, "eth/cet").unwrap(), eth_cet());
    assert!(matches!(
        registry.create_market(&mut store, &eth_cet()),
        Err(Error::DuplicateSymbol(_))
    ));

    let mut traded = eth_cet();
    traded.last_executed_price = dec!(1.25);
    registry.set_market_info(&mut store, &traded).unwrap();
    assert_eq!(
        registry.get_market_info(&store, "eth/cet").unwrap().last_executed_price,
        dec!(1.25)
    );

    registry.remove_market(&mut store, "eth/cet").unwrap();
    assert!(!registry.has_market(&store, "eth/cet"));
    assert!(matches!(
        registry.remove_market(&mut store, "eth/cet"),
        Err(Error::SymbolNotFound(_))
    ));
    assert!(matches!(
        registry.set_market_info(&mut store, &traded),
        Err(Error::SymbolNotFound(_))
    ));
}

#[test]
fn test_get_all_markets_in_key_order() {
    let registry = MarketRegistry::new();
    let mut store = MemStore::new();
    for (stock, money) in [("eth", "cet"), ("btc", "cet"), ("btc", "eth")] {
        let info = MarketInfo::new(stock.to_string(), money.to_string(), addr(ALICE), 8);
        registry.create_market(&mut store, &info).unwrap();
    }

    let symbols: Vec<String> = registry
        .get_all_markets(&store)
        .unwrap()
        .iter()
        .map(|m| m.symbol())
        .collect();
    assert_eq!(symbols, vec!["btc/cet", "btc/eth", "eth/cet"]);
}

#[test]
fn test_order_keeper_add_and_remove() {
    let ork = OrderKeeper::new("eth/cet");
    let global = GlobalOrderKeeper::new();
    let mut store = MemStore::new();
    let order = create_test_order(BOB, 1, 5);

    ork.add(&mut store, &order).unwrap();
    assert!(matches!(ork.add(&mut store, &order), Err(Error::DuplicateOrder(_))));

    let id = OrderId::new(addr(BOB), 1);
    assert_eq!(ork.get_order(&store, &id).unwrap(), Some(order.clone()));
    assert_eq!(global.query_order(&store, &id).unwrap(), Some(order.clone()));

    let removed = ork.remove(&mut store, &id).unwrap();
    assert_eq!(removed, order);
    assert!(ork.get_order(&store, &id).unwrap().is_none());
    assert!(global.query_order(&store, &id).unwrap().is_none());
    assert!(store.is_empty());

    assert!(matches!(ork.remove(&mut store, &id), Err(Error::OrderNotFound(_))));
}

#[test]
fn test_order_keeper_rejects_foreign_symbol() {
    let ork = OrderKeeper::new("btc/cet");
    let mut store = MemStore::new();
    assert!(matches!(
        ork.add(&mut store, &create_test_order(BOB, 1, 5)),
        Err(Error::InvalidOrder(_))
    ));
    assert!(store.is_empty());
}

#[test]
fn test_order_identity_is_global() {
    let mut store = MemStore::new();
    OrderKeeper::new("eth/cet")
        .add(&mut store, &create_test_order(BOB, 1, 5))
        .unwrap();

    let mut other = create_test_order(BOB, 1, 5);
    other.symbol = "btc/cet".to_string();
    assert!(matches!(
        OrderKeeper::new("btc/cet").add(&mut store, &other),
        Err(Error::DuplicateOrder(_))
    ));
}

#[test]
fn test_order_keeper_update() {
    let ork = OrderKeeper::new("eth/cet");
    let global = GlobalOrderKeeper::new();
    let mut store = MemStore::new();
    let mut order = create_test_order(BOB, 1, 5);
    ork.add(&mut store, &order).unwrap();

    // Partial fill
    order.left_stock = 2;
    order.deal_stock = 3;
    order.deal_money = 6;
    order.freeze = 4;
    ork.update(&mut store, &order).unwrap();
    assert_eq!(global.query_order(&store, &order.order_id()).unwrap(), Some(order.clone()));

    // Full execution removes the order from both indices
    order.left_stock = 0;
    order.deal_stock = 5;
    order.deal_money = 10;
    order.freeze = 0;
    ork.update(&mut store, &order).unwrap();
    assert!(store.is_empty());

    assert!(matches!(ork.update(&mut store, &order), Err(Error::OrderNotFound(_))));
}

#[test]
fn test_iterate_is_ordered_and_stoppable() {
    let ork = OrderKeeper::new("eth/cet");
    let mut store = MemStore::new();
    for (sender, sequence) in [("bob", 10), ("carol", 1), ("bob", 2), ("al", 7)] {
        ork.add(&mut store, &create_test_order(sender, sequence, 1)).unwrap();
    }
    OrderKeeper::new("eth/usd")
        .add(&mut store, &Order {
            symbol: "eth/usd".to_string(),
            ..create_test_order("dave", 1, 1)
        })
        .unwrap();

    let mut seen = Vec::new();
    ork.iterate(&store, |order| {
        seen.push(order.order_id().to_string());
        true
    })
    .unwrap();
    assert_eq!(seen, vec!["al-7", "bob-2", "bob-10", "carol-1"]);

    // Restarting gives the same traversal; returning false stops it
    let mut first = Vec::new();
    ork.iterate(&store, |order| {
        first.push(order.order_id().to_string());
        first.len() < 2
    })
    .unwrap();
    assert_eq!(first, vec!["al-7", "bob-2"]);

    assert_eq!(ork.get_all_orders(&store).unwrap().len(), 4);
    assert_eq!(GlobalOrderKeeper::new().get_all_orders(&store).unwrap().len(), 5);
}

#[test]
fn test_delist_keeper() {
    let delist = DelistKeeper::new();
    let mut store = MemStore::new();
    delist.add_delist_request(&mut store, 300, "eth/cet").unwrap();
    delist.add_delist_request(&mut store, 200, "btc/cet").unwrap();
    delist.add_delist_request(&mut store, 200, "abc/cet").unwrap();

    assert!(delist.get_due_requests(&store, 199).unwrap().is_empty());
    assert!(delist.get_due_requests(&store, -1).unwrap().is_empty());

    let due: Vec<(i64, String)> = delist
        .get_due_requests(&store, 250)
        .unwrap()
        .into_iter()
        .map(|r| (r.effective_height, r.symbol))
        .collect();
    assert_eq!(due, vec![(200, "abc/cet".to_string()), (200, "btc/cet".to_string())]);
    assert_eq!(delist.get_due_requests(&store, i64::MAX).unwrap().len(), 3);

    let first = delist.get_all_delist_requests(&store).unwrap().remove(0);
    assert!(delist.has_delist_request(&store, &first));
    delist.remove_delist_request(&mut store, &first).unwrap();
    assert!(!delist.has_delist_request(&store, &first));
    assert_eq!(delist.get_all_delist_requests(&store).unwrap().len(), 2);

    assert!(matches!(
        delist.add_delist_request(&mut store, -5, "eth/cet"),
        Err(Error::InvalidEffectiveHeight(_))
    ));
}

#[test]
fn test_enact_due_is_idempotent() {
    let mut env = setup();
    handle_msg(&env.keeper, &mut env.store, 1, &create_market(ALICE, "eth", "cet", 8)).unwrap();
    handle_msg(&env.keeper, &mut env.store, 1, &buy(BOB, 1, 100_000_000, 10)).unwrap();
    handle_msg(&env.keeper, &mut env.store, 1, &sell(BOB, 2, 300_000_000, 5)).unwrap();
    handle_msg(&env.keeper, &mut env.store, 1, &cancel_market(ALICE, "eth/cet", 10_001)).unwrap();
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 10);
    assert_eq!(env.bank.frozen(&addr(BOB), "eth"), 15);

    assert!(env.keeper.enact_due(&mut env.store, 10_000).unwrap().is_empty());
    assert!(env.keeper.markets().has_market(&env.store, "eth/cet"));

    let events = env.keeper.enact_due(&mut env.store, 10_001).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "delist_market");
    assert_eq!(events[0].attribute("removed-orders"), Some("2"));
    assert!(!env.keeper.markets().has_market(&env.store, "eth/cet"));
    assert!(env.store.is_empty());

    // Orders leaving with the market give their coins back
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 0);
    assert_eq!(env.bank.frozen(&addr(BOB), "eth"), 0);
    assert_eq!(env.bank.available(&addr(BOB), "eth"), 100);

    assert!(env.keeper.enact_due(&mut env.store, 10_001).unwrap().is_empty());
}

#[test]
fn test_enact_due_consumes_request_without_market() {
    let env = setup();
    let mut store = MemStore::new();
    env.keeper.delist().add_delist_request(&mut store, 5, "gone/cet").unwrap();

    assert!(env.keeper.enact_due(&mut store, 5).unwrap().is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_keepers_work_through_cache() {
    let mut parent = MemStore::new();
    {
        let mut cache = CacheStore::new(&mut parent);
        OrderKeeper::new("eth/cet")
            .add(&mut cache, &create_test_order(BOB, 1, 5))
            .unwrap();
        assert!(GlobalOrderKeeper::new()
            .query_order(&cache, &OrderId::new(addr(BOB), 1))
            .unwrap()
            .is_some());
    }
    assert!(parent.is_empty());
    assert!(parent.range(&[], None).is_empty());
}
