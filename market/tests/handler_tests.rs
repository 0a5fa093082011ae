// File: market/tests/handler_tests.rs


use std::sync::Arc;

use common::decimal::calculate_amount;
use common::error::Error;
use common::gateway::BankKeeper;
use common::model::coin::{AccAddress, Coin};
use common::model::order::{OrderId, Side};
use common::store::{KvStore, MemStore};
use market::{handle_msg, Keeper};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use test_helpers::*;

const HEIGHT: i64 = 100;

fn with_market() -> TestEnv {
    let mut env = setup();
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "cet", 8)).unwrap();
    env
}

#[test]
fn test_create_market() {
    let mut env = setup();
    let fee = env.keeper.config().create_market_fee.amount;

    let events = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "cet", 8)).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "create_market");
    assert_eq!(events[0].attribute("symbol"), Some("eth/cet"));
    assert_eq!(events[0].attribute("creator"), Some(ALICE));

    let info = env.keeper.markets().get_market_info(&env.store, "eth/cet").unwrap();
    assert_eq!(info.creator, addr(ALICE));
    assert_eq!(info.price_precision, 8);
    assert_eq!(info.last_executed_price, dec!(0));

    // The creation fee is charged once
    assert_eq!(env.bank.available(&addr(ALICE), "cet"), 2 * fee);
}

#[test]
fn test_duplicate_symbol() {
    let mut env = with_market();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "cet", 10));
    assert!(matches!(result, Err(Error::DuplicateSymbol(_))));

    // The reversed pair is a different market
    let mut env = with_market();
    env.assets.issue_token(bank::Token::new("usd", addr(ALICE))).unwrap();
    assert!(handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "usd", "eth", 8)).is_ok());
}

#[test]
fn test_price_precision_bounds() {
    for precision in [0u8, 7, 19, 255] {
        let mut env = setup();
        let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "cet", precision));
        assert!(
            matches!(result, Err(Error::InvalidPricePrecision(_))),
            "precision {} accepted",
            precision
        );
    }
    for precision in [8u8, 18] {
        let mut env = setup();
        let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "cet", precision));
        assert!(result.is_ok(), "precision {} rejected", precision);
    }

    // A bad precision wins over every stateful failure
    let mut env = with_market();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(BOB, "eth", "doge", 7));
    assert!(matches!(result, Err(Error::InvalidPricePrecision(_))));
}

#[test]
fn test_token_must_exist() {
    let mut env = setup();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "doge", 8));
    assert!(matches!(result, Err(Error::TokenNotFound(token)) if token == "doge"));
}

#[test]
fn test_issuer_requirement() {
    let mut env = setup();
    // Carol issued btc, not eth or cet
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(CAROL, "eth", "cet", 8));
    assert!(matches!(result, Err(Error::InvalidTokenIssuer(_))));

    // Issuing the money side is enough
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(CAROL, "eth", "btc", 8));
    assert!(result.is_ok());
}

#[test]
fn test_create_market_needs_fee() {
    let mut env = setup();
    env.assets.issue_token(bank::Token::new("usd", addr(BOB))).unwrap();
    let before = env.bank.available(&addr(BOB), "cet");

    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(BOB, "usd", "cet", 8));
    assert!(matches!(result, Err(Error::InsufficientBalance(_))));
    assert!(env.store.is_empty());
    assert_eq!(env.bank.available(&addr(BOB), "cet"), before);
}

#[test]
fn test_create_buy_order_freezes_money() {
    let mut env = with_market();

    // 1.0 cet per eth, ten eth
    let events = handle_msg(&env.keeper, &mut env.store, HEIGHT, &buy(BOB, 1, 100_000_000, 10)).unwrap();
    assert_eq!(events[0].kind, "create_order");
    assert_eq!(events[0].attribute("order-id"), Some("bob-1"));
    assert_eq!(events[0].attribute("freeze"), Some("10"));

    let order = env
        .keeper
        .global_orders()
        .query_order(&env.store, &OrderId::new(addr(BOB), 1))
        .unwrap()
        .unwrap();
    assert_eq!(order.freeze, 10);
    assert_eq!(order.left_stock, 10);
    assert_eq!(order.height, HEIGHT);
    assert_eq!(order.price, dec!(1));
    assert_eq!(order.side, Side::Buy);

    assert_eq!(env.bank.available(&addr(BOB), "cet"), 990);
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 10);
    assert_eq!(env.bank.frozen(&addr(BOB), "eth"), 0);
}

#[test]
fn test_create_sell_order_freezes_stock() {
    let mut env = with_market();

    // 0.5 cet per eth, twenty eth
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &sell(BOB, 2, 50_000_000, 20)).unwrap();
    let order = env
        .keeper
        .order_keeper("eth/cet")
        .get_order(&env.store, &OrderId::new(addr(BOB), 2))
        .unwrap()
        .unwrap();
    assert_eq!(order.freeze, 10);
    assert_eq!(env.bank.frozen(&addr(BOB), "eth"), 10);
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 0);
}

#[test]
fn test_create_order_rejections() {
    let mut env = with_market();

    let mut msg = order_msg(BOB, 1, Side::Buy, 100_000_000, 1);
    msg.symbol = "btc/cet".to_string();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &msg.into());
    assert!(matches!(result, Err(Error::SymbolNotFound(_))));

    let mut msg = order_msg(BOB, 1, Side::Buy, 100_000_000, 1);
    msg.price_precision = 9;
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &msg.into());
    assert!(matches!(result, Err(Error::InvalidPricePrecision(_))));

    // 1.0 cet per eth, 1001 eth, but bob holds 1000 cet
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &buy(BOB, 1, 100_000_000, 1_001));
    assert!(matches!(result, Err(Error::InsufficientBalance(_))));

    env.assets.set_frozen("cet", true).unwrap();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &buy(BOB, 1, 100_000_000, 1));
    assert!(matches!(result, Err(Error::TokenFrozenByIssuer(denom)) if denom == "cet"));
    // A sell locks eth, which is not frozen
    assert!(handle_msg(&env.keeper, &mut env.store, HEIGHT, &sell(BOB, 1, 100_000_000, 1)).is_ok());

    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &sell(BOB, 1, 100_000_000, 1));
    assert!(matches!(result, Err(Error::DuplicateOrder(_))));
    assert_eq!(env.bank.frozen(&addr(BOB), "eth"), 1);
}

#[test]
fn test_coarser_order_precision_is_accepted() {
    let mut env = setup();
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &create_market(ALICE, "eth", "cet", 12)).unwrap();

    let mut msg = order_msg(BOB, 1, Side::Buy, 250_000_000, 4);
    msg.price_precision = 8;
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &msg.into()).unwrap();
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 10);
}

#[test]
fn test_cancel_order() {
    let mut env = with_market();
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &buy(BOB, 1, 100_000_000, 10)).unwrap();

    let events = handle_msg(&env.keeper, &mut env.store, HEIGHT + 1, &cancel_order(BOB, BOB, 1)).unwrap();
    assert_eq!(events[0].kind, "del_order");
    assert_eq!(events[0].attribute("unfreeze"), Some("10"));

    assert_eq!(env.bank.available(&addr(BOB), "cet"), 1_000);
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 0);
    assert!(env
        .keeper
        .global_orders()
        .query_order(&env.store, &OrderId::new(addr(BOB), 1))
        .unwrap()
        .is_none());
    assert!(env.keeper.order_keeper("eth/cet").get_all_orders(&env.store).unwrap().is_empty());

    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT + 1, &cancel_order(BOB, BOB, 1));
    assert!(matches!(result, Err(Error::OrderNotFound(_))));
}

#[test]
fn test_cancel_authorization() {
    let mut env = with_market();
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &buy(BOB, 1, 100_000_000, 10)).unwrap();

    for requester in [ALICE, CAROL, CET_ISSUER] {
        let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_order(requester, BOB, 1));
        assert!(matches!(result, Err(Error::SenderMismatch(_))));
    }

    // Still rejected once the market is scheduled for removal
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_market(ALICE, "eth/cet", HEIGHT + 10_000)).unwrap();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_order(CAROL, BOB, 1));
    assert!(matches!(result, Err(Error::SenderMismatch(_))));
    assert_eq!(env.bank.frozen(&addr(BOB), "cet"), 10);
}

#[test]
fn test_delist_delay() {
    let mut env = with_market();
    let min = env.keeper.config().min_effect_height();

    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_market(ALICE, "eth/cet", HEIGHT + min - 1));
    assert!(matches!(result, Err(Error::InvalidEffectiveHeight(_))));
    assert!(env.keeper.delist().get_all_delist_requests(&env.store).unwrap().is_empty());

    let events = handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_market(ALICE, "eth/cet", HEIGHT + min)).unwrap();
    assert_eq!(events[0].kind, "cancel_market");
    assert_eq!(events[0].attribute("effective-height"), Some("10100"));

    let requests = env.keeper.delist().get_all_delist_requests(&env.store).unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].effective_height, HEIGHT + min);
    assert_eq!(requests[0].symbol, "eth/cet");
}

#[test]
fn test_cancel_market_rejections() {
    let mut env = with_market();
    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_market(ALICE, "btc/cet", HEIGHT + 20_000));
    assert!(matches!(result, Err(Error::SymbolNotFound(_))));

    let result = handle_msg(&env.keeper, &mut env.store, HEIGHT, &cancel_market(BOB, "eth/cet", HEIGHT + 20_000));
    assert!(matches!(result, Err(Error::SenderMismatch(_))));
}

/// Ledger that accepts every balance check and refuses to move anything
struct RefusingBank;

impl BankKeeper for RefusingBank {
    fn has_coins(&self, _: &AccAddress, _: &[Coin]) -> bool {
        true
    }

    fn subtract_coins(&self, address: &AccAddress, _: &[Coin]) -> common::Result<()> {
        Err(Error::InsufficientBalance(format!("{} is locked", address)))
    }

    fn freeze_coins(&self, address: &AccAddress, _: &Coin) -> common::Result<()> {
        Err(Error::InsufficientBalance(format!("{} is locked", address)))
    }

    fn unfreeze_coins(&self, address: &AccAddress, _: &Coin) -> common::Result<()> {
        Err(Error::InsufficientBalance(format!("{} is locked", address)))
    }
}

#[test]
fn test_failed_ledger_call_discards_writes() {
    let mut env = with_market();
    handle_msg(&env.keeper, &mut env.store, HEIGHT, &buy(BOB, 1, 100_000_000, 10)).unwrap();
    let before = env.store.range(&[], None);

    let keeper = Keeper::new(Arc::new(RefusingBank), env.assets.clone(), env.keeper.config().clone());
    for msg in [
        create_market(CAROL, "btc", "cet", 8),
        buy(BOB, 2, 100_000_000, 10),
        cancel_order(BOB, BOB, 1),
    ] {
        let result = handle_msg(&keeper, &mut env.store, HEIGHT, &msg);
        assert!(matches!(result, Err(Error::InsufficientBalance(_))), "{:?}", msg);
        assert_eq!(env.store.range(&[], None), before);
    }
}

#[test]
fn test_handler_on_empty_store() {
    let env = setup();
    let mut store = MemStore::new();
    let result = handle_msg(&env.keeper, &mut store, HEIGHT, &cancel_order(BOB, BOB, 1));
    assert!(matches!(result, Err(Error::OrderNotFound(_))));
    assert!(store.is_empty());
}

/// round half to even of price * quantity / 10^precision
fn expected_freeze(price: i64, quantity: i64, precision: u8) -> i128 {
    let numerator = i128::from(price) * i128::from(quantity);
    let scale = 10i128.pow(u32::from(precision));
    let (quotient, remainder) = (numerator / scale, numerator % scale);
    match (2 * remainder).cmp(&scale) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + (quotient % 2),
    }
}

#[test]
fn test_freeze_is_exact_for_large_orders() {
    let msg = market::MsgCreateOrder {
        price_precision: 18,
        ..order_msg(BOB, 1, Side::Sell, 1_277_777_766_666_666_667, 100_000_000_003)
    };
    let order = msg.to_order(HEIGHT).unwrap();
    assert_eq!(order.freeze, 127_777_776_671);
    assert_eq!(i128::from(order.freeze), expected_freeze(msg.price, msg.quantity, 18));
    assert!(order.check_consistency().is_ok());
}

proptest! {
    #[test]
    fn prop_freeze_matches_rounding_rule(
        price in 1i64..=i64::MAX,
        quantity in 1i64..=i64::MAX,
        precision in 8u8..=18,
    ) {
        let msg = order_msg(BOB, 1, Side::Sell, price, quantity);
        let msg = market::MsgCreateOrder { price_precision: precision, ..msg };
        let expected = expected_freeze(price, quantity, precision);

        match i64::try_from(expected) {
            Ok(expected) => {
                let first = msg.to_order(HEIGHT).unwrap();
                let second = msg.to_order(HEIGHT).unwrap();
                prop_assert_eq!(first.freeze, second.freeze);
                prop_assert_eq!(first.freeze, expected);
                prop_assert_eq!(calculate_amount(price, quantity, precision).unwrap(), expected);
            }
            Err(_) => {
                prop_assert!(matches!(msg.to_order(HEIGHT), Err(Error::InvalidOrder(_))));
            }
        }
    }
}
