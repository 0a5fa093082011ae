//! Message dispatcher
//!
//! Each message is processed in the same steps: stateless validation, then
//! read-only precondition checks against the store and the gateways, then the
//! store writes into a write-buffer, then the ledger call. The buffer is
//! flushed only when the ledger call succeeded, so a rejected message never
//! changes the store.

use common::error::{Error, Result};
use common::model::coin::Coin;
use common::model::event::{Event, Tag};
use common::model::market::{split_symbol, MarketInfo};
use common::store::{CacheStore, KvStore};
use tracing::{debug, info};

use crate::keeper::Keeper;
use crate::msgs::{MarketMsg, MsgCancelMarket, MsgCancelOrder, MsgCreateMarketInfo, MsgCreateOrder};

/// Event emitted when an order is accepted
pub const EVENT_CREATE_ORDER: &str = "create_order";
/// Event emitted when an order leaves the book
pub const EVENT_DEL_ORDER: &str = "del_order";
/// Event emitted when a market is scheduled for removal
pub const EVENT_CANCEL_MARKET: &str = "cancel_market";

/// Reason recorded when the owner cancels an order
pub const CANCEL_ORDER_BY_OWNER: &str = "cancel-by-owner";

/// Apply one message at block `height`
pub fn handle_msg(
    keeper: &Keeper,
    store: &mut dyn KvStore,
    height: i64,
    msg: &MarketMsg,
) -> Result<Vec<Event>> {
    debug!("Handling {} from {} at height {}", msg.msg_type(), msg.signer(), height);
    match msg {
        MarketMsg::CreateMarketInfo(msg) => handle_create_market_info(keeper, store, msg),
        MarketMsg::CreateOrder(msg) => handle_create_order(keeper, store, height, msg),
        MarketMsg::CancelOrder(msg) => handle_cancel_order(keeper, store, msg),
        MarketMsg::CancelMarket(msg) => handle_cancel_market(keeper, store, height, msg),
    }
}

fn handle_create_market_info(
    keeper: &Keeper,
    store: &mut dyn KvStore,
    msg: &MsgCreateMarketInfo,
) -> Result<Vec<Event>> {
    msg.validate_basic()?;
    let fee = keeper.config().create_market_fee.clone();
    check_create_market_info(keeper, store, msg, &fee)?;

    let info = MarketInfo::new(
        msg.stock.clone(),
        msg.money.clone(),
        msg.creator.clone(),
        msg.price_precision,
    );

    let mut cache = CacheStore::new(store);
    let event = keeper.markets().create_market(&mut cache, &info)?;
    keeper.bank().subtract_coins(&msg.creator, &[fee])?;
    cache.write();

    Ok(vec![event])
}

fn check_create_market_info(
    keeper: &Keeper,
    store: &dyn KvStore,
    msg: &MsgCreateMarketInfo,
    fee: &Coin,
) -> Result<()> {
    let symbol = msg.symbol();
    if keeper.markets().has_market(store, &symbol) {
        return Err(Error::DuplicateSymbol(format!("market {} already exists", symbol)));
    }

    let assets = keeper.assets();
    for token in [&msg.stock, &msg.money] {
        if !assets.is_token_exists(token) {
            return Err(Error::TokenNotFound(token.clone()));
        }
    }

    if !assets.is_token_issuer(&msg.stock, &msg.creator)
        && !assets.is_token_issuer(&msg.money, &msg.creator)
    {
        return Err(Error::InvalidTokenIssuer(format!(
            "{} issued neither {} nor {}",
            msg.creator, msg.stock, msg.money
        )));
    }

    if !keeper.bank().has_coins(&msg.creator, std::slice::from_ref(fee)) {
        return Err(Error::InsufficientBalance(format!(
            "{} cannot pay the market creation fee {}",
            msg.creator, fee
        )));
    }
    Ok(())
}

fn handle_create_order(
    keeper: &Keeper,
    store: &mut dyn KvStore,
    height: i64,
    msg: &MsgCreateOrder,
) -> Result<Vec<Event>> {
    msg.validate_basic()?;

    let info = keeper.markets().get_market_info(store, &msg.symbol)?;
    if msg.price_precision > info.price_precision {
        return Err(Error::InvalidPricePrecision(format!(
            "order precision {} is finer than market {} precision {}",
            msg.price_precision, msg.symbol, info.price_precision
        )));
    }

    let order = msg.to_order(height)?;
    let coin = order.frozen_coin()?;
    if !keeper.bank().has_coins(&msg.sender, std::slice::from_ref(&coin)) {
        return Err(Error::InsufficientBalance(format!(
            "{} cannot freeze {} for order {}",
            msg.sender,
            coin,
            order.order_id()
        )));
    }
    if keeper.assets().is_token_frozen(&coin.denom) {
        return Err(Error::TokenFrozenByIssuer(coin.denom));
    }

    let mut cache = CacheStore::new(store);
    keeper.order_keeper(&msg.symbol).add(&mut cache, &order)?;
    if !coin.is_zero() {
        keeper.bank().freeze_coins(&msg.sender, &coin)?;
    }
    cache.write();

    info!("Accepted order {} on {} freezing {}", order.order_id(), order.symbol, coin);
    Ok(vec![Event::new(EVENT_CREATE_ORDER, order.tags_in_order_create())])
}

fn handle_cancel_order(
    keeper: &Keeper,
    store: &mut dyn KvStore,
    msg: &MsgCancelOrder,
) -> Result<Vec<Event>> {
    msg.validate_basic()?;

    let order = keeper
        .global_orders()
        .query_order(store, &msg.order_id)?
        .ok_or_else(|| Error::OrderNotFound(msg.order_id.to_string()))?;
    if order.sender != msg.sender {
        return Err(Error::SenderMismatch(format!(
            "{} cannot cancel order {}",
            msg.sender, msg.order_id
        )));
    }

    let mut cache = CacheStore::new(store);
    let order = keeper
        .order_keeper(&order.symbol)
        .remove(&mut cache, &msg.order_id)?;
    if order.freeze != 0 {
        keeper.bank().unfreeze_coins(&order.sender, &order.frozen_coin()?)?;
    }
    cache.write();

    info!("Cancelled order {} on {}", msg.order_id, order.symbol);
    Ok(vec![Event::new(
        EVENT_DEL_ORDER,
        order.tags_in_order_del(CANCEL_ORDER_BY_OWNER),
    )])
}

fn handle_cancel_market(
    keeper: &Keeper,
    store: &mut dyn KvStore,
    height: i64,
    msg: &MsgCancelMarket,
) -> Result<Vec<Event>> {
    msg.validate_basic()?;

    let earliest = height.saturating_add(keeper.config().min_effect_height());
    if msg.effective_height < earliest {
        return Err(Error::InvalidEffectiveHeight(format!(
            "effective height {} is before {}",
            msg.effective_height, earliest
        )));
    }

    let info = keeper.markets().get_market_info(store, &msg.symbol)?;
    if info.creator != msg.sender {
        return Err(Error::SenderMismatch(format!(
            "{} did not create market {}",
            msg.sender, msg.symbol
        )));
    }

    let mut cache = CacheStore::new(store);
    keeper
        .delist()
        .add_delist_request(&mut cache, msg.effective_height, &msg.symbol)?;
    cache.write();

    let (stock, money) = split_symbol(&msg.symbol)?;
    info!("Market {} scheduled for delist at height {}", msg.symbol, msg.effective_height);
    Ok(vec![Event::new(
        EVENT_CANCEL_MARKET,
        vec![
            Tag::new("symbol", &msg.symbol),
            Tag::new("stock", stock),
            Tag::new("money", money),
            Tag::new("sender", &msg.sender),
            Tag::new("effective-height", msg.effective_height),
        ],
    )])
}
