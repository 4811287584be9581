// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! An order matching engine for a single market.
//!
//! Matches incoming and resting orders against an L1 book maintained from
//! market data, with a probabilistic `FillModel` gating touched (versus
//! crossed) prices and injecting one-tick slippage. Order events are sent to
//! the execution engine's process endpoint.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use meridian_common::{
    clock::Clock,
    msgbus::{self, MessageBus},
};
use meridian_core::{UUID4, UnixNanos};
use meridian_model::{
    data::{Bar, OrderBookDelta, QuoteTick, TradeTick},
    enums::{
        AccountType, AggressorSide, LiquiditySide, OmsType, OrderSideSpecified, OrderStatus,
        OrderType, PriceType, TimeInForce,
    },
    events::{
        OrderAccepted, OrderCancelRejected, OrderCanceled, OrderEventAny, OrderExpired,
        OrderFilled, OrderModifyRejected, OrderRejected, OrderTriggered, OrderUpdated,
    },
    identifiers::{AccountId, ClientOrderId, InstrumentId, Venue, VenueOrderId},
    instruments::{Instrument, InstrumentAny},
    orderbook::OrderBook,
    orders::{Order, OrderAny, PassiveOrderAny, StopOrderAny},
    types::{Price, Quantity},
};
use ustr::Ustr;

use crate::{
    matching_core::OrderMatchingCore,
    matching_engine::{config::OrderMatchingEngineConfig, ids_generator::IdsGenerator},
    messages::{CancelOrder, EXEC_ENGINE_PROCESS, ModifyOrder},
    models::{FeeModel, FeeModelAny, FillModel},
};

/// An order matching engine for a single market.
pub struct OrderMatchingEngine {
    /// The venue for the matching engine.
    pub venue: Venue,
    /// The instrument for the matching engine.
    pub instrument: InstrumentAny,
    /// The instrument's raw integer ID for the venue.
    pub raw_id: u32,
    /// The order management system (OMS) type for the matching engine.
    pub oms_type: OmsType,
    /// The account type for the matching engine.
    pub account_type: AccountType,
    /// The config for the matching engine.
    pub config: OrderMatchingEngineConfig,
    /// The matching core holding market prices and resting orders.
    pub core: OrderMatchingCore,
    clock: Rc<RefCell<dyn Clock>>,
    msgbus: Rc<RefCell<MessageBus>>,
    book: OrderBook,
    fill_model: FillModel,
    fee_model: FeeModelAny,
    last_bar_bid: Option<Bar>,
    last_bar_ask: Option<Bar>,
    cached_filled_qty: HashMap<ClientOrderId, Quantity>,
    ids_generator: IdsGenerator,
    bar_trade_count: u64,
}

impl OrderMatchingEngine {
    /// Creates a new [`OrderMatchingEngine`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        instrument: InstrumentAny,
        raw_id: u32,
        fill_model: FillModel,
        fee_model: FeeModelAny,
        oms_type: OmsType,
        account_type: AccountType,
        clock: Rc<RefCell<dyn Clock>>,
        msgbus: Rc<RefCell<MessageBus>>,
        config: OrderMatchingEngineConfig,
    ) -> Self {
        let book = OrderBook::new(instrument.id());
        let core = OrderMatchingCore::new(instrument.id(), instrument.price_increment());
        let ids_generator = IdsGenerator::new(instrument.id().venue, raw_id);
        Self {
            venue: instrument.id().venue,
            instrument,
            raw_id,
            oms_type,
            account_type,
            config,
            core,
            clock,
            msgbus,
            book,
            fill_model,
            fee_model,
            last_bar_bid: None,
            last_bar_ask: None,
            cached_filled_qty: HashMap::new(),
            ids_generator,
            bar_trade_count: 0,
        }
    }

    /// Resets the engine to its initial state.
    pub fn reset(&mut self) {
        self.book.clear(UnixNanos::default());
        self.core.reset();
        self.last_bar_bid = None;
        self.last_bar_ask = None;
        self.cached_filled_qty.clear();
        self.ids_generator.reset();
        self.bar_trade_count = 0;

        log::info!("Reset {}", self.instrument.id());
    }

    /// Sets the fill model.
    pub fn set_fill_model(&mut self, fill_model: FillModel) {
        self.fill_model = fill_model;
    }

    /// Returns the best bid price, if any.
    #[must_use]
    pub fn best_bid_price(&self) -> Option<Price> {
        self.book.best_bid_price()
    }

    /// Returns the best ask price, if any.
    #[must_use]
    pub fn best_ask_price(&self) -> Option<Price> {
        self.book.best_ask_price()
    }

    /// Returns a reference to the engine's order book.
    #[must_use]
    pub const fn get_book(&self) -> &OrderBook {
        &self.book
    }

    /// Returns the open resting orders on both sides.
    #[must_use]
    pub fn get_open_orders(&self) -> Vec<PassiveOrderAny> {
        let mut orders = Vec::new();
        orders.extend_from_slice(self.core.get_orders_bid());
        orders.extend_from_slice(self.core.get_orders_ask());
        orders
    }

    /// Returns whether an order with the given `client_order_id` is resting.
    #[must_use]
    pub fn order_exists(&self, client_order_id: ClientOrderId) -> bool {
        self.core.order_exists(client_order_id)
    }

    // -- DATA PROCESSING -------------------------------------------------------------------------

    /// Processes the venue's market for the given `quote`.
    pub fn process_quote_tick(&mut self, quote: &QuoteTick) {
        log::debug!("Processing {quote}");
        self.book
            .update_quote_tick(quote)
            .expect("Quote for wrong instrument");
        self.iterate(quote.ts_event);
    }

    /// Processes the venue's market for the given `trade`.
    pub fn process_trade_tick(&mut self, trade: &TradeTick) {
        log::debug!("Processing {trade}");
        self.book
            .update_trade_tick(trade)
            .expect("Trade for wrong instrument");
        self.core.set_last_raw(trade.price);
        self.iterate(trade.ts_event);
    }

    /// Processes the venue's market for the given book `delta`.
    pub fn process_order_book_delta(&mut self, delta: &OrderBookDelta) {
        log::debug!("Processing {delta}");
        self.book
            .apply_delta(delta)
            .expect("Delta for wrong instrument");
        self.iterate(delta.ts_event);
    }

    /// Processes the venue's market for the given `bar`.
    ///
    /// The bar is decomposed into a deterministic open-high-low-close walk so
    /// that identical bar inputs replay identically: LAST/MID bars become
    /// trade ticks with quarter volume, BID/ASK bar pairs become quote ticks.
    pub fn process_bar(&mut self, bar: &Bar) {
        if !self.config.bar_execution {
            return;
        }
        log::debug!("Processing {bar}");

        match bar.bar_type.spec.price_type {
            PriceType::Last | PriceType::Mid => self.process_trade_ticks_from_bar(bar),
            PriceType::Bid => {
                self.last_bar_bid = Some(*bar);
                self.process_quote_ticks_from_bar(bar);
            }
            PriceType::Ask => {
                self.last_bar_ask = Some(*bar);
                self.process_quote_ticks_from_bar(bar);
            }
        }
    }

    fn process_trade_ticks_from_bar(&mut self, bar: &Bar) {
        // Split the bar into 4 trades with quarter volume
        let size = Quantity::new(bar.volume.as_f64() / 4.0, bar.volume.precision);
        let aggressor_side = if self.core.last.is_none_or(|last| bar.open > last) {
            AggressorSide::Buyer
        } else {
            AggressorSide::Seller
        };

        let mut trade = TradeTick::new(
            bar.instrument_id(),
            bar.open,
            size,
            aggressor_side,
            self.generate_bar_trade_id(),
            bar.ts_event,
            bar.ts_init,
        );

        // Open
        if self.core.last.is_none() {
            self.book.update_trade_tick(&trade).expect("instrument");
            self.core.set_last_raw(trade.price);
            self.iterate(trade.ts_event);
        }

        // High
        if self.core.last.is_some_and(|last| bar.high > last) {
            trade.price = bar.high;
            trade.aggressor_side = AggressorSide::Buyer;
            trade.trade_id = self.generate_bar_trade_id();
            self.book.update_trade_tick(&trade).expect("instrument");
            self.core.set_last_raw(trade.price);
            self.iterate(trade.ts_event);
        }

        // Low
        if self.core.last.is_some_and(|last| bar.low < last) {
            trade.price = bar.low;
            trade.aggressor_side = AggressorSide::Seller;
            trade.trade_id = self.generate_bar_trade_id();
            self.book.update_trade_tick(&trade).expect("instrument");
            self.core.set_last_raw(trade.price);
            self.iterate(trade.ts_event);
        }

        // Close
        if self.core.last.is_some_and(|last| bar.close != last) {
            trade.price = bar.close;
            trade.aggressor_side = if self.core.last.is_some_and(|last| bar.close > last) {
                AggressorSide::Buyer
            } else {
                AggressorSide::Seller
            };
            trade.trade_id = self.generate_bar_trade_id();
            self.book.update_trade_tick(&trade).expect("instrument");
            self.core.set_last_raw(trade.price);
            self.iterate(trade.ts_event);
        }
    }

    fn process_quote_ticks_from_bar(&mut self, bar: &Bar) {
        // Wait for the matching bid/ask bar of the pair
        let (bid_bar, ask_bar) = match (self.last_bar_bid, self.last_bar_ask) {
            (Some(bid_bar), Some(ask_bar)) if bid_bar.ts_event == ask_bar.ts_event => {
                (bid_bar, ask_bar)
            }
            _ => return,
        };
        let bid_size = Quantity::new(bid_bar.volume.as_f64() / 4.0, bar.volume.precision);
        let ask_size = Quantity::new(ask_bar.volume.as_f64() / 4.0, bar.volume.precision);

        let mut quote = QuoteTick::new(
            bar.instrument_id(),
            bid_bar.open,
            ask_bar.open,
            bid_size,
            ask_size,
            bid_bar.ts_event,
            bid_bar.ts_init,
        );

        // Open
        self.book.update_quote_tick(&quote).expect("instrument");
        self.iterate(quote.ts_event);

        // High
        quote.bid_price = bid_bar.high;
        quote.ask_price = ask_bar.high;
        self.book.update_quote_tick(&quote).expect("instrument");
        self.iterate(quote.ts_event);

        // Low
        quote.bid_price = bid_bar.low;
        quote.ask_price = ask_bar.low;
        self.book.update_quote_tick(&quote).expect("instrument");
        self.iterate(quote.ts_event);

        // Close
        quote.bid_price = bid_bar.close;
        quote.ask_price = ask_bar.close;
        self.book.update_quote_tick(&quote).expect("instrument");
        self.iterate(quote.ts_event);

        self.last_bar_bid = None;
        self.last_bar_ask = None;
    }

    fn generate_bar_trade_id(&mut self) -> meridian_model::identifiers::TradeId {
        self.bar_trade_count += 1;
        meridian_model::identifiers::TradeId::new(format!(
            "{}-{}-B-{}",
            self.venue, self.raw_id, self.bar_trade_count
        ))
    }

    // -- TRADING COMMANDS ------------------------------------------------------------------------

    /// Processes the given submitted `order`.
    pub fn process_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        if self.core.order_exists(order.client_order_id()) {
            self.generate_order_rejected(order, account_id, Ustr::from("Order already exists"));
            return;
        }

        // Check quantity precision
        if order.quantity().precision != self.instrument.size_precision() {
            self.generate_order_rejected(
                order,
                account_id,
                Ustr::from(&format!(
                    "Invalid order quantity precision for order {}, was {} when {} size precision is {}",
                    order.client_order_id(),
                    order.quantity().precision,
                    self.instrument.id(),
                    self.instrument.size_precision()
                )),
            );
            return;
        }

        // Check price precision
        if let Some(price) = order.price() {
            if price.precision != self.instrument.price_precision() {
                self.generate_order_rejected(
                    order,
                    account_id,
                    Ustr::from(&format!(
                        "Invalid order price precision for order {}, was {} when {} price precision is {}",
                        order.client_order_id(),
                        price.precision,
                        self.instrument.id(),
                        self.instrument.price_precision()
                    )),
                );
                return;
            }
        }

        // Check trigger price precision
        if let Some(trigger_price) = order.trigger_price() {
            if trigger_price.precision != self.instrument.price_precision() {
                self.generate_order_rejected(
                    order,
                    account_id,
                    Ustr::from(&format!(
                        "Invalid order trigger price precision for order {}, was {} when {} price precision is {}",
                        order.client_order_id(),
                        trigger_price.precision,
                        self.instrument.id(),
                        self.instrument.price_precision()
                    )),
                );
                return;
            }
        }

        match order.order_type() {
            OrderType::Market => self.process_market_order(order, account_id),
            OrderType::Limit => self.process_limit_order(order, account_id),
            OrderType::StopMarket => self.process_stop_market_order(order, account_id),
            OrderType::StopLimit => self.process_stop_limit_order(order, account_id),
        }
    }

    fn process_market_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        // Check the market exists on the taker side
        let has_market = match order.order_side_specified() {
            OrderSideSpecified::Buy => self.core.ask.is_some(),
            OrderSideSpecified::Sell => self.core.bid.is_some(),
        };
        if !has_market {
            self.generate_order_rejected(
                order,
                account_id,
                Ustr::from(&format!("No market for {}", order.instrument_id())),
            );
            return;
        }

        self.fill_market_order(order, account_id);
    }

    fn process_limit_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        let limit_px = order.price().expect("Limit order must have a price");
        let is_marketable = self
            .core
            .is_limit_matched(order.order_side_specified(), limit_px);

        if order.is_post_only() && is_marketable {
            self.generate_order_rejected(
                order,
                account_id,
                Ustr::from(&format!(
                    "POST_ONLY {} {} order limit px of {} would have been a TAKER: bid={}, ask={}",
                    order.order_type(),
                    order.order_side(),
                    limit_px,
                    self.core.bid.map_or("None".to_string(), |p| p.to_string()),
                    self.core.ask.map_or("None".to_string(), |p| p.to_string()),
                )),
            );
            return;
        }

        // Order is valid and accepted
        self.accept_order(order, account_id);

        if is_marketable {
            self.fill_limit_order(order, account_id, LiquiditySide::Taker);
        } else if matches!(order.time_in_force(), TimeInForce::Fok | TimeInForce::Ioc) {
            self.cancel_order(order, account_id);
        }
    }

    fn process_stop_market_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        let stop_px = order
            .trigger_price()
            .expect("Stop order must have a trigger price");
        if self
            .core
            .is_stop_matched(order.order_side_specified(), stop_px)
        {
            if self.config.reject_stop_orders {
                self.generate_order_rejected(
                    order,
                    account_id,
                    Ustr::from(&format!(
                        "{} {} order stop px of {} was in the market: bid={}, ask={}",
                        order.order_type(),
                        order.order_side(),
                        stop_px,
                        self.core.bid.map_or("None".to_string(), |p| p.to_string()),
                        self.core.ask.map_or("None".to_string(), |p| p.to_string()),
                    )),
                );
                return;
            }
            self.accept_order(order, account_id);
            self.fill_market_order(order, account_id);
            return;
        }

        // Not triggered, rests until the trigger
        self.accept_order(order, account_id);
    }

    fn process_stop_limit_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        let stop_px = order
            .trigger_price()
            .expect("Stop order must have a trigger price");
        if self
            .core
            .is_stop_matched(order.order_side_specified(), stop_px)
        {
            if self.config.reject_stop_orders {
                self.generate_order_rejected(
                    order,
                    account_id,
                    Ustr::from(&format!(
                        "{} {} order stop px of {} was in the market: bid={}, ask={}",
                        order.order_type(),
                        order.order_side(),
                        stop_px,
                        self.core.bid.map_or("None".to_string(), |p| p.to_string()),
                        self.core.ask.map_or("None".to_string(), |p| p.to_string()),
                    )),
                );
                return;
            }

            self.accept_order(order, account_id);
            self.trigger_stop_order(order, account_id);
            return;
        }

        // Not triggered, rests until the trigger
        self.accept_order(order, account_id);
    }

    /// Processes the given modify `command`.
    pub fn process_modify(&mut self, command: &ModifyOrder, account_id: AccountId) {
        let Some(resting) = self.core.get_order(command.client_order_id).cloned() else {
            self.generate_order_modify_rejected(
                command,
                account_id,
                Ustr::from(&format!("Order {} not found", command.client_order_id)),
            );
            return;
        };
        let mut order = resting.to_any();

        let quantity = command.quantity.unwrap_or(order.quantity());
        let price = command.price.or(order.price());
        let trigger_price = command.trigger_price.or(order.trigger_price());

        // A stop whose new trigger would already be in the market is rejected
        if order.trigger_price().is_some() && !self.is_triggered_stop_limit(&order) {
            if let Some(trigger_price) = trigger_price {
                if self
                    .core
                    .is_stop_matched(order.order_side_specified(), trigger_price)
                {
                    self.generate_order_modify_rejected(
                        command,
                        account_id,
                        Ustr::from(&format!(
                            "{} {} order new stop px of {trigger_price} was in the market: bid={}, ask={}",
                            order.order_type(),
                            order.order_side(),
                            self.core.bid.map_or("None".to_string(), |p| p.to_string()),
                            self.core.ask.map_or("None".to_string(), |p| p.to_string()),
                        )),
                    );
                    return;
                }
            }
        }

        self.generate_order_updated(&mut order, quantity, price, trigger_price);
        self.core
            .update_order(PassiveOrderAny::try_from(order.clone()).expect("passive"))
            .expect("Resting order update");

        // An updated limit which became marketable fills as a taker
        let fills_as_taker = match &order {
            OrderAny::Limit(o) => self
                .core
                .is_limit_matched(order.order_side_specified(), o.price),
            OrderAny::StopLimit(o) if o.is_triggered => self
                .core
                .is_limit_matched(order.order_side_specified(), o.price),
            _ => false,
        };
        if fills_as_taker {
            let _ = self.core.delete_order(order.client_order_id());
            self.fill_limit_order(&mut order, account_id, LiquiditySide::Taker);
        }
    }

    /// Processes the given cancel `command`.
    pub fn process_cancel(&mut self, command: &CancelOrder, account_id: AccountId) {
        match self.core.get_order(command.client_order_id).cloned() {
            Some(resting) => {
                let mut order = resting.to_any();
                self.cancel_order(&mut order, account_id);
            }
            None => self.generate_order_cancel_rejected(
                command,
                account_id,
                Ustr::from(&format!("Order {} not found", command.client_order_id)),
            ),
        }
    }

    // -- ORDER PROCESSING ------------------------------------------------------------------------

    /// Iterates the matching engine, matching resting orders against the
    /// current top of book at the given `timestamp_ns`.
    pub fn iterate(&mut self, timestamp_ns: UnixNanos) {
        if self.book.has_bid() {
            self.core.set_bid_raw(self.book.best_bid_price().unwrap());
        }
        if self.book.has_ask() {
            self.core.set_ask_raw(self.book.best_ask_price().unwrap());
        }

        // Resting orders iterate in price-time priority per side
        let orders_bid = self.core.get_orders_bid().to_vec();
        let orders_ask = self.core.get_orders_ask().to_vec();
        self.iterate_orders(timestamp_ns, &orders_bid);
        self.iterate_orders(timestamp_ns, &orders_ask);
    }

    fn iterate_orders(&mut self, timestamp_ns: UnixNanos, orders: &[PassiveOrderAny]) {
        for resting in orders {
            // The order may have been removed by an earlier match this round
            if !self.core.order_exists(resting.client_order_id()) {
                continue;
            }
            let mut order = resting.to_any();
            if order.is_closed() {
                continue;
            }
            let account_id = order.account_id().unwrap_or_default();

            // Check GTD expiration
            if self.config.support_gtd_orders {
                if let Some(expire_time) = order.expire_time() {
                    if timestamp_ns >= expire_time {
                        let _ = self.core.delete_order(order.client_order_id());
                        self.cached_filled_qty.remove(&order.client_order_id());
                        self.expire_order(&mut order);
                        continue;
                    }
                }
            }

            match resting {
                PassiveOrderAny::Limit(limit) => {
                    self.match_limit_order(&mut order, limit.price, account_id);
                }
                PassiveOrderAny::Stop(StopOrderAny::StopLimit(stop_limit))
                    if stop_limit.is_triggered =>
                {
                    self.match_triggered_stop_limit(&mut order, stop_limit.price, account_id);
                }
                PassiveOrderAny::Stop(stop) => {
                    self.match_stop_order(&mut order, stop.stop_px(), account_id);
                }
            }
        }
    }

    fn match_limit_order(&mut self, order: &mut OrderAny, price: Price, account_id: AccountId) {
        let side = order.order_side_specified();
        if !self.core.is_limit_matched(side, price) {
            return;
        }
        // A merely touched price fills with `prob_fill_on_limit` (models
        // queue-position uncertainty); a crossed price always fills.
        if self.core.is_limit_touched(side, price) && !self.fill_model.is_limit_filled() {
            return;
        }
        let _ = self.core.delete_order(order.client_order_id());
        self.fill_limit_order(order, account_id, LiquiditySide::Maker);
    }

    /// Matches a triggered stop-limit now working as a limit order.
    ///
    /// Having taken liquidity when it triggered, the order fills at the book
    /// price (bounded by its limit price) rather than resting at the limit.
    fn match_triggered_stop_limit(
        &mut self,
        order: &mut OrderAny,
        price: Price,
        account_id: AccountId,
    ) {
        let side = order.order_side_specified();
        if !self.core.is_limit_matched(side, price) {
            return;
        }
        if self.core.is_limit_touched(side, price) && !self.fill_model.is_limit_filled() {
            return;
        }
        let _ = self.core.delete_order(order.client_order_id());
        self.fill_limit_order(order, account_id, LiquiditySide::Taker);
    }

    fn match_stop_order(&mut self, order: &mut OrderAny, stop_px: Price, account_id: AccountId) {
        let side = order.order_side_specified();
        if !self.core.is_stop_matched(side, stop_px) {
            return;
        }
        // A merely touched trigger fires with `prob_fill_on_stop`
        if self.core.is_stop_touched(side, stop_px) && !self.fill_model.is_stop_filled() {
            return;
        }
        self.trigger_stop_order(order, account_id);
    }

    fn trigger_stop_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        match order.order_type() {
            OrderType::StopMarket => {
                let _ = self.core.delete_order(order.client_order_id());
                self.fill_market_order(order, account_id);
            }
            OrderType::StopLimit => {
                // Now works as a limit order at `price`, evaluated from the
                // next market update
                self.generate_order_triggered(order);
                self.core
                    .update_order(PassiveOrderAny::try_from(order.clone()).expect("passive"))
                    .ok();
            }
            _ => panic!("Invalid order type for stop trigger: {}", order.order_type()),
        }
    }

    /// Fills the given order as a market order at the top of book.
    pub fn fill_market_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        if self.is_already_filled(order) {
            return;
        }

        let side = order.order_side_specified();
        let top_of_book = match side {
            OrderSideSpecified::Buy => self.core.ask,
            OrderSideSpecified::Sell => self.core.bid,
        };
        let Some(mut fill_px) = top_of_book.or(self.core.last) else {
            self.generate_order_rejected(
                order,
                account_id,
                Ustr::from(&format!("No market for {}", order.instrument_id())),
            );
            return;
        };

        // Slip one tick adverse to the taker
        if self.fill_model.is_slipped() {
            fill_px = match side {
                OrderSideSpecified::Buy => fill_px + self.instrument.price_increment(),
                OrderSideSpecified::Sell => fill_px - self.instrument.price_increment(),
            };
        }

        self.fill_order(order, fill_px, order.leaves_qty(), LiquiditySide::Taker, account_id);
    }

    /// Fills the given limit order: takers fill at the top of book, makers at
    /// the limit price.
    pub fn fill_limit_order(
        &mut self,
        order: &mut OrderAny,
        account_id: AccountId,
        liquidity_side: LiquiditySide,
    ) {
        if self.is_already_filled(order) {
            return;
        }
        let limit_px = order.price().expect("Limit order must have a price");
        let fill_px = match liquidity_side {
            LiquiditySide::Taker => match order.order_side_specified() {
                OrderSideSpecified::Buy => self.core.ask.unwrap_or(limit_px).min(limit_px),
                OrderSideSpecified::Sell => self.core.bid.unwrap_or(limit_px).max(limit_px),
            },
            _ => limit_px,
        };

        self.fill_order(order, fill_px, order.leaves_qty(), liquidity_side, account_id);
    }

    fn is_already_filled(&self, order: &OrderAny) -> bool {
        self.cached_filled_qty
            .get(&order.client_order_id())
            .is_some_and(|filled| *filled >= order.quantity())
    }

    fn fill_order(
        &mut self,
        order: &mut OrderAny,
        last_px: Price,
        last_qty: Quantity,
        liquidity_side: LiquiditySide,
        account_id: AccountId,
    ) {
        if last_qty.is_zero() {
            return;
        }

        let filled = self
            .cached_filled_qty
            .entry(order.client_order_id())
            .or_insert_with(|| Quantity::zero(last_qty.precision));
        *filled += last_qty;

        let is_first_fill = order.filled_qty().is_zero();
        let commission = self
            .fee_model
            .get_commission(
                liquidity_side,
                last_qty,
                last_px,
                &self.instrument,
                is_first_fill,
            )
            .expect("Commission calculation");

        self.generate_order_filled(
            order,
            account_id,
            last_qty,
            last_px,
            commission,
            liquidity_side,
        );

        if order.is_closed() {
            let _ = self.core.delete_order(order.client_order_id());
            self.cached_filled_qty.remove(&order.client_order_id());
        }
    }

    fn accept_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        if order.is_closed() {
            return;
        }
        if order.status() != OrderStatus::Accepted {
            let venue_order_id = self.ids_generator.get_venue_order_id(order);
            self.generate_order_accepted(order, account_id, venue_order_id);
        }
        self.core.add_order(
            PassiveOrderAny::try_from(order.clone()).expect("market orders never rest"),
        );
    }

    fn cancel_order(&mut self, order: &mut OrderAny, account_id: AccountId) {
        let _ = self.core.delete_order(order.client_order_id());
        self.cached_filled_qty.remove(&order.client_order_id());
        self.generate_order_canceled(order, account_id);
    }

    fn expire_order(&mut self, order: &mut OrderAny) {
        self.generate_order_expired(order);
    }

    const fn is_triggered_stop_limit(&self, order: &OrderAny) -> bool {
        matches!(order, OrderAny::StopLimit(o) if o.is_triggered)
    }

    // -- EVENT GENERATORS ------------------------------------------------------------------------

    fn send_event(&self, event: OrderEventAny) {
        msgbus::send(
            &self.msgbus,
            &Ustr::from(EXEC_ENGINE_PROCESS),
            &event as &dyn std::any::Any,
        );
    }

    fn generate_order_rejected(&self, order: &mut OrderAny, account_id: AccountId, reason: Ustr) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::Rejected(OrderRejected::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            account_id,
            reason,
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }

    fn generate_order_accepted(
        &self,
        order: &mut OrderAny,
        account_id: AccountId,
        venue_order_id: VenueOrderId,
    ) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::Accepted(OrderAccepted::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            venue_order_id,
            account_id,
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }

    fn generate_order_triggered(&self, order: &mut OrderAny) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::Triggered(OrderTriggered::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            order.venue_order_id(),
            order.account_id(),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }

    fn generate_order_updated(
        &self,
        order: &mut OrderAny,
        quantity: Quantity,
        price: Option<Price>,
        trigger_price: Option<Price>,
    ) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::Updated(OrderUpdated::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            quantity,
            price,
            trigger_price,
            order.venue_order_id(),
            order.account_id(),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }

    fn generate_order_canceled(&self, order: &mut OrderAny, account_id: AccountId) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::Canceled(OrderCanceled::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            order.venue_order_id(),
            Some(account_id),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }

    fn generate_order_expired(&self, order: &mut OrderAny) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::Expired(OrderExpired::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            order.venue_order_id(),
            order.account_id(),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }

    fn generate_order_modify_rejected(
        &self,
        command: &ModifyOrder,
        account_id: AccountId,
        reason: Ustr,
    ) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::ModifyRejected(OrderModifyRejected::new(
            command.trader_id,
            command.strategy_id,
            command.instrument_id,
            command.client_order_id,
            reason,
            command.venue_order_id,
            Some(account_id),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
    }

    fn generate_order_cancel_rejected(
        &self,
        command: &CancelOrder,
        account_id: AccountId,
        reason: Ustr,
    ) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let event = OrderEventAny::CancelRejected(OrderCancelRejected::new(
            command.trader_id,
            command.strategy_id,
            command.instrument_id,
            command.client_order_id,
            reason,
            command.venue_order_id,
            Some(account_id),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
    }

    fn generate_order_filled(
        &mut self,
        order: &mut OrderAny,
        account_id: AccountId,
        last_qty: Quantity,
        last_px: Price,
        commission: meridian_model::types::Money,
        liquidity_side: LiquiditySide,
    ) {
        let ts_now = self.clock.borrow().timestamp_ns();
        let venue_order_id = self.ids_generator.get_venue_order_id(order);
        let event = OrderEventAny::Filled(OrderFilled::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            venue_order_id,
            account_id,
            self.ids_generator.generate_trade_id(),
            order.order_side(),
            order.order_type(),
            last_qty,
            last_px,
            self.instrument.quote_currency(),
            liquidity_side,
            None, // Position ID resolved by the execution engine OMS policy
            Some(commission),
            UUID4::new(),
            ts_now,
            ts_now,
        ));
        self.send_event(event);
        order.apply(event).expect("Failed to apply order event");
    }
}

/// Returns the instrument ID for the given engine.
impl OrderMatchingEngine {
    /// Returns the instrument ID for the matching engine.
    #[must_use]
    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument.id()
    }
}
