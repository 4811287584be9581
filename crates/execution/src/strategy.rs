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

//! The fixed interface implemented by user strategies, and the context through
//! which strategies issue commands.
//!
//! Strategies receive events only via the message bus (the owning trader node
//! wires the subscriptions); they issue commands through the
//! [`StrategyContext`], which routes them to the risk engine endpoint.

use std::{cell::{Cell, RefCell}, collections::HashMap, rc::Rc};

use bytes::Bytes;
use meridian_common::{
    cache::Cache,
    clock::Clock,
    msgbus::{self, MessageBus},
    timer::{TimeEvent, TimeEventCallback},
};
use meridian_core::{UUID4, UnixNanos};
use meridian_model::{
    data::{Bar, QuoteTick, TradeTick},
    enums::{OrderSide, TimeInForce},
    events::{OrderEventAny, PositionEventAny},
    identifiers::{ClientOrderId, InstrumentId, PositionId, StrategyId, TraderId},
    orders::{LimitOrder, MarketOrder, Order, OrderAny},
    types::{Price, Quantity},
};
use ustr::Ustr;

use crate::messages::{CancelOrder, ModifyOrder, RISK_ENGINE_EXECUTE, SubmitOrder, TradingCommand};

/// The fixed interface implemented by user strategies.
#[allow(unused_variables)]
pub trait Strategy {
    /// Returns the strategy ID.
    fn strategy_id(&self) -> StrategyId;

    /// Called when the strategy starts.
    fn on_start(&mut self, ctx: &StrategyContext) {}

    /// Called when the strategy stops.
    fn on_stop(&mut self, ctx: &StrategyContext) {}

    /// Called when the strategy resets to its initial state.
    fn on_reset(&mut self) {}

    /// Called on every subscribed quote tick.
    fn on_quote_tick(&mut self, ctx: &StrategyContext, quote: &QuoteTick) {}

    /// Called on every subscribed trade tick.
    fn on_trade_tick(&mut self, ctx: &StrategyContext, trade: &TradeTick) {}

    /// Called on every subscribed bar.
    fn on_bar(&mut self, ctx: &StrategyContext, bar: &Bar) {}

    /// Called on every order event for this strategy.
    fn on_order_event(&mut self, ctx: &StrategyContext, event: &OrderEventAny) {}

    /// Called on every position event for this strategy.
    fn on_position_event(&mut self, ctx: &StrategyContext, event: &PositionEventAny) {}

    /// Called when a clock timer registered by the strategy fires.
    fn on_time_event(&mut self, ctx: &StrategyContext, event: &TimeEvent) {}

    /// Returns the strategy's user state for persistence.
    fn on_save(&self) -> HashMap<String, Bytes> {
        HashMap::new()
    }

    /// Restores the strategy's user state from persistence.
    fn on_load(&mut self, state: HashMap<String, Bytes>) {}
}

/// The context through which a strategy issues commands and reads state.
pub struct StrategyContext {
    /// The trader ID for the owning node.
    pub trader_id: TraderId,
    /// The strategy ID commands are issued under.
    pub strategy_id: StrategyId,
    clock: Rc<RefCell<dyn Clock>>,
    cache: Rc<RefCell<Cache>>,
    msgbus: Rc<RefCell<MessageBus>>,
    order_count: Cell<u64>,
}

impl StrategyContext {
    /// Creates a new [`StrategyContext`] instance.
    #[must_use]
    pub fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        clock: Rc<RefCell<dyn Clock>>,
        cache: Rc<RefCell<Cache>>,
        msgbus: Rc<RefCell<MessageBus>>,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            clock,
            cache,
            msgbus,
            order_count: Cell::new(0),
        }
    }

    /// Returns a shared handle to the cache.
    #[must_use]
    pub fn cache(&self) -> Rc<RefCell<Cache>> {
        self.cache.clone()
    }

    /// Returns a shared handle to the clock.
    #[must_use]
    pub fn clock(&self) -> Rc<RefCell<dyn Clock>> {
        self.clock.clone()
    }

    /// Returns the clock timer name for `name`, namespaced by the strategy
    /// ID so the owning node can route the fired events back to this
    /// strategy's `on_time_event`.
    #[must_use]
    pub fn timer_name(&self, name: &str) -> String {
        format!("{}:{name}", self.strategy_id)
    }

    /// Sets a time alert for this strategy at `alert_time_ns`.
    ///
    /// The fired event arrives via `Strategy::on_time_event`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is invalid.
    pub fn set_time_alert(&self, name: &str, alert_time_ns: UnixNanos) -> anyhow::Result<()> {
        self.clock.borrow_mut().set_time_alert_ns(
            &self.timer_name(name),
            alert_time_ns,
            TimeEventCallback::from(|_: TimeEvent| {}),
        )
    }

    /// Sets an interval timer for this strategy.
    ///
    /// The fired events arrive via `Strategy::on_time_event`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is invalid or `interval_ns` is zero.
    pub fn set_timer(
        &self,
        name: &str,
        interval_ns: u64,
        start_time_ns: Option<UnixNanos>,
        stop_time_ns: Option<UnixNanos>,
    ) -> anyhow::Result<()> {
        self.clock.borrow_mut().set_timer_ns(
            &self.timer_name(name),
            interval_ns,
            start_time_ns,
            stop_time_ns,
            TimeEventCallback::from(|_: TimeEvent| {}),
        )
    }

    /// Cancels this strategy's timer with `name`. Cancellation is idempotent.
    pub fn cancel_timer(&self, name: &str) {
        self.clock.borrow_mut().cancel_timer(&self.timer_name(name));
    }

    /// Generates the next client order ID, unique within the trader.
    #[must_use]
    pub fn generate_client_order_id(&self) -> ClientOrderId {
        let count = self.order_count.get() + 1;
        self.order_count.set(count);
        ClientOrderId::new(format!(
            "O-{}-{}-{}-{count}",
            self.clock.borrow().timestamp_ns(),
            self.trader_id.get_tag(),
            self.strategy_id.get_tag(),
        ))
    }

    /// Creates a market order for this strategy.
    #[must_use]
    pub fn market_order(
        &self,
        instrument_id: InstrumentId,
        order_side: OrderSide,
        quantity: Quantity,
        time_in_force: TimeInForce,
    ) -> MarketOrder {
        MarketOrder::new(
            self.trader_id,
            self.strategy_id,
            instrument_id,
            self.generate_client_order_id(),
            order_side,
            quantity,
            time_in_force,
            false,
            UUID4::new(),
            self.clock.borrow().timestamp_ns(),
        )
    }

    /// Creates a limit order for this strategy.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn limit_order(
        &self,
        instrument_id: InstrumentId,
        order_side: OrderSide,
        quantity: Quantity,
        price: Price,
        time_in_force: TimeInForce,
        post_only: bool,
    ) -> LimitOrder {
        LimitOrder::new(
            self.trader_id,
            self.strategy_id,
            instrument_id,
            self.generate_client_order_id(),
            order_side,
            quantity,
            price,
            time_in_force,
            None,
            post_only,
            false,
            UUID4::new(),
            self.clock.borrow().timestamp_ns(),
        )
    }

    /// Submits the given `order`, adding it to the cache and routing the
    /// command through the risk engine.
    ///
    /// # Errors
    ///
    /// Returns an error on a cache failure.
    pub fn submit_order(
        &self,
        order: OrderAny,
        position_id: Option<PositionId>,
    ) -> anyhow::Result<()> {
        self.cache
            .borrow_mut()
            .add_order(order.clone(), position_id)?;
        let command = TradingCommand::SubmitOrder(SubmitOrder::new(
            order,
            None,
            position_id,
            UUID4::new(),
            self.clock.borrow().timestamp_ns(),
        ));
        msgbus::send(
            &self.msgbus,
            &Ustr::from(RISK_ENGINE_EXECUTE),
            &command as &dyn std::any::Any,
        );
        Ok(())
    }

    /// Requests modification of a working order.
    pub fn modify_order(
        &self,
        order: &OrderAny,
        quantity: Option<Quantity>,
        price: Option<Price>,
        trigger_price: Option<Price>,
    ) {
        let command = TradingCommand::ModifyOrder(ModifyOrder {
            trader_id: self.trader_id,
            client_id: None,
            strategy_id: self.strategy_id,
            instrument_id: order.instrument_id(),
            client_order_id: order.client_order_id(),
            venue_order_id: order.venue_order_id(),
            quantity,
            price,
            trigger_price,
            command_id: UUID4::new(),
            ts_init: self.clock.borrow().timestamp_ns(),
        });
        msgbus::send(
            &self.msgbus,
            &Ustr::from(RISK_ENGINE_EXECUTE),
            &command as &dyn std::any::Any,
        );
    }

    /// Requests cancellation of a working order.
    pub fn cancel_order(&self, order: &OrderAny) {
        let command = TradingCommand::CancelOrder(CancelOrder {
            trader_id: self.trader_id,
            client_id: None,
            strategy_id: self.strategy_id,
            instrument_id: order.instrument_id(),
            client_order_id: order.client_order_id(),
            venue_order_id: order.venue_order_id(),
            command_id: UUID4::new(),
            ts_init: self.clock.borrow().timestamp_ns(),
        });
        msgbus::send(
            &self.msgbus,
            &Ustr::from(RISK_ENGINE_EXECUTE),
            &command as &dyn std::any::Any,
        );
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_common::clock::TestClock;
    use rstest::rstest;

    use super::*;

    fn context() -> StrategyContext {
        StrategyContext::new(
            TraderId::default(),
            StrategyId::new("EMACross-001"),
            Rc::new(RefCell::new(TestClock::new())),
            Rc::new(RefCell::new(Cache::default())),
            MessageBus::default().into_shared(),
        )
    }

    #[rstest]
    fn test_client_order_ids_are_unique() {
        let ctx = context();
        let first = ctx.generate_client_order_id();
        let second = ctx.generate_client_order_id();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("O-0-001-001-"));
    }

    #[rstest]
    fn test_submit_order_adds_to_cache() {
        let ctx = context();
        let order = ctx.market_order(
            InstrumentId::from("AUD/USD.SIM"),
            OrderSide::Buy,
            Quantity::from(100_000_u32),
            TimeInForce::Gtc,
        );
        let client_order_id = order.client_order_id();
        ctx.submit_order(OrderAny::Market(order), None).unwrap();
        assert!(ctx.cache().borrow().order(&client_order_id).is_some());
    }
}
