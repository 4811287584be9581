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

//! A fluent builder for orders, primarily for use in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use meridian_core::{UUID4, UnixNanos};

use crate::{
    enums::{OrderSide, OrderType, TimeInForce},
    identifiers::{ClientOrderId, InstrumentId, StrategyId, TraderId},
    orders::{LimitOrder, MarketOrder, OrderAny, StopLimitOrder, StopMarketOrder},
    types::{Price, Quantity},
};

static CLIENT_ORDER_ID_COUNT: AtomicU64 = AtomicU64::new(0);

/// A fluent builder for orders with sensible defaults.
#[derive(Debug)]
pub struct OrderTestBuilder {
    order_type: OrderType,
    trader_id: TraderId,
    strategy_id: StrategyId,
    instrument_id: Option<InstrumentId>,
    client_order_id: Option<ClientOrderId>,
    side: OrderSide,
    quantity: Option<Quantity>,
    price: Option<Price>,
    trigger_price: Option<Price>,
    time_in_force: TimeInForce,
    expire_time: Option<UnixNanos>,
    post_only: bool,
    reduce_only: bool,
    ts_init: UnixNanos,
}

impl OrderTestBuilder {
    /// Creates a new [`OrderTestBuilder`] for the given `order_type`.
    #[must_use]
    pub fn new(order_type: OrderType) -> Self {
        Self {
            order_type,
            trader_id: TraderId::default(),
            strategy_id: StrategyId::default(),
            instrument_id: None,
            client_order_id: None,
            side: OrderSide::Buy,
            quantity: None,
            price: None,
            trigger_price: None,
            time_in_force: TimeInForce::Gtc,
            expire_time: None,
            post_only: false,
            reduce_only: false,
            ts_init: UnixNanos::default(),
        }
    }

    /// Sets the trader ID.
    pub fn trader_id(&mut self, trader_id: TraderId) -> &mut Self {
        self.trader_id = trader_id;
        self
    }

    /// Sets the strategy ID.
    pub fn strategy_id(&mut self, strategy_id: StrategyId) -> &mut Self {
        self.strategy_id = strategy_id;
        self
    }

    /// Sets the instrument ID.
    pub fn instrument_id(&mut self, instrument_id: InstrumentId) -> &mut Self {
        self.instrument_id = Some(instrument_id);
        self
    }

    /// Sets the client order ID.
    pub fn client_order_id(&mut self, client_order_id: ClientOrderId) -> &mut Self {
        self.client_order_id = Some(client_order_id);
        self
    }

    /// Sets the order side.
    pub fn side(&mut self, side: OrderSide) -> &mut Self {
        self.side = side;
        self
    }

    /// Sets the order quantity.
    pub fn quantity(&mut self, quantity: Quantity) -> &mut Self {
        self.quantity = Some(quantity);
        self
    }

    /// Sets the limit price.
    pub fn price(&mut self, price: Price) -> &mut Self {
        self.price = Some(price);
        self
    }

    /// Sets the trigger price.
    pub fn trigger_price(&mut self, trigger_price: Price) -> &mut Self {
        self.trigger_price = Some(trigger_price);
        self
    }

    /// Sets the time in force.
    pub fn time_in_force(&mut self, time_in_force: TimeInForce) -> &mut Self {
        self.time_in_force = time_in_force;
        self
    }

    /// Sets the expire time (for GTD).
    pub fn expire_time(&mut self, expire_time: UnixNanos) -> &mut Self {
        self.expire_time = Some(expire_time);
        self
    }

    /// Sets the post-only flag.
    pub fn post_only(&mut self, post_only: bool) -> &mut Self {
        self.post_only = post_only;
        self
    }

    /// Sets the reduce-only flag.
    pub fn reduce_only(&mut self, reduce_only: bool) -> &mut Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Sets the initialization timestamp.
    pub fn ts_init(&mut self, ts_init: UnixNanos) -> &mut Self {
        self.ts_init = ts_init;
        self
    }

    fn next_client_order_id(&self) -> ClientOrderId {
        match self.client_order_id {
            Some(client_order_id) => client_order_id,
            None => {
                let count = CLIENT_ORDER_ID_COUNT.fetch_add(1, Ordering::SeqCst) + 1;
                ClientOrderId::new(format!("O-19700101-000000-001-001-{count}"))
            }
        }
    }

    fn instrument_id_or_panic(&self) -> InstrumentId {
        self.instrument_id.expect("`instrument_id` must be set")
    }

    fn quantity_or_panic(&self) -> Quantity {
        self.quantity.expect("`quantity` must be set")
    }

    /// Builds the order as an [`OrderAny`].
    ///
    /// # Panics
    ///
    /// Panics if a required field for the order type is missing.
    #[must_use]
    pub fn build(&self) -> OrderAny {
        match self.order_type {
            OrderType::Market => OrderAny::Market(self.build_market()),
            OrderType::Limit => OrderAny::Limit(self.build_limit()),
            OrderType::StopMarket => OrderAny::StopMarket(self.build_stop_market()),
            OrderType::StopLimit => OrderAny::StopLimit(self.build_stop_limit()),
        }
    }

    /// Builds a [`MarketOrder`].
    ///
    /// # Panics
    ///
    /// Panics if a required field is missing.
    #[must_use]
    pub fn build_market(&self) -> MarketOrder {
        MarketOrder::new(
            self.trader_id,
            self.strategy_id,
            self.instrument_id_or_panic(),
            self.next_client_order_id(),
            self.side,
            self.quantity_or_panic(),
            self.time_in_force,
            self.reduce_only,
            UUID4::new(),
            self.ts_init,
        )
    }

    /// Builds a [`LimitOrder`].
    ///
    /// # Panics
    ///
    /// Panics if a required field is missing.
    #[must_use]
    pub fn build_limit(&self) -> LimitOrder {
        LimitOrder::new(
            self.trader_id,
            self.strategy_id,
            self.instrument_id_or_panic(),
            self.next_client_order_id(),
            self.side,
            self.quantity_or_panic(),
            self.price.expect("`price` must be set"),
            self.time_in_force,
            self.expire_time,
            self.post_only,
            self.reduce_only,
            UUID4::new(),
            self.ts_init,
        )
    }

    /// Builds a [`StopMarketOrder`].
    ///
    /// # Panics
    ///
    /// Panics if a required field is missing.
    #[must_use]
    pub fn build_stop_market(&self) -> StopMarketOrder {
        StopMarketOrder::new(
            self.trader_id,
            self.strategy_id,
            self.instrument_id_or_panic(),
            self.next_client_order_id(),
            self.side,
            self.quantity_or_panic(),
            self.trigger_price.expect("`trigger_price` must be set"),
            self.time_in_force,
            self.expire_time,
            self.reduce_only,
            UUID4::new(),
            self.ts_init,
        )
    }

    /// Builds a [`StopLimitOrder`].
    ///
    /// # Panics
    ///
    /// Panics if a required field is missing.
    #[must_use]
    pub fn build_stop_limit(&self) -> StopLimitOrder {
        StopLimitOrder::new(
            self.trader_id,
            self.strategy_id,
            self.instrument_id_or_panic(),
            self.next_client_order_id(),
            self.side,
            self.quantity_or_panic(),
            self.price.expect("`price` must be set"),
            self.trigger_price.expect("`trigger_price` must be set"),
            self.time_in_force,
            self.expire_time,
            self.post_only,
            self.reduce_only,
            UUID4::new(),
            self.ts_init,
        )
    }
}
