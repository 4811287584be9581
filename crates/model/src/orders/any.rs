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

//! Tagged sum types covering all order types, with exhaustive matching.

use meridian_core::UnixNanos;

use crate::{
    enums::{
        LiquiditySide, OrderSide, OrderSideSpecified, OrderStatus, OrderType, TimeInForce,
    },
    events::{OrderEventAny, OrderInitialized},
    identifiers::{
        AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, TraderId, VenueOrderId,
    },
    orders::{
        base::{Order, OrderError},
        limit::LimitOrder,
        market::MarketOrder,
        stop_limit::StopLimitOrder,
        stop_market::StopMarketOrder,
    },
    types::{Price, Quantity},
};

macro_rules! for_each_order {
    ($self:ident, $order:ident => $expr:expr) => {
        match $self {
            Self::Market($order) => $expr,
            Self::Limit($order) => $expr,
            Self::StopMarket($order) => $expr,
            Self::StopLimit($order) => $expr,
        }
    };
}

/// A tagged sum type covering all order types.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderAny {
    /// A market order.
    Market(MarketOrder),
    /// A limit order.
    Limit(LimitOrder),
    /// A stop-market order.
    StopMarket(StopMarketOrder),
    /// A stop-limit order.
    StopLimit(StopLimitOrder),
}

impl OrderAny {
    /// Rebuilds an order by replaying the given `events` from initialization.
    ///
    /// # Errors
    ///
    /// Returns an error if `events` does not begin with `OrderInitialized`,
    /// or if any replayed transition is illegal.
    pub fn from_events(events: Vec<OrderEventAny>) -> Result<Self, OrderError> {
        let mut iter = events.into_iter();
        let init = match iter.next() {
            Some(OrderEventAny::Initialized(init)) => init,
            _ => return Err(OrderError::NotInitialized),
        };
        let mut order = Self::from(init);
        for event in iter {
            order.apply(event)?;
        }
        Ok(order)
    }
}

impl From<OrderInitialized> for OrderAny {
    fn from(init: OrderInitialized) -> Self {
        match init.order_type {
            OrderType::Market => {
                Self::Market(MarketOrder::try_from(init).expect("order type checked"))
            }
            OrderType::Limit => {
                Self::Limit(LimitOrder::try_from(init).expect("order type checked"))
            }
            OrderType::StopMarket => {
                Self::StopMarket(StopMarketOrder::try_from(init).expect("order type checked"))
            }
            OrderType::StopLimit => {
                Self::StopLimit(StopLimitOrder::try_from(init).expect("order type checked"))
            }
        }
    }
}

impl Order for OrderAny {
    fn status(&self) -> OrderStatus {
        for_each_order!(self, order => order.status())
    }

    fn trader_id(&self) -> TraderId {
        for_each_order!(self, order => order.trader_id())
    }

    fn strategy_id(&self) -> StrategyId {
        for_each_order!(self, order => order.strategy_id())
    }

    fn instrument_id(&self) -> InstrumentId {
        for_each_order!(self, order => order.instrument_id())
    }

    fn client_order_id(&self) -> ClientOrderId {
        for_each_order!(self, order => order.client_order_id())
    }

    fn venue_order_id(&self) -> Option<VenueOrderId> {
        for_each_order!(self, order => order.venue_order_id())
    }

    fn position_id(&self) -> Option<PositionId> {
        for_each_order!(self, order => order.position_id())
    }

    fn account_id(&self) -> Option<AccountId> {
        for_each_order!(self, order => order.account_id())
    }

    fn order_side(&self) -> OrderSide {
        for_each_order!(self, order => order.order_side())
    }

    fn order_type(&self) -> OrderType {
        for_each_order!(self, order => order.order_type())
    }

    fn quantity(&self) -> Quantity {
        for_each_order!(self, order => order.quantity())
    }

    fn time_in_force(&self) -> TimeInForce {
        for_each_order!(self, order => order.time_in_force())
    }

    fn price(&self) -> Option<Price> {
        for_each_order!(self, order => order.price())
    }

    fn trigger_price(&self) -> Option<Price> {
        for_each_order!(self, order => order.trigger_price())
    }

    fn expire_time(&self) -> Option<UnixNanos> {
        for_each_order!(self, order => order.expire_time())
    }

    fn is_post_only(&self) -> bool {
        for_each_order!(self, order => order.is_post_only())
    }

    fn is_reduce_only(&self) -> bool {
        for_each_order!(self, order => order.is_reduce_only())
    }

    fn filled_qty(&self) -> Quantity {
        for_each_order!(self, order => order.filled_qty())
    }

    fn leaves_qty(&self) -> Quantity {
        for_each_order!(self, order => order.leaves_qty())
    }

    fn avg_px(&self) -> Option<f64> {
        for_each_order!(self, order => order.avg_px())
    }

    fn slippage(&self) -> Option<f64> {
        for_each_order!(self, order => order.slippage())
    }

    fn liquidity_side(&self) -> Option<LiquiditySide> {
        for_each_order!(self, order => order.liquidity_side())
    }

    fn events(&self) -> &[OrderEventAny] {
        for_each_order!(self, order => order.events())
    }

    fn last_event(&self) -> &OrderEventAny {
        for_each_order!(self, order => order.last_event())
    }

    fn event_count(&self) -> usize {
        for_each_order!(self, order => order.event_count())
    }

    fn is_open(&self) -> bool {
        for_each_order!(self, order => order.is_open())
    }

    fn is_closed(&self) -> bool {
        for_each_order!(self, order => order.is_closed())
    }

    fn is_inflight(&self) -> bool {
        for_each_order!(self, order => order.is_inflight())
    }

    fn ts_init(&self) -> UnixNanos {
        for_each_order!(self, order => order.ts_init())
    }

    fn ts_last(&self) -> UnixNanos {
        for_each_order!(self, order => order.ts_last())
    }

    fn apply(&mut self, event: OrderEventAny) -> Result<(), OrderError> {
        for_each_order!(self, order => order.apply(event))
    }
}

impl From<MarketOrder> for OrderAny {
    fn from(order: MarketOrder) -> Self {
        Self::Market(order)
    }
}

impl From<LimitOrder> for OrderAny {
    fn from(order: LimitOrder) -> Self {
        Self::Limit(order)
    }
}

impl From<StopMarketOrder> for OrderAny {
    fn from(order: StopMarketOrder) -> Self {
        Self::StopMarket(order)
    }
}

impl From<StopLimitOrder> for OrderAny {
    fn from(order: StopLimitOrder) -> Self {
        Self::StopLimit(order)
    }
}

/// A tagged sum type covering conditional (stop) order types.
#[derive(Clone, Debug, PartialEq)]
pub enum StopOrderAny {
    /// A stop-market order.
    StopMarket(StopMarketOrder),
    /// A stop-limit order.
    StopLimit(StopLimitOrder),
}

impl StopOrderAny {
    /// Returns the client order ID.
    #[must_use]
    pub fn client_order_id(&self) -> ClientOrderId {
        match self {
            Self::StopMarket(order) => order.client_order_id(),
            Self::StopLimit(order) => order.client_order_id(),
        }
    }

    /// Returns the stop trigger price.
    #[must_use]
    pub const fn stop_px(&self) -> Price {
        match self {
            Self::StopMarket(order) => order.trigger_price,
            Self::StopLimit(order) => order.trigger_price,
        }
    }

    /// Returns the specified order side.
    #[must_use]
    pub fn order_side_specified(&self) -> OrderSideSpecified {
        match self {
            Self::StopMarket(order) => order.order_side_specified(),
            Self::StopLimit(order) => order.order_side_specified(),
        }
    }
}

impl From<StopOrderAny> for OrderAny {
    fn from(order: StopOrderAny) -> Self {
        match order {
            StopOrderAny::StopMarket(order) => Self::StopMarket(order),
            StopOrderAny::StopLimit(order) => Self::StopLimit(order),
        }
    }
}

/// A tagged sum type covering order types which can rest in the book.
#[derive(Clone, Debug, PartialEq)]
pub enum PassiveOrderAny {
    /// A resting limit order.
    Limit(LimitOrder),
    /// A resting conditional order.
    Stop(StopOrderAny),
}

impl PassiveOrderAny {
    /// Returns the client order ID.
    #[must_use]
    pub fn client_order_id(&self) -> ClientOrderId {
        match self {
            Self::Limit(order) => order.client_order_id(),
            Self::Stop(order) => order.client_order_id(),
        }
    }

    /// Returns the specified order side.
    #[must_use]
    pub fn order_side_specified(&self) -> OrderSideSpecified {
        match self {
            Self::Limit(order) => order.order_side_specified(),
            Self::Stop(order) => order.order_side_specified(),
        }
    }

    /// Returns the expiration, for GTD orders.
    #[must_use]
    pub fn expire_time(&self) -> Option<UnixNanos> {
        match self {
            Self::Limit(order) => order.expire_time(),
            Self::Stop(order) => match order {
                StopOrderAny::StopMarket(order) => order.expire_time(),
                StopOrderAny::StopLimit(order) => order.expire_time(),
            },
        }
    }

    /// Converts to the general order sum type.
    #[must_use]
    pub fn to_any(&self) -> OrderAny {
        match self {
            Self::Limit(order) => OrderAny::Limit(order.clone()),
            Self::Stop(order) => OrderAny::from(order.clone()),
        }
    }
}

impl TryFrom<OrderAny> for PassiveOrderAny {
    type Error = OrderError;

    fn try_from(order: OrderAny) -> Result<Self, Self::Error> {
        match order {
            OrderAny::Limit(order) => Ok(Self::Limit(order)),
            OrderAny::StopMarket(order) => Ok(Self::Stop(StopOrderAny::StopMarket(order))),
            OrderAny::StopLimit(order) => Ok(Self::Stop(StopOrderAny::StopLimit(order))),
            OrderAny::Market(_) => Err(OrderError::UnexpectedOrderType(OrderType::Market)),
        }
    }
}

impl From<PassiveOrderAny> for OrderAny {
    fn from(order: PassiveOrderAny) -> Self {
        match order {
            PassiveOrderAny::Limit(order) => Self::Limit(order),
            PassiveOrderAny::Stop(order) => Self::from(order),
        }
    }
}
