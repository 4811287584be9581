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

//! An order to buy or sell immediately at the best available market price.

use std::ops::{Deref, DerefMut};

use meridian_core::{UUID4, UnixNanos};

use crate::{
    enums::{LiquiditySide, OrderSide, OrderStatus, OrderType, TimeInForce},
    events::{OrderEventAny, OrderInitialized},
    identifiers::{
        AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, TraderId, VenueOrderId,
    },
    orders::base::{Order, OrderCore, OrderError},
    types::{Price, Quantity},
};

/// An order to buy or sell immediately at the best available market price.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketOrder {
    core: OrderCore,
}

impl MarketOrder {
    /// Creates a new [`MarketOrder`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        order_side: OrderSide,
        quantity: Quantity,
        time_in_force: TimeInForce,
        reduce_only: bool,
        init_id: UUID4,
        ts_init: UnixNanos,
    ) -> Self {
        let init = OrderInitialized::new(
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            order_side,
            OrderType::Market,
            quantity,
            None,
            None,
            time_in_force,
            None,
            false,
            reduce_only,
            init_id,
            ts_init,
            ts_init,
        );
        Self {
            core: OrderCore::new(init),
        }
    }
}

impl TryFrom<OrderInitialized> for MarketOrder {
    type Error = OrderError;

    fn try_from(init: OrderInitialized) -> Result<Self, Self::Error> {
        if init.order_type != OrderType::Market {
            return Err(OrderError::UnexpectedOrderType(init.order_type));
        }
        Ok(Self {
            core: OrderCore::new(init),
        })
    }
}

impl Deref for MarketOrder {
    type Target = OrderCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

impl DerefMut for MarketOrder {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.core
    }
}

impl Order for MarketOrder {
    fn status(&self) -> OrderStatus {
        self.core.status
    }

    fn trader_id(&self) -> TraderId {
        self.core.trader_id
    }

    fn strategy_id(&self) -> StrategyId {
        self.core.strategy_id
    }

    fn instrument_id(&self) -> InstrumentId {
        self.core.instrument_id
    }

    fn client_order_id(&self) -> ClientOrderId {
        self.core.client_order_id
    }

    fn venue_order_id(&self) -> Option<VenueOrderId> {
        self.core.venue_order_id
    }

    fn position_id(&self) -> Option<PositionId> {
        self.core.position_id
    }

    fn account_id(&self) -> Option<AccountId> {
        self.core.account_id
    }

    fn order_side(&self) -> OrderSide {
        self.core.side
    }

    fn order_type(&self) -> OrderType {
        self.core.order_type
    }

    fn quantity(&self) -> Quantity {
        self.core.quantity
    }

    fn time_in_force(&self) -> TimeInForce {
        self.core.time_in_force
    }

    fn price(&self) -> Option<Price> {
        None
    }

    fn trigger_price(&self) -> Option<Price> {
        None
    }

    fn expire_time(&self) -> Option<UnixNanos> {
        None
    }

    fn is_post_only(&self) -> bool {
        false
    }

    fn is_reduce_only(&self) -> bool {
        self.core.is_reduce_only
    }

    fn filled_qty(&self) -> Quantity {
        self.core.filled_qty
    }

    fn leaves_qty(&self) -> Quantity {
        self.core.leaves_qty
    }

    fn avg_px(&self) -> Option<f64> {
        self.core.avg_px
    }

    fn slippage(&self) -> Option<f64> {
        self.core.slippage
    }

    fn liquidity_side(&self) -> Option<LiquiditySide> {
        self.core.liquidity_side
    }

    fn events(&self) -> &[OrderEventAny] {
        &self.core.events
    }

    fn last_event(&self) -> &OrderEventAny {
        self.core.last_event()
    }

    fn event_count(&self) -> usize {
        self.core.event_count()
    }

    fn is_open(&self) -> bool {
        self.core.is_open()
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    fn is_inflight(&self) -> bool {
        self.core.is_inflight()
    }

    fn ts_init(&self) -> UnixNanos {
        self.core.ts_init
    }

    fn ts_last(&self) -> UnixNanos {
        self.core.ts_last
    }

    fn apply(&mut self, event: OrderEventAny) -> Result<(), OrderError> {
        self.core.apply(event)
    }
}
