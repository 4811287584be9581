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

//! Order lifecycle events.
//!
//! Each event is immutable once constructed. An order's strict-ordered event
//! history fully determines the order state (replaying the events rebuilds the
//! order exactly).

use std::fmt::{Display, Formatter};

use meridian_core::{UUID4, UnixNanos};
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::{LiquiditySide, OrderSide, OrderType, TimeInForce},
    identifiers::{
        AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, TradeId, TraderId,
        VenueOrderId,
    },
    types::{Currency, Money, Price, Quantity},
};

/// Represents an event where an order has been initialized within the system.
///
/// Carries the full order specification so that the order can be rebuilt from
/// its event history alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInitialized {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The order side.
    pub order_side: OrderSide,
    /// The order type.
    pub order_type: OrderType,
    /// The order quantity.
    pub quantity: Quantity,
    /// The order limit price (LIMIT and STOP_LIMIT orders).
    pub price: Option<Price>,
    /// The order trigger price (STOP_MARKET and STOP_LIMIT orders).
    pub trigger_price: Option<Price>,
    /// The order time in force.
    pub time_in_force: TimeInForce,
    /// The order expiration (for GTD orders).
    pub expire_time: Option<UnixNanos>,
    /// If the order will only provide liquidity (make a market).
    pub post_only: bool,
    /// If the order carries the 'reduce-only' execution instruction.
    pub reduce_only: bool,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderInitialized {
    /// Creates a new [`OrderInitialized`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        order_side: OrderSide,
        order_type: OrderType,
        quantity: Quantity,
        price: Option<Price>,
        trigger_price: Option<Price>,
        time_in_force: TimeInForce,
        expire_time: Option<UnixNanos>,
        post_only: bool,
        reduce_only: bool,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            order_side,
            order_type,
            quantity,
            price,
            trigger_price,
            time_in_force,
            expire_time,
            post_only,
            reduce_only,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl Display for OrderInitialized {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, side={}, type={}, quantity={}, time_in_force={})",
            stringify!(OrderInitialized),
            self.instrument_id,
            self.client_order_id,
            self.order_side,
            self.order_type,
            self.quantity.to_formatted_string(),
            self.time_in_force,
        )
    }
}

macro_rules! impl_order_event_common {
    ($ty:ty) => {
        impl $ty {
            /// Returns the unique identifier for the event.
            #[must_use]
            pub const fn id(&self) -> UUID4 {
                self.event_id
            }
        }
    };
}

impl_order_event_common!(OrderInitialized);

/// Represents an event where an order has been denied by the risk engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDenied {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The reason the order was denied.
    pub reason: Ustr,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderDenied {
    /// Creates a new [`OrderDenied`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        reason: Ustr,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            reason,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderDenied);

impl Display for OrderDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, reason='{}')",
            stringify!(OrderDenied),
            self.instrument_id,
            self.client_order_id,
            self.reason,
        )
    }
}

/// Represents an event where an order has been submitted to the trading venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The account ID associated with the event.
    pub account_id: AccountId,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderSubmitted {
    /// Creates a new [`OrderSubmitted`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        account_id: AccountId,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderSubmitted);

impl Display for OrderSubmitted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, account_id={})",
            stringify!(OrderSubmitted),
            self.instrument_id,
            self.client_order_id,
            self.account_id,
        )
    }
}

/// Represents an event where an order has been accepted by the trading venue.
///
/// Assigns the venue order ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The venue order ID (assigned by the venue).
    pub venue_order_id: VenueOrderId,
    /// The account ID associated with the event.
    pub account_id: AccountId,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderAccepted {
    /// Creates a new [`OrderAccepted`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        venue_order_id: VenueOrderId,
        account_id: AccountId,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderAccepted);

impl Display for OrderAccepted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, venue_order_id={}, account_id={})",
            stringify!(OrderAccepted),
            self.instrument_id,
            self.client_order_id,
            self.venue_order_id,
            self.account_id,
        )
    }
}

/// Represents an event where an order has been rejected by the trading venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The account ID associated with the event.
    pub account_id: AccountId,
    /// The reason the order was rejected.
    pub reason: Ustr,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderRejected {
    /// Creates a new [`OrderRejected`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        account_id: AccountId,
        reason: Ustr,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            account_id,
            reason,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderRejected);

impl Display for OrderRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, reason='{}')",
            stringify!(OrderRejected),
            self.instrument_id,
            self.client_order_id,
            self.reason,
        )
    }
}

/// Represents an event where a stop order has been triggered at the venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTriggered {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The account ID, if assigned.
    pub account_id: Option<AccountId>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderTriggered {
    /// Creates a new [`OrderTriggered`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: Option<AccountId>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderTriggered);

impl Display for OrderTriggered {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(OrderTriggered),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// Represents an event where a request to modify the order is in flight.
///
/// The prior status is retained for restoration on completion or rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPendingUpdate {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The account ID associated with the event.
    pub account_id: AccountId,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderPendingUpdate {
    /// Creates a new [`OrderPendingUpdate`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        account_id: AccountId,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderPendingUpdate);

impl Display for OrderPendingUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(OrderPendingUpdate),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// Represents an event where an order has been updated at the trading venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdated {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The new order quantity.
    pub quantity: Quantity,
    /// The new order limit price, if changed.
    pub price: Option<Price>,
    /// The new order trigger price, if changed.
    pub trigger_price: Option<Price>,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The account ID, if assigned.
    pub account_id: Option<AccountId>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderUpdated {
    /// Creates a new [`OrderUpdated`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        quantity: Quantity,
        price: Option<Price>,
        trigger_price: Option<Price>,
        venue_order_id: Option<VenueOrderId>,
        account_id: Option<AccountId>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            quantity,
            price,
            trigger_price,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderUpdated);

impl Display for OrderUpdated {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, quantity={})",
            stringify!(OrderUpdated),
            self.instrument_id,
            self.client_order_id,
            self.quantity.to_formatted_string(),
        )
    }
}

/// Represents an event where a request to cancel the order is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPendingCancel {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The account ID associated with the event.
    pub account_id: AccountId,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderPendingCancel {
    /// Creates a new [`OrderPendingCancel`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        account_id: AccountId,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderPendingCancel);

impl Display for OrderPendingCancel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(OrderPendingCancel),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// Represents an event where an order has been canceled at the trading venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The account ID, if assigned.
    pub account_id: Option<AccountId>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderCanceled {
    /// Creates a new [`OrderCanceled`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: Option<AccountId>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderCanceled);

impl Display for OrderCanceled {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(OrderCanceled),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// Represents an event where an order has expired at the trading venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpired {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The account ID, if assigned.
    pub account_id: Option<AccountId>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderExpired {
    /// Creates a new [`OrderExpired`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: Option<AccountId>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderExpired);

impl Display for OrderExpired {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(OrderExpired),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// Represents an event where an order has been filled at the trading venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The venue order ID (assigned by the venue).
    pub venue_order_id: VenueOrderId,
    /// The account ID associated with the event.
    pub account_id: AccountId,
    /// The trade match ID (assigned by the venue).
    pub trade_id: TradeId,
    /// The order side.
    pub order_side: OrderSide,
    /// The order type.
    pub order_type: OrderType,
    /// The fill quantity for this execution.
    pub last_qty: Quantity,
    /// The fill price for this execution.
    pub last_px: Price,
    /// The currency of `last_px`.
    pub currency: Currency,
    /// The liquidity side of the execution.
    pub liquidity_side: LiquiditySide,
    /// The position ID (assigned by the venue OMS policy).
    pub position_id: Option<PositionId>,
    /// The commission generated from this execution.
    pub commission: Option<Money>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderFilled {
    /// Creates a new [`OrderFilled`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        venue_order_id: VenueOrderId,
        account_id: AccountId,
        trade_id: TradeId,
        order_side: OrderSide,
        order_type: OrderType,
        last_qty: Quantity,
        last_px: Price,
        currency: Currency,
        liquidity_side: LiquiditySide,
        position_id: Option<PositionId>,
        commission: Option<Money>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            venue_order_id,
            account_id,
            trade_id,
            order_side,
            order_type,
            last_qty,
            last_px,
            currency,
            liquidity_side,
            position_id,
            commission,
            event_id,
            ts_event,
            ts_init,
        }
    }

    /// Returns whether the fill was on the buy side.
    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.order_side == OrderSide::Buy
    }

    /// Returns whether the fill was on the sell side.
    #[must_use]
    pub fn is_sell(&self) -> bool {
        self.order_side == OrderSide::Sell
    }
}

impl_order_event_common!(OrderFilled);

impl Display for OrderFilled {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let position_id_str = self
            .position_id
            .map_or("None".to_string(), |id| id.to_string());
        let commission_str = self
            .commission
            .map_or("None".to_string(), |c| c.to_string());
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, venue_order_id={}, account_id={}, \
            trade_id={}, position_id={}, order_side={}, order_type={}, last_qty={}, \
            last_px={} {}, commission={}, liquidity_side={}, ts_event={})",
            stringify!(OrderFilled),
            self.instrument_id,
            self.client_order_id,
            self.venue_order_id,
            self.account_id,
            self.trade_id,
            position_id_str,
            self.order_side,
            self.order_type,
            self.last_qty.to_formatted_string(),
            self.last_px.to_formatted_string(),
            self.currency,
            commission_str,
            self.liquidity_side,
            self.ts_event,
        )
    }
}

/// Represents an event where a request to modify an order was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderModifyRejected {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The reason the modification was rejected.
    pub reason: Ustr,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The account ID, if assigned.
    pub account_id: Option<AccountId>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderModifyRejected {
    /// Creates a new [`OrderModifyRejected`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        reason: Ustr,
        venue_order_id: Option<VenueOrderId>,
        account_id: Option<AccountId>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            reason,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderModifyRejected);

impl Display for OrderModifyRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, reason='{}')",
            stringify!(OrderModifyRejected),
            self.instrument_id,
            self.client_order_id,
            self.reason,
        )
    }
}

/// Represents an event where a request to cancel an order was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelRejected {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The client order ID associated with the event.
    pub client_order_id: ClientOrderId,
    /// The reason the cancel was rejected.
    pub reason: Ustr,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The account ID, if assigned.
    pub account_id: Option<AccountId>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl OrderCancelRejected {
    /// Creates a new [`OrderCancelRejected`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        client_order_id: ClientOrderId,
        reason: Ustr,
        venue_order_id: Option<VenueOrderId>,
        account_id: Option<AccountId>,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id,
            strategy_id,
            instrument_id,
            client_order_id,
            reason,
            venue_order_id,
            account_id,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl_order_event_common!(OrderCancelRejected);

impl Display for OrderCancelRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={}, reason='{}')",
            stringify!(OrderCancelRejected),
            self.instrument_id,
            self.client_order_id,
            self.reason,
        )
    }
}

/// A tagged sum type covering all order events, with exhaustive matching in
/// the order state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEventAny {
    /// The order was initialized.
    Initialized(OrderInitialized),
    /// The order was denied by the risk engine.
    Denied(OrderDenied),
    /// The order was submitted to the venue.
    Submitted(OrderSubmitted),
    /// The order was accepted by the venue.
    Accepted(OrderAccepted),
    /// The order was rejected by the venue.
    Rejected(OrderRejected),
    /// The order stop trigger fired.
    Triggered(OrderTriggered),
    /// A modify request is in flight.
    PendingUpdate(OrderPendingUpdate),
    /// The order was updated.
    Updated(OrderUpdated),
    /// A cancel request is in flight.
    PendingCancel(OrderPendingCancel),
    /// The order was canceled.
    Canceled(OrderCanceled),
    /// The order expired.
    Expired(OrderExpired),
    /// The order was filled.
    Filled(OrderFilled),
    /// A modify request was rejected.
    ModifyRejected(OrderModifyRejected),
    /// A cancel request was rejected.
    CancelRejected(OrderCancelRejected),
}

impl OrderEventAny {
    /// Returns the unique identifier for the event.
    #[must_use]
    pub const fn event_id(&self) -> UUID4 {
        match self {
            Self::Initialized(event) => event.event_id,
            Self::Denied(event) => event.event_id,
            Self::Submitted(event) => event.event_id,
            Self::Accepted(event) => event.event_id,
            Self::Rejected(event) => event.event_id,
            Self::Triggered(event) => event.event_id,
            Self::PendingUpdate(event) => event.event_id,
            Self::Updated(event) => event.event_id,
            Self::PendingCancel(event) => event.event_id,
            Self::Canceled(event) => event.event_id,
            Self::Expired(event) => event.event_id,
            Self::Filled(event) => event.event_id,
            Self::ModifyRejected(event) => event.event_id,
            Self::CancelRejected(event) => event.event_id,
        }
    }

    /// Returns the trader ID associated with the event.
    #[must_use]
    pub const fn trader_id(&self) -> TraderId {
        match self {
            Self::Initialized(event) => event.trader_id,
            Self::Denied(event) => event.trader_id,
            Self::Submitted(event) => event.trader_id,
            Self::Accepted(event) => event.trader_id,
            Self::Rejected(event) => event.trader_id,
            Self::Triggered(event) => event.trader_id,
            Self::PendingUpdate(event) => event.trader_id,
            Self::Updated(event) => event.trader_id,
            Self::PendingCancel(event) => event.trader_id,
            Self::Canceled(event) => event.trader_id,
            Self::Expired(event) => event.trader_id,
            Self::Filled(event) => event.trader_id,
            Self::ModifyRejected(event) => event.trader_id,
            Self::CancelRejected(event) => event.trader_id,
        }
    }

    /// Returns the strategy ID associated with the event.
    #[must_use]
    pub const fn strategy_id(&self) -> StrategyId {
        match self {
            Self::Initialized(event) => event.strategy_id,
            Self::Denied(event) => event.strategy_id,
            Self::Submitted(event) => event.strategy_id,
            Self::Accepted(event) => event.strategy_id,
            Self::Rejected(event) => event.strategy_id,
            Self::Triggered(event) => event.strategy_id,
            Self::PendingUpdate(event) => event.strategy_id,
            Self::Updated(event) => event.strategy_id,
            Self::PendingCancel(event) => event.strategy_id,
            Self::Canceled(event) => event.strategy_id,
            Self::Expired(event) => event.strategy_id,
            Self::Filled(event) => event.strategy_id,
            Self::ModifyRejected(event) => event.strategy_id,
            Self::CancelRejected(event) => event.strategy_id,
        }
    }

    /// Returns the instrument ID associated with the event.
    #[must_use]
    pub const fn instrument_id(&self) -> InstrumentId {
        match self {
            Self::Initialized(event) => event.instrument_id,
            Self::Denied(event) => event.instrument_id,
            Self::Submitted(event) => event.instrument_id,
            Self::Accepted(event) => event.instrument_id,
            Self::Rejected(event) => event.instrument_id,
            Self::Triggered(event) => event.instrument_id,
            Self::PendingUpdate(event) => event.instrument_id,
            Self::Updated(event) => event.instrument_id,
            Self::PendingCancel(event) => event.instrument_id,
            Self::Canceled(event) => event.instrument_id,
            Self::Expired(event) => event.instrument_id,
            Self::Filled(event) => event.instrument_id,
            Self::ModifyRejected(event) => event.instrument_id,
            Self::CancelRejected(event) => event.instrument_id,
        }
    }

    /// Returns the client order ID associated with the event.
    #[must_use]
    pub const fn client_order_id(&self) -> ClientOrderId {
        match self {
            Self::Initialized(event) => event.client_order_id,
            Self::Denied(event) => event.client_order_id,
            Self::Submitted(event) => event.client_order_id,
            Self::Accepted(event) => event.client_order_id,
            Self::Rejected(event) => event.client_order_id,
            Self::Triggered(event) => event.client_order_id,
            Self::PendingUpdate(event) => event.client_order_id,
            Self::Updated(event) => event.client_order_id,
            Self::PendingCancel(event) => event.client_order_id,
            Self::Canceled(event) => event.client_order_id,
            Self::Expired(event) => event.client_order_id,
            Self::Filled(event) => event.client_order_id,
            Self::ModifyRejected(event) => event.client_order_id,
            Self::CancelRejected(event) => event.client_order_id,
        }
    }

    /// Returns the venue order ID associated with the event, if any.
    #[must_use]
    pub const fn venue_order_id(&self) -> Option<VenueOrderId> {
        match self {
            Self::Accepted(event) => Some(event.venue_order_id),
            Self::Filled(event) => Some(event.venue_order_id),
            Self::Triggered(event) => event.venue_order_id,
            Self::Updated(event) => event.venue_order_id,
            Self::Canceled(event) => event.venue_order_id,
            Self::Expired(event) => event.venue_order_id,
            Self::ModifyRejected(event) => event.venue_order_id,
            Self::CancelRejected(event) => event.venue_order_id,
            Self::Initialized(_)
            | Self::Denied(_)
            | Self::Submitted(_)
            | Self::Rejected(_)
            | Self::PendingUpdate(_)
            | Self::PendingCancel(_) => None,
        }
    }

    /// UNIX timestamp (nanoseconds) when the event occurred.
    #[must_use]
    pub const fn ts_event(&self) -> UnixNanos {
        match self {
            Self::Initialized(event) => event.ts_event,
            Self::Denied(event) => event.ts_event,
            Self::Submitted(event) => event.ts_event,
            Self::Accepted(event) => event.ts_event,
            Self::Rejected(event) => event.ts_event,
            Self::Triggered(event) => event.ts_event,
            Self::PendingUpdate(event) => event.ts_event,
            Self::Updated(event) => event.ts_event,
            Self::PendingCancel(event) => event.ts_event,
            Self::Canceled(event) => event.ts_event,
            Self::Expired(event) => event.ts_event,
            Self::Filled(event) => event.ts_event,
            Self::ModifyRejected(event) => event.ts_event,
            Self::CancelRejected(event) => event.ts_event,
        }
    }

    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    #[must_use]
    pub const fn ts_init(&self) -> UnixNanos {
        match self {
            Self::Initialized(event) => event.ts_init,
            Self::Denied(event) => event.ts_init,
            Self::Submitted(event) => event.ts_init,
            Self::Accepted(event) => event.ts_init,
            Self::Rejected(event) => event.ts_init,
            Self::Triggered(event) => event.ts_init,
            Self::PendingUpdate(event) => event.ts_init,
            Self::Updated(event) => event.ts_init,
            Self::PendingCancel(event) => event.ts_init,
            Self::Canceled(event) => event.ts_init,
            Self::Expired(event) => event.ts_init,
            Self::Filled(event) => event.ts_init,
            Self::ModifyRejected(event) => event.ts_init,
            Self::CancelRejected(event) => event.ts_init,
        }
    }

    /// Returns a short name identifying the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Initialized(_) => "OrderInitialized",
            Self::Denied(_) => "OrderDenied",
            Self::Submitted(_) => "OrderSubmitted",
            Self::Accepted(_) => "OrderAccepted",
            Self::Rejected(_) => "OrderRejected",
            Self::Triggered(_) => "OrderTriggered",
            Self::PendingUpdate(_) => "OrderPendingUpdate",
            Self::Updated(_) => "OrderUpdated",
            Self::PendingCancel(_) => "OrderPendingCancel",
            Self::Canceled(_) => "OrderCanceled",
            Self::Expired(_) => "OrderExpired",
            Self::Filled(_) => "OrderFilled",
            Self::ModifyRejected(_) => "OrderModifyRejected",
            Self::CancelRejected(_) => "OrderCancelRejected",
        }
    }
}

impl Display for OrderEventAny {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(event) => write!(f, "{event}"),
            Self::Denied(event) => write!(f, "{event}"),
            Self::Submitted(event) => write!(f, "{event}"),
            Self::Accepted(event) => write!(f, "{event}"),
            Self::Rejected(event) => write!(f, "{event}"),
            Self::Triggered(event) => write!(f, "{event}"),
            Self::PendingUpdate(event) => write!(f, "{event}"),
            Self::Updated(event) => write!(f, "{event}"),
            Self::PendingCancel(event) => write!(f, "{event}"),
            Self::Canceled(event) => write!(f, "{event}"),
            Self::Expired(event) => write!(f, "{event}"),
            Self::Filled(event) => write!(f, "{event}"),
            Self::ModifyRejected(event) => write!(f, "{event}"),
            Self::CancelRejected(event) => write!(f, "{event}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn order_filled() -> OrderFilled {
        OrderFilled::new(
            TraderId::default(),
            StrategyId::default(),
            InstrumentId::from("AUD/USD.SIM"),
            ClientOrderId::default(),
            VenueOrderId::new("SIM-1-001"),
            AccountId::default(),
            TradeId::new("SIM-1-001"),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from(100_000_u32),
            Price::from("0.75000"),
            Currency::USD(),
            LiquiditySide::Taker,
            Some(PositionId::new("P-001")),
            Some(Money::new(0.0, Currency::USD())),
            UUID4::new(),
            UnixNanos::from(1),
            UnixNanos::from(1),
        )
    }

    #[rstest]
    fn test_order_filled_accessors() {
        let fill = order_filled();
        assert!(fill.is_buy());
        assert!(!fill.is_sell());
        let event = OrderEventAny::Filled(fill);
        assert_eq!(event.kind(), "OrderFilled");
        assert_eq!(event.client_order_id(), fill.client_order_id);
        assert_eq!(event.venue_order_id(), Some(fill.venue_order_id));
        assert_eq!(event.ts_event(), UnixNanos::from(1));
    }

    #[rstest]
    fn test_order_filled_display() {
        let fill = order_filled();
        let display = format!("{fill}");
        assert!(display.starts_with("OrderFilled(instrument_id=AUD/USD.SIM"));
        assert!(display.contains("last_qty=100_000"));
        assert!(display.contains("last_px=0.75000 USD"));
    }

    #[rstest]
    fn test_event_serde_round_trip() {
        let event = OrderEventAny::Filled(order_filled());
        let json = serde_json::to_string(&event).unwrap();
        let parsed: OrderEventAny = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[rstest]
    fn test_denied_event_display() {
        let denied = OrderDenied::new(
            TraderId::default(),
            StrategyId::default(),
            InstrumentId::from("AUD/USD.SIM"),
            ClientOrderId::default(),
            Ustr::from("Order quantity was zero"),
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        );
        assert_eq!(
            denied.to_string(),
            "OrderDenied(instrument_id=AUD/USD.SIM, client_order_id=O-19700101-000000-001-001-1, \
            reason='Order quantity was zero')"
        );
    }
}
