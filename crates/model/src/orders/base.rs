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

//! The common order core and the `Order` trait.
//!
//! State transitions are event-driven and total: the transition function is an
//! exhaustive match over `(status, event)` returning an error for any illegal
//! combination. Engines treat such errors as fatal, they are never silently
//! dropped.

use indexmap::IndexMap;
use meridian_core::{UUID4, UnixNanos};
use thiserror::Error;

use crate::{
    enums::{
        LiquiditySide, OrderSide, OrderSideSpecified, OrderStatus, OrderType, TimeInForce,
    },
    events::{OrderEventAny, OrderInitialized},
    identifiers::{
        AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, TradeId, TraderId,
        VenueOrderId,
    },
    types::{Currency, Money, Price, Quantity},
};

/// Errors from order operations and state transitions.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The `(status, event)` combination is not a legal transition.
    #[error("Invalid state transition: {status} -> {event_kind}")]
    InvalidStateTransition {
        /// The order status at the time of the event.
        status: OrderStatus,
        /// The kind of the offending event.
        event_kind: &'static str,
    },
    /// The event targeted a different client order ID.
    #[error("Event client order ID {event} did not match order {order}")]
    ClientOrderIdMismatch {
        /// The event's client order ID.
        event: ClientOrderId,
        /// The order's client order ID.
        order: ClientOrderId,
    },
    /// The order was not found.
    #[error("Order not found: {0}")]
    NotFound(ClientOrderId),
    /// The event list did not begin with `OrderInitialized`.
    #[error("Order event list must begin with `OrderInitialized`")]
    NotInitialized,
    /// The initialization event specified an unexpected order type.
    #[error("Unexpected order type for event: {0}")]
    UnexpectedOrderType(OrderType),
}

/// The state transition function for the order state machine.
///
/// # Errors
///
/// Returns an [`OrderError::InvalidStateTransition`] for any illegal
/// `(status, event)` combination.
pub fn transition(
    status: OrderStatus,
    event: &OrderEventAny,
    leaves_after_fill: impl Fn() -> bool,
    previous_status: Option<OrderStatus>,
) -> Result<OrderStatus, OrderError> {
    use OrderStatus as S;

    let next = match (status, event) {
        (S::Initialized, OrderEventAny::Denied(_)) => S::Denied,
        (S::Initialized, OrderEventAny::Submitted(_)) => S::Submitted,
        (S::Submitted, OrderEventAny::Rejected(_)) => S::Rejected,
        (S::Submitted, OrderEventAny::Accepted(_)) => S::Accepted,
        // Market orders may fill straight from SUBMITTED at the venue
        (S::Submitted, OrderEventAny::Filled(_)) => {
            if leaves_after_fill() {
                S::PartiallyFilled
            } else {
                S::Filled
            }
        }
        // FOK/IOC orders which cannot fill are canceled without resting
        (S::Submitted, OrderEventAny::Canceled(_)) => S::Canceled,
        (S::Accepted, OrderEventAny::Triggered(_)) => S::Triggered,
        (
            S::Accepted | S::Triggered | S::PartiallyFilled,
            OrderEventAny::PendingUpdate(_),
        ) => S::PendingUpdate,
        (
            S::Accepted | S::Triggered | S::PartiallyFilled,
            OrderEventAny::PendingCancel(_),
        ) => S::PendingCancel,
        (S::PendingUpdate, OrderEventAny::Updated(_)) => previous_status.unwrap_or(S::Accepted),
        (S::PendingUpdate, OrderEventAny::ModifyRejected(_)) => {
            previous_status.unwrap_or(S::Accepted)
        }
        (S::PendingCancel, OrderEventAny::Canceled(_)) => S::Canceled,
        (S::PendingCancel, OrderEventAny::CancelRejected(_)) => {
            previous_status.unwrap_or(S::Accepted)
        }
        // The venue may apply updates and cancels directly (no pending overlay)
        (S::Accepted | S::Triggered | S::PartiallyFilled, OrderEventAny::Updated(_)) => status,
        (
            S::Accepted | S::Triggered | S::PartiallyFilled,
            OrderEventAny::Canceled(_),
        ) => S::Canceled,
        (
            S::Accepted | S::Triggered | S::PartiallyFilled | S::PendingUpdate | S::PendingCancel,
            OrderEventAny::Filled(_),
        ) => {
            if leaves_after_fill() {
                S::PartiallyFilled
            } else {
                S::Filled
            }
        }
        (
            S::Accepted | S::Triggered | S::PartiallyFilled,
            OrderEventAny::Expired(_),
        ) => S::Expired,
        (_, event) => {
            return Err(OrderError::InvalidStateTransition {
                status,
                event_kind: event.kind(),
            });
        }
    };
    Ok(next)
}

/// The common core shared by all order types.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderCore {
    /// The applied order events, in apply order.
    pub events: Vec<OrderEventAny>,
    /// Accumulated commissions per currency.
    pub commissions: IndexMap<Currency, Money>,
    /// The trader ID associated with the order.
    pub trader_id: TraderId,
    /// The strategy ID associated with the order.
    pub strategy_id: StrategyId,
    /// The order's instrument ID.
    pub instrument_id: InstrumentId,
    /// The client order ID (globally unique within the trader).
    pub client_order_id: ClientOrderId,
    /// The venue order ID, assigned on ACCEPTED.
    pub venue_order_id: Option<VenueOrderId>,
    /// The position ID, assigned by the venue OMS policy on fill.
    pub position_id: Option<PositionId>,
    /// The account ID, assigned on SUBMITTED.
    pub account_id: Option<AccountId>,
    /// The order side.
    pub side: OrderSide,
    /// The order type.
    pub order_type: OrderType,
    /// The order quantity.
    pub quantity: Quantity,
    /// The order time in force.
    pub time_in_force: TimeInForce,
    /// The liquidity side of the most recent fill.
    pub liquidity_side: Option<LiquiditySide>,
    /// If the order carries the 'reduce-only' execution instruction.
    pub is_reduce_only: bool,
    /// The current order status.
    pub status: OrderStatus,
    /// The status retained under a pending overlay, for restoration.
    pub previous_status: Option<OrderStatus>,
    /// The total filled quantity.
    pub filled_qty: Quantity,
    /// The remaining open quantity (`quantity - filled_qty`).
    pub leaves_qty: Quantity,
    /// The volume-weighted average fill price.
    pub avg_px: Option<f64>,
    /// The first fill price.
    pub first_fill_px: Option<f64>,
    /// The slippage versus the order price, set on the first fill of priced orders.
    pub slippage: Option<f64>,
    /// The trade match IDs for the order's fills.
    pub trade_ids: Vec<TradeId>,
    /// The event ID of the `OrderInitialized` event.
    pub init_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the order was initialized.
    pub ts_init: UnixNanos,
    /// UNIX timestamp (nanoseconds) of the last applied event.
    pub ts_last: UnixNanos,
}

impl OrderCore {
    /// Creates a new [`OrderCore`] instance from an `OrderInitialized` event.
    #[must_use]
    pub fn new(init: OrderInitialized) -> Self {
        Self {
            events: vec![OrderEventAny::Initialized(init)],
            commissions: IndexMap::new(),
            trader_id: init.trader_id,
            strategy_id: init.strategy_id,
            instrument_id: init.instrument_id,
            client_order_id: init.client_order_id,
            venue_order_id: None,
            position_id: None,
            account_id: None,
            side: init.order_side,
            order_type: init.order_type,
            quantity: init.quantity,
            time_in_force: init.time_in_force,
            liquidity_side: None,
            is_reduce_only: init.reduce_only,
            status: OrderStatus::Initialized,
            previous_status: None,
            filled_qty: Quantity::zero(init.quantity.precision),
            leaves_qty: init.quantity,
            avg_px: None,
            first_fill_px: None,
            slippage: None,
            trade_ids: Vec::new(),
            init_id: init.event_id,
            ts_init: init.ts_init,
            ts_last: init.ts_init,
        }
    }

    /// Applies the given `event` to the order core.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not a legal transition from the
    /// current status, or targets a different client order ID.
    pub fn apply(&mut self, event: OrderEventAny) -> Result<(), OrderError> {
        if event.client_order_id() != self.client_order_id {
            return Err(OrderError::ClientOrderIdMismatch {
                event: event.client_order_id(),
                order: self.client_order_id,
            });
        }

        let leaves_after_fill = || match &event {
            OrderEventAny::Filled(fill) => fill.last_qty < self.leaves_qty,
            _ => false,
        };
        let new_status = transition(self.status, &event, leaves_after_fill, self.previous_status)?;

        match &event {
            OrderEventAny::PendingUpdate(_) | OrderEventAny::PendingCancel(_) => {
                self.previous_status = Some(self.status);
            }
            OrderEventAny::Updated(updated) => {
                self.previous_status = None;
                self.quantity = updated.quantity;
                self.leaves_qty = self.quantity.saturating_sub(self.filled_qty);
            }
            OrderEventAny::ModifyRejected(_) | OrderEventAny::CancelRejected(_) => {
                self.previous_status = None;
            }
            OrderEventAny::Submitted(submitted) => {
                self.account_id = Some(submitted.account_id);
            }
            OrderEventAny::Accepted(accepted) => {
                self.venue_order_id = Some(accepted.venue_order_id);
            }
            OrderEventAny::Filled(fill) => {
                self.apply_filled(fill);
            }
            _ => {}
        }

        self.status = new_status;
        self.ts_last = event.ts_event();
        self.events.push(event);
        Ok(())
    }

    fn apply_filled(&mut self, fill: &crate::events::OrderFilled) {
        let last_qty = fill.last_qty.min(self.leaves_qty);
        let prev_filled = self.filled_qty.as_f64();

        // Volume-weighted average price across fills
        let total = prev_filled + last_qty.as_f64();
        let avg_px = match self.avg_px {
            Some(avg) => (avg * prev_filled + fill.last_px.as_f64() * last_qty.as_f64()) / total,
            None => fill.last_px.as_f64(),
        };
        self.avg_px = Some(avg_px);

        if self.first_fill_px.is_none() {
            self.first_fill_px = Some(fill.last_px.as_f64());
        }

        self.filled_qty += last_qty;
        self.leaves_qty = self.quantity.saturating_sub(self.filled_qty);
        self.liquidity_side = Some(fill.liquidity_side);
        self.previous_status = None;

        if let Some(venue_order_id) = self.venue_order_id {
            debug_assert_eq!(venue_order_id, fill.venue_order_id);
        } else {
            self.venue_order_id = Some(fill.venue_order_id);
        }
        if self.position_id.is_none() {
            self.position_id = fill.position_id;
        }
        if self.account_id.is_none() {
            self.account_id = Some(fill.account_id);
        }

        self.trade_ids.push(fill.trade_id);
        if let Some(commission) = fill.commission {
            let entry = self
                .commissions
                .entry(commission.currency)
                .or_insert_with(|| Money::zero(commission.currency));
            *entry += commission;
        }
    }

    /// Records the slippage from the given reference `price` once the first
    /// fill has been applied.
    pub fn set_slippage(&mut self, price: Price) {
        if let Some(first_fill_px) = self.first_fill_px {
            self.slippage = Some((first_fill_px - price.as_f64()).abs());
        }
    }

    /// Returns the last applied event, if any beyond initialization.
    #[must_use]
    pub fn last_event(&self) -> &OrderEventAny {
        // SAFETY: events always contains at least the initialized event
        self.events.last().unwrap()
    }

    /// Returns the count of applied events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns whether the order is open at the venue.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Accepted
                | OrderStatus::Triggered
                | OrderStatus::PendingUpdate
                | OrderStatus::PendingCancel
                | OrderStatus::PartiallyFilled
        )
    }

    /// Returns whether the order is in a terminal state.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Denied
                | OrderStatus::Rejected
                | OrderStatus::Canceled
                | OrderStatus::Expired
                | OrderStatus::Filled
        )
    }

    /// Returns whether a command for the order is in flight to the venue.
    #[must_use]
    pub const fn is_inflight(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Submitted | OrderStatus::PendingUpdate | OrderStatus::PendingCancel
        )
    }

    /// Returns whether the order is on the buy side.
    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    /// Returns whether the order is on the sell side.
    #[must_use]
    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }
}

/// The interface implemented by all order types.
pub trait Order: 'static {
    /// Returns the current order status.
    fn status(&self) -> OrderStatus;
    /// Returns the trader ID associated with the order.
    fn trader_id(&self) -> TraderId;
    /// Returns the strategy ID associated with the order.
    fn strategy_id(&self) -> StrategyId;
    /// Returns the order's instrument ID.
    fn instrument_id(&self) -> InstrumentId;
    /// Returns the client order ID.
    fn client_order_id(&self) -> ClientOrderId;
    /// Returns the venue order ID, if assigned.
    fn venue_order_id(&self) -> Option<VenueOrderId>;
    /// Returns the position ID, if assigned.
    fn position_id(&self) -> Option<PositionId>;
    /// Returns the account ID, if assigned.
    fn account_id(&self) -> Option<AccountId>;
    /// Returns the order side.
    fn order_side(&self) -> OrderSide;
    /// Returns the order type.
    fn order_type(&self) -> OrderType;
    /// Returns the order quantity.
    fn quantity(&self) -> Quantity;
    /// Returns the order time in force.
    fn time_in_force(&self) -> TimeInForce;
    /// Returns the order limit price, if the order type carries one.
    fn price(&self) -> Option<Price>;
    /// Returns the order trigger price, if the order type carries one.
    fn trigger_price(&self) -> Option<Price>;
    /// Returns the expiration, for GTD orders.
    fn expire_time(&self) -> Option<UnixNanos>;
    /// Returns whether the order is post-only.
    fn is_post_only(&self) -> bool;
    /// Returns whether the order is reduce-only.
    fn is_reduce_only(&self) -> bool;
    /// Returns the total filled quantity.
    fn filled_qty(&self) -> Quantity;
    /// Returns the remaining open quantity.
    fn leaves_qty(&self) -> Quantity;
    /// Returns the volume-weighted average fill price.
    fn avg_px(&self) -> Option<f64>;
    /// Returns the slippage versus the order price.
    fn slippage(&self) -> Option<f64>;
    /// Returns the liquidity side of the most recent fill.
    fn liquidity_side(&self) -> Option<LiquiditySide>;
    /// Returns the applied order events in apply order.
    fn events(&self) -> &[OrderEventAny];
    /// Returns the last applied event.
    fn last_event(&self) -> &OrderEventAny;
    /// Returns the count of applied events.
    fn event_count(&self) -> usize;
    /// Returns whether the order is open at the venue.
    fn is_open(&self) -> bool;
    /// Returns whether the order is in a terminal state.
    fn is_closed(&self) -> bool;
    /// Returns whether a command for the order is in flight.
    fn is_inflight(&self) -> bool;
    /// UNIX timestamp (nanoseconds) when the order was initialized.
    fn ts_init(&self) -> UnixNanos;
    /// UNIX timestamp (nanoseconds) of the last applied event.
    fn ts_last(&self) -> UnixNanos;

    /// Returns the specified (non-null) order side.
    fn order_side_specified(&self) -> OrderSideSpecified {
        self.order_side().as_specified()
    }

    /// Applies the given `event` to the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not a legal transition.
    fn apply(&mut self, event: OrderEventAny) -> Result<(), OrderError>;

    /// Returns the `OrderInitialized` event which created the order.
    fn init_event(&self) -> OrderInitialized {
        match self.events().first() {
            Some(OrderEventAny::Initialized(init)) => *init,
            _ => panic!("Order event list must begin with `OrderInitialized`"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        enums::OrderStatus,
        events::{OrderCanceled, OrderDenied, OrderSubmitted},
    };

    fn init() -> OrderInitialized {
        OrderInitialized::new(
            TraderId::default(),
            StrategyId::default(),
            InstrumentId::from("AUD/USD.SIM"),
            ClientOrderId::default(),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from(100_000_u32),
            None,
            None,
            TimeInForce::Gtc,
            None,
            false,
            false,
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        )
    }

    #[rstest]
    fn test_new_core() {
        let core = OrderCore::new(init());
        assert_eq!(core.status, OrderStatus::Initialized);
        assert_eq!(core.leaves_qty, core.quantity);
        assert!(core.filled_qty.is_zero());
        assert_eq!(core.event_count(), 1);
    }

    #[rstest]
    fn test_denied_is_terminal() {
        let mut core = OrderCore::new(init());
        let denied = OrderEventAny::Denied(OrderDenied::new(
            core.trader_id,
            core.strategy_id,
            core.instrument_id,
            core.client_order_id,
            ustr::Ustr::from("testing"),
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        ));
        core.apply(denied).unwrap();
        assert_eq!(core.status, OrderStatus::Denied);
        assert!(core.is_closed());
        assert!(!core.is_open());
    }

    #[rstest]
    fn test_illegal_transition_errors() {
        let mut core = OrderCore::new(init());
        let canceled = OrderEventAny::Canceled(OrderCanceled::new(
            core.trader_id,
            core.strategy_id,
            core.instrument_id,
            core.client_order_id,
            None,
            None,
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        ));
        let result = core.apply(canceled);
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
        // Status unchanged after the failed apply
        assert_eq!(core.status, OrderStatus::Initialized);
    }

    #[rstest]
    fn test_client_order_id_mismatch_errors() {
        let mut core = OrderCore::new(init());
        let submitted = OrderEventAny::Submitted(OrderSubmitted::new(
            core.trader_id,
            core.strategy_id,
            core.instrument_id,
            ClientOrderId::new("O-OTHER"),
            AccountId::default(),
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        ));
        assert!(matches!(
            core.apply(submitted),
            Err(OrderError::ClientOrderIdMismatch { .. })
        ));
    }
}
