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

//! Position lifecycle events, generated by the execution engine from fills.

use std::fmt::{Display, Formatter};

use meridian_core::{UUID4, UnixNanos};
use serde::{Deserialize, Serialize};

use crate::{
    enums::{OrderSide, PositionSide},
    events::OrderFilled,
    identifiers::{AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, TraderId},
    position::Position,
    types::{Currency, Money, Price, Quantity},
};

/// The state snapshot shared by all position events.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    /// The trader ID associated with the event.
    pub trader_id: TraderId,
    /// The strategy ID associated with the event.
    pub strategy_id: StrategyId,
    /// The instrument ID associated with the event.
    pub instrument_id: InstrumentId,
    /// The position ID.
    pub position_id: PositionId,
    /// The account ID associated with the position.
    pub account_id: AccountId,
    /// The client order ID for the order which opened the position.
    pub opening_order_id: ClientOrderId,
    /// The entry direction from open.
    pub entry: OrderSide,
    /// The current position side.
    pub side: PositionSide,
    /// The current signed quantity (positive for LONG, negative for SHORT).
    pub signed_qty: f64,
    /// The current open quantity.
    pub quantity: Quantity,
    /// The peak directional quantity reached by the position.
    pub peak_quantity: Quantity,
    /// The last fill quantity for the position.
    pub last_qty: Quantity,
    /// The last fill price for the position.
    pub last_px: Price,
    /// The position quote currency.
    pub currency: Currency,
    /// The average open price.
    pub avg_px_open: f64,
    /// The average close price, if any close fills.
    pub avg_px_close: Option<f64>,
    /// The realized return for the position.
    pub realized_return: f64,
    /// The realized PnL for the position (including commissions).
    pub realized_pnl: Option<Money>,
    /// The unrealized PnL for the position (based on last price).
    pub unrealized_pnl: Option<Money>,
    /// UNIX timestamp (nanoseconds) when the position opened.
    pub ts_opened: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the position closed, if closed.
    pub ts_closed: Option<UnixNanos>,
    /// The total open duration in nanoseconds, if closed.
    pub duration_ns: Option<u64>,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl PositionState {
    /// Creates a new [`PositionState`] snapshot from the given `position` and
    /// causal `fill`.
    #[must_use]
    pub fn from_position(position: &Position, fill: &OrderFilled, event_id: UUID4) -> Self {
        Self {
            trader_id: position.trader_id,
            strategy_id: position.strategy_id,
            instrument_id: position.instrument_id,
            position_id: position.id,
            account_id: position.account_id,
            opening_order_id: position.opening_order_id,
            entry: position.entry,
            side: position.side,
            signed_qty: position.signed_qty,
            quantity: position.quantity,
            peak_quantity: position.peak_qty,
            last_qty: fill.last_qty,
            last_px: fill.last_px,
            currency: position.quote_currency,
            avg_px_open: position.avg_px_open,
            avg_px_close: position.avg_px_close,
            realized_return: position.realized_return,
            realized_pnl: position.realized_pnl,
            unrealized_pnl: None,
            ts_opened: position.ts_opened,
            ts_closed: position.ts_closed,
            duration_ns: position.duration_ns,
            event_id,
            ts_event: fill.ts_event,
            ts_init: fill.ts_init,
        }
    }
}

/// Represents an event where a position has been opened.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionOpened {
    /// The position state at the open.
    pub state: PositionState,
}

/// Represents an event where a position has changed (extended or reduced).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionChanged {
    /// The position state after the change.
    pub state: PositionState,
}

/// Represents an event where a position has been closed (quantity zero).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionClosed {
    /// The position state at the close.
    pub state: PositionState,
}

/// A tagged sum type covering all position events.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PositionEventAny {
    /// A position was opened.
    Opened(PositionOpened),
    /// A position was extended or reduced.
    Changed(PositionChanged),
    /// A position was closed.
    Closed(PositionClosed),
}

impl PositionEventAny {
    /// Returns the position state snapshot for the event.
    #[must_use]
    pub const fn state(&self) -> &PositionState {
        match self {
            Self::Opened(event) => &event.state,
            Self::Changed(event) => &event.state,
            Self::Closed(event) => &event.state,
        }
    }

    /// Returns the position ID for the event.
    #[must_use]
    pub const fn position_id(&self) -> PositionId {
        self.state().position_id
    }

    /// Returns the strategy ID for the event.
    #[must_use]
    pub const fn strategy_id(&self) -> StrategyId {
        self.state().strategy_id
    }

    /// Returns the instrument ID for the event.
    #[must_use]
    pub const fn instrument_id(&self) -> InstrumentId {
        self.state().instrument_id
    }

    /// UNIX timestamp (nanoseconds) when the event occurred.
    #[must_use]
    pub const fn ts_event(&self) -> UnixNanos {
        self.state().ts_event
    }
}

impl Display for PositionEventAny {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (kind, state) = match self {
            Self::Opened(event) => ("PositionOpened", &event.state),
            Self::Changed(event) => ("PositionChanged", &event.state),
            Self::Closed(event) => ("PositionClosed", &event.state),
        };
        write!(
            f,
            "{kind}(instrument_id={}, position_id={}, side={}, quantity={})",
            state.instrument_id,
            state.position_id,
            state.side,
            state.quantity.to_formatted_string(),
        )
    }
}
