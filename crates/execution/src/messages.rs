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

//! Trading command messages routed between strategies, the risk engine, the
//! execution engine, and execution clients.

use std::fmt::{Display, Formatter};

use meridian_core::{UUID4, UnixNanos};
use meridian_model::{
    identifiers::{
        ClientId, ClientOrderId, InstrumentId, PositionId, StrategyId, TraderId, VenueOrderId,
    },
    orders::{Order, OrderAny},
    types::{Price, Quantity},
};

/// The bus endpoint for commands entering the risk engine.
pub const RISK_ENGINE_EXECUTE: &str = "RiskEngine.execute";

/// The bus endpoint for commands entering the execution engine.
pub const EXEC_ENGINE_EXECUTE: &str = "ExecEngine.execute";

/// The bus endpoint for order events entering the execution engine.
pub const EXEC_ENGINE_PROCESS: &str = "ExecEngine.process";

/// A command to submit the given order to its venue.
#[derive(Clone, Debug)]
pub struct SubmitOrder {
    /// The trader ID associated with the command.
    pub trader_id: TraderId,
    /// The execution client ID for routing.
    pub client_id: Option<ClientId>,
    /// The strategy ID associated with the command.
    pub strategy_id: StrategyId,
    /// The instrument ID for the order.
    pub instrument_id: InstrumentId,
    /// The client order ID.
    pub client_order_id: ClientOrderId,
    /// The order to submit.
    pub order: OrderAny,
    /// The position ID to associate the order with (hedging OMS).
    pub position_id: Option<PositionId>,
    /// The unique identifier for the command.
    pub command_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the command was initialized.
    pub ts_init: UnixNanos,
}

impl SubmitOrder {
    /// Creates a new [`SubmitOrder`] command for the given `order`.
    #[must_use]
    pub fn new(
        order: OrderAny,
        client_id: Option<ClientId>,
        position_id: Option<PositionId>,
        command_id: UUID4,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            trader_id: order.trader_id(),
            client_id,
            strategy_id: order.strategy_id(),
            instrument_id: order.instrument_id(),
            client_order_id: order.client_order_id(),
            order,
            position_id,
            command_id,
            ts_init,
        }
    }
}

impl Display for SubmitOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(SubmitOrder),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// A command to modify the price, trigger price, and/or quantity of a working
/// order.
#[derive(Clone, Debug)]
pub struct ModifyOrder {
    /// The trader ID associated with the command.
    pub trader_id: TraderId,
    /// The execution client ID for routing.
    pub client_id: Option<ClientId>,
    /// The strategy ID associated with the command.
    pub strategy_id: StrategyId,
    /// The instrument ID for the order.
    pub instrument_id: InstrumentId,
    /// The client order ID.
    pub client_order_id: ClientOrderId,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The new quantity, if changing.
    pub quantity: Option<Quantity>,
    /// The new limit price, if changing.
    pub price: Option<Price>,
    /// The new trigger price, if changing.
    pub trigger_price: Option<Price>,
    /// The unique identifier for the command.
    pub command_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the command was initialized.
    pub ts_init: UnixNanos,
}

impl Display for ModifyOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(ModifyOrder),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// A command to cancel a working order.
#[derive(Clone, Debug)]
pub struct CancelOrder {
    /// The trader ID associated with the command.
    pub trader_id: TraderId,
    /// The execution client ID for routing.
    pub client_id: Option<ClientId>,
    /// The strategy ID associated with the command.
    pub strategy_id: StrategyId,
    /// The instrument ID for the order.
    pub instrument_id: InstrumentId,
    /// The client order ID.
    pub client_order_id: ClientOrderId,
    /// The venue order ID, if assigned.
    pub venue_order_id: Option<VenueOrderId>,
    /// The unique identifier for the command.
    pub command_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the command was initialized.
    pub ts_init: UnixNanos,
}

impl Display for CancelOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, client_order_id={})",
            stringify!(CancelOrder),
            self.instrument_id,
            self.client_order_id,
        )
    }
}

/// A tagged sum type covering all trading commands.
#[derive(Clone, Debug)]
pub enum TradingCommand {
    /// Submit an order.
    SubmitOrder(SubmitOrder),
    /// Modify a working order.
    ModifyOrder(ModifyOrder),
    /// Cancel a working order.
    CancelOrder(CancelOrder),
}

impl TradingCommand {
    /// Returns the instrument ID for the command.
    #[must_use]
    pub fn instrument_id(&self) -> InstrumentId {
        match self {
            Self::SubmitOrder(command) => command.instrument_id,
            Self::ModifyOrder(command) => command.instrument_id,
            Self::CancelOrder(command) => command.instrument_id,
        }
    }

    /// Returns the client order ID for the command.
    #[must_use]
    pub fn client_order_id(&self) -> ClientOrderId {
        match self {
            Self::SubmitOrder(command) => command.client_order_id,
            Self::ModifyOrder(command) => command.client_order_id,
            Self::CancelOrder(command) => command.client_order_id,
        }
    }

    /// Returns the strategy ID for the command.
    #[must_use]
    pub fn strategy_id(&self) -> StrategyId {
        match self {
            Self::SubmitOrder(command) => command.strategy_id,
            Self::ModifyOrder(command) => command.strategy_id,
            Self::CancelOrder(command) => command.strategy_id,
        }
    }

    /// Returns the execution client ID for routing, if specified.
    #[must_use]
    pub fn client_id(&self) -> Option<ClientId> {
        match self {
            Self::SubmitOrder(command) => command.client_id,
            Self::ModifyOrder(command) => command.client_id,
            Self::CancelOrder(command) => command.client_id,
        }
    }

    /// UNIX timestamp (nanoseconds) when the command was initialized.
    #[must_use]
    pub fn ts_init(&self) -> UnixNanos {
        match self {
            Self::SubmitOrder(command) => command.ts_init,
            Self::ModifyOrder(command) => command.ts_init,
            Self::CancelOrder(command) => command.ts_init,
        }
    }
}

impl Display for TradingCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubmitOrder(command) => write!(f, "{command}"),
            Self::ModifyOrder(command) => write!(f, "{command}"),
            Self::CancelOrder(command) => write!(f, "{command}"),
        }
    }
}
