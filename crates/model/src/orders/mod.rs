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

//! Order types for the trading domain model, with a total event-driven state machine.

pub mod any;
pub mod base;
pub mod builder;
pub mod limit;
pub mod market;
pub mod stop_limit;
pub mod stop_market;

pub use any::{OrderAny, PassiveOrderAny, StopOrderAny};
pub use base::{Order, OrderCore, OrderError};
pub use builder::OrderTestBuilder;
pub use limit::LimitOrder;
pub use market::MarketOrder;
pub use stop_limit::StopLimitOrder;
pub use stop_market::StopMarketOrder;
