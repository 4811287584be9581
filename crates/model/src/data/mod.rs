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

//! Market data types for the trading domain model.

pub mod bar;
pub mod delta;
pub mod quote;
pub mod trade;

use meridian_core::UnixNanos;
use serde::{Deserialize, Serialize};

pub use bar::{Bar, BarSpecification, BarType};
pub use delta::{BookOrder, OrderBookDelta};
pub use quote::QuoteTick;
pub use trade::TradeTick;

use crate::identifiers::InstrumentId;

/// A trait for data which carries an initialization timestamp.
pub trait HasTsInit {
    /// Returns the UNIX timestamp (nanoseconds) when the instance was initialized.
    fn ts_init(&self) -> UnixNanos;
}

/// A sum type for all market data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Data {
    /// An order book delta.
    Delta(OrderBookDelta),
    /// A top-of-book quote tick.
    Quote(QuoteTick),
    /// A trade tick.
    Trade(TradeTick),
    /// An OHLCV bar.
    Bar(Bar),
}

impl Data {
    /// Returns the instrument ID for the data.
    #[must_use]
    pub fn instrument_id(&self) -> InstrumentId {
        match self {
            Self::Delta(delta) => delta.instrument_id,
            Self::Quote(quote) => quote.instrument_id,
            Self::Trade(trade) => trade.instrument_id,
            Self::Bar(bar) => bar.bar_type.instrument_id,
        }
    }
}

impl HasTsInit for Data {
    fn ts_init(&self) -> UnixNanos {
        match self {
            Self::Delta(delta) => delta.ts_init,
            Self::Quote(quote) => quote.ts_init,
            Self::Trade(trade) => trade.ts_init,
            Self::Bar(bar) => bar.ts_init,
        }
    }
}

impl From<OrderBookDelta> for Data {
    fn from(value: OrderBookDelta) -> Self {
        Self::Delta(value)
    }
}

impl From<QuoteTick> for Data {
    fn from(value: QuoteTick) -> Self {
        Self::Quote(value)
    }
}

impl From<TradeTick> for Data {
    fn from(value: TradeTick) -> Self {
        Self::Trade(value)
    }
}

impl From<Bar> for Data {
    fn from(value: Bar) -> Self {
        Self::Bar(value)
    }
}
