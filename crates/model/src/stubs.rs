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

//! Common test fixtures for the domain model.

use meridian_core::UnixNanos;
use rstest::fixture;
use rust_decimal_macros::dec;

use crate::{
    data::QuoteTick,
    identifiers::{InstrumentId, Symbol},
    instruments::{CurrencyPair, InstrumentAny},
    types::{Currency, Price, Quantity},
};

/// Returns a default AUD/USD spot FX instrument on the SIM venue (fees disabled).
#[fixture]
pub fn audusd_sim() -> CurrencyPair {
    CurrencyPair::new(
        InstrumentId::from("AUD/USD.SIM"),
        Symbol::new("AUD/USD"),
        Currency::AUD(),
        Currency::USD(),
        5,
        0,
        Price::from("0.00001"),
        Quantity::from(1_u32),
        Some(Quantity::from(1_000_u32)),
        Some(Quantity::from(1_000_000_000_u64)),
        Some(Quantity::from(1_u32)),
        dec!(0.03),
        dec!(0.03),
        dec!(0),
        dec!(0),
        UnixNanos::default(),
        UnixNanos::default(),
    )
}

/// Returns a default USD/JPY spot FX instrument on the SIM venue (fees disabled).
#[fixture]
pub fn usdjpy_sim() -> CurrencyPair {
    CurrencyPair::new(
        InstrumentId::from("USD/JPY.SIM"),
        Symbol::new("USD/JPY"),
        Currency::USD(),
        Currency::JPY(),
        3,
        0,
        Price::from("0.001"),
        Quantity::from(1_u32),
        Some(Quantity::from(1_000_u32)),
        Some(Quantity::from(1_000_000_000_u64)),
        Some(Quantity::from(1_u32)),
        dec!(0.03),
        dec!(0.03),
        dec!(0),
        dec!(0),
        UnixNanos::default(),
        UnixNanos::default(),
    )
}

/// Wraps the given currency pair into the instrument sum type.
#[must_use]
pub fn instrument_any(instrument: CurrencyPair) -> InstrumentAny {
    InstrumentAny::CurrencyPair(instrument)
}

/// Returns a quote tick for the given instrument at the given top of book.
#[must_use]
pub fn quote_tick(instrument_id: InstrumentId, bid: &str, ask: &str, ts: u64) -> QuoteTick {
    QuoteTick::new(
        instrument_id,
        Price::from(bid),
        Price::from(ask),
        Quantity::from(1_000_000_u32),
        Quantity::from(1_000_000_u32),
        UnixNanos::from(ts),
        UnixNanos::from(ts),
    )
}
