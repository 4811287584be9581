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

//! A `QuoteTick` representing the top of the book for an instrument.

use std::fmt::Display;

use meridian_core::UnixNanos;
use serde::{Deserialize, Serialize};

use crate::{
    enums::PriceType,
    identifiers::InstrumentId,
    types::{Price, Quantity},
};

/// Represents a single quote tick in a market (top-of-book bid and ask).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteTick {
    /// The quote's instrument ID.
    pub instrument_id: InstrumentId,
    /// The top-of-book bid price.
    pub bid_price: Price,
    /// The top-of-book ask price.
    pub ask_price: Price,
    /// The top-of-book bid size.
    pub bid_size: Quantity,
    /// The top-of-book ask size.
    pub ask_size: Quantity,
    /// UNIX timestamp (nanoseconds) when the quote event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl QuoteTick {
    /// Creates a new [`QuoteTick`] instance.
    #[must_use]
    pub const fn new(
        instrument_id: InstrumentId,
        bid_price: Price,
        ask_price: Price,
        bid_size: Quantity,
        ask_size: Quantity,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            instrument_id,
            bid_price,
            ask_price,
            bid_size,
            ask_size,
            ts_event,
            ts_init,
        }
    }

    /// Returns the price for the given `price_type`.
    #[must_use]
    pub fn extract_price(&self, price_type: PriceType) -> Price {
        match price_type {
            PriceType::Bid => self.bid_price,
            PriceType::Ask => self.ask_price,
            PriceType::Mid | PriceType::Last => Price::from_raw(
                (self.bid_price.raw + self.ask_price.raw) / 2,
                self.bid_price.precision,
            ),
        }
    }
}

impl Display for QuoteTick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.instrument_id,
            self.bid_price,
            self.ask_price,
            self.bid_size,
            self.ask_size,
            self.ts_event,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn quote() -> QuoteTick {
        QuoteTick::new(
            InstrumentId::from("AUD/USD.SIM"),
            Price::from("0.75000"),
            Price::from("0.75005"),
            Quantity::from(1_000_000_u32),
            Quantity::from(1_000_000_u32),
            UnixNanos::from(1),
            UnixNanos::from(1),
        )
    }

    #[rstest]
    #[case(PriceType::Bid, Price::from("0.75000"))]
    #[case(PriceType::Ask, Price::from("0.75005"))]
    #[case(PriceType::Mid, Price::from_raw(750_025_000, 5))]
    fn test_extract_price(#[case] price_type: PriceType, #[case] expected: Price) {
        assert_eq!(quote().extract_price(price_type), expected);
    }

    #[rstest]
    fn test_display() {
        assert_eq!(
            quote().to_string(),
            "AUD/USD.SIM,0.75000,0.75005,1000000,1000000,1"
        );
    }

    #[rstest]
    fn test_serde_round_trip() {
        let quote = quote();
        let json = serde_json::to_string(&quote).unwrap();
        let parsed: QuoteTick = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, quote);
    }
}
