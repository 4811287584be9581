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

//! A spot currency pair instrument (FX or crypto).

use meridian_core::{UnixNanos, correctness::FAILED};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    identifiers::{InstrumentId, Symbol},
    instruments::Instrument,
    types::{Currency, Price, Quantity, fixed::check_fixed_precision},
};

/// Represents a generic currency pair instrument in a spot market.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// The instrument ID.
    pub id: InstrumentId,
    /// The raw/local/native symbol for the instrument, assigned by the venue.
    pub raw_symbol: Symbol,
    /// The currency pair base currency.
    pub base_currency: Currency,
    /// The currency pair quote currency.
    pub quote_currency: Currency,
    /// The price decimal precision.
    pub price_precision: u8,
    /// The trading size decimal precision.
    pub size_precision: u8,
    /// The minimum price increment (tick size).
    pub price_increment: Price,
    /// The minimum size increment.
    pub size_increment: Quantity,
    /// The rounded lot unit size, if any.
    pub lot_size: Option<Quantity>,
    /// The maximum allowable order quantity.
    pub max_quantity: Option<Quantity>,
    /// The minimum allowable order quantity.
    pub min_quantity: Option<Quantity>,
    /// The initial (order) margin rate.
    pub margin_init: Decimal,
    /// The maintenance (position) margin rate.
    pub margin_maint: Decimal,
    /// The fee rate for liquidity makers as a percentage of order value.
    pub maker_fee: Decimal,
    /// The fee rate for liquidity takers as a percentage of order value.
    pub taker_fee: Decimal,
    /// UNIX timestamp (nanoseconds) when the data event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl CurrencyPair {
    /// Creates a new [`CurrencyPair`] instance.
    ///
    /// # Panics
    ///
    /// Panics if the precisions are invalid or inconsistent with the
    /// increments.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: InstrumentId,
        raw_symbol: Symbol,
        base_currency: Currency,
        quote_currency: Currency,
        price_precision: u8,
        size_precision: u8,
        price_increment: Price,
        size_increment: Quantity,
        lot_size: Option<Quantity>,
        max_quantity: Option<Quantity>,
        min_quantity: Option<Quantity>,
        margin_init: Decimal,
        margin_maint: Decimal,
        maker_fee: Decimal,
        taker_fee: Decimal,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        check_fixed_precision(price_precision).expect(FAILED);
        check_fixed_precision(size_precision).expect(FAILED);
        assert_eq!(
            price_increment.precision, price_precision,
            "`price_increment` precision did not match `price_precision`"
        );
        assert_eq!(
            size_increment.precision, size_precision,
            "`size_increment` precision did not match `size_precision`"
        );
        Self {
            id,
            raw_symbol,
            base_currency,
            quote_currency,
            price_precision,
            size_precision,
            price_increment,
            size_increment,
            lot_size,
            max_quantity,
            min_quantity,
            margin_init,
            margin_maint,
            maker_fee,
            taker_fee,
            ts_event,
            ts_init,
        }
    }
}

impl PartialEq for CurrencyPair {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CurrencyPair {}

impl Instrument for CurrencyPair {
    fn id(&self) -> InstrumentId {
        self.id
    }

    fn raw_symbol(&self) -> Symbol {
        self.raw_symbol
    }

    fn base_currency(&self) -> Option<Currency> {
        Some(self.base_currency)
    }

    fn quote_currency(&self) -> Currency {
        self.quote_currency
    }

    fn settlement_currency(&self) -> Currency {
        self.quote_currency
    }

    fn is_inverse(&self) -> bool {
        false
    }

    fn price_precision(&self) -> u8 {
        self.price_precision
    }

    fn size_precision(&self) -> u8 {
        self.size_precision
    }

    fn price_increment(&self) -> Price {
        self.price_increment
    }

    fn size_increment(&self) -> Quantity {
        self.size_increment
    }

    fn multiplier(&self) -> Quantity {
        Quantity::from(1_u32)
    }

    fn lot_size(&self) -> Option<Quantity> {
        self.lot_size
    }

    fn max_quantity(&self) -> Option<Quantity> {
        self.max_quantity
    }

    fn min_quantity(&self) -> Option<Quantity> {
        self.min_quantity
    }

    fn margin_init(&self) -> Decimal {
        self.margin_init
    }

    fn margin_maint(&self) -> Decimal {
        self.margin_maint
    }

    fn maker_fee(&self) -> Decimal {
        self.maker_fee
    }

    fn taker_fee(&self) -> Decimal {
        self.taker_fee
    }

    fn ts_event(&self) -> UnixNanos {
        self.ts_event
    }

    fn ts_init(&self) -> UnixNanos {
        self.ts_init
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::stubs::audusd_sim;

    #[rstest]
    fn test_equality_by_id(audusd_sim: CurrencyPair) {
        let other = audusd_sim;
        assert_eq!(audusd_sim, other);
    }

    #[rstest]
    fn test_make_price_and_qty(audusd_sim: CurrencyPair) {
        assert_eq!(audusd_sim.make_price(0.75), Price::from("0.75000"));
        assert_eq!(audusd_sim.make_qty(100_000.0), Quantity::from(100_000_u32));
    }

    #[rstest]
    fn test_is_price_on_tick(audusd_sim: CurrencyPair) {
        assert!(audusd_sim.is_price_on_tick(Price::from("0.75000")));
        assert!(!audusd_sim.is_price_on_tick(Price::from("0.750001")));
    }

    #[rstest]
    fn test_notional_value(audusd_sim: CurrencyPair) {
        let notional = audusd_sim.calculate_notional_value(
            Quantity::from(100_000_u32),
            Price::from("0.75000"),
            None,
        );
        assert_eq!(notional, crate::types::Money::new(75_000.0, Currency::USD()));
    }

    #[rstest]
    fn test_validate_quantity(audusd_sim: CurrencyPair) {
        assert!(audusd_sim.validate_quantity(Quantity::from(100_000_u32)).is_ok());
        assert!(audusd_sim.validate_quantity(Quantity::zero(0)).is_err());
    }
}
