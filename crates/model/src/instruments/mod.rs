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

//! Instrument definitions for tradable assets and contracts.

pub mod any;
pub mod currency_pair;
pub mod equity;

use anyhow::Result;
use meridian_core::UnixNanos;
use rust_decimal::Decimal;

pub use any::InstrumentAny;
pub use currency_pair::CurrencyPair;
pub use equity::Equity;

use crate::{
    identifiers::{InstrumentId, Symbol},
    types::{Currency, Money, Price, Quantity},
};

/// A tradable instrument definition.
///
/// Immutable once added to the system: prices must be integer multiples of
/// `price_increment` and quantities of `size_increment`.
pub trait Instrument: 'static + Send {
    /// Returns the instrument ID.
    fn id(&self) -> InstrumentId;
    /// Returns the raw venue symbol.
    fn raw_symbol(&self) -> Symbol;
    /// Returns the base currency (if a currency pair).
    fn base_currency(&self) -> Option<Currency>;
    /// Returns the quote currency.
    fn quote_currency(&self) -> Currency;
    /// Returns the settlement (cost) currency.
    fn settlement_currency(&self) -> Currency;
    /// Returns whether the instrument quotes inversely.
    fn is_inverse(&self) -> bool;
    /// Returns the price decimal precision.
    fn price_precision(&self) -> u8;
    /// Returns the quantity decimal precision.
    fn size_precision(&self) -> u8;
    /// Returns the minimum price increment (tick size).
    fn price_increment(&self) -> Price;
    /// Returns the minimum size increment (lot granularity).
    fn size_increment(&self) -> Quantity;
    /// Returns the contract multiplier.
    fn multiplier(&self) -> Quantity;
    /// Returns the rounded lot size, if any.
    fn lot_size(&self) -> Option<Quantity>;
    /// Returns the maximum order quantity, if constrained.
    fn max_quantity(&self) -> Option<Quantity>;
    /// Returns the minimum order quantity, if constrained.
    fn min_quantity(&self) -> Option<Quantity>;
    /// Returns the initial (order) margin rate.
    fn margin_init(&self) -> Decimal;
    /// Returns the maintenance (position) margin rate.
    fn margin_maint(&self) -> Decimal;
    /// Returns the maker fee rate.
    fn maker_fee(&self) -> Decimal;
    /// Returns the taker fee rate.
    fn taker_fee(&self) -> Decimal;
    /// UNIX timestamp (nanoseconds) when the definition event occurred.
    fn ts_event(&self) -> UnixNanos;
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    fn ts_init(&self) -> UnixNanos;

    /// Creates a new [`Price`] from the given `value` with the correct
    /// price precision for the instrument.
    fn make_price(&self, value: f64) -> Price {
        Price::new(value, self.price_precision())
    }

    /// Creates a new [`Quantity`] from the given `value` with the correct
    /// size precision for the instrument.
    fn make_qty(&self, value: f64) -> Quantity {
        Quantity::new(value, self.size_precision())
    }

    /// Returns whether the given `price` lies on the instrument's tick grid.
    fn is_price_on_tick(&self, price: Price) -> bool {
        let increment = self.price_increment();
        increment.raw != 0 && price.raw % increment.raw == 0
    }

    /// Returns whether the given `quantity` is a multiple of the size increment.
    fn is_qty_on_lot(&self, quantity: Quantity) -> bool {
        let increment = self.size_increment();
        increment.raw != 0 && quantity.raw % increment.raw == 0
    }

    /// Calculates the notional value of the given `quantity` at `price`.
    ///
    /// The result is denominated in the quote currency (or the base currency
    /// for inverse instruments unless `use_quote_for_inverse` is set).
    fn calculate_notional_value(
        &self,
        quantity: Quantity,
        price: Price,
        use_quote_for_inverse: Option<bool>,
    ) -> Money {
        let use_quote_for_inverse = use_quote_for_inverse.unwrap_or(false);
        let (amount, currency) = if self.is_inverse() {
            if use_quote_for_inverse {
                (quantity.as_f64(), self.quote_currency())
            } else {
                let amount =
                    quantity.as_f64() * self.multiplier().as_f64() * (1.0 / price.as_f64());
                let currency = self
                    .base_currency()
                    .expect("Inverse instrument without base currency");
                (amount, currency)
            }
        } else {
            let amount = quantity.as_f64() * self.multiplier().as_f64() * price.as_f64();
            (amount, self.quote_currency())
        };
        Money::new(amount, currency)
    }

    /// Validates an order quantity against the instrument definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero, off the lot grid, or outside
    /// the instrument limits.
    fn validate_quantity(&self, quantity: Quantity) -> Result<()> {
        if quantity.is_zero() {
            anyhow::bail!("Order quantity was zero");
        }
        if quantity.precision != self.size_precision() {
            anyhow::bail!(
                "Order quantity precision {} did not match instrument size precision {}",
                quantity.precision,
                self.size_precision()
            );
        }
        if !self.is_qty_on_lot(quantity) {
            anyhow::bail!(
                "Order quantity {quantity} not a multiple of size increment {}",
                self.size_increment()
            );
        }
        if let Some(max_quantity) = self.max_quantity() {
            if quantity > max_quantity {
                anyhow::bail!("Order quantity {quantity} exceeds maximum {max_quantity}");
            }
        }
        if let Some(min_quantity) = self.min_quantity() {
            if quantity < min_quantity {
                anyhow::bail!("Order quantity {quantity} below minimum {min_quantity}");
            }
        }
        Ok(())
    }

    /// Validates an order price against the instrument definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the price precision mismatches or the price is off
    /// the tick grid.
    fn validate_price(&self, price: Price) -> Result<()> {
        if price.precision != self.price_precision() {
            anyhow::bail!(
                "Order price precision {} did not match instrument price precision {}",
                price.precision,
                self.price_precision()
            );
        }
        if !self.is_price_on_tick(price) {
            anyhow::bail!(
                "Order price {price} not a multiple of tick size {}",
                self.price_increment()
            );
        }
        Ok(())
    }
}
