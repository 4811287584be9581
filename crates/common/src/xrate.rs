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

//! Exchange rate calculation over a graph of currency-pair rates.

use ahash::AHashMap;
use meridian_model::{
    enums::PriceType,
    instruments::Instrument,
    types::Currency,
};
use ustr::Ustr;

use crate::cache::Cache;

/// A map from `(base code, quote code)` to the latest observed rate.
pub type RateMap = AHashMap<(Ustr, Ustr), f64>;

/// Builds the cross-rate map from the latest cached quotes of currency pair
/// instruments (mid prices).
#[must_use]
pub fn build_rate_map(cache: &Cache) -> RateMap {
    let mut rates = RateMap::default();
    for instrument_id in cache.instrument_ids() {
        let Some(instrument) = cache.instrument(instrument_id) else {
            continue;
        };
        let Some(base_currency) = instrument.base_currency() else {
            continue;
        };
        if let Some(mid) = cache.price(instrument_id, PriceType::Mid) {
            rates.insert(
                (base_currency.code, instrument.quote_currency().code),
                mid.as_f64(),
            );
        }
    }
    rates
}

/// Returns the exchange rate to convert `from_currency` into `to_currency`
/// from the given pair `rates`, chaining through at most one intermediate
/// currency.
///
/// Returns `None` when no conversion path exists.
#[must_use]
pub fn get_exchange_rate(
    from_currency: Currency,
    to_currency: Currency,
    rates: &RateMap,
) -> Option<f64> {
    if from_currency == to_currency {
        return Some(1.0);
    }
    let from = from_currency.code;
    let to = to_currency.code;

    if let Some(rate) = direct_rate(from, to, rates) {
        return Some(rate);
    }

    // Chain through one intermediate currency drawn from the observed pairs
    let mut intermediates: Vec<Ustr> = Vec::new();
    for (base, quote) in rates.keys() {
        if *base == from || *quote == from {
            let other = if *base == from { *quote } else { *base };
            if !intermediates.contains(&other) {
                intermediates.push(other);
            }
        }
    }
    intermediates.sort();

    for intermediate in intermediates {
        if let (Some(leg1), Some(leg2)) = (
            direct_rate(from, intermediate, rates),
            direct_rate(intermediate, to, rates),
        ) {
            return Some(leg1 * leg2);
        }
    }
    None
}

fn direct_rate(from: Ustr, to: Ustr, rates: &RateMap) -> Option<f64> {
    if let Some(rate) = rates.get(&(from, to)) {
        return Some(*rate);
    }
    rates
        .get(&(to, from))
        .filter(|rate| **rate != 0.0)
        .map(|rate| 1.0 / rate)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn rates() -> RateMap {
        let mut rates = RateMap::default();
        rates.insert((Ustr::from("AUD"), Ustr::from("USD")), 0.75);
        rates.insert((Ustr::from("USD"), Ustr::from("JPY")), 110.0);
        rates
    }

    #[rstest]
    fn test_identity() {
        assert_eq!(
            get_exchange_rate(Currency::USD(), Currency::USD(), &rates()),
            Some(1.0)
        );
    }

    #[rstest]
    fn test_direct() {
        assert_eq!(
            get_exchange_rate(Currency::AUD(), Currency::USD(), &rates()),
            Some(0.75)
        );
    }

    #[rstest]
    fn test_inverse() {
        assert_eq!(
            get_exchange_rate(Currency::USD(), Currency::AUD(), &rates()),
            Some(1.0 / 0.75)
        );
    }

    #[rstest]
    fn test_one_hop_chain() {
        // AUD -> USD -> JPY
        assert_eq!(
            get_exchange_rate(Currency::AUD(), Currency::JPY(), &rates()),
            Some(0.75 * 110.0)
        );
    }

    #[rstest]
    fn test_no_path() {
        assert_eq!(
            get_exchange_rate(Currency::GBP(), Currency::JPY(), &rates()),
            None
        );
    }
}
