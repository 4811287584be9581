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

//! Plugin modules extending the simulated exchange (e.g. FX rollover
//! interest), registered at venue-add time.

use ahash::AHashMap;
use chrono::NaiveDate;
use meridian_core::{
    UnixNanos,
    datetime::{next_utc_midnight_ns, to_naive_date},
};
use meridian_model::{data::Data, types::Money};
use ustr::Ustr;

use crate::exchange::SimulatedExchange;

/// A custom simulation module extending the venue simulation.
///
/// Modules observe market data before matching and run simulation logic at
/// each exchange step.
pub trait SimulationModule {
    /// Returns the module name for logging.
    fn name(&self) -> &'static str;

    /// Observes market data before the main matching processing.
    fn pre_process(&mut self, data: &Data);

    /// Processes simulation logic at the given timestamp.
    fn process(&mut self, exchange: &mut SimulatedExchange, ts_now: UnixNanos);

    /// Resets the module to its initial state.
    fn reset(&mut self);
}

/// Applies nightly rollover interest to open FX positions.
///
/// Rates are keyed by `(date, currency pair)` as an annualized fraction; the
/// daily interest applied is `notional * rate / 365`, positive for longs and
/// negative for shorts. The trigger time is venue-local midnight resolved via
/// the exchange clock (UTC for the simulated venue).
pub struct FxRolloverInterestModule {
    rates: AHashMap<(NaiveDate, Ustr), f64>,
    next_rollover_ns: Option<UnixNanos>,
    applied_count: usize,
}

impl FxRolloverInterestModule {
    /// Creates a new [`FxRolloverInterestModule`] instance from a rate
    /// schedule keyed by `(date, pair)` (e.g. `"AUD/USD"`).
    #[must_use]
    pub fn new(rates: AHashMap<(NaiveDate, Ustr), f64>) -> Self {
        Self {
            rates,
            next_rollover_ns: None,
            applied_count: 0,
        }
    }

    /// Returns the count of rollover adjustments applied.
    #[must_use]
    pub const fn applied_count(&self) -> usize {
        self.applied_count
    }

    fn apply_rollover(&mut self, exchange: &mut SimulatedExchange, ts_now: UnixNanos) {
        let date = to_naive_date(ts_now);
        let positions = exchange.open_positions();
        for position in positions {
            let pair = position.instrument_id.symbol.inner();
            let Some(rate) = self.rates.get(&(date, pair)) else {
                continue;
            };
            let Some(mark) = exchange.best_bid_price(position.instrument_id) else {
                continue;
            };
            let notional = position.notional_value(mark);
            let direction = if position.is_long() { 1.0 } else { -1.0 };
            let interest = Money::new(
                notional.as_f64() * rate / 365.0 * direction,
                notional.currency,
            );
            log::debug!(
                "Applying rollover interest {interest} for {}",
                position.instrument_id
            );
            exchange.adjust_account(interest);
            self.applied_count += 1;
        }
    }
}

impl SimulationModule for FxRolloverInterestModule {
    fn name(&self) -> &'static str {
        stringify!(FxRolloverInterestModule)
    }

    fn pre_process(&mut self, _data: &Data) {}

    fn process(&mut self, exchange: &mut SimulatedExchange, ts_now: UnixNanos) {
        match self.next_rollover_ns {
            None => {
                self.next_rollover_ns = Some(next_utc_midnight_ns(ts_now));
            }
            Some(next_rollover_ns) if ts_now >= next_rollover_ns => {
                self.apply_rollover(exchange, ts_now);
                self.next_rollover_ns = Some(next_utc_midnight_ns(ts_now));
            }
            Some(_) => {}
        }
    }

    fn reset(&mut self) {
        self.next_rollover_ns = None;
        self.applied_count = 0;
    }
}
