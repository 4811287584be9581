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

//! Bar aggregation machinery: builders and tick/volume/value/time aggregators.
//!
//! Aggregators consume ticks and emit a `Bar` to their handler when the window
//! closes. Late ticks (timestamps behind the last applied update) are dropped
//! unless the aggregator is configured to include them, as during a replay.

use meridian_core::UnixNanos;
use meridian_model::{
    data::{Bar, BarType, QuoteTick, TradeTick},
    enums::BarAggregation,
    types::{Price, Quantity},
};

/// The handler receiving completed bars from an aggregator.
pub type BarHandler = Box<dyn FnMut(Bar)>;

/// Accumulates OHLCV state for one bar window.
#[derive(Debug)]
pub struct BarBuilder {
    bar_type: BarType,
    size_precision: u8,
    initialized: bool,
    ts_last: UnixNanos,
    count: usize,
    open: Option<Price>,
    high: Option<Price>,
    low: Option<Price>,
    close: Option<Price>,
    volume_raw: u64,
}

impl BarBuilder {
    /// Creates a new [`BarBuilder`] instance.
    #[must_use]
    pub fn new(bar_type: BarType, size_precision: u8) -> Self {
        Self {
            bar_type,
            size_precision,
            initialized: false,
            ts_last: UnixNanos::default(),
            count: 0,
            open: None,
            high: None,
            low: None,
            close: None,
            volume_raw: 0,
        }
    }

    /// Returns whether the builder has received at least one update.
    #[must_use]
    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the count of updates in the current window.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// UNIX timestamp (nanoseconds) of the last applied update.
    #[must_use]
    pub const fn ts_last(&self) -> UnixNanos {
        self.ts_last
    }

    /// Applies an update to the current window.
    pub fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) {
        if self.open.is_none() {
            self.open = Some(price);
            self.high = Some(price);
            self.low = Some(price);
            self.initialized = true;
        } else {
            if self.high.is_some_and(|high| price > high) {
                self.high = Some(price);
            }
            if self.low.is_some_and(|low| price < low) {
                self.low = Some(price);
            }
        }
        self.close = Some(price);
        self.volume_raw += size.raw;
        self.count += 1;
        self.ts_last = ts_event;
    }

    /// Resets the builder for the next window.
    pub fn reset(&mut self) {
        self.open = None;
        self.high = None;
        self.low = None;
        self.close = None;
        self.volume_raw = 0;
        self.count = 0;
    }

    /// Builds a bar from the current window and resets the builder.
    ///
    /// # Panics
    ///
    /// Panics if the builder has received no updates.
    pub fn build(&mut self, ts_event: UnixNanos, ts_init: UnixNanos) -> Bar {
        let bar = Bar::new(
            self.bar_type,
            self.open.expect("No values to build bar"),
            self.high.expect("No values to build bar"),
            self.low.expect("No values to build bar"),
            self.close.expect("No values to build bar"),
            Quantity::from_raw(self.volume_raw, self.size_precision),
            ts_event,
            ts_init,
        );
        self.reset();
        bar
    }
}

/// An aggregator consuming price/size updates and emitting bars.
pub trait BarAggregator {
    /// Returns the bar type produced by the aggregator.
    fn bar_type(&self) -> BarType;

    /// Applies a raw update to the aggregator.
    fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos);

    /// Applies the given `quote`, extracting the spec's price type.
    fn handle_quote(&mut self, quote: &QuoteTick) {
        let spec = self.bar_type().spec;
        self.update(
            quote.extract_price(spec.price_type),
            quote.bid_size,
            quote.ts_event,
        );
    }

    /// Applies the given `trade`.
    fn handle_trade(&mut self, trade: &TradeTick) {
        self.update(trade.price, trade.size, trade.ts_event);
    }

    /// Builds and emits a bar from the current window (time aggregation).
    fn build_now(&mut self, _ts_event: UnixNanos) {}
}

/// Common state and behavior shared by the threshold aggregators.
pub struct BarAggregatorCore {
    bar_type: BarType,
    builder: BarBuilder,
    handler: BarHandler,
    include_late_ticks: bool,
}

impl BarAggregatorCore {
    /// Creates a new [`BarAggregatorCore`] instance.
    #[must_use]
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
        include_late_ticks: bool,
    ) -> Self {
        Self {
            bar_type,
            builder: BarBuilder::new(bar_type, size_precision),
            handler,
            include_late_ticks,
        }
    }

    fn is_late(&self, ts_event: UnixNanos) -> bool {
        !self.include_late_ticks && self.builder.initialized() && ts_event < self.builder.ts_last()
    }

    fn apply_update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) -> bool {
        if self.is_late(ts_event) {
            log::debug!(
                "Dropped late update for {} at {ts_event}",
                self.bar_type
            );
            return false;
        }
        self.builder.update(price, size, ts_event);
        true
    }

    fn build_and_send(&mut self, ts_event: UnixNanos) {
        let bar = self.builder.build(ts_event, ts_event);
        (self.handler)(bar);
    }
}

/// An aggregator emitting a bar after a fixed number of ticks.
pub struct TickBarAggregator {
    core: BarAggregatorCore,
}

impl TickBarAggregator {
    /// Creates a new [`TickBarAggregator`] instance.
    #[must_use]
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
        include_late_ticks: bool,
    ) -> Self {
        debug_assert_eq!(bar_type.spec.aggregation, BarAggregation::Tick);
        Self {
            core: BarAggregatorCore::new(bar_type, size_precision, handler, include_late_ticks),
        }
    }
}

impl BarAggregator for TickBarAggregator {
    fn bar_type(&self) -> BarType {
        self.core.bar_type
    }

    fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) {
        if !self.core.apply_update(price, size, ts_event) {
            return;
        }
        if self.core.builder.count() >= self.core.bar_type.spec.step {
            self.core.build_and_send(ts_event);
        }
    }
}

/// An aggregator emitting a bar once cumulative volume reaches the step.
pub struct VolumeBarAggregator {
    core: BarAggregatorCore,
    cumulative_volume: f64,
}

impl VolumeBarAggregator {
    /// Creates a new [`VolumeBarAggregator`] instance.
    #[must_use]
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
        include_late_ticks: bool,
    ) -> Self {
        debug_assert_eq!(bar_type.spec.aggregation, BarAggregation::Volume);
        Self {
            core: BarAggregatorCore::new(bar_type, size_precision, handler, include_late_ticks),
            cumulative_volume: 0.0,
        }
    }
}

impl BarAggregator for VolumeBarAggregator {
    fn bar_type(&self) -> BarType {
        self.core.bar_type
    }

    fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) {
        if !self.core.apply_update(price, size, ts_event) {
            return;
        }
        self.cumulative_volume += size.as_f64();
        if self.cumulative_volume >= self.core.bar_type.spec.step as f64 {
            self.cumulative_volume = 0.0;
            self.core.build_and_send(ts_event);
        }
    }
}

/// An aggregator emitting a bar once cumulative notional value reaches the
/// step.
pub struct ValueBarAggregator {
    core: BarAggregatorCore,
    cumulative_value: f64,
}

impl ValueBarAggregator {
    /// Creates a new [`ValueBarAggregator`] instance.
    #[must_use]
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
        include_late_ticks: bool,
    ) -> Self {
        debug_assert_eq!(bar_type.spec.aggregation, BarAggregation::Value);
        Self {
            core: BarAggregatorCore::new(bar_type, size_precision, handler, include_late_ticks),
            cumulative_value: 0.0,
        }
    }

    /// Returns the cumulative notional value in the current window.
    #[must_use]
    pub const fn cumulative_value(&self) -> f64 {
        self.cumulative_value
    }
}

impl BarAggregator for ValueBarAggregator {
    fn bar_type(&self) -> BarType {
        self.core.bar_type
    }

    fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) {
        if !self.core.apply_update(price, size, ts_event) {
            return;
        }
        self.cumulative_value += price.as_f64() * size.as_f64();
        if self.cumulative_value >= self.core.bar_type.spec.step as f64 {
            self.cumulative_value = 0.0;
            self.core.build_and_send(ts_event);
        }
    }
}

/// An aggregator emitting a bar when its clock timer fires at each window
/// boundary.
///
/// The owning engine registers the timer and routes the fired time events to
/// [`BarAggregator::build_now`].
pub struct TimeBarAggregator {
    core: BarAggregatorCore,
    interval_ns: u64,
}

impl TimeBarAggregator {
    /// Creates a new [`TimeBarAggregator`] instance.
    ///
    /// # Panics
    ///
    /// Panics if the bar specification is not time-driven.
    #[must_use]
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
        include_late_ticks: bool,
    ) -> Self {
        let interval_ns = bar_type.spec.timedelta_ns();
        Self {
            core: BarAggregatorCore::new(bar_type, size_precision, handler, include_late_ticks),
            interval_ns,
        }
    }

    /// Returns the window duration in nanoseconds.
    #[must_use]
    pub const fn interval_ns(&self) -> u64 {
        self.interval_ns
    }

    /// Returns the timer name used for this aggregator's clock timer.
    #[must_use]
    pub fn timer_name(&self) -> String {
        format!("{}", self.core.bar_type)
    }
}

impl BarAggregator for TimeBarAggregator {
    fn bar_type(&self) -> BarType {
        self.core.bar_type
    }

    fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) {
        self.core.apply_update(price, size, ts_event);
    }

    fn build_now(&mut self, ts_event: UnixNanos) {
        if self.core.builder.initialized() {
            self.core.build_and_send(ts_event);
        }
    }
}
