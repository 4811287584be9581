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

//! The `DataEngine`: ingests market data, updates the cache, and fans out to
//! bus subscribers on the `data.*` topic hierarchy.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use meridian_common::{
    cache::Cache,
    clock::Clock,
    msgbus::{self, MessageBus},
    timer::TimeEvent,
};
use meridian_core::UnixNanos;
use meridian_model::{
    data::{Bar, BarType, Data, OrderBookDelta, QuoteTick, TradeTick},
    enums::AggregationSource,
    instruments::{Instrument, InstrumentAny},
};
use ustr::Ustr;

use crate::aggregation::{
    BarAggregator, TickBarAggregator, TimeBarAggregator, ValueBarAggregator, VolumeBarAggregator,
};

/// Returns the bus topic for quotes of the given instrument.
#[must_use]
pub fn quotes_topic(instrument_id: &meridian_model::identifiers::InstrumentId) -> Ustr {
    Ustr::from(&format!("data.quotes.{instrument_id}"))
}

/// Returns the bus topic for trades of the given instrument.
#[must_use]
pub fn trades_topic(instrument_id: &meridian_model::identifiers::InstrumentId) -> Ustr {
    Ustr::from(&format!("data.trades.{instrument_id}"))
}

/// Returns the bus topic for bars of the given bar type.
#[must_use]
pub fn bars_topic(bar_type: &BarType) -> Ustr {
    Ustr::from(&format!("data.bars.{bar_type}"))
}

/// Returns the bus topic for book deltas of the given instrument.
#[must_use]
pub fn book_topic(instrument_id: &meridian_model::identifiers::InstrumentId) -> Ustr {
    Ustr::from(&format!("data.book.{instrument_id}"))
}

/// Configuration for the `DataEngine`.
#[derive(Clone, Copy, Debug)]
pub struct DataEngineConfig {
    /// Whether aggregators include late ticks (replay) rather than dropping
    /// them (wall-clock).
    pub include_late_ticks: bool,
}

impl Default for DataEngineConfig {
    fn default() -> Self {
        Self {
            include_late_ticks: false,
        }
    }
}

/// Ingests market data, updates the cache, and publishes to subscribers.
pub struct DataEngine {
    clock: Rc<RefCell<dyn Clock>>,
    cache: Rc<RefCell<Cache>>,
    msgbus: Rc<RefCell<MessageBus>>,
    config: DataEngineConfig,
    bar_aggregators: IndexMap<BarType, Rc<RefCell<dyn BarAggregator>>>,
}

impl DataEngine {
    /// Creates a new [`DataEngine`] instance.
    #[must_use]
    pub fn new(
        clock: Rc<RefCell<dyn Clock>>,
        cache: Rc<RefCell<Cache>>,
        msgbus: Rc<RefCell<MessageBus>>,
        config: Option<DataEngineConfig>,
    ) -> Self {
        Self {
            clock,
            cache,
            msgbus,
            config: config.unwrap_or_default(),
            bar_aggregators: IndexMap::new(),
        }
    }

    /// Returns the bar types with active internal aggregators.
    #[must_use]
    pub fn registered_bar_types(&self) -> Vec<&BarType> {
        self.bar_aggregators.keys().collect()
    }

    /// Processes the given instrument definition: caches it and publishes on
    /// `data.instrument.{instrument_id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write-through fails.
    pub fn process_instrument(&mut self, instrument: InstrumentAny) -> anyhow::Result<()> {
        self.cache.borrow_mut().add_instrument(instrument)?;
        let topic = Ustr::from(&format!("data.instrument.{}", instrument.id()));
        msgbus::publish(&self.msgbus, &topic, &instrument);
        Ok(())
    }

    /// Processes the given market data, updating the cache, feeding internal
    /// bar aggregators, and publishing on the appropriate topic.
    pub fn process(&mut self, data: &Data) {
        match data {
            Data::Quote(quote) => self.handle_quote(quote),
            Data::Trade(trade) => self.handle_trade(trade),
            Data::Bar(bar) => self.handle_bar(bar),
            Data::Delta(delta) => self.handle_delta(delta),
        }
    }

    fn handle_quote(&mut self, quote: &QuoteTick) {
        self.cache.borrow_mut().add_quote(*quote);

        for aggregator in self.bar_aggregators.values() {
            if aggregator.borrow().bar_type().instrument_id == quote.instrument_id {
                aggregator.borrow_mut().handle_quote(quote);
            }
        }

        msgbus::publish(&self.msgbus, &quotes_topic(&quote.instrument_id), quote);
    }

    fn handle_trade(&mut self, trade: &TradeTick) {
        self.cache.borrow_mut().add_trade(*trade);

        for aggregator in self.bar_aggregators.values() {
            if aggregator.borrow().bar_type().instrument_id == trade.instrument_id {
                aggregator.borrow_mut().handle_trade(trade);
            }
        }

        msgbus::publish(&self.msgbus, &trades_topic(&trade.instrument_id), trade);
    }

    fn handle_bar(&mut self, bar: &Bar) {
        self.cache.borrow_mut().add_bar(*bar);
        msgbus::publish(&self.msgbus, &bars_topic(&bar.bar_type), bar);
    }

    fn handle_delta(&mut self, delta: &OrderBookDelta) {
        msgbus::publish(&self.msgbus, &book_topic(&delta.instrument_id), delta);
    }

    /// Starts internal bar aggregation for the given `bar_type`.
    ///
    /// Completed bars are cached and published on `data.bars.{bar_type}`.
    /// Time-aggregated bars register a clock timer named after the bar type.
    ///
    /// # Errors
    ///
    /// Returns an error if the instrument is unknown, the bar type is not
    /// internally aggregated, or the timer registration fails.
    pub fn start_bar_aggregation(&mut self, bar_type: BarType) -> anyhow::Result<()> {
        if bar_type.aggregation_source != AggregationSource::Internal {
            anyhow::bail!("Cannot aggregate externally aggregated bar type {bar_type}");
        }
        if self.bar_aggregators.contains_key(&bar_type) {
            log::warn!("Bar aggregation already started for {bar_type}");
            return Ok(());
        }
        let size_precision = {
            let cache = self.cache.borrow();
            let instrument = cache.instrument(&bar_type.instrument_id).ok_or_else(|| {
                anyhow::anyhow!("No instrument for {}", bar_type.instrument_id)
            })?;
            instrument.size_precision()
        };

        let msgbus = self.msgbus.clone();
        let cache = self.cache.clone();
        let handler = Box::new(move |bar: Bar| {
            cache.borrow_mut().add_bar(bar);
            msgbus::publish(&msgbus, &bars_topic(&bar.bar_type), &bar);
        });

        let include_late_ticks = self.config.include_late_ticks;
        let aggregator: Rc<RefCell<dyn BarAggregator>> = if bar_type.spec.is_time_aggregated() {
            let aggregator = Rc::new(RefCell::new(TimeBarAggregator::new(
                bar_type,
                size_precision,
                handler,
                include_late_ticks,
            )));
            self.register_time_bar_timer(&aggregator)?;
            aggregator
        } else {
            match bar_type.spec.aggregation {
                meridian_model::enums::BarAggregation::Tick => Rc::new(RefCell::new(
                    TickBarAggregator::new(bar_type, size_precision, handler, include_late_ticks),
                )),
                meridian_model::enums::BarAggregation::Volume => Rc::new(RefCell::new(
                    VolumeBarAggregator::new(bar_type, size_precision, handler, include_late_ticks),
                )),
                meridian_model::enums::BarAggregation::Value => Rc::new(RefCell::new(
                    ValueBarAggregator::new(bar_type, size_precision, handler, include_late_ticks),
                )),
                _ => unreachable!("time aggregations handled above"),
            }
        };

        log::info!("Started bar aggregation for {bar_type}");
        self.bar_aggregators.insert(bar_type, aggregator);
        Ok(())
    }

    /// Stops internal bar aggregation for the given `bar_type`.
    pub fn stop_bar_aggregation(&mut self, bar_type: &BarType) {
        if let Some(aggregator) = self.bar_aggregators.shift_remove(bar_type) {
            if bar_type.spec.is_time_aggregated() {
                let timer_name = format!("{bar_type}");
                self.clock.borrow_mut().cancel_timer(&timer_name);
            }
            drop(aggregator);
            log::info!("Stopped bar aggregation for {bar_type}");
        }
    }

    fn register_time_bar_timer(
        &mut self,
        aggregator: &Rc<RefCell<TimeBarAggregator>>,
    ) -> anyhow::Result<()> {
        let timer_name = aggregator.borrow().timer_name();
        let interval_ns = aggregator.borrow().interval_ns();
        let aggregator_ref = aggregator.clone();
        let start_time_ns = {
            let clock = self.clock.borrow();
            let now = clock.timestamp_ns();
            // Align the first window close to the interval boundary
            UnixNanos::from(now.as_u64() - (now.as_u64() % interval_ns))
        };

        self.clock.borrow_mut().set_timer_ns(
            &timer_name,
            interval_ns,
            Some(start_time_ns),
            None,
            meridian_common::timer::TimeEventCallback::from(move |event: TimeEvent| {
                aggregator_ref.borrow_mut().build_now(event.ts_event);
            }),
        )?;
        Ok(())
    }

    /// Resets the engine, dropping all aggregators.
    pub fn reset(&mut self) {
        let bar_types: Vec<BarType> = self.bar_aggregators.keys().copied().collect();
        for bar_type in bar_types {
            self.stop_bar_aggregation(&bar_type);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use meridian_common::{
        clock::TestClock,
        msgbus::{MessageBus, handler::TypedMessageHandler},
    };
    use meridian_model::{
        data::BarSpecification,
        enums::{BarAggregation, PriceType},
        identifiers::InstrumentId,
        stubs::{audusd_sim, instrument_any, quote_tick},
    };
    use rstest::rstest;

    use super::*;

    struct TestHarness {
        clock: Rc<RefCell<TestClock>>,
        cache: Rc<RefCell<Cache>>,
        msgbus: Rc<RefCell<MessageBus>>,
        engine: DataEngine,
    }

    fn harness() -> TestHarness {
        let clock = Rc::new(RefCell::new(TestClock::new()));
        let cache = Rc::new(RefCell::new(Cache::default()));
        let msgbus = MessageBus::default().into_shared();
        let engine = DataEngine::new(
            clock.clone(),
            cache.clone(),
            msgbus.clone(),
            Some(DataEngineConfig {
                include_late_ticks: true,
            }),
        );
        TestHarness {
            clock,
            cache,
            msgbus,
            engine,
        }
    }

    #[rstest]
    fn test_process_quote_updates_cache_and_publishes() {
        let mut harness = harness();
        let received = Rc::new(RefCell::new(Vec::new()));
        let received_clone = received.clone();
        harness.msgbus.borrow_mut().subscribe(
            "data.quotes.AUD/USD.SIM",
            meridian_common::msgbus::handler::ShareableMessageHandler(Rc::new(
                TypedMessageHandler::from(move |quote: &QuoteTick| {
                    received_clone.borrow_mut().push(*quote);
                }),
            )),
            None,
        );

        let quote = quote_tick(InstrumentId::from("AUD/USD.SIM"), "0.75000", "0.75005", 1);
        harness.engine.process(&Data::Quote(quote));

        assert_eq!(received.borrow().len(), 1);
        assert!(
            harness
                .cache
                .borrow()
                .quote(&InstrumentId::from("AUD/USD.SIM"))
                .is_some()
        );
    }

    #[rstest]
    fn test_tick_bar_aggregation_publishes_bars() {
        let mut harness = harness();
        harness
            .engine
            .process_instrument(instrument_any(audusd_sim()))
            .unwrap();

        let bar_type = BarType::new(
            InstrumentId::from("AUD/USD.SIM"),
            BarSpecification::new(2, BarAggregation::Tick, PriceType::Mid),
            AggregationSource::Internal,
        );
        harness.engine.start_bar_aggregation(bar_type).unwrap();

        let received = Rc::new(RefCell::new(Vec::new()));
        let received_clone = received.clone();
        harness.msgbus.borrow_mut().subscribe(
            format!("data.bars.{bar_type}"),
            meridian_common::msgbus::handler::ShareableMessageHandler(Rc::new(
                TypedMessageHandler::from(move |bar: &Bar| {
                    received_clone.borrow_mut().push(*bar);
                }),
            )),
            None,
        );

        for i in 1..=4_u64 {
            let quote =
                quote_tick(InstrumentId::from("AUD/USD.SIM"), "0.75000", "0.75010", i);
            harness.engine.process(&Data::Quote(quote));
        }

        assert_eq!(received.borrow().len(), 2);
        assert!(harness.cache.borrow().bar(&bar_type).is_some());
    }

    #[rstest]
    fn test_time_bar_aggregation_fires_on_timer() {
        let mut harness = harness();
        harness
            .engine
            .process_instrument(instrument_any(audusd_sim()))
            .unwrap();

        let bar_type = BarType::new(
            InstrumentId::from("AUD/USD.SIM"),
            BarSpecification::new(1, BarAggregation::Minute, PriceType::Mid),
            AggregationSource::Internal,
        );
        harness.engine.start_bar_aggregation(bar_type).unwrap();
        assert_eq!(harness.clock.borrow().timer_count(), 1);

        let quote = quote_tick(InstrumentId::from("AUD/USD.SIM"), "0.75000", "0.75010", 1);
        harness.engine.process(&Data::Quote(quote));

        // Advance through the window close and run the fired timer handlers
        let events = harness
            .clock
            .borrow_mut()
            .advance_time(UnixNanos::from(60_000_000_000));
        let handlers = harness.clock.borrow().match_handlers(events);
        for handler in handlers {
            handler.run();
        }

        assert!(harness.cache.borrow().bar(&bar_type).is_some());
    }

    #[rstest]
    fn test_stop_bar_aggregation_cancels_timer() {
        let mut harness = harness();
        harness
            .engine
            .process_instrument(instrument_any(audusd_sim()))
            .unwrap();

        let bar_type = BarType::new(
            InstrumentId::from("AUD/USD.SIM"),
            BarSpecification::new(1, BarAggregation::Minute, PriceType::Mid),
            AggregationSource::Internal,
        );
        harness.engine.start_bar_aggregation(bar_type).unwrap();
        harness.engine.stop_bar_aggregation(&bar_type);

        assert_eq!(harness.clock.borrow().timer_count(), 0);
        assert!(harness.engine.registered_bar_types().is_empty());
    }
}
