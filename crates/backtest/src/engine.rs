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

//! The core `BacktestEngine` for backtesting on historical data.
//!
//! Wires the kernel (message bus, cache, clock, engines, portfolio), merges
//! all data streams into one monotone sequence, and drives the explicit event
//! loop: advance the clock, fire due timers, feed each data element to the
//! venue and the data engine, then settle queued trading commands.
//! Given identical inputs and seeds, two runs produce identical event
//! streams.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use indexmap::IndexMap;
use meridian_common::{
    cache::Cache,
    clock::{Clock, TestClock},
    msgbus::{MessageBus, handler::{ShareableMessageHandler, TypedMessageHandler}},
    timer::TimeEvent,
};
use meridian_core::{UUID4, UnixNanos};
use meridian_data::engine::{DataEngine, DataEngineConfig};
use meridian_execution::{
    client::ExecutionClient,
    engine::ExecutionEngine,
    strategy::{Strategy, StrategyContext},
};
use meridian_model::{
    data::{Bar, Data, QuoteTick, TradeTick},
    events::{AccountState, OrderEventAny, PositionEventAny},
    identifiers::Venue,
    instruments::{Instrument, InstrumentAny},
    types::Currency,
};
use meridian_portfolio::Portfolio;
use meridian_risk::engine::RiskEngine;

use crate::{
    config::{BacktestEngineConfig, BacktestVenueConfig},
    data_iterator::BacktestDataIterator,
    exchange::SimulatedExchange,
    execution_client::BacktestExecutionClient,
};

const SETTLE_ROUNDS_MAX: usize = 1_000;

/// An event pending dispatch to a strategy.
enum StrategyEvent {
    Quote(QuoteTick),
    Trade(TradeTick),
    Bar(Bar),
    Order(OrderEventAny),
    Position(PositionEventAny),
    Time(TimeEvent),
}

/// Dispatches bus events into a strategy, deferring events which arrive while
/// the strategy is already handling one (a strategy reacting to its own
/// submission acknowledgements would otherwise re-enter itself).
#[derive(Clone)]
struct StrategyRunner {
    strategy: Rc<RefCell<dyn Strategy>>,
    ctx: Rc<StrategyContext>,
    pending: Rc<RefCell<VecDeque<StrategyEvent>>>,
}

impl StrategyRunner {
    fn enqueue(&self, event: StrategyEvent) {
        self.pending.borrow_mut().push_back(event);
        self.pump();
    }

    fn pump(&self) {
        loop {
            let Ok(mut strategy) = self.strategy.try_borrow_mut() else {
                // Re-entrant dispatch: the outer pump drains the queue
                return;
            };
            let event = self.pending.borrow_mut().pop_front();
            let Some(event) = event else { return };
            match event {
                StrategyEvent::Quote(quote) => strategy.on_quote_tick(&self.ctx, &quote),
                StrategyEvent::Trade(trade) => strategy.on_trade_tick(&self.ctx, &trade),
                StrategyEvent::Bar(bar) => strategy.on_bar(&self.ctx, &bar),
                StrategyEvent::Order(event) => strategy.on_order_event(&self.ctx, &event),
                StrategyEvent::Position(event) => strategy.on_position_event(&self.ctx, &event),
                StrategyEvent::Time(event) => strategy.on_time_event(&self.ctx, &event),
            }
        }
    }
}

/// The core backtest engine.
pub struct BacktestEngine {
    /// The unique instance ID for the engine.
    pub instance_id: UUID4,
    config: BacktestEngineConfig,
    clock: Rc<RefCell<TestClock>>,
    msgbus: Rc<RefCell<MessageBus>>,
    cache: Rc<RefCell<Cache>>,
    data_engine: Rc<RefCell<DataEngine>>,
    exec_engine: Rc<RefCell<ExecutionEngine>>,
    risk_engine: Rc<RefCell<RiskEngine>>,
    portfolio: Rc<RefCell<Portfolio>>,
    exchanges: IndexMap<Venue, Rc<RefCell<SimulatedExchange>>>,
    strategies: Vec<StrategyRunner>,
    iterator: BacktestDataIterator,
    added_instruments: Vec<InstrumentAny>,
    data_stream_count: usize,
    iteration: usize,
    run_started: bool,
}

impl BacktestEngine {
    /// Creates a new [`BacktestEngine`] instance, wiring the kernel.
    ///
    /// # Errors
    ///
    /// Returns an error if loading persisted state from the cache database
    /// fails.
    pub fn new(config: BacktestEngineConfig) -> anyhow::Result<Self> {
        let instance_id = UUID4::new();
        let clock = Rc::new(RefCell::new(TestClock::new()));
        let msgbus = MessageBus::new(config.trader_id, instance_id, None).into_shared();

        let database = config.cache_database.clone();
        let mut cache = Cache::new(
            database.map(|db| Box::new(db) as Box<dyn meridian_common::cache::database::CacheDatabase>),
        );
        if config.cache_db_flush {
            cache.flush_db()?;
        } else {
            cache.cache_all()?;
        }
        let cache = Rc::new(RefCell::new(cache));

        let clock_dyn: Rc<RefCell<dyn Clock>> = clock.clone();
        let data_engine = Rc::new(RefCell::new(DataEngine::new(
            clock_dyn.clone(),
            cache.clone(),
            msgbus.clone(),
            Some(DataEngineConfig {
                include_late_ticks: true,
            }),
        )));
        let exec_engine = Rc::new(RefCell::new(ExecutionEngine::new(
            clock_dyn.clone(),
            cache.clone(),
        )));
        let risk_engine = Rc::new(RefCell::new(RiskEngine::new(
            config.risk.clone(),
            clock_dyn.clone(),
            cache.clone(),
        )));
        let portfolio = Rc::new(RefCell::new(Portfolio::new(cache.clone())));

        ExecutionEngine::register_endpoints(exec_engine.clone(), &msgbus);
        RiskEngine::register_endpoints(risk_engine.clone(), &msgbus);

        // Account state events feed the portfolio, which maintains the cache
        let portfolio_clone = portfolio.clone();
        let account_handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some("Portfolio.update_account"),
            move |event: &AccountState| {
                portfolio_clone
                    .borrow_mut()
                    .update_account(event)
                    .expect("Account update failed");
            },
        )));
        msgbus
            .borrow_mut()
            .subscribe("events.account.**", account_handler, Some(10));

        Ok(Self {
            instance_id,
            config,
            clock,
            msgbus,
            cache,
            data_engine,
            exec_engine,
            risk_engine,
            portfolio,
            exchanges: IndexMap::new(),
            strategies: Vec::new(),
            iterator: BacktestDataIterator::new(),
            added_instruments: Vec::new(),
            data_stream_count: 0,
            iteration: 0,
            run_started: false,
        })
    }

    /// Returns a shared handle to the cache.
    #[must_use]
    pub fn cache(&self) -> Rc<RefCell<Cache>> {
        self.cache.clone()
    }

    /// Returns a shared handle to the message bus.
    #[must_use]
    pub fn msgbus(&self) -> Rc<RefCell<MessageBus>> {
        self.msgbus.clone()
    }

    /// Returns a shared handle to the portfolio.
    #[must_use]
    pub fn portfolio(&self) -> Rc<RefCell<Portfolio>> {
        self.portfolio.clone()
    }

    /// Returns a shared handle to the risk engine.
    #[must_use]
    pub fn risk_engine(&self) -> Rc<RefCell<RiskEngine>> {
        self.risk_engine.clone()
    }

    /// Returns the exchange for the given `venue`, if added.
    #[must_use]
    pub fn exchange(&self, venue: &Venue) -> Option<Rc<RefCell<SimulatedExchange>>> {
        self.exchanges.get(venue).cloned()
    }

    /// Returns the count of data elements processed.
    #[must_use]
    pub const fn iteration(&self) -> usize {
        self.iteration
    }

    /// Adds a simulated venue per the given `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange construction fails.
    pub fn add_venue(&mut self, config: BacktestVenueConfig) -> anyhow::Result<()> {
        let venue = config.venue;
        let exchange = SimulatedExchange::new(
            venue,
            config.oms_type,
            config.account_type,
            config.starting_balances,
            config.base_currency,
            config.modules,
            self.cache.clone(),
            self.clock.clone(),
            self.msgbus.clone(),
            config.fill_model,
            config.fee_model,
            config.matching_config,
        )?;
        let queue = exchange.message_queue();
        let exchange = Rc::new(RefCell::new(exchange));

        let client = Rc::new(BacktestExecutionClient::new(
            self.config.trader_id,
            venue,
            config.account_type,
            config.base_currency,
            self.clock.clone() as Rc<RefCell<dyn Clock>>,
            self.cache.clone(),
            self.msgbus.clone(),
            queue,
        ));
        client.start()?;
        exchange.borrow_mut().register_client(client.clone());
        self.exec_engine
            .borrow_mut()
            .register_client(client.clone(), config.oms_type);

        // Fills settle against the venue account before strategies react
        let fill_client = client.clone();
        let fill_handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some(&format!("BacktestExecutionClient.{venue}.fills")),
            move |event: &OrderEventAny| {
                if let OrderEventAny::Filled(fill) = event {
                    if fill.account_id == fill_client.account_id() {
                        fill_client.apply_fill(fill);
                    }
                }
            },
        )));
        self.msgbus
            .borrow_mut()
            .subscribe("events.order.**", fill_handler, Some(10));

        exchange.borrow_mut().initialize_account();
        self.exchanges.insert(venue, exchange);
        log::info!("Added venue {venue}");
        Ok(())
    }

    /// Adds the given `instrument` to its venue's exchange and the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue has not been added, or the exchange
    /// rejects the instrument.
    pub fn add_instrument(&mut self, instrument: InstrumentAny) -> anyhow::Result<()> {
        let venue = instrument.id().venue;
        let exchange = self
            .exchanges
            .get(&venue)
            .ok_or_else(|| anyhow::anyhow!("No venue {venue} added for instrument"))?;
        exchange.borrow_mut().add_instrument(instrument)?;
        if let Some(base_currency) = instrument.base_currency() {
            self.cache.borrow_mut().add_currency(base_currency)?;
        }
        self.cache
            .borrow_mut()
            .add_currency(instrument.quote_currency())?;
        self.added_instruments.push(instrument);
        Ok(())
    }

    /// Adds a stream of market data (sorted and merged on `ts_init`).
    pub fn add_data(&mut self, data: Vec<Data>) {
        self.data_stream_count += 1;
        let name = format!("data-{:03}", self.data_stream_count);
        log::info!("Added {} element(s) as stream '{name}'", data.len());
        self.iterator.add_data(&name, data);
    }

    /// Adds the given `strategy`, wiring its bus subscriptions.
    pub fn add_strategy(&mut self, strategy: Rc<RefCell<dyn Strategy>>) {
        let strategy_id = strategy.borrow().strategy_id();
        let ctx = Rc::new(StrategyContext::new(
            self.config.trader_id,
            strategy_id,
            self.clock.clone() as Rc<RefCell<dyn Clock>>,
            self.cache.clone(),
            self.msgbus.clone(),
        ));
        let runner = StrategyRunner {
            strategy,
            ctx,
            pending: Rc::new(RefCell::new(VecDeque::new())),
        };

        let mut msgbus = self.msgbus.borrow_mut();
        let quote_runner = runner.clone();
        msgbus.subscribe(
            "data.quotes.**",
            ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
                Some(&format!("{strategy_id}.quotes")),
                move |quote: &QuoteTick| quote_runner.enqueue(StrategyEvent::Quote(*quote)),
            ))),
            None,
        );
        let trade_runner = runner.clone();
        msgbus.subscribe(
            "data.trades.**",
            ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
                Some(&format!("{strategy_id}.trades")),
                move |trade: &TradeTick| trade_runner.enqueue(StrategyEvent::Trade(*trade)),
            ))),
            None,
        );
        let bar_runner = runner.clone();
        msgbus.subscribe(
            "data.bars.**",
            ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
                Some(&format!("{strategy_id}.bars")),
                move |bar: &Bar| bar_runner.enqueue(StrategyEvent::Bar(*bar)),
            ))),
            None,
        );
        let order_runner = runner.clone();
        msgbus.subscribe(
            format!("events.order.{strategy_id}.**"),
            ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
                Some(&format!("{strategy_id}.orders")),
                move |event: &OrderEventAny| order_runner.enqueue(StrategyEvent::Order(*event)),
            ))),
            None,
        );
        let position_runner = runner.clone();
        msgbus.subscribe(
            format!("events.position.{strategy_id}.**"),
            ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
                Some(&format!("{strategy_id}.positions")),
                move |event: &PositionEventAny| {
                    position_runner.enqueue(StrategyEvent::Position(*event));
                },
            ))),
            None,
        );
        drop(msgbus);

        log::info!("Added strategy {strategy_id}");
        self.strategies.push(runner);
    }

    /// Runs the backtest, advancing the clock through the merged data streams
    /// within the optional `[start, stop]` window.
    pub fn run(&mut self, start: Option<UnixNanos>, stop: Option<UnixNanos>) {
        if !self.run_started {
            for runner in &self.strategies {
                let strategy_id = runner.ctx.strategy_id;
                let state = self
                    .cache
                    .borrow()
                    .get_prefixed(&format!("{strategy_id}:"));
                if !state.is_empty() {
                    runner.strategy.borrow_mut().on_load(state);
                }
                runner.strategy.borrow_mut().on_start(&runner.ctx);
                runner.pump();
            }
            self.run_started = true;
        }

        while let Some(ts) = self.iterator.peek_ts() {
            // Data beyond the stop window stays in the iterator for the next run
            if stop.is_some_and(|stop| ts > stop) {
                break;
            }
            let data = self.iterator.next().expect("peeked element");
            if start.is_some_and(|start| ts < start) {
                continue;
            }

            self.advance_time(ts);

            // The venue sees the data first so that strategies react to a
            // market which has already been matched against
            let venue = data.instrument_id().venue;
            if let Some(exchange) = self.exchanges.get(&venue) {
                exchange.borrow_mut().process_data(&data);
            }
            self.data_engine.borrow_mut().process(&data);

            self.settle_exchanges(ts);
            self.iteration += 1;
        }

        for runner in &self.strategies {
            runner.strategy.borrow_mut().on_stop(&runner.ctx);
            runner.pump();
            // Persist the strategy's user state
            let strategy_id = runner.ctx.strategy_id;
            let state = runner.strategy.borrow().on_save();
            for (key, value) in state {
                if let Err(e) = self
                    .cache
                    .borrow_mut()
                    .add(&format!("{strategy_id}:{key}"), value)
                {
                    log::error!("Cannot persist strategy state: {e}");
                }
            }
        }
        self.cache.borrow().check_residuals();
    }

    fn advance_time(&mut self, ts: UnixNanos) {
        let events = self.clock.borrow_mut().advance_time(ts);
        if events.is_empty() {
            return;
        }
        let handlers = self.clock.borrow().match_handlers(events);
        for handler in handlers {
            let event = handler.event.clone();
            handler.run();
            // Strategy-namespaced timers route back to their strategy
            for runner in &self.strategies {
                let prefix = format!("{}:", runner.ctx.strategy_id);
                if event.name.starts_with(&prefix) {
                    runner.enqueue(StrategyEvent::Time(event.clone()));
                }
            }
        }
    }

    /// Drains queued trading commands into the exchanges until quiescent.
    fn settle_exchanges(&mut self, ts: UnixNanos) {
        for _ in 0..SETTLE_ROUNDS_MAX {
            let mut any_pending = false;
            for exchange in self.exchanges.values() {
                exchange.borrow_mut().process(ts);
            }
            for exchange in self.exchanges.values() {
                if !exchange.borrow().message_queue().borrow().is_empty() {
                    any_pending = true;
                }
            }
            if !any_pending {
                return;
            }
        }
        log::error!("Exchange settlement did not converge after {SETTLE_ROUNDS_MAX} rounds");
    }

    /// Resets the engine to its initial state, retaining added venues,
    /// instruments, strategies, and data.
    ///
    /// # Errors
    ///
    /// Returns an error on a cache failure.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        log::info!("Resetting backtest engine");
        self.iterator.reset();
        self.clock.borrow_mut().reset();
        self.cache.borrow_mut().reset();
        self.exec_engine.borrow_mut().reset();
        self.risk_engine.borrow_mut().reset();
        self.data_engine.borrow_mut().reset();

        // Instruments and their currencies are retained across resets
        for instrument in self.added_instruments.clone() {
            if let Some(base_currency) = instrument.base_currency() {
                self.cache.borrow_mut().add_currency(base_currency)?;
            }
            self.cache
                .borrow_mut()
                .add_currency(instrument.quote_currency())?;
            self.cache.borrow_mut().add_instrument(instrument)?;
        }
        for exchange in self.exchanges.values() {
            exchange.borrow_mut().reset();
        }
        for runner in &self.strategies {
            runner.strategy.borrow_mut().on_reset();
        }
        self.iteration = 0;
        self.run_started = false;
        Ok(())
    }

    /// Disposes the engine, releasing the cache database connection.
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn dispose(&mut self) -> anyhow::Result<()> {
        self.cache.borrow_mut().dispose()
    }

    /// Returns the base currency registered for the given venue, if any.
    #[must_use]
    pub fn venue_base_currency(&self, venue: &Venue) -> Option<Currency> {
        self.exchanges
            .get(venue)
            .and_then(|exchange| exchange.borrow().base_currency)
    }
}
