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

//! A `SimulatedExchange` venue for backtesting on historical data.
//!
//! Holds per-instrument matching engines over the market derived from
//! incoming data. Trading commands are queued and processed atomically at the
//! exchange's next step, keeping the event cascade deterministic.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use meridian_common::{
    cache::Cache,
    clock::Clock,
    msgbus::MessageBus,
};
use meridian_core::{
    UnixNanos,
    correctness::{FAILED, check_equal},
};
use meridian_execution::{
    client::ExecutionClient,
    matching_engine::{OrderMatchingEngine, OrderMatchingEngineConfig},
    messages::TradingCommand,
    models::{FeeModelAny, FillModel},
};
use meridian_model::{
    accounts::Account,
    data::Data,
    enums::{AccountType, OmsType},
    identifiers::{InstrumentId, Venue},
    instruments::{Instrument, InstrumentAny},
    position::Position,
    types::{AccountBalance, Currency, Money, Price},
};

use crate::{execution_client::BacktestExecutionClient, modules::SimulationModule};

/// A simulated exchange venue matching orders against historical data.
pub struct SimulatedExchange {
    /// The venue ID for the exchange.
    pub id: Venue,
    /// The order management system (OMS) type for the venue.
    pub oms_type: OmsType,
    /// The account type for the venue.
    pub account_type: AccountType,
    /// The single-currency account base currency, if constrained.
    pub base_currency: Option<Currency>,
    starting_balances: Vec<Money>,
    fill_model: FillModel,
    fee_model: FeeModelAny,
    config: OrderMatchingEngineConfig,
    instruments: HashMap<InstrumentId, InstrumentAny>,
    matching_engines: HashMap<InstrumentId, OrderMatchingEngine>,
    modules: Vec<Box<dyn SimulationModule>>,
    clock: Rc<RefCell<dyn Clock>>,
    cache: Rc<RefCell<Cache>>,
    msgbus: Rc<RefCell<MessageBus>>,
    exec_client: Option<Rc<BacktestExecutionClient>>,
    message_queue: Rc<RefCell<VecDeque<TradingCommand>>>,
}

impl SimulatedExchange {
    /// Creates a new [`SimulatedExchange`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if no starting balances are provided, or a base
    /// currency is given with multiple starting balances.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        venue: Venue,
        oms_type: OmsType,
        account_type: AccountType,
        starting_balances: Vec<Money>,
        base_currency: Option<Currency>,
        modules: Vec<Box<dyn SimulationModule>>,
        cache: Rc<RefCell<Cache>>,
        clock: Rc<RefCell<dyn Clock>>,
        msgbus: Rc<RefCell<MessageBus>>,
        fill_model: FillModel,
        fee_model: FeeModelAny,
        config: OrderMatchingEngineConfig,
    ) -> anyhow::Result<Self> {
        if starting_balances.is_empty() {
            anyhow::bail!("Starting balances must be provided")
        }
        if base_currency.is_some() && starting_balances.len() > 1 {
            anyhow::bail!("A single-currency account has multiple starting currencies")
        }
        for module in &modules {
            log::info!("Loaded simulation module {}", module.name());
        }
        Ok(Self {
            id: venue,
            oms_type,
            account_type,
            base_currency,
            starting_balances,
            fill_model,
            fee_model,
            config,
            instruments: HashMap::new(),
            matching_engines: HashMap::new(),
            modules,
            clock,
            cache,
            msgbus,
            exec_client: None,
            message_queue: Rc::new(RefCell::new(VecDeque::new())),
        })
    }

    /// Returns the shared command queue drained at the exchange's next step.
    #[must_use]
    pub fn message_queue(&self) -> Rc<RefCell<VecDeque<TradingCommand>>> {
        self.message_queue.clone()
    }

    /// Registers the execution client fronting this exchange.
    pub fn register_client(&mut self, client: Rc<BacktestExecutionClient>) {
        check_equal(client.venue(), self.id, "client venue", "exchange venue").expect(FAILED);
        log::info!("Registered execution client {}", client.client_id());
        self.exec_client = Some(client);
    }

    /// Adds the given `instrument`, creating its matching engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the instrument venue differs from the exchange, or
    /// the cache write-through fails.
    pub fn add_instrument(&mut self, instrument: InstrumentAny) -> anyhow::Result<()> {
        check_equal(
            instrument.id().venue,
            self.id,
            "venue of instrument id",
            "venue of simulated exchange",
        )?;

        self.cache.borrow_mut().add_instrument(instrument)?;
        self.instruments.insert(instrument.id(), instrument);

        let matching_engine = OrderMatchingEngine::new(
            instrument,
            self.instruments.len() as u32,
            self.fill_model.clone(),
            self.fee_model.clone(),
            self.oms_type,
            self.account_type,
            self.clock.clone(),
            self.msgbus.clone(),
            self.config,
        );
        self.matching_engines
            .insert(instrument.id(), matching_engine);

        log::info!(
            "Added instrument {} and created matching engine",
            instrument.id()
        );
        Ok(())
    }

    /// Sets the fill model across all matching engines.
    pub fn set_fill_model(&mut self, fill_model: FillModel) {
        for matching_engine in self.matching_engines.values_mut() {
            matching_engine.set_fill_model(fill_model.clone());
        }
        self.fill_model = fill_model;
    }

    /// Returns the best bid price for the given instrument, if any.
    #[must_use]
    pub fn best_bid_price(&self, instrument_id: InstrumentId) -> Option<Price> {
        self.matching_engines
            .get(&instrument_id)
            .and_then(OrderMatchingEngine::best_bid_price)
    }

    /// Returns the best ask price for the given instrument, if any.
    #[must_use]
    pub fn best_ask_price(&self, instrument_id: InstrumentId) -> Option<Price> {
        self.matching_engines
            .get(&instrument_id)
            .and_then(OrderMatchingEngine::best_ask_price)
    }

    /// Returns the matching engine for the given instrument, if any.
    #[must_use]
    pub fn get_matching_engine(&self, instrument_id: &InstrumentId) -> Option<&OrderMatchingEngine> {
        self.matching_engines.get(instrument_id)
    }

    /// Returns the open positions on this venue.
    #[must_use]
    pub fn open_positions(&self) -> Vec<Position> {
        self.cache
            .borrow()
            .positions_open(None, None)
            .into_iter()
            .filter(|position| position.instrument_id.venue == self.id)
            .cloned()
            .collect()
    }

    /// Generates the initial account state from the starting balances.
    pub fn initialize_account(&mut self) {
        self.generate_fresh_account_state();
    }

    /// Processes the given market `data` through the venue.
    pub fn process_data(&mut self, data: &Data) {
        let mut modules = std::mem::take(&mut self.modules);
        for module in &mut modules {
            module.pre_process(data);
        }
        self.modules = modules;

        let instrument_id = data.instrument_id();
        let Some(matching_engine) = self.matching_engines.get_mut(&instrument_id) else {
            panic!("No matching engine for instrument {instrument_id}");
        };
        match data {
            Data::Quote(quote) => matching_engine.process_quote_tick(quote),
            Data::Trade(trade) => matching_engine.process_trade_tick(trade),
            Data::Bar(bar) => matching_engine.process_bar(bar),
            Data::Delta(delta) => matching_engine.process_order_book_delta(delta),
        }
    }

    /// Processes the exchange one step at `ts_now`: drains queued trading
    /// commands into the matching engines and runs the simulation modules.
    pub fn process(&mut self, ts_now: UnixNanos) {
        // Commands queued during processing drain in the same step
        loop {
            let command = self.message_queue.borrow_mut().pop_front();
            let Some(command) = command else { break };
            self.process_trading_command(command);
        }

        let mut modules = std::mem::take(&mut self.modules);
        for module in &mut modules {
            module.process(self, ts_now);
        }
        self.modules = modules;
    }

    fn process_trading_command(&mut self, command: TradingCommand) {
        let account_id = self
            .exec_client
            .as_ref()
            .map(|client| client.account_id())
            .expect("Execution client should be registered");

        let Some(matching_engine) = self.matching_engines.get_mut(&command.instrument_id())
        else {
            panic!(
                "No matching engine for instrument {}",
                command.instrument_id()
            );
        };
        match command {
            TradingCommand::SubmitOrder(mut command) => {
                matching_engine.process_order(&mut command.order, account_id);
            }
            TradingCommand::ModifyOrder(ref command) => {
                matching_engine.process_modify(command, account_id);
            }
            TradingCommand::CancelOrder(ref command) => {
                matching_engine.process_cancel(command, account_id);
            }
        }
    }

    /// Adjusts the venue account by the given `adjustment`, publishing the
    /// resulting account state.
    pub fn adjust_account(&mut self, adjustment: Money) {
        let Some(exec_client) = &self.exec_client else {
            log::error!("Cannot adjust account: no execution client registered");
            return;
        };
        let account = self.cache.borrow().account_for_venue(&self.id).cloned();
        let Some(account) = account else {
            log::error!("Cannot adjust account: no account for venue {}", self.id);
            return;
        };

        match account.balance(Some(adjustment.currency)) {
            Some(balance) => {
                let new_balance = AccountBalance::new(
                    balance.total + adjustment,
                    balance.locked,
                    balance.free + adjustment,
                );
                let mut balances: Vec<AccountBalance> = account
                    .balances()
                    .into_values()
                    .map(|existing| {
                        if existing.currency == adjustment.currency {
                            new_balance
                        } else {
                            existing
                        }
                    })
                    .collect();
                balances.sort_by_key(|balance| balance.currency.code);
                exec_client
                    .generate_account_state(
                        balances,
                        vec![],
                        false,
                        self.clock.borrow().timestamp_ns(),
                    )
                    .expect("Account state generation");
            }
            None => log::error!(
                "Cannot adjust account: no balance for currency {}",
                adjustment.currency
            ),
        }
    }

    /// Generates a fresh account state from the starting balances.
    pub fn generate_fresh_account_state(&self) {
        let balances: Vec<AccountBalance> = self
            .starting_balances
            .iter()
            .map(|money| AccountBalance::new(*money, Money::zero(money.currency), *money))
            .collect();

        if let Some(exec_client) = &self.exec_client {
            exec_client
                .generate_account_state(
                    balances,
                    vec![],
                    true,
                    self.clock.borrow().timestamp_ns(),
                )
                .expect("Account state generation");
        }
    }

    /// Resets the exchange: modules, matching engines, and the account state.
    pub fn reset(&mut self) {
        for module in &mut self.modules {
            module.reset();
        }
        for matching_engine in self.matching_engines.values_mut() {
            matching_engine.reset();
        }
        self.message_queue.borrow_mut().clear();
        self.generate_fresh_account_state();
        log::info!("Reset exchange {}", self.id);
    }
}
