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

//! The execution client fronting a `SimulatedExchange`.
//!
//! Commands are enqueued for the exchange to process atomically at its next
//! step; fills are applied to the venue account and published as
//! `AccountState` events.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use ahash::AHashMap;
use meridian_common::{
    cache::Cache,
    clock::Clock,
    msgbus::{self, MessageBus},
    xrate::{build_rate_map, get_exchange_rate},
};
use meridian_core::{UUID4, UnixNanos};
use meridian_execution::{
    client::ExecutionClient,
    messages::{CancelOrder, ModifyOrder, SubmitOrder, TradingCommand},
};
use meridian_model::{
    accounts::{Account, AccountAny},
    enums::AccountType,
    events::{AccountState, OrderFilled},
    identifiers::{AccountId, ClientId, TraderId, Venue},
    types::{AccountBalance, Currency, MarginBalance, Money},
};
use ustr::Ustr;

/// Returns the bus topic for account events of the given account.
#[must_use]
pub fn account_events_topic(account_id: AccountId) -> Ustr {
    Ustr::from(&format!("events.account.{account_id}"))
}

/// The execution client fronting a `SimulatedExchange`.
pub struct BacktestExecutionClient {
    trader_id: TraderId,
    account_id: AccountId,
    venue: Venue,
    account_type: AccountType,
    base_currency: Option<Currency>,
    clock: Rc<RefCell<dyn Clock>>,
    cache: Rc<RefCell<Cache>>,
    msgbus: Rc<RefCell<MessageBus>>,
    queue: Rc<RefCell<VecDeque<TradingCommand>>>,
    is_connected: Cell<bool>,
}

impl BacktestExecutionClient {
    /// Creates a new [`BacktestExecutionClient`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        trader_id: TraderId,
        venue: Venue,
        account_type: AccountType,
        base_currency: Option<Currency>,
        clock: Rc<RefCell<dyn Clock>>,
        cache: Rc<RefCell<Cache>>,
        msgbus: Rc<RefCell<MessageBus>>,
        queue: Rc<RefCell<VecDeque<TradingCommand>>>,
    ) -> Self {
        Self {
            trader_id,
            account_id: AccountId::new(format!("{venue}-001")),
            venue,
            account_type,
            base_currency,
            clock,
            cache,
            msgbus,
            queue,
            is_connected: Cell::new(false),
        }
    }

    /// Returns the trader ID for the client.
    #[must_use]
    pub const fn trader_id(&self) -> TraderId {
        self.trader_id
    }

    /// Applies the given `fill` to the venue account and publishes the
    /// resulting `AccountState`.
    ///
    /// Balance legs in currencies other than the account base currency (for
    /// single-currency accounts) convert through cross rates drawn from the
    /// latest quotes.
    pub fn apply_fill(&self, fill: &OrderFilled) {
        let account = match self.cache.borrow().account(&fill.account_id).cloned() {
            Some(account) => account,
            None => {
                log::error!("No account {} in cache for fill", fill.account_id);
                return;
            }
        };
        let instrument = match self.cache.borrow().instrument(&fill.instrument_id).copied() {
            Some(instrument) => instrument,
            None => {
                log::error!("No instrument {} in cache for fill", fill.instrument_id);
                return;
            }
        };

        let mut legs = match account.calculate_pnls(&instrument, fill, None) {
            Ok(legs) => legs,
            Err(e) => {
                log::error!("Cannot calculate fill legs: {e}");
                return;
            }
        };
        if let Some(commission) = fill.commission {
            legs.push(-commission);
        }

        // Net the legs into per-currency balance deltas, converting into the
        // base currency for single-currency accounts
        let rates = build_rate_map(&self.cache.borrow());
        let mut deltas: AHashMap<Currency, f64> = AHashMap::new();
        for leg in legs {
            let (currency, amount) = match self.base_currency {
                Some(base_currency) if leg.currency != base_currency => {
                    match get_exchange_rate(leg.currency, base_currency, &rates) {
                        Some(rate) => (base_currency, leg.as_f64() * rate),
                        None => {
                            log::error!(
                                "No exchange rate {} -> {base_currency} for account update",
                                leg.currency
                            );
                            continue;
                        }
                    }
                }
                _ => (leg.currency, leg.as_f64()),
            };
            *deltas.entry(currency).or_insert(0.0) += amount;
        }

        let mut balances = account.balances();
        for (currency, delta) in deltas {
            let (total, locked) = balances
                .get(&currency)
                .map_or((0.0, 0.0), |balance| {
                    (balance.total.as_f64(), balance.locked.as_f64())
                });
            let new_total = total + delta;
            balances.insert(
                currency,
                AccountBalance::new(
                    Money::new(new_total, currency),
                    Money::new(locked, currency),
                    Money::new(new_total - locked, currency),
                ),
            );
        }

        let margins = self.calculate_margins(&account);
        let mut balances: Vec<AccountBalance> = balances.into_values().collect();
        balances.sort_by_key(|balance| balance.currency.code);

        if let Err(e) = self.generate_account_state(balances, margins, false, fill.ts_event) {
            log::error!("Cannot generate account state: {e}");
        }
    }

    /// Recomputes maintenance margins over open venue positions (margin
    /// accounts only).
    fn calculate_margins(&self, account: &AccountAny) -> Vec<MarginBalance> {
        let AccountAny::Margin(margin_account) = account else {
            return Vec::new();
        };
        let cache = self.cache.borrow();
        let mut margins = Vec::new();
        for position in cache.positions_open(None, None) {
            if &position.instrument_id.venue != &self.venue {
                continue;
            }
            let Some(instrument) = cache.instrument(&position.instrument_id) else {
                continue;
            };
            let Some(mark) = cache.price(
                &position.instrument_id,
                meridian_model::enums::PriceType::Mid,
            ) else {
                continue;
            };
            margins.push(MarginBalance::new(
                margin_account.calculate_initial_margin(instrument, position.quantity, mark),
                margin_account.calculate_maintenance_margin(instrument, position.quantity, mark),
                position.instrument_id,
            ));
        }
        margins.sort_by_key(|margin| margin.instrument_id);
        margins
    }
}

impl ExecutionClient for BacktestExecutionClient {
    fn client_id(&self) -> ClientId {
        ClientId::new(self.venue.as_str())
    }

    fn account_id(&self) -> AccountId {
        self.account_id
    }

    fn venue(&self) -> Venue {
        self.venue
    }

    fn is_connected(&self) -> bool {
        self.is_connected.get()
    }

    fn start(&self) -> anyhow::Result<()> {
        self.is_connected.set(true);
        log::info!("Backtest execution client for {} connected", self.venue);
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.is_connected.set(false);
        log::info!("Backtest execution client for {} disconnected", self.venue);
        Ok(())
    }

    fn submit_order(&self, command: &SubmitOrder) -> anyhow::Result<()> {
        self.queue
            .borrow_mut()
            .push_back(TradingCommand::SubmitOrder(command.clone()));
        Ok(())
    }

    fn modify_order(&self, command: &ModifyOrder) -> anyhow::Result<()> {
        self.queue
            .borrow_mut()
            .push_back(TradingCommand::ModifyOrder(command.clone()));
        Ok(())
    }

    fn cancel_order(&self, command: &CancelOrder) -> anyhow::Result<()> {
        self.queue
            .borrow_mut()
            .push_back(TradingCommand::CancelOrder(command.clone()));
        Ok(())
    }

    fn generate_account_state(
        &self,
        balances: Vec<AccountBalance>,
        margins: Vec<MarginBalance>,
        reported: bool,
        ts_event: UnixNanos,
    ) -> anyhow::Result<()> {
        let event = AccountState::new(
            self.account_id,
            self.account_type,
            self.base_currency,
            balances,
            margins,
            reported,
            UUID4::new(),
            ts_event,
            self.clock.borrow().timestamp_ns(),
        );
        msgbus::publish(
            &self.msgbus,
            &account_events_topic(self.account_id),
            &event as &dyn std::any::Any,
        );
        Ok(())
    }
}
