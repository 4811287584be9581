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

//! The in-memory authoritative snapshot of market and execution state.
//!
//! Every mutation is written through to the configured [`CacheDatabase`].
//! The cache is the only shared mutable state in the kernel and is touched
//! only via the owning engines.

pub mod database;

mod index;

use std::collections::{HashMap, VecDeque};

use ahash::AHashSet;
use anyhow::Result;
use bytes::Bytes;
use database::CacheDatabase;
use index::CacheIndex;
use meridian_model::{
    accounts::{Account, AccountAny},
    data::{Bar, BarType, QuoteTick, TradeTick},
    enums::PriceType,
    identifiers::{
        AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, Venue, VenueOrderId,
    },
    instruments::{Instrument, InstrumentAny},
    orders::{Order, OrderAny},
    position::Position,
    types::{Currency, Price},
};
use ustr::Ustr;

const TICK_CAPACITY: usize = 10_000;
const BAR_CAPACITY: usize = 10_000;

/// The in-memory authoritative snapshot of market and execution state.
pub struct Cache {
    index: CacheIndex,
    database: Option<Box<dyn CacheDatabase>>,
    general: HashMap<String, Bytes>,
    currencies: HashMap<Ustr, Currency>,
    instruments: HashMap<InstrumentId, InstrumentAny>,
    accounts: HashMap<AccountId, AccountAny>,
    orders: HashMap<ClientOrderId, OrderAny>,
    positions: HashMap<PositionId, Position>,
    quotes: HashMap<InstrumentId, VecDeque<QuoteTick>>,
    trades: HashMap<InstrumentId, VecDeque<TradeTick>>,
    bars: HashMap<BarType, VecDeque<Bar>>,
}

impl Default for Cache {
    /// Creates a new default [`Cache`] instance with no backing database.
    fn default() -> Self {
        Self::new(None)
    }
}

impl Cache {
    /// Creates a new [`Cache`] instance.
    #[must_use]
    pub fn new(database: Option<Box<dyn CacheDatabase>>) -> Self {
        Self {
            index: CacheIndex::default(),
            database,
            general: HashMap::new(),
            currencies: HashMap::new(),
            instruments: HashMap::new(),
            accounts: HashMap::new(),
            orders: HashMap::new(),
            positions: HashMap::new(),
            quotes: HashMap::new(),
            trades: HashMap::new(),
            bars: HashMap::new(),
        }
    }

    // -- LOADING ---------------------------------------------------------------------------------

    /// Clears and reloads all persisted state from the backing database, then
    /// rebuilds the index.
    ///
    /// # Errors
    ///
    /// Returns an error if any load fails.
    pub fn cache_all(&mut self) -> Result<()> {
        if let Some(database) = &self.database {
            self.currencies = database.load_currencies()?.into_iter().collect();
            self.instruments = database.load_instruments()?.into_iter().collect();
            self.accounts = database.load_accounts()?.into_iter().collect();
            self.orders = database.load_orders()?.into_iter().collect();
            self.positions = database.load_positions()?.into_iter().collect();
            self.general = database.load()?.into_iter().collect();
            log::info!(
                "Cached {} currencies, {} instruments, {} accounts, {} orders, {} positions from database",
                self.currencies.len(),
                self.instruments.len(),
                self.accounts.len(),
                self.orders.len(),
                self.positions.len(),
            );
        }
        self.build_index();
        Ok(())
    }

    /// Clears the current index and rebuilds it from the primary maps.
    pub fn build_index(&mut self) {
        log::debug!("Building index");
        self.index.clear();

        for (account_id, _) in self.accounts.iter() {
            self.index
                .venue_account
                .insert(account_id.get_issuer(), *account_id);
        }

        for (client_order_id, order) in &self.orders {
            let instrument_id = order.instrument_id();
            let strategy_id = order.strategy_id();

            self.index
                .venue_orders
                .entry(instrument_id.venue)
                .or_default()
                .insert(*client_order_id);
            if let Some(venue_order_id) = order.venue_order_id() {
                self.index
                    .venue_order_ids
                    .insert(venue_order_id, *client_order_id);
            }
            if let Some(position_id) = order.position_id() {
                self.index
                    .order_position
                    .insert(*client_order_id, position_id);
            }
            self.index
                .order_strategy
                .insert(*client_order_id, strategy_id);
            self.index
                .instrument_orders
                .entry(instrument_id)
                .or_default()
                .insert(*client_order_id);
            self.index
                .strategy_orders
                .entry(strategy_id)
                .or_default()
                .insert(*client_order_id);
            self.index.orders.insert(*client_order_id);
            if order.is_open() {
                self.index.orders_open.insert(*client_order_id);
            }
            if order.is_closed() {
                self.index.orders_closed.insert(*client_order_id);
            }
            if order.is_inflight() {
                self.index.orders_inflight.insert(*client_order_id);
            }
            self.index.strategies.insert(strategy_id);
        }

        for (position_id, position) in &self.positions {
            self.index
                .position_strategy
                .insert(*position_id, position.strategy_id);
            self.index
                .position_orders
                .entry(*position_id)
                .or_default()
                .extend(position.client_order_ids());
            self.index
                .instrument_positions
                .entry(position.instrument_id)
                .or_default()
                .insert(*position_id);
            self.index
                .strategy_positions
                .entry(position.strategy_id)
                .or_default()
                .insert(*position_id);
            self.index.positions.insert(*position_id);
            if position.is_open() {
                self.index.positions_open.insert(*position_id);
            }
            if position.is_closed() {
                self.index.positions_closed.insert(*position_id);
            }
            self.index.strategies.insert(position.strategy_id);
        }
    }

    // -- COMMANDS --------------------------------------------------------------------------------

    /// Adds the given `currency` to the cache (write-through).
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn add_currency(&mut self, currency: Currency) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.add_currency(&currency)?;
        }
        log::debug!("Added currency {}", currency.code);
        self.currencies.insert(currency.code, currency);
        Ok(())
    }

    /// Adds the given `instrument` to the cache (write-through).
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn add_instrument(&mut self, instrument: InstrumentAny) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.add_instrument(&instrument)?;
        }
        log::debug!("Added instrument {}", instrument.id());
        self.instruments.insert(instrument.id(), instrument);
        Ok(())
    }

    /// Adds the given `account` to the cache (write-through).
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn add_account(&mut self, account: AccountAny) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.add_account(&account)?;
        }
        let account_id = account.id();
        log::debug!("Added account {account_id}");
        self.index
            .venue_account
            .insert(account_id.get_issuer(), account_id);
        self.accounts.insert(account_id, account);
        Ok(())
    }

    /// Updates the given `account` in the cache (write-through).
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn update_account(&mut self, account: AccountAny) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.update_account(&account)?;
        }
        self.accounts.insert(account.id(), account);
        Ok(())
    }

    /// Adds the given `order` to the cache (write-through), indexing it under
    /// its instrument, strategy, and optional position.
    ///
    /// # Errors
    ///
    /// Returns an error if the client order ID is already cached, or on a
    /// database failure.
    pub fn add_order(&mut self, order: OrderAny, position_id: Option<PositionId>) -> Result<()> {
        let client_order_id = order.client_order_id();
        if self.orders.contains_key(&client_order_id) {
            anyhow::bail!("Order {client_order_id} already in cache");
        }
        if let Some(database) = &mut self.database {
            database.add_order(&order)?;
        }

        let instrument_id = order.instrument_id();
        let strategy_id = order.strategy_id();
        self.index
            .venue_orders
            .entry(instrument_id.venue)
            .or_default()
            .insert(client_order_id);
        self.index
            .order_strategy
            .insert(client_order_id, strategy_id);
        self.index
            .instrument_orders
            .entry(instrument_id)
            .or_default()
            .insert(client_order_id);
        self.index
            .strategy_orders
            .entry(strategy_id)
            .or_default()
            .insert(client_order_id);
        self.index.orders.insert(client_order_id);
        self.index.strategies.insert(strategy_id);
        if let Some(position_id) = position_id {
            self.add_position_id(&position_id, &client_order_id);
        }

        log::debug!("Added order {client_order_id}");
        self.orders.insert(client_order_id, order);
        Ok(())
    }

    /// Indexes the given position ID against the client order ID.
    pub fn add_position_id(&mut self, position_id: &PositionId, client_order_id: &ClientOrderId) {
        self.index
            .order_position
            .insert(*client_order_id, *position_id);
        self.index
            .position_orders
            .entry(*position_id)
            .or_default()
            .insert(*client_order_id);
    }

    /// Updates the given `order` in the cache (write-through), refreshing the
    /// open/closed/in-flight index sets.
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn update_order(&mut self, order: &OrderAny) -> Result<()> {
        let client_order_id = order.client_order_id();
        if let Some(database) = &mut self.database {
            database.update_order(order)?;
        }

        if let Some(venue_order_id) = order.venue_order_id() {
            self.index
                .venue_order_ids
                .insert(venue_order_id, client_order_id);
        }
        if let Some(position_id) = order.position_id() {
            self.add_position_id(&position_id, &client_order_id);
        }

        if order.is_open() {
            self.index.orders_closed.remove(&client_order_id);
            self.index.orders_open.insert(client_order_id);
        }
        if order.is_closed() {
            self.index.orders_open.remove(&client_order_id);
            self.index.orders_inflight.remove(&client_order_id);
            self.index.orders_closed.insert(client_order_id);
        }
        if order.is_inflight() {
            self.index.orders_inflight.insert(client_order_id);
        } else {
            self.index.orders_inflight.remove(&client_order_id);
        }

        self.orders.insert(client_order_id, order.clone());
        Ok(())
    }

    /// Adds the given `position` to the cache (write-through).
    ///
    /// # Errors
    ///
    /// Returns an error if the position ID is already cached, or on a database
    /// failure.
    pub fn add_position(&mut self, position: Position) -> Result<()> {
        if self.positions.contains_key(&position.id) {
            anyhow::bail!("Position {} already in cache", position.id);
        }
        if let Some(database) = &mut self.database {
            database.add_position(&position)?;
        }

        let position_id = position.id;
        self.index
            .position_strategy
            .insert(position_id, position.strategy_id);
        self.index
            .position_orders
            .entry(position_id)
            .or_default()
            .extend(position.client_order_ids());
        self.index
            .instrument_positions
            .entry(position.instrument_id)
            .or_default()
            .insert(position_id);
        self.index
            .strategy_positions
            .entry(position.strategy_id)
            .or_default()
            .insert(position_id);
        self.index.positions.insert(position_id);
        self.index.positions_open.insert(position_id);
        self.add_position_id(&position_id, &position.opening_order_id);

        log::debug!("Added position {position_id}");
        self.positions.insert(position_id, position);
        Ok(())
    }

    /// Updates the given `position` in the cache (write-through), refreshing
    /// the open/closed index sets.
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn update_position(&mut self, position: &Position) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.update_position(position)?;
        }

        self.index
            .position_orders
            .entry(position.id)
            .or_default()
            .extend(position.client_order_ids());
        for client_order_id in position.client_order_ids() {
            self.index.order_position.insert(client_order_id, position.id);
        }

        if position.is_open() {
            self.index.positions_closed.remove(&position.id);
            self.index.positions_open.insert(position.id);
        } else {
            self.index.positions_open.remove(&position.id);
            self.index.positions_closed.insert(position.id);
        }

        self.positions.insert(position.id, position.clone());
        Ok(())
    }

    /// Adds a general (strategy user-state) entry (write-through).
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn add(&mut self, key: &str, value: Bytes) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.add(key, value.clone())?;
        }
        self.general.insert(key.to_string(), value);
        Ok(())
    }

    /// Returns the general entry under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.general.get(key)
    }

    /// Returns the general entries under the given `prefix`, with the prefix
    /// stripped from the keys.
    #[must_use]
    pub fn get_prefixed(&self, prefix: &str) -> HashMap<String, Bytes> {
        self.general
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect()
    }

    // -- MARKET DATA -----------------------------------------------------------------------------

    /// Adds the given `quote` to the ring for its instrument.
    pub fn add_quote(&mut self, quote: QuoteTick) {
        let ring = self
            .quotes
            .entry(quote.instrument_id)
            .or_insert_with(|| VecDeque::with_capacity(TICK_CAPACITY));
        if ring.len() >= TICK_CAPACITY {
            ring.pop_back();
        }
        ring.push_front(quote);
    }

    /// Adds the given `trade` to the ring for its instrument.
    pub fn add_trade(&mut self, trade: TradeTick) {
        let ring = self
            .trades
            .entry(trade.instrument_id)
            .or_insert_with(|| VecDeque::with_capacity(TICK_CAPACITY));
        if ring.len() >= TICK_CAPACITY {
            ring.pop_back();
        }
        ring.push_front(trade);
    }

    /// Adds the given `bar` to the ring for its bar type.
    pub fn add_bar(&mut self, bar: Bar) {
        let ring = self
            .bars
            .entry(bar.bar_type)
            .or_insert_with(|| VecDeque::with_capacity(BAR_CAPACITY));
        if ring.len() >= BAR_CAPACITY {
            ring.pop_back();
        }
        ring.push_front(bar);
    }

    /// Returns the latest quote for the given `instrument_id`, if any.
    #[must_use]
    pub fn quote(&self, instrument_id: &InstrumentId) -> Option<&QuoteTick> {
        self.quotes.get(instrument_id).and_then(VecDeque::front)
    }

    /// Returns the latest trade for the given `instrument_id`, if any.
    #[must_use]
    pub fn trade(&self, instrument_id: &InstrumentId) -> Option<&TradeTick> {
        self.trades.get(instrument_id).and_then(VecDeque::front)
    }

    /// Returns the latest bar for the given `bar_type`, if any.
    #[must_use]
    pub fn bar(&self, bar_type: &BarType) -> Option<&Bar> {
        self.bars.get(bar_type).and_then(VecDeque::front)
    }

    /// Returns the latest mark of the given `price_type` for the instrument.
    #[must_use]
    pub fn price(&self, instrument_id: &InstrumentId, price_type: PriceType) -> Option<Price> {
        match price_type {
            PriceType::Last => self.trade(instrument_id).map(|trade| trade.price),
            _ => self
                .quote(instrument_id)
                .map(|quote| quote.extract_price(price_type)),
        }
    }

    // -- QUERIES ---------------------------------------------------------------------------------

    /// Returns the currency registered under `code`, if cached.
    #[must_use]
    pub fn currency(&self, code: &Ustr) -> Option<&Currency> {
        self.currencies.get(code)
    }

    /// Returns the instrument for the given `instrument_id`, if cached.
    #[must_use]
    pub fn instrument(&self, instrument_id: &InstrumentId) -> Option<&InstrumentAny> {
        self.instruments.get(instrument_id)
    }

    /// Returns all cached instrument IDs.
    #[must_use]
    pub fn instrument_ids(&self) -> Vec<&InstrumentId> {
        self.instruments.keys().collect()
    }

    /// Returns the account for the given `account_id`, if cached.
    #[must_use]
    pub fn account(&self, account_id: &AccountId) -> Option<&AccountAny> {
        self.accounts.get(account_id)
    }

    /// Returns the account for the given `venue`, if cached.
    #[must_use]
    pub fn account_for_venue(&self, venue: &Venue) -> Option<&AccountAny> {
        self.index
            .venue_account
            .get(&venue.inner())
            .and_then(|account_id| self.accounts.get(account_id))
    }

    /// Returns the order for the given `client_order_id`, if cached.
    #[must_use]
    pub fn order(&self, client_order_id: &ClientOrderId) -> Option<&OrderAny> {
        self.orders.get(client_order_id)
    }

    /// Returns the client order ID for the given `venue_order_id`, if known.
    #[must_use]
    pub fn client_order_id(&self, venue_order_id: &VenueOrderId) -> Option<&ClientOrderId> {
        self.index.venue_order_ids.get(venue_order_id)
    }

    /// Returns all orders matching the optional filters.
    #[must_use]
    pub fn orders(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&OrderAny> {
        self.orders_from_set(&self.index.orders, instrument_id, strategy_id)
    }

    /// Returns all open orders matching the optional filters.
    #[must_use]
    pub fn orders_open(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&OrderAny> {
        self.orders_from_set(&self.index.orders_open, instrument_id, strategy_id)
    }

    /// Returns all closed orders matching the optional filters.
    #[must_use]
    pub fn orders_closed(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&OrderAny> {
        self.orders_from_set(&self.index.orders_closed, instrument_id, strategy_id)
    }

    fn orders_from_set(
        &self,
        set: &AHashSet<ClientOrderId>,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&OrderAny> {
        let mut orders: Vec<&OrderAny> = set
            .iter()
            .filter_map(|client_order_id| self.orders.get(client_order_id))
            .filter(|order| {
                instrument_id.is_none_or(|id| &order.instrument_id() == id)
                    && strategy_id.is_none_or(|id| &order.strategy_id() == id)
            })
            .collect();
        // Deterministic iteration for downstream consumers
        orders.sort_by_key(|order| (order.ts_init(), order.client_order_id()));
        orders
    }

    /// Returns the count of open orders matching the optional filters.
    #[must_use]
    pub fn orders_open_count(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> usize {
        self.orders_open(instrument_id, strategy_id).len()
    }

    /// Returns the position for the given `position_id`, if cached.
    #[must_use]
    pub fn position(&self, position_id: &PositionId) -> Option<&Position> {
        self.positions.get(position_id)
    }

    /// Returns the position associated with the given order, if any.
    #[must_use]
    pub fn position_for_order(&self, client_order_id: &ClientOrderId) -> Option<&Position> {
        self.index
            .order_position
            .get(client_order_id)
            .and_then(|position_id| self.positions.get(position_id))
    }

    /// Returns the position ID associated with the given order, if any.
    #[must_use]
    pub fn position_id(&self, client_order_id: &ClientOrderId) -> Option<&PositionId> {
        self.index.order_position.get(client_order_id)
    }

    /// Returns all open positions matching the optional filters.
    #[must_use]
    pub fn positions_open(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&Position> {
        self.positions_from_set(&self.index.positions_open, instrument_id, strategy_id)
    }

    /// Returns all closed positions matching the optional filters.
    #[must_use]
    pub fn positions_closed(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&Position> {
        self.positions_from_set(&self.index.positions_closed, instrument_id, strategy_id)
    }

    /// Returns all positions matching the optional filters.
    #[must_use]
    pub fn positions(
        &self,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&Position> {
        self.positions_from_set(&self.index.positions, instrument_id, strategy_id)
    }

    fn positions_from_set(
        &self,
        set: &AHashSet<PositionId>,
        instrument_id: Option<&InstrumentId>,
        strategy_id: Option<&StrategyId>,
    ) -> Vec<&Position> {
        let mut positions: Vec<&Position> = set
            .iter()
            .filter_map(|position_id| self.positions.get(position_id))
            .filter(|position| {
                instrument_id.is_none_or(|id| &position.instrument_id == id)
                    && strategy_id.is_none_or(|id| &position.strategy_id == id)
            })
            .collect();
        positions.sort_by_key(|position| (position.ts_opened, position.id));
        positions
    }

    // -- INTEGRITY -------------------------------------------------------------------------------

    /// Checks the referential integrity of the cache and its index.
    ///
    /// Returns `true` when all checks hold. Violations are logged at error
    /// level; engines treat a failed integrity check as fatal.
    #[must_use]
    pub fn check_integrity(&self) -> bool {
        let mut failures = 0_usize;

        for (client_order_id, order) in &self.orders {
            if !self.index.orders.contains(client_order_id) {
                log::error!("Order {client_order_id} not in index.orders");
                failures += 1;
            }
            if order.is_open() {
                if !self.index.orders_open.contains(client_order_id) {
                    log::error!("Open order {client_order_id} not in index.orders_open");
                    failures += 1;
                }
                if !self.instruments.contains_key(&order.instrument_id()) {
                    log::error!(
                        "Open order {client_order_id} has unknown instrument {}",
                        order.instrument_id()
                    );
                    failures += 1;
                }
            }
            if order.is_closed() && !self.index.orders_closed.contains(client_order_id) {
                log::error!("Closed order {client_order_id} not in index.orders_closed");
                failures += 1;
            }
        }

        for client_order_id in &self.index.orders {
            if !self.orders.contains_key(client_order_id) {
                log::error!("Indexed order {client_order_id} not in cache");
                failures += 1;
            }
        }

        for (position_id, position) in &self.positions {
            if !self.index.positions.contains(position_id) {
                log::error!("Position {position_id} not in index.positions");
                failures += 1;
            }
            for client_order_id in position.client_order_ids() {
                if !self.orders.contains_key(&client_order_id) {
                    log::error!(
                        "Position {position_id} references unknown order {client_order_id}"
                    );
                    failures += 1;
                }
            }
            // The position's fills must match the referenced orders' fills
            for fill in &position.events {
                let order = self.orders.get(&fill.client_order_id);
                if order.is_some_and(|order| !order.events().contains(
                    &meridian_model::events::OrderEventAny::Filled(*fill),
                )) {
                    log::error!(
                        "Position {position_id} fill {} not in order {} events",
                        fill.trade_id,
                        fill.client_order_id
                    );
                    failures += 1;
                }
            }
        }

        for position_id in &self.index.positions {
            if !self.positions.contains_key(position_id) {
                log::error!("Indexed position {position_id} not in cache");
                failures += 1;
            }
        }

        if failures > 0 {
            log::error!("Cache integrity check failed with {failures} error(s)");
            return false;
        }
        true
    }

    /// Logs any residual open orders or positions (end-of-run audit).
    pub fn check_residuals(&self) {
        for order in self.orders_open(None, None) {
            log::warn!("Residual open order {}", order.client_order_id());
        }
        for position in self.positions_open(None, None) {
            log::warn!("Residual {position}");
        }
    }

    /// Resets the cache to its initial state, retaining the backing database
    /// handle.
    pub fn reset(&mut self) {
        log::debug!("Resetting cache");
        self.index.clear();
        self.general.clear();
        self.currencies.clear();
        self.instruments.clear();
        self.accounts.clear();
        self.orders.clear();
        self.positions.clear();
        self.quotes.clear();
        self.trades.clear();
        self.bars.clear();
    }

    /// Wipes the backing database.
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn flush_db(&mut self) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.flush()?;
        }
        Ok(())
    }

    /// Closes the backing database connection.
    ///
    /// # Errors
    ///
    /// Returns an error on a database failure.
    pub fn dispose(&mut self) -> Result<()> {
        if let Some(database) = &mut self.database {
            database.close()?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_core::{UUID4, UnixNanos};
    use meridian_model::{
        enums::{LiquiditySide, OrderSide, OrderType},
        events::{OrderEventAny, OrderFilled, OrderSubmitted},
        identifiers::{TradeId, TraderId},
        orders::OrderTestBuilder,
        stubs::{audusd_sim, instrument_any, quote_tick},
        types::{Money, Price, Quantity},
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{
        database::{InMemoryCacheDatabase, Serializer},
        *,
    };

    fn cache_with_db() -> (Cache, InMemoryCacheDatabase) {
        let db = InMemoryCacheDatabase::new(TraderId::default(), Serializer::MsgPack);
        let cache = Cache::new(Some(Box::new(db.clone())));
        (cache, db)
    }

    fn submitted_order(instrument_id: InstrumentId) -> OrderAny {
        let mut order = OrderTestBuilder::new(OrderType::Limit)
            .instrument_id(instrument_id)
            .side(OrderSide::Buy)
            .price(Price::from("0.74900"))
            .quantity(Quantity::from(100_000_u32))
            .build();
        let submitted = OrderEventAny::Submitted(OrderSubmitted::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            AccountId::default(),
            UUID4::new(),
            UnixNanos::from(1),
            UnixNanos::from(1),
        ));
        order.apply(submitted).unwrap();
        order
    }

    #[rstest]
    fn test_add_and_query_order() {
        let mut cache = Cache::default();
        let instrument = instrument_any(audusd_sim());
        cache.add_instrument(instrument).unwrap();

        let order = submitted_order(instrument.id());
        let client_order_id = order.client_order_id();
        cache.add_order(order, None).unwrap();

        assert!(cache.order(&client_order_id).is_some());
        assert_eq!(cache.orders(None, None).len(), 1);
        assert!(cache.check_integrity());
    }

    #[rstest]
    fn test_add_duplicate_order_errors() {
        let mut cache = Cache::default();
        let order = submitted_order(InstrumentId::from("AUD/USD.SIM"));
        cache.add_order(order.clone(), None).unwrap();
        assert!(cache.add_order(order, None).is_err());
    }

    #[rstest]
    fn test_add_quote_and_price() {
        let mut cache = Cache::default();
        let quote = quote_tick(InstrumentId::from("AUD/USD.SIM"), "0.75000", "0.75005", 1);
        cache.add_quote(quote);

        assert_eq!(
            cache.price(&InstrumentId::from("AUD/USD.SIM"), PriceType::Bid),
            Some(Price::from("0.75000"))
        );
        assert!(cache.quote(&InstrumentId::from("USD/JPY.SIM")).is_none());
    }

    #[rstest]
    fn test_position_indexing_and_integrity() {
        let mut cache = Cache::default();
        let instrument = instrument_any(audusd_sim());
        cache.add_instrument(instrument).unwrap();

        let order = submitted_order(instrument.id());
        let client_order_id = order.client_order_id();
        cache.add_order(order, None).unwrap();

        let fill = OrderFilled::new(
            TraderId::default(),
            StrategyId::default(),
            instrument.id(),
            client_order_id,
            meridian_model::identifiers::VenueOrderId::new("SIM-1-001"),
            AccountId::default(),
            TradeId::new("1"),
            OrderSide::Buy,
            OrderType::Limit,
            Quantity::from(100_000_u32),
            Price::from("0.74900"),
            instrument.quote_currency(),
            LiquiditySide::Maker,
            Some(PositionId::new("P-001")),
            Some(Money::zero(instrument.quote_currency())),
            UUID4::new(),
            UnixNanos::from(2),
            UnixNanos::from(2),
        );
        let mut order = cache.order(&client_order_id).unwrap().clone();
        order.apply(OrderEventAny::Filled(fill)).unwrap();
        cache.update_order(&order).unwrap();

        let position = Position::new(&instrument, fill);
        cache.add_position(position).unwrap();

        assert_eq!(cache.positions_open(None, None).len(), 1);
        assert!(cache.position_for_order(&client_order_id).is_some());
        assert!(cache.check_integrity());
    }

    #[rstest]
    fn test_cache_replay_from_database() {
        let (mut cache, db) = cache_with_db();
        let instrument = instrument_any(audusd_sim());
        cache.add_currency(meridian_model::types::Currency::USD()).unwrap();
        cache.add_instrument(instrument).unwrap();
        let order = submitted_order(instrument.id());
        let client_order_id = order.client_order_id();
        cache.add_order(order, None).unwrap();

        // Restart: a new cache over the same database reconstructs the state
        let mut restarted = Cache::new(Some(Box::new(db)));
        restarted.cache_all().unwrap();

        assert!(restarted.instrument(&instrument.id()).is_some());
        assert_eq!(
            restarted.order(&client_order_id).unwrap(),
            cache.order(&client_order_id).unwrap()
        );
        assert!(restarted.check_integrity());
    }

    #[rstest]
    fn test_reset_retains_database() {
        let (mut cache, _db) = cache_with_db();
        let instrument = instrument_any(audusd_sim());
        cache.add_instrument(instrument).unwrap();
        cache.reset();
        assert!(cache.instrument(&instrument.id()).is_none());

        // The data is still in the database
        cache.cache_all().unwrap();
        assert!(cache.instrument(&instrument.id()).is_some());
    }
}
