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

//! The durable backing store contract for the `Cache`, and an in-memory
//! reference implementation.
//!
//! Every cache mutation is written through; a caller sees post-write state on
//! the next load. Keys follow the layout
//! `trader-{trader_id}:{kind}:{id}` with kind in
//! {currencies, instruments, accounts, orders, positions, general, index}.
//! Absent keys load as `None`, never an error.

use std::{cell::RefCell, collections::BTreeMap, fmt::Debug, rc::Rc};

use ahash::AHashMap;
use anyhow::Result;
use bytes::Bytes;
use meridian_model::{
    accounts::{Account, AccountAny},
    enums::CurrencyType,
    events::OrderEventAny,
    identifiers::{AccountId, ClientOrderId, InstrumentId, PositionId, TraderId},
    instruments::{Instrument, InstrumentAny},
    orders::{Order, OrderAny},
    position::Position,
    types::Currency,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use ustr::Ustr;

/// The pluggable byte-level serializer for cache database values.
///
/// Both formats are self-describing and round-trip exact:
/// `decode(encode(v)) == v`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Serializer {
    /// Self-describing binary MessagePack.
    #[default]
    MsgPack,
    /// Self-describing JSON text.
    Json,
}

impl Serializer {
    /// Encodes the given `value` to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes> {
        match self {
            Self::MsgPack => Ok(Bytes::from(rmp_serde::to_vec_named(value)?)),
            Self::Json => Ok(Bytes::from(serde_json::to_vec(value)?)),
        }
    }

    /// Decodes a value from the given `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        match self {
            Self::MsgPack => Ok(rmp_serde::from_slice(data)?),
            Self::Json => Ok(serde_json::from_slice(data)?),
        }
    }
}

/// A full currency definition as persisted (the in-memory `Currency` is a
/// registry flyweight keyed by code alone).
#[derive(Debug, Serialize, Deserialize)]
struct CurrencyData {
    code: String,
    precision: u8,
    iso4217: u16,
    name: String,
    currency_type: CurrencyType,
}

impl From<&Currency> for CurrencyData {
    fn from(currency: &Currency) -> Self {
        Self {
            code: currency.code.to_string(),
            precision: currency.precision,
            iso4217: currency.iso4217,
            name: currency.name.to_string(),
            currency_type: currency.currency_type,
        }
    }
}

impl From<CurrencyData> for Currency {
    fn from(data: CurrencyData) -> Self {
        let currency = Self::new(
            data.code.as_str(),
            data.precision,
            data.iso4217,
            data.name.as_str(),
            data.currency_type,
        );
        // Loading restores user-registered currencies into the registry
        Self::register(currency, false).ok();
        currency
    }
}

/// The durable backing store contract for the `Cache`.
///
/// Implementations guarantee write-through visibility and keyed idempotence:
/// re-adding an equal `Currency`/`Instrument` is a no-op while a differing one
/// is an error; mutable entities (accounts, orders, positions) replace.
/// Operations are serialized per connection; sharing one database between
/// kernels is not supported.
pub trait CacheDatabase: Debug {
    /// Adds the given `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error if a differing currency exists under the same code, or
    /// on a serialization failure.
    fn add_currency(&mut self, currency: &Currency) -> Result<()>;

    /// Adds the given `instrument`.
    ///
    /// # Errors
    ///
    /// Returns an error if a differing instrument exists under the same ID, or
    /// on a serialization failure.
    fn add_instrument(&mut self, instrument: &InstrumentAny) -> Result<()>;

    /// Adds or replaces the given `account`.
    ///
    /// # Errors
    ///
    /// Returns an error on a serialization failure.
    fn add_account(&mut self, account: &AccountAny) -> Result<()>;

    /// Updates the given `account` (replace semantics).
    ///
    /// # Errors
    ///
    /// Returns an error on a serialization failure.
    fn update_account(&mut self, account: &AccountAny) -> Result<()> {
        self.add_account(account)
    }

    /// Adds or replaces the given `order`, persisted as its event history.
    ///
    /// # Errors
    ///
    /// Returns an error on a serialization failure.
    fn add_order(&mut self, order: &OrderAny) -> Result<()>;

    /// Updates the given `order` (replace semantics).
    ///
    /// # Errors
    ///
    /// Returns an error on a serialization failure.
    fn update_order(&mut self, order: &OrderAny) -> Result<()> {
        self.add_order(order)
    }

    /// Adds or replaces the given `position`.
    ///
    /// # Errors
    ///
    /// Returns an error on a serialization failure.
    fn add_position(&mut self, position: &Position) -> Result<()>;

    /// Updates the given `position` (replace semantics).
    ///
    /// # Errors
    ///
    /// Returns an error on a serialization failure.
    fn update_position(&mut self, position: &Position) -> Result<()> {
        self.add_position(position)
    }

    /// Adds a general (strategy user-state) entry.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn add(&mut self, key: &str, value: Bytes) -> Result<()>;

    /// Deletes the currency under `code`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn delete_currency(&mut self, code: &Ustr) -> Result<()>;

    /// Deletes the instrument under `instrument_id`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn delete_instrument(&mut self, instrument_id: &InstrumentId) -> Result<()>;

    /// Deletes the account under `account_id`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn delete_account(&mut self, account_id: &AccountId) -> Result<()>;

    /// Deletes the order under `client_order_id`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn delete_order(&mut self, client_order_id: &ClientOrderId) -> Result<()>;

    /// Deletes the position under `position_id`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn delete_position(&mut self, position_id: &PositionId) -> Result<()>;

    /// Loads the currency under `code` (`None` when absent).
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_currency(&self, code: &Ustr) -> Result<Option<Currency>>;

    /// Loads the instrument under `instrument_id` (`None` when absent).
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_instrument(&self, instrument_id: &InstrumentId) -> Result<Option<InstrumentAny>>;

    /// Loads the account under `account_id` (`None` when absent).
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_account(&self, account_id: &AccountId) -> Result<Option<AccountAny>>;

    /// Loads the order under `client_order_id` (`None` when absent).
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_order(&self, client_order_id: &ClientOrderId) -> Result<Option<OrderAny>>;

    /// Loads the position under `position_id` (`None` when absent).
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_position(&self, position_id: &PositionId) -> Result<Option<Position>>;

    /// Loads all currencies.
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_currencies(&self) -> Result<AHashMap<Ustr, Currency>>;

    /// Loads all instruments.
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_instruments(&self) -> Result<AHashMap<InstrumentId, InstrumentAny>>;

    /// Loads all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_accounts(&self) -> Result<AHashMap<AccountId, AccountAny>>;

    /// Loads all orders.
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_orders(&self) -> Result<AHashMap<ClientOrderId, OrderAny>>;

    /// Loads all positions.
    ///
    /// # Errors
    ///
    /// Returns an error on a deserialization failure.
    fn load_positions(&self) -> Result<AHashMap<PositionId, Position>>;

    /// Loads all general (strategy user-state) entries.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn load(&self) -> Result<AHashMap<String, Bytes>>;

    /// Wipes the entire database.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn flush(&mut self) -> Result<()>;

    /// Closes the database connection.
    ///
    /// # Errors
    ///
    /// Returns an error on a storage failure.
    fn close(&mut self) -> Result<()>;
}

/// An in-memory [`CacheDatabase`] over a shared key-value store.
///
/// Cloning the adapter shares the underlying store, so a new kernel can be
/// pointed at the same data to replay state across a restart.
#[derive(Clone, Debug)]
pub struct InMemoryCacheDatabase {
    trader_id: TraderId,
    serializer: Serializer,
    store: Rc<RefCell<BTreeMap<String, Bytes>>>,
}

impl InMemoryCacheDatabase {
    /// Creates a new [`InMemoryCacheDatabase`] instance.
    #[must_use]
    pub fn new(trader_id: TraderId, serializer: Serializer) -> Self {
        Self {
            trader_id,
            serializer,
            store: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }

    /// Returns the serializer in use.
    #[must_use]
    pub const fn serializer(&self) -> Serializer {
        self.serializer
    }

    /// Returns the count of keys in the store.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.store.borrow().len()
    }

    fn key(&self, kind: &str, id: &str) -> String {
        format!("trader-{}:{kind}:{id}", self.trader_id)
    }

    fn kind_prefix(&self, kind: &str) -> String {
        format!("trader-{}:{kind}:", self.trader_id)
    }

    fn insert<T: Serialize>(&mut self, kind: &str, id: &str, value: &T) -> Result<()> {
        let encoded = self.serializer.encode(value)?;
        self.store.borrow_mut().insert(self.key(kind, id), encoded);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<T>> {
        match self.store.borrow().get(&self.key(kind, id)) {
            Some(data) => Ok(Some(self.serializer.decode(data)?)),
            None => Ok(None),
        }
    }

    fn get_all<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<(String, T)>> {
        let prefix = self.kind_prefix(kind);
        let mut values = Vec::new();
        for (key, data) in self.store.borrow().iter() {
            if let Some(id) = key.strip_prefix(&prefix) {
                values.push((id.to_string(), self.serializer.decode(data)?));
            }
        }
        Ok(values)
    }
}

impl CacheDatabase for InMemoryCacheDatabase {
    fn add_currency(&mut self, currency: &Currency) -> Result<()> {
        if let Some(existing) = self.load_currency(&currency.code)? {
            let equal = existing.precision == currency.precision
                && existing.iso4217 == currency.iso4217
                && existing.name == currency.name
                && existing.currency_type == currency.currency_type;
            if equal {
                return Ok(()); // Idempotent
            }
            anyhow::bail!(
                "Currency '{}' already persisted with differing definition",
                currency.code
            );
        }
        self.insert("currencies", currency.code.as_str(), &CurrencyData::from(currency))
    }

    fn add_instrument(&mut self, instrument: &InstrumentAny) -> Result<()> {
        if let Some(existing) = self.load_instrument(&instrument.id())? {
            if &existing == instrument {
                return Ok(()); // Idempotent
            }
            anyhow::bail!(
                "Instrument '{}' already persisted with differing definition",
                instrument.id()
            );
        }
        self.insert("instruments", &instrument.id().to_string(), instrument)
    }

    fn add_account(&mut self, account: &AccountAny) -> Result<()> {
        self.insert("accounts", account.id().as_str(), account)
    }

    fn add_order(&mut self, order: &OrderAny) -> Result<()> {
        let events: Vec<OrderEventAny> = order.events().to_vec();
        self.insert("orders", order.client_order_id().as_str(), &events)
    }

    fn add_position(&mut self, position: &Position) -> Result<()> {
        self.insert("positions", position.id.as_str(), position)?;
        // Index set for reverse lookup from orders to positions
        for client_order_id in position.client_order_ids() {
            let key = format!("order_position:{client_order_id}");
            let encoded = self.serializer.encode(&position.id)?;
            self.store
                .borrow_mut()
                .insert(self.key("index", &key), encoded);
        }
        Ok(())
    }

    fn add(&mut self, key: &str, value: Bytes) -> Result<()> {
        self.store
            .borrow_mut()
            .insert(self.key("general", key), value);
        Ok(())
    }

    fn delete_currency(&mut self, code: &Ustr) -> Result<()> {
        self.store
            .borrow_mut()
            .remove(&self.key("currencies", code.as_str()));
        Ok(())
    }

    fn delete_instrument(&mut self, instrument_id: &InstrumentId) -> Result<()> {
        self.store
            .borrow_mut()
            .remove(&self.key("instruments", &instrument_id.to_string()));
        Ok(())
    }

    fn delete_account(&mut self, account_id: &AccountId) -> Result<()> {
        self.store
            .borrow_mut()
            .remove(&self.key("accounts", account_id.as_str()));
        Ok(())
    }

    fn delete_order(&mut self, client_order_id: &ClientOrderId) -> Result<()> {
        self.store
            .borrow_mut()
            .remove(&self.key("orders", client_order_id.as_str()));
        Ok(())
    }

    fn delete_position(&mut self, position_id: &PositionId) -> Result<()> {
        self.store
            .borrow_mut()
            .remove(&self.key("positions", position_id.as_str()));
        Ok(())
    }

    fn load_currency(&self, code: &Ustr) -> Result<Option<Currency>> {
        let data: Option<CurrencyData> = self.get("currencies", code.as_str())?;
        Ok(data.map(Currency::from))
    }

    fn load_instrument(&self, instrument_id: &InstrumentId) -> Result<Option<InstrumentAny>> {
        self.get("instruments", &instrument_id.to_string())
    }

    fn load_account(&self, account_id: &AccountId) -> Result<Option<AccountAny>> {
        self.get("accounts", account_id.as_str())
    }

    fn load_order(&self, client_order_id: &ClientOrderId) -> Result<Option<OrderAny>> {
        let events: Option<Vec<OrderEventAny>> = self.get("orders", client_order_id.as_str())?;
        match events {
            Some(events) => Ok(Some(OrderAny::from_events(events)?)),
            None => Ok(None),
        }
    }

    fn load_position(&self, position_id: &PositionId) -> Result<Option<Position>> {
        self.get("positions", position_id.as_str())
    }

    fn load_currencies(&self) -> Result<AHashMap<Ustr, Currency>> {
        let mut currencies = AHashMap::new();
        for (code, data) in self.get_all::<CurrencyData>("currencies")? {
            currencies.insert(Ustr::from(&code), Currency::from(data));
        }
        Ok(currencies)
    }

    fn load_instruments(&self) -> Result<AHashMap<InstrumentId, InstrumentAny>> {
        let mut instruments = AHashMap::new();
        for (_, instrument) in self.get_all::<InstrumentAny>("instruments")? {
            instruments.insert(instrument.id(), instrument);
        }
        Ok(instruments)
    }

    fn load_accounts(&self) -> Result<AHashMap<AccountId, AccountAny>> {
        let mut accounts = AHashMap::new();
        for (_, account) in self.get_all::<AccountAny>("accounts")? {
            accounts.insert(account.id(), account);
        }
        Ok(accounts)
    }

    fn load_orders(&self) -> Result<AHashMap<ClientOrderId, OrderAny>> {
        let mut orders = AHashMap::new();
        for (_, events) in self.get_all::<Vec<OrderEventAny>>("orders")? {
            let order = OrderAny::from_events(events)?;
            orders.insert(order.client_order_id(), order);
        }
        Ok(orders)
    }

    fn load_positions(&self) -> Result<AHashMap<PositionId, Position>> {
        let mut positions = AHashMap::new();
        for (_, position) in self.get_all::<Position>("positions")? {
            positions.insert(position.id, position);
        }
        Ok(positions)
    }

    fn load(&self) -> Result<AHashMap<String, Bytes>> {
        let prefix = self.kind_prefix("general");
        let mut entries = AHashMap::new();
        for (key, data) in self.store.borrow().iter() {
            if let Some(id) = key.strip_prefix(&prefix) {
                entries.insert(id.to_string(), data.clone());
            }
        }
        Ok(entries)
    }

    fn flush(&mut self) -> Result<()> {
        self.store.borrow_mut().clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_model::{
        enums::{OrderSide, OrderType},
        orders::OrderTestBuilder,
        stubs::audusd_sim,
        types::{Price, Quantity},
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn database() -> InMemoryCacheDatabase {
        InMemoryCacheDatabase::new(TraderId::default(), Serializer::MsgPack)
    }

    #[rstest]
    #[case(Serializer::MsgPack)]
    #[case(Serializer::Json)]
    fn test_serializer_round_trip_events(#[case] serializer: Serializer) {
        let order = OrderTestBuilder::new(OrderType::Limit)
            .instrument_id(InstrumentId::from("AUD/USD.SIM"))
            .side(OrderSide::Buy)
            .price(Price::from("0.74900"))
            .quantity(Quantity::from(100_000_u32))
            .build();
        let events: Vec<OrderEventAny> = order.events().to_vec();
        let encoded = serializer.encode(&events).unwrap();
        let decoded: Vec<OrderEventAny> = serializer.decode(&encoded).unwrap();
        assert_eq!(decoded, events);
    }

    #[rstest]
    fn test_currency_round_trip() {
        let mut db = database();
        let currency = Currency::USD();
        db.add_currency(&currency).unwrap();
        assert_eq!(db.load_currency(&currency.code).unwrap(), Some(currency));
    }

    #[rstest]
    fn test_currency_idempotence() {
        let mut db = database();
        db.add_currency(&Currency::USD()).unwrap();
        // Re-adding the equal value is a no-op
        db.add_currency(&Currency::USD()).unwrap();
        assert_eq!(db.load_currencies().unwrap().len(), 1);
    }

    #[rstest]
    fn test_absent_keys_load_none() {
        let db = database();
        assert!(db.load_currency(&Ustr::from("ZZZ")).unwrap().is_none());
        assert!(
            db.load_order(&ClientOrderId::new("O-UNKNOWN"))
                .unwrap()
                .is_none()
        );
        assert!(
            db.load_position(&PositionId::new("P-UNKNOWN"))
                .unwrap()
                .is_none()
        );
    }

    #[rstest]
    fn test_instrument_round_trip() {
        let mut db = database();
        let instrument = InstrumentAny::CurrencyPair(audusd_sim());
        db.add_instrument(&instrument).unwrap();
        assert_eq!(
            db.load_instrument(&instrument.id()).unwrap(),
            Some(instrument)
        );
    }

    #[rstest]
    fn test_order_round_trip_via_events() {
        let mut db = database();
        let order = OrderTestBuilder::new(OrderType::Limit)
            .instrument_id(InstrumentId::from("AUD/USD.SIM"))
            .side(OrderSide::Buy)
            .price(Price::from("0.74900"))
            .quantity(Quantity::from(100_000_u32))
            .build();
        db.add_order(&order).unwrap();
        let loaded = db.load_order(&order.client_order_id()).unwrap().unwrap();
        assert_eq!(loaded, order);
    }

    #[rstest]
    fn test_general_entries() {
        let mut db = database();
        db.add("ema_state", Bytes::from_static(b"fast=10")).unwrap();
        let entries = db.load().unwrap();
        assert_eq!(entries.get("ema_state"), Some(&Bytes::from_static(b"fast=10")));
    }

    #[rstest]
    fn test_flush_wipes_all() {
        let mut db = database();
        db.add_currency(&Currency::USD()).unwrap();
        db.flush().unwrap();
        assert_eq!(db.key_count(), 0);
        assert!(db.load_currencies().unwrap().is_empty());
    }

    #[rstest]
    fn test_shared_store_across_clones() {
        let mut db = database();
        db.add_currency(&Currency::USD()).unwrap();
        // A clone shares the underlying store, as across a kernel restart
        let restarted = db.clone();
        assert_eq!(restarted.load_currencies().unwrap().len(), 1);
    }
}
