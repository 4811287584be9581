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

//! The `Portfolio`: account balances, per-instrument exposures, and PnLs
//! derived from cached state and the latest market quotes.
//!
//! Unrealized PnL marks positions with the side-appropriate quote: the bid to
//! value a long exit, the ask for a short. Conversions to the settlement
//! currency chain through cross rates drawn from the latest cached quotes.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use meridian_common::{
    cache::Cache,
    xrate::{RateMap, get_exchange_rate},
};
use meridian_model::{
    accounts::{Account, AccountAny},
    enums::{PositionSide, PriceType},
    events::AccountState,
    identifiers::{InstrumentId, Venue},
    instruments::Instrument,
    position::Position,
    types::{Currency, Money, Price},
};

/// Derives account balances, exposures, and PnLs from cached state.
pub struct Portfolio {
    cache: Rc<RefCell<Cache>>,
}

impl Portfolio {
    /// Creates a new [`Portfolio`] instance.
    #[must_use]
    pub fn new(cache: Rc<RefCell<Cache>>) -> Self {
        Self { cache }
    }

    /// Applies the given account state `event` to the cached account.
    ///
    /// # Errors
    ///
    /// Returns an error on a cache failure.
    pub fn update_account(&mut self, event: &AccountState) -> anyhow::Result<()> {
        let existing = self.cache.borrow().account(&event.account_id).cloned();
        match existing {
            Some(mut account) => {
                account.apply(event.clone());
                self.cache.borrow_mut().update_account(account)?;
            }
            None => {
                let account = AccountAny::from_state(event.clone());
                self.cache.borrow_mut().add_account(account)?;
            }
        }
        log::debug!("Updated account {}", event.account_id);
        Ok(())
    }

    /// Returns the account for the given `venue`, if any.
    #[must_use]
    pub fn account(&self, venue: &Venue) -> Option<AccountAny> {
        self.cache.borrow().account_for_venue(venue).cloned()
    }

    /// Returns the total balances per currency for the given `venue`.
    #[must_use]
    pub fn balances_total(&self, venue: &Venue) -> AHashMap<Currency, Money> {
        self.account(venue)
            .map(|account| account.balances_total())
            .map(|balances| balances.into_iter().collect())
            .unwrap_or_default()
    }

    /// Returns the unrealized PnL for the given `instrument_id`, aggregated
    /// over open positions and marked with the side-appropriate quote.
    ///
    /// Returns `None` when no mark price is available.
    #[must_use]
    pub fn unrealized_pnl(&self, instrument_id: &InstrumentId) -> Option<Money> {
        let cache = self.cache.borrow();
        let positions = cache.positions_open(Some(instrument_id), None);
        if positions.is_empty() {
            let instrument = cache.instrument(instrument_id)?;
            return Some(Money::zero(instrument.settlement_currency()));
        }

        let mut total: Option<Money> = None;
        for position in positions {
            let mark = self.mark_price(&cache, position)?;
            let pnl = position.unrealized_pnl(mark);
            total = Some(match total {
                Some(total) => total + pnl,
                None => pnl,
            });
        }
        total
    }

    /// Returns the realized PnL for the given `instrument_id` over all cached
    /// positions.
    #[must_use]
    pub fn realized_pnl(&self, instrument_id: &InstrumentId) -> Option<Money> {
        let cache = self.cache.borrow();
        let instrument = cache.instrument(instrument_id)?;
        let mut total = Money::zero(instrument.settlement_currency());
        for position in cache.positions(Some(instrument_id), None) {
            if let Some(pnl) = position.realized_pnl {
                total += pnl;
            }
        }
        Some(total)
    }

    /// Returns the net exposure for the given `instrument_id` in the
    /// settlement currency, marked at the latest quote.
    #[must_use]
    pub fn net_exposure(&self, instrument_id: &InstrumentId) -> Option<Money> {
        let cache = self.cache.borrow();
        let instrument = cache.instrument(instrument_id)?;
        let mut total = Money::zero(instrument.settlement_currency());
        for position in cache.positions_open(Some(instrument_id), None) {
            let mark = self.mark_price(&cache, position)?;
            total += position.notional_value(mark);
        }
        Some(total)
    }

    /// Returns whether there is any open position for the instrument.
    #[must_use]
    pub fn is_flat(&self, instrument_id: &InstrumentId) -> bool {
        self.cache
            .borrow()
            .positions_open(Some(instrument_id), None)
            .is_empty()
    }

    /// Returns the net liquidation value for the given `venue` in the account
    /// base currency: balances plus unrealized PnL, converted via cross rates
    /// from the latest quotes.
    ///
    /// Returns `None` when the account is missing or a conversion rate is
    /// unavailable.
    #[must_use]
    pub fn net_liquidation_value(&self, venue: &Venue) -> Option<Money> {
        let account = self.account(venue)?;
        let base_currency = account.base_currency()?;
        let rates = self.build_rate_map();

        let mut total = Money::zero(base_currency);
        for (currency, balance) in account.balances_total() {
            let rate = get_exchange_rate(currency, base_currency, &rates)?;
            total += Money::new(balance.as_f64() * rate, base_currency);
        }

        let cache = self.cache.borrow();
        let open_positions: Vec<Position> = cache
            .positions_open(None, None)
            .into_iter()
            .filter(|position| &position.instrument_id.venue == venue)
            .cloned()
            .collect();
        for position in &open_positions {
            let mark = self.mark_price(&cache, position)?;
            let pnl = position.unrealized_pnl(mark);
            let rate = get_exchange_rate(pnl.currency, base_currency, &rates)?;
            total += Money::new(pnl.as_f64() * rate, base_currency);
        }
        Some(total)
    }

    /// Builds the cross-rate map from the latest cached quotes of currency
    /// pair instruments (mid prices).
    #[must_use]
    pub fn build_rate_map(&self) -> RateMap {
        meridian_common::xrate::build_rate_map(&self.cache.borrow())
    }

    /// Returns the side-appropriate mark for the given `position`: the bid to
    /// value a long exit, the ask for a short.
    fn mark_price(&self, cache: &Cache, position: &Position) -> Option<Price> {
        let price_type = match position.side {
            PositionSide::Long => PriceType::Bid,
            PositionSide::Short => PriceType::Ask,
            PositionSide::Flat => PriceType::Mid,
        };
        cache
            .price(&position.instrument_id, price_type)
            .or_else(|| cache.price(&position.instrument_id, PriceType::Last))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_core::{UUID4, UnixNanos};
    use meridian_model::{
        enums::{AccountType, LiquiditySide, OrderSide, OrderType},
        events::OrderFilled,
        identifiers::{
            AccountId, ClientOrderId, PositionId, StrategyId, TradeId, TraderId, VenueOrderId,
        },
        instruments::InstrumentAny,
        stubs::{audusd_sim, instrument_any, quote_tick},
        types::{AccountBalance, Quantity},
    };
    use rstest::rstest;

    use super::*;

    fn harness() -> (Portfolio, Rc<RefCell<Cache>>) {
        let cache = Rc::new(RefCell::new(Cache::default()));
        cache
            .borrow_mut()
            .add_instrument(instrument_any(audusd_sim()))
            .unwrap();
        (Portfolio::new(cache.clone()), cache)
    }

    fn cash_account_state(total: f64) -> AccountState {
        let total = Money::new(total, Currency::USD());
        AccountState::new(
            AccountId::new("SIM-001"),
            AccountType::Cash,
            Some(Currency::USD()),
            vec![AccountBalance::new(
                total,
                Money::zero(Currency::USD()),
                total,
            )],
            vec![],
            true,
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        )
    }

    fn long_position(instrument: &InstrumentAny, qty: u64, px: &str) -> Position {
        let fill = OrderFilled::new(
            TraderId::default(),
            StrategyId::default(),
            instrument.id(),
            ClientOrderId::default(),
            VenueOrderId::new("SIM-1-001"),
            AccountId::new("SIM-001"),
            TradeId::new("1"),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from(qty),
            Price::from(px),
            instrument.quote_currency(),
            LiquiditySide::Taker,
            Some(PositionId::new("P-001")),
            Some(Money::zero(instrument.quote_currency())),
            UUID4::new(),
            UnixNanos::from(1),
            UnixNanos::from(1),
        );
        Position::new(instrument, fill)
    }

    #[rstest]
    fn test_update_account_creates_then_applies() {
        let (mut portfolio, _cache) = harness();
        portfolio.update_account(&cash_account_state(1_000_000.0)).unwrap();
        let venue = Venue::new("SIM");
        assert_eq!(
            portfolio.balances_total(&venue).get(&Currency::USD()),
            Some(&Money::new(1_000_000.0, Currency::USD()))
        );

        portfolio.update_account(&cash_account_state(925_000.0)).unwrap();
        assert_eq!(
            portfolio.balances_total(&venue).get(&Currency::USD()),
            Some(&Money::new(925_000.0, Currency::USD()))
        );
        let account = portfolio.account(&venue).unwrap();
        assert_eq!(account.event_count(), 2);
    }

    #[rstest]
    fn test_unrealized_pnl_marks_long_at_bid() {
        let (portfolio, cache) = harness();
        let instrument = instrument_any(audusd_sim());
        let instrument_id = instrument.id();
        // Orders backing the position are not needed for PnL derivation
        cache
            .borrow_mut()
            .add_position(long_position(&instrument, 100_000, "0.75000"))
            .unwrap();
        cache
            .borrow_mut()
            .add_quote(quote_tick(instrument_id, "0.75500", "0.75510", 2));

        // Long position marked at the bid: (0.75500 - 0.75000) * 100_000
        assert_eq!(
            portfolio.unrealized_pnl(&instrument_id),
            Some(Money::new(500.0, Currency::USD()))
        );
    }

    #[rstest]
    fn test_unrealized_pnl_zero_when_flat() {
        let (portfolio, _cache) = harness();
        let instrument_id = instrument_any(audusd_sim()).id();
        assert_eq!(
            portfolio.unrealized_pnl(&instrument_id),
            Some(Money::zero(Currency::USD()))
        );
        assert!(portfolio.is_flat(&instrument_id));
    }

    #[rstest]
    fn test_net_exposure() {
        let (portfolio, cache) = harness();
        let instrument = instrument_any(audusd_sim());
        let instrument_id = instrument.id();
        cache
            .borrow_mut()
            .add_position(long_position(&instrument, 100_000, "0.75000"))
            .unwrap();
        cache
            .borrow_mut()
            .add_quote(quote_tick(instrument_id, "0.75500", "0.75510", 2));

        assert_eq!(
            portfolio.net_exposure(&instrument_id),
            Some(Money::new(75_500.0, Currency::USD()))
        );
    }

    #[rstest]
    fn test_net_liquidation_value_with_cross_rate() {
        let (mut portfolio, cache) = harness();
        let instrument = instrument_any(audusd_sim());
        let instrument_id = instrument.id();
        portfolio.update_account(&cash_account_state(1_000_000.0)).unwrap();
        cache
            .borrow_mut()
            .add_position(long_position(&instrument, 100_000, "0.75000"))
            .unwrap();
        cache
            .borrow_mut()
            .add_quote(quote_tick(instrument_id, "0.75500", "0.75500", 2));

        // Balances (USD) + unrealized PnL (USD): 1_000_000 + 500
        assert_eq!(
            portfolio.net_liquidation_value(&Venue::new("SIM")),
            Some(Money::new(1_000_500.0, Currency::USD()))
        );
    }
}
