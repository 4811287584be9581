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

//! An account with unleveraged cash assets only.

use std::{
    collections::HashMap,
    fmt::Display,
    ops::{Deref, DerefMut},
};

use serde::{Deserialize, Serialize};

use crate::{
    accounts::{Account, base::BaseAccount},
    enums::AccountType,
    events::{AccountState, OrderFilled},
    identifiers::AccountId,
    instruments::InstrumentAny,
    position::Position,
    types::{AccountBalance, Currency, Money},
};

/// An account with unleveraged cash assets only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashAccount {
    /// The common account state.
    pub base: BaseAccount,
}

impl CashAccount {
    /// Creates a new [`CashAccount`] instance from an initial state `event`.
    #[must_use]
    pub fn new(event: AccountState) -> Self {
        Self {
            base: BaseAccount::new(event),
        }
    }
}

impl Account for CashAccount {
    fn id(&self) -> AccountId {
        self.id
    }

    fn account_type(&self) -> AccountType {
        self.account_type
    }

    fn base_currency(&self) -> Option<Currency> {
        self.base_currency
    }

    fn balances(&self) -> HashMap<Currency, AccountBalance> {
        self.base.balances.clone()
    }

    fn starting_balances(&self) -> HashMap<Currency, Money> {
        self.base.balances_starting.clone()
    }

    fn balance(&self, currency: Option<Currency>) -> Option<&AccountBalance> {
        self.base_balance(currency)
    }

    fn balance_total(&self, currency: Option<Currency>) -> Option<Money> {
        self.base_balance_total(currency)
    }

    fn balances_total(&self) -> HashMap<Currency, Money> {
        self.base_balances_total()
    }

    fn balance_free(&self, currency: Option<Currency>) -> Option<Money> {
        self.base_balance_free(currency)
    }

    fn balance_locked(&self, currency: Option<Currency>) -> Option<Money> {
        self.base_balance_locked(currency)
    }

    fn events(&self) -> Vec<AccountState> {
        self.base.events.clone()
    }

    fn last_event(&self) -> Option<AccountState> {
        self.base_last_event()
    }

    fn event_count(&self) -> usize {
        self.base.events.len()
    }

    fn currencies(&self) -> Vec<Currency> {
        self.base.balances.keys().copied().collect()
    }

    fn apply(&mut self, event: AccountState) {
        self.base_apply(event);
    }

    fn calculate_pnls(
        &self,
        instrument: &InstrumentAny,
        fill: &OrderFilled,
        position: Option<&Position>,
    ) -> anyhow::Result<Vec<Money>> {
        self.base_calculate_pnls(instrument, fill, position)
    }
}

impl Deref for CashAccount {
    type Target = BaseAccount;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for CashAccount {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl Display for CashAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(id={}, type={}, base={})",
            stringify!(CashAccount),
            self.id,
            self.account_type,
            self.base_currency
                .map_or("None".to_string(), |c| c.code.to_string()),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_core::{UUID4, UnixNanos};
    use rstest::rstest;

    use super::*;
    use crate::{
        enums::{LiquiditySide, OrderSide, OrderType},
        identifiers::{
            ClientOrderId, PositionId, StrategyId, TradeId, TraderId, VenueOrderId,
        },
        instruments::Instrument,
        stubs::{audusd_sim, instrument_any},
        types::{Price, Quantity},
    };

    fn single_currency_account() -> CashAccount {
        let total = Money::new(1_000_000.0, Currency::USD());
        CashAccount::new(AccountState::new(
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
        ))
    }

    fn multi_currency_account() -> CashAccount {
        let usd = Money::new(1_000_000.0, Currency::USD());
        let aud = Money::new(0.0, Currency::AUD());
        CashAccount::new(AccountState::new(
            AccountId::new("SIM-001"),
            AccountType::Cash,
            None,
            vec![
                AccountBalance::new(usd, Money::zero(Currency::USD()), usd),
                AccountBalance::new(aud, Money::zero(Currency::AUD()), aud),
            ],
            vec![],
            true,
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        ))
    }

    fn buy_fill(instrument: &InstrumentAny) -> OrderFilled {
        OrderFilled::new(
            TraderId::default(),
            StrategyId::default(),
            instrument.id(),
            ClientOrderId::default(),
            VenueOrderId::new("SIM-1-001"),
            AccountId::new("SIM-001"),
            TradeId::new("1"),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from(100_000_u32),
            Price::from("0.75000"),
            instrument.quote_currency(),
            LiquiditySide::Taker,
            Some(PositionId::new("P-001")),
            None,
            UUID4::new(),
            UnixNanos::default(),
            UnixNanos::default(),
        )
    }

    #[rstest]
    fn test_single_currency_buy_pnls(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let account = single_currency_account();
        let pnls = account
            .calculate_pnls(&instrument, &buy_fill(&instrument), None)
            .unwrap();
        // Single-currency account: only the quote-currency notional leg
        assert_eq!(pnls, vec![Money::new(-75_000.0, Currency::USD())]);
    }

    #[rstest]
    fn test_multi_currency_buy_pnls(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let account = multi_currency_account();
        let mut pnls = account
            .calculate_pnls(&instrument, &buy_fill(&instrument), None)
            .unwrap();
        pnls.sort_by_key(|money| money.currency.code);
        assert_eq!(
            pnls,
            vec![
                Money::new(100_000.0, Currency::AUD()),
                Money::new(-75_000.0, Currency::USD()),
            ]
        );
    }
}
