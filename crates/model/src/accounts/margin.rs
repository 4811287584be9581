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

//! An account which facilitates trading on margin.

use std::{
    collections::HashMap,
    fmt::Display,
    ops::{Deref, DerefMut},
};

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    accounts::{Account, base::BaseAccount},
    enums::AccountType,
    events::{AccountState, OrderFilled},
    identifiers::{AccountId, InstrumentId},
    instruments::{Instrument, InstrumentAny},
    position::Position,
    types::{AccountBalance, Currency, MarginBalance, Money, Price, Quantity},
};

/// An account which facilitates trading on margin, using account assets as
/// collateral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarginAccount {
    /// The common account state.
    pub base: BaseAccount,
    /// The default leverage applied to instruments without a specific setting.
    pub default_leverage: f64,
    /// Instrument specific leverages.
    pub leverages: HashMap<InstrumentId, f64>,
    /// The margin balances per instrument.
    pub margins: HashMap<InstrumentId, MarginBalance>,
}

impl MarginAccount {
    /// Creates a new [`MarginAccount`] instance from an initial state `event`.
    #[must_use]
    pub fn new(event: AccountState) -> Self {
        let mut margins = HashMap::new();
        for margin in &event.margins {
            margins.insert(margin.instrument_id, *margin);
        }
        Self {
            base: BaseAccount::new(event),
            default_leverage: 1.0,
            leverages: HashMap::new(),
            margins,
        }
    }

    /// Sets the default leverage for the account.
    pub fn set_default_leverage(&mut self, leverage: f64) {
        assert!(leverage >= 1.0, "Leverage must be >= 1");
        self.default_leverage = leverage;
    }

    /// Sets the leverage for the given `instrument_id`.
    pub fn set_leverage(&mut self, instrument_id: InstrumentId, leverage: f64) {
        assert!(leverage >= 1.0, "Leverage must be >= 1");
        self.leverages.insert(instrument_id, leverage);
    }

    /// Returns the leverage for the given `instrument_id`.
    #[must_use]
    pub fn leverage(&self, instrument_id: &InstrumentId) -> f64 {
        self.leverages
            .get(instrument_id)
            .copied()
            .unwrap_or(self.default_leverage)
    }

    /// Returns the margin balance for the given `instrument_id`, if any.
    #[must_use]
    pub fn margin(&self, instrument_id: &InstrumentId) -> Option<&MarginBalance> {
        self.margins.get(instrument_id)
    }

    /// Calculates the initial (order) margin for the given exposure.
    #[must_use]
    pub fn calculate_initial_margin(
        &self,
        instrument: &InstrumentAny,
        quantity: Quantity,
        price: Price,
    ) -> Money {
        let notional = instrument.calculate_notional_value(quantity, price, None);
        let leverage = self.leverage(&instrument.id());
        let margin_rate = instrument.margin_init().to_f64().unwrap_or(0.0);
        Money::new(notional.as_f64() / leverage * margin_rate, notional.currency)
    }

    /// Calculates the maintenance (position) margin for the given exposure.
    #[must_use]
    pub fn calculate_maintenance_margin(
        &self,
        instrument: &InstrumentAny,
        quantity: Quantity,
        price: Price,
    ) -> Money {
        let notional = instrument.calculate_notional_value(quantity, price, None);
        let leverage = self.leverage(&instrument.id());
        let margin_rate = instrument.margin_maint().to_f64().unwrap_or(0.0);
        Money::new(notional.as_f64() / leverage * margin_rate, notional.currency)
    }

    /// Updates the margin balance for an instrument.
    pub fn update_margin(&mut self, margin: MarginBalance) {
        self.margins.insert(margin.instrument_id, margin);
    }

    /// Removes the margin balance for an instrument.
    pub fn clear_margin(&mut self, instrument_id: &InstrumentId) {
        self.margins.remove(instrument_id);
    }
}

impl Account for MarginAccount {
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
        for margin in &event.margins {
            self.margins.insert(margin.instrument_id, *margin);
        }
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

impl Deref for MarginAccount {
    type Target = BaseAccount;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for MarginAccount {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl Display for MarginAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(id={}, type={}, base={})",
            stringify!(MarginAccount),
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
    use crate::stubs::{audusd_sim, instrument_any};

    fn margin_account() -> MarginAccount {
        let total = Money::new(1_000_000.0, Currency::USD());
        MarginAccount::new(AccountState::new(
            AccountId::new("SIM-001"),
            AccountType::Margin,
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

    #[rstest]
    fn test_leverage_defaults() {
        let mut account = margin_account();
        let instrument_id = InstrumentId::from("AUD/USD.SIM");
        assert_eq!(account.leverage(&instrument_id), 1.0);

        account.set_default_leverage(10.0);
        assert_eq!(account.leverage(&instrument_id), 10.0);

        account.set_leverage(instrument_id, 50.0);
        assert_eq!(account.leverage(&instrument_id), 50.0);
    }

    #[rstest]
    fn test_calculate_initial_margin(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut account = margin_account();
        account.set_default_leverage(50.0);

        let margin = account.calculate_initial_margin(
            &instrument,
            Quantity::from(100_000_u32),
            Price::from("0.75000"),
        );
        // notional 75_000 / leverage 50 * margin_init 0.03 = 45 USD
        assert_eq!(margin, Money::new(45.0, Currency::USD()));
    }

    #[rstest]
    fn test_update_and_clear_margin() {
        let mut account = margin_account();
        let instrument_id = InstrumentId::from("AUD/USD.SIM");
        let margin = MarginBalance::new(
            Money::new(45.0, Currency::USD()),
            Money::new(15.0, Currency::USD()),
            instrument_id,
        );
        account.update_margin(margin);
        assert_eq!(account.margin(&instrument_id), Some(&margin));

        account.clear_margin(&instrument_id);
        assert!(account.margin(&instrument_id).is_none());
    }
}
