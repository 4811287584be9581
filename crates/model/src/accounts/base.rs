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

//! The common account state shared by all account implementations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    enums::{AccountType, OrderSide},
    events::{AccountState, OrderFilled},
    identifiers::AccountId,
    instruments::{Instrument, InstrumentAny},
    position::Position,
    types::{AccountBalance, Currency, Money},
};

/// The common account state shared by all account implementations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseAccount {
    /// The account ID.
    pub id: AccountId,
    /// The account type.
    pub account_type: AccountType,
    /// The base currency for single-currency accounts.
    pub base_currency: Option<Currency>,
    /// The applied account state events.
    pub events: Vec<AccountState>,
    /// The account balances per currency.
    pub balances: HashMap<Currency, AccountBalance>,
    /// The starting balances per currency.
    pub balances_starting: HashMap<Currency, Money>,
    /// The accumulated commissions per currency.
    pub commissions: HashMap<Currency, f64>,
}

impl BaseAccount {
    /// Creates a new [`BaseAccount`] instance from an initial state `event`.
    #[must_use]
    pub fn new(event: AccountState) -> Self {
        let mut balances_starting = HashMap::new();
        let mut balances = HashMap::new();
        for balance in &event.balances {
            balances_starting.insert(balance.currency, balance.total);
            balances.insert(balance.currency, *balance);
        }
        Self {
            id: event.account_id,
            account_type: event.account_type,
            base_currency: event.base_currency,
            events: vec![event],
            balances,
            balances_starting,
            commissions: HashMap::new(),
        }
    }

    /// Returns the balance for the specified currency (or the base currency).
    ///
    /// # Panics
    ///
    /// Panics if `currency` is `None` and the account has no base currency.
    #[must_use]
    pub fn base_balance(&self, currency: Option<Currency>) -> Option<&AccountBalance> {
        let currency = currency
            .or(self.base_currency)
            .expect("Currency must be specified");
        self.balances.get(&currency)
    }

    /// Returns the total balance for the specified currency (or the base currency).
    #[must_use]
    pub fn base_balance_total(&self, currency: Option<Currency>) -> Option<Money> {
        self.base_balance(currency).map(|balance| balance.total)
    }

    /// Returns the total balances per currency.
    #[must_use]
    pub fn base_balances_total(&self) -> HashMap<Currency, Money> {
        self.balances
            .iter()
            .map(|(currency, balance)| (*currency, balance.total))
            .collect()
    }

    /// Returns the free balance for the specified currency (or the base currency).
    #[must_use]
    pub fn base_balance_free(&self, currency: Option<Currency>) -> Option<Money> {
        self.base_balance(currency).map(|balance| balance.free)
    }

    /// Returns the locked balance for the specified currency (or the base currency).
    #[must_use]
    pub fn base_balance_locked(&self, currency: Option<Currency>) -> Option<Money> {
        self.base_balance(currency).map(|balance| balance.locked)
    }

    /// Updates the account balances in place.
    ///
    /// # Panics
    ///
    /// Panics if any updated balance has a negative total.
    pub fn update_balances(&mut self, balances: Vec<AccountBalance>) {
        for balance in balances {
            if balance.total.raw < 0 {
                panic!("Account balance total for {} was negative", balance.currency);
            }
            self.balances.insert(balance.currency, balance);
        }
    }

    /// Accumulates the given `commission` into the account totals.
    pub fn update_commissions(&mut self, commission: Money) {
        if commission.is_zero() {
            return;
        }
        let total = self
            .commissions
            .get(&commission.currency)
            .copied()
            .unwrap_or(0.0);
        self.commissions
            .insert(commission.currency, total + commission.as_f64());
    }

    /// Applies the given account state `event`.
    pub fn base_apply(&mut self, event: AccountState) {
        self.update_balances(event.balances.clone());
        self.events.push(event);
    }

    /// Returns the last applied account state event.
    #[must_use]
    pub fn base_last_event(&self) -> Option<AccountState> {
        self.events.last().cloned()
    }

    /// Calculates the balance impacts of the given `fill` (see
    /// [`crate::accounts::Account::calculate_pnls`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the fill side is unspecified.
    pub fn base_calculate_pnls(
        &self,
        instrument: &InstrumentAny,
        fill: &OrderFilled,
        position: Option<&Position>,
    ) -> anyhow::Result<Vec<Money>> {
        let mut pnls: HashMap<Currency, Money> = HashMap::new();
        let base_currency = instrument.base_currency();

        let fill_qty = position.map_or(fill.last_qty, |pos| pos.quantity.min(fill.last_qty));
        let notional = instrument.calculate_notional_value(fill_qty, fill.last_px, None);

        match fill.order_side {
            OrderSide::Buy => {
                if let (Some(base_currency), None) = (base_currency, self.base_currency) {
                    pnls.insert(base_currency, Money::new(fill_qty.as_f64(), base_currency));
                }
                pnls.insert(notional.currency, -notional);
            }
            OrderSide::Sell => {
                if let (Some(base_currency), None) = (base_currency, self.base_currency) {
                    pnls.insert(base_currency, Money::new(-fill_qty.as_f64(), base_currency));
                }
                pnls.insert(notional.currency, notional);
            }
            OrderSide::NoOrderSide => anyhow::bail!("Fill order side was `NoOrderSide`"),
        }
        Ok(pnls.into_values().collect())
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

    fn cash_account_state() -> AccountState {
        let total = Money::new(1_000_000.0, Currency::USD());
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

    #[rstest]
    fn test_new() {
        let account = BaseAccount::new(cash_account_state());
        assert_eq!(account.id, AccountId::new("SIM-001"));
        assert_eq!(
            account.base_balance_total(None),
            Some(Money::new(1_000_000.0, Currency::USD()))
        );
        assert_eq!(account.events.len(), 1);
    }

    #[rstest]
    fn test_apply_updates_balances() {
        let mut account = BaseAccount::new(cash_account_state());
        let total = Money::new(925_000.0, Currency::USD());
        let event = AccountState::new(
            account.id,
            AccountType::Cash,
            account.base_currency,
            vec![AccountBalance::new(
                total,
                Money::zero(Currency::USD()),
                total,
            )],
            vec![],
            false,
            UUID4::new(),
            UnixNanos::from(1),
            UnixNanos::from(1),
        );
        account.base_apply(event);
        assert_eq!(account.base_balance_total(None), Some(total));
        assert_eq!(account.events.len(), 2);
    }

    #[rstest]
    #[should_panic(expected = "was negative")]
    fn test_negative_balance_panics() {
        let mut account = BaseAccount::new(cash_account_state());
        let negative = Money::new(-1.0, Currency::USD());
        account.update_balances(vec![AccountBalance {
            total: negative,
            locked: Money::zero(Currency::USD()),
            free: negative,
            currency: Currency::USD(),
        }]);
    }
}
