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

//! A tagged sum type covering all account types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    accounts::{Account, CashAccount, MarginAccount},
    enums::AccountType,
    events::{AccountState, OrderFilled},
    identifiers::AccountId,
    instruments::InstrumentAny,
    position::Position,
    types::{AccountBalance, Currency, Money},
};

/// A tagged sum type covering all account types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountAny {
    /// An account with unleveraged cash assets only.
    Cash(CashAccount),
    /// An account which facilitates trading on margin.
    Margin(MarginAccount),
}

impl AccountAny {
    /// Creates a new account of the appropriate type from an initial state
    /// `event`.
    #[must_use]
    pub fn from_state(event: AccountState) -> Self {
        match event.account_type {
            AccountType::Cash => Self::Cash(CashAccount::new(event)),
            AccountType::Margin => Self::Margin(MarginAccount::new(event)),
        }
    }
}

impl Account for AccountAny {
    fn id(&self) -> AccountId {
        match self {
            Self::Cash(account) => account.id(),
            Self::Margin(account) => account.id(),
        }
    }

    fn account_type(&self) -> AccountType {
        match self {
            Self::Cash(account) => account.account_type(),
            Self::Margin(account) => account.account_type(),
        }
    }

    fn base_currency(&self) -> Option<Currency> {
        match self {
            Self::Cash(account) => account.base_currency(),
            Self::Margin(account) => account.base_currency(),
        }
    }

    fn balances(&self) -> HashMap<Currency, AccountBalance> {
        match self {
            Self::Cash(account) => account.balances(),
            Self::Margin(account) => account.balances(),
        }
    }

    fn starting_balances(&self) -> HashMap<Currency, Money> {
        match self {
            Self::Cash(account) => account.starting_balances(),
            Self::Margin(account) => account.starting_balances(),
        }
    }

    fn balance(&self, currency: Option<Currency>) -> Option<&AccountBalance> {
        match self {
            Self::Cash(account) => account.balance(currency),
            Self::Margin(account) => account.balance(currency),
        }
    }

    fn balance_total(&self, currency: Option<Currency>) -> Option<Money> {
        match self {
            Self::Cash(account) => account.balance_total(currency),
            Self::Margin(account) => account.balance_total(currency),
        }
    }

    fn balances_total(&self) -> HashMap<Currency, Money> {
        match self {
            Self::Cash(account) => account.balances_total(),
            Self::Margin(account) => account.balances_total(),
        }
    }

    fn balance_free(&self, currency: Option<Currency>) -> Option<Money> {
        match self {
            Self::Cash(account) => account.balance_free(currency),
            Self::Margin(account) => account.balance_free(currency),
        }
    }

    fn balance_locked(&self, currency: Option<Currency>) -> Option<Money> {
        match self {
            Self::Cash(account) => account.balance_locked(currency),
            Self::Margin(account) => account.balance_locked(currency),
        }
    }

    fn events(&self) -> Vec<AccountState> {
        match self {
            Self::Cash(account) => account.events(),
            Self::Margin(account) => account.events(),
        }
    }

    fn last_event(&self) -> Option<AccountState> {
        match self {
            Self::Cash(account) => account.last_event(),
            Self::Margin(account) => account.last_event(),
        }
    }

    fn event_count(&self) -> usize {
        match self {
            Self::Cash(account) => account.event_count(),
            Self::Margin(account) => account.event_count(),
        }
    }

    fn currencies(&self) -> Vec<Currency> {
        match self {
            Self::Cash(account) => account.currencies(),
            Self::Margin(account) => account.currencies(),
        }
    }

    fn apply(&mut self, event: AccountState) {
        match self {
            Self::Cash(account) => account.apply(event),
            Self::Margin(account) => account.apply(event),
        }
    }

    fn calculate_pnls(
        &self,
        instrument: &InstrumentAny,
        fill: &OrderFilled,
        position: Option<&Position>,
    ) -> anyhow::Result<Vec<Money>> {
        match self {
            Self::Cash(account) => account.calculate_pnls(instrument, fill, position),
            Self::Margin(account) => account.calculate_pnls(instrument, fill, position),
        }
    }
}

impl From<CashAccount> for AccountAny {
    fn from(account: CashAccount) -> Self {
        Self::Cash(account)
    }
}

impl From<MarginAccount> for AccountAny {
    fn from(account: MarginAccount) -> Self {
        Self::Margin(account)
    }
}
