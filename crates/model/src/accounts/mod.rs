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

//! Account types (cash and margin), mutated solely by `AccountState` events.

pub mod any;
pub mod base;
pub mod cash;
pub mod margin;

use std::collections::HashMap;

pub use any::AccountAny;
pub use base::BaseAccount;
pub use cash::CashAccount;
pub use margin::MarginAccount;

use crate::{
    enums::AccountType,
    events::{AccountState, OrderFilled},
    identifiers::AccountId,
    instruments::InstrumentAny,
    position::Position,
    types::{AccountBalance, Currency, Money},
};

/// The interface implemented by all account types.
pub trait Account: 'static {
    /// Returns the account ID.
    fn id(&self) -> AccountId;
    /// Returns the account type.
    fn account_type(&self) -> AccountType;
    /// Returns the base currency for single-currency accounts.
    fn base_currency(&self) -> Option<Currency>;
    /// Returns the account balances per currency.
    fn balances(&self) -> HashMap<Currency, AccountBalance>;
    /// Returns the starting balances per currency.
    fn starting_balances(&self) -> HashMap<Currency, Money>;
    /// Returns the balance for the given currency (or the base currency).
    fn balance(&self, currency: Option<Currency>) -> Option<&AccountBalance>;
    /// Returns the total balance for the given currency (or the base currency).
    fn balance_total(&self, currency: Option<Currency>) -> Option<Money>;
    /// Returns the total balances per currency.
    fn balances_total(&self) -> HashMap<Currency, Money>;
    /// Returns the free balance for the given currency (or the base currency).
    fn balance_free(&self, currency: Option<Currency>) -> Option<Money>;
    /// Returns the locked balance for the given currency (or the base currency).
    fn balance_locked(&self, currency: Option<Currency>) -> Option<Money>;
    /// Returns the applied account state events.
    fn events(&self) -> Vec<AccountState>;
    /// Returns the last applied account state event.
    fn last_event(&self) -> Option<AccountState>;
    /// Returns the count of applied events.
    fn event_count(&self) -> usize;
    /// Returns the currencies held by the account.
    fn currencies(&self) -> Vec<Currency>;

    /// Applies the given account state `event`.
    fn apply(&mut self, event: AccountState);

    /// Calculates the balance impacts of the given `fill`.
    ///
    /// Returns one `Money` per impacted currency; a quote-currency leg for the
    /// notional flow and (for multi-currency accounts) a base-currency leg for
    /// the asset flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the fill side is unspecified.
    fn calculate_pnls(
        &self,
        instrument: &InstrumentAny,
        fill: &OrderFilled,
        position: Option<&Position>,
    ) -> anyhow::Result<Vec<Money>>;
}
