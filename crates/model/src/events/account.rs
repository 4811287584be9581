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

//! Account state events.

use std::fmt::{Display, Formatter};

use meridian_core::{UUID4, UnixNanos};
use serde::{Deserialize, Serialize};

use crate::{
    enums::AccountType,
    identifiers::AccountId,
    types::{AccountBalance, Currency, MarginBalance},
};

/// Represents an event which includes information on the state of the account.
///
/// Accounts are mutated solely by applying these events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// The account ID (venue issuer and number).
    pub account_id: AccountId,
    /// The account type (CASH or MARGIN).
    pub account_type: AccountType,
    /// The base currency for single-currency accounts, `None` for multi-currency.
    pub base_currency: Option<Currency>,
    /// The account balances per currency.
    pub balances: Vec<AccountBalance>,
    /// The margin balances per instrument (margin accounts).
    pub margins: Vec<MarginBalance>,
    /// Whether the state was reported by the venue (as opposed to calculated).
    pub is_reported: bool,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event occurred.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl AccountState {
    /// Creates a new [`AccountState`] instance.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        account_id: AccountId,
        account_type: AccountType,
        base_currency: Option<Currency>,
        balances: Vec<AccountBalance>,
        margins: Vec<MarginBalance>,
        is_reported: bool,
        event_id: UUID4,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            account_id,
            account_type,
            base_currency,
            balances,
            margins,
            is_reported,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl Display for AccountState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let balances = self
            .balances
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        write!(
            f,
            "{}(account_id={}, account_type={}, balances=[{balances}], is_reported={})",
            stringify!(AccountState),
            self.account_id,
            self.account_type,
            self.is_reported,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::types::Money;

    fn account_state() -> AccountState {
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
        let state = account_state();
        assert_eq!(state.account_id, AccountId::new("SIM-001"));
        assert_eq!(state.balances.len(), 1);
        assert!(state.margins.is_empty());
    }

    #[rstest]
    fn test_serde_round_trip() {
        let state = account_state();
        let json = serde_json::to_string(&state).unwrap();
        let parsed: AccountState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
