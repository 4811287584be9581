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

//! Account balance types.

use std::fmt::{Display, Formatter};

use meridian_core::correctness::FAILED;
use serde::{Deserialize, Serialize};

use crate::{
    identifiers::InstrumentId,
    types::{currency::Currency, money::Money},
};

/// Represents an account balance denominated in a particular currency.
///
/// Maintains the invariant `total = locked + free`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The total account balance.
    pub total: Money,
    /// The account balance locked (assigned to pending orders).
    pub locked: Money,
    /// The account balance free for trading.
    pub free: Money,
    /// The balance currency.
    pub currency: Currency,
}

impl AccountBalance {
    /// Creates a new [`AccountBalance`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the currencies are inconsistent, or if
    /// `total != locked + free`.
    pub fn new_checked(total: Money, locked: Money, free: Money) -> anyhow::Result<Self> {
        if total.currency != locked.currency || total.currency != free.currency {
            anyhow::bail!(
                "Currency mismatch: total={}, locked={}, free={}",
                total.currency,
                locked.currency,
                free.currency
            );
        }
        if total.raw != locked.raw + free.raw {
            anyhow::bail!(
                "Balance invariant violated: total {total} != locked {locked} + free {free}"
            );
        }
        Ok(Self {
            total,
            locked,
            free,
            currency: total.currency,
        })
    }

    /// Creates a new [`AccountBalance`] instance.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails (see [`AccountBalance::new_checked`]).
    #[must_use]
    pub fn new(total: Money, locked: Money, free: Money) -> Self {
        Self::new_checked(total, locked, free).expect(FAILED)
    }
}

impl Display for AccountBalance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(total={}, locked={}, free={})",
            stringify!(AccountBalance),
            self.total,
            self.locked,
            self.free,
        )
    }
}

/// Represents the margin balance for an instrument on a margin account.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBalance {
    /// The initial (order) margin requirement.
    pub initial: Money,
    /// The maintenance (position) margin requirement.
    pub maintenance: Money,
    /// The instrument the margin is for.
    pub instrument_id: InstrumentId,
    /// The margin currency.
    pub currency: Currency,
}

impl MarginBalance {
    /// Creates a new [`MarginBalance`] instance.
    ///
    /// # Panics
    ///
    /// Panics if the initial and maintenance currencies differ.
    #[must_use]
    pub fn new(initial: Money, maintenance: Money, instrument_id: InstrumentId) -> Self {
        assert_eq!(
            initial.currency, maintenance.currency,
            "Margin currency mismatch"
        );
        Self {
            initial,
            maintenance,
            instrument_id,
            currency: initial.currency,
        }
    }
}

impl Display for MarginBalance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(initial={}, maintenance={}, instrument_id={})",
            stringify!(MarginBalance),
            self.initial,
            self.maintenance,
            self.instrument_id,
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

    #[rstest]
    fn test_account_balance_new() {
        let balance = AccountBalance::new(
            Money::new(1_000_000.0, Currency::USD()),
            Money::new(0.0, Currency::USD()),
            Money::new(1_000_000.0, Currency::USD()),
        );
        assert_eq!(balance.currency, Currency::USD());
        assert_eq!(balance.total, Money::new(1_000_000.0, Currency::USD()));
    }

    #[rstest]
    fn test_account_balance_invariant_violated() {
        let result = AccountBalance::new_checked(
            Money::new(100.0, Currency::USD()),
            Money::new(10.0, Currency::USD()),
            Money::new(100.0, Currency::USD()),
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_account_balance_currency_mismatch() {
        let result = AccountBalance::new_checked(
            Money::new(100.0, Currency::USD()),
            Money::new(0.0, Currency::AUD()),
            Money::new(100.0, Currency::USD()),
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_serde_round_trip() {
        let balance = AccountBalance::new(
            Money::new(100.0, Currency::USD()),
            Money::new(25.0, Currency::USD()),
            Money::new(75.0, Currency::USD()),
        );
        let json = serde_json::to_string(&balance).unwrap();
        let parsed: AccountBalance = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, balance);
    }
}
