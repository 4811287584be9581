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

//! Represents an amount of money in a specified currency denomination.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use meridian_core::correctness::FAILED;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    currency::Currency,
    fixed::{
        FIXED_PRECISION, FIXED_SCALAR, f64_to_fixed_i64, fixed_i64_from_str, fixed_i64_to_f64,
    },
    price::insert_thousands_separators,
};

/// The maximum representable money amount.
pub const MONEY_MAX: f64 = 9_223_372_036.0;

/// The minimum representable money amount.
pub const MONEY_MIN: f64 = -9_223_372_036.0;

/// Represents an amount of money in a specified currency denomination.
#[repr(C)]
#[derive(Clone, Copy, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The raw fixed-point amount scaled to `FIXED_PRECISION`.
    pub raw: i64,
    /// The denomination currency.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] instance from an `f64`, rounding half-to-even
    /// at the currency precision.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is out of range.
    pub fn new_checked(amount: f64, currency: Currency) -> anyhow::Result<Self> {
        if amount.is_nan() || !(MONEY_MIN..=MONEY_MAX).contains(&amount) {
            anyhow::bail!("invalid f64 for 'amount' not in range [{MONEY_MIN}, {MONEY_MAX}], was {amount}");
        }
        Ok(Self {
            raw: f64_to_fixed_i64(amount, currency.precision),
            currency,
        })
    }

    /// Creates a new [`Money`] instance from an `f64`.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails (see [`Money::new_checked`]).
    #[must_use]
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self::new_checked(amount, currency).expect(FAILED)
    }

    /// Creates a new [`Money`] instance from a raw fixed-point mantissa.
    #[must_use]
    pub const fn from_raw(raw: i64, currency: Currency) -> Self {
        Self { raw, currency }
    }

    /// Creates a new zero-amount [`Money`] in the given `currency`.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self { raw: 0, currency }
    }

    /// Returns whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Returns the amount as an `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        fixed_i64_to_f64(self.raw)
    }

    /// Returns the amount as an exact `Decimal` at the currency precision.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        let precision = self.currency.precision;
        let rescaled = self.raw / 10_i64.pow(u32::from(FIXED_PRECISION - precision));
        Decimal::new(rescaled, u32::from(precision))
    }

    /// Returns a formatted string with thousands separated by underscores.
    #[must_use]
    pub fn to_formatted_string(&self) -> String {
        let amount = format!(
            "{:.*}",
            usize::from(self.currency.precision),
            self.as_f64()
        );
        format!("{} {}", insert_thousands_separators(&amount), self.currency)
    }
}

impl FromStr for Money {
    type Err = anyhow::Error;

    /// Parses a [`Money`] from a string in the format `"amount currency"`
    /// (e.g. `"1000.00 USD"`). The amount may contain underscores.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (amount_str, currency_str) = value
            .rsplit_once(' ')
            .ok_or_else(|| anyhow::anyhow!(
                "Error parsing `Money` from '{value}': expected '<amount> <currency>' format"
            ))?;
        let currency = Currency::from_str(currency_str)?;
        let amount_str = amount_str.replace('_', "");
        let raw = fixed_i64_from_str(&amount_str, currency.precision)?;
        Ok(Self { raw, currency })
    }
}

impl From<&str> for Money {
    /// Creates a [`Money`] from an `"amount currency"` string.
    ///
    /// # Panics
    ///
    /// Panics if the string is not valid.
    fn from(value: &str) -> Self {
        Self::from_str(value).expect(FAILED)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency && self.raw == other.raw
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        assert_eq!(
            self.currency, other.currency,
            "Cannot compare `Money` of different currencies"
        );
        self.raw.cmp(&other.raw)
    }
}

impl Hash for Money {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
        self.currency.hash(state);
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        assert_eq!(
            self.currency, rhs.currency,
            "Cannot add `Money` of different currencies"
        );
        Self {
            raw: self
                .raw
                .checked_add(rhs.raw)
                .expect("Overflow occurred when adding `Money`"),
            currency: self.currency,
        }
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert_eq!(
            self.currency, rhs.currency,
            "Cannot subtract `Money` of different currencies"
        );
        Self {
            raw: self
                .raw
                .checked_sub(rhs.raw)
                .expect("Underflow occurred when subtracting `Money`"),
            currency: self.currency,
        }
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            raw: -self.raw,
            currency: self.currency,
        }
    }
}

impl Mul<f64> for Money {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.as_f64() * rhs, self.currency)
    }
}

impl Debug for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({self})", stringify!(Money))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.*} {}",
            usize::from(self.currency.precision),
            self.raw as f64 / FIXED_SCALAR,
            self.currency,
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
    fn test_new() {
        let money = Money::new(1_000_000.0, Currency::USD());
        assert_eq!(money.as_f64(), 1_000_000.0);
        assert_eq!(money.currency, Currency::USD());
        assert_eq!(money.to_string(), "1000000.00 USD");
    }

    #[rstest]
    fn test_from_str() {
        let money = Money::from("1_000_000.00 USD");
        assert_eq!(money, Money::new(1_000_000.0, Currency::USD()));
    }

    #[rstest]
    fn test_from_str_invalid_format() {
        assert!(Money::from_str("1000.00").is_err());
        assert!(Money::from_str("1000.00 XXXUNKNOWN").is_err());
    }

    #[rstest]
    fn test_arithmetic() {
        let a = Money::new(100.0, Currency::USD());
        let b = Money::new(25.0, Currency::USD());
        assert_eq!(a + b, Money::new(125.0, Currency::USD()));
        assert_eq!(a - b, Money::new(75.0, Currency::USD()));
        assert_eq!(-a, Money::new(-100.0, Currency::USD()));
        assert_eq!(a * 0.5, Money::new(50.0, Currency::USD()));
    }

    #[rstest]
    #[should_panic(expected = "Cannot add `Money` of different currencies")]
    fn test_add_different_currencies_panics() {
        let _ = Money::new(1.0, Currency::USD()) + Money::new(1.0, Currency::AUD());
    }

    #[rstest]
    fn test_jpy_precision() {
        let money = Money::new(1_000.5, Currency::JPY());
        // JPY has zero precision, rounds half-to-even
        assert_eq!(money.to_string(), "1000 JPY");
    }

    #[rstest]
    fn test_to_formatted_string() {
        assert_eq!(
            Money::new(1_000_000.0, Currency::USD()).to_formatted_string(),
            "1_000_000.00 USD"
        );
    }

    #[rstest]
    fn test_serde_round_trip() {
        let money = Money::new(75_000.0, Currency::USD());
        let json = serde_json::to_string(&money).unwrap();
        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, money);
    }
}
