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

//! Represents a price in a market with a fixed decimal precision.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use meridian_core::correctness::FAILED;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::fixed::{
    FIXED_PRECISION, FIXED_SCALAR, check_fixed_precision, f64_to_fixed_i64, fixed_i64_from_str,
    fixed_i64_to_f64, precision_from_str,
};

/// The maximum representable price value.
pub const PRICE_MAX: f64 = 9_223_372_036.0;

/// The minimum representable price value.
pub const PRICE_MIN: f64 = -9_223_372_036.0;

/// Represents a price in a market with a fixed decimal precision.
///
/// The raw value is an integer mantissa scaled to [`FIXED_PRECISION`] so that
/// prices of differing display precisions compare exactly.
#[repr(C)]
#[derive(Clone, Copy, Eq)]
pub struct Price {
    /// The raw fixed-point value scaled to `FIXED_PRECISION`.
    pub raw: i64,
    /// The decimal precision for display and tick arithmetic.
    pub precision: u8,
}

impl Price {
    /// Creates a new [`Price`] instance from an `f64`, rounding half-to-even
    /// at the given `precision`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is out of range or `precision` is invalid.
    pub fn new_checked(value: f64, precision: u8) -> anyhow::Result<Self> {
        check_fixed_precision(precision)?;
        if value.is_nan() || !(PRICE_MIN..=PRICE_MAX).contains(&value) {
            anyhow::bail!("invalid f64 for 'value' not in range [{PRICE_MIN}, {PRICE_MAX}], was {value}");
        }
        Ok(Self {
            raw: f64_to_fixed_i64(value, precision),
            precision,
        })
    }

    /// Creates a new [`Price`] instance from an `f64`.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails (see [`Price::new_checked`]).
    #[must_use]
    pub fn new(value: f64, precision: u8) -> Self {
        Self::new_checked(value, precision).expect(FAILED)
    }

    /// Creates a new [`Price`] instance from a raw fixed-point mantissa.
    ///
    /// # Panics
    ///
    /// Panics if `precision` is invalid.
    #[must_use]
    pub fn from_raw(raw: i64, precision: u8) -> Self {
        check_fixed_precision(precision).expect(FAILED);
        Self { raw, precision }
    }

    /// Creates a new [`Price`] instance of zero at the given `precision`.
    #[must_use]
    pub fn zero(precision: u8) -> Self {
        check_fixed_precision(precision).expect(FAILED);
        Self { raw: 0, precision }
    }

    /// Creates a new maximum-value [`Price`] at the given `precision`.
    #[must_use]
    pub fn max(precision: u8) -> Self {
        check_fixed_precision(precision).expect(FAILED);
        Self {
            raw: f64_to_fixed_i64(PRICE_MAX, 0),
            precision,
        }
    }

    /// Creates a new minimum-value [`Price`] at the given `precision`.
    #[must_use]
    pub fn min(precision: u8) -> Self {
        check_fixed_precision(precision).expect(FAILED);
        Self {
            raw: f64_to_fixed_i64(PRICE_MIN, 0),
            precision,
        }
    }

    /// Returns whether the price is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Returns whether the price is positive (> 0).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.raw > 0
    }

    /// Returns the value as an `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        fixed_i64_to_f64(self.raw)
    }

    /// Returns the value as an exact `Decimal` at the display precision.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        let rescaled = self.raw / 10_i64.pow(u32::from(FIXED_PRECISION - self.precision));
        Decimal::new(rescaled, u32::from(self.precision))
    }

    /// Returns a formatted string with thousands separated by underscores.
    #[must_use]
    pub fn to_formatted_string(&self) -> String {
        insert_thousands_separators(&self.to_string())
    }
}

pub(crate) fn insert_thousands_separators(value: &str) -> String {
    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('_');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

impl FromStr for Price {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let precision = precision_from_str(value)?;
        let raw = fixed_i64_from_str(value, precision)?;
        Ok(Self { raw, precision })
    }
}

impl From<&str> for Price {
    /// Creates a [`Price`] from a decimal string, inferring the precision.
    ///
    /// # Panics
    ///
    /// Panics if the string is not a valid decimal.
    fn from(value: &str) -> Self {
        Self::from_str(value).expect(FAILED)
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for Price {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            raw: self
                .raw
                .checked_add(rhs.raw)
                .expect("Overflow occurred when adding `Price`"),
            precision: self.precision,
        }
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            raw: self
                .raw
                .checked_sub(rhs.raw)
                .expect("Underflow occurred when subtracting `Price`"),
            precision: self.precision,
        }
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, other: Self) {
        self.raw = self
            .raw
            .checked_add(other.raw)
            .expect("Overflow occurred when adding `Price`");
    }
}

impl SubAssign for Price {
    fn sub_assign(&mut self, other: Self) {
        self.raw = self
            .raw
            .checked_sub(other.raw)
            .expect("Underflow occurred when subtracting `Price`");
    }
}

impl Neg for Price {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            raw: -self.raw,
            precision: self.precision,
        }
    }
}

impl Debug for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({self})", stringify!(Price))
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.*}",
            usize::from(self.precision),
            self.raw as f64 / FIXED_SCALAR,
        )
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value_str = String::deserialize(deserializer)?;
        Self::from_str(&value_str).map_err(serde::de::Error::custom)
    }
}
