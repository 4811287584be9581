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

//! Represents a quantity with a non-negative value and fixed decimal precision.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use meridian_core::correctness::FAILED;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{
    fixed::{
        FIXED_PRECISION, FIXED_SCALAR, check_fixed_precision, f64_to_fixed_u64,
        fixed_u64_from_str, fixed_u64_to_f64, precision_from_str,
    },
    price::insert_thousands_separators,
};

/// The maximum representable quantity value.
pub const QUANTITY_MAX: f64 = 18_446_744_073.0;

/// Represents a quantity with a non-negative value and fixed decimal precision.
///
/// The raw value is an integer mantissa scaled to [`FIXED_PRECISION`] so that
/// quantities of differing display precisions compare exactly.
#[repr(C)]
#[derive(Clone, Copy, Eq)]
pub struct Quantity {
    /// The raw fixed-point value scaled to `FIXED_PRECISION`.
    pub raw: u64,
    /// The decimal precision for display and lot arithmetic.
    pub precision: u8,
}

impl Quantity {
    /// Creates a new [`Quantity`] instance from an `f64`, rounding half-to-even
    /// at the given `precision`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is negative, out of range, or `precision`
    /// is invalid.
    pub fn new_checked(value: f64, precision: u8) -> anyhow::Result<Self> {
        check_fixed_precision(precision)?;
        if value.is_nan() || !(0.0..=QUANTITY_MAX).contains(&value) {
            anyhow::bail!("invalid f64 for 'value' not in range [0, {QUANTITY_MAX}], was {value}");
        }
        Ok(Self {
            raw: f64_to_fixed_u64(value, precision),
            precision,
        })
    }

    /// Creates a new [`Quantity`] instance from an `f64`.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails (see [`Quantity::new_checked`]).
    #[must_use]
    pub fn new(value: f64, precision: u8) -> Self {
        Self::new_checked(value, precision).expect(FAILED)
    }

    /// Creates a new [`Quantity`] instance from a raw fixed-point mantissa.
    ///
    /// # Panics
    ///
    /// Panics if `precision` is invalid.
    #[must_use]
    pub fn from_raw(raw: u64, precision: u8) -> Self {
        check_fixed_precision(precision).expect(FAILED);
        Self { raw, precision }
    }

    /// Creates a new [`Quantity`] instance of zero at the given `precision`.
    #[must_use]
    pub fn zero(precision: u8) -> Self {
        check_fixed_precision(precision).expect(FAILED);
        Self { raw: 0, precision }
    }

    /// Returns whether the quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Returns whether the quantity is positive (> 0).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.raw > 0
    }

    /// Returns the value as an `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        fixed_u64_to_f64(self.raw)
    }

    /// Returns the value as an exact `Decimal` at the display precision.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        let rescaled = self.raw / 10_u64.pow(u32::from(FIXED_PRECISION - self.precision));
        Decimal::new(rescaled as i64, u32::from(self.precision))
    }

    /// Returns a formatted string with thousands separated by underscores.
    #[must_use]
    pub fn to_formatted_string(&self) -> String {
        insert_thousands_separators(&self.to_string())
    }

    /// Returns the minimum of two quantities.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.raw <= other.raw { self } else { other }
    }

    /// Saturating subtraction clamping at zero, retaining this precision.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self {
            raw: self.raw.saturating_sub(other.raw),
            precision: self.precision,
        }
    }
}

impl FromStr for Quantity {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let precision = precision_from_str(value)?;
        let raw = fixed_u64_from_str(value, precision)?;
        Ok(Self { raw, precision })
    }
}

impl From<&str> for Quantity {
    /// Creates a [`Quantity`] from a decimal string, inferring the precision.
    ///
    /// # Panics
    ///
    /// Panics if the string is not a valid non-negative decimal.
    fn from(value: &str) -> Self {
        Self::from_str(value).expect(FAILED)
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self::from_raw(u64::from(value) * (FIXED_SCALAR as u64), 0)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self::from_raw(
            value
                .checked_mul(FIXED_SCALAR as u64)
                .expect("Overflow occurred when creating `Quantity`"),
            0,
        )
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            raw: self
                .raw
                .checked_add(rhs.raw)
                .expect("Overflow occurred when adding `Quantity`"),
            precision: self.precision,
        }
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            raw: self
                .raw
                .checked_sub(rhs.raw)
                .expect("Underflow occurred when subtracting `Quantity`"),
            precision: self.precision,
        }
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, other: Self) {
        self.raw = self
            .raw
            .checked_add(other.raw)
            .expect("Overflow occurred when adding `Quantity`");
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, other: Self) {
        self.raw = self
            .raw
            .checked_sub(other.raw)
            .expect("Underflow occurred when subtracting `Quantity`");
    }
}

impl Debug for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({self})", stringify!(Quantity))
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.*}",
            usize::from(self.precision),
            self.raw as f64 / FIXED_SCALAR,
        )
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value_str = String::deserialize(deserializer)?;
        Self::from_str(&value_str).map_err(serde::de::Error::custom)
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
        let qty = Quantity::new(100_000.0, 0);
        assert_eq!(qty.as_f64(), 100_000.0);
        assert_eq!(qty.precision, 0);
        assert_eq!(qty.to_string(), "100000");
    }

    #[rstest]
    fn test_from_int() {
        assert_eq!(Quantity::from(100_000_u32), Quantity::new(100_000.0, 0));
    }

    #[rstest]
    fn test_negative_value_errors() {
        assert!(Quantity::new_checked(-1.0, 0).is_err());
    }

    #[rstest]
    fn test_zero() {
        assert!(Quantity::zero(0).is_zero());
        assert!(!Quantity::from(1_u32).is_zero());
    }

    #[rstest]
    fn test_arithmetic() {
        let a = Quantity::from(100_000_u32);
        let b = Quantity::from(30_000_u32);
        assert_eq!(a - b, Quantity::from(70_000_u32));
        assert_eq!(a + b, Quantity::from(130_000_u32));
        assert_eq!(a.min(b), b);
    }

    #[rstest]
    #[should_panic(expected = "Underflow occurred when subtracting `Quantity`")]
    fn test_sub_underflow_panics() {
        let _ = Quantity::from(1_u32) - Quantity::from(2_u32);
    }

    #[rstest]
    fn test_saturating_sub_clamps_at_zero() {
        let result = Quantity::from(1_u32).saturating_sub(Quantity::from(2_u32));
        assert!(result.is_zero());
    }

    #[rstest]
    fn test_fractional_precision() {
        let qty = Quantity::from("0.561");
        assert_eq!(qty.precision, 3);
        assert_eq!(qty.to_string(), "0.561");
    }

    #[rstest]
    fn test_to_formatted_string() {
        assert_eq!(
            Quantity::from(100_000_u32).to_formatted_string(),
            "100_000"
        );
    }

    #[rstest]
    fn test_serde_round_trip() {
        let qty = Quantity::from("0.561");
        let json = serde_json::to_string(&qty).unwrap();
        let parsed: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, qty);
        assert_eq!(parsed.precision, qty.precision);
    }
}
