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

//! Fixed-point mantissa conversions for the value types.
//!
//! Raw values are integer mantissas scaled to [`FIXED_PRECISION`] decimal digits
//! regardless of a value's display precision, so values of different precisions
//! compare and combine exactly.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// The scaled decimal precision for raw fixed-point mantissas.
pub const FIXED_PRECISION: u8 = 9;

/// The scalar between a fixed-point raw value and its `f64` representation.
pub const FIXED_SCALAR: f64 = 1_000_000_000.0; // 10.0**FIXED_PRECISION

/// Checks the given `precision` is representable in the fixed-point mantissa.
///
/// # Errors
///
/// Returns an error if `precision` exceeds [`FIXED_PRECISION`].
pub fn check_fixed_precision(precision: u8) -> anyhow::Result<()> {
    if precision > FIXED_PRECISION {
        anyhow::bail!("Condition failed: `precision` exceeded maximum `FIXED_PRECISION` (9), was {precision}")
    }
    Ok(())
}

/// Converts an `f64` value to a raw fixed-point `i64`, rounding half-to-even
/// at the given `precision`.
#[must_use]
pub fn f64_to_fixed_i64(value: f64, precision: u8) -> i64 {
    debug_assert!(precision <= FIXED_PRECISION);
    let pow1 = 10_i64.pow(u32::from(precision));
    let pow2 = 10_i64.pow(u32::from(FIXED_PRECISION - precision));
    let rounded = (value * pow1 as f64).round_ties_even() as i64;
    rounded * pow2
}

/// Converts an `f64` value to a raw fixed-point `u64`, rounding half-to-even
/// at the given `precision`.
#[must_use]
pub fn f64_to_fixed_u64(value: f64, precision: u8) -> u64 {
    debug_assert!(precision <= FIXED_PRECISION);
    let pow1 = 10_u64.pow(u32::from(precision));
    let pow2 = 10_u64.pow(u32::from(FIXED_PRECISION - precision));
    let rounded = (value * pow1 as f64).round_ties_even() as u64;
    rounded * pow2
}

/// Converts a raw fixed-point `i64` to an `f64`.
#[must_use]
pub fn fixed_i64_to_f64(value: i64) -> f64 {
    (value as f64) / FIXED_SCALAR
}

/// Converts a raw fixed-point `u64` to an `f64`.
#[must_use]
pub fn fixed_u64_to_f64(value: u64) -> f64 {
    (value as f64) / FIXED_SCALAR
}

/// Parses a decimal string into a raw fixed-point `i64`, applying banker's
/// (half-to-even) rounding at the given `precision`.
///
/// # Errors
///
/// Returns an error if `value` is not a valid decimal string, or the scaled
/// value overflows the mantissa.
pub fn fixed_i64_from_str(value: &str, precision: u8) -> anyhow::Result<i64> {
    let decimal = Decimal::from_str(value.trim())
        .map_err(|e| anyhow::anyhow!("Error parsing decimal string '{value}': {e}"))?;
    let rounded =
        decimal.round_dp_with_strategy(u32::from(precision), RoundingStrategy::MidpointNearestEven);
    let scaled = rounded
        .checked_mul(Decimal::from(10_i64.pow(u32::from(FIXED_PRECISION))))
        .ok_or_else(|| anyhow::anyhow!("Value '{value}' overflowed fixed-point mantissa"))?;
    scaled
        .to_i64()
        .ok_or_else(|| anyhow::anyhow!("Value '{value}' overflowed fixed-point mantissa"))
}

/// Parses a decimal string into a raw fixed-point `u64`, applying banker's
/// (half-to-even) rounding at the given `precision`.
///
/// # Errors
///
/// Returns an error if `value` is not a valid non-negative decimal string, or
/// the scaled value overflows the mantissa.
pub fn fixed_u64_from_str(value: &str, precision: u8) -> anyhow::Result<u64> {
    let raw = fixed_i64_from_str(value, precision)?;
    if raw < 0 {
        anyhow::bail!("Value '{value}' was negative");
    }
    Ok(raw as u64)
}

/// Returns the number of decimal digits in the given decimal string.
///
/// # Errors
///
/// Returns an error if `value` is not a valid decimal string.
pub fn precision_from_str(value: &str) -> anyhow::Result<u8> {
    let value = value.trim().to_ascii_lowercase();
    if value.contains('e') {
        anyhow::bail!("Scientific notation not supported, was '{value}'");
    }
    match value.split_once('.') {
        Some((_, decimals)) => Ok(decimals.len().min(usize::from(FIXED_PRECISION)) as u8),
        None => Ok(0),
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
    fn test_check_fixed_precision() {
        assert!(check_fixed_precision(0).is_ok());
        assert!(check_fixed_precision(FIXED_PRECISION).is_ok());
        assert!(check_fixed_precision(FIXED_PRECISION + 1).is_err());
    }

    #[rstest]
    #[case(0.0, 0, 0)]
    #[case(1.0, 0, 1_000_000_000)]
    #[case(1.5, 1, 1_500_000_000)]
    #[case(0.75, 5, 750_000_000)]
    #[case(-1.5, 1, -1_500_000_000)]
    fn test_f64_to_fixed_i64(#[case] value: f64, #[case] precision: u8, #[case] expected: i64) {
        assert_eq!(f64_to_fixed_i64(value, precision), expected);
    }

    #[rstest]
    #[case("0.25", 1, 200_000_000)] // Half-to-even rounds down to 0.2
    #[case("0.35", 1, 400_000_000)] // Half-to-even rounds up to 0.4
    fn test_bankers_rounding_from_str(
        #[case] value: &str,
        #[case] precision: u8,
        #[case] expected: i64,
    ) {
        assert_eq!(fixed_i64_from_str(value, precision).unwrap(), expected);
    }

    #[rstest]
    fn test_fixed_round_trip() {
        let raw = f64_to_fixed_i64(0.75001, 5);
        assert_eq!(fixed_i64_to_f64(raw), 0.75001);
    }

    #[rstest]
    fn test_fixed_u64_from_str_negative_errors() {
        assert!(fixed_u64_from_str("-1.0", 1).is_err());
    }

    #[rstest]
    #[case("1", 0)]
    #[case("1.0", 1)]
    #[case("0.75000", 5)]
    #[case("  2.50 ", 2)]
    fn test_precision_from_str(#[case] value: &str, #[case] expected: u8) {
        assert_eq!(precision_from_str(value).unwrap(), expected);
    }

    #[rstest]
    fn test_precision_from_str_scientific_errors() {
        assert!(precision_from_str("1e-5").is_err());
    }
}
