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

//! Functions for correctness checks similar to the *design by contract* philosophy.
//!
//! This module provides validation checking of function or method conditions.
//!
//! A condition is a predicate which must be true just prior to the execution of
//! some section of code - for correct behavior as per the design specification.
//!
//! An [`anyhow::Result`] is returned with a descriptive message when the
//! condition check fails.

use std::fmt::Display;

/// A message prefix that can be used with calls to `expect` or other assertion-related
/// functions when a predicate not holding is a programming error.
pub const FAILED: &str = "Condition failed";

/// Checks the `predicate` is true.
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_predicate_true(predicate: bool, fail_msg: &str) -> anyhow::Result<()> {
    if !predicate {
        anyhow::bail!("{fail_msg}")
    }
    Ok(())
}

/// Checks the `predicate` is false.
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_predicate_false(predicate: bool, fail_msg: &str) -> anyhow::Result<()> {
    if predicate {
        anyhow::bail!("{fail_msg}")
    }
    Ok(())
}

/// Checks the string `s` has semantic meaning: non-empty, not all whitespace,
/// and only ASCII characters.
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_valid_string<T: AsRef<str>>(s: T, param: &str) -> anyhow::Result<()> {
    let s = s.as_ref();

    if s.is_empty() {
        anyhow::bail!("invalid string for '{param}', was empty");
    }
    if s.chars().all(char::is_whitespace) {
        anyhow::bail!("invalid string for '{param}', was all whitespace");
    }
    if !s.is_ascii() {
        anyhow::bail!("invalid string for '{param}' contained non-ASCII chars, was '{s}'");
    }
    Ok(())
}

/// Checks the string `s` contains the pattern `pat`.
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_string_contains(s: &str, pat: &str, param: &str) -> anyhow::Result<()> {
    if !s.contains(pat) {
        anyhow::bail!("invalid string for '{param}' did not contain '{pat}', was '{s}'");
    }
    Ok(())
}

/// Checks the `u64` value is positive (> 0).
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_positive_u64(value: u64, param: &str) -> anyhow::Result<()> {
    if value == 0 {
        anyhow::bail!("invalid u64 for '{param}' not positive, was {value}");
    }
    Ok(())
}

/// Checks the `i64` value is positive (> 0).
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_positive_i64(value: i64, param: &str) -> anyhow::Result<()> {
    if value <= 0 {
        anyhow::bail!("invalid i64 for '{param}' not positive, was {value}");
    }
    Ok(())
}

/// Checks the `f64` value is in the inclusive range [`lo`, `hi`].
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_in_range_inclusive_f64(value: f64, lo: f64, hi: f64, param: &str) -> anyhow::Result<()> {
    if value.is_nan() || value.is_infinite() {
        anyhow::bail!("invalid f64 for '{param}', was {value}");
    }
    if value < lo || value > hi {
        anyhow::bail!("invalid f64 for '{param}' not in range [{lo}, {hi}], was {value}");
    }
    Ok(())
}

/// Checks the `u8` value is in the inclusive range [`lo`, `hi`].
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_in_range_inclusive_u8(value: u8, lo: u8, hi: u8, param: &str) -> anyhow::Result<()> {
    if value < lo || value > hi {
        anyhow::bail!("invalid u8 for '{param}' not in range [{lo}, {hi}], was {value}");
    }
    Ok(())
}

/// Checks the two values are equal.
///
/// # Errors
///
/// Returns an error if the validation check fails.
#[inline(always)]
pub fn check_equal<T: PartialEq + Display>(
    lhs: T,
    rhs: T,
    lhs_param: &str,
    rhs_param: &str,
) -> anyhow::Result<()> {
    if lhs != rhs {
        anyhow::bail!(
            "'{lhs_param}' value of {lhs} was not equal to '{rhs_param}' value of {rhs}"
        );
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(true, true)]
    #[case(false, false)]
    fn test_check_predicate_true(#[case] predicate: bool, #[case] expected: bool) {
        assert_eq!(check_predicate_true(predicate, "fail").is_ok(), expected);
    }

    #[rstest]
    #[case("abc", true)]
    #[case("", false)]
    #[case("   ", false)]
    #[case("abc•", false)]
    fn test_check_valid_string(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(check_valid_string(s, "param").is_ok(), expected);
    }

    #[rstest]
    #[case("TRADER-001", "-", true)]
    #[case("TRADER001", "-", false)]
    fn test_check_string_contains(#[case] s: &str, #[case] pat: &str, #[case] expected: bool) {
        assert_eq!(check_string_contains(s, pat, "param").is_ok(), expected);
    }

    #[rstest]
    #[case(1, true)]
    #[case(0, false)]
    fn test_check_positive_u64(#[case] value: u64, #[case] expected: bool) {
        assert_eq!(check_positive_u64(value, "param").is_ok(), expected);
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(0.0, true)]
    #[case(1.0, true)]
    #[case(1.1, false)]
    #[case(-0.1, false)]
    #[case(f64::NAN, false)]
    fn test_check_in_range_inclusive_f64(#[case] value: f64, #[case] expected: bool) {
        assert_eq!(
            check_in_range_inclusive_f64(value, 0.0, 1.0, "param").is_ok(),
            expected
        );
    }

    #[rstest]
    fn test_check_equal() {
        assert!(check_equal(1, 1, "lhs", "rhs").is_ok());
        assert!(check_equal(1, 2, "lhs", "rhs").is_err());
    }
}
