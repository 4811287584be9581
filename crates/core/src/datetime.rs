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

//! Common datetime conversion constants and functions.

use chrono::{NaiveDate, TimeDelta, Timelike};

use crate::nanos::UnixNanos;

/// The number of nanoseconds in one second.
pub const NANOSECONDS_IN_SECOND: u64 = 1_000_000_000;

/// The number of nanoseconds in one millisecond.
pub const NANOSECONDS_IN_MILLISECOND: u64 = 1_000_000;

/// The number of nanoseconds in one microsecond.
pub const NANOSECONDS_IN_MICROSECOND: u64 = 1_000;

/// The number of milliseconds in one second.
pub const MILLISECONDS_IN_SECOND: u64 = 1_000;

/// Converts seconds to nanoseconds (ns).
#[must_use]
pub const fn secs_to_nanos(secs: f64) -> u64 {
    (secs * NANOSECONDS_IN_SECOND as f64) as u64
}

/// Converts milliseconds (ms) to nanoseconds (ns).
#[must_use]
pub const fn millis_to_nanos(millis: f64) -> u64 {
    (millis * NANOSECONDS_IN_MILLISECOND as f64) as u64
}

/// Converts nanoseconds (ns) to seconds.
#[must_use]
pub const fn nanos_to_secs(nanos: u64) -> f64 {
    nanos as f64 / NANOSECONDS_IN_SECOND as f64
}

/// Converts nanoseconds (ns) to milliseconds (ms).
#[must_use]
pub const fn nanos_to_millis(nanos: u64) -> u64 {
    nanos / NANOSECONDS_IN_MILLISECOND
}

/// Returns the UTC date of the given timestamp.
#[must_use]
pub fn to_naive_date(timestamp: UnixNanos) -> NaiveDate {
    timestamp.to_datetime_utc().date_naive()
}

/// Returns the UNIX nanoseconds at the next UTC midnight strictly after `timestamp`.
#[must_use]
pub fn next_utc_midnight_ns(timestamp: UnixNanos) -> UnixNanos {
    let dt = timestamp.to_datetime_utc();
    let midnight = dt
        .date_naive()
        .succ_opt()
        .expect("date overflow")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
        .and_utc();
    UnixNanos::from(midnight)
}

/// Returns whether the given timestamp falls exactly on a UTC midnight boundary.
#[must_use]
pub fn is_utc_midnight(timestamp: UnixNanos) -> bool {
    let dt = timestamp.to_datetime_utc();
    dt.hour() == 0
        && dt.minute() == 0
        && dt.second() == 0
        && dt.nanosecond() == 0
}

/// Returns the `TimeDelta` between two timestamps (`end - start`).
#[must_use]
pub fn timedelta_between(start: UnixNanos, end: UnixNanos) -> TimeDelta {
    TimeDelta::nanoseconds(end.as_i64() - start.as_i64())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, 0)]
    #[case(1.0, 1_000_000_000)]
    #[case(1.5, 1_500_000_000)]
    fn test_secs_to_nanos(#[case] secs: f64, #[case] expected: u64) {
        assert_eq!(secs_to_nanos(secs), expected);
    }

    #[rstest]
    fn test_nanos_to_secs() {
        assert_eq!(nanos_to_secs(1_500_000_000), 1.5);
    }

    #[rstest]
    fn test_next_utc_midnight_ns() {
        // 1970-01-01T12:00:00 -> 1970-01-02T00:00:00
        let ts = UnixNanos::from(12 * 3600 * NANOSECONDS_IN_SECOND);
        let midnight = next_utc_midnight_ns(ts);
        assert_eq!(midnight.as_u64(), 24 * 3600 * NANOSECONDS_IN_SECOND);
        assert!(is_utc_midnight(midnight));
    }

    #[rstest]
    fn test_next_utc_midnight_from_midnight_is_next_day() {
        let midnight = UnixNanos::from(24 * 3600 * NANOSECONDS_IN_SECOND);
        let next = next_utc_midnight_ns(midnight);
        assert_eq!(next.as_u64(), 48 * 3600 * NANOSECONDS_IN_SECOND);
    }
}
