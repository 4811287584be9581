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

//! A token-bucket rate limiter for order commands.

use meridian_core::{UnixNanos, datetime::NANOSECONDS_IN_SECOND};

/// A token-bucket rate limiter.
///
/// The bucket holds up to `limit` tokens and refills continuously at `limit`
/// tokens per interval. Each admitted message consumes one token; a message
/// arriving with an empty bucket is not admitted.
#[derive(Clone, Debug)]
pub struct Throttler {
    /// The maximum messages per interval.
    pub limit: u64,
    /// The refill interval in nanoseconds.
    pub interval_ns: u64,
    tokens: f64,
    ts_refill: UnixNanos,
    sent_count: u64,
    blocked_count: u64,
}

impl Throttler {
    /// Creates a new [`Throttler`] instance admitting `limit` messages per
    /// `interval_ns`.
    ///
    /// # Panics
    ///
    /// Panics if `limit` or `interval_ns` are zero.
    #[must_use]
    pub fn new(limit: u64, interval_ns: u64) -> Self {
        assert!(limit > 0, "`limit` must be positive");
        assert!(interval_ns > 0, "`interval_ns` must be positive");
        Self {
            limit,
            interval_ns,
            tokens: limit as f64,
            ts_refill: UnixNanos::default(),
            sent_count: 0,
            blocked_count: 0,
        }
    }

    /// Creates a new [`Throttler`] admitting `limit` messages per second.
    #[must_use]
    pub fn per_second(limit: u64) -> Self {
        Self::new(limit, NANOSECONDS_IN_SECOND)
    }

    /// Returns whether a message at `ts_now` is admitted, consuming a token
    /// when it is.
    pub fn check(&mut self, ts_now: UnixNanos) -> bool {
        self.refill(ts_now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            self.sent_count += 1;
            true
        } else {
            self.blocked_count += 1;
            false
        }
    }

    fn refill(&mut self, ts_now: UnixNanos) {
        if ts_now <= self.ts_refill {
            return;
        }
        let elapsed = ts_now.as_u64() - self.ts_refill.as_u64();
        let refill = (elapsed as f64 / self.interval_ns as f64) * self.limit as f64;
        self.tokens = (self.tokens + refill).min(self.limit as f64);
        self.ts_refill = ts_now;
    }

    /// Returns the count of admitted messages.
    #[must_use]
    pub const fn sent_count(&self) -> u64 {
        self.sent_count
    }

    /// Returns the count of blocked messages.
    #[must_use]
    pub const fn blocked_count(&self) -> u64 {
        self.blocked_count
    }

    /// Resets the throttler to a full bucket.
    pub fn reset(&mut self) {
        self.tokens = self.limit as f64;
        self.ts_refill = UnixNanos::default();
        self.sent_count = 0;
        self.blocked_count = 0;
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
    fn test_admits_up_to_limit() {
        let mut throttler = Throttler::per_second(3);
        let ts = UnixNanos::from(1);
        assert!(throttler.check(ts));
        assert!(throttler.check(ts));
        assert!(throttler.check(ts));
        assert!(!throttler.check(ts));
        assert_eq!(throttler.sent_count(), 3);
        assert_eq!(throttler.blocked_count(), 1);
    }

    #[rstest]
    fn test_refills_over_time() {
        let mut throttler = Throttler::per_second(2);
        let ts = UnixNanos::from(1);
        assert!(throttler.check(ts));
        assert!(throttler.check(ts));
        assert!(!throttler.check(ts));

        // Half an interval refills one token
        let ts = UnixNanos::from(1 + NANOSECONDS_IN_SECOND / 2);
        assert!(throttler.check(ts));
        assert!(!throttler.check(ts));
    }

    #[rstest]
    fn test_bucket_does_not_overfill() {
        let mut throttler = Throttler::per_second(2);
        // A long quiet period caps the bucket at the limit
        let ts = UnixNanos::from(100 * NANOSECONDS_IN_SECOND);
        assert!(throttler.check(ts));
        assert!(throttler.check(ts));
        assert!(!throttler.check(ts));
    }

    #[rstest]
    fn test_reset() {
        let mut throttler = Throttler::per_second(1);
        let ts = UnixNanos::from(1);
        assert!(throttler.check(ts));
        assert!(!throttler.check(ts));
        throttler.reset();
        assert!(throttler.check(ts));
        assert_eq!(throttler.sent_count(), 1);
    }
}
