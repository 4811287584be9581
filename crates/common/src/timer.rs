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

//! Timers and time events for use with `Clock` implementations.

use std::{fmt::Debug, num::NonZeroU64, rc::Rc};

use meridian_core::{UUID4, UnixNanos, correctness::FAILED, correctness::check_valid_string};
use ustr::Ustr;

/// Creates a valid nanoseconds interval that is guaranteed to be positive.
#[must_use]
pub fn create_valid_interval(interval_ns: u64) -> NonZeroU64 {
    NonZeroU64::new(std::cmp::max(interval_ns, 1)).expect("`interval_ns` must be positive")
}

/// Represents a time event occurring at the event timestamp.
#[derive(Clone, Debug, Eq)]
pub struct TimeEvent {
    /// The event name, identifying the timer which fired.
    pub name: Ustr,
    /// The unique identifier for the event.
    pub event_id: UUID4,
    /// UNIX timestamp (nanoseconds) when the event fired.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl TimeEvent {
    /// Creates a new [`TimeEvent`] instance.
    #[must_use]
    pub const fn new(name: Ustr, event_id: UUID4, ts_event: UnixNanos, ts_init: UnixNanos) -> Self {
        Self {
            name,
            event_id,
            ts_event,
            ts_init,
        }
    }
}

impl PartialEq for TimeEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event_id == other.event_id
    }
}

/// A callable handler for time events.
#[derive(Clone)]
pub struct TimeEventCallback(Rc<dyn Fn(TimeEvent)>);

impl TimeEventCallback {
    /// Calls the callback with the given `event`.
    pub fn call(&self, event: TimeEvent) {
        (self.0)(event);
    }
}

impl Debug for TimeEventCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TimeEventCallback")
    }
}

impl<F: Fn(TimeEvent) + 'static> From<F> for TimeEventCallback {
    fn from(value: F) -> Self {
        Self(Rc::new(value))
    }
}

/// Represents a time event with its associated handler.
#[derive(Clone, Debug)]
pub struct TimeEventHandler {
    /// The time event.
    pub event: TimeEvent,
    /// The callable handler for the event.
    pub callback: TimeEventCallback,
}

impl TimeEventHandler {
    /// Creates a new [`TimeEventHandler`] instance.
    #[must_use]
    pub const fn new(event: TimeEvent, callback: TimeEventCallback) -> Self {
        Self { event, callback }
    }

    /// Runs the handler, consuming it.
    pub fn run(self) {
        let Self { event, callback } = self;
        callback.call(event);
    }
}

/// A deterministic timer advanced explicitly by a clock.
///
/// Fires at `start_time_ns + interval_ns` and then every interval until the
/// optional stop time. The `insertion_seq` breaks firing-order ties between
/// timers scheduled for the same nanosecond.
#[derive(Clone, Copy, Debug)]
pub struct TestTimer {
    /// The name of the timer.
    pub name: Ustr,
    /// The interval between timer events in nanoseconds.
    pub interval_ns: NonZeroU64,
    /// The start time of the timer in UNIX nanoseconds.
    pub start_time_ns: UnixNanos,
    /// The optional stop time of the timer in UNIX nanoseconds.
    pub stop_time_ns: Option<UnixNanos>,
    /// The clock-assigned insertion sequence for deterministic ordering.
    pub insertion_seq: u64,
    next_time_ns: UnixNanos,
    is_expired: bool,
}

impl TestTimer {
    /// Creates a new [`TestTimer`] instance.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid string.
    #[must_use]
    pub fn new(
        name: Ustr,
        interval_ns: NonZeroU64,
        start_time_ns: UnixNanos,
        stop_time_ns: Option<UnixNanos>,
        insertion_seq: u64,
    ) -> Self {
        check_valid_string(name, stringify!(name)).expect(FAILED);
        Self {
            name,
            interval_ns,
            start_time_ns,
            stop_time_ns,
            insertion_seq,
            next_time_ns: start_time_ns + interval_ns.get(),
            is_expired: false,
        }
    }

    /// Returns the next time in UNIX nanoseconds when the timer will fire.
    #[must_use]
    pub const fn next_time_ns(&self) -> UnixNanos {
        self.next_time_ns
    }

    /// Returns whether the timer is expired.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.is_expired
    }

    /// Advances the timer to `to_time_ns`, yielding a [`TimeEvent`] for every
    /// interval boundary at or before the target time.
    pub fn advance(&mut self, to_time_ns: UnixNanos) -> impl Iterator<Item = TimeEvent> + '_ {
        std::iter::from_fn(move || {
            if self.is_expired || self.next_time_ns > to_time_ns {
                return None;
            }
            let event = TimeEvent::new(
                self.name,
                UUID4::new(),
                self.next_time_ns,
                self.next_time_ns,
            );
            if self
                .stop_time_ns
                .is_some_and(|stop| self.next_time_ns >= stop)
            {
                self.is_expired = true;
            }
            self.next_time_ns += self.interval_ns.get();
            Some(event)
        })
    }

    /// Cancels the timer (the timer will not generate further events).
    ///
    /// Cancellation is idempotent.
    pub const fn cancel(&mut self) {
        self.is_expired = true;
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
    fn test_advance_within_interval_yields_nothing() {
        let mut timer = TestTimer::new(
            Ustr::from("t1"),
            create_valid_interval(1000),
            UnixNanos::default(),
            None,
            0,
        );
        assert_eq!(timer.advance(UnixNanos::from(999)).count(), 0);
        assert!(!timer.is_expired());
    }

    #[rstest]
    fn test_advance_across_intervals() {
        let mut timer = TestTimer::new(
            Ustr::from("t1"),
            create_valid_interval(1000),
            UnixNanos::default(),
            None,
            0,
        );
        let events: Vec<TimeEvent> = timer.advance(UnixNanos::from(2500)).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ts_event, UnixNanos::from(1000));
        assert_eq!(events[1].ts_event, UnixNanos::from(2000));
        assert_eq!(timer.next_time_ns(), UnixNanos::from(3000));
    }

    #[rstest]
    fn test_stop_time_expires_timer() {
        let mut timer = TestTimer::new(
            Ustr::from("t1"),
            create_valid_interval(1000),
            UnixNanos::default(),
            Some(UnixNanos::from(2000)),
            0,
        );
        let events: Vec<TimeEvent> = timer.advance(UnixNanos::from(5000)).collect();
        assert_eq!(events.len(), 2);
        assert!(timer.is_expired());
    }

    #[rstest]
    fn test_cancel_is_idempotent() {
        let mut timer = TestTimer::new(
            Ustr::from("t1"),
            create_valid_interval(1000),
            UnixNanos::default(),
            None,
            0,
        );
        timer.cancel();
        timer.cancel();
        assert!(timer.is_expired());
        assert_eq!(timer.advance(UnixNanos::from(10_000)).count(), 0);
    }
}
