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

//! Static (test) and real-time `Clock` implementations with timer scheduling.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, Utc};
use meridian_core::{
    UnixNanos,
    correctness::{check_positive_u64, check_valid_string},
};
use ustr::Ustr;

use crate::timer::{
    TestTimer, TimeEvent, TimeEventCallback, TimeEventHandler, create_valid_interval,
};

/// A clock providing the current time and named timer scheduling.
///
/// A handle is passed into every engine and strategy at construction; there is
/// no process-wide clock singleton.
pub trait Clock: Debug {
    /// Returns the current UNIX timestamp in nanoseconds (ns).
    fn timestamp_ns(&self) -> UnixNanos;

    /// Returns the current date and time as a timezone-aware `DateTime<Utc>`.
    fn utc_now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp_ns().as_i64())
    }

    /// Returns the names of active timers in the clock.
    fn timer_names(&self) -> Vec<&str>;

    /// Returns the count of active timers in the clock.
    fn timer_count(&self) -> usize;

    /// Returns the next fire time for the timer `name`, if it exists.
    fn next_time_ns(&self, name: &str) -> Option<UnixNanos>;

    /// Sets a timer to fire a single time event at `alert_time_ns`.
    ///
    /// Any existing timer under the same `name` is cancelled first. An alert
    /// time at or before the current time fires at the next advance.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is invalid.
    fn set_time_alert_ns(
        &mut self,
        name: &str,
        alert_time_ns: UnixNanos,
        callback: TimeEventCallback,
    ) -> anyhow::Result<()>;

    /// Sets a timer to fire time events at every `interval_ns` between the
    /// optional start and stop times.
    ///
    /// Any existing timer under the same `name` is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is invalid or `interval_ns` is zero.
    fn set_timer_ns(
        &mut self,
        name: &str,
        interval_ns: u64,
        start_time_ns: Option<UnixNanos>,
        stop_time_ns: Option<UnixNanos>,
        callback: TimeEventCallback,
    ) -> anyhow::Result<()>;

    /// Cancels the timer with `name`. Cancellation is idempotent.
    fn cancel_timer(&mut self, name: &str);

    /// Cancels all timers.
    fn cancel_timers(&mut self);

    /// Resets the clock by clearing its internal state.
    fn reset(&mut self);
}

/// A static test clock.
///
/// Stores the current timestamp internally which can only be advanced
/// explicitly; the wall clock is never read. Timer firing order is
/// deterministic on `(fire_time_ns, insertion_seq)`.
#[derive(Debug)]
pub struct TestClock {
    time: UnixNanos,
    // BTreeMap ensures stable name ordering when scanning timers
    timers: BTreeMap<Ustr, TestTimer>,
    callbacks: HashMap<Ustr, TimeEventCallback>,
    insertion_count: u64,
}

impl TestClock {
    /// Creates a new [`TestClock`] instance at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: UnixNanos::default(),
            timers: BTreeMap::new(),
            callbacks: HashMap::new(),
            insertion_count: 0,
        }
    }

    /// Sets the clock to the given `to_time_ns` without firing timers.
    ///
    /// # Panics
    ///
    /// Panics if `to_time_ns` is before the current time.
    pub fn set_time(&mut self, to_time_ns: UnixNanos) {
        assert!(
            to_time_ns >= self.time,
            "`to_time_ns` {to_time_ns} was < current time {}",
            self.time
        );
        self.time = to_time_ns;
    }

    /// Advances the clock to `to_time_ns`, returning all expired time events
    /// ordered by `(fire_time_ns, insertion_seq)`.
    ///
    /// # Panics
    ///
    /// Panics if `to_time_ns` is before the current time.
    pub fn advance_time(&mut self, to_time_ns: UnixNanos) -> Vec<TimeEvent> {
        assert!(
            to_time_ns >= self.time,
            "`to_time_ns` {to_time_ns} was < current time {}",
            self.time
        );
        self.time = to_time_ns;

        let mut keyed_events: Vec<(UnixNanos, u64, TimeEvent)> = Vec::new();
        self.timers.retain(|_, timer| {
            let seq = timer.insertion_seq;
            for event in timer.advance(to_time_ns) {
                keyed_events.push((event.ts_event, seq, event));
            }
            !timer.is_expired()
        });

        keyed_events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        keyed_events.into_iter().map(|(_, _, event)| event).collect()
    }

    /// Matches the given `events` with their registered callbacks.
    ///
    /// # Panics
    ///
    /// Panics if an event has no registered callback.
    #[must_use]
    pub fn match_handlers(&self, events: Vec<TimeEvent>) -> Vec<TimeEventHandler> {
        events
            .into_iter()
            .map(|event| {
                let callback = self
                    .callbacks
                    .get(&event.name)
                    .cloned()
                    .unwrap_or_else(|| panic!("Event '{}' should have a callback", event.name));
                TimeEventHandler::new(event, callback)
            })
            .collect()
    }
}

impl Default for TestClock {
    /// Creates a new default [`TestClock`] instance.
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn timestamp_ns(&self) -> UnixNanos {
        self.time
    }

    fn timer_names(&self) -> Vec<&str> {
        self.timers
            .iter()
            .filter(|(_, timer)| !timer.is_expired())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn timer_count(&self) -> usize {
        self.timers
            .values()
            .filter(|timer| !timer.is_expired())
            .count()
    }

    fn next_time_ns(&self, name: &str) -> Option<UnixNanos> {
        self.timers
            .get(&Ustr::from(name))
            .map(TestTimer::next_time_ns)
    }

    fn set_time_alert_ns(
        &mut self,
        name: &str,
        alert_time_ns: UnixNanos,
        callback: TimeEventCallback,
    ) -> anyhow::Result<()> {
        check_valid_string(name, stringify!(name))?;
        let name = Ustr::from(name);

        if self.timers.contains_key(&name) {
            self.cancel_timer(name.as_str());
            log::warn!("Timer '{name}' replaced");
        }
        self.callbacks.insert(name, callback);

        // An alert at or before the current time fires on the next advance
        let alert_time_ns = alert_time_ns.max(self.time + 1_u64);
        let interval_ns = create_valid_interval((alert_time_ns - self.time).into());
        let seq = self.insertion_count;
        self.insertion_count += 1;

        let timer = TestTimer::new(name, interval_ns, self.time, Some(alert_time_ns), seq);
        self.timers.insert(name, timer);
        Ok(())
    }

    fn set_timer_ns(
        &mut self,
        name: &str,
        interval_ns: u64,
        start_time_ns: Option<UnixNanos>,
        stop_time_ns: Option<UnixNanos>,
        callback: TimeEventCallback,
    ) -> anyhow::Result<()> {
        check_valid_string(name, stringify!(name))?;
        check_positive_u64(interval_ns, stringify!(interval_ns))?;
        let name = Ustr::from(name);

        if self.timers.contains_key(&name) {
            self.cancel_timer(name.as_str());
            log::warn!("Timer '{name}' replaced");
        }
        self.callbacks.insert(name, callback);

        let start_time_ns = start_time_ns.unwrap_or(self.time);
        if let Some(stop_time_ns) = stop_time_ns {
            if stop_time_ns <= start_time_ns {
                anyhow::bail!(
                    "Timer '{name}' stop time {stop_time_ns} must be after start time {start_time_ns}"
                );
            }
        }

        let interval_ns = create_valid_interval(interval_ns);
        let seq = self.insertion_count;
        self.insertion_count += 1;

        let timer = TestTimer::new(name, interval_ns, start_time_ns, stop_time_ns, seq);
        self.timers.insert(name, timer);
        Ok(())
    }

    fn cancel_timer(&mut self, name: &str) {
        if let Some(mut timer) = self.timers.remove(&Ustr::from(name)) {
            timer.cancel();
        }
        self.callbacks.remove(&Ustr::from(name));
    }

    fn cancel_timers(&mut self) {
        for timer in self.timers.values_mut() {
            timer.cancel();
        }
        self.timers.clear();
        self.callbacks.clear();
    }

    fn reset(&mut self) {
        self.time = UnixNanos::default();
        self.timers.clear();
        self.callbacks.clear();
        self.insertion_count = 0;
    }
}

/// A real-time clock which reads system time.
///
/// Timestamps are guaranteed monotonically non-decreasing. Due timers are
/// drained explicitly by the owning event loop via
/// [`LiveClock::drain_due_events`].
#[derive(Debug)]
pub struct LiveClock {
    last_time: AtomicU64,
    timers: BTreeMap<Ustr, TestTimer>,
    callbacks: HashMap<Ustr, TimeEventCallback>,
    insertion_count: u64,
}

impl LiveClock {
    /// Creates a new [`LiveClock`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_time: AtomicU64::new(0),
            timers: BTreeMap::new(),
            callbacks: HashMap::new(),
            insertion_count: 0,
        }
    }

    /// Drains all due time events with their handlers, ordered by
    /// `(fire_time_ns, insertion_seq)`.
    pub fn drain_due_events(&mut self) -> Vec<TimeEventHandler> {
        let now = self.timestamp_ns();
        let mut keyed_events: Vec<(UnixNanos, u64, TimeEvent)> = Vec::new();
        self.timers.retain(|_, timer| {
            let seq = timer.insertion_seq;
            for event in timer.advance(now) {
                keyed_events.push((event.ts_event, seq, event));
            }
            !timer.is_expired()
        });
        keyed_events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        keyed_events
            .into_iter()
            .filter_map(|(_, _, event)| {
                self.callbacks
                    .get(&event.name)
                    .cloned()
                    .map(|callback| TimeEventHandler::new(event, callback))
            })
            .collect()
    }
}

impl Default for LiveClock {
    /// Creates a new default [`LiveClock`] instance.
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for LiveClock {
    fn timestamp_ns(&self) -> UnixNanos {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System time before UNIX epoch")
            .as_nanos() as u64;
        // Guard monotonicity against wall-clock steps
        let last = self.last_time.fetch_max(now, Ordering::SeqCst);
        UnixNanos::from(now.max(last))
    }

    fn timer_names(&self) -> Vec<&str> {
        self.timers
            .iter()
            .filter(|(_, timer)| !timer.is_expired())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn timer_count(&self) -> usize {
        self.timers
            .values()
            .filter(|timer| !timer.is_expired())
            .count()
    }

    fn next_time_ns(&self, name: &str) -> Option<UnixNanos> {
        self.timers
            .get(&Ustr::from(name))
            .map(TestTimer::next_time_ns)
    }

    fn set_time_alert_ns(
        &mut self,
        name: &str,
        alert_time_ns: UnixNanos,
        callback: TimeEventCallback,
    ) -> anyhow::Result<()> {
        check_valid_string(name, stringify!(name))?;
        let name = Ustr::from(name);
        let now = self.timestamp_ns();

        if self.timers.contains_key(&name) {
            self.cancel_timer(name.as_str());
            log::warn!("Timer '{name}' replaced");
        }
        self.callbacks.insert(name, callback);

        let alert_time_ns = alert_time_ns.max(now + 1_u64);
        let interval_ns = create_valid_interval((alert_time_ns - now).into());
        let seq = self.insertion_count;
        self.insertion_count += 1;

        let timer = TestTimer::new(name, interval_ns, now, Some(alert_time_ns), seq);
        self.timers.insert(name, timer);
        Ok(())
    }

    fn set_timer_ns(
        &mut self,
        name: &str,
        interval_ns: u64,
        start_time_ns: Option<UnixNanos>,
        stop_time_ns: Option<UnixNanos>,
        callback: TimeEventCallback,
    ) -> anyhow::Result<()> {
        check_valid_string(name, stringify!(name))?;
        check_positive_u64(interval_ns, stringify!(interval_ns))?;
        let name = Ustr::from(name);
        let now = self.timestamp_ns();

        if self.timers.contains_key(&name) {
            self.cancel_timer(name.as_str());
            log::warn!("Timer '{name}' replaced");
        }
        self.callbacks.insert(name, callback);

        let start_time_ns = start_time_ns.unwrap_or(now);
        if let Some(stop_time_ns) = stop_time_ns {
            if stop_time_ns <= start_time_ns {
                anyhow::bail!(
                    "Timer '{name}' stop time {stop_time_ns} must be after start time {start_time_ns}"
                );
            }
        }

        let interval_ns = create_valid_interval(interval_ns);
        let seq = self.insertion_count;
        self.insertion_count += 1;

        let timer = TestTimer::new(name, interval_ns, start_time_ns, stop_time_ns, seq);
        self.timers.insert(name, timer);
        Ok(())
    }

    fn cancel_timer(&mut self, name: &str) {
        if let Some(mut timer) = self.timers.remove(&Ustr::from(name)) {
            timer.cancel();
        }
        self.callbacks.remove(&Ustr::from(name));
    }

    fn cancel_timers(&mut self) {
        for timer in self.timers.values_mut() {
            timer.cancel();
        }
        self.timers.clear();
        self.callbacks.clear();
    }

    fn reset(&mut self) {
        self.cancel_timers();
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn test_clock() -> TestClock {
        TestClock::new()
    }

    fn noop_callback() -> TimeEventCallback {
        TimeEventCallback::from(|_: TimeEvent| {})
    }

    #[rstest]
    fn test_time_monotonicity(mut test_clock: TestClock) {
        let initial_time = test_clock.timestamp_ns();
        test_clock.advance_time(initial_time + 1000);
        assert!(test_clock.timestamp_ns() > initial_time);
    }

    #[rstest]
    #[should_panic(expected = "was < current time")]
    fn test_set_time_backwards_panics(mut test_clock: TestClock) {
        test_clock.set_time(UnixNanos::from(1000));
        test_clock.set_time(UnixNanos::from(500));
    }

    #[rstest]
    fn test_timer_registration(mut test_clock: TestClock) {
        test_clock
            .set_time_alert_ns("test_timer", UnixNanos::from(1000), noop_callback())
            .unwrap();
        assert_eq!(test_clock.timer_count(), 1);
        assert_eq!(test_clock.timer_names(), vec!["test_timer"]);
    }

    #[rstest]
    fn test_alert_fires_once(mut test_clock: TestClock) {
        test_clock
            .set_time_alert_ns("alert", UnixNanos::from(1000), noop_callback())
            .unwrap();
        let events = test_clock.advance_time(UnixNanos::from(1000));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name.as_str(), "alert");
        assert_eq!(events[0].ts_event, UnixNanos::from(1000));
        assert_eq!(test_clock.timer_count(), 0);
    }

    #[rstest]
    fn test_interval_timer_fires_each_interval(mut test_clock: TestClock) {
        test_clock
            .set_timer_ns("timer", 1000, None, None, noop_callback())
            .unwrap();
        let events = test_clock.advance_time(UnixNanos::from(2500));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ts_event, UnixNanos::from(1000));
        assert_eq!(events[1].ts_event, UnixNanos::from(2000));
    }

    #[rstest]
    fn test_firing_order_by_time_then_insertion(mut test_clock: TestClock) {
        test_clock
            .set_timer_ns("b_second", 1000, None, None, noop_callback())
            .unwrap();
        test_clock
            .set_timer_ns("a_first", 500, None, None, noop_callback())
            .unwrap();
        // Both timers fire at t=1000; "b_second" was inserted first
        let events = test_clock.advance_time(UnixNanos::from(1000));
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a_first", "b_second", "a_first"]);
        assert_eq!(events[1].ts_event, UnixNanos::from(1000));
        assert_eq!(events[2].ts_event, UnixNanos::from(1000));
    }

    #[rstest]
    fn test_cancel_timer_is_idempotent(mut test_clock: TestClock) {
        test_clock
            .set_timer_ns("timer", 1000, None, None, noop_callback())
            .unwrap();
        test_clock.cancel_timer("timer");
        test_clock.cancel_timer("timer");
        assert_eq!(test_clock.timer_count(), 0);
        assert!(test_clock.advance_time(UnixNanos::from(5000)).is_empty());
    }

    #[rstest]
    fn test_timer_replacement(mut test_clock: TestClock) {
        test_clock
            .set_timer_ns("timer", 1000, None, None, noop_callback())
            .unwrap();
        test_clock
            .set_timer_ns("timer", 2000, None, None, noop_callback())
            .unwrap();
        assert_eq!(test_clock.timer_count(), 1);
        assert_eq!(test_clock.next_time_ns("timer"), Some(UnixNanos::from(2000)));
    }

    #[rstest]
    fn test_invalid_stop_time_errors(mut test_clock: TestClock) {
        test_clock.set_time(UnixNanos::from(2000));
        let result = test_clock.set_timer_ns(
            "timer",
            100,
            Some(UnixNanos::from(1500)),
            Some(UnixNanos::from(1000)),
            noop_callback(),
        );
        assert!(result.is_err());
        assert_eq!(test_clock.timer_count(), 0);
    }

    #[rstest]
    fn test_zero_interval_errors(mut test_clock: TestClock) {
        assert!(
            test_clock
                .set_timer_ns("timer", 0, None, None, noop_callback())
                .is_err()
        );
    }

    #[rstest]
    fn test_match_handlers_runs_callbacks(mut test_clock: TestClock) {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let fired_clone = fired.clone();
        test_clock
            .set_time_alert_ns(
                "alert",
                UnixNanos::from(100),
                TimeEventCallback::from(move |event: TimeEvent| {
                    fired_clone.borrow_mut().push(event.name.to_string());
                }),
            )
            .unwrap();

        let events = test_clock.advance_time(UnixNanos::from(100));
        for handler in test_clock.match_handlers(events) {
            handler.run();
        }
        assert_eq!(*fired.borrow(), vec!["alert".to_string()]);
    }

    #[rstest]
    fn test_reset(mut test_clock: TestClock) {
        test_clock.set_time(UnixNanos::from(1000));
        test_clock
            .set_timer_ns("timer", 1000, None, None, noop_callback())
            .unwrap();
        test_clock.reset();
        assert_eq!(test_clock.timestamp_ns(), UnixNanos::default());
        assert_eq!(test_clock.timer_count(), 0);
    }

    #[rstest]
    fn test_live_clock_monotonic() {
        let clock = LiveClock::new();
        let t1 = clock.timestamp_ns();
        let t2 = clock.timestamp_ns();
        assert!(t2 >= t1);
    }
}
