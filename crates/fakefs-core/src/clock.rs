// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Time sources used to stamp node metadata.
//!
//! Every clock hands out strictly increasing values: two stamped events never
//! compare equal, even when they happen back to back within the resolution of
//! the wall clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::Timestamp;

/// Source of "now" for every timestamp mutation
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns a timestamp strictly greater than any previously returned one
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, nudged forward by one nanosecond whenever the system
/// clock has not advanced (or went backwards) since the previous call.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn wall_nanos() -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Self::wall_nanos();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let next = wall.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

#[derive(Debug)]
struct ManualState {
    last: Timestamp,
    pinned: Option<Timestamp>,
}

/// Deterministic clock for tests: each call advances by a fixed step.
///
/// `set` pins the value returned by the next call (clamped so time never
/// runs backwards), `advance` skips ahead without consuming a tick.
#[derive(Debug)]
pub struct ManualClock {
    step: i64,
    state: Mutex<ManualState>,
}

impl ManualClock {
    pub const DEFAULT_STEP: Duration = Duration::from_millis(10);

    /// Clock whose first `now()` returns `start + step`
    pub fn new(start: Timestamp) -> Self {
        Self::with_step(start, Self::DEFAULT_STEP)
    }

    pub fn with_step(start: Timestamp, step: Duration) -> Self {
        let step = i64::try_from(step.as_nanos()).unwrap_or(i64::MAX).max(1);
        Self {
            step,
            state: Mutex::new(ManualState {
                last: start,
                pinned: None,
            }),
        }
    }

    /// The most recently handed out value (or the start value)
    pub fn peek(&self) -> Timestamp {
        self.lock().last
    }

    /// Makes the next `now()` return `at`, unless that would not be greater
    /// than the last value handed out.
    pub fn set(&self, at: Timestamp) {
        self.lock().pinned = Some(at);
    }

    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.as_nanos()).unwrap_or(i64::MAX);
        let mut state = self.lock();
        state.last = state.last.saturating_add(by);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let mut state = self.lock();
        let ticked = state.last.saturating_add(self.step);
        let next = match state.pinned.take() {
            Some(at) if at > state.last => at,
            _ => ticked,
        };
        state.last = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_system_clock_strictly_increasing() {
        let clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..10_000 {
            let next = clock.now();
            assert!(next > prev, "{next} <= {prev}");
            prev = next;
        }
    }

    #[test]
    fn test_system_clock_across_threads() {
        let clock = Arc::new(SystemClock::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || (0..1000).map(|_| clock.now()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<Timestamp> =
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total, "two calls returned the same timestamp");
    }

    #[test]
    fn test_manual_clock_steps() {
        let clock = ManualClock::with_step(100, Duration::from_nanos(5));
        assert_eq!(clock.now(), 105);
        assert_eq!(clock.now(), 110);
        assert_eq!(clock.peek(), 110);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::with_step(0, Duration::from_nanos(1));
        clock.set(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.now(), 1_001);

        // Pinning into the past is ignored
        clock.set(10);
        assert_eq!(clock.now(), 1_002);

        clock.advance(Duration::from_nanos(98));
        assert_eq!(clock.now(), 1_101);
    }

    proptest! {
        #[test]
        fn proptest_manual_clock_never_repeats(
            start in -1_000_000i64..1_000_000,
            step in 1u64..1_000,
            pins in proptest::collection::vec(proptest::option::of(-2_000_000i64..2_000_000), 1..64),
        ) {
            let clock = ManualClock::with_step(start, Duration::from_nanos(step));
            let mut prev = clock.peek();
            for pin in pins {
                if let Some(at) = pin {
                    clock.set(at);
                }
                let next = clock.now();
                prop_assert!(next > prev);
                prev = next;
            }
        }
    }
}
