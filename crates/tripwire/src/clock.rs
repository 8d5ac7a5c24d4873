// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Provides the wall-clock time used by the health tracker.
///
/// Working with time is notoriously difficult to test. The clock reads system time in
/// production while letting tests control the passage of time through
/// [`ClockControl`], which makes time-dependent tests fast and deterministic.
///
/// The clock exposes a single measurement: milliseconds since the Unix epoch, which is
/// the resolution at which window buckets and snapshot intervals operate. The value is
/// expected to be non-decreasing; small regressions from system clock adjustments only
/// shift which bucket an outcome lands in.
///
/// # Cloning and shared state
///
/// Cloning a clock is inexpensive and every clone of a controlled clock shares the same
/// underlying state: advancing time through a [`ClockControl`] is visible to every clock
/// created from it.
///
/// # Examples
///
/// ```
/// use tripwire::Clock;
///
/// let clock = Clock::new();
///
/// let earlier = clock.now_millis();
/// let later = clock.now_millis();
///
/// assert!(later >= earlier);
/// ```
#[derive(Debug, Clone)]
pub struct Clock(ClockKind);

#[derive(Debug, Clone)]
enum ClockKind {
    System,
    Controlled(Arc<AtomicU64>),
}

impl Clock {
    /// Creates a clock that reads the system time.
    #[must_use]
    pub fn new() -> Self {
        Self(ClockKind::System)
    }

    /// Creates a clock whose time does not advance.
    ///
    /// This is a convenience method equivalent to calling `ClockControl::new().to_clock()`.
    /// Useful in tests that exercise behavior within a single time instant.
    #[must_use]
    pub fn new_frozen() -> Self {
        ClockControl::new().to_clock()
    }

    /// Retrieves the current wall-clock time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn now_millis(&self) -> u64 {
        match &self.0 {
            ClockKind::System => {
                let since_epoch = SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .unwrap_or(Duration::ZERO);
                duration_to_millis(since_epoch)
            }
            ClockKind::Controlled(millis) => millis.load(Ordering::Acquire),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Controls the passage of time for clocks handed to the code under test.
///
/// A control starts at the current system time (or a caller-supplied point via
/// [`new_at`][Self::new_at]) and only moves when [`advance`][Self::advance] is called.
/// Clocks created through [`to_clock`][Self::to_clock] observe every advance.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tripwire::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
///
/// let before = clock.now_millis();
/// control.advance(Duration::from_secs(10));
///
/// assert_eq!(clock.now_millis(), before + 10_000);
/// ```
#[derive(Debug, Clone)]
pub struct ClockControl {
    millis: Arc<AtomicU64>,
}

impl ClockControl {
    /// Creates a control frozen at the current system time.
    #[must_use]
    pub fn new() -> Self {
        Self::new_at(SystemTime::now())
    }

    /// Creates a control frozen at the specified point in time.
    #[must_use]
    pub fn new_at(time: impl Into<SystemTime>) -> Self {
        let since_epoch = time
            .into()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        Self {
            millis: Arc::new(AtomicU64::new(duration_to_millis(since_epoch))),
        }
    }

    /// Moves time forward by the given duration.
    pub fn advance(&self, duration: Duration) {
        let _ = self.millis.fetch_add(duration_to_millis(duration), Ordering::AcqRel);
    }

    /// Retrieves the controlled time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::Acquire)
    }

    /// Creates a clock that observes this control's time.
    #[must_use]
    pub fn to_clock(&self) -> Clock {
        Clock(ClockKind::Controlled(Arc::clone(&self.millis)))
    }
}

impl Default for ClockControl {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn duration_to_millis(duration: Duration) -> u64 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u64 milliseconds cover more than 500 million years"
    )]
    let millis = duration.as_millis() as u64;
    millis
}
