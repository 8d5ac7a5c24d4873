// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::key::BreakerKey;

/// Default length of the rolling statistical window.
///
/// The defaults follow Hystrix:
/// <https://github.com/Netflix/Hystrix/wiki/Configuration>
pub(crate) const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Default number of buckets the rolling window is divided into.
///
/// The defaults follow Hystrix:
/// <https://github.com/Netflix/Hystrix/wiki/Configuration>
pub(crate) const DEFAULT_NUM_BUCKETS: u32 = 10;

/// Default minimum age of the cached snapshot before a read recomputes it.
///
/// The defaults follow Hystrix:
/// <https://github.com/Netflix/Hystrix/wiki/Configuration>
pub(crate) const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_millis(500);

/// Default minimum number of outcomes in the window before the error percentage
/// is considered statistically meaningful.
///
/// The defaults follow Hystrix:
/// <https://github.com/Netflix/Hystrix/wiki/Configuration>
pub(crate) const DEFAULT_REQUEST_VOLUME_THRESHOLD: u64 = 20;

/// Default error percentage at or above which the tracker reports that the
/// circuit should open.
///
/// The defaults follow Hystrix:
/// <https://github.com/Netflix/Hystrix/wiki/Configuration>
pub(crate) const DEFAULT_ERROR_THRESHOLD_PERCENTAGE: u32 = 50;

/// Configuration for a [`HealthTracker`][crate::HealthTracker].
///
/// Options are supplied once at construction and are read-only afterwards. Values are
/// assumed valid by construction; parsing and validating them from a configuration
/// source is the responsibility of the surrounding layer. The tracker applies only
/// light normalization: the bucket count is clamped to at least 1 and each bucket
/// covers at least one millisecond.
///
/// With the `serde` feature enabled, options derive `Serialize`/`Deserialize` so an
/// external configuration loader can produce them directly.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tripwire::TrackerOptions;
///
/// let options = TrackerOptions::new("payments-api")
///     .with_window(Duration::from_secs(10))
///     .with_num_buckets(10)
///     .with_request_volume_threshold(20)
///     .with_error_threshold_percentage(50);
///
/// assert_eq!(options.key().to_string(), "payments-api");
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerOptions {
    key: BreakerKey,
    window: Duration,
    num_buckets: u32,
    snapshot_interval: Duration,
    request_volume_threshold: u64,
    error_threshold_percentage: u32,
}

impl TrackerOptions {
    /// Creates options for the given breaker key with Hystrix-style defaults:
    /// a 10 second window split into 10 buckets, a 500 ms snapshot interval, a
    /// request volume threshold of 20, and an error threshold of 50 %.
    pub fn new(key: impl Into<BreakerKey>) -> Self {
        Self {
            key: key.into(),
            window: DEFAULT_WINDOW,
            num_buckets: DEFAULT_NUM_BUCKETS,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            request_volume_threshold: DEFAULT_REQUEST_VOLUME_THRESHOLD,
            error_threshold_percentage: DEFAULT_ERROR_THRESHOLD_PERCENTAGE,
        }
    }

    /// Sets the length of the rolling statistical window.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the number of buckets the window is divided into.
    #[must_use]
    pub fn with_num_buckets(mut self, num_buckets: u32) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    /// Sets how long a cached snapshot stays fresh before a read recomputes it.
    #[must_use]
    pub fn with_snapshot_interval(mut self, snapshot_interval: Duration) -> Self {
        self.snapshot_interval = snapshot_interval;
        self
    }

    /// Sets the minimum window volume below which [`should_open`][crate::HealthTracker::should_open]
    /// always answers `false`.
    #[must_use]
    pub fn with_request_volume_threshold(mut self, request_volume_threshold: u64) -> Self {
        self.request_volume_threshold = request_volume_threshold;
        self
    }

    /// Sets the error percentage at or above which the tracker reports that the
    /// circuit should open.
    #[must_use]
    pub fn with_error_threshold_percentage(mut self, error_threshold_percentage: u32) -> Self {
        self.error_threshold_percentage = error_threshold_percentage;
        self
    }

    /// The key identifying the protected resource.
    #[must_use]
    pub fn key(&self) -> &BreakerKey {
        &self.key
    }

    /// The length of the rolling statistical window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The number of buckets the window is divided into.
    #[must_use]
    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// How long a cached snapshot stays fresh.
    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        self.snapshot_interval
    }

    /// The minimum window volume required before the error percentage is judged.
    #[must_use]
    pub fn request_volume_threshold(&self) -> u64 {
        self.request_volume_threshold
    }

    /// The error percentage at or above which the circuit should open.
    #[must_use]
    pub fn error_threshold_percentage(&self) -> u32 {
        self.error_threshold_percentage
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let options = TrackerOptions::new("test");

        assert_eq!(options.window(), DEFAULT_WINDOW);
        assert_eq!(options.num_buckets(), DEFAULT_NUM_BUCKETS);
        assert_eq!(options.snapshot_interval(), DEFAULT_SNAPSHOT_INTERVAL);
        assert_eq!(options.request_volume_threshold(), DEFAULT_REQUEST_VOLUME_THRESHOLD);
        assert_eq!(options.error_threshold_percentage(), DEFAULT_ERROR_THRESHOLD_PERCENTAGE);
    }

    #[test]
    fn builders_override_defaults() {
        let options = TrackerOptions::new("test")
            .with_window(Duration::from_secs(60))
            .with_num_buckets(6)
            .with_snapshot_interval(Duration::from_millis(100))
            .with_request_volume_threshold(5)
            .with_error_threshold_percentage(25);

        assert_eq!(options.window(), Duration::from_secs(60));
        assert_eq!(options.num_buckets(), 6);
        assert_eq!(options.snapshot_interval(), Duration::from_millis(100));
        assert_eq!(options.request_volume_threshold(), 5);
        assert_eq!(options.error_threshold_percentage(), 25);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let options = TrackerOptions::new("payments").with_num_buckets(4);

        let json = serde_json::to_string(&options).unwrap();
        let back: TrackerOptions = serde_json::from_str(&json).unwrap();

        assert_eq!(back.key().to_string(), "payments");
        assert_eq!(back.num_buckets(), 4);
        assert_eq!(back.window(), options.window());
    }
}
