// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::clock::{Clock, duration_to_millis};
use crate::event::{EventSink, NoopEventSink};
use crate::key::BreakerKey;
use crate::options::TrackerOptions;
use crate::outcome::Outcome;
use crate::snapshot::HealthSnapshot;
use crate::window::RollingWindow;

/// Tracks the windowed failure rate of one protected resource and answers whether the
/// circuit breaker guarding it should open.
///
/// The tracker owns a rolling success/failure window and a cached [`HealthSnapshot`]
/// derived from it. Recording an outcome notifies the configured [`EventSink`] and
/// increments the window; reading the snapshot refreshes it lazily, at most once per
/// configured interval, so [`should_open`][Self::should_open] stays cheap enough to be
/// called on every request.
///
/// The tracker is a pure metrics-and-decision component: it reports whether the circuit
/// *should* open, never whether it currently *is* open. Trip timers, half-open probing,
/// and the open/closed state machine belong to the surrounding breaker layer, which is
/// also expected to call [`reset`][Self::reset] on its state transitions so stale
/// statistics never leak into a new evaluation period.
///
/// # Thread safety
///
/// All operations are safe to call from many threads concurrently without external
/// locking, and none of them blocks, sleeps, or awaits. The window advances via
/// compare-and-swap, and the snapshot cache is refreshed by whichever single thread
/// wins the claim for an interval while every other caller reads the cache untouched.
///
/// # Examples
///
/// ```
/// use tripwire::{Clock, HealthTracker, TrackerOptions};
///
/// let tracker = HealthTracker::new(TrackerOptions::new("payments-api"), &Clock::new());
///
/// tracker.record_success();
/// tracker.record_failure();
///
/// if tracker.should_open() {
///     // stop sending traffic to the resource
/// }
/// ```
pub struct HealthTracker {
    window: RollingWindow,
    options: TrackerOptions,
    sink: Arc<dyn EventSink>,
    snapshot: ArcSwap<HealthSnapshot>,
    last_refresh_at: AtomicU64,
    snapshot_interval_millis: u64,
    clock: Clock,
}

impl HealthTracker {
    /// Creates a tracker that discards event notifications.
    #[must_use]
    pub fn new(options: TrackerOptions, clock: &Clock) -> Self {
        Self::with_event_sink(options, clock, Arc::new(NoopEventSink))
    }

    /// Creates a tracker that notifies the given sink for every recorded outcome.
    #[must_use]
    pub fn with_event_sink(options: TrackerOptions, clock: &Clock, sink: Arc<dyn EventSink>) -> Self {
        Self {
            window: RollingWindow::new(options.window(), options.num_buckets(), clock.clone()),
            snapshot: ArcSwap::from_pointee(HealthSnapshot::EMPTY),
            last_refresh_at: AtomicU64::new(clock.now_millis()),
            snapshot_interval_millis: duration_to_millis(options.snapshot_interval()),
            options,
            sink,
            clock: clock.clone(),
        }
    }

    /// The key identifying the protected resource.
    #[must_use]
    pub fn key(&self) -> &BreakerKey {
        self.options.key()
    }

    /// Records a successful call: notifies the event sink, then counts the outcome in
    /// the rolling window.
    pub fn record_success(&self) {
        self.sink.mark_event(Outcome::Success, self.options.key());
        self.window.increment(Outcome::Success);
    }

    /// Records a failed call: notifies the event sink, then counts the outcome in the
    /// rolling window.
    pub fn record_failure(&self) {
        self.sink.mark_event(Outcome::Failure, self.options.key());
        self.window.increment(Outcome::Failure);
    }

    /// Returns the health snapshot, refreshing the cache if it is older than the
    /// configured snapshot interval.
    ///
    /// The refresh is claimed by compare-and-swap on the last-refresh timestamp; only
    /// the winning thread recomputes the rolling sums and stores the fresh snapshot,
    /// while losers and fresh-cache readers return the cached value unchanged. This
    /// bounds the cost of summing the window to at most once per interval regardless
    /// of call volume, and no caller ever blocks.
    ///
    /// A call after a long idle period recycles stale window buckets as a side effect;
    /// reads may evict, but they never fabricate counts.
    pub fn health_snapshot(&self) -> HealthSnapshot {
        let last = self.last_refresh_at.load(Ordering::Acquire);
        let now = self.clock.now_millis();

        if now.saturating_sub(last) >= self.snapshot_interval_millis
            && self
                .last_refresh_at
                .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            let successes = self.window.rolling_sum(Outcome::Success);
            let failures = self.window.rolling_sum(Outcome::Failure);
            let snapshot = HealthSnapshot::new(successes, failures);
            self.snapshot.store(Arc::new(snapshot));

            #[cfg(feature = "logs")]
            tracing::event!(
                name: "tripwire.health.refreshed",
                tracing::Level::DEBUG,
                breaker.key = self.options.key().as_str(),
                health.total_count = snapshot.total_count(),
                health.error_count = snapshot.error_count(),
                health.error_percentage = snapshot.error_percentage(),
            );

            return snapshot;
        }

        **self.snapshot.load()
    }

    /// Answers whether the error rate has crossed the configured threshold with enough
    /// traffic to be statistically meaningful.
    ///
    /// Returns `false` whenever the snapshot's total volume is below the request
    /// volume threshold, regardless of the error percentage; otherwise compares the
    /// error percentage against the configured threshold. The decision of what happens
    /// when the circuit opens belongs to the caller.
    #[must_use]
    pub fn should_open(&self) -> bool {
        let snapshot = self.health_snapshot();

        if snapshot.total_count() < self.options.request_volume_threshold() {
            // Not enough traffic to judge.
            return false;
        }

        snapshot.error_percentage() >= self.options.error_threshold_percentage()
    }

    /// Drops all window history and re-arms the snapshot cache.
    ///
    /// The rolling window is cleared, the refresh timestamp moves to now, and the
    /// cached snapshot becomes the all-zero snapshot, so statistics from before the
    /// reset never count toward the next evaluation period. Intended for breaker state
    /// transitions (for example closed → open → closed).
    pub fn reset(&self) {
        self.window.reset();
        self.last_refresh_at.store(self.clock.now_millis(), Ordering::Release);
        self.snapshot.store(Arc::new(HealthSnapshot::EMPTY));
    }
}

impl fmt::Debug for HealthTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = **self.snapshot.load();
        f.debug_struct("HealthTracker")
            .field("options", &self.options)
            .field("window", &self.window)
            .field("snapshot", &snapshot)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

    use crate::clock::ClockControl;

    use super::*;

    const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(500);

    static_assertions::assert_impl_all!(HealthTracker: Debug, Send, Sync);

    fn test_options() -> TrackerOptions {
        TrackerOptions::new("test")
            .with_window(Duration::from_secs(10))
            .with_num_buckets(10)
            .with_snapshot_interval(SNAPSHOT_INTERVAL)
            .with_request_volume_threshold(20)
            .with_error_threshold_percentage(50)
    }

    fn tracker_with_control() -> (HealthTracker, ClockControl) {
        let control = ClockControl::new();
        let tracker = HealthTracker::new(test_options(), &control.to_clock());
        (tracker, control)
    }

    /// Moves past the snapshot interval so the next read recomputes the cache.
    fn force_refresh(control: &ClockControl) {
        control.advance(SNAPSHOT_INTERVAL);
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        events: Mutex<Vec<(Outcome, String)>>,
    }

    impl EventSink for RecordingSink {
        fn mark_event(&self, outcome: Outcome, key: &BreakerKey) {
            self.events.lock().unwrap().push((outcome, key.to_string()));
        }
    }

    #[test]
    fn snapshot_counts_every_recorded_outcome() {
        let (tracker, control) = tracker_with_control();

        for _ in 0..7 {
            tracker.record_success();
        }
        for _ in 0..3 {
            tracker.record_failure();
        }

        force_refresh(&control);
        let snapshot = tracker.health_snapshot();

        assert_eq!(snapshot.total_count(), 10);
        assert_eq!(snapshot.error_count(), 3);
        assert_eq!(snapshot.error_percentage(), 30);
    }

    #[test]
    fn initial_snapshot_is_empty() {
        let (tracker, _control) = tracker_with_control();

        let snapshot = tracker.health_snapshot();

        assert_eq!(snapshot.total_count(), 0);
        assert_eq!(snapshot.error_count(), 0);
        assert_eq!(snapshot.error_percentage(), 0);
    }

    #[test]
    fn fresh_cache_is_not_recomputed() {
        let (tracker, control) = tracker_with_control();

        tracker.record_failure();
        force_refresh(&control);
        let first = tracker.health_snapshot();
        assert_eq!(first.error_count(), 1);

        // New traffic within the interval is invisible until the next refresh.
        tracker.record_failure();
        tracker.record_failure();
        let second = tracker.health_snapshot();

        assert_eq!(second, first);

        force_refresh(&control);
        assert_eq!(tracker.health_snapshot().error_count(), 3);
    }

    #[test]
    fn error_percentage_floors() {
        let (tracker, control) = tracker_with_control();

        tracker.record_success();
        tracker.record_success();
        tracker.record_failure();

        force_refresh(&control);
        assert_eq!(tracker.health_snapshot().error_percentage(), 33);
    }

    #[test]
    fn should_open_requires_minimum_volume() {
        let (tracker, control) = tracker_with_control();

        // 5 calls, all failures: 100 % error rate but below the volume threshold of 20.
        for _ in 0..5 {
            tracker.record_failure();
        }

        force_refresh(&control);
        assert!(!tracker.should_open());
    }

    #[test]
    fn should_open_at_error_threshold() {
        let (tracker, control) = tracker_with_control();

        // 20 calls, 10 failures: exactly at the 50 % threshold with enough volume.
        for _ in 0..10 {
            tracker.record_success();
            tracker.record_failure();
        }

        force_refresh(&control);
        assert!(tracker.should_open());
    }

    #[test]
    fn should_not_open_below_error_threshold() {
        let (tracker, control) = tracker_with_control();

        // 20 calls, 9 failures: 45 % is below the 50 % threshold.
        for _ in 0..11 {
            tracker.record_success();
        }
        for _ in 0..9 {
            tracker.record_failure();
        }

        force_refresh(&control);
        assert!(!tracker.should_open());
    }

    #[test]
    fn outcomes_recorded_at_time_zero_are_visible() {
        let control = ClockControl::new_at(SystemTime::UNIX_EPOCH);
        let options = test_options().with_snapshot_interval(Duration::ZERO);
        let tracker = HealthTracker::new(options, &control.to_clock());

        for _ in 0..5 {
            tracker.record_failure();
        }

        let snapshot = tracker.health_snapshot();
        assert_eq!(snapshot.total_count(), 5);
        assert_eq!(snapshot.error_count(), 5);
    }

    #[test]
    fn old_failures_age_out_of_the_decision() {
        let (tracker, control) = tracker_with_control();

        for _ in 0..40 {
            tracker.record_failure();
        }

        // Idle past the whole window, then a single success.
        control.advance(Duration::from_secs(11));
        tracker.record_success();

        force_refresh(&control);
        let snapshot = tracker.health_snapshot();

        assert_eq!(snapshot.total_count(), 1);
        assert_eq!(snapshot.error_count(), 0);
        assert!(!tracker.should_open());
    }

    #[test]
    fn reset_yields_all_zero_snapshot_immediately() {
        let (tracker, control) = tracker_with_control();

        for _ in 0..100 {
            tracker.record_failure();
        }
        force_refresh(&control);
        assert!(tracker.should_open());

        tracker.reset();
        let snapshot = tracker.health_snapshot();

        assert_eq!(snapshot.total_count(), 0);
        assert_eq!(snapshot.error_count(), 0);
        assert_eq!(snapshot.error_percentage(), 0);
        assert!(!tracker.should_open());
    }

    #[test]
    fn reset_starts_a_fresh_evaluation_period() {
        let (tracker, control) = tracker_with_control();

        for _ in 0..100 {
            tracker.record_failure();
        }
        tracker.reset();

        // Only post-reset traffic counts.
        for _ in 0..30 {
            tracker.record_success();
        }

        force_refresh(&control);
        let snapshot = tracker.health_snapshot();

        assert_eq!(snapshot.total_count(), 30);
        assert_eq!(snapshot.error_count(), 0);
    }

    #[test]
    fn events_reach_the_sink_with_the_key() {
        let control = ClockControl::new();
        let sink = Arc::new(RecordingSink::default());
        let tracker = HealthTracker::with_event_sink(
            test_options(),
            &control.to_clock(),
            Arc::clone(&sink) as Arc<dyn EventSink>,
        );

        tracker.record_success();
        tracker.record_failure();

        let events = sink.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (Outcome::Success, "test".to_string()),
                (Outcome::Failure, "test".to_string()),
            ]
        );
    }

    #[test]
    fn key_is_exposed() {
        let (tracker, _control) = tracker_with_control();
        assert_eq!(tracker.key().to_string(), "test");
    }
}
