// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::key::BreakerKey;
use crate::outcome::Outcome;

/// Receives a notification for every outcome recorded by a
/// [`HealthTracker`][crate::HealthTracker].
///
/// Notification is best-effort and fire-and-forget: the tracker calls
/// [`mark_event`][Self::mark_event] on the hot path of every protected call, before it
/// updates its own counters. Implementations must not block and must not panic; there
/// is no error channel back into the recording path, and a panic would surface in the
/// caller of `record_success`/`record_failure`.
///
/// Typical implementations forward to an event bus or a metrics pipeline owned by the
/// surrounding breaker-management layer.
pub trait EventSink: Send + Sync {
    /// Called once per recorded outcome with the key of the tracker that recorded it.
    fn mark_event(&self, outcome: Outcome, key: &BreakerKey);
}

/// Event sink that discards every notification.
///
/// The default sink for trackers constructed without one.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn mark_event(&self, _outcome: Outcome, _key: &BreakerKey) {}
}
