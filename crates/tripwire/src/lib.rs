// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Windowed failure-rate health tracking for circuit breakers.
//!
//! This crate answers one question cheaply enough to ask on every request: **has the
//! error rate of a protected resource crossed the configured threshold with enough
//! traffic to be statistically meaningful?** It accumulates success/failure outcomes
//! over a sliding time window and derives an error percentage from it, leaving the
//! open/half-open/closed state machine, trip timers, and probing to the breaker layer
//! built on top.
//!
//! # Core Types
//!
//! - [`HealthTracker`]: records outcomes, caches a periodically refreshed
//!   [`HealthSnapshot`], and evaluates the open decision against the configured
//!   thresholds.
//! - [`TrackerOptions`]: the read-only configuration supplied at construction.
//! - [`EventSink`]: fire-and-forget notification hook invoked for every recorded
//!   outcome.
//! - [`Clock`]: injectable time source; [`ClockControl`] makes time-dependent tests
//!   deterministic.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use tripwire::{Clock, HealthTracker, TrackerOptions};
//!
//! let options = TrackerOptions::new("payments-api")
//!     .with_window(Duration::from_secs(10))
//!     .with_request_volume_threshold(20)
//!     .with_error_threshold_percentage(50);
//!
//! let tracker = HealthTracker::new(options, &Clock::new());
//!
//! // On every completed call:
//! tracker.record_success();
//! tracker.record_failure();
//!
//! // Periodically, from the breaker state machine:
//! if tracker.should_open() {
//!     // stop sending traffic to the resource
//! }
//! ```
//!
//! # Design Notes
//!
//! The rolling window is a fixed-length circular sequence of time buckets that
//! advances lazily as traffic arrives; there is no background timer thread. Stale
//! buckets are recycled the first time any operation notices that time has moved past
//! them, which means **reads may evict**: a [`health_snapshot`][HealthTracker::health_snapshot]
//! call after a long idle period clears stale buckets as a side effect, though it only
//! ever leaves zeroed buckets behind.
//!
//! All operations are lock-free and none of them blocks, sleeps, or awaits. Bucket
//! advancement and snapshot refresh both use single-writer-wins compare-and-swap, so
//! at most one thread per interval pays for recomputing the rolling sums while every
//! other caller reads the cached snapshot.
//!
//! # Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`TrackerOptions`] and
//!   [`BreakerKey`] so configuration can be produced by an external loader.
//! - `logs`: emits a `tracing` debug event each time the snapshot cache is refreshed
//!   (naturally bounded to once per snapshot interval).

mod clock;
mod event;
mod key;
mod options;
mod outcome;
mod snapshot;
mod tracker;
mod window;

pub use clock::{Clock, ClockControl};
pub use event::{EventSink, NoopEventSink};
pub use key::BreakerKey;
pub use options::TrackerOptions;
pub use outcome::Outcome;
pub use snapshot::HealthSnapshot;
pub use tracker::HealthTracker;
