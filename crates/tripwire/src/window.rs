// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::clock::{Clock, duration_to_millis};
use crate::outcome::Outcome;

/// One slot of the circular sequence.
///
/// `epoch` identifies the wall-clock range the slot currently covers; live epochs are
/// biased by one so that 0 unambiguously marks an empty slot even for the range starting
/// at time zero. Counters for a new epoch are zeroed before the epoch is published, so a
/// writer that observed the published epoch can never lose an increment to the recycling.
#[derive(Debug)]
struct Bucket {
    epoch: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl Bucket {
    const fn empty() -> Self {
        Self {
            epoch: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    fn counter(&self, outcome: Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::Success => &self.successes,
            Outcome::Failure => &self.failures,
        }
    }
}

/// Time-bucketed success/failure counter over a sliding window.
///
/// The window is a fixed-length circular sequence of buckets, each covering
/// `window / num_buckets` of wall time. Buckets advance lazily as traffic arrives;
/// there is no background timer. Stale slots are recycled the first time any operation
/// observes that time has moved past them, which means reads may evict (leaving zeroed
/// buckets behind) but never fabricate counts.
///
/// All operations are lock-free: per-outcome counts are independent atomics and the
/// advance of the circular cursor is a compare-and-swap that exactly one thread wins
/// per elapsed bucket, with losers retrying their increment against the bucket the
/// winner published.
#[derive(Debug)]
pub(crate) struct RollingWindow {
    buckets: Box<[Bucket]>,
    newest_epoch: AtomicU64,
    bucket_millis: u64,
    num_buckets: u64,
    clock: Clock,
}

impl RollingWindow {
    pub fn new(window: Duration, num_buckets: u32, clock: Clock) -> Self {
        let num_buckets = num_buckets.max(1);
        let buckets: Box<[Bucket]> = (0..num_buckets).map(|_| Bucket::empty()).collect();

        let num_buckets = u64::from(num_buckets);
        let bucket_millis = (duration_to_millis(window) / num_buckets).max(1);

        Self {
            buckets,
            newest_epoch: AtomicU64::new(0),
            bucket_millis,
            num_buckets,
            clock,
        }
    }

    /// Adds one outcome to the bucket covering the current time, advancing the
    /// circular cursor first if time has moved past the newest bucket.
    pub fn increment(&self, outcome: Outcome) {
        let epoch = self.current_epoch();
        self.roll_to(epoch);

        // Another thread may advance the cursor between the roll and the add; retry
        // against the bucket it published rather than resurrecting a recycled slot.
        let mut target = epoch;
        loop {
            target = target.max(self.newest_epoch.load(Ordering::Acquire));
            let bucket = self.bucket_for(target);
            if bucket.epoch.load(Ordering::Acquire) == target {
                let _ = bucket.counter(outcome).fetch_add(1, Ordering::Relaxed);
                return;
            }
            std::hint::spin_loop();
        }
    }

    /// Sums the outcome's count across every bucket whose start time is no older than
    /// the window length before now.
    ///
    /// Entering a new epoch recycles stale slots first, so a read after a long idle
    /// period mutates bucket state the same way a write would; it only ever produces
    /// zeroed buckets.
    pub fn rolling_sum(&self, outcome: Outcome) -> u64 {
        let epoch = self.current_epoch();
        self.roll_to(epoch);

        let oldest = epoch.saturating_sub(self.num_buckets - 1);
        let mut sum = 0_u64;
        for bucket in &self.buckets {
            let slot_epoch = bucket.epoch.load(Ordering::Acquire);
            if slot_epoch != 0 && slot_epoch >= oldest {
                sum = sum.saturating_add(bucket.counter(outcome).load(Ordering::Relaxed));
            }
        }
        sum
    }

    /// Drops all accumulated counts immediately.
    ///
    /// Slots are emptied and the cursor rewound, so the next operation re-initializes
    /// the sequence from scratch. An increment racing with the reset may survive it;
    /// it linearizes after the reset.
    pub fn reset(&self) {
        self.newest_epoch.store(0, Ordering::Release);
        for bucket in &self.buckets {
            bucket.epoch.store(0, Ordering::Release);
            bucket.successes.store(0, Ordering::Relaxed);
            bucket.failures.store(0, Ordering::Relaxed);
        }
    }

    fn current_epoch(&self) -> u64 {
        // Biased by one so an epoch of 0 always means an empty slot, even at time zero.
        // bucket_millis >= 1 by construction.
        self.clock.now_millis() / self.bucket_millis + 1
    }

    /// Advances the cursor to `epoch`, recycling every slot entered on the way.
    ///
    /// Exactly one thread wins the compare-and-swap per advance and becomes the sole
    /// owner of the recycling; everyone else observes `newest_epoch` at or past their
    /// target and proceeds. Counters of a recycled slot are zeroed before its new
    /// epoch is published.
    fn roll_to(&self, epoch: u64) {
        loop {
            let newest = self.newest_epoch.load(Ordering::Acquire);
            if newest >= epoch {
                return;
            }

            if self
                .newest_epoch
                .compare_exchange(newest, epoch, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Lost the race; re-evaluate against the new cursor.
                continue;
            }

            // At most one full lap: a gap of `num_buckets` or more means every slot
            // holds stale data and the whole sequence is cleared.
            let first = if newest == 0 || epoch - newest >= self.num_buckets {
                // Live epochs start at 1; never publish the empty sentinel.
                epoch.saturating_sub(self.num_buckets - 1).max(1)
            } else {
                newest + 1
            };

            for entered in first..=epoch {
                let bucket = self.bucket_for(entered);
                bucket.successes.store(0, Ordering::Relaxed);
                bucket.failures.store(0, Ordering::Relaxed);
                bucket.epoch.store(entered, Ordering::Release);
            }
            return;
        }
    }

    fn bucket_for(&self, epoch: u64) -> &Bucket {
        #[expect(clippy::cast_possible_truncation, reason = "the index is modulo the bucket count")]
        let index = (epoch % self.num_buckets) as usize;
        &self.buckets[index]
    }
}
