// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Point-in-time view of the rolling window used to evaluate the open decision.
///
/// Snapshots are immutable values: a refresh creates a fresh one and replaces the
/// cached copy wholesale, so a snapshot in hand is always internally consistent.
#[must_use]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    total_count: u64,
    error_count: u64,
    error_percentage: u32,
}

impl HealthSnapshot {
    /// The all-zero snapshot used before any refresh and after a reset.
    pub(crate) const EMPTY: Self = Self {
        total_count: 0,
        error_count: 0,
        error_percentage: 0,
    };

    pub(crate) fn new(success_count: u64, error_count: u64) -> Self {
        let total_count = success_count.saturating_add(error_count);
        if total_count == 0 {
            return Self::EMPTY;
        }

        #[expect(clippy::cast_possible_truncation, reason = "the quotient is at most 100")]
        let error_percentage = (u128::from(error_count) * 100 / u128::from(total_count)) as u32;

        Self {
            total_count,
            error_count,
            error_percentage,
        }
    }

    /// Total number of outcomes observed within the window at refresh time.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of failures observed within the window at refresh time.
    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Failures as a whole percentage of the total, rounded down.
    ///
    /// Defined as `0` when [`total_count`][Self::total_count] is zero; the value is
    /// never produced by a division in that case.
    #[must_use]
    pub fn error_percentage(&self) -> u32 {
        self.error_percentage
    }
}
