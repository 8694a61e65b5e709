// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Failure, RunStats};

/// Aggregates results across every input stream.
///
/// This is the sole mutation point for the run counters and the failure
/// list: the multiplexer records events here and nowhere else, so
/// [`RunStats::failed`] and the failure list stay in lockstep at every
/// observable point.
#[derive(Debug, Default)]
pub struct RunAggregator {
    stats: RunStats,
    failures: Vec<Failure>,
}

impl RunAggregator {
    /// Creates a new, empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a passed test, returning updated statistics.
    pub fn record_pass(&mut self) -> RunStats {
        self.stats.passed += 1;
        self.stats
    }

    /// Records a failed test, appending it to the failure list.
    ///
    /// Returns the newly created record along with updated statistics. The
    /// record is appended in arrival order: the failure list is one global
    /// sequence across all streams, not per-stream.
    pub fn record_fail(
        &mut self,
        name: Option<String>,
        error: impl Into<String>,
    ) -> (&Failure, RunStats) {
        self.stats.failed += 1;
        self.failures.push(Failure {
            name,
            error: error.into(),
        });
        // Just pushed, so the list is non-empty.
        (self.failures.last().unwrap(), self.stats)
    }

    /// Records a `##>` count declaration. Non-positive counts are ignored,
    /// not errors: the declared total is only ever a hint.
    pub fn declare_count(&mut self, count: i64) {
        if count > 0 {
            self.stats.declared_count = self
                .stats
                .declared_count
                .saturating_add(count as usize);
        }
    }

    /// Current statistics for the run.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Every failure recorded so far, in discovery order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Returns true if no test has failed.
    pub fn is_success(&self) -> bool {
        debug_assert_eq!(
            self.stats.failed,
            self.failures.len(),
            "failed count and failure list must stay in lockstep"
        );
        self.stats.is_success()
    }
}
