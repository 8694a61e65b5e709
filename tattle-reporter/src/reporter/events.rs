// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

/// A test event.
///
/// Events are produced by the input multiplexer in
/// [`input`](crate::input) and consumed by a
/// [`DisplayReporter`](crate::reporter::DisplayReporter).
#[derive(Clone, Debug)]
pub enum TestEvent<'a> {
    /// The run started. Always the first event.
    RunStarted,

    /// A test started running on some stream.
    TestStarted {
        /// The name of the test, exactly as declared by the harness.
        name: &'a str,

        /// Current run statistics so far.
        current_stats: RunStats,
    },

    /// The current test on some stream passed.
    TestPassed {
        /// Current run statistics, including this pass.
        current_stats: RunStats,
    },

    /// The current test on some stream failed.
    TestFailed {
        /// The failure record, owned by the aggregator.
        failure: &'a Failure,

        /// Current run statistics, including this failure.
        current_stats: RunStats,
    },

    /// The run finished: all streams closed and all abrupt-end failures
    /// synthesized. Always the last event.
    RunFinished {
        /// Final statistics for the run.
        run_stats: RunStats,

        /// Every failure discovered during the run, in discovery order
        /// across all streams.
        failures: &'a [Failure],
    },
}

/// Statistics for a run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed, including synthesized failures.
    pub failed: usize,

    /// The sum of all positive `##>` count declarations seen so far. This is
    /// a hint from the harness, not ground truth.
    pub declared_count: usize,
}

impl RunStats {
    /// Returns the number of tests that finished.
    pub fn finished_count(&self) -> usize {
        self.passed + self.failed
    }

    /// Returns the total to display: the declared count, unless more tests
    /// have already finished than were declared.
    pub fn expected_total(&self) -> usize {
        self.declared_count.max(self.finished_count())
    }

    /// Returns true if this run is considered a success.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// A failed test: its name, if known, and the error text reported for it.
///
/// Failure records are created by the aggregator and immutable afterwards.
/// Synthesized failures (protocol violations, truncated streams) go through
/// the same type as genuine `##-` failures.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    /// The name of the test that failed, or `None` if the failure could not
    /// be attributed to a named test.
    pub name: Option<String>,

    /// The error text.
    pub error: String,
}

impl Failure {
    /// Returns the test name, or a placeholder if the name is unknown.
    pub fn name_or_placeholder(&self) -> &str {
        self.name.as_deref().unwrap_or("<unknown>")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name_or_placeholder(), self.error)
    }
}

/// The error text synthesized when a `##+` arrives while a test is still
/// open on the same stream.
pub const UNTERMINATED_ERROR: &str = "unterminated test case";

/// The error text synthesized when a stream closes with a test still open.
pub const ABRUPT_END_ERROR: &str = "abrupt output end";
