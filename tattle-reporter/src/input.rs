// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input streams and the round-robin multiplexer.
//!
//! Each input slot is an independently-closing line stream with its own
//! [`StreamState`]. The multiplexer sweeps all still-open slots in index
//! order, reading one line per slot per sweep, and dispatches every line
//! through the classifier to the aggregator and the display reporter. This
//! is a deliberately simple single-threaded design: "parallel mode" merges
//! multiple input sources, not multiple threads, and events reach the
//! reporter in one deterministic global order.

use crate::{
    errors::WriteEventError,
    protocol::{MarkerLine, parse_marker_line},
    reporter::{
        ABRUPT_END_ERROR, DisplayReporter, RunAggregator, TestEvent, UNTERMINATED_ERROR,
    },
};
use std::io::BufRead;
use tracing::{debug, warn};

/// Test state for a single input stream.
///
/// Never shared across streams: each slot tracks its own open test, which is
/// what allows true multiplexing without cross-talk.
#[derive(Debug, Default)]
pub struct StreamState {
    current_test: Option<String>,
}

impl StreamState {
    /// The name of the test currently open on this stream, if any.
    pub fn current_test(&self) -> Option<&str> {
        self.current_test.as_deref()
    }
}

struct InputSlot<R> {
    /// `None` once the stream has reached end-of-stream.
    reader: Option<R>,
    state: StreamState,
}

/// Round-robins line reads across any number of independently-closing input
/// streams, feeding every line through the protocol pipeline.
pub struct InputMux<R> {
    slots: Vec<InputSlot<R>>,
}

impl<R: BufRead> InputMux<R> {
    /// Creates a multiplexer over the given input streams. Non-parallel mode
    /// is simply a multiplexer with a single slot.
    pub fn new(readers: Vec<R>) -> Self {
        Self {
            slots: readers
                .into_iter()
                .map(|reader| InputSlot {
                    reader: Some(reader),
                    state: StreamState::default(),
                })
                .collect(),
        }
    }

    /// Creates a multiplexer over a single input stream.
    pub fn single(reader: R) -> Self {
        Self::new(vec![reader])
    }

    /// Drives every slot to end-of-stream, recording results in the
    /// aggregator and rendering them through the reporter.
    ///
    /// Once all slots have closed, a failure is synthesized for every slot
    /// that still has a test open, and the final report is rendered. The
    /// caller derives the process exit status from
    /// [`RunAggregator::is_success`].
    pub fn run(
        mut self,
        aggregator: &mut RunAggregator,
        reporter: &mut DisplayReporter<'_>,
    ) -> Result<(), WriteEventError> {
        reporter.write_event(&TestEvent::RunStarted)?;

        let mut line = Vec::new();
        loop {
            // One sweep: a single read attempt per still-open slot, in index
            // order. A sweep with no successful reads means every slot has
            // closed.
            let mut progressed = false;
            for (index, slot) in self.slots.iter_mut().enumerate() {
                let Some(reader) = slot.reader.as_mut() else {
                    continue;
                };
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => {
                        debug!(slot = index, "end of stream");
                        slot.reader = None;
                    }
                    Ok(_) => {
                        progressed = true;
                        // Lossy conversion: marker bytes are ASCII, so noisy
                        // binary output cannot corrupt classification.
                        let text = String::from_utf8_lossy(trim_line_terminator(&line));
                        process_line(&text, &mut slot.state, aggregator, reporter)?;
                    }
                    Err(err) => {
                        // The job is to summarize an unreliable stream, not
                        // to validate it; a failed read closes the slot and
                        // the run carries on.
                        warn!(slot = index, "read error, closing slot: {err}");
                        slot.reader = None;
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        // Any slot that closed mid-test contributes exactly one synthesized
        // failure.
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(name) = slot.state.current_test.take() {
                debug!(slot = index, "stream closed with test {name:?} still open");
                let (failure, current_stats) =
                    aggregator.record_fail(Some(name), ABRUPT_END_ERROR);
                reporter.write_event(&TestEvent::TestFailed {
                    failure,
                    current_stats,
                })?;
            }
        }

        reporter.write_event(&TestEvent::RunFinished {
            run_stats: aggregator.stats(),
            failures: aggregator.failures(),
        })
    }
}

/// Processes one line (terminator already stripped) from the stream that
/// owns `state`, updating the aggregator and reporter on marker lines. All
/// other lines are discarded silently.
pub fn process_line(
    line: &str,
    state: &mut StreamState,
    aggregator: &mut RunAggregator,
    reporter: &mut DisplayReporter<'_>,
) -> Result<(), WriteEventError> {
    let Some(marker) = parse_marker_line(line) else {
        return Ok(());
    };
    match marker {
        MarkerLine::TestBegin { name } => {
            // A begin with a test still open is a protocol violation: fail
            // the previous test through the normal path before opening the
            // new one, so no test name is silently dropped.
            if let Some(previous) = state.current_test.take() {
                let (failure, current_stats) =
                    aggregator.record_fail(Some(previous), UNTERMINATED_ERROR);
                reporter.write_event(&TestEvent::TestFailed {
                    failure,
                    current_stats,
                })?;
            }
            state.current_test = Some(name.to_owned());
            reporter.write_event(&TestEvent::TestStarted {
                name,
                current_stats: aggregator.stats(),
            })?;
        }
        MarkerLine::TestPassed => {
            state.current_test = None;
            let current_stats = aggregator.record_pass();
            reporter.write_event(&TestEvent::TestPassed { current_stats })?;
        }
        MarkerLine::TestFailed { error } => {
            let name = state.current_test.take();
            let (failure, current_stats) = aggregator.record_fail(name, error);
            reporter.write_event(&TestEvent::TestFailed {
                failure,
                current_stats,
            })?;
        }
        MarkerLine::CountDeclared { count } => {
            aggregator.declare_count(count);
        }
    }
    Ok(())
}

fn trim_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
