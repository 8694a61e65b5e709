// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renders test events to the terminal.
//!
//! The main type here is [`DisplayReporter`], which is constructed via a
//! [`DisplayReporterBuilder`]. The reporter runs in one of four modes, fixed
//! for its whole lifetime:
//!
//! - [`Inline`](ReportMode::Inline): one status line, rewritten in place.
//! - [`Character`](ReportMode::Character): one glyph per result, in a grid.
//! - [`Lines`](ReportMode::Lines): one line per test.
//! - [`Summary`](ReportMode::Summary): machine-readable sentinel lines only.
//!
//! Every event write is flushed immediately, so progress is visible while
//! the harness is still running.

use super::{Failure, RunStats, TestEvent, helpers::Styles};
use crate::errors::WriteEventError;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// The progress rendering mode.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ReportMode {
    /// A single status line, erased and rewritten as results arrive.
    Inline,

    /// One colored glyph per result: `o` for a pass, `X` for a failure, with
    /// a space after every 10th result and a running count after every 50th.
    #[default]
    Character,

    /// One line per test: `<name>...` followed by `ok` or `failed`.
    Lines,

    /// A fixed two-line sentinel protocol (`##+`, then `##-ok` or
    /// `##-fail <n> failed`), suitable for feeding into another instance of
    /// this tool.
    Summary,
}

/// Standard output destination for the reporter.
///
/// This is usually the terminal, but can be an in-memory buffer for tests.
pub enum ReporterOutput<'a> {
    /// Produce output on the (possibly piped) terminal.
    Terminal,

    /// Write output to a buffer.
    Buffer(&'a mut Vec<u8>),
}

/// Display reporter builder.
#[derive(Debug, Default)]
pub struct DisplayReporterBuilder {
    /// The rendering mode.
    pub mode: ReportMode,

    /// The left margin, in spaces, applied after every rendered newline.
    /// Forced to zero in summary mode.
    pub indent: usize,

    /// True if the reporter should colorize output.
    pub should_colorize: bool,
}

impl DisplayReporterBuilder {
    /// Creates a new display reporter.
    pub fn build(self, output: ReporterOutput<'_>) -> DisplayReporter<'_> {
        let mut styles = Styles::default();
        if self.should_colorize {
            styles.colorize();
        }

        // The summary sentinels must stay machine-parseable, so indentation
        // is forced off in that mode.
        let indent = match self.mode {
            ReportMode::Summary => 0,
            _ => self.indent,
        };

        DisplayReporter {
            inner: DisplayReporterImpl {
                mode: self.mode,
                indent,
                styles,
                line_chars: 0,
            },
            output: match output {
                ReporterOutput::Terminal => ReporterOutputImpl::Terminal(io::stdout()),
                ReporterOutput::Buffer(buf) => ReporterOutputImpl::Buffer(buf),
            },
        }
    }
}

/// Renders test events to standard output (or an in-memory buffer) in one of
/// four modes.
pub struct DisplayReporter<'a> {
    inner: DisplayReporterImpl,
    output: ReporterOutputImpl<'a>,
}

impl DisplayReporter<'_> {
    /// Renders a single test event, flushing afterwards so output is visible
    /// incrementally.
    pub fn write_event(&mut self, event: &TestEvent<'_>) -> Result<(), WriteEventError> {
        match &mut self.output {
            ReporterOutputImpl::Terminal(stdout) => {
                let mut lock = stdout.lock();
                self.inner
                    .write_event_impl(event, &mut lock)
                    .map_err(WriteEventError::Io)?;
                lock.flush().map_err(WriteEventError::Io)
            }
            ReporterOutputImpl::Buffer(buf) => self
                .inner
                .write_event_impl(event, buf)
                .map_err(WriteEventError::Io),
        }
    }
}

enum ReporterOutputImpl<'a> {
    Terminal(io::Stdout),
    Buffer(&'a mut Vec<u8>),
}

struct DisplayReporterImpl {
    mode: ReportMode,
    indent: usize,
    styles: Styles,
    /// Visible characters written since the last line start. Inline mode
    /// erases this many characters to rewrite its status line. ANSI escapes
    /// and the indent margin are excluded from the count.
    line_chars: usize,
}

impl DisplayReporterImpl {
    fn write_event_impl(
        &mut self,
        event: &TestEvent<'_>,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        match event {
            TestEvent::RunStarted => {
                if self.mode != ReportMode::Inline {
                    self.write_indent(writer)?;
                }
                if self.mode == ReportMode::Summary {
                    writer.write_all(b"##+\n")?;
                }
            }
            TestEvent::TestStarted {
                name,
                current_stats,
            } => match self.mode {
                ReportMode::Lines => {
                    self.write_counted(writer, name)?;
                    self.write_counted(writer, "...")?;
                }
                ReportMode::Inline => {
                    self.clear_line(writer)?;
                    self.write_passed_count(writer, *current_stats)?;
                    self.write_counted(writer, " | ")?;
                    self.write_counted(writer, name)?;
                }
                ReportMode::Character | ReportMode::Summary => {}
            },
            TestEvent::TestPassed { current_stats } => match self.mode {
                ReportMode::Inline => {
                    self.clear_line(writer)?;
                    self.write_passed_count(writer, *current_stats)?;
                    self.write_counted(writer, " | ")?;
                }
                ReportMode::Character => {
                    let style = self.styles.pass;
                    self.write_styled(writer, "o", style)?;
                    self.write_spacer(writer, *current_stats)?;
                }
                ReportMode::Lines => {
                    let style = self.styles.pass;
                    self.write_styled(writer, "ok", style)?;
                    self.write_newline(writer)?;
                }
                ReportMode::Summary => {}
            },
            TestEvent::TestFailed {
                failure,
                current_stats,
            } => match self.mode {
                ReportMode::Inline => {
                    self.clear_line(writer)?;
                    // The very first failure gets its own line so it isn't
                    // erased by the next status update.
                    if current_stats.failed == 1 {
                        self.write_newline(writer)?;
                    }
                    self.write_failure(writer, failure)?;
                }
                ReportMode::Character => {
                    let style = self.styles.fail;
                    self.write_styled(writer, "X", style)?;
                    self.write_spacer(writer, *current_stats)?;
                }
                ReportMode::Lines => {
                    let style = self.styles.fail;
                    self.write_styled(writer, "failed", style)?;
                    self.write_newline(writer)?;
                }
                ReportMode::Summary => {}
            },
            TestEvent::RunFinished {
                run_stats,
                failures,
            } => match self.mode {
                ReportMode::Inline => {
                    self.clear_line(writer)?;
                    self.write_passed_count(writer, *run_stats)?;
                    writer.write_all(b"\n")?;
                }
                ReportMode::Summary => {
                    if run_stats.is_success() {
                        writer.write_all(b"##-ok\n")?;
                    } else {
                        writeln!(writer, "##-fail {} failed", run_stats.failed)?;
                    }
                }
                ReportMode::Character | ReportMode::Lines => {
                    if self.mode == ReportMode::Character {
                        // Close out a partial grid row with a trailing count.
                        let done = run_stats.finished_count();
                        if done % 50 != 0 {
                            if done % 10 != 0 {
                                self.write_counted(writer, " ")?;
                            }
                            self.write_count(writer, done, *run_stats)?;
                            self.write_newline(writer)?;
                        }
                    }
                    for failure in *failures {
                        self.write_failure(writer, failure)?;
                    }
                    self.write_passed_count(writer, *run_stats)?;
                    writer.write_all(b"\n")?;
                }
            },
        }
        Ok(())
    }

    /// Writes a string, counting its visible characters for line erasure.
    fn write_counted(&mut self, writer: &mut dyn Write, s: &str) -> io::Result<()> {
        writer.write_all(s.as_bytes())?;
        self.line_chars += s.chars().count();
        Ok(())
    }

    /// Writes a styled string. Only the content counts as visible
    /// characters: the escape sequences occupy no columns.
    fn write_styled(
        &mut self,
        writer: &mut dyn Write,
        s: &str,
        style: owo_colors::Style,
    ) -> io::Result<()> {
        write!(writer, "{}", s.style(style))?;
        self.line_chars += s.chars().count();
        Ok(())
    }

    /// Starts a new line and applies the left margin. The margin is not
    /// counted as visible: erasure stops at the margin.
    fn write_newline(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(b"\n")?;
        self.write_indent(writer)?;
        self.line_chars = 0;
        Ok(())
    }

    fn write_indent(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        for _ in 0..self.indent {
            writer.write_all(b" ")?;
        }
        Ok(())
    }

    /// Erases the current status line by backing up one character at a time.
    fn clear_line(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        for _ in 0..self.line_chars {
            writer.write_all(b"\x08 \x08")?;
        }
        self.line_chars = 0;
        Ok(())
    }

    /// Writes `<count> of <total>`.
    fn write_count(
        &mut self,
        writer: &mut dyn Write,
        count: usize,
        stats: RunStats,
    ) -> io::Result<()> {
        let formatted = format!("{} of {}", count, stats.expected_total());
        self.write_counted(writer, &formatted)
    }

    /// Writes `<passed> of <total> passed`, plus `<failed> failed` when any
    /// test has failed.
    fn write_passed_count(&mut self, writer: &mut dyn Write, stats: RunStats) -> io::Result<()> {
        self.write_count(writer, stats.passed, stats)?;
        self.write_counted(writer, " ")?;
        if stats.passed > 0 {
            let style = self.styles.pass;
            self.write_styled(writer, "passed", style)?;
        } else {
            self.write_counted(writer, "passed")?;
        }
        if stats.failed > 0 {
            self.write_counted(writer, " ")?;
            let style = self.styles.fail;
            let formatted = format!("{} failed", stats.failed);
            self.write_styled(writer, &formatted, style)?;
        }
        Ok(())
    }

    /// Writes one `<name>: <error>` failure line.
    fn write_failure(&mut self, writer: &mut dyn Write, failure: &Failure) -> io::Result<()> {
        let style = self.styles.fail;
        self.write_styled(writer, failure.name_or_placeholder(), style)?;
        self.write_counted(writer, ": ")?;
        self.write_counted(writer, &failure.error)?;
        self.write_newline(writer)
    }

    /// Character-grid spacing: a space after every 10th result, a running
    /// count and a fresh line after every 50th.
    fn write_spacer(&mut self, writer: &mut dyn Write, stats: RunStats) -> io::Result<()> {
        let done = stats.finished_count();
        if done % 10 == 0 {
            self.write_counted(writer, " ")?;
        }
        if done % 50 == 0 {
            self.write_count(writer, done, stats)?;
            self.write_newline(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Creates a buffer-backed reporter, feeds it events through the given
    /// function, and returns the rendered output.
    fn with_reporter<F>(mode: ReportMode, indent: usize, f: F) -> String
    where
        F: FnOnce(&mut DisplayReporter<'_>),
    {
        let mut out = Vec::new();
        let mut reporter = DisplayReporterBuilder {
            mode,
            indent,
            should_colorize: false,
        }
        .build(ReporterOutput::Buffer(&mut out));
        f(&mut reporter);
        String::from_utf8(out).expect("output is valid UTF-8")
    }

    fn stats(passed: usize, failed: usize, declared_count: usize) -> RunStats {
        RunStats {
            passed,
            failed,
            declared_count,
        }
    }

    fn write(reporter: &mut DisplayReporter<'_>, event: TestEvent<'_>) {
        reporter.write_event(&event).expect("buffer write succeeds");
    }

    #[test]
    fn test_lines_mode() {
        let failures = [Failure {
            name: Some("t2".to_owned()),
            error: "nope".to_owned(),
        }];
        let out = with_reporter(ReportMode::Lines, 0, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestStarted {
                    name: "t1",
                    current_stats: stats(0, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestPassed {
                    current_stats: stats(1, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestStarted {
                    name: "t2",
                    current_stats: stats(1, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestFailed {
                    failure: &failures[0],
                    current_stats: stats(1, 1, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(1, 1, 0),
                    failures: &failures,
                },
            );
        });

        assert_eq!(
            out,
            "t1...ok\nt2...failed\nt2: nope\n1 of 2 passed 1 failed\n"
        );
    }

    #[test]
    fn test_lines_mode_indent() {
        let out = with_reporter(ReportMode::Lines, 2, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestStarted {
                    name: "t1",
                    current_stats: stats(0, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestPassed {
                    current_stats: stats(1, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(1, 0, 0),
                    failures: &[],
                },
            );
        });

        assert_eq!(out, "  t1...ok\n  1 of 1 passed\n");
    }

    #[test]
    fn test_summary_mode_success() {
        let out = with_reporter(ReportMode::Summary, 3, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestStarted {
                    name: "t1",
                    current_stats: stats(0, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestPassed {
                    current_stats: stats(1, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(1, 0, 0),
                    failures: &[],
                },
            );
        });

        // Exactly the two sentinel lines, with indentation forced off.
        assert_eq!(out, "##+\n##-ok\n");
    }

    #[test]
    fn test_summary_mode_failure() {
        let failures = [
            Failure {
                name: Some("a".to_owned()),
                error: "x".to_owned(),
            },
            Failure {
                name: None,
                error: "abrupt output end".to_owned(),
            },
        ];
        let out = with_reporter(ReportMode::Summary, 0, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestFailed {
                    failure: &failures[0],
                    current_stats: stats(0, 1, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestFailed {
                    failure: &failures[1],
                    current_stats: stats(0, 2, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(0, 2, 0),
                    failures: &failures,
                },
            );
        });

        assert_eq!(out, "##+\n##-fail 2 failed\n");
    }

    #[test]
    fn test_character_mode_grid() {
        let out = with_reporter(ReportMode::Character, 0, |reporter| {
            write(reporter, TestEvent::RunStarted);
            let mut passed = 0;
            for _ in 0..12 {
                write(
                    reporter,
                    TestEvent::TestStarted {
                        name: "t",
                        current_stats: stats(passed, 0, 0),
                    },
                );
                passed += 1;
                write(
                    reporter,
                    TestEvent::TestPassed {
                        current_stats: stats(passed, 0, 0),
                    },
                );
            }
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(12, 0, 0),
                    failures: &[],
                },
            );
        });

        // A space after the 10th result, then a trailing count line at
        // finish since 12 is not a multiple of 50.
        assert_eq!(out, "oooooooooo oo 12 of 12\n12 of 12 passed\n");
    }

    #[test]
    fn test_character_mode_failures_listed_at_finish() {
        let failures = [Failure {
            name: Some("b".to_owned()),
            error: "boom".to_owned(),
        }];
        let out = with_reporter(ReportMode::Character, 0, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestPassed {
                    current_stats: stats(1, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestFailed {
                    failure: &failures[0],
                    current_stats: stats(1, 1, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(1, 1, 0),
                    failures: &failures,
                },
            );
        });

        assert_eq!(out, "oX 2 of 2\nb: boom\n1 of 2 passed 1 failed\n");
    }

    #[test]
    fn test_inline_mode_rewrites_status_line() {
        let out = with_reporter(ReportMode::Inline, 0, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestStarted {
                    name: "t1",
                    current_stats: stats(0, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestPassed {
                    current_stats: stats(1, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(1, 0, 0),
                    failures: &[],
                },
            );
        });

        let erase = |n: usize| "\u{8} \u{8}".repeat(n);
        let expected = format!(
            "0 of 0 passed | t1{}1 of 1 passed | {}1 of 1 passed\n",
            erase("0 of 0 passed | t1".chars().count()),
            erase("1 of 1 passed | ".chars().count()),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_inline_mode_first_failure_gets_own_line() {
        let failures = [Failure {
            name: Some("t1".to_owned()),
            error: "boom".to_owned(),
        }];
        let out = with_reporter(ReportMode::Inline, 0, |reporter| {
            write(reporter, TestEvent::RunStarted);
            write(
                reporter,
                TestEvent::TestStarted {
                    name: "t1",
                    current_stats: stats(0, 0, 0),
                },
            );
            write(
                reporter,
                TestEvent::TestFailed {
                    failure: &failures[0],
                    current_stats: stats(0, 1, 0),
                },
            );
            write(
                reporter,
                TestEvent::RunFinished {
                    run_stats: stats(0, 1, 0),
                    failures: &failures,
                },
            );
        });

        let erase = |n: usize| "\u{8} \u{8}".repeat(n);
        let expected = format!(
            "0 of 0 passed | t1{}\nt1: boom\n{}0 of 1 passed 1 failed\n",
            erase("0 of 0 passed | t1".chars().count()),
            // The failure line's trailing newline resets the counter, so
            // nothing needs erasing before the final counts.
            erase(0),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_colorized_passed_count() {
        let mut out = Vec::new();
        let mut reporter = DisplayReporterBuilder {
            mode: ReportMode::Lines,
            indent: 0,
            should_colorize: true,
        }
        .build(ReporterOutput::Buffer(&mut out));
        reporter
            .write_event(&TestEvent::RunFinished {
                run_stats: stats(1, 1, 0),
                failures: &[],
            })
            .expect("buffer write succeeds");
        drop(reporter);

        let out = String::from_utf8(out).expect("output is valid UTF-8");
        // Escape sequences are cosmetic only: the visible text survives.
        assert!(out.contains("1 of 2 "), "count is unstyled: {out:?}");
        assert!(out.contains("\u{1b}[32mpassed\u{1b}[0m"), "green pass: {out:?}");
        assert!(
            out.contains("\u{1b}[31m1 failed\u{1b}[0m"),
            "red fail: {out:?}"
        );
    }
}
