// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{OutputOpts, clap_styles};
use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::Result;
use std::io::{self, BufRead};
use tattle_reporter::{
    input::InputMux,
    reporter::{DisplayReporterBuilder, ReportMode, ReporterOutput, RunAggregator},
};

/// A streaming test-result reporter.
///
/// Reads a line-oriented test protocol from stdin (or, in parallel mode,
/// from several pre-opened file descriptors), renders live progress, and
/// exits 0 if every test passed. Marker lines start with `##`; everything
/// else on the stream is ignored.
#[derive(Debug, Parser)]
#[command(version, bin_name = "tattle", styles = clap_styles::style())]
pub struct TattleApp {
    /// Progress rendering mode
    #[arg(long, short = 'm', value_enum, default_value_t, value_name = "MODE")]
    mode: ModeOpt,

    /// Indent output by one more space (repeatable; ignored in summary mode)
    #[arg(long, short = 't', action = ArgAction::Count)]
    indent: u8,

    /// Read from pre-opened file descriptors instead of stdin
    ///
    /// With a SLOTS value, descriptors 3 through 3+SLOTS-1 are the input
    /// slots. Without one, descriptors 3 through 127 are probed and every
    /// open one becomes a slot. A descriptor that is not open is skipped,
    /// never an error.
    #[arg(long, short = 'p', value_name = "SLOTS", num_args = 0..=1)]
    parallel: Option<Option<usize>>,

    #[command(flatten)]
    output: OutputOpts,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum ModeOpt {
    /// One status line, rewritten in place
    Inline,
    /// One glyph per result in a grid
    #[default]
    Character,
    /// One line per test
    Line,
    /// Two machine-readable sentinel lines only
    Summary,
}

impl ModeOpt {
    fn to_report_mode(self) -> ReportMode {
        match self {
            Self::Inline => ReportMode::Inline,
            Self::Character => ReportMode::Character,
            Self::Line => ReportMode::Lines,
            Self::Summary => ReportMode::Summary,
        }
    }
}

impl TattleApp {
    /// Executes the app, returning the process exit code.
    pub fn exec(self) -> Result<i32> {
        let output = self.output.init();

        let should_colorize = output
            .color
            .should_colorize(supports_color::Stream::Stdout);

        let readers = input_streams(self.parallel)?;

        let mut aggregator = RunAggregator::new();
        let mut reporter = DisplayReporterBuilder {
            mode: self.mode.to_report_mode(),
            indent: usize::from(self.indent),
            should_colorize,
        }
        .build(ReporterOutput::Terminal);

        InputMux::new(readers).run(&mut aggregator, &mut reporter)?;

        // The exit status is the single authoritative pass/fail signal,
        // independent of the rendering mode.
        Ok(if aggregator.is_success() { 0 } else { 1 })
    }
}

/// Opens the input streams: stdin, or in parallel mode the pre-opened
/// descriptor slots.
fn input_streams(parallel: Option<Option<usize>>) -> Result<Vec<Box<dyn BufRead>>> {
    match parallel {
        None => Ok(vec![Box::new(io::stdin().lock())]),
        Some(slots) => fd_slots(slots),
    }
}

#[cfg(unix)]
fn fd_slots(slots: Option<usize>) -> Result<Vec<Box<dyn BufRead>>> {
    use std::{
        fs::File,
        io::BufReader,
        os::fd::{FromRawFd, RawFd},
    };

    /// The first descriptor beyond the standard three.
    const FIRST_SLOT_FD: RawFd = 3;
    /// Upper bound when probing without an explicit slot count.
    const MAX_PROBED_FD: RawFd = 128;

    let end = match slots {
        Some(count) => FIRST_SLOT_FD.saturating_add(count.min(1024) as RawFd),
        None => MAX_PROBED_FD,
    };

    let mut readers: Vec<Box<dyn BufRead>> = Vec::new();
    for fd in FIRST_SLOT_FD..end {
        if fd_is_open(fd) {
            tracing::debug!(fd, "using pre-opened descriptor as input slot");
            // SAFETY: the probe above confirmed the descriptor is open, and
            // nothing else in this process owns it; the File takes sole
            // ownership from here on.
            let file = unsafe { File::from_raw_fd(fd) };
            readers.push(Box::new(BufReader::new(file)));
        } else {
            tracing::trace!(fd, "descriptor not open, skipping slot");
        }
    }
    tracing::debug!("parallel mode with {} input slot(s)", readers.len());
    Ok(readers)
}

#[cfg(unix)]
fn fd_is_open(fd: std::os::fd::RawFd) -> bool {
    // Probing failure means "slot absent", never an error.
    unsafe { libc::fcntl(fd, libc::F_GETFL) != -1 }
}

#[cfg(not(unix))]
fn fd_slots(_slots: Option<usize>) -> Result<Vec<Box<dyn BufRead>>> {
    color_eyre::eyre::bail!("parallel mode requires pre-opened file descriptors (Unix only)")
}
