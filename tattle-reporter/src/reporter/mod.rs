// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate and print out test results.
//!
//! The main types here are [`RunAggregator`], which owns the counters and the
//! failure list, and [`DisplayReporter`], which turns test events into
//! terminal output in one of four modes.

mod aggregator;
mod displayer;
mod events;
mod helpers;

pub use aggregator::*;
pub use displayer::*;
pub use events::*;
