// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A streaming test-result reporter.
//!
//! This is the command-line frontend; all the actual reporting logic lives in
//! the [`tattle_reporter`] crate.

#![warn(missing_docs)]

mod dispatch;
mod output;

pub use dispatch::*;
