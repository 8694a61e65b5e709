// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [tattle](https://crates.io/crates/tattle-cli), a
//! streaming test-result reporter.
//!
//! tattle consumes a small line-oriented protocol emitted by a test harness,
//! interleaved with arbitrary other output, and renders live progress plus a
//! final verdict. Marker lines start with `##`:
//!
//! ```text
//! ##+some test name     begin a test
//! ##-ok                 end the current test as passed
//! ##-assertion failed   end the current test as failed
//! ##>17                 declare 17 more expected tests
//! ```
//!
//! Everything else on the stream is ignored, so the protocol can ride on top
//! of compiler output, stack traces, and other noise without false positives.

pub mod errors;
pub mod input;
pub mod protocol;
pub mod reporter;
