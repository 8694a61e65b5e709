// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by tattle.

use thiserror::Error;

/// An error that occurred while writing an event to the reporter's output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),
}
