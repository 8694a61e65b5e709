// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The marker-line protocol.
//!
//! A marker line is at least three bytes long and starts with the sentinel
//! `##`; the third byte selects the event kind. Anything else is noise and
//! classifies as `None`. The sentinel is deliberately strict so the protocol
//! can be embedded in arbitrary harness output (compiler warnings, stack
//! traces) without false positives.

/// The two-byte sentinel that introduces every marker line.
pub const MARKER_SENTINEL: &str = "##";

/// A classified marker line, borrowing its payload from the input line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarkerLine<'a> {
    /// `##+<name>`: a test began. The name is the verbatim remainder of the
    /// line and may be empty or contain spaces.
    TestBegin {
        /// The name of the test that began.
        name: &'a str,
    },

    /// `##-ok...`: the current test passed. Only the two payload bytes
    /// immediately after the prefix are inspected, so `##-okay` also counts
    /// as a pass.
    TestPassed,

    /// `##-<error>`: the current test failed with the given error text.
    TestFailed {
        /// The verbatim error text.
        error: &'a str,
    },

    /// `##><n>`: `<n>` additional tests are expected. Parsed permissively;
    /// non-numeric payloads yield 0 and it is up to the aggregator to ignore
    /// non-positive counts.
    CountDeclared {
        /// The declared count.
        count: i64,
    },
}

/// Classifies a single line, with any trailing line terminator already
/// stripped.
///
/// Returns `None` for any line that is not a marker line; such lines must be
/// discarded silently.
pub fn parse_marker_line(line: &str) -> Option<MarkerLine<'_>> {
    let payload = line.strip_prefix(MARKER_SENTINEL)?;
    let event = match *payload.as_bytes().first()? {
        b'+' => MarkerLine::TestBegin { name: &payload[1..] },
        b'-' => {
            let rest = &payload[1..];
            if rest.as_bytes().starts_with(b"ok") {
                MarkerLine::TestPassed
            } else {
                MarkerLine::TestFailed { error: rest }
            }
        }
        b'>' => MarkerLine::CountDeclared {
            count: parse_leading_i64(&payload[1..]),
        },
        _ => return None,
    };
    Some(event)
}

/// Parses a leading base-10 integer the way `strtol` does: leading ASCII
/// whitespace is skipped, an optional sign is accepted, trailing garbage is
/// ignored, and a payload with no digits yields 0. Saturates on overflow.
fn parse_leading_i64(s: &str) -> i64 {
    let s = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = s
        .as_bytes()
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let mut value: i64 = 0;
    for b in &s.as_bytes()[..digits] {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}
