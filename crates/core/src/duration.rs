// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration string parsing

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,
    #[error("invalid duration '{0}': expected a number followed by s, m, or h (e.g. \"30s\", \"5m\", \"1h\")")]
    Invalid(String),
}

/// Parse a duration of the form `<digits><unit>` where unit is `s`, `m`,
/// or `h`. No whitespace, no fractions, no compound forms.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    if !s.is_char_boundary(s.len() - 1) {
        return Err(DurationError::Invalid(s.to_string()));
    }
    let (digits, unit) = s.split_at(s.len() - 1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationError::Invalid(s.to_string()));
    }
    let n: u64 = digits
        .parse()
        .map_err(|_| DurationError::Invalid(s.to_string()))?;

    let secs = match unit {
        "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        _ => return Err(DurationError::Invalid(s.to_string())),
    };
    Ok(Duration::from_secs(secs))
}

/// Validate without constructing; used by the config validator.
pub fn is_valid_duration(s: &str) -> bool {
    parse_duration(s).is_ok()
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
