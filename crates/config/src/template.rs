// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact reference interpolation
//!
//! A deliberately minimal scanner: variable substitution only, no control
//! flow, no filters. References look like `{{facts.arch}}` or the short
//! form `{{ .arch }}`; whitespace inside the braces is permitted. Anything
//! between double braces that is not a well-formed reference passes through
//! untouched.

use sink_core::Facts;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unresolved fact reference '{{{{facts.{0}}}}}'")]
    UnresolvedReference(String),
}

/// Returns true for names the config validator accepts as fact names.
pub(crate) fn is_fact_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_lowercase() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Extract the fact name from the text between `{{` and `}}`, if the text
/// forms a reference.
fn parse_reference(inner: &str) -> Option<&str> {
    let trimmed = inner.trim();
    let name = trimmed
        .strip_prefix("facts.")
        .or_else(|| trimmed.strip_prefix('.'))?;
    is_fact_name(name).then_some(name)
}

/// Substitute every fact reference in `input` with its canonical string
/// form. A reference to an absent fact is an error.
pub fn interpolate(input: &str, facts: &Facts) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let inner = &after_open[..close];
                match parse_reference(inner) {
                    Some(name) => match facts.get(name) {
                        Some(value) => out.push_str(&value.render()),
                        None => return Err(TemplateError::UnresolvedReference(name.to_string())),
                    },
                    // Not a reference; keep the braces literally.
                    None => {
                        out.push_str("{{");
                        out.push_str(inner);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            // Unterminated braces are literal text.
            None => {
                out.push_str(&rest[open..]);
                return Ok(out);
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Collect the fact names referenced by `input`, in first-occurrence order,
/// deduplicated. Used to build the fact dependency graph.
pub fn references(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        if let Some(name) = parse_reference(&after_open[..close]) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        rest = &after_open[close + 2..];
    }

    names
}

/// Escape a string for safe use inside shell double-quoted contexts.
///
/// Backslash, dollar sign, backtick, and double quote are backslash-escaped
/// so exported fact values are treated literally when a later command wraps
/// them in double quotes.
pub fn escape_for_shell(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '$' => result.push_str("\\$"),
            '`' => result.push_str("\\`"),
            '"' => result.push_str("\\\""),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
