// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pinning policy for versioned source URLs
//!
//! A GitHub raw URL (`raw.githubusercontent.com/{owner}/{repo}/{ref}/{path}`)
//! is immutable when its ref is a commit SHA or an annotated tag. Refs are
//! not distinguishable from the URL alone, so the author declares the kind
//! in the `pin` block; a 40-hex ref is always accepted as a commit.

use crate::BootstrapError;
use sink_config::{Pin, PinKind};

const GITHUB_RAW_HOST: &str = "raw.githubusercontent.com";

/// Decomposed GitHub raw URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRawUrl<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub git_ref: &'a str,
    pub path: &'a str,
}

/// Parse a GitHub raw URL; `None` for anything else.
pub fn parse_github_raw(url: &str) -> Option<GitHubRawUrl<'_>> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = rest.split_once('/')?;
    if host != GITHUB_RAW_HOST {
        return None;
    }

    let mut segments = path.splitn(4, '/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    let git_ref = segments.next().filter(|s| !s.is_empty())?;
    let path = segments.next().unwrap_or("");
    Some(GitHubRawUrl {
        owner,
        repo,
        git_ref,
        path,
    })
}

/// True for a full 40-character lowercase/uppercase hex commit SHA.
pub fn is_commit_sha(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Enforce the pinning policy for one URL.
///
/// Only GitHub raw URLs carry a recognizable ref segment; other URLs pass
/// (their immutability cannot be judged here).
pub(crate) fn enforce_pinning(url: &str, pin: Option<&Pin>) -> Result<(), BootstrapError> {
    let Some(raw) = parse_github_raw(url) else {
        return Ok(());
    };

    if is_commit_sha(raw.git_ref) {
        return Ok(());
    }

    match pin {
        None => Err(BootstrapError::PinningRequired {
            url: url.to_string(),
            reason: format!(
                "ref '{}' is not a commit SHA and no pin is declared",
                raw.git_ref
            ),
        }),
        Some(pin) => match pin.kind {
            // The author vouches that the ref is an annotated tag.
            PinKind::Tag => Ok(()),
            PinKind::Commit => Err(BootstrapError::PinningRequired {
                url: url.to_string(),
                reason: format!("ref '{}' is not a 40-hex commit SHA", raw.git_ref),
            }),
            PinKind::Branch if !pin.require_immutable => Ok(()),
            PinKind::Branch => Err(BootstrapError::PinningRequired {
                url: url.to_string(),
                reason: format!(
                    "branch ref '{}' is mutable; set require_immutable to false to accept it",
                    raw.git_ref
                ),
            }),
        },
    }
}

#[cfg(test)]
#[path = "pin_tests.rs"]
mod tests;
