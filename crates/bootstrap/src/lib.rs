// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Bootstrap loading of remote configurations
//!
//! Enforces, in order: URL scheme policy, source allowlist, pinning,
//! fetch, checksum verification, signature verification, and maximum age.
//! A failure at any stage returns a typed error naming the stage; a
//! partially verified body is never returned.

mod fetch;
mod loader;
mod pin;
mod verify;

use thiserror::Error;

pub use fetch::{FetchedBody, Fetcher, HttpFetcher};
pub use loader::BootstrapLoader;
pub use pin::{is_commit_sha, parse_github_raw, GitHubRawUrl};
pub use verify::{parse_checksum_file, verify_checksum, GpgCliVerifier, SignatureVerifier};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fetch::FakeFetcher;
#[cfg(any(test, feature = "test-support"))]
pub use verify::FakeVerifier;

/// Errors that can occur while loading a remote configuration
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("insecure url '{url}': https is required")]
    InsecureUrl { url: String },

    #[error("url '{url}' does not match any allowed source")]
    SourceNotAllowed { url: String },

    #[error("pinning required for '{url}': {reason}")]
    PinningRequired { url: String, reason: String },

    #[error("fetch failed for '{url}': {message}")]
    Fetch { url: String, message: String },

    #[error("unsupported checksum algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("checksum mismatch ({algorithm}): expected {expected}, got {actual}")]
    ChecksumMismatch {
        algorithm: String,
        expected: String,
        actual: String,
    },

    #[error("checksum unavailable for '{url}': {message}")]
    ChecksumUnavailable { url: String, message: String },

    #[error("signature unavailable for '{url}': {message}")]
    SignatureUnavailable { url: String, message: String },

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("content is stale: {age_seconds}s old, maximum {max_age_seconds}s")]
    Stale {
        age_seconds: u64,
        max_age_seconds: u64,
    },
}
