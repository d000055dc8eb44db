// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checksum and signature verification

use crate::BootstrapError;
use sha2::{Digest, Sha256, Sha512};
use std::io::Write;

/// Compare the body digest against an expected lowercase/uppercase hex
/// string, byte-exact.
pub fn verify_checksum(
    algorithm: &str,
    expected_hex: &str,
    body: &[u8],
) -> Result<(), BootstrapError> {
    let actual = match algorithm {
        "sha256" => hex::encode(Sha256::digest(body)),
        "sha512" => hex::encode(Sha512::digest(body)),
        other => return Err(BootstrapError::UnsupportedAlgorithm(other.to_string())),
    };

    let expected = expected_hex.trim();
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(BootstrapError::ChecksumMismatch {
            algorithm: algorithm.to_string(),
            expected: expected.to_lowercase(),
            actual,
        })
    }
}

/// Extract the first whitespace-delimited hex token from a checksum file
/// (the `sha256sum` format: `<hex>  <filename>`).
pub fn parse_checksum_file(content: &str) -> Option<String> {
    content
        .split_whitespace()
        .find(|token| token.len() >= 32 && token.bytes().all(|b| b.is_ascii_hexdigit()))
        .map(str::to_lowercase)
}

/// Verifies a detached signature over a body against trusted keys.
pub trait SignatureVerifier: Send + Sync {
    /// `trusted_keys` are acceptable key fingerprints; empty accepts any
    /// key the verifier itself trusts.
    fn verify(&self, body: &[u8], signature: &[u8], trusted_keys: &[String])
        -> Result<(), String>;
}

/// Shells out to `gpg --verify` and matches the `VALIDSIG` status line
/// against the trusted fingerprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpgCliVerifier;

impl SignatureVerifier for GpgCliVerifier {
    fn verify(
        &self,
        body: &[u8],
        signature: &[u8],
        trusted_keys: &[String],
    ) -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| format!("tempdir: {}", e))?;
        let body_path = dir.path().join("body");
        let sig_path = dir.path().join("body.asc");
        write_file(&body_path, body)?;
        write_file(&sig_path, signature)?;

        let output = std::process::Command::new("gpg")
            .arg("--batch")
            .arg("--status-fd")
            .arg("1")
            .arg("--verify")
            .arg(&sig_path)
            .arg(&body_path)
            .output()
            .map_err(|e| format!("failed to run gpg: {}", e))?;

        let status_lines = String::from_utf8_lossy(&output.stdout);
        let fingerprint = status_lines
            .lines()
            .find_map(|line| {
                let rest = line.strip_prefix("[GNUPG:] VALIDSIG ")?;
                rest.split_whitespace().next()
            })
            .ok_or_else(|| {
                format!(
                    "gpg reported no valid signature: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                )
            })?;

        if !trusted_keys.is_empty()
            && !trusted_keys
                .iter()
                .any(|key| key.eq_ignore_ascii_case(fingerprint))
        {
            return Err(format!(
                "signature made by untrusted key {}",
                fingerprint
            ));
        }

        Ok(())
    }
}

fn write_file(path: &std::path::Path, bytes: &[u8]) -> Result<(), String> {
    let mut file = std::fs::File::create(path).map_err(|e| format!("create {:?}: {}", path, e))?;
    file.write_all(bytes)
        .map_err(|e| format!("write {:?}: {}", path, e))
}

/// Configurable verifier for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeVerifier {
    inner: std::sync::Arc<parking_lot::Mutex<FakeVerifierState>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeVerifierState {
    error: Option<String>,
    calls: Vec<Vec<u8>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every verification fail with this message.
    pub fn reject_with(&self, message: impl Into<String>) {
        self.inner.lock().error = Some(message.into());
    }

    /// Signatures passed to verify so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl SignatureVerifier for FakeVerifier {
    fn verify(
        &self,
        _body: &[u8],
        signature: &[u8],
        _trusted_keys: &[String],
    ) -> Result<(), String> {
        let mut state = self.inner.lock();
        state.calls.push(signature.to_vec());
        match &state.error {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
