// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staged bootstrap loader

use crate::fetch::{FetchedBody, Fetcher, HttpFetcher};
use crate::pin::enforce_pinning;
use crate::verify::{parse_checksum_file, verify_checksum, GpgCliVerifier, SignatureVerifier};
use crate::BootstrapError;
use chrono::Utc;
use sink_config::{Bootstrap, RemoteConfig, SecurityPolicy};

/// Loads remote configuration bodies under a bootstrap policy.
pub struct BootstrapLoader {
    fetcher: Box<dyn Fetcher>,
    verifier: Box<dyn SignatureVerifier>,
}

impl Default for BootstrapLoader {
    fn default() -> Self {
        Self {
            fetcher: Box::new(HttpFetcher),
            verifier: Box::new(GpgCliVerifier),
        }
    }
}

impl BootstrapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the I/O seams; tests inject fakes here.
    pub fn with_parts(
        fetcher: Box<dyn Fetcher>,
        verifier: Box<dyn SignatureVerifier>,
    ) -> Self {
        Self { fetcher, verifier }
    }

    /// Fetch and fully verify the body behind `url`.
    ///
    /// Stages run in a fixed order (scheme, allowlist, pinning, fetch,
    /// checksums, signature, age) and the first failing stage's error is
    /// returned. Nothing is fetched before the local policy stages pass.
    pub fn load(&self, bootstrap: &Bootstrap, url: &str) -> Result<Vec<u8>, BootstrapError> {
        let default_policy = SecurityPolicy::default();
        let security = bootstrap.security.as_ref().unwrap_or(&default_policy);
        let remote = bootstrap.remote_config(url);

        // 1. Scheme policy
        if security.require_https && !url.starts_with("https://") {
            return Err(BootstrapError::InsecureUrl {
                url: url.to_string(),
            });
        }

        // 2. Source allowlist
        if !security.allowed_sources.is_empty() && !matches_allowlist(security, url) {
            return Err(BootstrapError::SourceNotAllowed {
                url: url.to_string(),
            });
        }

        // 3. Pinning policy
        if security.require_pinning {
            enforce_pinning(url, remote.and_then(|r| r.pin.as_ref()))?;
        }

        // 4. Fetch
        tracing::info!(%url, "loading remote configuration");
        let body = self
            .fetcher
            .fetch(url)
            .map_err(|message| BootstrapError::Fetch {
                url: url.to_string(),
                message,
            })?;

        // 5. Checksums
        self.verify_checksums(url, remote, &body)?;

        // 6. Signature
        self.verify_signature(url, security, remote, &body)?;

        // 7. Maximum age
        enforce_max_age(remote, &body)?;

        Ok(body.bytes)
    }

    fn verify_checksums(
        &self,
        url: &str,
        remote: Option<&RemoteConfig>,
        body: &FetchedBody,
    ) -> Result<(), BootstrapError> {
        let verification = remote.and_then(|r| r.verification.as_ref());

        if let Some(verification) = verification {
            for (algorithm, expected) in &verification.checksums {
                verify_checksum(algorithm, expected, &body.bytes)?;
            }
        }

        let checksum_url = remote
            .and_then(|r| r.checksum_url.clone())
            .or_else(|| {
                verification
                    .is_some_and(|v| v.auto_fetch_checksum)
                    .then(|| format!("{}.sha256", url))
            });

        if let Some(checksum_url) = checksum_url {
            let file =
                self.fetcher
                    .fetch(&checksum_url)
                    .map_err(|message| BootstrapError::ChecksumUnavailable {
                        url: checksum_url.clone(),
                        message,
                    })?;
            let content = String::from_utf8_lossy(&file.bytes);
            let expected = parse_checksum_file(&content).ok_or_else(|| {
                BootstrapError::ChecksumUnavailable {
                    url: checksum_url.clone(),
                    message: "no hex token in checksum file".to_string(),
                }
            })?;
            verify_checksum("sha256", &expected, &body.bytes)?;
        }

        Ok(())
    }

    fn verify_signature(
        &self,
        url: &str,
        security: &SecurityPolicy,
        remote: Option<&RemoteConfig>,
        body: &FetchedBody,
    ) -> Result<(), BootstrapError> {
        let verification = remote.and_then(|r| r.verification.as_ref());
        let gpg_key = verification.and_then(|v| v.gpg_key.clone());
        if !security.require_signatures && gpg_key.is_none() {
            return Ok(());
        }

        let signature_url = remote
            .and_then(|r| r.signature_url.clone())
            .unwrap_or_else(|| format!("{}.asc", url));
        let signature = self
            .fetcher
            .fetch(&signature_url)
            .map_err(|message| BootstrapError::SignatureUnavailable {
                url: signature_url.clone(),
                message,
            })?;

        let mut trusted = security.trusted_keys.clone();
        if let Some(key) = gpg_key {
            trusted.push(key);
        }

        self.verifier
            .verify(&body.bytes, &signature.bytes, &trusted)
            .map_err(BootstrapError::SignatureInvalid)
    }
}

fn matches_allowlist(security: &SecurityPolicy, url: &str) -> bool {
    security.allowed_sources.iter().any(|pattern| {
        match glob::Pattern::new(pattern) {
            Ok(glob) => glob.matches(url),
            Err(e) => {
                tracing::warn!(%pattern, error = %e, "invalid allowlist pattern");
                false
            }
        }
    })
}

fn enforce_max_age(
    remote: Option<&RemoteConfig>,
    body: &FetchedBody,
) -> Result<(), BootstrapError> {
    let Some(max_age_seconds) = remote
        .and_then(|r| r.verification.as_ref())
        .and_then(|v| v.max_age_seconds)
    else {
        return Ok(());
    };
    let Some(last_modified) = body.last_modified else {
        return Ok(());
    };

    let age_seconds = (Utc::now() - last_modified).num_seconds().max(0) as u64;
    if age_seconds > max_age_seconds {
        return Err(BootstrapError::Stale {
            age_seconds,
            max_age_seconds,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
