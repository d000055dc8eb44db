// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap block: remote configuration sources and verification policy

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Remote-configuration loading policy and sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bootstrap {
    #[serde(default)]
    pub security: Option<SecurityPolicy>,
    #[serde(default)]
    pub remote_configs: Vec<RemoteConfig>,
}

impl Bootstrap {
    /// Find the declared source entry for a URL, if any.
    pub fn remote_config(&self, url: &str) -> Option<&RemoteConfig> {
        self.remote_configs.iter().find(|rc| rc.url == url)
    }
}

/// Security policy applied to every remote fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityPolicy {
    /// Glob patterns a URL must match at least one of. Empty allows all.
    #[serde(default)]
    pub allowed_sources: Vec<String>,
    #[serde(default)]
    pub require_signatures: bool,
    #[serde(default = "default_true")]
    pub require_https: bool,
    #[serde(default)]
    pub require_pinning: bool,
    /// GPG key fingerprints accepted by signature verification.
    #[serde(default)]
    pub trusted_keys: Vec<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            allowed_sources: Vec::new(),
            require_signatures: false,
            require_https: true,
            require_pinning: false,
            trusted_keys: Vec::new(),
        }
    }
}

/// One remote configuration source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub url: String,
    #[serde(default)]
    pub checksum_url: Option<String>,
    #[serde(default)]
    pub signature_url: Option<String>,
    #[serde(default)]
    pub pin: Option<Pin>,
    #[serde(default)]
    pub verification: Option<Verification>,
}

/// What kind of ref the author pinned the URL to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Tag,
    Commit,
    Branch,
}

/// Declared pin for a versioned source URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pin {
    #[serde(rename = "type")]
    pub kind: PinKind,
    #[serde(default)]
    pub repository: Option<String>,
    /// When true (the default), mutable refs (branches) are rejected.
    #[serde(default = "default_true")]
    pub require_immutable: bool,
}

/// Content verification requirements for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Verification {
    /// Expected digests by algorithm name (`sha256`, `sha512`), lowercase hex.
    #[serde(default)]
    pub checksums: IndexMap<String, String>,
    #[serde(default)]
    pub gpg_key: Option<String>,
    /// Fetch `{url}.sha256` and compare when no explicit checksum is given.
    #[serde(default)]
    pub auto_fetch_checksum: bool,
    /// Reject bodies older than this, judged by the Last-Modified header.
    #[serde(default)]
    pub max_age_seconds: Option<u64>,
}
