// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated configuration model
//!
//! Produced by [`crate::parse_config`]; immutable thereafter. The raw serde
//! mirror lives in `raw.rs`; these types only exist on the far side of
//! validation.

use crate::bootstrap::Bootstrap;
use crate::step::InstallStep;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sink_core::{parse_duration, DurationError, OsKind};
use std::collections::HashMap;
use std::time::Duration;

/// Root of a parsed configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub version: String,
    pub description: Option<String>,
    pub guards: Option<Guards>,
    /// Fact definitions in declaration order; order breaks ties in the
    /// topological execution order.
    pub facts: IndexMap<String, FactDef>,
    pub platforms: Vec<Platform>,
    /// Config-level fallback used when no platform or distribution matches.
    pub fallback: Option<Fallback>,
    pub bootstrap: Option<Bootstrap>,
}

/// Expected type of a fact's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactType {
    #[default]
    String,
    Boolean,
    Integer,
}

impl FactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactType::String => "string",
            FactType::Boolean => "boolean",
            FactType::Integer => "integer",
        }
    }
}

/// Definition of one host fact.
#[derive(Debug, Clone, PartialEq)]
pub struct FactDef {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    /// Environment variable name under which the value is exported to
    /// subsequent commands.
    pub export: Option<String>,
    pub fact_type: FactType,
    /// Raw-to-canonical value mapping; string-typed facts only.
    pub transform: IndexMap<String, String>,
    /// Whether an unmapped value fails the fact.
    pub strict: bool,
    /// Restrict gathering to these OS families. Empty means all.
    pub platforms: Vec<OsKind>,
    /// Whether failure to gather aborts the run.
    pub required: bool,
    pub timeout: Option<TimeoutSpec>,
    pub sleep: Option<String>,
    pub verbose: bool,
}

impl FactDef {
    /// Whether this fact is gathered on the given OS.
    pub fn applies_to(&self, os: Option<OsKind>) -> bool {
        if self.platforms.is_empty() {
            return true;
        }
        os.map(|os| self.platforms.contains(&os)).unwrap_or(false)
    }
}

/// A host-OS bucket selecting a step list.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: OsKind,
    /// Shell glob applied to the OS identifier; absent matches anything.
    pub match_pattern: Option<String>,
    pub name: String,
    /// Interpreter override for every command run under this platform.
    pub shell: Option<String>,
    /// Tools that must resolve via `command -v` before any step runs.
    pub required_tools: Vec<String>,
    pub body: PlatformBody,
    pub fallback: Option<Fallback>,
}

/// Exactly one of a direct step list or a distribution table.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformBody {
    Steps(Vec<InstallStep>),
    Distributions(Vec<Distribution>),
}

/// A Linux distribution bucket, matched against `/etc/os-release`.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// Matched against ID, then ID_LIKE tokens. Never empty.
    pub ids: Vec<String>,
    pub name: String,
    pub install_steps: Vec<InstallStep>,
}

/// Authored error message used when resolution fails. `{os}` and
/// `{distro}` placeholders are substituted at resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    pub error: String,
}

/// Preconditions on the execution environment, gating the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Guards {
    #[serde(default)]
    pub required_hostname_pattern: Option<String>,
    #[serde(default)]
    pub forbidden_hostname_pattern: Option<String>,
    #[serde(default)]
    pub required_user: Option<String>,
    #[serde(default)]
    pub forbidden_users: Vec<String>,
    /// Defaults to false: running as root is blocked unless opted in.
    #[serde(default)]
    pub allow_root: bool,
    #[serde(default)]
    pub required_env_vars: HashMap<String, String>,
    #[serde(default)]
    pub min_disk_space_gb: Option<u64>,
    /// Prompt shown by the confirmation gate before the first step.
    #[serde(default)]
    pub confirm_prompt: Option<String>,
}

/// Timeout in either simple form (`"90s"`) or advanced form with an exit
/// code substituted when the deadline expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSpec {
    Simple(String),
    Advanced {
        interval: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_code: Option<i32>,
    },
}

impl TimeoutSpec {
    pub fn interval_str(&self) -> &str {
        match self {
            TimeoutSpec::Simple(s) => s,
            TimeoutSpec::Advanced { interval, .. } => interval,
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        match self {
            TimeoutSpec::Simple(_) => None,
            TimeoutSpec::Advanced { error_code, .. } => *error_code,
        }
    }

    pub fn duration(&self) -> Result<Duration, DurationError> {
        parse_duration(self.interval_str())
    }
}

impl Config {
    /// Look up a platform by its display name (operator override).
    pub fn platform_by_name(&self, name: &str) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.name == name)
    }
}
