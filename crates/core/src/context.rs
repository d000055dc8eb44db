// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context captured once per run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host operating-system family recognized by configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Darwin,
    Linux,
    Windows,
}

impl OsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsKind::Darwin => "darwin",
            OsKind::Linux => "linux",
            OsKind::Windows => "windows",
        }
    }

    /// Parse a normalized OS identifier (lowercased `uname -s` output or a
    /// compile-target OS name).
    pub fn from_identifier(id: &str) -> Option<Self> {
        match id {
            "darwin" | "macos" => Some(OsKind::Darwin),
            "linux" => Some(OsKind::Linux),
            "windows" => Some(OsKind::Windows),
            _ => None,
        }
    }
}

impl std::fmt::Display for OsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and as whom a run executes.
///
/// Discovered once when the executor is constructed; immutable for the
/// lifetime of the run. Fields whose probe failed are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub host: String,
    pub user: String,
    pub work_dir: String,
    /// Normalized OS identifier, e.g. `linux` or `darwin`.
    pub os: String,
    /// Machine architecture from `uname -m`, e.g. `x86_64`.
    pub arch: String,
    /// Label of the transport that produced this context, e.g. `local`
    /// or `ssh:user@host`.
    pub transport_label: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExecutionContext {
    /// The OS family, when the identifier is recognized.
    pub fn os_kind(&self) -> Option<OsKind> {
        OsKind::from_identifier(&self.os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        linux   = { "linux", Some(OsKind::Linux) },
        darwin  = { "darwin", Some(OsKind::Darwin) },
        macos   = { "macos", Some(OsKind::Darwin) },
        windows = { "windows", Some(OsKind::Windows) },
        unknown = { "plan9", None },
        empty   = { "", None },
    )]
    fn identifier_parsing(id: &str, expected: Option<OsKind>) {
        assert_eq!(OsKind::from_identifier(id), expected);
    }

    #[test]
    fn os_kind_round_trips_through_as_str() {
        for kind in [OsKind::Darwin, OsKind::Linux, OsKind::Windows] {
            assert_eq!(OsKind::from_identifier(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn context_os_kind_reads_identifier() {
        let ctx = ExecutionContext {
            os: "linux".into(),
            ..Default::default()
        };
        assert_eq!(ctx.os_kind(), Some(OsKind::Linux));
    }
}
