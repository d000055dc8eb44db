// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interpreter selection
//!
//! Most published install commands assume bash, so bash is preferred;
//! falling back to POSIX sh keeps minimal systems working. Windows uses
//! `cmd.exe /C`. A platform may override the choice wholesale.

use std::path::Path;

/// Bash locations probed in order.
pub const BASH_PATHS: &[&str] = &["/bin/bash", "/usr/bin/bash", "/usr/local/bin/bash"];

/// POSIX sh locations probed in order when no bash is found.
pub const SH_PATHS: &[&str] = &["/bin/sh", "/usr/bin/sh", "/run/current-system/sw/bin/sh"];

/// An interpreter invocation: `program flag <command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub program: String,
    pub flag: &'static str,
}

impl ShellSpec {
    fn unix(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: "-c",
        }
    }
}

/// Pick the interpreter for one invocation.
pub fn resolve_shell(shell_override: Option<&str>) -> ShellSpec {
    if let Some(shell) = shell_override {
        return ShellSpec::unix(shell);
    }

    #[cfg(windows)]
    {
        ShellSpec {
            program: "cmd.exe".to_string(),
            flag: "/C",
        }
    }

    #[cfg(not(windows))]
    {
        resolve_unix_with(|path| Path::new(path).exists())
    }
}

/// Probe the candidate lists with an injectable existence check.
fn resolve_unix_with(exists: impl Fn(&str) -> bool) -> ShellSpec {
    for path in BASH_PATHS.iter().chain(SH_PATHS) {
        if exists(path) {
            return ShellSpec::unix(*path);
        }
    }
    // Last resort: whatever `sh` PATH resolution finds.
    ShellSpec::unix("sh")
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
