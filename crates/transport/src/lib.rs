// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Command transports
//!
//! A transport runs one opaque shell command and reports stdout, stderr,
//! and the exit code. The engine never splits commands into argument
//! vectors and never escapes anything on the transport's behalf; the
//! command string is handed to an interpreter chosen by the shell
//! resolver.

mod cancel;
mod local;
mod shell;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use cancel::CancelToken;
pub use local::LocalTransport;
pub use shell::{resolve_shell, ShellSpec};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;

/// Exit code substituted when a deadline expires and no override is
/// configured. Matches the coreutils `timeout` convention.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the interpreter itself could not be spawned.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Errors that can occur inside a transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cancelled")]
    Cancelled,
    #[error("transport I/O error: {0}")]
    Io(String),
}

/// Captured result of one command execution.
///
/// A non-zero exit code is not an error at this layer; it is a signal the
/// caller interprets. Spawn failures surface as exit code 127 with the
/// message in stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn err(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout with trailing whitespace removed, as fact gathering and
    /// context discovery consume it.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim_end()
    }
}

/// Executes opaque shell commands.
///
/// A single instance serializes its calls; distinct instances may run
/// concurrently. Implementations must be shareable between the executor
/// and the fact gatherer of one run.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one command and block until the child exits.
    async fn run(&self, command: &str) -> Result<CommandOutput, TransportError>;

    /// Run one command under a deadline. On expiry the child is terminated
    /// and a synthetic output with `timeout_exit_code` is returned.
    ///
    /// The default implementation cannot reach into the child process; it
    /// simply abandons the call on expiry. Real transports override this
    /// to kill the child.
    async fn run_with_deadline(
        &self,
        command: &str,
        deadline: Option<Duration>,
        timeout_exit_code: i32,
    ) -> Result<CommandOutput, TransportError> {
        match deadline {
            None => self.run(command).await,
            Some(limit) => match tokio::time::timeout(limit, self.run(command)).await {
                Ok(result) => result,
                Err(_) => Ok(CommandOutput::err(
                    timeout_exit_code,
                    format!("timed out after {}s", limit.as_secs()),
                )),
            },
        }
    }

    /// Label shown in execution contexts, e.g. `local` or `ssh:user@host`.
    fn label(&self) -> String;

    /// Add a variable to the run-scoped environment overlay merged into
    /// every subsequent child environment. The parent process environment
    /// is never mutated.
    fn export_var(&self, name: &str, value: &str);

    /// Override the interpreter for subsequent commands (platform-level
    /// `shell` setting). `None` restores the probed default.
    fn set_shell(&self, shell: Option<String>);
}
