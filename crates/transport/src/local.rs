// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local transport on the OS process facility

use crate::shell::resolve_shell;
use crate::{
    CancelToken, CommandOutput, Transport, TransportError, SPAWN_FAILURE_EXIT_CODE,
    TIMEOUT_EXIT_CODE,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// How long a terminated child may linger before it is forcibly killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Runs commands on this host through the probed interpreter.
///
/// Output is captured into memory, bounded only by what the child writes.
/// The environment of each child is the parent process environment (or the
/// override given at construction) merged with the run's export overlay.
pub struct LocalTransport {
    cwd: Option<PathBuf>,
    base_env: Option<HashMap<String, String>>,
    extra_env: Mutex<HashMap<String, String>>,
    shell_override: Mutex<Option<String>>,
    cancel: CancelToken,
    /// A single transport instance serializes its calls.
    run_lock: tokio::sync::Mutex<()>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            cwd: None,
            base_env: None,
            extra_env: Mutex::new(HashMap::new()),
            shell_override: Mutex::new(None),
            cancel: CancelToken::new(),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run children in `cwd` instead of the caller's working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replace the inherited environment entirely.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.base_env = Some(env);
        self
    }

    /// Attach a cancellation token; a cancelled token terminates the
    /// running child and fails the call with [`TransportError::Cancelled`].
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn run_inner(
        &self,
        command: &str,
        deadline: Option<Duration>,
        timeout_exit_code: i32,
    ) -> Result<CommandOutput, TransportError> {
        let _serial = self.run_lock.lock().await;

        let shell = {
            let shell_override = self.shell_override.lock();
            resolve_shell(shell_override.as_deref())
        };
        let extra: Vec<(String, String)> = {
            let extra_env = self.extra_env.lock();
            extra_env.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let mut cmd = Command::new(&shell.program);
        cmd.arg(shell.flag).arg(command);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        if let Some(ref env) = self.base_env {
            cmd.env_clear();
            cmd.envs(env.iter());
        }
        cmd.envs(extra);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(%command, shell = %shell.program, "spawning command");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Ok(CommandOutput::err(
                    SPAWN_FAILURE_EXIT_CODE,
                    format!("failed to spawn '{}': {}", shell.program, e),
                ));
            }
        };

        // Drain pipes concurrently so the child never blocks on a full
        // pipe buffer.
        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        let timer = async {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        // Resolve the race first, then act on the child; the wait future
        // must be dropped before terminate() can borrow the child again.
        let outcome = {
            let wait = child.wait();
            tokio::pin!(wait);
            tokio::select! {
                status = &mut wait => WaitOutcome::Exited(status),
                _ = timer => WaitOutcome::DeadlineExpired,
                _ = self.cancel.cancelled() => WaitOutcome::Cancelled,
            }
        };

        match outcome {
            WaitOutcome::Exited(status) => {
                let status = status.map_err(|e| TransportError::Io(e.to_string()))?;
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                let exit_code = status.code().unwrap_or(-1);
                tracing::debug!(%command, exit_code, "command finished");
                Ok(CommandOutput {
                    stdout,
                    stderr,
                    exit_code,
                })
            }
            WaitOutcome::DeadlineExpired => {
                tracing::warn!(%command, "deadline expired, terminating child");
                terminate(&mut child).await;
                stdout_task.abort();
                stderr_task.abort();
                let secs = deadline.map(|d| d.as_secs()).unwrap_or_default();
                Ok(CommandOutput::err(
                    timeout_exit_code,
                    format!("timed out after {}s", secs),
                ))
            }
            WaitOutcome::Cancelled => {
                tracing::warn!(%command, "cancelled, terminating child");
                terminate(&mut child).await;
                stdout_task.abort();
                stderr_task.abort();
                Err(TransportError::Cancelled)
            }
        }
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn run(&self, command: &str) -> Result<CommandOutput, TransportError> {
        self.run_inner(command, None, TIMEOUT_EXIT_CODE).await
    }

    async fn run_with_deadline(
        &self,
        command: &str,
        deadline: Option<Duration>,
        timeout_exit_code: i32,
    ) -> Result<CommandOutput, TransportError> {
        self.run_inner(command, deadline, timeout_exit_code).await
    }

    fn label(&self) -> String {
        "local".to_string()
    }

    fn export_var(&self, name: &str, value: &str) {
        self.extra_env
            .lock()
            .insert(name.to_string(), value.to_string());
    }

    fn set_shell(&self, shell: Option<String>) {
        *self.shell_override.lock() = shell;
    }
}

enum WaitOutcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    DeadlineExpired,
    Cancelled,
}

fn spawn_reader<R>(pipe: Option<R>) -> tokio::task::JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Terminate the child: termination signal first, forcible kill after a
/// grace period.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        send_term(child);
        if tokio::time::timeout(TERMINATE_GRACE, child.wait())
            .await
            .is_err()
        {
            let _ = child.kill().await;
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child.kill().await;
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn send_term(child: &Child) {
    if let Some(pid) = child.id() {
        // SAFETY: kill(2) with a live pid and a valid signal number has no
        // memory-safety concerns.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
