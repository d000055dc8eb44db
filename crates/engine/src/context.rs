// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-context discovery

use sink_core::{Clock, ExecutionContext};
use sink_transport::Transport;

/// Probe the host once, immediately after executor construction.
///
/// Each field degrades to an empty string when its probe fails; guards
/// that depend on such a field will then fail with a clear message. The
/// OS identifier falls back to the compile-target OS so hosts without
/// `uname` (Windows) still resolve a platform.
pub async fn discover_context(transport: &dyn Transport, clock: &dyn Clock) -> ExecutionContext {
    let host = probe(transport, "hostname").await;
    let user = probe(transport, "whoami").await;
    let work_dir = probe(transport, "pwd").await;
    let os_raw = probe(transport, "uname -s").await;
    let arch = probe(transport, "uname -m").await;

    let os = if os_raw.is_empty() {
        std::env::consts::OS.to_string()
    } else {
        os_raw.to_lowercase()
    };

    ExecutionContext {
        host,
        user,
        work_dir,
        os,
        arch,
        transport_label: transport.label(),
        timestamp: Some(clock.now()),
    }
}

async fn probe(transport: &dyn Transport, command: &str) -> String {
    match transport.run(command).await {
        Ok(output) if output.success() => output.stdout_trimmed().to_string(),
        Ok(output) => {
            tracing::warn!(%command, exit_code = output.exit_code, "context probe failed");
            String::new()
        }
        Err(e) => {
            tracing::warn!(%command, error = %e, "context probe failed");
            String::new()
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
