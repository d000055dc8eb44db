// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the behavioral specs.

#![allow(dead_code)]

use sink_core::ExecutionEvent;
use sink_engine::{CollectingSink, EngineError, Executor, ExecutorOptions, RunReport};
use sink_transport::{FakeTransport, LocalTransport};
use std::sync::Arc;

/// Run a configuration against the real local transport. The run is
/// non-interactive so no confirmation gate blocks it.
pub async fn run_local(config_json: &str) -> (Result<RunReport, EngineError>, Vec<ExecutionEvent>) {
    let config = sink_config::parse_config(config_json).expect("spec config must be valid");
    let sink = CollectingSink::new();
    let executor = Executor::connect(
        config,
        Arc::new(LocalTransport::new()),
        Box::new(sink.clone()),
        ExecutorOptions {
            non_interactive: true,
            ..Default::default()
        },
    )
    .await;
    let result = executor.run().await;
    (result, sink.events())
}

/// Run a configuration against a scripted fake transport.
pub async fn run_fake(
    config_json: &str,
    transport: FakeTransport,
) -> (Result<RunReport, EngineError>, Vec<ExecutionEvent>) {
    let config = sink_config::parse_config(config_json).expect("spec config must be valid");
    let sink = CollectingSink::new();
    let executor = Executor::connect(
        config,
        Arc::new(transport),
        Box::new(sink.clone()),
        ExecutorOptions {
            non_interactive: true,
            ..Default::default()
        },
    )
    .await;
    let result = executor.run().await;
    (result, sink.events())
}

/// A fake transport with a deterministic Linux context scripted.
pub fn linux_fake() -> FakeTransport {
    let transport = FakeTransport::new();
    transport.respond_ok("hostname", "spec-host\n");
    transport.respond_ok("whoami", "spec-user\n");
    transport.respond_ok("pwd", "/spec\n");
    transport.respond_ok("uname -s", "Linux\n");
    transport.respond_ok("uname -m", "x86_64\n");
    transport
}

/// Wrap steps in a single-platform config for the OS the tests run on.
pub fn host_config(steps_json: &str) -> String {
    format!(
        r#"{{"version": "1.0.0", "platforms": [{{"os": "{}", "name": "Host", "install_steps": {}}}]}}"#,
        std::env::consts::OS,
        steps_json
    )
}
