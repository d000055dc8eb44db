// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end execution through the local transport.

use crate::prelude::*;
use sink_core::StepStatus;

#[tokio::test]
async fn echo_step_emits_running_then_success_with_stdout() {
    let (result, events) = run_local(&host_config(
        r#"[{"name": "greet", "command": "echo hi"}]"#,
    ))
    .await;

    let report = result.unwrap();
    assert!(report.success());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].output, "hi\n");

    let statuses: Vec<StepStatus> = events
        .iter()
        .filter(|e| e.step_name == "greet")
        .map(|e| e.status)
        .collect();
    assert_eq!(statuses, vec![StepStatus::Running, StepStatus::Success]);
}

#[tokio::test]
async fn events_carry_run_id_and_context() {
    let (result, events) = run_local(&host_config(
        r#"[{"name": "greet", "command": "echo hi"}]"#,
    ))
    .await;
    result.unwrap();

    assert!(!events.is_empty());
    let run_id = events[0].run_id;
    for event in &events {
        assert_eq!(event.run_id, run_id);
        assert!(!event.context.os.is_empty());
        assert_eq!(event.context.transport_label, "local");
    }
}

#[tokio::test]
async fn event_timestamps_are_non_decreasing() {
    let (result, events) = run_local(&host_config(
        r#"[
            {"name": "one", "command": "echo 1"},
            {"name": "two", "command": "echo 2"},
            {"name": "three", "command": "echo 3"}
        ]"#,
    ))
    .await;
    result.unwrap();

    for pair in events.windows(2) {
        assert!(pair[1].timestamp >= pair[0].timestamp);
    }
}

#[tokio::test]
async fn fact_transform_feeds_steps() {
    let config = format!(
        r#"{{
            "version": "1.0.0",
            "facts": {{"arch": {{"command": "echo x86_64", "transform": {{"x86_64": "amd64"}}}}}},
            "platforms": [{{"os": "{}", "name": "Host", "install_steps": [
                {{"name": "print arch", "command": "echo {{{{facts.arch}}}}"}}
            ]}}]
        }}"#,
        std::env::consts::OS
    );
    let (result, _events) = run_local(&config).await;

    let report = result.unwrap();
    assert!(report.success());
    assert_eq!(
        report.facts.get("arch").map(|v| v.render()),
        Some("amd64".to_string())
    );
    assert_eq!(report.results[0].output, "amd64\n");
}

#[tokio::test]
async fn exported_fact_reaches_later_commands() {
    let config = format!(
        r#"{{
            "version": "1.0.0",
            "facts": {{"build_id": {{"command": "echo 7x9", "export": "SINK_BUILD_ID"}}}},
            "platforms": [{{"os": "{}", "name": "Host", "install_steps": [
                {{"name": "read env", "command": "echo \"id=${{SINK_BUILD_ID}}\""}}
            ]}}]
        }}"#,
        std::env::consts::OS
    );
    let (result, _events) = run_local(&config).await;

    let report = result.unwrap();
    assert!(report.success());
    assert_eq!(report.results[0].output, "id=7x9\n");
}

#[tokio::test]
async fn failing_step_stops_the_run_and_reports_stderr() {
    let (result, events) = run_local(&host_config(
        r#"[
            {"name": "explode", "command": "echo kaboom >&2; exit 9"},
            {"name": "never", "command": "echo never"}
        ]"#,
    ))
    .await;

    let report = result.unwrap();
    assert!(!report.success());
    assert_eq!(report.results.len(), 1);
    let error = report.results[0].error.as_deref().unwrap();
    assert!(error.contains("exit code 9"));
    assert!(error.contains("kaboom"));
    assert!(events.iter().all(|e| e.step_name != "never"));
}

#[tokio::test]
async fn dry_run_plans_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let config = sink_config::parse_config(&host_config(&format!(
        r#"[{{"name": "touch", "command": "touch {}"}}]"#,
        marker.display()
    )))
    .unwrap();

    let sink = sink_engine::CollectingSink::new();
    let executor = sink_engine::Executor::connect(
        config,
        std::sync::Arc::new(sink_transport::LocalTransport::new()),
        Box::new(sink.clone()),
        sink_engine::ExecutorOptions {
            dry_run: true,
            non_interactive: true,
            ..Default::default()
        },
    )
    .await;

    let report = executor.run().await.unwrap();
    assert!(report.success());
    assert!(report.results[0].output.starts_with("[dry-run] touch"));
    assert!(!marker.exists(), "dry-run must not execute user commands");
}
