// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Check-then-act idempotence.

use crate::prelude::*;
use sink_core::StepStatus;

fn toggle_config(marker: &std::path::Path) -> String {
    host_config(&format!(
        r#"[{{"name": "ensure marker", "check": "test -f {m}", "on_missing": [
            {{"name": "create marker", "command": "touch {m}"}}
        ]}}]"#,
        m = marker.display()
    ))
}

#[tokio::test]
async fn remediation_creates_missing_state_then_recheck_passes() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("installed");

    let (result, events) = run_local(&toggle_config(&marker)).await;
    let report = result.unwrap();
    assert!(report.success());
    assert!(marker.exists(), "remediation must have created the marker");

    // The remediation step ran and reported its own lifecycle.
    let statuses: Vec<StepStatus> = events
        .iter()
        .filter(|e| e.step_name == "create marker")
        .map(|e| e.status)
        .collect();
    assert_eq!(statuses, vec![StepStatus::Running, StepStatus::Success]);
}

#[tokio::test]
async fn satisfied_check_skips_remediation_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("installed");
    std::fs::write(&marker, b"").unwrap();

    let (result, events) = run_local(&toggle_config(&marker)).await;
    let report = result.unwrap();
    assert!(report.success());
    assert!(
        events.iter().all(|e| e.step_name != "create marker"),
        "no remediation may run when the check passes"
    );
}

#[tokio::test]
async fn second_run_after_success_executes_no_remediation() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("installed");
    let config = toggle_config(&marker);

    let (first, _) = run_local(&config).await;
    assert!(first.unwrap().success());

    let (second, events) = run_local(&config).await;
    assert!(second.unwrap().success());
    assert!(
        events.iter().all(|e| e.step_name != "create marker"),
        "second run must be a read-only no-op"
    );
}

#[tokio::test]
async fn unachievable_state_is_reported() {
    // The remediation never creates what the check wants.
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("never-created");
    let config = host_config(&format!(
        r#"[{{"name": "ensure marker", "check": "test -f {}", "on_missing": [
            {{"name": "noop", "command": "true"}}
        ]}}]"#,
        marker.display()
    ));

    let (result, _) = run_local(&config).await;
    let report = result.unwrap();
    assert!(!report.success());
    assert_eq!(
        report.results[0].error.as_deref(),
        Some("remediation did not achieve desired state")
    );
}
