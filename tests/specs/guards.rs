// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guard gating.

use crate::prelude::*;
use sink_core::StepStatus;
use sink_engine::EngineError;

#[tokio::test]
async fn hostname_guard_blocks_with_single_failed_event() {
    let transport = linux_fake();
    // linux_fake scripts the hostname as "spec-host"; the guard demands
    // staging machines.
    let config = r#"{
        "version": "1.0.0",
        "guards": {"required_hostname_pattern": "^staging-.*$"},
        "platforms": [{"os": "linux", "name": "Linux", "install_steps": [
            {"name": "never", "command": "echo never"}
        ]}]
    }"#;

    let (result, events) = run_fake(config, transport.clone()).await;
    assert!(matches!(result, Err(EngineError::GuardFailure(_))));

    let guard_events: Vec<_> = events
        .iter()
        .filter(|e| e.step_name == "Guard Check")
        .collect();
    assert_eq!(guard_events.len(), 1);
    assert_eq!(guard_events[0].status, StepStatus::Failed);
    assert_eq!(transport.call_count("echo never"), 0);
}

#[tokio::test]
async fn guard_failures_aggregate_every_predicate() {
    let transport = linux_fake();
    transport.respond_ok("echo ${DEPLOY_ENV}", "prod\n");
    let config = r#"{
        "version": "1.0.0",
        "guards": {
            "required_hostname_pattern": "^staging-.*$",
            "required_user": "deploy",
            "required_env_vars": {"DEPLOY_ENV": "staging"}
        },
        "platforms": [{"os": "linux", "name": "Linux", "install_steps": [
            {"name": "never", "command": "true"}
        ]}]
    }"#;

    let (result, _) = run_fake(config, transport).await;
    let message = result.unwrap_err().to_string();
    assert!(message.contains("spec-host"));
    assert!(message.contains("spec-user"));
    assert!(message.contains("DEPLOY_ENV"));
}

#[tokio::test]
async fn passing_guards_let_steps_run() {
    let transport = linux_fake();
    transport.respond_ok("echo ready", "ready\n");
    let config = r#"{
        "version": "1.0.0",
        "guards": {"required_hostname_pattern": "^spec-.*$", "required_user": "spec-user"},
        "platforms": [{"os": "linux", "name": "Linux", "install_steps": [
            {"name": "go", "command": "echo ready"}
        ]}]
    }"#;

    let (result, _) = run_fake(config, transport).await;
    assert!(result.unwrap().success());
}

#[tokio::test]
async fn disk_space_guard_reads_through_the_transport() {
    let transport = linux_fake();
    transport.respond_ok("df -BG . | tail -1 | awk '{print $4}'", "5G\n");
    let config = r#"{
        "version": "1.0.0",
        "guards": {"min_disk_space_gb": 20},
        "platforms": [{"os": "linux", "name": "Linux", "install_steps": [
            {"name": "never", "command": "true"}
        ]}]
    }"#;

    let (result, _) = run_fake(config, transport).await;
    let message = result.unwrap_err().to_string();
    assert!(message.contains("only 5G free"));
    assert!(message.contains("20G required"));
}
