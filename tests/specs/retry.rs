// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry-until polling against real commands and real time.

use crate::prelude::*;
use std::time::{Duration, Instant};

#[tokio::test]
async fn retry_until_timeout_reports_last_error() {
    let started = Instant::now();
    let (result, _) = run_local(&host_config(
        r#"[{"name": "wait", "command": "false", "retry": "until", "timeout": "3s"}]"#,
    ))
    .await;

    let report = result.unwrap();
    assert!(!report.success());
    let error = report.results[0].error.as_deref().unwrap();
    assert!(error.contains("Timeout after 3s"), "error was: {error}");
    assert!(error.contains("exit code 1"), "error was: {error}");

    // Completes within the budget plus one command's runtime and slack.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "elapsed: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10), "elapsed: {elapsed:?}");
}

#[tokio::test]
async fn retry_until_succeeds_once_condition_holds() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ready");
    // The checked command fails until a side file appears; a first step
    // creates it, so the poll succeeds on its first attempt.
    let config = host_config(&format!(
        r#"[
            {{"name": "arm", "command": "touch {m}"}},
            {{"name": "wait ready", "command": "test -f {m}", "retry": "until", "timeout": "10s"}}
        ]"#,
        m = marker.display()
    ));

    let started = Instant::now();
    let (result, _) = run_local(&config).await;
    let report = result.unwrap();
    assert!(report.success());
    assert!(report.results[1].output.starts_with("succeeded after"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn retry_until_polls_once_per_second() {
    // A command that succeeds only on its third attempt: two failures at
    // ~0s and ~1s, success at ~2s.
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("attempts");
    let config = host_config(&format!(
        r#"[{{"name": "third time", "command": "echo x >> {c}; test $(wc -l < {c}) -ge 3", "retry": "until", "timeout": "30s"}}]"#,
        c = counter.display()
    ));

    let started = Instant::now();
    let (result, _) = run_local(&config).await;
    assert!(result.unwrap().success());

    let attempts = std::fs::read_to_string(&counter).unwrap().lines().count();
    assert_eq!(attempts, 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "elapsed: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(8), "elapsed: {elapsed:?}");
}
