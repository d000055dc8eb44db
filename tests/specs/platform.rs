// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform and distribution resolution, and interpreter selection.

use crate::prelude::*;
use sink_engine::EngineError;
use sink_transport::resolve_shell;

#[tokio::test]
async fn ubuntu_host_matches_debian_bucket_via_id_like() {
    let transport = linux_fake();
    transport.respond_ok("cat /etc/os-release", "ID=ubuntu\nID_LIKE=\"debian\"\n");
    let config = r#"{
        "version": "1.0.0",
        "platforms": [{"os": "linux", "name": "Linux", "distributions": [
            {"ids": ["debian"], "name": "Debian-based", "install_steps": [
                {"name": "apt", "command": "true"}
            ]}
        ]}]
    }"#;

    let (result, _) = run_fake(config, transport).await;
    let report = result.unwrap();
    assert_eq!(report.distribution.as_deref(), Some("Debian-based"));
}

#[tokio::test]
async fn exact_id_bucket_wins_over_id_like() {
    let transport = linux_fake();
    transport.respond_ok("cat /etc/os-release", "ID=ubuntu\nID_LIKE=\"debian\"\n");
    let config = r#"{
        "version": "1.0.0",
        "platforms": [{"os": "linux", "name": "Linux", "distributions": [
            {"ids": ["ubuntu"], "name": "Ubuntu", "install_steps": [{"name": "u", "command": "true"}]},
            {"ids": ["debian"], "name": "Debian-based", "install_steps": [{"name": "d", "command": "true"}]}
        ]}]
    }"#;

    let (result, _) = run_fake(config, transport).await;
    assert_eq!(result.unwrap().distribution.as_deref(), Some("Ubuntu"));
}

#[tokio::test]
async fn unknown_distro_invokes_fallback_error() {
    let transport = linux_fake();
    transport.respond_ok("cat /etc/os-release", "ID=gentoo\n");
    let config = r#"{
        "version": "1.0.0",
        "platforms": [{"os": "linux", "name": "Linux",
            "fallback": {"error": "no recipe for {distro}"},
            "distributions": [
                {"ids": ["debian"], "name": "Debian", "install_steps": [{"name": "d", "command": "true"}]}
            ]}]
    }"#;

    let (result, _) = run_fake(config, transport).await;
    match result.unwrap_err() {
        EngineError::UnsupportedDistro(message) => {
            assert_eq!(message, "no recipe for gentoo");
        }
        other => panic!("expected UnsupportedDistro, got {other:?}"),
    }
}

#[test]
fn bash_is_preferred_when_present() {
    // Interpreter-selection property: on a host with /bin/bash the default
    // is bash; POSIX-only hosts get sh. Either way commands run with -c.
    let spec = resolve_shell(None);
    if std::path::Path::new("/bin/bash").exists() {
        assert_eq!(spec.program, "/bin/bash");
    } else {
        assert!(spec.program.ends_with("sh"));
    }
    assert_eq!(spec.flag, "-c");
}

#[tokio::test]
async fn platform_shell_override_is_honored_end_to_end() {
    // Run a real bash-only construct under an explicit bash override.
    if !std::path::Path::new("/bin/bash").exists() {
        return;
    }
    let config = format!(
        r#"{{"version": "1.0.0", "platforms": [{{"os": "{}", "name": "Host", "shell": "/bin/bash",
            "install_steps": [{{"name": "bashism", "command": "[[ -n yes ]] && echo bash-ok"}}]}}]}}"#,
        std::env::consts::OS
    );

    let (result, _) = run_local(&config).await;
    let report = result.unwrap();
    assert!(report.success());
    assert_eq!(report.results[0].output, "bash-ok\n");
}
