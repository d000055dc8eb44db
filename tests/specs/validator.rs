// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validator properties: accepted configs are unambiguous, rejections
//! name the offending path.

use sink_config::{parse_config, ConfigError, InstallStep, PlatformBody};

fn steps_config(steps: &str) -> String {
    format!(
        r#"{{"version": "1.0.0", "platforms": [{{"os": "linux", "name": "Linux", "install_steps": {}}}]}}"#,
        steps
    )
}

#[yare::parameterized(
    command         = { r#"{"name": "a", "command": "true"}"#, "Command" },
    check_error     = { r#"{"name": "a", "check": "true", "error": "e"}"#, "CheckError" },
    check_remediate = { r#"{"name": "a", "check": "true", "on_missing": [{"name": "r", "command": "true"}]}"#, "CheckRemediate" },
    error_only      = { r#"{"name": "a", "error": "e"}"#, "ErrorOnly" },
)]
fn every_accepted_step_inhabits_exactly_one_variant(step_json: &str, expected: &str) {
    let config = parse_config(&steps_config(&format!("[{}]", step_json))).unwrap();
    let PlatformBody::Steps(steps) = &config.platforms[0].body else {
        panic!("expected steps");
    };
    let actual = match steps[0] {
        InstallStep::Command(_) => "Command",
        InstallStep::CheckError(_) => "CheckError",
        InstallStep::CheckRemediate(_) => "CheckRemediate",
        InstallStep::ErrorOnly(_) => "ErrorOnly",
    };
    assert_eq!(actual, expected);
}

#[yare::parameterized(
    command_and_check = { r#"{"name": "a", "command": "x", "check": "y"}"# },
    check_alone       = { r#"{"name": "a", "check": "x"}"# },
    nothing           = { r#"{"name": "a"}"# },
    error_and_on_missing = { r#"{"name": "a", "check": "x", "error": "e", "on_missing": [{"name": "r", "command": "c"}]}"# },
)]
fn ambiguous_or_empty_steps_are_rejected(step_json: &str) {
    assert!(parse_config(&steps_config(&format!("[{}]", step_json))).is_err());
}

#[test]
fn rejection_message_names_the_offending_path() {
    let config = r#"{
        "version": "1.0.0",
        "platforms": [{"os": "darwin", "name": "macOS", "distributions": [
            {"ids": ["debian"], "name": "Debian-based", "install_steps": [
                {"name": "ok", "command": "true"},
                {"name": "ok2", "command": "true"},
                {"name": "bad", "command": "true", "check": "true"}
            ]}
        ]}]
    }"#;
    let err = parse_config(config).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ConfigError::Invalid { .. }));
    assert!(message.contains("platform 'macOS'"), "message: {message}");
    assert!(message.contains("distribution 'Debian-based'"), "message: {message}");
    assert!(message.contains("step 3"), "message: {message}");
    assert!(
        message.contains("both 'command' and 'check' present"),
        "message: {message}"
    );
}

#[test]
fn fact_and_export_name_patterns_are_enforced() {
    let bad_fact = r#"{"version": "1.0.0",
        "facts": {"Bad-Name": {"command": "true"}},
        "platforms": [{"os": "linux", "name": "L", "install_steps": [{"name": "s", "command": "true"}]}]}"#;
    let message = parse_config(bad_fact).unwrap_err().to_string();
    assert!(message.contains("name must match"), "message: {message}");

    let bad_export = r#"{"version": "1.0.0",
        "facts": {"arch": {"command": "true", "export": "lowercase"}},
        "platforms": [{"os": "linux", "name": "L", "install_steps": [{"name": "s", "command": "true"}]}]}"#;
    let message = parse_config(bad_export).unwrap_err().to_string();
    assert!(message.contains("fact 'arch'"), "message: {message}");
}

#[test]
fn platform_step_and_distribution_exclusivity_holds_for_accepted_configs() {
    let config = parse_config(
        r#"{"version": "1.0.0", "platforms": [
            {"os": "linux", "name": "A", "install_steps": [{"name": "s", "command": "true"}]},
            {"os": "linux", "name": "B", "distributions": [
                {"ids": ["debian"], "name": "D", "install_steps": [{"name": "s", "command": "true"}]}
            ]}
        ]}"#,
    )
    .unwrap();
    assert!(matches!(config.platforms[0].body, PlatformBody::Steps(_)));
    assert!(matches!(
        config.platforms[1].body,
        PlatformBody::Distributions(_)
    ));
}
