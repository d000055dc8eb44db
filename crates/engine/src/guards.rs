// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guard evaluation
//!
//! Every predicate is evaluated even after one fails; the aggregate error
//! lists one line per failing predicate so the operator sees the full
//! picture at once.

use crate::error::EngineError;
use regex::Regex;
use sink_config::Guards;
use sink_core::ExecutionContext;
use sink_transport::Transport;

/// Command used for the disk-space guard. GNU coreutils specific.
const DISK_SPACE_COMMAND: &str = "df -BG . | tail -1 | awk '{print $4}'";

/// Evaluate all guards against the discovered context.
pub async fn evaluate_guards(
    guards: &Guards,
    context: &ExecutionContext,
    transport: &dyn Transport,
) -> Result<(), EngineError> {
    let mut failures: Vec<String> = Vec::new();

    if let Some(ref pattern) = guards.required_hostname_pattern {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(&context.host) => {}
            Ok(_) => failures.push(format!(
                "hostname '{}' does not match required pattern '{}'",
                context.host, pattern
            )),
            Err(e) => failures.push(format!("invalid required_hostname_pattern: {}", e)),
        }
    }

    if let Some(ref pattern) = guards.forbidden_hostname_pattern {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(&context.host) => failures.push(format!(
                "hostname '{}' matches forbidden pattern '{}'",
                context.host, pattern
            )),
            Ok(_) => {}
            Err(e) => failures.push(format!("invalid forbidden_hostname_pattern: {}", e)),
        }
    }

    if let Some(ref user) = guards.required_user {
        if context.user != *user {
            failures.push(format!(
                "user '{}' does not match required user '{}'",
                context.user, user
            ));
        }
    }

    if guards.forbidden_users.contains(&context.user) {
        failures.push(format!("user '{}' is forbidden", context.user));
    }

    if !guards.allow_root && context.user == "root" {
        failures.push("running as root is not allowed (allow_root is false)".to_string());
    }

    // Environment checks go through the transport so a remote run inspects
    // the remote environment.
    let mut env_keys: Vec<&String> = guards.required_env_vars.keys().collect();
    env_keys.sort();
    for key in env_keys {
        let expected = &guards.required_env_vars[key];
        match transport.run(&format!("echo ${{{}}}", key)).await {
            Ok(output) => {
                let actual = output.stdout_trimmed();
                if actual != expected {
                    failures.push(format!(
                        "environment variable {}='{}' does not match required value '{}'",
                        key, actual, expected
                    ));
                }
            }
            Err(e) => failures.push(format!("could not read environment variable {}: {}", key, e)),
        }
    }

    if let Some(min_gb) = guards.min_disk_space_gb {
        match transport.run(DISK_SPACE_COMMAND).await {
            Ok(output) if output.success() => {
                let raw = output.stdout_trimmed();
                match raw.trim_end_matches('G').parse::<u64>() {
                    Ok(available) if available >= min_gb => {}
                    Ok(available) => failures.push(format!(
                        "only {}G free disk space, {}G required",
                        available, min_gb
                    )),
                    Err(_) => failures.push(format!(
                        "could not determine free disk space from '{}'",
                        raw
                    )),
                }
            }
            Ok(output) => failures.push(format!(
                "disk space check failed: {}",
                output.stderr.trim()
            )),
            Err(e) => failures.push(format!("disk space check failed: {}", e)),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(EngineError::GuardFailure(failures.join("\n")))
    }
}

#[cfg(test)]
#[path = "guards_tests.rs"]
mod tests;
