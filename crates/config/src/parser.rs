// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration parsing and validation
//!
//! One serde pass over the JSON, then explicit validation passes that
//! produce the sealed model. Every rejection carries the path of the
//! offending value, e.g. `platform 'macOS': distribution 'Debian-based':
//! step 3: both 'command' and 'check' present`.

use crate::model::{
    Config, Distribution, FactDef, FactType, Platform, PlatformBody, TimeoutSpec,
};
use crate::raw::{RawConfig, RawDistribution, RawFactDef, RawPlatform, RawStep};
use crate::step::{
    CheckErrorStep, CheckRemediateStep, CommandStep, ErrorOnlyStep, InstallStep, RemediationStep,
    RetryPolicy,
};
use regex::Regex;
use sink_core::{is_valid_duration, OsKind};
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur while parsing a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{location}: {message}")]
    Invalid { location: String, message: String },
}

impl ConfigError {
    fn invalid(location: impl AsRef<str>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            location: location.as_ref().to_string(),
            message: message.into(),
        }
    }
}

// The patterns are compile-time constants, verified by tests.
#[allow(clippy::expect_used)]
static FACT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("constant regex pattern is valid"));
#[allow(clippy::expect_used)]
static EXPORT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("constant regex pattern is valid"));
#[allow(clippy::expect_used)]
static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+(\.[0-9]+)?$").expect("constant regex pattern is valid")
});

/// Parse and validate a JSON configuration.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    // 1. Serde does the heavy lifting
    let raw: RawConfig = serde_json::from_str(content)?;

    // 2. Top-level requirements
    let version = raw
        .version
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::invalid("config", "'version' is required"))?;
    if !VERSION.is_match(version.trim()) {
        return Err(ConfigError::invalid(
            "config",
            format!("'version' must be a semver string like \"1.0.0\", got '{}'", version),
        ));
    }
    if raw.platforms.is_empty() {
        return Err(ConfigError::invalid(
            "config",
            "at least one platform is required",
        ));
    }

    // 3. Facts
    let mut facts = indexmap::IndexMap::new();
    for (name, def) in raw.facts {
        let fact = validate_fact(&name, def)?;
        facts.insert(name, fact);
    }

    // 4. Guard regex patterns must compile now, not at evaluation time
    if let Some(ref guards) = raw.guards {
        for (field, pattern) in [
            ("required_hostname_pattern", &guards.required_hostname_pattern),
            ("forbidden_hostname_pattern", &guards.forbidden_hostname_pattern),
        ] {
            if let Some(p) = pattern {
                Regex::new(p).map_err(|e| {
                    ConfigError::invalid(format!("guards.{}", field), format!("invalid regex: {}", e))
                })?;
            }
        }
    }

    // 5. Platforms and their step lists
    let mut platforms = Vec::with_capacity(raw.platforms.len());
    for (i, platform) in raw.platforms.into_iter().enumerate() {
        platforms.push(validate_platform(i, platform)?);
    }

    // 6. Bootstrap sources must at least name a URL
    if let Some(ref bootstrap) = raw.bootstrap {
        for (i, rc) in bootstrap.remote_configs.iter().enumerate() {
            if rc.url.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("bootstrap: remote_configs[{}]", i),
                    "'url' must not be empty",
                ));
            }
        }
    }

    Ok(Config {
        version,
        description: raw.description,
        guards: raw.guards,
        facts,
        platforms,
        fallback: raw.fallback,
        bootstrap: raw.bootstrap,
    })
}

fn validate_fact(name: &str, raw: RawFactDef) -> Result<FactDef, ConfigError> {
    let location = format!("fact '{}'", name);

    if !FACT_NAME.is_match(name) {
        return Err(ConfigError::invalid(
            &location,
            "name must match ^[a-z_][a-z0-9_]*$",
        ));
    }

    let command = raw
        .command
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ConfigError::invalid(&location, "'command' must not be empty"))?
        .to_string();

    if let Some(ref export) = raw.export {
        if !EXPORT_NAME.is_match(export) {
            return Err(ConfigError::invalid(
                &location,
                format!("export '{}' must match ^[A-Z_][A-Z0-9_]*$", export),
            ));
        }
    }

    let fact_type = match raw.fact_type.as_deref() {
        None => FactType::String,
        Some("string") => FactType::String,
        Some("boolean") => FactType::Boolean,
        Some("integer") => FactType::Integer,
        Some(other) => {
            return Err(ConfigError::invalid(
                &location,
                format!("unknown type '{}'; expected string, boolean, or integer", other),
            ));
        }
    };

    let transform = raw.transform.unwrap_or_default();
    if !transform.is_empty() && fact_type != FactType::String {
        return Err(ConfigError::invalid(
            &location,
            format!("'transform' requires string type, got {}", fact_type.as_str()),
        ));
    }

    let platforms = match raw.platforms {
        None => Vec::new(),
        Some(list) => {
            let mut kinds = Vec::with_capacity(list.len());
            for os in &list {
                let kind = OsKind::from_identifier(os).ok_or_else(|| {
                    ConfigError::invalid(
                        &location,
                        format!("unknown platform '{}'; expected darwin, linux, or windows", os),
                    )
                })?;
                kinds.push(kind);
            }
            kinds
        }
    };

    if let Some(ref timeout) = raw.timeout {
        validate_timeout(&location, timeout)?;
    }
    if let Some(ref sleep) = raw.sleep {
        validate_sleep(&location, sleep)?;
    }

    Ok(FactDef {
        name: name.to_string(),
        command,
        description: raw.description,
        export: raw.export,
        fact_type,
        transform,
        strict: raw.strict,
        platforms,
        required: raw.required,
        timeout: raw.timeout,
        sleep: raw.sleep,
        verbose: raw.verbose,
    })
}

fn validate_platform(index: usize, raw: RawPlatform) -> Result<Platform, ConfigError> {
    let fallback_location = format!("platform {}", index + 1);

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConfigError::invalid(&fallback_location, "'name' is required"))?
        .to_string();
    let location = format!("platform '{}'", name);

    let os_str = raw
        .os
        .as_deref()
        .ok_or_else(|| ConfigError::invalid(&location, "'os' is required"))?;
    let os = OsKind::from_identifier(os_str).ok_or_else(|| {
        ConfigError::invalid(
            &location,
            format!("unknown os '{}'; expected darwin, linux, or windows", os_str),
        )
    })?;

    let body = match (raw.install_steps, raw.distributions) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::invalid(
                &location,
                "both 'install_steps' and 'distributions' present; exactly one is required",
            ));
        }
        (None, None) => {
            return Err(ConfigError::invalid(
                &location,
                "one of 'install_steps' or 'distributions' is required",
            ));
        }
        (Some(steps), None) => {
            if steps.is_empty() {
                return Err(ConfigError::invalid(&location, "'install_steps' must not be empty"));
            }
            PlatformBody::Steps(validate_steps(&location, steps)?)
        }
        (None, Some(distributions)) => {
            if distributions.is_empty() {
                return Err(ConfigError::invalid(&location, "'distributions' must not be empty"));
            }
            let mut out = Vec::with_capacity(distributions.len());
            for (i, distribution) in distributions.into_iter().enumerate() {
                out.push(validate_distribution(&location, i, distribution)?);
            }
            PlatformBody::Distributions(out)
        }
    };

    Ok(Platform {
        os,
        match_pattern: raw.match_pattern,
        name,
        shell: raw.shell,
        required_tools: raw.required_tools.unwrap_or_default(),
        body,
        fallback: raw.fallback,
    })
}

fn validate_distribution(
    platform_location: &str,
    index: usize,
    raw: RawDistribution,
) -> Result<Distribution, ConfigError> {
    let fallback_location = format!("{}: distribution {}", platform_location, index + 1);

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConfigError::invalid(&fallback_location, "'name' is required"))?
        .to_string();
    let location = format!("{}: distribution '{}'", platform_location, name);

    if raw.ids.is_empty() || raw.ids.iter().all(|id| id.trim().is_empty()) {
        return Err(ConfigError::invalid(&location, "'ids' must not be empty"));
    }
    if raw.install_steps.is_empty() {
        return Err(ConfigError::invalid(&location, "'install_steps' must not be empty"));
    }

    Ok(Distribution {
        ids: raw.ids,
        name,
        install_steps: validate_steps(&location, raw.install_steps)?,
    })
}

fn validate_steps(location: &str, raw: Vec<RawStep>) -> Result<Vec<InstallStep>, ConfigError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, step)| validate_step(&format!("{}: step {}", location, i + 1), step))
        .collect()
}

/// Discriminate a raw step into exactly one sealed variant.
fn validate_step(location: &str, raw: RawStep) -> Result<InstallStep, ConfigError> {
    let RawStep {
        name,
        command,
        check,
        on_missing,
        error,
        message,
        retry,
        timeout,
        sleep,
        verbose,
    } = raw;

    let name = name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConfigError::invalid(location, "'name' is required"))?
        .to_string();

    match (command, check, on_missing, error) {
        // -- Command --
        (Some(_), Some(_), _, _) => Err(ConfigError::invalid(
            location,
            "both 'command' and 'check' present",
        )),
        (Some(_), None, Some(_), _) => Err(ConfigError::invalid(
            location,
            "'on_missing' requires 'check', not 'command'",
        )),
        (Some(command), None, None, error) => {
            let command = non_empty(location, "command", &command)?;
            let retry = validate_retry(location, retry.as_deref())?;
            if let Some(ref timeout) = timeout {
                validate_timeout(location, timeout)?;
            }
            if let Some(ref sleep) = sleep {
                validate_sleep(location, sleep)?;
            }
            Ok(InstallStep::Command(CommandStep {
                name,
                command,
                message,
                error,
                retry,
                timeout,
                sleep,
                verbose,
            }))
        }

        // -- CheckRemediate --
        (None, Some(_), Some(_), Some(_)) => Err(ConfigError::invalid(
            location,
            "both 'error' and 'on_missing' present with 'check'",
        )),
        (None, Some(check), Some(on_missing), None) => {
            forbid(location, "a check/on_missing step", &message, "message")?;
            forbid(location, "a check/on_missing step", &retry, "retry")?;
            forbid(location, "a check/on_missing step", &timeout, "timeout")?;
            forbid(location, "a check/on_missing step", &sleep, "sleep")?;
            let check = non_empty(location, "check", &check)?;
            if on_missing.is_empty() {
                return Err(ConfigError::invalid(location, "'on_missing' must not be empty"));
            }
            let on_missing = on_missing
                .iter()
                .enumerate()
                .map(|(i, step)| {
                    validate_remediation(&format!("{}: remediation {}", location, i + 1), step)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(InstallStep::CheckRemediate(CheckRemediateStep {
                name,
                check,
                on_missing,
            }))
        }

        // -- CheckError --
        (None, Some(check), None, Some(error)) => {
            forbid(location, "a check step", &message, "message")?;
            forbid(location, "a check step", &retry, "retry")?;
            forbid(location, "a check step", &timeout, "timeout")?;
            forbid(location, "a check step", &sleep, "sleep")?;
            let check = non_empty(location, "check", &check)?;
            let error = non_empty(location, "error", &error)?;
            Ok(InstallStep::CheckError(CheckErrorStep { name, check, error }))
        }
        (None, Some(_), None, None) => Err(ConfigError::invalid(
            location,
            "'check' requires either 'error' or 'on_missing'",
        )),

        // -- ErrorOnly --
        (None, None, Some(_), _) => Err(ConfigError::invalid(
            location,
            "'on_missing' requires 'check'",
        )),
        (None, None, None, Some(error)) => {
            forbid(location, "an error-only step", &message, "message")?;
            forbid(location, "an error-only step", &retry, "retry")?;
            forbid(location, "an error-only step", &timeout, "timeout")?;
            forbid(location, "an error-only step", &sleep, "sleep")?;
            let error = non_empty(location, "error", &error)?;
            Ok(InstallStep::ErrorOnly(ErrorOnlyStep { name, error }))
        }

        (None, None, None, None) => Err(ConfigError::invalid(
            location,
            "step must have one of 'command', 'check', or 'error'",
        )),
    }
}

/// A remediation entry: Command shape without `message`, `check`, or
/// nested `on_missing`.
fn validate_remediation(location: &str, raw: &RawStep) -> Result<RemediationStep, ConfigError> {
    forbid(location, "a remediation step", &raw.check, "check")?;
    forbid(location, "a remediation step", &raw.on_missing, "on_missing")?;
    forbid(location, "a remediation step", &raw.message, "message")?;

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConfigError::invalid(location, "'name' is required"))?
        .to_string();
    let command = raw
        .command
        .as_deref()
        .ok_or_else(|| ConfigError::invalid(location, "'command' is required"))?;
    let command = non_empty(location, "command", command)?;

    let retry = validate_retry(location, raw.retry.as_deref())?;
    if let Some(ref timeout) = raw.timeout {
        validate_timeout(location, timeout)?;
    }
    if let Some(ref sleep) = raw.sleep {
        validate_sleep(location, sleep)?;
    }

    Ok(RemediationStep {
        name,
        command,
        error: raw.error.clone(),
        retry,
        timeout: raw.timeout.clone(),
        sleep: raw.sleep.clone(),
        verbose: raw.verbose,
    })
}

fn validate_retry(location: &str, retry: Option<&str>) -> Result<Option<RetryPolicy>, ConfigError> {
    match retry {
        None => Ok(None),
        Some("until") => Ok(Some(RetryPolicy::Until)),
        Some(other) => Err(ConfigError::invalid(
            location,
            format!("retry must be the string \"until\", got '{}'", other),
        )),
    }
}

fn validate_timeout(location: &str, timeout: &TimeoutSpec) -> Result<(), ConfigError> {
    if !is_valid_duration(timeout.interval_str()) {
        return Err(ConfigError::invalid(
            location,
            format!(
                "invalid timeout '{}': expected a duration like \"30s\", \"5m\", or \"1h\"",
                timeout.interval_str()
            ),
        ));
    }
    Ok(())
}

fn validate_sleep(location: &str, sleep: &str) -> Result<(), ConfigError> {
    if !is_valid_duration(sleep) {
        return Err(ConfigError::invalid(
            location,
            format!("invalid sleep '{}': expected a duration like \"30s\", \"5m\", or \"1h\"", sleep),
        ));
    }
    Ok(())
}

fn non_empty(location: &str, field: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(
            location,
            format!("'{}' must not be empty", field),
        ));
    }
    Ok(trimmed.to_string())
}

fn forbid<T>(
    location: &str,
    step_kind: &str,
    field: &Option<T>,
    field_name: &str,
) -> Result<(), ConfigError> {
    if field.is_some() {
        return Err(ConfigError::invalid(
            location,
            format!("'{}' is not allowed on {}", field_name, step_kind),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
