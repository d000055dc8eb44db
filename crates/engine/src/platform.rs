// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform and distribution resolution

use crate::error::EngineError;
use sink_config::{Config, Distribution, InstallStep, Platform, PlatformBody};
use sink_core::ExecutionContext;
use sink_transport::Transport;

/// Identity read from `/etc/os-release`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistroInfo {
    pub id: String,
    pub id_like: Vec<String>,
}

/// Extract `ID` and `ID_LIKE` from os-release content. Values may be
/// quoted; `ID_LIKE` is whitespace-separated.
pub fn parse_os_release(content: &str) -> DistroInfo {
    let mut info = DistroInfo::default();
    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ID=") {
            info.id = unquote(value).to_string();
        } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
            info.id_like = unquote(value)
                .split_whitespace()
                .map(str::to_string)
                .collect();
        }
    }
    info
}

fn unquote(value: &str) -> &str {
    value
        .trim()
        .trim_start_matches(['"', '\''])
        .trim_end_matches(['"', '\''])
}

/// Read the distribution identity through the transport. A missing file is
/// tolerated; resolution then falls to the platform's fallback.
pub async fn read_distro_info(transport: &dyn Transport) -> Option<DistroInfo> {
    match transport.run("cat /etc/os-release").await {
        Ok(output) if output.success() => {
            let info = parse_os_release(&output.stdout);
            if info.id.is_empty() {
                None
            } else {
                Some(info)
            }
        }
        Ok(_) => {
            tracing::debug!("/etc/os-release not readable");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read /etc/os-release");
            None
        }
    }
}

/// A platform (and, where applicable, distribution) selected for this run.
#[derive(Debug, Clone)]
pub struct ResolvedPlatform<'a> {
    pub platform: &'a Platform,
    pub distribution: Option<&'a Distribution>,
}

impl<'a> ResolvedPlatform<'a> {
    pub fn steps(&self) -> &'a [InstallStep] {
        match (&self.platform.body, self.distribution) {
            (_, Some(distribution)) => &distribution.install_steps,
            (PlatformBody::Steps(steps), None) => steps,
            // A distributions platform always resolves with a distribution.
            (PlatformBody::Distributions(_), None) => &[],
        }
    }
}

/// Choose a platform for the current host, in declaration order.
pub fn resolve<'a>(
    config: &'a Config,
    context: &ExecutionContext,
    distro: Option<&DistroInfo>,
    override_name: Option<&str>,
) -> Result<ResolvedPlatform<'a>, EngineError> {
    let platform = match override_name {
        Some(name) => config.platform_by_name(name).ok_or_else(|| {
            EngineError::UnsupportedPlatform(format!("no platform named '{}'", name))
        })?,
        None => match config
            .platforms
            .iter()
            .find(|p| platform_matches(p, context))
        {
            Some(platform) => platform,
            None => {
                let message = match &config.fallback {
                    Some(fallback) => fallback.error.replace("{os}", &context.os),
                    None => format!("unsupported platform '{}'", context.os),
                };
                return Err(EngineError::UnsupportedPlatform(message));
            }
        },
    };

    let distribution = match &platform.body {
        PlatformBody::Steps(_) => None,
        PlatformBody::Distributions(distributions) => {
            Some(select_distribution(config, platform, distributions, distro)?)
        }
    };

    Ok(ResolvedPlatform {
        platform,
        distribution,
    })
}

fn platform_matches(platform: &Platform, context: &ExecutionContext) -> bool {
    if context.os_kind() != Some(platform.os) {
        return false;
    }
    match &platform.match_pattern {
        None => true,
        Some(pattern) => match glob::Pattern::new(pattern) {
            Ok(glob) => glob.matches(&context.os),
            Err(e) => {
                tracing::warn!(platform = %platform.name, %pattern, error = %e, "invalid match glob");
                false
            }
        },
    }
}

fn select_distribution<'a>(
    config: &Config,
    platform: &Platform,
    distributions: &'a [Distribution],
    distro: Option<&DistroInfo>,
) -> Result<&'a Distribution, EngineError> {
    if let Some(info) = distro {
        // Exact ID first, in declaration order.
        if let Some(distribution) = distributions
            .iter()
            .find(|d| d.ids.iter().any(|id| id == &info.id))
        {
            return Ok(distribution);
        }
        // Then ID_LIKE tokens, in the order the host lists them.
        for token in &info.id_like {
            if let Some(distribution) = distributions
                .iter()
                .find(|d| d.ids.iter().any(|id| id == token))
            {
                tracing::debug!(distribution = %distribution.name, %token, "matched via ID_LIKE");
                return Ok(distribution);
            }
        }
    }

    let id = distro.map(|d| d.id.as_str()).unwrap_or("unknown");
    let message = match (&platform.fallback, &config.fallback) {
        (Some(fallback), _) => fallback.error.replace("{distro}", id),
        (None, Some(fallback)) => fallback.error.replace("{distro}", id),
        (None, None) => format!("unsupported distribution '{}'", id),
    };
    Err(EngineError::UnsupportedDistro(message))
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
