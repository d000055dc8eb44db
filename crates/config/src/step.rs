// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sealed install-step union
//!
//! A step value inhabits exactly one of four variants, discriminated by
//! which fields its JSON object carries. The validator performs the
//! discrimination so executor dispatch is a total `match`.

use crate::model::TimeoutSpec;
use serde::{Deserialize, Serialize};

/// Retry policy for a command step. The only recognized value is the
/// string `"until"`: poll the command at a fixed interval until it
/// succeeds or the timeout budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    Until,
}

/// One step of a platform's (or distribution's) install sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallStep {
    /// Run a command; non-zero exit fails the step.
    Command(CommandStep),
    /// Run a read-only check; non-zero exit fails with the configured error.
    CheckError(CheckErrorStep),
    /// Run a read-only check; on failure run the remediation chain, then
    /// re-check.
    CheckRemediate(CheckRemediateStep),
    /// Unconditionally fail with the configured error.
    ErrorOnly(ErrorOnlyStep),
}

impl InstallStep {
    pub fn name(&self) -> &str {
        match self {
            InstallStep::Command(s) => &s.name,
            InstallStep::CheckError(s) => &s.name,
            InstallStep::CheckRemediate(s) => &s.name,
            InstallStep::ErrorOnly(s) => &s.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandStep {
    pub name: String,
    pub command: String,
    pub message: Option<String>,
    pub error: Option<String>,
    pub retry: Option<RetryPolicy>,
    pub timeout: Option<TimeoutSpec>,
    pub sleep: Option<String>,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckErrorStep {
    pub name: String,
    pub check: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckRemediateStep {
    pub name: String,
    pub check: String,
    pub on_missing: Vec<RemediationStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorOnlyStep {
    pub name: String,
    pub error: String,
}

/// A remediation command: the shape of [`CommandStep`] without `message`.
/// Remediations cannot themselves carry a `check` or nest `on_missing`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationStep {
    pub name: String,
    pub command: String,
    pub error: Option<String>,
    pub retry: Option<RetryPolicy>,
    pub timeout: Option<TimeoutSpec>,
    pub sleep: Option<String>,
    pub verbose: bool,
}
