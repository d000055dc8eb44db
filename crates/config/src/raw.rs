// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw serde mirror of the JSON configuration
//!
//! Serde does the structural heavy lifting; the validator in `parser.rs`
//! turns these permissive shapes into the sealed model with path-qualified
//! errors. Fields that need semantic checks (OS names, fact types,
//! durations) stay strings here so rejections name their location.

use crate::bootstrap::Bootstrap;
use crate::model::{Fallback, Guards, TimeoutSpec};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub guards: Option<Guards>,
    #[serde(default)]
    pub facts: IndexMap<String, RawFactDef>,
    #[serde(default)]
    pub platforms: Vec<RawPlatform>,
    #[serde(default)]
    pub fallback: Option<Fallback>,
    #[serde(default)]
    pub bootstrap: Option<Bootstrap>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawFactDef {
    pub command: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub export: Option<String>,
    #[serde(default, rename = "type")]
    pub fact_type: Option<String>,
    #[serde(default)]
    pub transform: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub timeout: Option<TimeoutSpec>,
    #[serde(default)]
    pub sleep: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawPlatform {
    pub os: Option<String>,
    #[serde(default, rename = "match")]
    pub match_pattern: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub required_tools: Option<Vec<String>>,
    #[serde(default)]
    pub install_steps: Option<Vec<RawStep>>,
    #[serde(default)]
    pub distributions: Option<Vec<RawDistribution>>,
    #[serde(default)]
    pub fallback: Option<Fallback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDistribution {
    #[serde(default)]
    pub ids: Vec<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub install_steps: Vec<RawStep>,
}

/// Every field of every step variant; the validator decides which variant
/// the combination inhabits. Doubles as the shape of remediation entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawStep {
    pub name: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub check: Option<String>,
    #[serde(default)]
    pub on_missing: Option<Vec<RawStep>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub retry: Option<String>,
    #[serde(default)]
    pub timeout: Option<TimeoutSpec>,
    #[serde(default)]
    pub sleep: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}
