// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step results and lifecycle events

use crate::context::ExecutionContext;
use crate::id::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a step within the per-step state machine.
///
/// NotStarted is implicit; a step surfaces as Running on entry and exactly
/// one terminal status on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Success,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::Running)
    }
}

/// Outcome of one step, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    pub fn success(step_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Success,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(step_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Failed,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// One record in the event stream.
///
/// Events are self-describing: every record carries the run id and the full
/// execution context so a subscriber needs no out-of-band state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub timestamp: DateTime<Utc>,
    pub run_id: RunId,
    pub step_name: String,
    pub status: StepStatus,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub context: ExecutionContext,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
