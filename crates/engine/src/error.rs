// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the engine

use sink_config::TemplateError;
use sink_transport::TransportError;
use thiserror::Error;

/// Errors that can occur while driving a run.
///
/// Step-level failures are reported through `StepResult` and the event
/// stream, not through this type; these are the failures that stop a run
/// before or between steps.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("unsupported distribution: {0}")]
    UnsupportedDistro(String),

    #[error("cyclic fact dependencies: {0}")]
    CyclicFacts(String),

    #[error("fact '{fact}' references unknown fact '{reference}'")]
    UnknownReference { fact: String, reference: String },

    #[error(transparent)]
    UnresolvedReference(#[from] TemplateError),

    #[error("fact '{fact}' failed: {message}")]
    FactFailure { fact: String, message: String },

    #[error("guard check failed:\n{0}")]
    GuardFailure(String),

    #[error("step '{step}' failed: {message}")]
    StepFailure { step: String, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    /// Collapse transport-level cancellation into [`EngineError::Cancelled`].
    pub(crate) fn normalized(self) -> Self {
        match self {
            EngineError::Transport(TransportError::Cancelled) => EngineError::Cancelled,
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            EngineError::Cancelled | EngineError::Transport(TransportError::Cancelled)
        )
    }
}
