// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact gathering

use crate::emitter::EventEmitter;
use crate::error::EngineError;
use crate::graph::fact_order;
use crate::util::sleep_interruptible;
use indexmap::IndexMap;
use sink_config::{escape_for_shell, interpolate, FactDef, FactType};
use sink_core::{FactValue, Facts, OsKind, StepStatus};
use sink_transport::{CancelToken, Transport, TransportError, TIMEOUT_EXIT_CODE};

/// Evaluates fact commands in dependency order, at most once per run.
pub struct FactGatherer<'a> {
    transport: &'a dyn Transport,
    emitter: &'a EventEmitter,
    cancel: &'a CancelToken,
}

impl<'a> FactGatherer<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        emitter: &'a EventEmitter,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            transport,
            emitter,
            cancel,
        }
    }

    /// Gather every applicable fact. A failing fact aborts the run iff it
    /// is `required`; otherwise it stays unset and later references to it
    /// fail where they occur.
    pub async fn gather(
        &self,
        defs: &IndexMap<String, FactDef>,
        os: Option<OsKind>,
    ) -> Result<Facts, EngineError> {
        let order = fact_order(defs)?;
        let mut facts = Facts::new();

        for name in order {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let Some(def) = defs.get(&name) else {
                continue;
            };
            if !def.applies_to(os) {
                tracing::debug!(fact = %name, "skipped by platform filter");
                continue;
            }

            match self.gather_one(def, &facts).await {
                Ok((value, raw_output)) => {
                    tracing::debug!(fact = %name, value = %value.render(), "gathered");
                    if let Some(ref export) = def.export {
                        self.transport
                            .export_var(export, &escape_for_shell(&value.render()));
                    }
                    if def.verbose {
                        self.emitter.emit(
                            &format!("fact:{}", name),
                            StepStatus::Success,
                            raw_output,
                            None,
                        );
                    }
                    facts.set(name, value);
                }
                Err(GatherError::Cancelled) => return Err(EngineError::Cancelled),
                Err(GatherError::Failed(message)) => {
                    if def.required {
                        self.emitter.emit(
                            &format!("fact:{}", name),
                            StepStatus::Failed,
                            "",
                            Some(message.clone()),
                        );
                        return Err(EngineError::FactFailure {
                            fact: name,
                            message,
                        });
                    }
                    tracing::warn!(fact = %name, %message, "optional fact failed, left unset");
                }
            }

            if let Some(ref sleep) = def.sleep {
                if let Ok(duration) = sink_core::parse_duration(sleep) {
                    if !sleep_interruptible(duration, self.cancel).await {
                        return Err(EngineError::Cancelled);
                    }
                }
            }
        }

        Ok(facts)
    }

    async fn gather_one(
        &self,
        def: &FactDef,
        facts: &Facts,
    ) -> Result<(FactValue, String), GatherError> {
        let command =
            interpolate(&def.command, facts).map_err(|e| GatherError::Failed(e.to_string()))?;

        let deadline = def.timeout.as_ref().and_then(|t| t.duration().ok());
        let exit_code = def
            .timeout
            .as_ref()
            .and_then(|t| t.error_code())
            .unwrap_or(TIMEOUT_EXIT_CODE);

        let output = self
            .transport
            .run_with_deadline(&command, deadline, exit_code)
            .await
            .map_err(|e| match e {
                TransportError::Cancelled => GatherError::Cancelled,
                other => GatherError::Failed(other.to_string()),
            })?;

        if !output.success() {
            return Err(GatherError::Failed(format!(
                "exit code {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let raw = output.stdout_trimmed();
        let value = convert(def, raw)?;
        Ok((value, output.stdout.clone()))
    }
}

enum GatherError {
    Failed(String),
    Cancelled,
}

/// Coerce trimmed stdout into the fact's declared type.
fn convert(def: &FactDef, raw: &str) -> Result<FactValue, GatherError> {
    match def.fact_type {
        FactType::String => {
            if def.transform.is_empty() {
                return Ok(FactValue::String(raw.to_string()));
            }
            match def.transform.get(raw) {
                Some(mapped) => Ok(FactValue::String(mapped.clone())),
                None if def.strict => Err(GatherError::Failed(format!(
                    "value '{}' has no transform mapping",
                    raw
                ))),
                None => Ok(FactValue::String(raw.to_string())),
            }
        }
        FactType::Boolean => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(FactValue::Bool(true)),
            "false" | "0" | "no" | "" => Ok(FactValue::Bool(false)),
            other => Err(GatherError::Failed(format!(
                "value '{}' is not a boolean",
                other
            ))),
        },
        FactType::Integer => raw
            .parse::<i64>()
            .map(FactValue::Int)
            .map_err(|_| GatherError::Failed(format!("value '{}' is not an integer", raw))),
    }
}

#[cfg(test)]
#[path = "facts_tests.rs"]
mod tests;
