// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step execution
//!
//! Drives one run: guards, facts, platform resolution, then the selected
//! step list in declaration order with stop-on-first-failure. Each step
//! surfaces a `running` event on entry and exactly one terminal event on
//! exit.

use crate::context::discover_context;
use crate::emitter::{EventEmitter, EventSink};
use crate::error::EngineError;
use crate::facts::FactGatherer;
use crate::guards::evaluate_guards;
use crate::platform::{read_distro_info, resolve};
use crate::util::sleep_interruptible;
use sink_config::{
    interpolate, CheckErrorStep, CheckRemediateStep, CommandStep, Config, ErrorOnlyStep,
    InstallStep, RemediationStep, RetryPolicy, TimeoutSpec,
};
use sink_core::{
    Clock, ExecutionContext, Facts, OsKind, RunId, StepResult, StepStatus, SystemClock,
};
use sink_transport::{CancelToken, Transport, TransportError, TIMEOUT_EXIT_CODE};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fixed pause between retry-until attempts.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Retry budget when a retry-until step declares no timeout.
const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_TIMEOUT_LABEL: &str = "60s";

/// Resolves the confirmation gate before the first step.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Behavioral switches fixed at executor construction.
#[derive(Default)]
pub struct ExecutorOptions {
    /// Print the plan without invoking any user command.
    pub dry_run: bool,
    /// Skip the confirmation gate.
    pub non_interactive: bool,
    /// Select a platform by name instead of detecting one.
    pub platform_override: Option<String>,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub platform: String,
    pub distribution: Option<String>,
    pub facts: Facts,
    pub results: Vec<StepResult>,
}

impl RunReport {
    /// True when no step failed. The terminal run status is this fold.
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.status != StepStatus::Failed)
    }
}

/// Drives a platform's step list against a transport.
///
/// The executor holds a shared reference to the transport so a caller can
/// dispose of it on cancellation; the transport outlives no run.
pub struct Executor {
    config: Config,
    transport: Arc<dyn Transport>,
    emitter: EventEmitter,
    options: ExecutorOptions,
    cancel: CancelToken,
    confirmer: Option<Box<dyn Confirm>>,
}

impl Executor {
    /// Construct an executor and discover the execution context.
    pub async fn connect(
        config: Config,
        transport: Arc<dyn Transport>,
        sink: Box<dyn EventSink>,
        options: ExecutorOptions,
    ) -> Self {
        Self::connect_with(
            config,
            transport,
            sink,
            options,
            Box::new(SystemClock),
            CancelToken::new(),
            None,
        )
        .await
    }

    /// Full-control constructor: injectable clock, cancellation token, and
    /// confirmation gate.
    pub async fn connect_with(
        config: Config,
        transport: Arc<dyn Transport>,
        sink: Box<dyn EventSink>,
        options: ExecutorOptions,
        clock: Box<dyn Clock>,
        cancel: CancelToken,
        confirmer: Option<Box<dyn Confirm>>,
    ) -> Self {
        let run_id = RunId::next();
        let context = discover_context(transport.as_ref(), clock.as_ref()).await;
        tracing::info!(%run_id, host = %context.host, os = %context.os, "run starting");
        let emitter = EventEmitter::new(run_id, context, sink, clock);
        Self {
            config,
            transport,
            emitter,
            options,
            cancel,
            confirmer,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.emitter.run_id()
    }

    pub fn context(&self) -> &ExecutionContext {
        self.emitter.context()
    }

    /// Execute the run end to end.
    ///
    /// Step failures are reported inside the returned [`RunReport`]; an
    /// `Err` means the run stopped before or between steps (guards, facts,
    /// resolution, confirmation, cancellation).
    pub async fn run(&self) -> Result<RunReport, EngineError> {
        // Guards gate everything, dry-run included.
        if let Some(ref guards) = self.config.guards {
            if let Err(e) = evaluate_guards(guards, self.context(), &*self.transport).await {
                self.emitter
                    .emit("Guard Check", StepStatus::Failed, "", Some(e.to_string()));
                return Err(e);
            }
        }

        let gatherer = FactGatherer::new(&*self.transport, &self.emitter, &self.cancel);
        let facts = gatherer
            .gather(&self.config.facts, self.context().os_kind())
            .await?;

        let distro = if self.context().os_kind() == Some(OsKind::Linux) {
            read_distro_info(&*self.transport).await
        } else {
            None
        };
        let resolved = match resolve(
            &self.config,
            self.context(),
            distro.as_ref(),
            self.options.platform_override.as_deref(),
        ) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.emitter.emit(
                    "Platform Resolution",
                    StepStatus::Failed,
                    "",
                    Some(e.to_string()),
                );
                return Err(e);
            }
        };
        tracing::info!(
            platform = %resolved.platform.name,
            distribution = resolved.distribution.map(|d| d.name.as_str()),
            "platform selected"
        );

        if resolved.platform.shell.is_some() {
            self.transport.set_shell(resolved.platform.shell.clone());
        }

        if let Err(e) = self.check_required_tools(&resolved.platform.required_tools).await {
            self.emitter
                .emit("Tool Check", StepStatus::Failed, "", Some(e.to_string()));
            return Err(e);
        }

        let steps = resolved.steps();
        if let Err(e) = self.confirm_gate(resolved.platform.name.as_str(), steps.len()) {
            return Err(e);
        }

        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            if self.cancel.is_cancelled() {
                self.emitter.emit(
                    step.name(),
                    StepStatus::Failed,
                    "",
                    Some("cancelled".to_string()),
                );
                return Err(EngineError::Cancelled);
            }

            let result = match self.execute_step(step, &facts).await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => {
                    self.emitter.emit(
                        step.name(),
                        StepStatus::Failed,
                        "",
                        Some("cancelled".to_string()),
                    );
                    return Err(EngineError::Cancelled);
                }
                Err(e) => return Err(e.normalized()),
            };

            let failed = result.status == StepStatus::Failed;
            results.push(result);
            if failed {
                // Stop on first failure.
                break;
            }
        }

        let report = RunReport {
            platform: resolved.platform.name.clone(),
            distribution: resolved.distribution.map(|d| d.name.clone()),
            facts,
            results,
        };
        tracing::info!(success = report.success(), "run finished");
        Ok(report)
    }

    /// Probe `required_tools` via `command -v` before anything runs.
    async fn check_required_tools(&self, tools: &[String]) -> Result<(), EngineError> {
        let mut missing = Vec::new();
        for tool in tools {
            match self.transport.run(&format!("command -v {}", tool)).await {
                Ok(output) if output.success() => {}
                Ok(_) => missing.push(tool.clone()),
                Err(TransportError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) => missing.push(format!("{} ({})", tool, e)),
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::StepFailure {
                step: "Tool Check".to_string(),
                message: format!("missing required tools: {}", missing.join(", ")),
            })
        }
    }

    /// Block before the first step unless dry-run or non-interactive mode
    /// disarms the gate. An unresolved or declined prompt cancels the run.
    fn confirm_gate(&self, platform: &str, step_count: usize) -> Result<(), EngineError> {
        if self.options.dry_run || self.options.non_interactive {
            return Ok(());
        }

        let prompt = self
            .config
            .guards
            .as_ref()
            .and_then(|g| g.confirm_prompt.clone())
            .unwrap_or_else(|| {
                format!("Execute {} steps on platform '{}'?", step_count, platform)
            });

        self.emitter
            .emit("Confirmation", StepStatus::Running, prompt.clone(), None);
        let confirmed = self
            .confirmer
            .as_ref()
            .map(|c| c.confirm(&prompt))
            .unwrap_or(false);

        if confirmed {
            self.emitter
                .emit("Confirmation", StepStatus::Success, "", None);
            Ok(())
        } else {
            self.emitter.emit(
                "Confirmation",
                StepStatus::Failed,
                "",
                Some("cancelled".to_string()),
            );
            Err(EngineError::Cancelled)
        }
    }

    async fn execute_step(
        &self,
        step: &InstallStep,
        facts: &Facts,
    ) -> Result<StepResult, EngineError> {
        let span = tracing::info_span!("step", name = step.name());
        let _guard = span.enter();
        let started = Instant::now();

        let result = match step {
            InstallStep::Command(command) => self.run_command_step(command, facts).await?,
            InstallStep::CheckError(check) => self.run_check_error(check, facts).await?,
            InstallStep::CheckRemediate(check) => self.run_check_remediate(check, facts).await?,
            InstallStep::ErrorOnly(error_step) => self.run_error_only(error_step),
        };

        tracing::info!(
            status = ?result.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "step finished"
        );
        Ok(result)
    }

    // === Command ===

    async fn run_command_step(
        &self,
        step: &CommandStep,
        facts: &Facts,
    ) -> Result<StepResult, EngineError> {
        self.emitter.emit(
            &step.name,
            StepStatus::Running,
            step.message.clone().unwrap_or_default(),
            None,
        );

        let command = match interpolate(&step.command, facts) {
            Ok(command) => command,
            Err(e) => return Ok(self.fail(&step.name, e.to_string())),
        };

        if self.options.dry_run {
            return Ok(self.succeed(&step.name, format!("[dry-run] {}", command)));
        }

        let result = match step.retry {
            Some(RetryPolicy::Until) => {
                self.run_until(&step.name, &command, step.timeout.as_ref())
                    .await?
            }
            None => {
                let deadline = step.timeout.as_ref().and_then(|t| t.duration().ok());
                let timeout_code = step
                    .timeout
                    .as_ref()
                    .and_then(|t| t.error_code())
                    .unwrap_or(TIMEOUT_EXIT_CODE);
                match self
                    .transport
                    .run_with_deadline(&command, deadline, timeout_code)
                    .await
                {
                    Ok(output) if output.success() => self.succeed(&step.name, output.stdout),
                    Ok(output) => {
                        let error = step.error.clone().unwrap_or_else(|| {
                            format!("exit code {}: {}", output.exit_code, output.stderr.trim())
                        });
                        self.fail(&step.name, error)
                    }
                    Err(TransportError::Cancelled) => return Err(EngineError::Cancelled),
                    Err(e) => self.fail(&step.name, e.to_string()),
                }
            }
        };

        if result.status == StepStatus::Success {
            if let Some(ref sleep) = step.sleep {
                if let Ok(duration) = sink_core::parse_duration(sleep) {
                    if !sleep_interruptible(duration, &self.cancel).await {
                        return Err(EngineError::Cancelled);
                    }
                }
            }
        }

        Ok(result)
    }

    /// Poll `command` once per second until it exits zero or the budget is
    /// spent.
    async fn run_until(
        &self,
        step_name: &str,
        command: &str,
        timeout: Option<&TimeoutSpec>,
    ) -> Result<StepResult, EngineError> {
        let (budget, budget_label) = match timeout {
            None => (DEFAULT_RETRY_TIMEOUT, DEFAULT_RETRY_TIMEOUT_LABEL.to_string()),
            Some(spec) => match spec.duration() {
                Ok(duration) => (duration, spec.interval_str().to_string()),
                Err(e) => {
                    // The validator rejects these; guard against hand-built configs.
                    return Ok(self.fail(step_name, e.to_string()));
                }
            },
        };

        // tokio's clock so paused-time tests can drive the poll loop.
        let start = tokio::time::Instant::now();
        let mut last_error = String::from("never attempted");

        loop {
            match self.transport.run(command).await {
                Ok(output) if output.success() => {
                    let elapsed = start.elapsed().as_secs();
                    return Ok(self.succeed(step_name, format!("succeeded after {}s", elapsed)));
                }
                Ok(output) => {
                    last_error =
                        format!("exit code {}: {}", output.exit_code, output.stderr.trim());
                }
                Err(TransportError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) => last_error = e.to_string(),
            }

            if start.elapsed() >= budget {
                return Ok(self.fail(
                    step_name,
                    format!("Timeout after {}\nLast error: {}", budget_label, last_error),
                ));
            }

            if !sleep_interruptible(POLL_INTERVAL, &self.cancel).await {
                return Err(EngineError::Cancelled);
            }
        }
    }

    // === CheckError ===

    async fn run_check_error(
        &self,
        step: &CheckErrorStep,
        facts: &Facts,
    ) -> Result<StepResult, EngineError> {
        self.emitter.emit(&step.name, StepStatus::Running, "", None);

        let check = match interpolate(&step.check, facts) {
            Ok(check) => check,
            Err(e) => return Ok(self.fail(&step.name, e.to_string())),
        };

        if self.options.dry_run {
            return Ok(self.succeed(&step.name, format!("[dry-run] check: {}", check)));
        }

        match self.transport.run(&check).await {
            Ok(output) if output.success() => Ok(self.succeed(&step.name, output.stdout)),
            Ok(_) => Ok(self.fail(&step.name, step.error.clone())),
            Err(TransportError::Cancelled) => Err(EngineError::Cancelled),
            Err(e) => Ok(self.fail(&step.name, e.to_string())),
        }
    }

    // === CheckRemediate ===

    async fn run_check_remediate(
        &self,
        step: &CheckRemediateStep,
        facts: &Facts,
    ) -> Result<StepResult, EngineError> {
        self.emitter.emit(&step.name, StepStatus::Running, "", None);

        let check = match interpolate(&step.check, facts) {
            Ok(check) => check,
            Err(e) => return Ok(self.fail(&step.name, e.to_string())),
        };

        if self.options.dry_run {
            let mut plan = vec![format!("[dry-run] check: {}", check)];
            for remediation in &step.on_missing {
                let command = interpolate(&remediation.command, facts)
                    .unwrap_or_else(|_| remediation.command.clone());
                plan.push(format!(
                    "[dry-run] remediation '{}': {}",
                    remediation.name, command
                ));
            }
            return Ok(self.succeed(&step.name, plan.join("\n")));
        }

        match self.transport.run(&check).await {
            // Desired state already holds; idempotent no-op.
            Ok(output) if output.success() => {
                return Ok(self.succeed(&step.name, output.stdout));
            }
            Ok(_) => {}
            Err(TransportError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => return Ok(self.fail(&step.name, e.to_string())),
        }

        tracing::info!(step = %step.name, "check failed, remediating");
        for remediation in &step.on_missing {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let outcome = self.run_remediation(remediation, facts).await?;
            if outcome.status == StepStatus::Failed {
                let reason = outcome.error.unwrap_or_default();
                return Ok(self.fail(
                    &step.name,
                    format!("remediation '{}' failed: {}", remediation.name, reason),
                ));
            }
        }

        // The chain ran; the check must now pass.
        match self.transport.run(&check).await {
            Ok(output) if output.success() => Ok(self.succeed(&step.name, output.stdout)),
            Ok(_) => Ok(self.fail(
                &step.name,
                "remediation did not achieve desired state".to_string(),
            )),
            Err(TransportError::Cancelled) => Err(EngineError::Cancelled),
            Err(e) => Ok(self.fail(&step.name, e.to_string())),
        }
    }

    /// One remediation command, with its own retry/timeout/sleep and its
    /// own events.
    async fn run_remediation(
        &self,
        step: &RemediationStep,
        facts: &Facts,
    ) -> Result<StepResult, EngineError> {
        let as_command = CommandStep {
            name: step.name.clone(),
            command: step.command.clone(),
            message: None,
            error: step.error.clone(),
            retry: step.retry,
            timeout: step.timeout.clone(),
            sleep: step.sleep.clone(),
            verbose: step.verbose,
        };
        self.run_command_step(&as_command, facts).await
    }

    // === ErrorOnly ===

    fn run_error_only(&self, step: &ErrorOnlyStep) -> StepResult {
        self.emitter.emit(&step.name, StepStatus::Running, "", None);
        self.fail(&step.name, step.error.clone())
    }

    // === Terminal event helpers ===

    fn succeed(&self, step_name: &str, output: impl Into<String>) -> StepResult {
        let output = output.into();
        self.emitter
            .emit(step_name, StepStatus::Success, output.clone(), None);
        StepResult {
            step_name: step_name.to_string(),
            status: StepStatus::Success,
            output,
            error: None,
        }
    }

    fn fail(&self, step_name: &str, error: impl Into<String>) -> StepResult {
        let error = error.into();
        self.emitter
            .emit(step_name, StepStatus::Failed, "", Some(error.clone()));
        StepResult {
            step_name: step_name.to_string(),
            status: StepStatus::Failed,
            output: String::new(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
