// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing

use crate::{CommandOutput, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type Handler = Box<dyn FnMut(&str) -> Option<CommandOutput> + Send>;

struct FakeState {
    calls: Vec<String>,
    responses: HashMap<String, VecDeque<CommandOutput>>,
    handler: Option<Handler>,
    default_response: CommandOutput,
    exported: Vec<(String, String)>,
    shell: Option<String>,
}

/// Scripted transport that records every call.
///
/// Responses are matched by exact command string; queued responses for the
/// same command are consumed in order, the last one repeating. A handler
/// closure can intercept any command first. Unmatched commands get the
/// default response (success, empty output).
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                responses: HashMap::new(),
                handler: None,
                default_response: CommandOutput::ok(""),
                exported: Vec::new(),
                shell: None,
            })),
        }
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for an exact command string.
    pub fn respond(&self, command: impl Into<String>, output: CommandOutput) {
        self.inner
            .lock()
            .responses
            .entry(command.into())
            .or_default()
            .push_back(output);
    }

    /// Queue a success response with the given stdout.
    pub fn respond_ok(&self, command: impl Into<String>, stdout: impl Into<String>) {
        self.respond(command, CommandOutput::ok(stdout));
    }

    /// Queue a failure response with the given exit code and stderr.
    pub fn respond_err(
        &self,
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) {
        self.respond(command, CommandOutput::err(exit_code, stderr));
    }

    /// Change the response for commands nothing else matches.
    pub fn set_default_response(&self, output: CommandOutput) {
        self.inner.lock().default_response = output;
    }

    /// Intercept commands with a closure; returning `None` falls through
    /// to queued responses.
    pub fn set_handler(
        &self,
        handler: impl FnMut(&str) -> Option<CommandOutput> + Send + 'static,
    ) {
        self.inner.lock().handler = Some(Box::new(handler));
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    /// How many times the given command was run.
    pub fn call_count(&self, command: &str) -> usize {
        self.inner.lock().calls.iter().filter(|c| *c == command).count()
    }

    /// Variables exported through [`Transport::export_var`], in order.
    pub fn exported(&self) -> Vec<(String, String)> {
        self.inner.lock().exported.clone()
    }

    /// The last shell override set through [`Transport::set_shell`].
    pub fn shell(&self) -> Option<String> {
        self.inner.lock().shell.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn run(&self, command: &str) -> Result<CommandOutput, TransportError> {
        let mut state = self.inner.lock();
        state.calls.push(command.to_string());

        if let Some(ref mut handler) = state.handler {
            if let Some(output) = handler(command) {
                return Ok(output);
            }
        }

        if let Some(queue) = state.responses.get_mut(command) {
            if queue.len() > 1 {
                if let Some(output) = queue.pop_front() {
                    return Ok(output);
                }
            }
            if let Some(output) = queue.front() {
                return Ok(output.clone());
            }
        }

        Ok(state.default_response.clone())
    }

    fn label(&self) -> String {
        "fake".to_string()
    }

    fn export_var(&self, name: &str, value: &str) {
        self.inner
            .lock()
            .exported
            .push((name.to_string(), value.to_string()));
    }

    fn set_shell(&self, shell: Option<String>) {
        self.inner.lock().shell = shell;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
