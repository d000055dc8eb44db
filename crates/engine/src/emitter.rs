// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event emission

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sink_core::{Clock, ExecutionContext, ExecutionEvent, RunId, StepStatus};

/// Receives every event of a run, synchronously on the executing task.
/// The sink must not block indefinitely.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ExecutionEvent);
}

impl<F> EventSink for F
where
    F: Fn(&ExecutionEvent) + Send + Sync,
{
    fn emit(&self, event: &ExecutionEvent) {
        self(event)
    }
}

/// Stamps events with the run id, context, and a monotonically
/// non-decreasing timestamp, then hands them to the sink.
pub struct EventEmitter {
    run_id: RunId,
    context: ExecutionContext,
    sink: Box<dyn EventSink>,
    clock: Box<dyn Clock>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl EventEmitter {
    pub fn new(
        run_id: RunId,
        context: ExecutionContext,
        sink: Box<dyn EventSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            run_id,
            context,
            sink,
            clock,
            last_timestamp: Mutex::new(None),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Emit one event. Timestamps never decrease within a run even if the
    /// wall clock steps backwards.
    pub fn emit(
        &self,
        step_name: &str,
        status: StepStatus,
        output: impl Into<String>,
        error: Option<String>,
    ) {
        let timestamp = {
            let mut last = self.last_timestamp.lock();
            let mut now = self.clock.now();
            if let Some(prev) = *last {
                if now < prev {
                    now = prev;
                }
            }
            *last = Some(now);
            now
        };

        let event = ExecutionEvent {
            timestamp,
            run_id: self.run_id,
            step_name: step_name.to_string(),
            status,
            output: output.into(),
            error,
            context: self.context.clone(),
        };

        tracing::debug!(step = %event.step_name, status = ?event.status, "event");
        self.sink.emit(&event);
    }
}

/// Sink that stores every event for later assertions.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: std::sync::Arc<Mutex<Vec<ExecutionEvent>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().clone()
    }

    /// Statuses observed for one step, in emission order.
    pub fn statuses_for(&self, step_name: &str) -> Vec<StepStatus> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.step_name == step_name)
            .map(|e| e.status)
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl EventSink for CollectingSink {
    fn emit(&self, event: &ExecutionEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
