// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::observability::{ProgressSink, RefineProgress, TelemetrySink};

/// Optional hooks passed through every engine pass.
///
/// The engine is synchronous and single-threaded; the context only carries
/// observers and never influences results.
#[derive(Clone, Copy, Default)]
pub struct ExecutionContext<'a> {
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an optional progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets an optional telemetry sink.
    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Forwards a refinement progress event to the sink, if configured.
    pub fn report_progress(&self, progress: &RefineProgress) {
        if let Some(sink) = self.progress {
            sink.on_iteration(progress);
        }
    }

    /// Emits a scalar telemetry value to the sink, if configured. Non-finite
    /// values are dropped.
    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if !value.is_finite() {
            return;
        }
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("progress", &self.progress.is_some())
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}
