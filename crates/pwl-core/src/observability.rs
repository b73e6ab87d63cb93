// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Progress event emitted after each refinement sweep.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefineProgress {
    /// Zero-based sweep number.
    pub iteration: usize,
    /// Sum of `|new - old|` over all breakpoints for this sweep.
    pub movement: usize,
    /// Half-window radius used for this sweep.
    pub window: usize,
    /// Reconstruction objective after this sweep.
    pub objective: f64,
}

/// Receives advisory progress events. Implementations must not panic.
pub trait ProgressSink {
    fn on_iteration(&self, progress: &RefineProgress);
}

/// Receives named scalar measurements.
pub trait TelemetrySink {
    fn record_scalar(&self, key: &'static str, value: f64);
}
