// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types for piecewise-linear regime segmentation.

pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod prepped;
pub mod regime;
pub mod segmentation;

pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics};
pub use error::{InvalidPair, PwlError};
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, RefineProgress, TelemetrySink};
pub use prepped::PreppedData;
pub use regime::{BoundaryKind, DEFAULT_HOLD_DURATION, Regime, RegimeKind};
pub use segmentation::{SENTINEL_PEAK, Segmentation};
