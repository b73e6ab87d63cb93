// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Regime boundary classification, curvature-based coarse localization and
//! coordinate-descent breakpoint refinement.

pub mod builder;
pub mod classify;
pub mod localize;
pub mod peaks;
pub mod pipeline;
pub mod refine;

pub use builder::{IndexInit, build_segmentation};
pub use classify::{
    BoundaryClassification, BoundaryEstimate, boundary_kind, classify, classify_boundaries,
};
pub use localize::{CoarseLocalizer, LocalizeConfig};
pub use peaks::{PeakCriteria, find_peaks, first_peak};
pub use pipeline::{
    BoundaryGroup, GroupObserver, PipelineConfig, SegmentationOutcome, SegmentationPipeline,
    segment_protocol,
};
pub use refine::{
    RefineConfig, RefineReport, Refiner, optimize_breakpoint, reconstruction_error, sweep,
};
