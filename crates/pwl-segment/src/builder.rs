// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::classify::classify_boundaries;
use pwl_core::{PwlError, Regime, Segmentation};

/// Initial contents of the index buffer of a fresh segmentation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexInit {
    /// Every boundary at sample 0; the coarse localizer fills them in.
    #[default]
    Zeros,
    /// `idx[i] = i`, for debugging.
    Identity,
}

/// Builds the unresolved segmentation for an ordered, validated regime list.
pub fn build_segmentation(regimes: &[Regime], init: IndexInit) -> Result<Segmentation, PwlError> {
    let classification = classify_boundaries(regimes)?;
    let n_points = classification.points.len();
    let idx = match init {
        IndexInit::Zeros => vec![0; n_points],
        IndexInit::Identity => (0..n_points).collect(),
    };
    let curves = regimes.iter().map(|r| r.kind).collect();
    Segmentation::from_parts(classification.points, curves, classification.peaks, idx)
}
