// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::PwlError;
use crate::regime::{BoundaryKind, RegimeKind};
use std::ops::Range;

/// Magnitude stored in `peaks` for the `Start` and `End` sentinels.
pub const SENTINEL_PEAK: f64 = 1.0;

/// Ordered breakpoints of a regime sequence, refined in place by the
/// localization and refinement passes.
///
/// `points`, `peaks` and `idx` have one entry per boundary, `curves` one
/// entry per regime. Regime `k` covers samples `idx[k]..idx[k + 1]`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SegmentationWire"))]
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    points: Vec<BoundaryKind>,
    curves: Vec<RegimeKind>,
    peaks: Vec<f64>,
    idx: Vec<usize>,
}

fn check_non_decreasing(idx: &[usize]) -> Result<(), PwlError> {
    if let Some(pos) = idx.windows(2).position(|w| w[1] < w[0]) {
        return Err(PwlError::invalid_input(format!(
            "segmentation indices must be non-decreasing; idx[{}]={} > idx[{}]={}",
            pos,
            idx[pos],
            pos + 1,
            idx[pos + 1]
        )));
    }
    Ok(())
}

/// Unchecked serialized form; decoding goes through [`Segmentation::from_parts`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SegmentationWire {
    points: Vec<BoundaryKind>,
    curves: Vec<RegimeKind>,
    peaks: Vec<f64>,
    idx: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<SegmentationWire> for Segmentation {
    type Error = PwlError;

    fn try_from(wire: SegmentationWire) -> Result<Self, Self::Error> {
        Self::from_parts(wire.points, wire.curves, wire.peaks, wire.idx)
    }
}

impl Segmentation {
    /// Assembles a segmentation from already-classified parts.
    pub fn from_parts(
        points: Vec<BoundaryKind>,
        curves: Vec<RegimeKind>,
        peaks: Vec<f64>,
        idx: Vec<usize>,
    ) -> Result<Self, PwlError> {
        if curves.is_empty() {
            return Err(PwlError::invalid_input(
                "segmentation requires at least one regime",
            ));
        }
        let n_points = curves.len() + 1;
        for (name, len) in [
            ("points", points.len()),
            ("peaks", peaks.len()),
            ("idx", idx.len()),
        ] {
            if len != n_points {
                return Err(PwlError::invalid_input(format!(
                    "segmentation {name} length must be {n_points} (regimes + 1); got {len}"
                )));
            }
        }
        if points[0] != BoundaryKind::Start || points[n_points - 1] != BoundaryKind::End {
            return Err(PwlError::invalid_input(format!(
                "segmentation must begin with START and end with END; got {} .. {}",
                points[0],
                points[n_points - 1]
            )));
        }
        if let Some(pos) = points[1..n_points - 1]
            .iter()
            .position(|p| !p.is_interior())
        {
            return Err(PwlError::invalid_input(format!(
                "interior boundary {} must be PEAK or VALLEY; got {}",
                pos + 1,
                points[pos + 1]
            )));
        }
        check_non_decreasing(&idx)?;
        Ok(Self {
            points,
            curves,
            peaks,
            idx,
        })
    }

    pub fn points(&self) -> &[BoundaryKind] {
        &self.points
    }

    pub fn curves(&self) -> &[RegimeKind] {
        &self.curves
    }

    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    pub fn idx(&self) -> &[usize] {
        &self.idx
    }

    /// Number of boundaries (regimes + 1).
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn n_regimes(&self) -> usize {
        self.curves.len()
    }

    /// Adds `offset` to every index from `position` through the last one,
    /// preserving the spacing of later boundaries.
    pub fn shift_from(&mut self, position: usize, offset: usize) -> Result<(), PwlError> {
        if position >= self.idx.len() {
            return Err(PwlError::invalid_input(format!(
                "shift position {position} out of range for {} boundaries",
                self.idx.len()
            )));
        }
        for value in &mut self.idx[position..] {
            *value = value.checked_add(offset).ok_or_else(|| {
                PwlError::invalid_input(format!(
                    "index overflow shifting boundary {position} by {offset}"
                ))
            })?;
        }
        Ok(())
    }

    /// Installs a new index buffer and hands back the previous one.
    pub fn replace_indices(&mut self, idx: Vec<usize>) -> Result<Vec<usize>, PwlError> {
        if idx.len() != self.points.len() {
            return Err(PwlError::invalid_input(format!(
                "replacement idx length must be {}; got {}",
                self.points.len(),
                idx.len()
            )));
        }
        check_non_decreasing(&idx)?;
        Ok(std::mem::replace(&mut self.idx, idx))
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.idx
    }

    /// Sample range covered by each regime.
    pub fn regime_ranges(&self) -> Vec<(RegimeKind, Range<usize>)> {
        self.curves
            .iter()
            .zip(self.idx.windows(2))
            .map(|(&kind, w)| (kind, w[0]..w[1]))
            .collect()
    }
}
