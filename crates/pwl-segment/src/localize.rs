// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::peaks::{PeakCriteria, first_peak};
use pwl_core::{BoundaryKind, ExecutionContext, PreppedData, PwlError, Segmentation};
use tracing::debug;

const DEFAULT_PROMINENCE: f64 = 0.2;
const DEFAULT_MIN_HEIGHT: f64 = 0.1;

/// Configuration for [`CoarseLocalizer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LocalizeConfig {
    /// Minimum topographic prominence of a curvature extremum.
    pub prominence: f64,
    /// Minimum height of a curvature extremum.
    pub min_height: f64,
    /// Divide the curvature section by the boundary's expected magnitude
    /// before searching, so that gentle transitions clear the thresholds.
    pub normalize_by_peak: bool,
}

impl Default for LocalizeConfig {
    fn default() -> Self {
        Self {
            prominence: DEFAULT_PROMINENCE,
            min_height: DEFAULT_MIN_HEIGHT,
            normalize_by_peak: false,
        }
    }
}

impl LocalizeConfig {
    fn validate(&self) -> Result<(), PwlError> {
        if !self.prominence.is_finite() || self.prominence < 0.0 {
            return Err(PwlError::invalid_input(format!(
                "LocalizeConfig.prominence must be finite and >= 0; got {}",
                self.prominence
            )));
        }
        if !self.min_height.is_finite() || self.min_height < 0.0 {
            return Err(PwlError::invalid_input(format!(
                "LocalizeConfig.min_height must be finite and >= 0; got {}",
                self.min_height
            )));
        }
        Ok(())
    }

    fn criteria(&self) -> PeakCriteria {
        PeakCriteria {
            min_height: self.min_height,
            min_prominence: self.prominence,
        }
    }
}

/// First-pass search for each boundary's curvature extremum.
///
/// Boundaries are resolved relative to the previous one, so callers must
/// visit them in increasing position order.
#[derive(Debug)]
pub struct CoarseLocalizer {
    config: LocalizeConfig,
}

impl CoarseLocalizer {
    pub fn new(config: LocalizeConfig) -> Result<Self, PwlError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LocalizeConfig {
        &self.config
    }

    /// Distance in samples from `idx[position - 1]` to the first curvature
    /// extremum matching `points[position]`.
    pub fn find_offset(
        &self,
        data: &PreppedData,
        segmentation: &Segmentation,
        position: usize,
    ) -> Result<usize, PwlError> {
        let n_points = segmentation.n_points();
        if position == 0 || position >= n_points {
            return Err(PwlError::invalid_input(format!(
                "localization position must be in 1..{n_points}; got {position}"
            )));
        }
        let start = segmentation.idx()[position - 1];
        if start >= data.n() {
            return Err(PwlError::invalid_input(format!(
                "previous boundary idx[{}]={start} is outside the signal of length {}",
                position - 1,
                data.n()
            )));
        }

        let kind = segmentation.points()[position];
        let sign = match kind {
            BoundaryKind::Start => return Ok(0),
            BoundaryKind::End => return Ok(data.n() - 1 - start),
            BoundaryKind::Peak => 1.0,
            BoundaryKind::Valley => -1.0,
        };

        let expected = segmentation.peaks()[position];
        let scale = if self.config.normalize_by_peak && expected > 0.0 {
            expected
        } else {
            1.0
        };
        let section: Vec<f64> = data.ddy()[start..]
            .iter()
            .map(|v| (sign * v / scale).max(0.0))
            .collect();

        first_peak(&section, &self.config.criteria())
            .ok_or_else(|| PwlError::localization(position, kind))
    }

    /// Finds the offset for `position` and shifts `idx[position..]` by it.
    pub fn localize(
        &self,
        data: &PreppedData,
        mut segmentation: Segmentation,
        position: usize,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Segmentation, PwlError> {
        let offset = self.find_offset(data, &segmentation, position)?;
        segmentation.shift_from(position, offset)?;
        debug!(
            position,
            kind = %segmentation.points()[position],
            offset,
            index = segmentation.idx()[position],
            "localized boundary"
        );
        ctx.record_scalar("localize.offset", offset as f64);
        Ok(segmentation)
    }

    /// Localizes each listed position in increasing order. Duplicates and
    /// positions outside `1..points.len()` are skipped.
    pub fn localize_all(
        &self,
        data: &PreppedData,
        mut segmentation: Segmentation,
        positions: &[usize],
        ctx: &ExecutionContext<'_>,
    ) -> Result<Segmentation, PwlError> {
        let mut ordered: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p > 0 && p < segmentation.n_points())
            .collect();
        ordered.sort_unstable();
        ordered.dedup();
        for position in ordered {
            segmentation = self.localize(data, segmentation, position, ctx)?;
        }
        Ok(segmentation)
    }
}
