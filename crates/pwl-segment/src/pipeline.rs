// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::builder::{IndexInit, build_segmentation};
use crate::localize::{CoarseLocalizer, LocalizeConfig};
use crate::refine::{RefineConfig, RefineReport, Refiner};
use pwl_core::{Diagnostics, ExecutionContext, PreppedData, PwlError, Regime, Segmentation};
use std::borrow::Cow;
use tracing::info;

const ALGORITHM_NAME: &str = "curvature_localize+coordinate_descent";

/// Named set of boundary positions localized together, e.g. one protocol
/// phase.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryGroup {
    pub name: String,
    pub positions: Vec<usize>,
}

/// Called after each group has been localized.
pub trait GroupObserver {
    fn on_group(&self, name: &str, segmentation: &Segmentation);
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineConfig {
    pub init: IndexInit,
    pub localize: LocalizeConfig,
    pub refine: RefineConfig,
}

/// Result of [`SegmentationPipeline::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationOutcome {
    pub segmentation: Segmentation,
    pub refine: RefineReport,
    pub diagnostics: Diagnostics,
}

/// Builds, localizes and refines a segmentation in one call.
#[derive(Debug)]
pub struct SegmentationPipeline {
    config: PipelineConfig,
    localizer: CoarseLocalizer,
    refiner: Refiner,
}

impl SegmentationPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PwlError> {
        let localizer = CoarseLocalizer::new(config.localize.clone())?;
        let refiner = Refiner::new(config.refine.clone())?;
        Ok(Self {
            config,
            localizer,
            refiner,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Every boundary of `regimes` in a single group.
    pub fn single_group(regimes: &[Regime]) -> Vec<BoundaryGroup> {
        vec![BoundaryGroup {
            name: "all".to_string(),
            positions: (1..=regimes.len()).collect(),
        }]
    }

    /// Runs the groups one after another, each to completion, then refines
    /// every breakpoint against `data.x()`.
    pub fn run(
        &self,
        data: &PreppedData,
        regimes: &[Regime],
        groups: &[BoundaryGroup],
        observer: Option<&dyn GroupObserver>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<SegmentationOutcome, PwlError> {
        let mut segmentation = build_segmentation(regimes, self.config.init)?;
        let mut diagnostics = Diagnostics {
            n: data.n(),
            n_points: segmentation.n_points(),
            algorithm: Cow::Borrowed(ALGORITHM_NAME),
            ..Diagnostics::default()
        };

        for group in groups {
            info!(group = %group.name, boundaries = group.positions.len(), "localizing group");
            segmentation =
                self.localizer
                    .localize_all(data, segmentation, &group.positions, ctx)?;
            let mut visited: Vec<usize> = group
                .positions
                .iter()
                .copied()
                .filter(|&p| p > 0 && p < segmentation.n_points())
                .collect();
            visited.sort_unstable();
            visited.dedup();
            diagnostics.notes.push(format!(
                "group {} localized {} boundaries",
                group.name,
                visited.len()
            ));
            diagnostics.localized_positions.extend(visited);
            if let Some(observer) = observer {
                observer.on_group(&group.name, &segmentation);
            }
        }

        let idx = segmentation.idx().to_vec();
        let interior = &idx[..idx.len() - 1];
        if let Some(pos) = interior.iter().position(|&i| i >= data.n()) {
            return Err(PwlError::invalid_input(format!(
                "boundary {pos} sits at sample {} past the end of a signal of length {}; \
                 localize groups in increasing position order",
                idx[pos],
                data.n()
            )));
        }
        let (refined, report) = self.refiner.refine(data.x(), idx, ctx);
        segmentation.replace_indices(refined)?;

        diagnostics.refine_iterations = report.iterations;
        diagnostics.refine_converged = report.converged;
        diagnostics.initial_objective = Some(report.initial_objective);
        diagnostics.final_objective = Some(report.final_objective);
        if !report.converged {
            diagnostics.warnings.push(format!(
                "refinement stopped after max_iter={} sweeps without converging",
                self.config.refine.max_iter
            ));
        }
        #[cfg(feature = "serde")]
        {
            match serde_json::to_value(&self.config) {
                Ok(params) => diagnostics.params_json = Some(params),
                Err(err) => diagnostics
                    .warnings
                    .push(format!("pipeline parameters not recorded: {err}")),
            }
        }

        Ok(SegmentationOutcome {
            segmentation,
            refine: report,
            diagnostics,
        })
    }
}

/// One-shot [`SegmentationPipeline::run`] without a group observer.
pub fn segment_protocol(
    data: &PreppedData,
    regimes: &[Regime],
    groups: &[BoundaryGroup],
    config: &PipelineConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<SegmentationOutcome, PwlError> {
    SegmentationPipeline::new(config.clone())?.run(data, regimes, groups, None, ctx)
}
