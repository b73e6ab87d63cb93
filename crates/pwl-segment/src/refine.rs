// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pwl_core::{ExecutionContext, PwlError, RefineProgress};
use tracing::{debug, info};

const DEFAULT_WINDOW: usize = 50;
const DEFAULT_MAX_ITER: usize = 100;
const DEFAULT_STRIDE: usize = 25;
const MINIMUM_REFINABLE_POINTS: usize = 3;

/// Configuration for [`Refiner`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefineConfig {
    /// Starting half-window radius; shrinks by one per sweep, never below 1.
    pub window: usize,
    /// Maximum number of full sweeps.
    pub max_iter: usize,
    /// Sub-sampling stride of the reconstruction objective.
    pub stride: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_iter: DEFAULT_MAX_ITER,
            stride: DEFAULT_STRIDE,
        }
    }
}

impl RefineConfig {
    fn validate(&self) -> Result<(), PwlError> {
        if self.window == 0 {
            return Err(PwlError::invalid_input("RefineConfig.window must be >= 1"));
        }
        if self.stride == 0 {
            return Err(PwlError::invalid_input("RefineConfig.stride must be >= 1"));
        }
        Ok(())
    }
}

/// Summary of one refinement run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RefineReport {
    /// Number of sweeps performed.
    pub iterations: usize,
    /// True when the last sweep moved nothing.
    pub converged: bool,
    /// Total absolute movement per sweep.
    pub movements: Vec<usize>,
    /// Objective of the input indices with the end pinned to `n - 1`.
    pub initial_objective: f64,
    /// Objective of the output indices with the end pinned to `n - 1`.
    pub final_objective: f64,
}

/// Squared error between `x` and its piecewise-linear interpolation through
/// the knots `(k, x[k])` for `k` in `idx`, both sampled at `0, stride, ...`.
///
/// `idx` must be non-decreasing. Knots at or past the end read the last
/// sample. Outside the knot range the interpolant is held constant.
pub fn reconstruction_error(x: &[f64], idx: &[usize], stride: usize) -> f64 {
    let n = x.len();
    if n == 0 || idx.is_empty() {
        return 0.0;
    }
    let stride = stride.max(1);
    let value_at = |k: usize| x[k.min(n - 1)];
    let first = idx[0];
    let last = idx[idx.len() - 1];

    let mut j = 0;
    let mut total = 0.0;
    for t in (0..n).step_by(stride) {
        let fit = if t <= first {
            value_at(first)
        } else if t >= last {
            value_at(last)
        } else {
            while j + 1 < idx.len() && idx[j + 1] <= t {
                j += 1;
            }
            // idx[j] <= t < idx[j + 1]
            let (x0, x1) = (idx[j], idx[j + 1]);
            let (y0, y1) = (value_at(x0), value_at(x1));
            y0 + (y1 - y0) * (t - x0) as f64 / (x1 - x0) as f64
        };
        let residual = x[t] - fit;
        total += residual * residual;
    }
    total
}

/// Best position for breakpoint `position` within `window` samples of its
/// current value, holding all others fixed. Ties go to the lowest index.
///
/// Candidates never cross a neighbouring breakpoint or leave `[0, n)`.
pub fn optimize_breakpoint(
    x: &[f64],
    idx: &mut [usize],
    position: usize,
    window: usize,
    stride: usize,
) -> usize {
    let current = idx[position];
    let lo = current.saturating_sub(window).max(idx[position - 1]);
    let hi = current
        .saturating_add(window)
        .min(idx[position + 1])
        .min(x.len().saturating_sub(1));

    let mut best = current;
    let mut best_err = f64::INFINITY;
    for candidate in lo..=hi {
        idx[position] = candidate;
        let err = reconstruction_error(x, idx, stride);
        if err < best_err {
            best_err = err;
            best = candidate;
        }
    }
    idx[position] = best;
    best
}

/// One left-to-right pass over every interior breakpoint.
pub fn sweep(x: &[f64], idx: &mut [usize], window: usize, stride: usize) {
    if idx.len() < MINIMUM_REFINABLE_POINTS {
        return;
    }
    for position in 1..idx.len() - 1 {
        optimize_breakpoint(x, idx, position, window, stride);
    }
}

fn total_movement(new: &[usize], old: &[usize]) -> usize {
    new.iter().zip(old).map(|(a, b)| a.abs_diff(*b)).sum()
}

/// Coordinate-descent refinement of breakpoint indices against the raw
/// signal.
#[derive(Debug)]
pub struct Refiner {
    config: RefineConfig,
}

impl Refiner {
    pub fn new(config: RefineConfig) -> Result<Self, PwlError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// Repeats [`sweep`] with a shrinking window until a sweep changes
    /// nothing or `max_iter` sweeps have run.
    ///
    /// The last index is pinned to `x.len() - 1` while refining and set to
    /// `x.len()` on return (exclusive end). Index buffers with fewer than
    /// three entries are returned unchanged.
    ///
    /// # Panics
    ///
    /// `x` must be non-empty and `idx` non-decreasing with every entry but
    /// the last below `x.len()`. Violating this is a caller bug and panics on
    /// out-of-bounds access.
    pub fn refine(
        &self,
        x: &[f64],
        idx: Vec<usize>,
        ctx: &ExecutionContext<'_>,
    ) -> (Vec<usize>, RefineReport) {
        let stride = self.config.stride;
        if idx.len() < MINIMUM_REFINABLE_POINTS {
            let objective = reconstruction_error(x, &idx, stride);
            return (
                idx,
                RefineReport {
                    iterations: 0,
                    converged: true,
                    movements: vec![],
                    initial_objective: objective,
                    final_objective: objective,
                },
            );
        }

        let n = x.len();
        let mut current = idx;
        let last = current.len() - 1;
        current[last] = n - 1;
        let initial_objective = reconstruction_error(x, &current, stride);

        let mut window = self.config.window;
        let mut movements = Vec::new();
        let mut converged = false;
        for iteration in 0..self.config.max_iter {
            let mut next = current.clone();
            sweep(x, &mut next, window, stride);
            let movement = total_movement(&next, &current);
            let objective = reconstruction_error(x, &next, stride);
            info!(iteration, movement, window, objective, "refine sweep");
            ctx.report_progress(&RefineProgress {
                iteration,
                movement,
                window,
                objective,
            });
            movements.push(movement);
            if movement == 0 {
                converged = true;
                break;
            }
            debug!(idx = ?next, "refined indices");
            current = next;
            window = window.saturating_sub(1).max(1);
        }

        let final_objective = reconstruction_error(x, &current, stride);
        ctx.record_scalar("refine.final_objective", final_objective);
        current[last] = n;
        (
            current,
            RefineReport {
                iterations: movements.len(),
                converged,
                movements,
                initial_objective,
                final_objective,
            },
        )
    }
}
