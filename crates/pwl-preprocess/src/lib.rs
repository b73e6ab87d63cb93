// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Signal preparation: Gaussian smoothing and normalized derivatives.

use pwl_core::{PreppedData, PwlError};

const DEFAULT_SIGMA: f64 = 20.0;
const DEFAULT_TRUNCATE: f64 = 4.0;
/// Largest kernel half-width accepted, in samples.
pub const MAX_KERNEL_RADIUS: usize = 1 << 20;

/// Configuration for [`prep_data`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PrepConfig {
    /// Standard deviation of the Gaussian kernel, in samples.
    pub sigma: f64,
    /// Kernel radius in units of `sigma`.
    pub truncate: f64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            truncate: DEFAULT_TRUNCATE,
        }
    }
}

impl PrepConfig {
    fn validate(&self) -> Result<(), PwlError> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(PwlError::invalid_input(format!(
                "PrepConfig.sigma must be finite and > 0; got {}",
                self.sigma
            )));
        }
        if !self.truncate.is_finite() || self.truncate < 0.0 {
            return Err(PwlError::invalid_input(format!(
                "PrepConfig.truncate must be finite and >= 0; got {}",
                self.truncate
            )));
        }
        let reach = self.truncate * self.sigma;
        if reach > MAX_KERNEL_RADIUS as f64 {
            return Err(PwlError::invalid_input(format!(
                "PrepConfig.truncate * sigma must be <= {MAX_KERNEL_RADIUS} samples; got {reach}"
            )));
        }
        Ok(())
    }

    fn radius(&self) -> usize {
        (self.truncate * self.sigma + 0.5) as usize
    }
}

/// Half-sample symmetric reflection: `d c b a | a b c d | d c b a`.
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n { m } else { 2 * n - 1 - m }
}

fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|k| {
            let x = k as f64 - radius as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Gaussian smoothing with reflected boundaries.
pub fn gaussian_smooth(x: &[f64], config: &PrepConfig) -> Result<Vec<f64>, PwlError> {
    config.validate()?;
    let n = x.len();
    if n == 0 {
        return Ok(vec![]);
    }
    let radius = config.radius();
    let kernel = gaussian_kernel(config.sigma, radius);
    let r = radius as isize;

    let out = (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let src = i as isize + k as isize - r;
                    w * x[reflect_index(src, n)]
                })
                .sum()
        })
        .collect();
    Ok(out)
}

/// Discrete gradient: central differences inside, one-sided differences at
/// the two ends. A single sample has zero gradient.
pub fn gradient(y: &[f64]) -> Vec<f64> {
    let n = y.len();
    match n {
        0 => vec![],
        1 => vec![0.0],
        _ => {
            let mut out = Vec::with_capacity(n);
            out.push(y[1] - y[0]);
            for i in 1..n - 1 {
                out.push((y[i + 1] - y[i - 1]) / 2.0);
            }
            out.push(y[n - 1] - y[n - 2]);
            out
        }
    }
}

/// Scales `values` in place so that the largest magnitude becomes 1.
/// Identically-zero input is left untouched.
pub fn normalize_by_max_abs(values: &mut [f64]) {
    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if max_abs > 0.0 {
        for v in values.iter_mut() {
            *v /= max_abs;
        }
    }
}

/// Smooths `x` and derives normalized first and second derivatives.
pub fn prep_data(x: Vec<f64>, config: &PrepConfig) -> Result<PreppedData, PwlError> {
    config.validate()?;
    if x.is_empty() {
        return Err(PwlError::invalid_input("prep_data requires n >= 1"));
    }
    if let Some(pos) = x.iter().position(|v| !v.is_finite()) {
        return Err(PwlError::numerical_issue(format!(
            "raw sample {pos} is non-finite: {}",
            x[pos]
        )));
    }

    let y = gaussian_smooth(&x, config)?;
    let mut dy = gradient(&y);
    let mut ddy = gradient(&dy);
    normalize_by_max_abs(&mut dy);
    normalize_by_max_abs(&mut ddy);
    PreppedData::new(x, y, dy, ddy)
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_KERNEL_RADIUS, PrepConfig, gaussian_smooth, gradient, normalize_by_max_abs, prep_data,
        reflect_index,
    };
    use proptest::prelude::*;
    use pwl_core::PwlError;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn reflect_index_mirrors_half_sample() {
        let n = 4;
        let mapped: Vec<usize> = (-5..10).map(|i| reflect_index(i, n)).collect();
        assert_eq!(mapped, vec![3, 3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0, 0, 1]);
    }

    #[test]
    fn gradient_matches_central_and_edge_differences() {
        let g = gradient(&[1.0, 2.0, 4.0, 7.0, 11.0]);
        assert_eq!(g, vec![1.0, 1.5, 2.5, 3.5, 4.0]);
        assert_eq!(gradient(&[5.0]), vec![0.0]);
        assert!(gradient(&[]).is_empty());
    }

    #[test]
    fn normalize_scales_largest_magnitude_to_one() {
        let mut values = vec![0.5, -2.0, 1.0];
        normalize_by_max_abs(&mut values);
        assert_eq!(values, vec![0.25, -1.0, 0.5]);

        let mut zeros = vec![0.0, 0.0];
        normalize_by_max_abs(&mut zeros);
        assert_eq!(zeros, vec![0.0, 0.0]);
    }

    #[test]
    fn smoothing_preserves_constant_signal() {
        let config = PrepConfig {
            sigma: 3.0,
            truncate: 4.0,
        };
        let smoothed = gaussian_smooth(&[2.5; 16], &config).expect("smoothing should succeed");
        for v in smoothed {
            assert_close(v, 2.5);
        }
    }

    #[test]
    fn smoothing_preserves_interior_of_linear_ramp() {
        let config = PrepConfig {
            sigma: 2.0,
            truncate: 4.0,
        };
        let ramp: Vec<f64> = (0..60).map(|i| 0.5 * i as f64).collect();
        let smoothed = gaussian_smooth(&ramp, &config).expect("smoothing should succeed");
        for i in 10..50 {
            assert!((smoothed[i] - ramp[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn prep_data_normalizes_both_derivatives() {
        let x: Vec<f64> = (0..200)
            .map(|i| if i < 100 { i as f64 } else { 100.0 })
            .collect();
        let config = PrepConfig {
            sigma: 5.0,
            truncate: 4.0,
        };
        let data = prep_data(x, &config).expect("prep should succeed");
        let max_dy = data.dy().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let max_ddy = data.ddy().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert_close(max_dy, 1.0);
        assert_close(max_ddy, 1.0);

        // Ramp-to-flat corner is the most negative curvature in the interior.
        let (argmin, _) = data.ddy()[20..180]
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(bi, bv), (i, &v)| {
                if v < bv { (i, v) } else { (bi, bv) }
            });
        assert!((argmin + 20).abs_diff(100) <= 1);
    }

    #[test]
    fn prep_data_rejects_bad_input() {
        let config = PrepConfig::default();
        assert!(matches!(
            prep_data(vec![], &config),
            Err(PwlError::InvalidInput(_))
        ));
        assert!(matches!(
            prep_data(vec![0.0, f64::NAN], &config),
            Err(PwlError::NumericalIssue(_))
        ));
        let bad = PrepConfig {
            sigma: 0.0,
            truncate: 4.0,
        };
        assert!(matches!(
            prep_data(vec![0.0, 1.0], &bad),
            Err(PwlError::InvalidInput(_))
        ));
    }

    #[test]
    fn oversized_kernel_is_rejected_before_allocating() {
        for sigma in [1e300, 1e9, MAX_KERNEL_RADIUS as f64] {
            let config = PrepConfig {
                sigma,
                truncate: 4.0,
            };
            assert!(matches!(
                prep_data(vec![0.0, 1.0, 2.0], &config),
                Err(PwlError::InvalidInput(msg)) if msg.contains("truncate * sigma")
            ));
        }
        let widest = PrepConfig {
            sigma: MAX_KERNEL_RADIUS as f64,
            truncate: 1.0,
        };
        assert!(widest.validate().is_ok());
        assert_eq!(widest.radius(), MAX_KERNEL_RADIUS);
    }

    proptest! {
        #[test]
        fn smoothing_stays_within_input_range(
            values in prop::collection::vec(-100.0f64..100.0, 1..64),
            sigma in 0.5f64..8.0,
        ) {
            let config = PrepConfig { sigma, truncate: 4.0 };
            let smoothed = gaussian_smooth(&values, &config).expect("smoothing should succeed");
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(smoothed.len(), values.len());
            for v in smoothed {
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }
}
