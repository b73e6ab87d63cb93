// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Topographic-prominence peak finding on 1-D signals.

/// Thresholds a local maximum must meet to count as a peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakCriteria {
    pub min_height: f64,
    pub min_prominence: f64,
}

/// Strict local maxima, flat tops reported at their (left-rounded) midpoint.
/// The first and last samples are never maxima.
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    let n = values.len();
    let mut out = vec![];
    if n < 3 {
        return out;
    }
    let last = n - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                out.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    out
}

/// Height of `values[peak]` above the higher of the two lowest points
/// reachable on either side before meeting a strictly higher sample.
pub fn prominence(values: &[f64], peak: usize) -> f64 {
    let height = values[peak];

    let mut left_min = height;
    for &v in values[..peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = height;
    for &v in &values[peak + 1..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}

/// Positions of all local maxima meeting `criteria`, in increasing order.
pub fn find_peaks(values: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    local_maxima(values)
        .into_iter()
        .filter(|&p| values[p] >= criteria.min_height)
        .filter(|&p| prominence(values, p) >= criteria.min_prominence)
        .collect()
}

/// First qualifying peak, scanning left to right.
pub fn first_peak(values: &[f64], criteria: &PeakCriteria) -> Option<usize> {
    local_maxima(values).into_iter().find(|&p| {
        values[p] >= criteria.min_height && prominence(values, p) >= criteria.min_prominence
    })
}

#[cfg(test)]
mod tests {
    use super::{PeakCriteria, find_peaks, first_peak, local_maxima, prominence};

    const LOOSE: PeakCriteria = PeakCriteria {
        min_height: 0.0,
        min_prominence: 0.0,
    };

    #[test]
    fn local_maxima_skips_edges_and_reports_plateau_midpoints() {
        assert_eq!(local_maxima(&[3.0, 1.0, 2.0, 1.0, 5.0]), vec![2]);
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 1.0, 1.0, 0.0]), vec![2]);
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 2.0, 0.0]), vec![3]);
        assert!(local_maxima(&[0.0, 1.0, 1.0]).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn prominence_uses_higher_of_two_bases() {
        let values = [0.0, 1.0, 0.2, 3.0, 0.5, 2.0, 0.0];
        assert!((prominence(&values, 1) - 0.8).abs() < 1e-12);
        assert!((prominence(&values, 3) - 3.0).abs() < 1e-12);
        assert!((prominence(&values, 5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn thresholds_filter_peaks() {
        let values = [0.0, 0.05, 0.0, 1.0, 0.9, 0.95, 0.0, 0.5, 0.0];
        assert_eq!(find_peaks(&values, &LOOSE), vec![1, 3, 5, 7]);
        let criteria = PeakCriteria {
            min_height: 0.1,
            min_prominence: 0.2,
        };
        assert_eq!(find_peaks(&values, &criteria), vec![3, 7]);
        assert_eq!(first_peak(&values, &criteria), Some(3));
        assert_eq!(first_peak(&[0.0; 8], &criteria), None);
    }
}
