// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pwl_core::{BoundaryKind, InvalidPair, PwlError, Regime, RegimeKind, SENTINEL_PEAK};

/// Curvature extremum expected at the boundary between two regime kinds.
///
/// Returns `None` for same-kind neighbours, whose shared boundary is
/// ambiguous.
pub fn boundary_kind(left: RegimeKind, right: RegimeKind) -> Option<BoundaryKind> {
    use RegimeKind::{Hold, Recover, Stretch};
    match (left, right) {
        (Hold, Stretch) => Some(BoundaryKind::Peak),
        (Hold, Recover) => Some(BoundaryKind::Valley),
        (Stretch, Hold) => Some(BoundaryKind::Valley),
        (Stretch, Recover) => Some(BoundaryKind::Valley),
        (Recover, Hold) => Some(BoundaryKind::Peak),
        (Recover, Stretch) => Some(BoundaryKind::Peak),
        (Hold, Hold) | (Stretch, Stretch) | (Recover, Recover) => None,
    }
}

/// Classification of one interior boundary.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryEstimate {
    pub kind: BoundaryKind,
    /// `|left.rate| + |right.rate|`. Always non-negative; the direction of
    /// the extremum is carried by `kind`, not by the sign.
    pub magnitude: f64,
}

fn estimate(left: &Regime, right: &Regime) -> Option<BoundaryEstimate> {
    boundary_kind(left.kind, right.kind).map(|kind| BoundaryEstimate {
        kind,
        magnitude: left.rate().abs() + right.rate().abs(),
    })
}

/// Classifies the boundary between an ordered pair of regimes.
pub fn classify(left: &Regime, right: &Regime) -> Result<BoundaryEstimate, PwlError> {
    estimate(left, right).ok_or_else(|| {
        PwlError::classification(vec![InvalidPair {
            position: 1,
            left: left.kind,
            right: right.kind,
        }])
    })
}

/// Boundary kinds and normalized magnitudes for a whole regime sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryClassification {
    /// `START`, one `PEAK`/`VALLEY` per interior boundary, `END`.
    pub points: Vec<BoundaryKind>,
    /// Interior magnitudes divided by their maximum, with the sentinels
    /// pinned at [`SENTINEL_PEAK`].
    pub peaks: Vec<f64>,
}

/// Classifies every interior boundary of `regimes`.
///
/// Every invalid adjacent pair is collected before failing, so the error
/// names all of them at once.
pub fn classify_boundaries(regimes: &[Regime]) -> Result<BoundaryClassification, PwlError> {
    if regimes.is_empty() {
        return Err(PwlError::invalid_input(
            "cannot classify boundaries of an empty regime list",
        ));
    }

    let mut estimates = Vec::with_capacity(regimes.len() - 1);
    let mut invalid = vec![];
    for (offset, pair) in regimes.windows(2).enumerate() {
        match estimate(&pair[0], &pair[1]) {
            Some(est) => estimates.push(est),
            None => invalid.push(InvalidPair {
                position: offset + 1,
                left: pair[0].kind,
                right: pair[1].kind,
            }),
        }
    }
    if !invalid.is_empty() {
        return Err(PwlError::classification(invalid));
    }

    let max_magnitude = estimates
        .iter()
        .fold(0.0_f64, |acc, est| acc.max(est.magnitude));
    let scale = if max_magnitude > 0.0 {
        max_magnitude
    } else {
        1.0
    };

    let mut points = Vec::with_capacity(regimes.len() + 1);
    let mut peaks = Vec::with_capacity(regimes.len() + 1);
    points.push(BoundaryKind::Start);
    peaks.push(SENTINEL_PEAK);
    for est in &estimates {
        points.push(est.kind);
        peaks.push(est.magnitude / scale);
    }
    points.push(BoundaryKind::End);
    peaks.push(SENTINEL_PEAK);

    Ok(BoundaryClassification { points, peaks })
}
