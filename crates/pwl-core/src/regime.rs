// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::PwlError;
use std::fmt;

/// Duration assigned to HOLD regimes that do not declare one.
pub const DEFAULT_HOLD_DURATION: f64 = 1.0;

/// Linear-trend phase kind of a mechanical test.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegimeKind {
    /// Flat.
    Hold,
    /// Monotonic increase.
    Stretch,
    /// Monotonic decrease.
    Recover,
}

impl RegimeKind {
    pub const ALL: [RegimeKind; 3] = [Self::Hold, Self::Stretch, Self::Recover];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "HOLD",
            Self::Stretch => "STRETCH",
            Self::Recover => "RECOVER",
        }
    }
}

impl fmt::Display for RegimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a boundary between regimes.
///
/// `Start`/`End` are the sentinels at the two ends of the sequence. Interior
/// boundaries are `Peak` (local maximum of curvature) or `Valley` (local
/// minimum of curvature).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    Start,
    End,
    Peak,
    Valley,
}

impl BoundaryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::End => "END",
            Self::Peak => "PEAK",
            Self::Valley => "VALLEY",
        }
    }

    pub fn is_interior(self) -> bool {
        matches!(self, Self::Peak | Self::Valley)
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared linear-trend phase.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Regime {
    pub kind: RegimeKind,
    pub duration: f64,
    pub delta: f64,
}

impl Regime {
    pub fn hold(duration: f64) -> Self {
        Self {
            kind: RegimeKind::Hold,
            duration,
            delta: 0.0,
        }
    }

    pub fn stretch(delta: f64, duration: f64) -> Self {
        Self {
            kind: RegimeKind::Stretch,
            duration,
            delta,
        }
    }

    pub fn recover(delta: f64, duration: f64) -> Self {
        Self {
            kind: RegimeKind::Recover,
            duration,
            delta,
        }
    }

    /// Signed change per unit time: zero for HOLD, `|delta| / duration` for
    /// STRETCH and `-|delta| / duration` for RECOVER.
    pub fn rate(&self) -> f64 {
        match self.kind {
            RegimeKind::Hold => 0.0,
            RegimeKind::Stretch => self.delta.abs() / self.duration,
            RegimeKind::Recover => -self.delta.abs() / self.duration,
        }
    }

    /// Checks the invariants the engine assumes. The engine itself never
    /// calls this; it is a precondition enforced by whoever builds regimes.
    pub fn validate(&self) -> Result<(), PwlError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(PwlError::validation(format!(
                "{} duration must be finite and > 0; got {}",
                self.kind, self.duration
            )));
        }
        if !self.delta.is_finite() {
            return Err(PwlError::validation(format!(
                "{} delta must be finite; got {}",
                self.kind, self.delta
            )));
        }
        Ok(())
    }
}

impl Default for Regime {
    fn default() -> Self {
        Self::hold(DEFAULT_HOLD_DURATION)
    }
}
