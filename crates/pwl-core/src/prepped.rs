// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::PwlError;

/// Raw signal plus its smoothed version and normalized derivatives.
///
/// Produced once by a preparation step and read-only to the engine. `dy` and
/// `ddy` are each scaled so that their own maximum magnitude is 1.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PreppedDataWire"))]
#[derive(Clone, Debug, PartialEq)]
pub struct PreppedData {
    n: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    dy: Vec<f64>,
    ddy: Vec<f64>,
}

fn check_series(name: &str, values: &[f64], n: usize) -> Result<(), PwlError> {
    if values.len() != n {
        return Err(PwlError::invalid_input(format!(
            "PreppedData.{name} length mismatch: expected {n}, got {}",
            values.len()
        )));
    }
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(PwlError::numerical_issue(format!(
            "PreppedData.{name} has non-finite value {} at index {pos}",
            values[pos]
        )));
    }
    Ok(())
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PreppedDataWire {
    x: Vec<f64>,
    y: Vec<f64>,
    dy: Vec<f64>,
    ddy: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<PreppedDataWire> for PreppedData {
    type Error = PwlError;

    fn try_from(wire: PreppedDataWire) -> Result<Self, Self::Error> {
        Self::new(wire.x, wire.y, wire.dy, wire.ddy)
    }
}

impl PreppedData {
    /// Builds a container after checking that every array has the length of
    /// `x` and holds only finite values.
    pub fn new(x: Vec<f64>, y: Vec<f64>, dy: Vec<f64>, ddy: Vec<f64>) -> Result<Self, PwlError> {
        let n = x.len();
        if n == 0 {
            return Err(PwlError::invalid_input("PreppedData requires n >= 1"));
        }
        check_series("x", &x, n)?;
        check_series("y", &y, n)?;
        check_series("dy", &dy, n)?;
        check_series("ddy", &ddy, n)?;
        Ok(Self { n, x, y, dy, ddy })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Raw samples.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Smoothed samples.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Normalized first derivative of `y`.
    pub fn dy(&self) -> &[f64] {
        &self.dy
    }

    /// Normalized second derivative of `y`.
    pub fn ddy(&self) -> &[f64] {
        &self.ddy
    }
}
