// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::regime::{BoundaryKind, RegimeKind};
use std::fmt;
use thiserror::Error;

/// One adjacent regime pair that cannot be assigned a boundary kind.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidPair {
    /// Boundary position between regime `position - 1` and regime `position`.
    pub position: usize,
    pub left: RegimeKind,
    pub right: RegimeKind,
}

impl fmt::Display for InvalidPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "boundary {}: consecutive {} -> {}",
            self.position, self.left, self.right
        )
    }
}

fn join_pairs(pairs: &[InvalidPair]) -> String {
    pairs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the segmentation workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PwlError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid regime: {0}")]
    Validation(String),
    #[error("cannot classify {} boundary pair(s): {}", .0.len(), join_pairs(.0))]
    Classification(Vec<InvalidPair>),
    #[error("no {kind} extremum found for boundary {position}")]
    Localization { position: usize, kind: BoundaryKind },
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
}

impl PwlError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn classification(pairs: Vec<InvalidPair>) -> Self {
        Self::Classification(pairs)
    }

    pub fn localization(position: usize, kind: BoundaryKind) -> Self {
        Self::Localization { position, kind }
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    /// Stable machine-readable code for this error family.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Validation(_) => "validation",
            Self::Classification(_) => "classification",
            Self::Localization { .. } => "localization",
            Self::NumericalIssue(_) => "numerical_issue",
        }
    }
}
