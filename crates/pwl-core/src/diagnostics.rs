// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;

/// Diagnostics schema version for segmentation run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured diagnostics captured from a segmentation run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub n_points: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    /// Boundary positions visited by the coarse localizer, in visit order.
    pub localized_positions: Vec<usize>,
    pub refine_iterations: usize,
    pub refine_converged: bool,
    pub initial_objective: Option<f64>,
    pub final_objective: Option<f64>,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            n_points: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            localized_positions: vec![],
            refine_iterations: 0,
            refine_converged: false,
            initial_objective: None,
            final_objective: None,
            #[cfg(feature = "serde")]
            params_json: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics};
    use std::borrow::Cow;

    #[test]
    fn diagnostics_default_sets_schema_and_engine_version() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.schema_version, DIAGNOSTICS_SCHEMA_VERSION);
        assert_eq!(
            diagnostics.engine_version,
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        assert_eq!(diagnostics.algorithm, Cow::Borrowed(""));
        assert!(diagnostics.notes.is_empty());
        assert!(diagnostics.localized_positions.is_empty());
        assert!(!diagnostics.refine_converged);
        assert!(diagnostics.final_objective.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn diagnostics_serde_roundtrip_preserves_all_fields() {
        let diagnostics = Diagnostics {
            n: 4_096,
            n_points: 12,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            notes: vec!["group FirstLoading localized".to_string()],
            warnings: vec![],
            algorithm: Cow::Owned("localize+refine".to_string()),
            localized_positions: vec![1, 2, 3],
            refine_iterations: 7,
            refine_converged: true,
            initial_objective: Some(12.5),
            final_objective: Some(0.25),
            params_json: Some(serde_json::json!({ "window": 50, "stride": 25 })),
        };

        let encoded = serde_json::to_string(&diagnostics).expect("diagnostics should serialize");
        let decoded: Diagnostics =
            serde_json::from_str(&encoded).expect("diagnostics should deserialize");
        assert_eq!(decoded, diagnostics);
    }
}
