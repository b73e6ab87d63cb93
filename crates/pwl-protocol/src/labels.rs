// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::protocol::ProtocolMap;
use pwl_core::{PwlError, Segmentation};

/// Protocol phase a single sample belongs to. Unlabeled samples keep empty
/// strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleLabel {
    pub protocol: String,
    pub cycle: String,
    /// `"{j}_{KIND}"`, `j` being the regime's position inside its cycle.
    pub phase: String,
}

/// Labels `n` samples from a refined segmentation.
///
/// The regime ended by position `k` owns `idx[k - 1]..=idx[k]`, clamped to
/// `n`; a later regime overwrites the boundary sample it shares with the
/// previous one.
pub fn label_samples(
    segmentation: &Segmentation,
    map: &ProtocolMap,
    n: usize,
) -> Result<Vec<SampleLabel>, PwlError> {
    let idx = segmentation.idx();
    let curves = segmentation.curves();
    let mut labels = vec![SampleLabel::default(); n];

    for group in map.groups() {
        for cycle in &group.cycles {
            for (j, &k) in cycle.positions.iter().enumerate() {
                if k == 0 || k >= idx.len() {
                    return Err(PwlError::invalid_input(format!(
                        "protocol position {k} ({}/{}) outside segmentation with {} boundaries",
                        group.name,
                        cycle.name,
                        idx.len()
                    )));
                }
                let start = idx[k - 1].min(n);
                let end = idx[k].saturating_add(1).min(n);
                let phase = format!("{j}_{}", curves[k - 1]);
                for label in &mut labels[start..end.max(start)] {
                    label.protocol.clone_from(&group.name);
                    label.cycle.clone_from(&cycle.name);
                    label.phase.clone_from(&phase);
                }
            }
        }
    }
    Ok(labels)
}
