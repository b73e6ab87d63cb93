// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::descriptor::{RegimeDescriptor, parse_regimes};
use pwl_core::{PwlError, Regime};
use pwl_segment::BoundaryGroup;
use serde::{Deserialize, Serialize};

const INCREMENTAL_STEPS: usize = 8;

/// One cycle of a protocol group, e.g. `step_3`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolCycle {
    pub name: String,
    pub segments: Vec<RegimeDescriptor>,
}

/// A named phase of a test protocol made of ordered cycles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolGroup {
    pub name: String,
    pub cycles: Vec<ProtocolCycle>,
}

/// Ordered groups of cycles of regimes.
///
/// Serialized as `{"groups": [{"name", "cycles": [{"name", "segments"}]}]}`
/// so the order of groups and cycles survives a round trip through JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestProtocol {
    pub groups: Vec<ProtocolGroup>,
}

/// Boundary positions that end each regime of one cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclePositions {
    pub name: String,
    pub positions: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupPositions {
    pub name: String,
    pub cycles: Vec<CyclePositions>,
}

impl GroupPositions {
    fn sorted_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .cycles
            .iter()
            .flat_map(|c| c.positions.iter().copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

/// Where each regime of a flattened protocol landed.
///
/// Positions are 1-based and consecutive over the whole protocol: the
/// regime ended by position `k` spans `idx[k - 1]..idx[k]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolMap {
    groups: Vec<GroupPositions>,
}

impl ProtocolMap {
    pub fn groups(&self) -> &[GroupPositions] {
        &self.groups
    }

    /// Sorted unique positions of the first group called `name`.
    pub fn group_positions(&self, name: &str) -> Option<Vec<usize>> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(GroupPositions::sorted_positions)
    }

    /// One localization group per protocol group, in protocol order.
    pub fn boundary_groups(&self) -> Vec<BoundaryGroup> {
        self.groups
            .iter()
            .map(|group| BoundaryGroup {
                name: group.name.clone(),
                positions: group.sorted_positions(),
            })
            .collect()
    }
}

impl TestProtocol {
    pub fn from_json(text: &str) -> Result<Self, PwlError> {
        serde_json::from_str(text)
            .map_err(|err| PwlError::invalid_input(format!("protocol JSON: {err}")))
    }

    pub fn n_regimes(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.cycles)
            .map(|c| c.segments.len())
            .sum()
    }

    /// Validates every descriptor and returns the flat regime list together
    /// with the position map.
    pub fn flatten(&self) -> Result<(ProtocolMap, Vec<Regime>), PwlError> {
        let descriptors: Vec<RegimeDescriptor> = self
            .groups
            .iter()
            .flat_map(|g| &g.cycles)
            .flat_map(|c| c.segments.iter().cloned())
            .collect();
        if descriptors.is_empty() {
            return Err(PwlError::invalid_input("protocol contains no regimes"));
        }
        let regimes = parse_regimes(&descriptors)?;

        let mut k = 0;
        let groups = self
            .groups
            .iter()
            .map(|group| GroupPositions {
                name: group.name.clone(),
                cycles: group
                    .cycles
                    .iter()
                    .map(|cycle| CyclePositions {
                        name: cycle.name.clone(),
                        positions: cycle
                            .segments
                            .iter()
                            .map(|_| {
                                k += 1;
                                k
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Ok((ProtocolMap { groups }, regimes))
    }
}

fn step_cycle(index: usize, ramp: RegimeDescriptor) -> ProtocolCycle {
    ProtocolCycle {
        name: format!("step_{index}"),
        segments: vec![ramp, RegimeDescriptor::hold()],
    }
}

/// The built-in multi-cycle loading protocol for a peak strain of
/// `max_strain`.
///
/// Loading ramps to a third of `max_strain` over 4 s, then climbs in eight
/// 1 s increments of a quarter of that, holding after each ramp. Unloading
/// mirrors it, reloading repeats the loading, and a final 12 s recover
/// returns to zero.
pub fn loading_protocol(max_strain: f64) -> TestProtocol {
    let major = max_strain / 3.0;
    let minor = major / 4.0;

    let loading: Vec<ProtocolCycle> = std::iter::once(step_cycle(
        0,
        RegimeDescriptor::stretch(major, 4.0),
    ))
    .chain((1..=INCREMENTAL_STEPS).map(|i| step_cycle(i, RegimeDescriptor::stretch(minor, 1.0))))
    .collect();

    let unloading: Vec<ProtocolCycle> = (0..INCREMENTAL_STEPS)
        .map(|i| step_cycle(i, RegimeDescriptor::recover(-minor, 1.0)))
        .chain(std::iter::once(step_cycle(
            INCREMENTAL_STEPS,
            RegimeDescriptor::recover(-major, 4.0),
        )))
        .collect();

    TestProtocol {
        groups: vec![
            ProtocolGroup {
                name: "FirstLoading".to_string(),
                cycles: loading.clone(),
            },
            ProtocolGroup {
                name: "Unloading".to_string(),
                cycles: unloading,
            },
            ProtocolGroup {
                name: "Reloading".to_string(),
                cycles: loading,
            },
            ProtocolGroup {
                name: "Reset".to_string(),
                cycles: vec![ProtocolCycle {
                    name: "step_0".to_string(),
                    segments: vec![RegimeDescriptor::recover(-max_strain, 12.0)],
                }],
            },
        ],
    }
}
