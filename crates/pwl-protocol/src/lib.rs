// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Regime descriptors, multi-group test protocols and per-sample labels.

pub mod descriptor;
pub mod labels;
pub mod protocol;

pub use descriptor::{
    RegimeDescriptor, parse_regime, parse_regimes, regimes_from_json, validate_descriptor,
};
pub use labels::{SampleLabel, label_samples};
pub use protocol::{
    CyclePositions, GroupPositions, ProtocolCycle, ProtocolGroup, ProtocolMap, TestProtocol,
    loading_protocol,
};
