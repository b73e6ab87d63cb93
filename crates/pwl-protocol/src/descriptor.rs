// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pwl_core::{DEFAULT_HOLD_DURATION, PwlError, Regime, RegimeKind};
use serde::{Deserialize, Serialize};

/// User-facing description of one regime, as found in protocol and regime
/// list files.
///
/// `curve` is kept as free text so that unknown kinds surface as validation
/// errors rather than JSON errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegimeDescriptor {
    pub curve: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl RegimeDescriptor {
    pub fn hold() -> Self {
        Self {
            curve: RegimeKind::Hold.as_str().to_string(),
            delta: None,
            duration: None,
        }
    }

    pub fn stretch(delta: f64, duration: f64) -> Self {
        Self {
            curve: RegimeKind::Stretch.as_str().to_string(),
            delta: Some(delta),
            duration: Some(duration),
        }
    }

    pub fn recover(delta: f64, duration: f64) -> Self {
        Self {
            curve: RegimeKind::Recover.as_str().to_string(),
            delta: Some(delta),
            duration: Some(duration),
        }
    }
}

fn parse_kind(curve: &str) -> Option<RegimeKind> {
    RegimeKind::ALL.into_iter().find(|k| k.as_str() == curve)
}

fn problems(descriptor: &RegimeDescriptor) -> Vec<String> {
    let Some(kind) = parse_kind(&descriptor.curve) else {
        return vec![format!(
            "unknown curve '{}'; expected HOLD, STRETCH or RECOVER",
            descriptor.curve
        )];
    };

    let mut out = vec![];
    let required = kind != RegimeKind::Hold;
    match descriptor.delta {
        None if required => out.push(format!("{kind} requires 'delta'")),
        Some(delta) if !delta.is_finite() => {
            out.push(format!("{kind} delta must be finite; got {delta}"))
        }
        _ => {}
    }
    match descriptor.duration {
        None if required => out.push(format!("{kind} requires 'duration'")),
        Some(duration) if !duration.is_finite() || duration <= 0.0 => out.push(format!(
            "{kind} duration must be finite and > 0; got {duration}"
        )),
        _ => {}
    }
    out
}

/// Reports every problem of one descriptor in a single `Validation` error.
pub fn validate_descriptor(descriptor: &RegimeDescriptor) -> Result<(), PwlError> {
    let found = problems(descriptor);
    if found.is_empty() {
        Ok(())
    } else {
        Err(PwlError::validation(found.join("; ")))
    }
}

/// Validates and converts one descriptor.
pub fn parse_regime(descriptor: &RegimeDescriptor) -> Result<Regime, PwlError> {
    validate_descriptor(descriptor)?;
    let kind = parse_kind(&descriptor.curve)
        .ok_or_else(|| PwlError::validation(format!("unknown curve '{}'", descriptor.curve)))?;
    let duration = descriptor.duration.unwrap_or(DEFAULT_HOLD_DURATION);
    let delta = descriptor.delta.unwrap_or(0.0);
    Ok(match kind {
        RegimeKind::Hold => Regime::hold(duration),
        RegimeKind::Stretch => Regime::stretch(delta, duration),
        RegimeKind::Recover => Regime::recover(delta, duration),
    })
}

/// Converts a whole list, naming every failing descriptor by position.
pub fn parse_regimes(descriptors: &[RegimeDescriptor]) -> Result<Vec<Regime>, PwlError> {
    let mut regimes = Vec::with_capacity(descriptors.len());
    let mut failures = vec![];
    for (position, descriptor) in descriptors.iter().enumerate() {
        let found = problems(descriptor);
        if found.is_empty() {
            regimes.push(parse_regime(descriptor)?);
        } else {
            failures.push(format!("regime {position}: {}", found.join(", ")));
        }
    }
    if failures.is_empty() {
        Ok(regimes)
    } else {
        Err(PwlError::validation(failures.join("; ")))
    }
}

/// Parses a JSON array of descriptors.
pub fn regimes_from_json(text: &str) -> Result<Vec<Regime>, PwlError> {
    let descriptors: Vec<RegimeDescriptor> = serde_json::from_str(text)
        .map_err(|err| PwlError::invalid_input(format!("regime list JSON: {err}")))?;
    parse_regimes(&descriptors)
}
