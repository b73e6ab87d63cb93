// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pwl_core::{ExecutionContext, Regime, RegimeKind};
use pwl_preprocess::{PrepConfig, prep_data};
use pwl_protocol::{label_samples, loading_protocol};
use pwl_segment::{PipelineConfig, SegmentationPipeline};

const SAMPLES_PER_SECOND: f64 = 50.0;
const HOLD_SAMPLES: usize = 100;

/// Noise-free strain record following `regimes`, ramps sampled at
/// [`SAMPLES_PER_SECOND`] and every hold lasting [`HOLD_SAMPLES`].
fn synthetic_record(regimes: &[Regime]) -> (Vec<f64>, Vec<usize>) {
    let mut x = vec![];
    let mut bounds = vec![0];
    let mut level = 0.0;
    for regime in regimes {
        let len = match regime.kind {
            RegimeKind::Hold => HOLD_SAMPLES,
            _ => (regime.duration * SAMPLES_PER_SECOND).round() as usize,
        };
        let (a, b) = (level, level + regime.delta);
        for i in 0..len {
            x.push(a + (b - a) * i as f64 / len as f64);
        }
        level = b;
        bounds.push(x.len());
    }
    (x, bounds)
}

#[test]
fn built_in_protocol_segments_and_labels_a_clean_record() {
    let (map, regimes) = loading_protocol(0.3).flatten().expect("built-in protocol is valid");
    let (x, bounds) = synthetic_record(&regimes);
    assert_eq!(x.len(), 5100);

    let data = prep_data(x, &PrepConfig::default()).expect("clean record prepares");
    let pipeline = SegmentationPipeline::new(PipelineConfig::default()).expect("default config");
    let outcome = pipeline
        .run(
            &data,
            &regimes,
            &map.boundary_groups(),
            None,
            &ExecutionContext::new(),
        )
        .expect("clean record segments");

    assert_eq!(outcome.segmentation.idx(), bounds.as_slice());
    assert!(outcome.refine.converged);
    assert_eq!(outcome.diagnostics.localized_positions, (1..=55).collect::<Vec<_>>());
    assert_eq!(outcome.diagnostics.notes.len(), 4);

    let labels = label_samples(&outcome.segmentation, &map, data.n()).expect("labels");
    assert_eq!(labels.len(), 5100);
    assert_eq!(
        (labels[0].protocol.as_str(), labels[0].cycle.as_str(), labels[0].phase.as_str()),
        ("FirstLoading", "step_0", "0_STRETCH")
    );
    assert_eq!(labels[250].phase, "1_HOLD");
    // Sample 1500 is shared by the last loading hold and the first unload.
    assert_eq!(labels[1500].protocol, "Unloading");
    assert_eq!(labels[1500].phase, "0_RECOVER");
    assert_eq!(labels[1499].protocol, "FirstLoading");
    assert_eq!(labels[1499].cycle, "step_8");
    assert_eq!(labels[5099].protocol, "Reset");
    assert!(labels.iter().all(|l| !l.phase.is_empty()));
}
