// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use pwl_core::{ExecutionContext, Regime};
use pwl_preprocess::{PrepConfig, prep_data};
use pwl_segment::{
    BoundaryGroup, IndexInit, LocalizeConfig, PipelineConfig, RefineConfig, SegmentationPipeline,
};

fn build_regime(kind_seed: u8, delta_seed: i16, duration_seed: u8) -> Regime {
    let delta = f64::from(delta_seed) / 64.0;
    let duration = match duration_seed % 16 {
        0 => 0.0,
        1 => -1.0,
        2 => f64::NAN,
        _ => f64::from(duration_seed) / 16.0,
    };
    match kind_seed % 3 {
        0 => Regime::hold(duration),
        1 => Regime::stretch(delta, duration),
        _ => Regime::recover(delta, duration),
    }
}

fn build_sample(base: f64, mode_seed: u8, raw_seed: i16) -> f64 {
    match mode_seed % 8 {
        0 => f64::from(raw_seed) / 256.0,
        1 => 0.0,
        2 => f64::NAN,
        3 => f64::INFINITY,
        _ => {
            if base.is_finite() {
                base.clamp(-1.0e6, 1.0e6)
            } else {
                0.0
            }
        }
    }
}

fn build_groups(cursor: &mut common::ByteCursor<'_>, n_regimes: usize) -> Vec<BoundaryGroup> {
    let n_groups = common::bounded(cursor.next_u8(), 0, 4);
    (0..n_groups)
        .map(|g| {
            let len = common::bounded(cursor.next_u8(), 0, 8);
            BoundaryGroup {
                name: format!("group_{g}"),
                positions: (0..len)
                    .map(|_| common::bounded(cursor.next_u8(), 0, n_regimes + 2))
                    .collect(),
            }
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);

    let n_regimes = common::bounded(cursor.next_u8(), 0, 12);
    let regimes: Vec<Regime> = (0..n_regimes)
        .map(|_| build_regime(cursor.next_u8(), cursor.next_i16(), cursor.next_u8()))
        .collect();

    let n_samples = common::bounded(cursor.next_u8(), 0, 255);
    let payload = cursor.take_padded(n_samples.saturating_mul(8));
    let bases = common::decode_f64_chunks(&payload, n_samples);
    let samples: Vec<f64> = bases
        .iter()
        .map(|&base| build_sample(base, cursor.next_u8(), cursor.next_i16()))
        .collect();

    let prep = PrepConfig {
        sigma: f64::from(cursor.next_u8()) / 8.0,
        truncate: f64::from(cursor.next_u8() % 8),
    };
    let config = PipelineConfig {
        init: if cursor.next_u8() & 1 == 0 {
            IndexInit::Zeros
        } else {
            IndexInit::Identity
        },
        localize: LocalizeConfig {
            prominence: f64::from(cursor.next_u8()) / 255.0,
            min_height: f64::from(cursor.next_u8()) / 255.0,
            normalize_by_peak: cursor.next_u8() & 1 == 1,
        },
        refine: RefineConfig {
            window: common::bounded(cursor.next_u8(), 0, 64),
            max_iter: common::bounded(cursor.next_u8(), 0, 16),
            stride: common::bounded(cursor.next_u8(), 0, 8),
        },
    };
    let groups = if cursor.next_u8() % 4 == 0 {
        SegmentationPipeline::single_group(&regimes)
    } else {
        build_groups(&mut cursor, n_regimes)
    };

    let Ok(prepped) = prep_data(samples, &prep) else {
        return;
    };
    let Ok(pipeline) = SegmentationPipeline::new(config) else {
        return;
    };
    let _ = pipeline.run(&prepped, &regimes, &groups, None, &ExecutionContext::new());
});
