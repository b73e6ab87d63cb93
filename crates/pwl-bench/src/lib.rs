// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared fixtures for the criterion benches.

use pwl_core::Regime;

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// Uniform noise in `[-amplitude, amplitude)` from a fixed seed.
fn noise(state: &mut u64, amplitude: f64) -> f64 {
    let unit = (lcg_next(state) >> 11) as f64 / (1u64 << 53) as f64;
    (2.0 * unit - 1.0) * amplitude
}

/// `cycles` repetitions of stretch/hold/recover/hold, each segment
/// `segment_len` samples long, with deterministic noise added.
pub fn staircase(cycles: usize, segment_len: usize, amplitude: f64) -> (Vec<f64>, Vec<Regime>) {
    let mut state = 0xfeed_f00d_dead_beef_u64;
    let mut x = Vec::with_capacity(cycles * 4 * segment_len);
    let mut regimes = Vec::with_capacity(cycles * 4);
    for _ in 0..cycles {
        for (start, end) in [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)] {
            for i in 0..segment_len {
                let t = i as f64 / segment_len as f64;
                x.push(start + (end - start) * t + noise(&mut state, amplitude));
            }
        }
        regimes.extend([
            Regime::stretch(1.0, 1.0),
            Regime::hold(1.0),
            Regime::recover(-1.0, 1.0),
            Regime::hold(1.0),
        ]);
    }
    (x, regimes)
}
