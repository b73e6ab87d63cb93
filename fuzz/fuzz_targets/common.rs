// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

/// Reads fuzzer bytes front to back; exhausted input yields zeros.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn next_u8(&mut self) -> u8 {
        let value = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.saturating_add(1);
        value
    }

    pub fn next_i16(&mut self) -> i16 {
        i16::from_le_bytes([self.next_u8(), self.next_u8()])
    }

    /// Next `len` bytes, zero-padded past the end of the input.
    pub fn take_padded(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_u8()).collect()
    }
}

/// Maps `seed` onto `lo..=hi`.
pub fn bounded(seed: u8, lo: usize, hi: usize) -> usize {
    if hi <= lo {
        return lo;
    }
    lo + usize::from(seed) % (hi - lo + 1)
}

/// Little-endian f64 values from 8-byte chunks, at most `max_values`.
pub fn decode_f64_chunks(bytes: &[u8], max_values: usize) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .take(max_values)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}
