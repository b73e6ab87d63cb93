// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Library side of the `pwlsplit` binary: record I/O and the per-record
//! driver.

pub mod driver;
pub mod error;
pub mod record;

pub use driver::{
    Manifest, ProcessedRecord, RunSettings, SegmentReport, load_manifest, load_protocol,
    process_manifest, process_record, segment_file, segment_signal,
};
pub use error::CliError;
pub use record::{
    TestRecord, output_stem, parse_record, parse_signal, read_record, read_signal, write_labeled,
};
