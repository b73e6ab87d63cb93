// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! CSV input and labeled CSV output.

use crate::error::CliError;
use pwl_protocol::SampleLabel;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const RECORD_COLUMNS: usize = 4;
const LABELED_HEADER: [&str; 7] = [
    "Protocol",
    "Cycle",
    "Phase",
    "Time [s]",
    "Stretch [-]",
    "P [kPa]",
    "Weight [-]",
];

/// One mechanical test recording: time, strain, pressure and the
/// denominator of the per-sample weight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestRecord {
    pub time: Vec<f64>,
    pub strain: Vec<f64>,
    pub pressure: Vec<f64>,
    pub weight_denominator: Vec<f64>,
}

impl TestRecord {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn parse_cell(cell: Option<&str>, row: usize, column: usize, source: &str) -> Result<f64, CliError> {
    let raw = cell.ok_or_else(|| {
        CliError::invalid_input(format!("{source}: row {row} has no column {column}"))
    })?;
    raw.parse::<f64>().map_err(|_| {
        CliError::invalid_input(format!(
            "{source}: row {row} column {column} is not a number: '{raw}'"
        ))
    })
}

/// Reads a headed CSV whose first four columns are time, strain, pressure
/// and weight denominator. Extra columns are ignored.
pub fn parse_record<R: Read>(reader: R, source: &str) -> Result<TestRecord, CliError> {
    let mut record = TestRecord::default();
    for (i, row) in csv_reader(reader).records().enumerate() {
        let row = row.map_err(|err| CliError::csv(format!("failed to parse '{source}'"), err))?;
        let line = i + 2;
        if row.len() < RECORD_COLUMNS {
            return Err(CliError::invalid_input(format!(
                "{source}: row {line} has {} columns but at least {RECORD_COLUMNS} are required",
                row.len()
            )));
        }
        record.time.push(parse_cell(row.get(0), line, 0, source)?);
        record.strain.push(parse_cell(row.get(1), line, 1, source)?);
        record.pressure.push(parse_cell(row.get(2), line, 2, source)?);
        record
            .weight_denominator
            .push(parse_cell(row.get(3), line, 3, source)?);
    }
    if record.is_empty() {
        return Err(CliError::invalid_input(format!("{source}: no data rows")));
    }
    Ok(record)
}

pub fn read_record(path: &Path) -> Result<TestRecord, CliError> {
    let file = File::open(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    parse_record(file, &path.display().to_string())
}

/// Reads one numeric column of a headed CSV.
pub fn parse_signal<R: Read>(reader: R, column: usize, source: &str) -> Result<Vec<f64>, CliError> {
    let mut values = vec![];
    for (i, row) in csv_reader(reader).records().enumerate() {
        let row = row.map_err(|err| CliError::csv(format!("failed to parse '{source}'"), err))?;
        values.push(parse_cell(row.get(column), i + 2, column, source)?);
    }
    if values.is_empty() {
        return Err(CliError::invalid_input(format!("{source}: no data rows")));
    }
    Ok(values)
}

pub fn read_signal(path: &Path, column: usize) -> Result<Vec<f64>, CliError> {
    let file = File::open(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    parse_signal(file, column, &path.display().to_string())
}

/// Writes one labeled row per sample; the weight column is the reciprocal
/// of the record's weight denominator.
pub fn write_labeled<W: Write>(
    writer: W,
    record: &TestRecord,
    labels: &[SampleLabel],
) -> Result<(), CliError> {
    if labels.len() != record.len() {
        return Err(CliError::invalid_input(format!(
            "{} labels for {} samples",
            labels.len(),
            record.len()
        )));
    }
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(LABELED_HEADER)
        .map_err(|err| CliError::csv("failed to write header", err))?;
    for (i, label) in labels.iter().enumerate() {
        out.write_record([
            label.protocol.clone(),
            label.cycle.clone(),
            label.phase.clone(),
            record.time[i].to_string(),
            record.strain[i].to_string(),
            record.pressure[i].to_string(),
            (1.0 / record.weight_denominator[i]).to_string(),
        ])
        .map_err(|err| CliError::csv(format!("failed to write row {i}"), err))?;
    }
    out.flush()
        .map_err(|source| CliError::io("failed to flush labeled CSV", source))
}

/// Output file stem for one axis/rate pair: `x` + `0.5` gives `x_0-5`.
pub fn output_stem(axis: &str, rate: &str) -> String {
    format!("{axis}_{}", rate.replace('.', "-"))
}
