// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::record::{output_stem, read_record, read_signal, write_labeled};
use pwl_core::{ExecutionContext, Regime, Segmentation};
use pwl_preprocess::{PrepConfig, prep_data};
use pwl_protocol::{TestProtocol, label_samples, regimes_from_json};
use pwl_segment::{
    GroupObserver, PipelineConfig, RefineReport, SegmentationOutcome, SegmentationPipeline,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `{axis: {rate: csv path relative to the manifest}}`.
pub type Manifest = BTreeMap<String, BTreeMap<String, String>>;

/// Engine settings shared by every record of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSettings {
    pub prep: PrepConfig,
    pub pipeline: PipelineConfig,
    pub write_diagnostics: bool,
}

/// Files produced for one record.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedRecord {
    pub labeled_csv: PathBuf,
    pub diagnostics_json: Option<PathBuf>,
    pub idx: Vec<usize>,
}

struct TracingObserver;

impl GroupObserver for TracingObserver {
    fn on_group(&self, name: &str, segmentation: &Segmentation) {
        debug!(group = name, idx = ?segmentation.idx(), "group localized");
    }
}

/// Prepares `values` and runs the grouped pipeline on them.
pub fn segment_signal(
    values: Vec<f64>,
    regimes: &[Regime],
    groups: &[pwl_segment::BoundaryGroup],
    settings: &RunSettings,
) -> Result<SegmentationOutcome, CliError> {
    let data = prep_data(values, &settings.prep)?;
    let pipeline = SegmentationPipeline::new(settings.pipeline.clone())?;
    let outcome = pipeline.run(
        &data,
        regimes,
        groups,
        Some(&TracingObserver),
        &ExecutionContext::new(),
    )?;
    Ok(outcome)
}

/// Segments one record with `protocol` and writes `<out_dir>/<stem>.csv`.
pub fn process_record(
    data_path: &Path,
    out_dir: &Path,
    stem: &str,
    protocol: &TestProtocol,
    settings: &RunSettings,
) -> Result<ProcessedRecord, CliError> {
    let record = read_record(data_path)?;
    let (map, regimes) = protocol.flatten()?;
    let outcome = segment_signal(
        record.strain.clone(),
        &regimes,
        &map.boundary_groups(),
        settings,
    )?;
    for warning in &outcome.diagnostics.warnings {
        tracing::warn!(record = %data_path.display(), "{warning}");
    }

    let labels = label_samples(&outcome.segmentation, &map, record.len())?;
    let labeled_csv = out_dir.join(format!("{stem}.csv"));
    let file = File::create(&labeled_csv).map_err(|source| {
        CliError::io(format!("failed to create '{}'", labeled_csv.display()), source)
    })?;
    write_labeled(BufWriter::new(file), &record, &labels)?;
    info!(output = %labeled_csv.display(), "wrote labeled record");

    let diagnostics_json = if settings.write_diagnostics {
        let path = out_dir.join(format!("{stem}_diagnostics.json"));
        let text = serde_json::to_string_pretty(&outcome.diagnostics)
            .map_err(|source| CliError::json("failed to encode diagnostics", source))?;
        fs::write(&path, text).map_err(|source| {
            CliError::io(format!("failed to write '{}'", path.display()), source)
        })?;
        Some(path)
    } else {
        None
    };

    Ok(ProcessedRecord {
        labeled_csv,
        diagnostics_json,
        idx: outcome.segmentation.into_indices(),
    })
}

/// JSON document printed by `pwlsplit segment`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentReport {
    pub segmentation: Segmentation,
    pub refine: RefineReport,
}

/// Segments one signal column against a regime list file as a single group.
pub fn segment_file(
    signal: &Path,
    column: usize,
    regimes: &Path,
    settings: &RunSettings,
) -> Result<SegmentReport, CliError> {
    let raw = fs::read_to_string(regimes).map_err(|source| {
        CliError::io(format!("failed to read '{}'", regimes.display()), source)
    })?;
    let regimes = regimes_from_json(&raw)?;
    let values = read_signal(signal, column)?;
    let outcome = segment_signal(
        values,
        &regimes,
        &SegmentationPipeline::single_group(&regimes),
        settings,
    )?;
    Ok(SegmentReport {
        segmentation: outcome.segmentation,
        refine: outcome.refine,
    })
}

pub fn load_manifest(path: &Path) -> Result<Manifest, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    serde_json::from_str(&raw)
        .map_err(|source| CliError::json(format!("invalid manifest '{}'", path.display()), source))
}

pub fn load_protocol(path: &Path) -> Result<TestProtocol, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    Ok(TestProtocol::from_json(&raw)?)
}

/// Processes every axis/rate entry of a manifest. Records are resolved
/// relative to the manifest and outputs land next to them.
pub fn process_manifest(
    path: &Path,
    protocol: &TestProtocol,
    settings: &RunSettings,
) -> Result<Vec<ProcessedRecord>, CliError> {
    let manifest = load_manifest(path)?;
    let folder = path.parent().unwrap_or_else(|| Path::new("."));
    let mut processed = vec![];
    for (axis, tests) in &manifest {
        for (rate, name) in tests {
            let data_path = folder.join(name);
            info!(manifest = %path.display(), axis, rate, "processing record");
            let out_dir = data_path.parent().unwrap_or(folder);
            processed.push(process_record(
                &data_path,
                out_dir,
                &output_stem(axis, rate),
                protocol,
                settings,
            )?);
        }
    }
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::{RunSettings, process_manifest, segment_file, segment_signal};
    use pwl_core::Regime;
    use pwl_protocol::{ProtocolCycle, ProtocolGroup, RegimeDescriptor, TestProtocol};
    use pwl_segment::{PipelineConfig, RefineConfig, SegmentationPipeline};
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pwlsplit_{name}_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir should be creatable");
        dir
    }

    /// HOLD for 150, STRETCH to 0.3 over 230, HOLD for 180.
    fn hold_stretch_hold() -> Vec<f64> {
        let mut x = vec![0.0; 150];
        x.extend((0..230).map(|i| 0.3 * i as f64 / 230.0));
        x.extend(std::iter::repeat_n(0.3, 180));
        x
    }

    fn settings() -> RunSettings {
        RunSettings {
            pipeline: PipelineConfig {
                refine: RefineConfig {
                    stride: 1,
                    ..RefineConfig::default()
                },
                ..PipelineConfig::default()
            },
            ..RunSettings::default()
        }
    }

    #[test]
    fn segment_signal_finds_both_corners() {
        let regimes = [
            Regime::hold(1.0),
            Regime::stretch(0.3, 2.3),
            Regime::hold(1.0),
        ];
        let outcome = segment_signal(
            hold_stretch_hold(),
            &regimes,
            &SegmentationPipeline::single_group(&regimes),
            &settings(),
        )
        .expect("clean signal segments");
        assert_eq!(outcome.segmentation.idx(), &[0, 150, 380, 560]);
    }

    #[test]
    fn manifest_run_writes_labeled_csv_and_diagnostics() {
        let dir = scratch_dir("manifest");
        let mut csv = String::from("time,stretch,pressure,thickness\n");
        for (i, v) in hold_stretch_hold().iter().enumerate() {
            csv.push_str(&format!("{},{v},1.0,2.0\n", i as f64 * 0.02));
        }
        fs::write(dir.join("data.csv"), csv).expect("write data");
        fs::write(dir.join("specimen.json"), r#"{"x": {"0.5": "data.csv"}}"#)
            .expect("write manifest");

        let protocol = TestProtocol {
            groups: vec![ProtocolGroup {
                name: "Load".to_string(),
                cycles: vec![ProtocolCycle {
                    name: "step_0".to_string(),
                    segments: vec![
                        RegimeDescriptor::hold(),
                        RegimeDescriptor::stretch(0.3, 2.3),
                        RegimeDescriptor::hold(),
                    ],
                }],
            }],
        };
        let settings = RunSettings {
            write_diagnostics: true,
            ..settings()
        };
        let processed =
            process_manifest(&dir.join("specimen.json"), &protocol, &settings).expect("run succeeds");

        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].idx, vec![0, 150, 380, 560]);
        assert_eq!(processed[0].labeled_csv, dir.join("x_0-5.csv"));
        let text = fs::read_to_string(&processed[0].labeled_csv).expect("labeled csv");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 561);
        assert!(lines[1].starts_with("Load,step_0,0_HOLD,0,0,1,0.5"));
        assert!(lines[200].starts_with("Load,step_0,1_STRETCH,"));
        assert!(lines[560].starts_with("Load,step_0,2_HOLD,"));

        let diagnostics = processed[0]
            .diagnostics_json
            .as_ref()
            .expect("diagnostics requested");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(diagnostics).expect("diagnostics file"))
                .expect("diagnostics JSON");
        assert_eq!(value["n"], 560);
        assert_eq!(value["refine_converged"], true);

        fs::remove_dir_all(&dir).expect("scratch dir should be removable");
    }

    #[test]
    fn segment_file_reports_segmentation_and_refinement() {
        let dir = scratch_dir("segment");
        let mut csv = String::from("t,stretch\n");
        for (i, v) in hold_stretch_hold().iter().enumerate() {
            csv.push_str(&format!("{i},{v}\n"));
        }
        fs::write(dir.join("signal.csv"), csv).expect("write signal");
        fs::write(
            dir.join("regimes.json"),
            r#"[{"curve": "HOLD"}, {"curve": "STRETCH", "delta": 0.3, "time": 2.3}, {"curve": "HOLD"}]"#,
        )
        .expect("write regimes");

        let report = segment_file(
            &dir.join("signal.csv"),
            1,
            &dir.join("regimes.json"),
            &settings(),
        )
        .expect("segment succeeds");
        assert_eq!(report.segmentation.idx(), &[0, 150, 380, 560]);

        let value = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(
            value["segmentation"]["points"],
            serde_json::json!(["START", "PEAK", "VALLEY", "END"])
        );
        assert_eq!(
            value["segmentation"]["curves"],
            serde_json::json!(["HOLD", "STRETCH", "HOLD"])
        );
        assert_eq!(value["segmentation"]["idx"], serde_json::json!([0, 150, 380, 560]));
        assert_eq!(value["segmentation"]["peaks"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["refine"]["converged"], true);
        assert!(value["refine"]["movements"].is_array());

        let err = segment_file(
            &dir.join("signal.csv"),
            1,
            &dir.join("missing.json"),
            &settings(),
        )
        .expect_err("missing regimes file");
        assert_eq!(err.code(), "io_error");

        fs::remove_dir_all(&dir).expect("scratch dir should be removable");
    }
}
