// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use pwl_cli::{CliError, RunSettings, load_protocol, process_manifest, segment_file};
use pwl_preprocess::PrepConfig;
use pwl_protocol::{TestProtocol, loading_protocol};
use pwl_segment::{LocalizeConfig, PipelineConfig, RefineConfig};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pwlsplit",
    version,
    about = "Split mechanical test records into piecewise-linear protocol phases"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment and label every record listed in one or more specimen manifests
    Run(RunArgs),
    /// Segment a single signal column against a flat regime list
    Segment(SegmentArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Gaussian smoothing sigma, in samples
    #[arg(long, default_value_t = 20.0)]
    sigma: f64,

    /// Minimum prominence of a curvature extremum
    #[arg(long, default_value_t = 0.2)]
    prominence: f64,

    /// Minimum height of a curvature extremum
    #[arg(long, default_value_t = 0.1)]
    min_height: f64,

    /// Scale each curvature search by the boundary's expected magnitude
    #[arg(long, action = ArgAction::SetTrue)]
    normalize_by_peak: bool,

    /// Initial refinement half-window, in samples
    #[arg(long, default_value_t = 50)]
    window: usize,

    /// Maximum refinement sweeps
    #[arg(long, default_value_t = 100)]
    max_iter: usize,

    /// Sub-sampling stride of the refinement objective
    #[arg(long, default_value_t = 25)]
    stride: usize,
}

impl EngineArgs {
    fn settings(&self, write_diagnostics: bool) -> RunSettings {
        RunSettings {
            prep: PrepConfig {
                sigma: self.sigma,
                ..PrepConfig::default()
            },
            pipeline: PipelineConfig {
                localize: LocalizeConfig {
                    prominence: self.prominence,
                    min_height: self.min_height,
                    normalize_by_peak: self.normalize_by_peak,
                },
                refine: RefineConfig {
                    window: self.window,
                    max_iter: self.max_iter,
                    stride: self.stride,
                },
                ..PipelineConfig::default()
            },
            write_diagnostics,
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Specimen manifests: {"axis": {"rate": "data.csv"}}
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    manifests: Vec<PathBuf>,

    /// Peak strain of the built-in loading protocol
    #[arg(long, default_value_t = 0.3)]
    max_strain: f64,

    /// Protocol JSON file replacing the built-in protocol
    #[arg(long, value_hint = ValueHint::FilePath)]
    protocol: Option<PathBuf>,

    /// Also write <stem>_diagnostics.json next to each labeled CSV
    #[arg(long, action = ArgAction::SetTrue)]
    diagnostics: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct SegmentArgs {
    /// Headed CSV holding the signal
    #[arg(value_hint = ValueHint::FilePath)]
    signal: PathBuf,

    /// JSON array of regime descriptors
    #[arg(long, value_hint = ValueHint::FilePath)]
    regimes: PathBuf,

    /// Zero-based CSV column of the signal
    #[arg(long, default_value_t = 0)]
    column: usize,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli.command) {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Run(args) => handle_run(args),
        Command::Segment(args) => handle_segment(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), CliError> {
    let protocol = match &args.protocol {
        Some(path) => load_protocol(path)?,
        None => built_in_protocol(args.max_strain)?,
    };
    let settings = args.engine.settings(args.diagnostics);
    for manifest in &args.manifests {
        let processed = process_manifest(manifest, &protocol, &settings)?;
        info!(manifest = %manifest.display(), records = processed.len(), "manifest done");
    }
    Ok(())
}

fn built_in_protocol(max_strain: f64) -> Result<TestProtocol, CliError> {
    if !max_strain.is_finite() || max_strain <= 0.0 {
        return Err(CliError::invalid_input(format!(
            "--max-strain must be finite and > 0; got {max_strain}"
        )));
    }
    Ok(loading_protocol(max_strain))
}

fn handle_segment(args: SegmentArgs) -> Result<(), CliError> {
    let report = segment_file(
        &args.signal,
        args.column,
        &args.regimes,
        &args.engine.settings(false),
    )?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|source| CliError::json("failed to encode segmentation", source))?;
    println!("{json}");
    Ok(())
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, built_in_protocol};
    use clap::Parser;

    #[test]
    fn run_flags_map_onto_engine_settings() {
        let cli = Cli::try_parse_from([
            "pwlsplit",
            "run",
            "a.json",
            "b.json",
            "--window",
            "10",
            "--stride",
            "1",
            "--sigma",
            "5",
            "--diagnostics",
        ])
        .expect("valid arguments");
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.manifests.len(), 2);
        assert_eq!(args.max_strain, 0.3);
        let settings = args.engine.settings(args.diagnostics);
        assert!(settings.write_diagnostics);
        assert_eq!(settings.prep.sigma, 5.0);
        assert_eq!(settings.pipeline.refine.window, 10);
        assert_eq!(settings.pipeline.refine.stride, 1);
        assert_eq!(settings.pipeline.refine.max_iter, 100);
        assert_eq!(settings.pipeline.localize.prominence, 0.2);
    }

    #[test]
    fn segment_requires_regimes() {
        assert!(Cli::try_parse_from(["pwlsplit", "segment", "x.csv"]).is_err());
        let cli = Cli::try_parse_from([
            "pwlsplit", "segment", "x.csv", "--regimes", "r.json", "--column", "1", "-v",
        ])
        .expect("valid arguments");
        assert!(cli.verbose);
        let Command::Segment(args) = cli.command else {
            panic!("expected segment subcommand");
        };
        assert_eq!(args.column, 1);
    }

    #[test]
    fn max_strain_must_be_positive() {
        assert!(built_in_protocol(0.0).is_err());
        assert_eq!(
            built_in_protocol(0.3).expect("positive strain").n_regimes(),
            55
        );
    }
}
