// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagegate triage — sort rendered document pages by template compliance.
//
// Entry point. Parses arguments, initialises logging, evaluates every input on
// a rayon pool, copies the compliant documents, and writes the JSON report.

mod discover;
mod integrity;
mod report;
mod triage;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pagegate_core::error::PagegateError;
use pagegate_core::{ComplianceConfig, Profile};
use tracing::{error, info};

use report::{DEFAULT_REPORT_NAME, TriageReport};

/// Evaluate scanned or rendered document pages against the two-rule template
/// and copy the compliant ones into an output directory.
#[derive(Parser, Debug)]
#[command(name = "pagegate-triage")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input files (PDF, PNG, JPEG, TIFF, BMP) or directories to walk
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory that receives the compliant documents
    #[arg(short, long)]
    output: PathBuf,

    /// Threshold profile
    #[arg(long, value_enum, default_value_t = ProfileArg::Strict)]
    profile: ProfileArg,

    /// JSON file of threshold overrides applied on top of the profile
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report path (default: <output>/triage-report.json)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Pages evaluated per PDF; a document passes if any of them passes (0 = all)
    #[arg(long, default_value = "1")]
    max_pages: u32,

    /// Worker threads (default: one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Evaluate and report, but copy nothing
    #[arg(long)]
    dry_run: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Strict,
    Legacy,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Strict => Profile::Strict,
            ProfileArg::Legacy => Profile::Legacy,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(report) => {
            let totals = &report.totals;
            println!(
                "{} documents: {} passed, {} failed, {} errors; {} copied, {} duplicates",
                totals.documents,
                totals.passed,
                totals.failed,
                totals.errors,
                totals.copied,
                totals.duplicates
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "Triage aborted");
            ExitCode::from(2)
        }
    }
}

fn load_config(args: &Args) -> Result<ComplianceConfig, PagegateError> {
    let base = ComplianceConfig::for_profile(args.profile.into());
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            base.with_overrides(&text)
        }
        None => Ok(base),
    }
}

fn run(args: &Args) -> Result<TriageReport, PagegateError> {
    let profile: Profile = args.profile.into();
    let config = load_config(args)?;
    info!(
        profile = profile.name(),
        config_file = ?args.config,
        "Pagegate triage starting"
    );

    let paths = discover::discover(&args.inputs, Some(&args.output))?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool
        .build()
        .map_err(|err| PagegateError::InvalidConfig(format!("cannot start worker pool: {err}")))?;
    let mut outcomes = pool.install(|| triage::evaluate_all(&paths, &config, args.max_pages));

    triage::copy_passing(&mut outcomes, &args.output, args.dry_run)?;

    let report = TriageReport::new(
        profile,
        args.config.clone(),
        config,
        args.max_pages,
        args.dry_run,
        outcomes,
    );
    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| args.output.join(DEFAULT_REPORT_NAME));
    report.write(&report_path)?;
    Ok(report)
}
