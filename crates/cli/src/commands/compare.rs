//! Compare two run records

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use synthmon_common::{codec, keys, PropertyStore};
use synthmon_diff::{CompareEngine, CompareOptions, DiffReport, DiffResult, Style};
use synthmon_runner::MonitorConfig;
use tracing::{debug, info};

use crate::output::print_json;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Baseline record (.xml, .msgpack or .bin)
    pub baseline: PathBuf,

    /// Candidate record
    pub candidate: PathBuf,

    /// Report style: markdown, ansi or plain
    #[arg(long)]
    pub style: Option<Style>,

    /// Output the differences as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with status 1 when the records differ
    #[arg(long)]
    pub fail_on_diff: bool,

    /// Report heading
    #[arg(long)]
    pub title: Option<String>,

    /// Ignore duration changes up to this many milliseconds
    #[arg(long)]
    pub tolerance_ms: Option<u64>,
}

impl CompareArgs {
    fn options(&self, config: &MonitorConfig) -> CompareOptions {
        CompareOptions {
            duration_tolerance: self
                .tolerance_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.compare.duration_tolerance()),
            ignore_durations: config.compare.ignore_durations,
        }
    }

    fn metadata(&self, config: &MonitorConfig) -> PropertyStore {
        let mut metadata = PropertyStore::new();
        if let Some(title) = self.title.as_ref().or(config.report.title.as_ref()) {
            metadata.set(keys::REPORT_TITLE, title.as_str());
        }
        metadata.set(keys::REPORT_BASELINE, self.baseline.display().to_string());
        metadata.set(keys::REPORT_CANDIDATE, self.candidate.display().to_string());
        metadata
    }
}

/// Decode both files and compare them
pub fn compare_files(
    baseline: &Path,
    candidate: &Path,
    options: CompareOptions,
) -> anyhow::Result<DiffResult> {
    let a = codec::read_file(baseline)
        .with_context(|| format!("Failed to read baseline {}", baseline.display()))?;
    let b = codec::read_file(candidate)
        .with_context(|| format!("Failed to read candidate {}", candidate.display()))?;

    debug!("Comparing run {} with run {}", a.id(), b.id());
    Ok(CompareEngine::with_options(options).compare(&a, &b))
}

/// Returns whether the records differ
pub fn execute(args: CompareArgs, config: &MonitorConfig) -> anyhow::Result<bool> {
    let result = compare_files(&args.baseline, &args.candidate, args.options(config))?;
    info!("{} difference(s) found", result.len());

    if args.json {
        print_json(&result)?;
    } else {
        let style = args.style.unwrap_or(config.report.style);
        let report = DiffReport::new(&result).with_metadata(args.metadata(config));
        print!("{}", report.render(style));
    }

    Ok(!result.is_empty())
}
