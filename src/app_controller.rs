use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, JobOptions};
use crate::file_utils::FileManager;
use crate::mapping::MappingTable;
use crate::paths::PathResolver;
use crate::pipeline::{IngestPipeline, ItemReport, ItemStatus, RunReport};
use crate::sequence::{ScanResult, SequenceScanner};
use crate::tools::{MockToolRunner, ProcessRunner, ToolRunner};

// @module: Application controller for ingest runs

/// Main application controller for vendor ingests
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Runs external tools
    runner: Arc<dyn ToolRunner>,
}

impl Controller {
    /// Create a controller with default configuration and a recording tool runner
    pub fn new_for_test() -> Result<Self> {
        Self::with_runner(Config::default(), Arc::new(MockToolRunner::working()))
    }

    // @method: Create a new controller that runs real tool binaries
    pub fn with_config(config: Config) -> Result<Self> {
        let runner = Arc::new(ProcessRunner::with_timeout_secs(config.tools.tool_timeout_secs));
        Self::with_runner(config, runner)
    }

    // @method: Create a new controller with an explicit tool runner
    pub fn with_runner(config: Config, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config, runner })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Input to scan: the explicit input, else the delivery folder built from the job
    pub fn resolve_input(&self, job: &JobOptions) -> Result<PathBuf> {
        if let Some(input) = &job.input {
            if !input.exists() {
                return Err(anyhow!("Input path does not exist: {:?}", input));
            }
            return Ok(input.clone());
        }

        let mapping = MappingTable::default();
        let resolver = PathResolver::new(&self.config, job, &mapping);
        let source = resolver.source_dir()?;
        if !FileManager::dir_exists(&source) {
            return Err(anyhow!("Delivery folder does not exist: {:?}", source));
        }
        info!("Using delivery folder {}", source.display());
        Ok(source)
    }

    /// Classify the input into standalone files and frame sequences
    pub fn scan(&self, job: &JobOptions, input: &Path) -> ScanResult {
        SequenceScanner::new()
            .with_hints(job.scene.clone(), job.shot.clone())
            .scan(&[input])
    }

    /// Run a full ingest for the job
    pub async fn run(&self, job: JobOptions) -> Result<RunReport> {
        job.validate()?;

        let input = self.resolve_input(&job)?;
        let scan = self.scan(&job, &input);
        if !scan.errors.is_empty() && scan.is_empty() {
            return Err(anyhow!("Nothing to ingest: {}", scan.errors[0]));
        }
        if scan.is_empty() {
            warn!("No files found in {}", input.display());
        }
        info!(
            "Found {} sequences and {} files in {}",
            scan.sequences.len(),
            scan.files.len(),
            input.display()
        );

        let total = (scan.sequences.len() + scan.files.len()) as u64;
        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} items ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Ingesting");

        let bar = progress_bar.clone();
        let pipeline = IngestPipeline::new(self.config.clone(), job, Arc::clone(&self.runner)).with_progress(Arc::new(
            move |item: &ItemReport| {
                bar.set_message(item.name.clone());
                bar.inc(1);
            },
        ));

        let report = pipeline.run(scan).await?;
        progress_bar.finish_with_message("Ingest complete");

        self.log_report(&report);
        Ok(report)
    }

    /// Human-readable listing of what an ingest would pick up
    pub fn scan_listing(&self, job: &JobOptions, input: &Path) -> Result<String> {
        let scan = self.scan(job, input);
        if let Some(err) = scan.errors.first() {
            return Err(anyhow!("{}", err));
        }

        let mut out = String::new();
        for sequence in &scan.sequences {
            writeln!(
                out,
                "{}  {}-{}  ({} frames)",
                sequence.pattern(),
                sequence.start,
                sequence.end,
                sequence.len()
            )?;
            let missing = sequence.missing_frames();
            if !missing.is_empty() {
                writeln!(out, "    missing: {:?}", missing)?;
            }
        }
        for file in &scan.files {
            writeln!(out, "{}", file.file_name().unwrap_or_default().to_string_lossy())?;
        }
        writeln!(out, "{} sequences, {} files", scan.sequences.len(), scan.files.len())?;
        Ok(out)
    }

    fn log_report(&self, report: &RunReport) {
        for item in &report.items {
            match &item.status {
                ItemStatus::Succeeded => info!("{}: ok", item.name),
                ItemStatus::Partial { failures } => {
                    for failure in failures {
                        warn!("{}: {} failed: {}", item.name, failure.stage, failure.reason);
                    }
                }
                ItemStatus::Failed { stage, reason } => error!("{}: failed at {}: {}", item.name, stage, reason),
            }
        }
        info!("{} - Duration: {}", report.summary(), Self::format_duration(report.duration));
    }

    /// Format a duration as `1h 2m 3s`, `2m 3s` or `3.141s`
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
