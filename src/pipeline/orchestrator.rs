use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::app_config::{Config, JobOptions};
use crate::errors::IngestError;
use crate::mapping::MappingTable;
use crate::paths::{DestinationSet, PathResolver};
use crate::sequence::{FrameSequence, ScanResult};
use crate::stages::{CopyStage, MovieOutcome, MovieStage, ProxyStage};
use crate::tools::{ToolContext, ToolRunner};

use super::report::{ItemKind, ItemReport, RunReport, Stage};

/// Called once per finished item
pub type ProgressCallback = Arc<dyn Fn(&ItemReport) + Send + Sync>;

/// One unit of top-level work
enum WorkItem {
    File {
        source: PathBuf,
        destination: PathBuf,
    },
    Sequence {
        sequence: FrameSequence,
        destinations: Box<DestinationSet>,
    },
    /// Resolved, but no version folder could be reserved
    Unallocated { name: String, reason: String },
}

impl WorkItem {
    fn name(&self) -> String {
        match self {
            WorkItem::File { source, .. } => source.file_name().unwrap_or_default().to_string_lossy().to_string(),
            WorkItem::Sequence { sequence, .. } => sequence.pattern(),
            WorkItem::Unallocated { name, .. } => name.clone(),
        }
    }

    fn kind(&self) -> ItemKind {
        match self {
            WorkItem::File { .. } => ItemKind::File,
            _ => ItemKind::Sequence,
        }
    }
}

/// Shared state handed to every item task
#[derive(Clone)]
struct ItemContext {
    config: Arc<Config>,
    job: Arc<JobOptions>,
    tools: ToolContext,
    copy_stage: CopyStage,
}

/// Runs scanned files and sequences through copy, proxy and movie stages
pub struct IngestPipeline {
    config: Arc<Config>,
    job: Arc<JobOptions>,
    tools: ToolContext,
    progress: Option<ProgressCallback>,
}

impl IngestPipeline {
    pub fn new(config: Config, job: JobOptions, runner: Arc<dyn ToolRunner>) -> Self {
        let tools = ToolContext::new(runner, config.tools.clone());
        Self {
            config: Arc::new(config),
            job: Arc::new(job),
            tools,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn job(&self) -> &JobOptions {
        &self.job
    }

    /// Ingest everything the scanner found
    ///
    /// Mapping resolution runs for every sequence before any file is copied; a failure
    /// there aborts the run with an error. Later failures are isolated per item and
    /// reported in the returned `RunReport`.
    pub async fn run(&self, scan: ScanResult) -> Result<RunReport, IngestError> {
        let start_time = Instant::now();
        let items = self.plan(scan)?;
        info!("Processing {} items", items.len());

        let copy_pool = Arc::new(Semaphore::new(self.config.pipeline.worker_count()));
        let ctx = ItemContext {
            config: Arc::clone(&self.config),
            job: Arc::clone(&self.job),
            tools: self.tools.clone(),
            copy_stage: CopyStage::new(copy_pool, self.job.overwrite),
        };

        let mut results = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| {
                let ctx = ctx.clone();
                let progress = self.progress.clone();
                let name = item.name();
                let kind = item.kind();

                async move {
                    let report = match tokio::spawn(process_item(ctx, item)).await {
                        Ok(report) => report,
                        Err(e) => {
                            error!("Item {} aborted: {}", name, e);
                            ItemReport::failed(name, kind, Stage::Copy, format!("task aborted: {}", e))
                        }
                    };

                    if let Some(callback) = &progress {
                        callback(&report);
                    }
                    (index, report)
                }
            })
            .buffer_unordered(self.config.pipeline.item_concurrency())
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let report = RunReport::new(
            results.into_iter().map(|(_, report)| report).collect(),
            start_time.elapsed(),
        );
        info!("{}", report.summary());
        Ok(report)
    }

    // Resolve every destination up front; only mapping and template failures are fatal
    fn plan(&self, scan: ScanResult) -> Result<Vec<WorkItem>, IngestError> {
        let mapping = if scan.sequences.is_empty() {
            MappingTable::default()
        } else {
            MappingTable::load(&self.job.csv_path)?
        };
        let resolver = PathResolver::new(&self.config, &self.job, &mapping);

        let resolved = scan
            .sequences
            .iter()
            .map(|sequence| resolver.resolve_shot(sequence))
            .collect::<Result<Vec<_>, _>>()?;

        // Fatal path errors must surface before any version folder is reserved
        let delivery = if scan.files.is_empty() {
            None
        } else {
            Some(resolver.delivery_dir()?)
        };

        let mut items = Vec::with_capacity(scan.sequences.len() + scan.files.len());
        for (sequence, shot) in scan.sequences.into_iter().zip(resolved) {
            match resolver.allocate(&sequence, shot) {
                Ok(destinations) => items.push(WorkItem::Sequence {
                    sequence,
                    destinations: Box::new(destinations),
                }),
                Err(e) => {
                    error!("Cannot allocate a version for {}: {}", sequence, e);
                    items.push(WorkItem::Unallocated {
                        name: sequence.pattern(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(delivery) = delivery {
            for source in scan.files {
                let destination = delivery.join(source.file_name().unwrap_or_default());
                items.push(WorkItem::File { source, destination });
            }
        }

        Ok(items)
    }
}

async fn process_item(ctx: ItemContext, item: WorkItem) -> ItemReport {
    let name = item.name();
    let kind = item.kind();

    let report = match item {
        WorkItem::File { source, destination } => process_file(&ctx, name, source, destination).await,
        WorkItem::Sequence { sequence, destinations } => process_sequence(&ctx, &sequence, *destinations).await,
        WorkItem::Unallocated { name, reason } => ItemReport::failed(name, kind, Stage::Resolve, reason),
    };

    if report.is_success() {
        info!("Finished {}", report.name);
    } else {
        warn!("Finished {} with status {:?}", report.name, report.status);
    }
    report
}

async fn process_file(ctx: &ItemContext, name: String, source: PathBuf, destination: PathBuf) -> ItemReport {
    let copy = ctx.copy_stage.run(&ctx.tools, vec![(source, destination)]).await;

    if let Some(reason) = copy.first_error() {
        return ItemReport::failed(name, ItemKind::File, Stage::Copy, reason);
    }

    let mut report = ItemReport::new(name, ItemKind::File);
    report.files_skipped = copy.skipped_count();
    report.files_copied = copy.copied_count() - report.files_skipped;
    report
}

async fn process_sequence(ctx: &ItemContext, sequence: &FrameSequence, destinations: DestinationSet) -> ItemReport {
    let name = sequence.pattern();
    let copy = ctx.copy_stage.run(&ctx.tools, destinations.copy_pairs()).await;
    let plates = copy.copied_paths();

    if plates.is_empty() {
        let reason = copy.first_error().unwrap_or_else(|| "no plates copied".to_string());
        return ItemReport::failed(name, ItemKind::Sequence, Stage::Copy, reason);
    }

    let mut report = ItemReport::new(name, ItemKind::Sequence);
    report.version = Some(destinations.version.clone());
    report.missing_frames = sequence.missing_frames();
    report.files_skipped = copy.skipped_count();
    report.files_copied = copy.copied_count() - report.files_skipped;

    if copy.failed_count() > 0 {
        report.record_failure(
            Stage::Copy,
            format!(
                "{} of {} plates failed: {}",
                copy.failed_count(),
                copy.records.len(),
                copy.first_error().unwrap_or_default()
            ),
        );
    }

    let job = &ctx.job;
    let proxy = async {
        if !job.use_proxy {
            return None;
        }
        let resolution = ctx.config.resolution_string(&job.resolution);
        let stage = ProxyStage::new(&resolution, &job.proxy_format);
        Some(stage.run(&ctx.tools, &plates, &destinations.proxy_dir).await)
    };

    let movie = async {
        if !job.mov {
            return None;
        }
        let first_plate = &plates[0];
        let start_frame = destinations
            .plates
            .iter()
            .find(|p| &p.destination == first_plate)
            .map(|p| p.frame)
            .unwrap_or(job.start_frame);
        let stage = MovieStage::new(job.vendor_label(), job.force);
        Some(
            stage
                .run(&ctx.tools, first_plate, start_frame, &destinations.movie_dir, &destinations.version)
                .await,
        )
    };

    let (proxy_result, movie_result) = if ctx.config.pipeline.parallel_post {
        tokio::join!(proxy, movie)
    } else {
        let proxy_result = proxy.await;
        (proxy_result, movie.await)
    };

    match proxy_result {
        Some(Ok(proxies)) => {
            report.proxies_generated = proxies.generated_count();
            if proxies.failed_count() > 0 {
                report.record_failure(
                    Stage::Proxy,
                    format!(
                        "{} of {} proxies failed: {}",
                        proxies.failed_count(),
                        proxies.records.len(),
                        proxies.first_error().unwrap_or_default()
                    ),
                );
            }
        }
        Some(Err(e)) => report.record_failure(Stage::Proxy, e.to_string()),
        None => {}
    }

    match movie_result {
        Some(MovieOutcome::Generated { movie, .. }) | Some(MovieOutcome::Skipped { movie }) => {
            report.movie = Some(movie);
        }
        Some(MovieOutcome::Failed { reason, .. }) => report.record_failure(Stage::Movie, reason),
        None => {}
    }

    report
}
