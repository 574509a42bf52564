use futures::future::join_all;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::tools::ToolContext;

use super::{Operation, OperationOptions, OperationOutcome};

/// Outcome of one source → destination copy
#[derive(Debug, Clone)]
pub struct CopyRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub result: Result<OperationOutcome, String>,
}

impl CopyRecord {
    /// Copied or already present at the destination
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Copied, but the sizes disagree afterwards
    pub fn is_unverified(&self) -> bool {
        matches!(self.result, Ok(OperationOutcome::Copied { verified: false, .. }))
    }
}

/// Per-file copy outcomes, in input order
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    pub records: Vec<CopyRecord>,
}

impl CopyReport {
    /// Destinations that hold a plate after the stage, copied now or skipped as present
    pub fn copied_paths(&self) -> Vec<PathBuf> {
        self.records
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.destination.clone())
            .collect()
    }

    pub fn copied_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.len() - self.copied_count()
    }

    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.result, Ok(OperationOutcome::Skipped)))
            .count()
    }

    pub fn bytes_copied(&self) -> u64 {
        self.records
            .iter()
            .map(|r| match r.result {
                Ok(OperationOutcome::Copied { bytes, .. }) => bytes,
                _ => 0,
            })
            .sum()
    }

    /// First failure message, if any
    pub fn first_error(&self) -> Option<String> {
        self.records.iter().find_map(|r| r.result.as_ref().err().cloned())
    }
}

/// Copies many files through a bounded worker pool
///
/// The semaphore is shared by every item of a run, so the pool bounds total
/// concurrent copies, not copies per item.
#[derive(Debug, Clone)]
pub struct CopyStage {
    workers: Arc<Semaphore>,
    overwrite: bool,
}

impl CopyStage {
    pub fn new(workers: Arc<Semaphore>, overwrite: bool) -> Self {
        Self { workers, overwrite }
    }

    /// A stage with its own pool of `size` workers
    pub fn with_pool_size(size: usize, overwrite: bool) -> Self {
        Self::new(Arc::new(Semaphore::new(size.max(1))), overwrite)
    }

    /// Copy every pair; one failed file never stops its siblings
    pub async fn run(&self, ctx: &ToolContext, pairs: Vec<(PathBuf, PathBuf)>) -> CopyReport {
        let options = Arc::new(OperationOptions {
            overwrite: self.overwrite,
            ..Default::default()
        });

        let handles: Vec<_> = pairs
            .into_iter()
            .map(|(source, destination)| {
                let workers = Arc::clone(&self.workers);
                let options = Arc::clone(&options);
                let ctx = ctx.clone();

                tokio::spawn(async move {
                    let result = match workers.acquire_owned().await {
                        Ok(_permit) => Operation::Copy
                            .execute(&ctx, &source, &destination, &options)
                            .await
                            .map_err(|e| e.to_string()),
                        Err(e) => Err(format!("copy pool closed: {}", e)),
                    };

                    if let Err(message) = &result {
                        error!("Copy failed for {}: {}", source.display(), message);
                    }

                    CopyRecord {
                        source,
                        destination,
                        result,
                    }
                })
            })
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => error!("Copy task panicked: {}", e),
            }
        }

        let report = CopyReport { records };
        info!(
            "Copy stage finished: {} ok ({} skipped), {} failed",
            report.copied_count(),
            report.skipped_count(),
            report.failed_count()
        );
        report
    }
}
