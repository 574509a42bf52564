use futures::future::join_all;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::IngestError;
use crate::file_utils::FileManager;
use crate::resolution;
use crate::tools::ToolContext;

use super::{Operation, OperationOptions};

/// Outcome of one proxy image
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    pub plate: PathBuf,
    pub proxy: PathBuf,
    pub result: Result<(), String>,
}

/// Per-plate proxy outcomes, in input order
#[derive(Debug, Clone, Default)]
pub struct ProxyReport {
    pub records: Vec<ProxyRecord>,
}

impl ProxyReport {
    pub fn generated_count(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.len() - self.generated_count()
    }

    pub fn first_error(&self) -> Option<String> {
        self.records.iter().find_map(|r| r.result.as_ref().err().cloned())
    }
}

/// Generates one downsampled proxy per copied plate
#[derive(Debug, Clone)]
pub struct ProxyStage {
    /// Target `WxH`
    resolution: String,
    /// Output extension without the dot
    format: String,
}

impl ProxyStage {
    pub fn new(resolution: &str, format: &str) -> Self {
        Self {
            resolution: resolution.to_string(),
            format: format.trim_start_matches('.').to_string(),
        }
    }

    /// Proxy location for a plate: resolution token swapped, extension replaced
    pub fn proxy_path(&self, plate: &Path, proxy_dir: &Path) -> PathBuf {
        let file_name = plate.file_name().unwrap_or_default().to_string_lossy();
        let renamed = resolution::replace_token(&file_name, &self.resolution);
        FileManager::with_extension_in(renamed, proxy_dir, &self.format)
    }

    /// Resize every plate into `proxy_dir`
    ///
    /// The directory must be creatable; once it exists, individual tool failures are
    /// recorded and the remaining plates are still processed.
    pub async fn run(&self, ctx: &ToolContext, plates: &[PathBuf], proxy_dir: &Path) -> Result<ProxyReport, IngestError> {
        tokio::fs::create_dir_all(proxy_dir).await?;

        let options = Arc::new(OperationOptions {
            resolution: self.resolution.clone(),
            ..Default::default()
        });

        let handles: Vec<_> = plates
            .iter()
            .map(|plate| {
                let plate = plate.clone();
                let proxy = self.proxy_path(&plate, proxy_dir);
                let options = Arc::clone(&options);
                let ctx = ctx.clone();

                tokio::spawn(async move {
                    let result = Operation::ProxyGenerate
                        .execute(&ctx, &plate, &proxy, &options)
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string());

                    match &result {
                        Ok(()) => info!("Generated proxy: {}", proxy.display()),
                        Err(message) => warn!("Proxy failed for {}: {}", plate.display(), message),
                    }

                    ProxyRecord { plate, proxy, result }
                })
            })
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => error!("Proxy task panicked: {}", e),
            }
        }

        let report = ProxyReport { records };
        info!(
            "Proxy stage finished: {} generated, {} failed",
            report.generated_count(),
            report.failed_count()
        );
        Ok(report)
    }
}
