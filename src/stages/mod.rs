/*!
 * Pipeline stages.
 *
 * Every unit of work is an `Operation` executed on one input and one output:
 * - `Operation::Copy`: verified copy of a plate or standalone file
 * - `Operation::ProxyGenerate`: resize one plate into a review proxy
 * - `Operation::MovieGenerate`: compose a review movie from a frame pattern
 *
 * The stage modules fan operations out over many files and collect per-file outcomes.
 */

pub mod copy;
pub mod movie;
pub mod proxy;

pub use copy::{CopyRecord, CopyReport, CopyStage};
pub use movie::{MovieOutcome, MovieStage};
pub use proxy::{ProxyRecord, ProxyReport, ProxyStage};

use log::{error, info, warn};
use serde::Serialize;
use std::path::Path;

use crate::errors::{IngestError, ToolError};
use crate::file_utils::{CopyResult, FileManager};
use crate::tools::{ToolContext, ToolInvocation};

/// The kinds of work an ingest run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Copy,
    ProxyGenerate,
    MovieGenerate,
}

/// Parameters shared by all operations; each operation reads the fields it needs
#[derive(Debug, Clone)]
pub struct OperationOptions {
    /// Copy: replace existing destinations
    pub overwrite: bool,
    /// Proxy: target `WxH`
    pub resolution: String,
    /// Movie: vendor burn-in
    pub vendor: String,
    /// Movie: first frame of the pattern
    pub start_frame: u32,
    /// Movie: version burn-in used when the file name carries none
    pub version: String,
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            resolution: "2048x1080".to_string(),
            vendor: String::new(),
            start_frame: 1001,
            version: String::new(),
        }
    }
}

/// What an operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Copy finished; `verified` is false on size mismatch
    Copied { bytes: u64, verified: bool },
    /// Nothing to do, output already present
    Skipped,
    /// Output produced by the named tool
    Generated { tool: String },
}

/// Record handed to the movie-composition collaborator
#[derive(Debug, Clone, Serialize)]
pub struct MovieRecord {
    pub input: String,
    pub output: String,
    #[serde(rename = "topleft")]
    pub top_left: String,
    #[serde(rename = "topcenter")]
    pub top_center: String,
    #[serde(rename = "bottomleft")]
    pub bottom_left: String,
}

impl Operation {
    /// Run this operation on one input/output pair
    pub async fn execute(
        self,
        ctx: &ToolContext,
        input: &Path,
        output: &Path,
        options: &OperationOptions,
    ) -> Result<OperationOutcome, IngestError> {
        match self {
            Operation::Copy => copy(input, output, options.overwrite).await,
            Operation::ProxyGenerate => proxy(ctx, input, output, &options.resolution).await,
            Operation::MovieGenerate => movie(ctx, input, output, options).await,
        }
    }
}

async fn copy(input: &Path, output: &Path, overwrite: bool) -> Result<OperationOutcome, IngestError> {
    let src = input.to_path_buf();
    let dst = output.to_path_buf();

    let result = tokio::task::spawn_blocking(move || FileManager::copy_verified(&src, &dst, overwrite))
        .await
        .map_err(|e| IngestError::Copy {
            src: input.to_path_buf(),
            dst: output.to_path_buf(),
            message: format!("copy task aborted: {}", e),
        })??;

    let file_name = input.file_name().unwrap_or_default().to_string_lossy();
    match result {
        CopyResult::Skipped => {
            info!("Skipped copy (already exists): {}", output.file_name().unwrap_or_default().to_string_lossy());
            Ok(OperationOutcome::Skipped)
        }
        CopyResult::Copied { bytes, verified: true } => {
            info!("Copied file: {} to {} (size validated)", file_name, output.display());
            Ok(OperationOutcome::Copied { bytes, verified: true })
        }
        CopyResult::Copied { bytes, verified: false } => {
            warn!(
                "Size mismatch for {} -> {}: src={}, dst={}",
                input.display(),
                output.display(),
                FileManager::file_size(input),
                FileManager::file_size(output)
            );
            Ok(OperationOutcome::Copied { bytes, verified: false })
        }
    }
}

async fn proxy(ctx: &ToolContext, input: &Path, output: &Path, resolution: &str) -> Result<OperationOutcome, IngestError> {
    let invocation = ToolInvocation::new(&ctx.tools.resize)
        .arg(input.to_string_lossy())
        .args(["--resize", resolution, "-o"])
        .arg(output.to_string_lossy());

    ctx.runner.run(&invocation).await?;
    Ok(OperationOutcome::Generated {
        tool: ctx.tools.resize.clone(),
    })
}

/// Primary composition, then the transcoder fallback
async fn movie(ctx: &ToolContext, pattern: &Path, output: &Path, options: &OperationOptions) -> Result<OperationOutcome, IngestError> {
    let primary = match &ctx.tools.composer {
        Some(composer) => {
            let record = movie_record(pattern, output, options);
            match serde_json::to_string(&record) {
                Ok(json) => {
                    let invocation = ToolInvocation::new(composer).args(["--data".to_string(), json]);
                    ctx.runner.run(&invocation).await.map(|_| composer.clone())
                }
                Err(e) => Err(ToolError::Launch {
                    tool: composer.clone(),
                    message: e.to_string(),
                }),
            }
        }
        None => Err(ToolError::NotConfigured("movie composer".to_string())),
    };

    match primary {
        Ok(tool) => {
            info!("Generated movie with {}: {}", tool, output.display());
            return Ok(OperationOutcome::Generated { tool });
        }
        Err(e) => {
            warn!("Movie composition failed: {}", e);
            info!("Falling back to {}...", ctx.tools.transcoder);
        }
    }

    let fallback = ToolInvocation::new(&ctx.tools.transcoder)
        .args(["-framerate", "24", "-start_number"])
        .arg(options.start_frame.to_string())
        .arg("-i")
        .arg(pattern.to_string_lossy())
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-y"])
        .arg(output.to_string_lossy());

    match ctx.runner.run(&fallback).await {
        Ok(_) => {
            info!("Successfully generated movie using {}: {}", ctx.tools.transcoder, output.display());
            Ok(OperationOutcome::Generated {
                tool: ctx.tools.transcoder.clone(),
            })
        }
        Err(e) => {
            error!("{} failed to generate movie: {}", ctx.tools.transcoder, e);
            Err(e.into())
        }
    }
}

/// Burn-in fields: vendor, show code from the first name token, version from the name
pub fn movie_record(pattern: &Path, output: &Path, options: &OperationOptions) -> MovieRecord {
    let file_name = pattern.file_name().unwrap_or_default().to_string_lossy().to_string();
    let stem = Path::new(&file_name).file_stem().unwrap_or_default().to_string_lossy().to_string();
    let tokens: Vec<&str> = stem.split('_').collect();

    let show_code = tokens.first().copied().unwrap_or_default().to_string();
    let version = tokens
        .iter()
        .rev()
        .find(|t| t.len() > 1 && t.starts_with('v') && t[1..].chars().all(|c| c.is_ascii_digit()))
        .map(|t| t.to_string())
        .unwrap_or_else(|| options.version.clone());

    MovieRecord {
        input: pattern.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        top_left: options.vendor.clone(),
        top_center: show_code,
        bottom_left: version,
    }
}
