use log::{error, info};
use std::path::{Path, PathBuf};

use crate::tools::ToolContext;

use super::{Operation, OperationOptions, OperationOutcome};

/// What the movie stage did for one sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieOutcome {
    /// Movie already present and not forced
    Skipped { movie: PathBuf },
    /// Written by the named tool
    Generated { movie: PathBuf, tool: String },
    /// Primary and fallback both failed
    Failed { movie: PathBuf, reason: String },
}

impl MovieOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, MovieOutcome::Failed { .. })
    }
}

/// Assembles one review movie per sequence from its copied plates
#[derive(Debug, Clone)]
pub struct MovieStage {
    vendor: String,
    force: bool,
}

impl MovieStage {
    pub fn new(vendor: &str, force: bool) -> Self {
        Self {
            vendor: vendor.to_string(),
            force,
        }
    }

    /// Frame pattern for a plate: the `_<start:04>` token becomes `_%04d`
    pub fn frame_pattern(first_plate: &Path, start_frame: u32) -> PathBuf {
        let file_name = first_plate.file_name().unwrap_or_default().to_string_lossy();
        let literal = format!("_{:04}", start_frame);
        let patterned = match file_name.rfind(&literal) {
            Some(pos) => format!("{}_%04d{}", &file_name[..pos], &file_name[pos + literal.len()..]),
            None => file_name.to_string(),
        };
        first_plate.with_file_name(patterned)
    }

    /// `<plate stem without frame token>.mov` inside `movie_dir`
    pub fn movie_path(first_plate: &Path, start_frame: u32, movie_dir: &Path) -> PathBuf {
        let stem = first_plate.file_stem().unwrap_or_default().to_string_lossy();
        let literal = format!("_{:04}", start_frame);
        let name = stem.strip_suffix(&literal).unwrap_or(&stem);
        movie_dir.join(format!("{}.mov", name))
    }

    /// Build the movie for the sequence whose first copied plate is `first_plate`
    pub async fn run(
        &self,
        ctx: &ToolContext,
        first_plate: &Path,
        start_frame: u32,
        movie_dir: &Path,
        version: &str,
    ) -> MovieOutcome {
        let movie = Self::movie_path(first_plate, start_frame, movie_dir);

        if movie.exists() && !self.force {
            info!("Movie already exists, skipping: {}", movie.display());
            return MovieOutcome::Skipped { movie };
        }

        if let Err(e) = tokio::fs::create_dir_all(movie_dir).await {
            error!("Cannot create movie directory {}: {}", movie_dir.display(), e);
            return MovieOutcome::Failed {
                movie,
                reason: e.to_string(),
            };
        }

        let pattern = Self::frame_pattern(first_plate, start_frame);
        let options = OperationOptions {
            vendor: self.vendor.clone(),
            start_frame,
            version: version.to_string(),
            ..Default::default()
        };

        match Operation::MovieGenerate.execute(ctx, &pattern, &movie, &options).await {
            Ok(OperationOutcome::Generated { tool }) => MovieOutcome::Generated { movie, tool },
            Ok(_) => MovieOutcome::Skipped { movie },
            Err(e) => MovieOutcome::Failed {
                movie,
                reason: e.to_string(),
            },
        }
    }
}
