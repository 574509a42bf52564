/*!
 * Common test utilities for the platekeeper test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use platekeeper::app_config::{Config, JobOptions, PipelineSettings};

/// Mapping row used by most fixtures: scene 048, shot 0140
pub const MAPPING_ROW: &str = "048/0140,sc48_sh0140,plate_bg_v001";

/// Route library logs through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates `<base><sep><frame:0pad>.<ext>` for every frame in the range
pub fn create_frames(dir: &Path, base: &str, ext: &str, frames: impl IntoIterator<Item = u32>) -> Result<Vec<PathBuf>> {
    frames
        .into_iter()
        .map(|frame| create_test_file(dir, &format!("{}_{:04}.{}", base, frame, ext), &format!("frame {}", frame)))
        .collect()
}

/// Writes a mapping table with the given rows
pub fn create_mapping(dir: &Path, rows: &[&str]) -> Result<PathBuf> {
    create_test_file(dir, "shots.csv", &format!("{}\n", rows.join("\n")))
}

/// Config with a small fixed worker pool so tests do not depend on the host
pub fn test_config() -> Config {
    Config {
        pipeline: PipelineSettings {
            max_workers: Some(4),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Job reading `input`, publishing under `output`, with the scene/shot hints of `MAPPING_ROW`
pub fn test_job(input: &Path, output: &Path, csv_path: &Path) -> JobOptions {
    JobOptions::new("gen63", output, csv_path)
        .with_input(input)
        .with_vendor("from_da")
        .with_scene_shot("048", "0140")
}

/// Sorted file names inside a directory
pub fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}
