use anyhow::{Context, Result};
use filetime::FileTime;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::IngestError;

// @module: File and directory utilities

/// Result of a verified copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyResult {
    /// Data was copied; `verified` is false when the sizes differ afterwards
    Copied { bytes: u64, verified: bool },
    /// Destination already present and non-empty
    Skipped,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Size in bytes, 0 when the file is missing
    pub fn file_size<P: AsRef<Path>>(path: P) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    /// Whether an existing copy can be kept: destination present and both sides non-empty
    pub fn should_skip_copy<P1: AsRef<Path>, P2: AsRef<Path>>(src: P1, dst: P2, overwrite: bool) -> bool {
        !overwrite
            && dst.as_ref().exists()
            && Self::file_size(dst.as_ref()) > 0
            && Self::file_size(src.as_ref()) > 0
    }

    /// Copy a file with its permissions and modification time, then compare sizes.
    ///
    /// Missing parent directories are created. A size mismatch is reported through
    /// `CopyResult::Copied { verified: false, .. }`, not as an error.
    pub fn copy_verified<P1: AsRef<Path>, P2: AsRef<Path>>(
        src: P1,
        dst: P2,
        overwrite: bool,
    ) -> Result<CopyResult, IngestError> {
        let src = src.as_ref();
        let dst = dst.as_ref();
        let copy_error = |message: String| IngestError::Copy {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            message,
        };

        if !src.is_file() {
            return Err(copy_error("source file does not exist".to_string()));
        }

        if Self::should_skip_copy(src, dst, overwrite) {
            return Ok(CopyResult::Skipped);
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| copy_error(e.to_string()))?;
        }

        // fs::copy carries permissions; timestamps are restored separately
        let bytes = fs::copy(src, dst).map_err(|e| copy_error(e.to_string()))?;
        if let Ok(metadata) = fs::metadata(src) {
            let mtime = FileTime::from_last_modification_time(&metadata);
            let atime = FileTime::from_last_access_time(&metadata);
            if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
                warn!("Could not carry timestamps over to {:?}: {}", dst, e);
            }
        }

        let verified = Self::file_size(src) == Self::file_size(dst);
        Ok(CopyResult::Copied { bytes, verified })
    }

    /// Swap the extension of a file name and place it in `dir`
    pub fn with_extension_in<P1: AsRef<Path>, P2: AsRef<Path>>(file_name: P1, dir: P2, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        dir.as_ref().join(file_name.as_ref().with_extension(extension))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
