use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::errors::IngestError;

static VERSION_DIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^v(\d{3,})$").expect("valid version regex"));

// Attempts before giving up on a contended directory
const MAX_RESERVE_ATTEMPTS: u32 = 32;

/// `v001` style folder name
pub fn format_version(number: u32) -> String {
    format!("v{:03}", number)
}

/// Parse a `vNNN` folder name
pub fn parse_version(name: &str) -> Option<u32> {
    VERSION_DIR.captures(name).and_then(|caps| caps[1].parse().ok())
}

/// Highest existing version among the immediate children of `dir`, plus one.
///
/// Gaps are tolerated; a missing or empty directory yields 1.
pub fn next_version(dir: &Path) -> u32 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 1;
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| parse_version(&entry.file_name().to_string_lossy()))
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}

/// Allocate and reserve the next version folder under `dir`.
///
/// The folder is created with create-exclusive semantics so two runs that read the same
/// maximum cannot both claim it; the loser moves on to the following number.
pub fn reserve_next_version(dir: &Path) -> Result<String, IngestError> {
    fs::create_dir_all(dir).map_err(|e| IngestError::Version {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut candidate = next_version(dir);
    for _ in 0..MAX_RESERVE_ATTEMPTS {
        let name = format_version(candidate);
        match fs::create_dir(dir.join(&name)) {
            Ok(()) => {
                debug!("Reserved version {} under {:?}", name, dir);
                return Ok(name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!("Version {} under {:?} was claimed concurrently, retrying", name, dir);
                candidate = next_version(dir).max(candidate + 1);
            }
            Err(e) => {
                return Err(IngestError::Version {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    Err(IngestError::Version {
        path: dir.to_path_buf(),
        message: format!("no free version after {} attempts", MAX_RESERVE_ATTEMPTS),
    })
}
