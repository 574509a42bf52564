use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::ScanError;
use crate::resolution;

use super::{split_duplicate_frames, Frame, FrameSequence};

// <base><sep><digits>.<ext>
static FRAME_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)([._])(\d+)\.([a-zA-Z0-9]+)$").expect("valid frame file regex"));

/// Outcome of scanning one or more roots
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Files that belong to no sequence
    pub files: Vec<PathBuf>,
    pub sequences: Vec<FrameSequence>,
    /// Roots that could not be listed
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.sequences.is_empty()
    }
}

/// Classifies the entries of ingest roots into standalone files and frame sequences
#[derive(Debug, Clone, Default)]
pub struct SequenceScanner {
    scene: Option<String>,
    shot: Option<String>,
    resolution: Option<String>,
}

// base name, separator, extension, frame width
type GroupKey = (String, char, String, usize);

impl SequenceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene/shot hints applied to every sequence instead of deriving them from names
    pub fn with_hints(mut self, scene: Option<String>, shot: Option<String>) -> Self {
        self.scene = scene;
        self.shot = shot;
        self
    }

    /// Resolution applied to every sequence instead of reading it from the path
    pub fn with_resolution(mut self, resolution: Option<String>) -> Self {
        self.resolution = resolution;
        self
    }

    /// Scan every root. Unreadable roots are recorded and skipped.
    pub fn scan<P: AsRef<Path>>(&self, roots: &[P]) -> ScanResult {
        let mut result = ScanResult::default();

        for root in roots {
            let root = root.as_ref();
            if root.is_file() {
                result.files.push(root.to_path_buf());
                continue;
            }

            match self.scan_dir(root) {
                Ok((files, sequences)) => {
                    result.files.extend(files);
                    result.sequences.extend(sequences);
                }
                Err(e) => {
                    error!("{}", e);
                    result.errors.push(e);
                }
            }
        }

        result
    }

    /// Scan a single directory, non-recursively
    pub fn scan_dir(&self, root: &Path) -> Result<(Vec<PathBuf>, Vec<FrameSequence>), ScanError> {
        let metadata = fs::metadata(root).map_err(|e| ScanError::UnreadableRoot {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        // WalkDir reports an unreadable root lazily; probe it up front
        fs::read_dir(root).map_err(|e| ScanError::UnreadableRoot {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        let mut groups: BTreeMap<GroupKey, Vec<Frame>> = BTreeMap::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", root, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

            let Some(caps) = FRAME_FILE.captures(&name) else {
                files.push(path);
                continue;
            };

            let digits = &caps[3];
            let Ok(number) = digits.parse::<u32>() else {
                files.push(path);
                continue;
            };

            let separator = if &caps[2] == "_" { '_' } else { '.' };
            let key = (caps[1].to_string(), separator, caps[4].to_string(), digits.len());
            groups.entry(key).or_default().push(Frame { number, path });
        }

        let mut sequences = Vec::new();
        for ((base_name, separator, extension, padding), frames) in groups {
            let (members, duplicates) = split_duplicate_frames(frames);
            for duplicate in duplicates {
                warn!("{:?} repeats frame {}, treating it as a standalone file", duplicate.path, duplicate.number);
                files.push(duplicate.path);
            }

            let sequence = match FrameSequence::from_frames(&base_name, &extension, padding, members) {
                Ok(sequence) => sequence.with_separator(separator),
                Err(rejected) => {
                    files.extend(rejected.into_iter().map(|f| f.path));
                    continue;
                }
            };

            let (scene, shot) = self.scene_shot_for(&base_name);
            let resolution = self
                .resolution
                .clone()
                .or_else(|| sequence.first_path().and_then(resolution::extract_from_path));

            let sequence = sequence.with_scene_shot(scene, shot).with_resolution(resolution);

            let missing = sequence.missing_frames();
            if !missing.is_empty() {
                warn!("{}: frames missing: {:?}", sequence, missing);
            }
            debug!("Found sequence {} ({} frames)", sequence, sequence.len());

            sequences.push(sequence);
        }

        files.sort();
        Ok((files, sequences))
    }

    fn scene_shot_for(&self, base_name: &str) -> (Option<String>, Option<String>) {
        let derived = derive_scene_shot(base_name);
        if derived.is_none() && (self.scene.is_none() || self.shot.is_none()) {
            warn!(
                "Cannot derive scene/shot from '{}': expected at least 4 underscore-separated tokens",
                base_name
            );
        }

        let (derived_scene, derived_shot) = match derived {
            Some((scene, shot)) => (Some(scene), Some(shot)),
            None => (None, None),
        };

        let scene = self.scene.clone().or(derived_scene);
        let shot_token = self.shot.clone().or(derived_shot);

        let shot = match (&scene, shot_token) {
            (_, Some(shot)) if shot.contains('/') => Some(shot),
            (Some(scene), Some(shot)) => Some(format!("{}/{}", scene, shot)),
            _ => None,
        };

        if let (Some(scene), Some(shot)) = (&scene, &shot) {
            debug!("scene {}, shot {} found", scene, shot);
        }

        (scene, shot)
    }
}

/// Scene and shot tokens from fixed positions of an underscore-delimited base name.
///
/// `gen63_plate_048_0140_bg` yields (`048`, `0140`).
pub fn derive_scene_shot(base_name: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = base_name.split('_').collect();
    if parts.len() < 4 {
        return None;
    }
    Some((parts[2].to_string(), parts[3].to_string()))
}
