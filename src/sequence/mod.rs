/*!
 * Frame sequences and directory scanning.
 *
 * - `FrameSequence`: an immutable group of same-format frames that differ only by a
 *   fixed-width frame number
 * - `scanner`: classifies directory entries into standalone files and sequences
 */

pub mod scanner;

pub use scanner::{ScanResult, SequenceScanner};

use std::fmt;
use std::path::{Path, PathBuf};

/// One member of a frame sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Numeric frame value parsed from the file name
    pub number: u32,
    pub path: PathBuf,
}

/// A set of image files sharing base name, extension and frame padding.
///
/// Built once per scan pass; members are ordered by numeric frame value and frame
/// numbers are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    pub base_name: String,

    /// `.` or `_` between base name and frame token
    pub separator: char,

    /// Extension without the leading dot
    pub extension: String,

    /// Digit width of the frame token
    pub padding: usize,

    pub start: u32,
    pub end: u32,

    /// Scene identifier, e.g. `048`
    pub scene: Option<String>,

    /// Compound scene/shot key, e.g. `048/0140`
    pub shot: Option<String>,

    /// `WIDTHxHEIGHT` token of the source plates
    pub resolution: Option<String>,

    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Build a sequence from its members.
    ///
    /// Members must carry distinct frame numbers and there must be at least two of
    /// them; otherwise the frames are handed back unchanged so the caller can keep
    /// them as standalone files.
    pub fn from_frames(
        base_name: &str,
        extension: &str,
        padding: usize,
        mut frames: Vec<Frame>,
    ) -> Result<Self, Vec<Frame>> {
        frames.sort_by_key(|f| f.number);
        let distinct = frames.windows(2).all(|pair| pair[0].number != pair[1].number);
        if frames.len() < 2 || !distinct {
            return Err(frames);
        }

        let (start, end) = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => (first.number, last.number),
            _ => return Err(frames),
        };

        Ok(Self {
            base_name: base_name.to_string(),
            separator: '.',
            extension: extension.to_string(),
            padding,
            start,
            end,
            scene: None,
            shot: None,
            resolution: None,
            frames,
        })
    }

    /// Character between base name and frame token, `.` unless set
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_scene_shot(mut self, scene: Option<String>, shot: Option<String>) -> Self {
        self.scene = scene;
        self.shot = shot;
        self
    }

    pub fn with_resolution(mut self, resolution: Option<String>) -> Self {
        self.resolution = resolution;
        self
    }

    /// Members in ascending frame order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Member paths in ascending frame order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.frames.iter().map(|f| f.path.clone()).collect()
    }

    pub fn first_path(&self) -> Option<&Path> {
        self.frames.first().map(|f| f.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames between start and end that have no member
    pub fn missing_frames(&self) -> Vec<u32> {
        let present: Vec<u32> = self.frames.iter().map(|f| f.number).collect();
        missing_frames(&present)
    }

    /// Number of frames the range spans, members or not
    pub fn range_length(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Display pattern, e.g. `plate.####.exr`
    pub fn pattern(&self) -> String {
        format!("{}{}{}.{}", self.base_name, self.separator, "#".repeat(self.padding), self.extension)
    }
}

impl fmt::Display for FrameSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}-{}]", self.pattern(), self.start, self.end)
    }
}

/// Split frames into one member per frame number and the extra files that repeat a
/// number. Members are in ascending frame order; on a tie the lexically first path wins.
pub fn split_duplicate_frames(mut frames: Vec<Frame>) -> (Vec<Frame>, Vec<Frame>) {
    frames.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));

    let mut members: Vec<Frame> = Vec::with_capacity(frames.len());
    let mut duplicates = Vec::new();
    for frame in frames {
        if members.last().is_some_and(|m| m.number == frame.number) {
            duplicates.push(frame);
        } else {
            members.push(frame);
        }
    }
    (members, duplicates)
}

/// Gaps in a set of frame numbers, in ascending order
pub fn missing_frames(frames: &[u32]) -> Vec<u32> {
    let mut sorted = frames.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };

    (*first..=*last)
        .filter(|n| sorted.binary_search(n).is_err())
        .collect()
}
