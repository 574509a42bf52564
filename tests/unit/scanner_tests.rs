/*!
 * Tests for sequence detection and grouping
 */

use anyhow::Result;
use platekeeper::sequence::{self, SequenceScanner};
use platekeeper::errors::ScanError;
use crate::common;

/// A uniform-padding run of frames groups into exactly one sequence
#[test]
fn test_scan_withUniformPadding_shouldFormOneSequence() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_frames(temp_dir.path(), "shotA", "exr", 1001..=1005)?;
    common::create_test_file(temp_dir.path(), "ref.txt", "notes")?;

    let result = SequenceScanner::new().scan(&[temp_dir.path()]);

    assert_eq!(result.sequences.len(), 1);
    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].ends_with("ref.txt"));

    let seq = &result.sequences[0];
    assert_eq!((seq.start, seq.end, seq.padding), (1001, 1005, 4));
    assert_eq!(seq.len(), 5);
    assert_eq!(seq.extension, "exr");
    Ok(())
}

/// A single frame-like file is not a sequence
#[test]
fn test_scan_withSingleFrame_shouldClassifyAsFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_frames(temp_dir.path(), "lonely", "exr", [1001])?;

    let result = SequenceScanner::new().scan(&[temp_dir.path()]);

    assert!(result.sequences.is_empty());
    assert_eq!(result.files.len(), 1);
    Ok(())
}

/// Same base with different extensions forms separate sequences
#[test]
fn test_scan_withTwoExtensions_shouldSplitSequences() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_frames(temp_dir.path(), "shotA", "exr", 1..=3)?;
    common::create_frames(temp_dir.path(), "shotA", "dpx", 1..=3)?;

    let result = SequenceScanner::new().scan(&[temp_dir.path()]);

    assert_eq!(result.sequences.len(), 2);
    assert!(result.files.is_empty());
    Ok(())
}

/// Subdirectories are not descended into
#[test]
fn test_scan_withNestedFolder_shouldIgnoreNestedFrames() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("nested");
    std::fs::create_dir_all(&nested)?;
    common::create_frames(&nested, "shotA", "exr", 1001..=1003)?;

    let result = SequenceScanner::new().scan(&[temp_dir.path()]);
    assert!(result.is_empty());
    Ok(())
}

/// An unreadable root is recorded and the other roots are still scanned
#[test]
fn test_scan_withMissingRoot_shouldSkipAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_frames(temp_dir.path(), "shotA", "exr", 1..=2)?;
    let missing = temp_dir.path().join("does_not_exist");

    let result = SequenceScanner::new().scan(&[missing.as_path(), temp_dir.path()]);

    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], ScanError::UnreadableRoot { .. }));
    assert_eq!(result.sequences.len(), 1);
    Ok(())
}

/// Scene and shot come from fixed name positions, or from hints
#[test]
fn test_scan_sceneShot_shouldPreferHints() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_frames(temp_dir.path(), "gen63_plate_048_0140", "exr", 1..=2)?;

    let derived = SequenceScanner::new().scan(&[temp_dir.path()]);
    assert_eq!(derived.sequences[0].scene.as_deref(), Some("048"));
    assert_eq!(derived.sequences[0].shot.as_deref(), Some("048/0140"));

    let hinted = SequenceScanner::new()
        .with_hints(Some("050".to_string()), Some("0200".to_string()))
        .scan(&[temp_dir.path()]);
    assert_eq!(hinted.sequences[0].shot.as_deref(), Some("050/0200"));
    Ok(())
}

/// Gaps are reported; complete ranges report nothing
#[test]
fn test_missingFrames_shouldListGaps() {
    assert_eq!(sequence::missing_frames(&[1001, 1002, 1004]), vec![1003]);
    assert!(sequence::missing_frames(&[1001, 1002, 1003, 1004, 1005]).is_empty());
}
