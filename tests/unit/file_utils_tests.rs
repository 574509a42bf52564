/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use platekeeper::file_utils::{CopyResult, FileManager};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "plate.exr", "data")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path().join("absent.exr")));
    Ok(())
}

/// A second copy without overwrite copies nothing and leaves content identical
#[test]
fn test_copyVerified_twice_shouldSkipSecondCopy() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let src = common::create_test_file(temp_dir.path(), "in/plate_1001.exr", "pixels")?;
    let dst = temp_dir.path().join("out/deep/plate_1001.exr");

    let first = FileManager::copy_verified(&src, &dst, false)?;
    let second = FileManager::copy_verified(&src, &dst, false)?;

    assert_eq!(first, CopyResult::Copied { bytes: 6, verified: true });
    assert_eq!(second, CopyResult::Skipped);
    assert_eq!(fs::read(&src)?, fs::read(&dst)?);
    Ok(())
}

/// Overwrite replaces an existing destination
#[test]
fn test_copyVerified_withOverwrite_shouldReplaceDestination() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let src = common::create_test_file(temp_dir.path(), "plate.exr", "new content")?;
    let dst = common::create_test_file(temp_dir.path(), "out/plate.exr", "old")?;

    let result = FileManager::copy_verified(&src, &dst, true)?;

    assert!(matches!(result, CopyResult::Copied { verified: true, .. }));
    assert_eq!(fs::read_to_string(&dst)?, "new content");
    Ok(())
}

/// An empty destination is not trusted as a finished copy
#[test]
fn test_shouldSkipCopy_withEmptyDestination_shouldCopy() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let src = common::create_test_file(temp_dir.path(), "plate.exr", "pixels")?;
    let dst = common::create_test_file(temp_dir.path(), "out/plate.exr", "")?;

    assert!(!FileManager::should_skip_copy(&src, &dst, false));
    Ok(())
}

/// The source modification time is carried over
#[test]
fn test_copyVerified_shouldPreserveModificationTime() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let src = common::create_test_file(temp_dir.path(), "plate.exr", "pixels")?;
    let stamp = FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&src, stamp)?;

    let dst = temp_dir.path().join("out/plate.exr");
    FileManager::copy_verified(&src, &dst, false)?;

    let copied = FileTime::from_last_modification_time(&fs::metadata(&dst)?);
    assert_eq!(copied.unix_seconds(), stamp.unix_seconds());
    Ok(())
}

/// A missing source is an error
#[test]
fn test_copyVerified_withMissingSource_shouldFail() {
    let result = FileManager::copy_verified("/no/such/plate.exr", "/tmp/never_written.exr", false);
    assert!(result.is_err());
}

/// Extension swap keeps the stem
#[test]
fn test_withExtensionIn_shouldPlaceInDirectory() {
    let path = FileManager::with_extension_in("sc48_f2048x1080_1001.exr", "/proxy", ".jpeg");
    assert_eq!(path, Path::new("/proxy/sc48_f2048x1080_1001.jpeg"));
}
