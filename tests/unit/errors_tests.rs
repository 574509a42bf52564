/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;
use platekeeper::errors::{AppError, IngestError, MappingError, ToolError};

/// Mapping errors name the key that failed
#[test]
fn test_mappingError_display_shouldNameSceneAndShot() {
    let err = IngestError::from(MappingError::NoMatch {
        scene: "048".to_string(),
        shot: "048/0140".to_string(),
    });
    let message = err.to_string();
    assert!(message.contains("048/0140"));
    assert!(message.starts_with("Mapping resolution error"));
}

/// Tool errors carry the tool name and status
#[test]
fn test_toolError_display_shouldIncludeStatus() {
    let err = ToolError::NonZeroExit {
        tool: "oiiotool".to_string(),
        status: 3,
        stderr: "bad input".to_string(),
    };
    assert_eq!(err.to_string(), "oiiotool exited with status 3: bad input");
}

/// Ingest errors survive the trip through anyhow
#[test]
fn test_appError_fromAnyhow_shouldRecoverIngestError() {
    let source = IngestError::Mapping(MappingError::MissingSceneShot("shotA.####.exr".to_string()));
    let app: AppError = anyhow::Error::from(source).into();

    assert!(matches!(app, AppError::Ingest(IngestError::Mapping(_))));
    assert_eq!(app.exit_code(), 2);
}

/// Other errors become unknown errors with their context
#[test]
fn test_appError_fromOtherAnyhow_shouldKeepContext() {
    let app: AppError = anyhow::anyhow!("disk full").context("Failed to write config").into();

    match &app {
        AppError::Unknown(message) => {
            assert!(message.contains("Failed to write config"));
            assert!(message.contains("disk full"));
        }
        other => panic!("unexpected variant {:?}", other),
    }
    assert_eq!(app.exit_code(), 1);
}

/// I/O errors map to file errors
#[test]
fn test_appError_fromIo_shouldBeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(AppError::from(io), AppError::File(_)));

    let copy = IngestError::Copy {
        src: PathBuf::from("/a"),
        dst: PathBuf::from("/b"),
        message: "denied".to_string(),
    };
    assert!(copy.to_string().contains("denied"));
}
