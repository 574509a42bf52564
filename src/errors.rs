/*!
 * Error types for the platekeeper application.
 *
 * This module contains custom error types for the different stages of an ingest run,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while listing an ingest root
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root directory could not be listed
    #[error("Cannot read directory {path:?}: {message}")]
    UnreadableRoot {
        path: PathBuf,
        message: String,
    },

    /// The root is not a directory
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),
}

/// Errors raised while resolving scene/shot mapping data. These are fatal for a run.
#[derive(Error, Debug)]
pub enum MappingError {
    /// The mapping table could not be read
    #[error("Cannot read mapping table {path:?}: {message}")]
    Unreadable {
        path: PathBuf,
        message: String,
    },

    /// The sequence carries no scene/shot identifiers
    #[error("No scene/shot identifiers for sequence '{0}'")]
    MissingSceneShot(String),

    /// No mapping entry matches the scene/shot key
    #[error("No mapping entry for scene {scene} and shot {shot}; check the mapping table")]
    NoMatch {
        scene: String,
        shot: String,
    },

    /// The type string of a mapping entry has an unsupported shape
    #[error("Malformed type string '{type_string}' for key {key}: expected 1 to 3 tokens, found {found}")]
    MalformedType {
        key: String,
        type_string: String,
        found: usize,
    },

    /// The mapping entry lacks the label or type column
    #[error("Incomplete mapping entry for key {0}")]
    IncompleteEntry(String),
}

/// Errors raised by external tool invocations
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool binary could not be started
    #[error("Failed to launch {tool}: {message}")]
    Launch {
        tool: String,
        message: String,
    },

    /// The tool ran and returned a non-zero status
    #[error("{tool} exited with status {status}: {stderr}")]
    NonZeroExit {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// The tool exceeded the configured timeout
    #[error("{tool} timed out after {secs}s")]
    Timeout {
        tool: String,
        secs: u64,
    },

    /// No tool is configured for this role
    #[error("No {0} tool configured")]
    NotConfigured(String),
}

/// Errors that can occur during an ingest run
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error while scanning a root
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Error resolving mapping data
    #[error("Mapping resolution error: {0}")]
    Mapping(#[from] MappingError),

    /// Error from an external tool
    #[error("Tool invocation error: {0}")]
    Tool(#[from] ToolError),

    /// Error copying a single file
    #[error("Copy of {src:?} to {dst:?} failed: {message}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        message: String,
    },

    /// Error rendering a path template
    #[error("Template error: {0}")]
    Template(String),

    /// Error allocating a version folder
    #[error("Version allocation under {path:?} failed: {message}")]
    Version {
        path: PathBuf,
        message: String,
    },

    /// Invalid job options or configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the ingest engine
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code: 2 for curated-input problems, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Ingest(IngestError::Mapping(_)) | AppError::Ingest(IngestError::Config(_)) => 2,
            _ => 1,
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<IngestError>() {
            Ok(ingest) => Self::Ingest(ingest),
            Err(other) => Self::Unknown(format!("{:#}", other)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
