/*!
 * # platekeeper - vendor plate ingestion
 *
 * A Rust library for ingesting vendor deliveries of image-frame sequences into a
 * versioned project tree.
 *
 * ## Features
 *
 * - Group numbered frame files into sequences and report missing frames
 * - Resolve shot destinations from a scene/shot mapping table and path templates
 * - Reserve the next `vNNN` version folder per shot
 * - Copy plates concurrently with size verification, renumbering frames
 * - Generate downsampled proxies and review movies through external tools,
 *   with a transcoder fallback for movies
 * - Structured per-item run reports
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and per-run job options
 * - `sequence`: Frame sequence model and the directory scanner
 * - `mapping`: Scene/shot mapping table
 * - `paths`: Destination resolution:
 *   - `paths::resolver`: Mapping lookup, rename maps and destination sets
 *   - `paths::template`: Path template rendering
 *   - `paths::version`: Version folder allocation
 * - `resolution`: Resolution tokens and presets
 * - `stages`: Copy, proxy and movie stages built on a shared `Operation`
 * - `pipeline`: Orchestration and run reports
 * - `tools`: External tool invocation:
 *   - `tools::process`: Child process runner
 *   - `tools::mock`: Recording runner for tests
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod mapping;
pub mod paths;
pub mod pipeline;
pub mod resolution;
pub mod sequence;
pub mod stages;
pub mod tools;

// Re-export main types for easier usage
pub use app_config::{Config, JobOptions};
pub use pipeline::{IngestPipeline, ItemReport, ItemStatus, RunReport};
pub use sequence::{FrameSequence, SequenceScanner};
