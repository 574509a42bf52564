/*!
 * Ingest orchestration.
 *
 * `IngestPipeline` drives every scanned item through copy, then proxy and movie
 * generation, and returns a `RunReport` with one entry per item.
 */

pub mod orchestrator;
pub mod report;

pub use orchestrator::{IngestPipeline, ProgressCallback};
pub use report::{ItemKind, ItemReport, ItemStatus, RunReport, Stage, StageFailure};
