/*!
 * Structured run outcome.
 *
 * Every top-level item ends in exactly one `ItemStatus`, so callers can tell a
 * clean run from a partially failed one without reading logs.
 */

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Stage of the per-item pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Copy,
    Proxy,
    Movie,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Copy => "copy",
            Stage::Proxy => "proxy",
            Stage::Movie => "movie",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Sequence,
}

/// A stage that failed inside an otherwise completed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

/// Final state of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemStatus {
    /// Every requested stage succeeded
    Succeeded,
    /// Plates were copied but something else failed
    Partial { failures: Vec<StageFailure> },
    /// Nothing usable was produced; `stage` is where it stopped
    Failed { stage: Stage, reason: String },
}

/// Outcome of one file or sequence
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    /// Source file name or sequence pattern
    pub name: String,
    pub kind: ItemKind,
    pub status: ItemStatus,
    /// Destination version folder, sequences only
    pub version: Option<String>,
    pub files_copied: usize,
    pub files_skipped: usize,
    pub proxies_generated: usize,
    pub movie: Option<PathBuf>,
    /// Gaps in the source frame range
    pub missing_frames: Vec<u32>,
}

impl ItemReport {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            status: ItemStatus::Succeeded,
            version: None,
            files_copied: 0,
            files_skipped: 0,
            proxies_generated: 0,
            movie: None,
            missing_frames: Vec::new(),
        }
    }

    /// An item that stopped at `stage`
    pub fn failed(name: impl Into<String>, kind: ItemKind, stage: Stage, reason: impl Into<String>) -> Self {
        let mut report = Self::new(name, kind);
        report.status = ItemStatus::Failed {
            stage,
            reason: reason.into(),
        };
        report
    }

    /// Record a non-fatal stage failure; a succeeded item becomes partial
    pub fn record_failure(&mut self, stage: Stage, reason: impl Into<String>) {
        let failure = StageFailure {
            stage,
            reason: reason.into(),
        };
        match &mut self.status {
            ItemStatus::Succeeded => {
                self.status = ItemStatus::Partial {
                    failures: vec![failure],
                }
            }
            ItemStatus::Partial { failures } => failures.push(failure),
            ItemStatus::Failed { .. } => {}
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed { .. })
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub items: Vec<ItemReport>,
    #[serde(skip)]
    pub duration: Duration,
}

impl RunReport {
    pub fn new(items: Vec<ItemReport>, duration: Duration) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            items,
            duration,
        }
    }

    /// True when every item succeeded
    pub fn is_success(&self) -> bool {
        self.items.iter().all(ItemReport::is_success)
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn partial(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Partial { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.is_failed()).count()
    }

    pub fn files_copied(&self) -> usize {
        self.items.iter().map(|i| i.files_copied).sum()
    }

    pub fn item(&self, name: &str) -> Option<&ItemReport> {
        self.items.iter().find(|i| i.name == name)
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "Run {}: {} items, {} succeeded, {} partial, {} failed, {} files copied in {:.1}s",
            self.run_id,
            self.items.len(),
            self.succeeded(),
            self.partial(),
            self.failed(),
            self.files_copied(),
            self.duration.as_secs_f64()
        )
    }
}
