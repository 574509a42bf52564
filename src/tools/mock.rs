/*!
 * Mock tool runner for testing.
 *
 * Records every invocation and, on success, writes a small placeholder file where the tool
 * would have written its output, so downstream checks on the filesystem behave as with
 * the real binaries:
 * - `MockToolRunner::working()` - every tool succeeds
 * - `MockToolRunner::failing_tools(&[..])` - the named programs fail, others succeed
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::ToolError;

use super::{ToolInvocation, ToolOutput, ToolRunner};

/// Recording tool runner
#[derive(Debug, Clone, Default)]
pub struct MockToolRunner {
    calls: Arc<Mutex<Vec<ToolInvocation>>>,
    failing: HashSet<String>,
}

impl MockToolRunner {
    /// A runner where every tool succeeds
    pub fn working() -> Self {
        Self::default()
    }

    /// A runner where the given programs exit non-zero
    pub fn failing_tools(programs: &[&str]) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: programs.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Every invocation seen so far, in call order
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().clone()
    }

    /// Invocations of one program
    pub fn calls_to(&self, program: &str) -> Vec<ToolInvocation> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    /// Where the invocation would write its result.
    ///
    /// `-o <path>` wins, then the `output` field of a `--data <json>` record, then the last
    /// argument.
    pub fn output_path(invocation: &ToolInvocation) -> Option<PathBuf> {
        let args = &invocation.args;

        if let Some(pos) = args.iter().position(|a| a == "-o") {
            return args.get(pos + 1).map(PathBuf::from);
        }

        if let Some(pos) = args.iter().position(|a| a == "--data") {
            let record: serde_json::Value = serde_json::from_str(args.get(pos + 1)?).ok()?;
            return record["output"].as_str().map(PathBuf::from);
        }

        args.last().map(PathBuf::from)
    }
}

#[async_trait]
impl ToolRunner for MockToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push(invocation.clone());

        if self.failing.contains(&invocation.program) {
            return Err(ToolError::NonZeroExit {
                tool: invocation.program.clone(),
                status: 1,
                stderr: "simulated failure".to_string(),
            });
        }

        if let Some(output) = Self::output_path(invocation) {
            if let Some(parent) = output.parent() {
                let _ = fs::create_dir_all(parent);
            }
            fs::write(&output, invocation.to_string()).map_err(|e| ToolError::Launch {
                tool: invocation.program.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(ToolOutput::default())
    }
}
