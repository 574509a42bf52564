use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::ToolError;

use super::{ToolInvocation, ToolOutput, ToolRunner};

/// Runs tools as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill and fail invocations that run longer than `secs`
    pub fn with_timeout_secs(secs: Option<u64>) -> Self {
        Self {
            timeout: secs.filter(|s| *s > 0).map(Duration::from_secs),
        }
    }

    // Keep the tail of noisy stderr output
    fn tail(stderr: &str) -> String {
        const MAX_LINES: usize = 8;
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(MAX_LINES);
        lines[start..].join("\n")
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        debug!("Running {}", invocation);

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => {
                tokio::select! {
                    result = child => result,
                    _ = tokio::time::sleep(limit) => {
                        return Err(ToolError::Timeout {
                            tool: invocation.program.clone(),
                            secs: limit.as_secs(),
                        });
                    }
                }
            }
            None => child.await,
        }
        .map_err(|e| ToolError::Launch {
            tool: invocation.program.clone(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ToolError::NonZeroExit {
                tool: invocation.program.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr: Self::tail(&stderr),
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}
