/*!
 * External tool invocation.
 *
 * Proxy and movie generation shell out to image and video tools. Every invocation goes
 * through the `ToolRunner` trait so the pipeline can run against real binaries
 * (`process::ProcessRunner`) or a recording double (`mock::MockToolRunner`).
 */

use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::app_config::ToolsConfig;
use crate::errors::ToolError;

pub mod mock;
pub mod process;

pub use mock::MockToolRunner;
pub use process::ProcessRunner;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

/// Captured output of a successful invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Common trait for everything that can run an external tool
///
/// Implementations block only the calling task, never the runtime.
#[async_trait]
pub trait ToolRunner: Send + Sync + Debug {
    /// Run the invocation to completion
    ///
    /// # Returns
    /// * `Result<ToolOutput, ToolError>` - captured output, or why the tool failed
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;
}

/// Tool configuration plus the runner that executes it, shared by all stages
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub runner: Arc<dyn ToolRunner>,
    pub tools: ToolsConfig,
}

impl ToolContext {
    pub fn new(runner: Arc<dyn ToolRunner>, tools: ToolsConfig) -> Self {
        Self { runner, tools }
    }
}
