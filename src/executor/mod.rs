//! # Command Execution Layer
//!
//! Every interaction with the container engine goes through this layer: the
//! engine is an external CLI, so each operation is a subprocess whose exit
//! status and text output are all the pipeline ever inspects.
//!
//! ## Core Components
//!
//! - **[`CommandExecutor`]**: async seam for running a command to completion or
//!   as a stream of output lines
//! - **[`HostExecutor`]**: real subprocesses via `tokio::process::Command`
//! - **[`MockExecutor`]**: scripted replies and an invocation journal for tests
//! - **[`ExecutionCommand`]** / **[`ExecutionResult`]**: what to run and what came back
//! - **[`OutputStream`]**: lazy, finite sequence of lines from a running process
//!
//! ## Streaming
//!
//! ```text
//! spawn_streaming(cmd)
//!        ↓
//!   OutputStream::next_line()  ← repeat until None (both pipes closed)
//!        ↓
//!   OutputStream::wait()       → exit code
//! ```
//!
//! The stream must be drained before [`OutputStream::wait`] is called, or a
//! chatty process can block on a full pipe.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stackdeploy::executor::{CommandExecutor, ExecutionCommand, HostExecutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = HostExecutor::new();
//!     let result = executor
//!         .execute(ExecutionCommand::new("docker", vec!["--version".to_string()]))
//!         .await?;
//!     println!("{}", result.stdout.trim());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Host-based command execution.
///
/// Implements [`HostExecutor`] for direct process execution on the
/// host system using `tokio::process::Command`.
pub mod host;

/// Scripted executor used by tests and dry runs.
pub mod mock;

pub use host::HostExecutor;
pub use mock::{MockExecutor, MockResponse};

/// Result of command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Exit code (0 = success, non-zero = failure)
    pub exit_code: i32,
    /// Duration of command execution
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the command executed successfully (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionCommand {
    /// Program name or path to execute
    pub program: String,
    /// Command line arguments
    pub args: Vec<String>,
    /// Working directory for command execution
    pub working_dir: Option<PathBuf>,
}

impl ExecutionCommand {
    /// Create a new command with just program and args
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// First argument, which for engine commands is the subcommand (`build`, `run`, ...)
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for ExecutionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_escape::escape(self.program.as_str().into()))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape::escape(arg.as_str().into()))?;
        }
        Ok(())
    }
}

/// Which pipe a streamed line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    Stdout,
    Stderr,
}

/// One line of streamed process output, without its trailing newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub source: LineSource,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            source: LineSource::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            source: LineSource::Stderr,
            text: text.into(),
        }
    }
}

/// Errors during command execution
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Program could not be located on PATH
    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    /// Process could not be spawned or waited on
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Lines produced by a running process.
///
/// Yields lines from stdout and stderr interleaved in arrival order, then
/// `None` once both pipes are closed.
#[async_trait]
pub trait OutputStream: Send {
    /// Next available line, or `None` when the process closed its output
    async fn next_line(&mut self) -> Option<Result<OutputLine, ExecutorError>>;

    /// Wait for the process to exit and return its exit code (-1 when killed by a signal)
    async fn wait(self: Box<Self>) -> Result<i32, ExecutorError>;
}

/// Where engine commands actually run.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion, capturing stdout and stderr
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started. A non-zero exit is
    /// not an error at this level; inspect [`ExecutionResult::exit_code`].
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError>;

    /// Start a command and hand back its output as a line stream
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    async fn spawn_streaming(
        &self,
        cmd: ExecutionCommand,
    ) -> Result<Box<dyn OutputStream>, ExecutorError>;

    /// Executor type name for logging
    fn executor_type(&self) -> &'static str;
}
