//! Container engine CLI wrapper.
//!
//! Builds engine command lines and hands them to a [`CommandExecutor`].
//! The prerequisite check lives here as well.

use crate::container::PrerequisiteError;
use crate::executor::{
    CommandExecutor, ExecutionCommand, ExecutionResult, ExecutorError, HostExecutor, OutputStream,
};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle to the engine program.
///
/// Cheap to clone; clones share the executor.
#[derive(Clone)]
pub struct ContainerEngine {
    executor: Arc<dyn CommandExecutor>,
    program: String,
}

impl ContainerEngine {
    /// Engine driven through `executor`
    pub fn new(executor: Arc<dyn CommandExecutor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    /// Engine running as real host subprocesses
    pub fn host(program: impl Into<String>) -> Self {
        Self::new(Arc::new(HostExecutor::new()), program)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command<S: AsRef<str>>(&self, args: &[S]) -> ExecutionCommand {
        ExecutionCommand::new(
            self.program.clone(),
            args.iter().map(|a| a.as_ref().to_string()).collect(),
        )
    }

    /// Run an engine subcommand to completion
    pub async fn execute<S: AsRef<str>>(&self, args: &[S]) -> Result<ExecutionResult, ExecutorError> {
        let cmd = self.command(args);
        debug!("[{}] {}", self.executor.executor_type(), cmd);
        self.executor.execute(cmd).await
    }

    /// Start an engine subcommand in `working_dir` and stream its output
    pub async fn stream<S: AsRef<str>>(
        &self,
        args: &[S],
        working_dir: &Path,
    ) -> Result<Box<dyn OutputStream>, ExecutorError> {
        let cmd = self.command(args).with_working_dir(working_dir.to_path_buf());
        debug!("[{}] {} (in {})", self.executor.executor_type(), cmd, working_dir.display());
        self.executor.spawn_streaming(cmd).await
    }

    /// Query the engine version.
    ///
    /// # Errors
    ///
    /// Returns [`PrerequisiteError`] when the program is missing, exits
    /// non-zero, or cannot be executed.
    pub async fn version(&self) -> Result<String, PrerequisiteError> {
        let result = self.execute(&["--version"]).await?;

        if !result.success() {
            return Err(PrerequisiteError::VersionQueryFailed {
                program: self.program.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(result.stdout.trim().to_string())
    }

    /// Whether the engine is installed and answers its version query.
    ///
    /// Never fails; the reason for a `false` is logged once.
    pub async fn check_available(&self) -> bool {
        match self.version().await {
            Ok(version) => {
                info!("Container engine available: {}", version);
                true
            }
            Err(e) => {
                warn!("Container engine unavailable: {}", e);
                false
            }
        }
    }
}

impl fmt::Debug for ContainerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerEngine")
            .field("program", &self.program)
            .field("executor", &self.executor.executor_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{MockExecutor, MockResponse};

    fn engine(mock: MockExecutor) -> (ContainerEngine, Arc<MockExecutor>) {
        let mock = Arc::new(mock);
        (ContainerEngine::new(mock.clone(), "docker"), mock)
    }

    #[tokio::test]
    async fn test_version_trims_output() {
        let (engine, _) = engine(
            MockExecutor::new().on(&["--version"], MockResponse::success("Docker version 27.1.1, build 6312585\n")),
        );

        assert_eq!(engine.version().await.unwrap(), "Docker version 27.1.1, build 6312585");
        assert!(engine.check_available().await);
    }

    #[tokio::test]
    async fn test_missing_engine_is_unavailable() {
        let (engine, mock) = engine(MockExecutor::new().on(&["--version"], MockResponse::Missing));

        assert!(!engine.check_available().await);
        assert!(matches!(engine.version().await, Err(PrerequisiteError::NotInstalled(_))));
        assert_eq!(mock.invocations().len(), 2);
    }

    #[tokio::test]
    async fn test_nonzero_version_query_is_unavailable() {
        let (engine, _) = engine(
            MockExecutor::new().on(&["--version"], MockResponse::failure(1, "Cannot connect to the Docker daemon\n")),
        );

        let err = engine.version().await.unwrap_err();
        assert!(matches!(err, PrerequisiteError::VersionQueryFailed { exit_code: 1, .. }));
        assert!(err.to_string().contains("Cannot connect to the Docker daemon"));
        assert!(!engine.check_available().await);
    }

    #[tokio::test]
    async fn test_commands_use_configured_program() {
        let mock = Arc::new(MockExecutor::new());
        let engine = ContainerEngine::new(mock.clone(), "podman");

        engine.execute(&["ps", "-a"]).await.unwrap();

        let invocations = mock.invocations();
        assert_eq!(invocations[0].program, "podman");
        assert_eq!(invocations[0].args, vec!["ps", "-a"]);
    }
}
