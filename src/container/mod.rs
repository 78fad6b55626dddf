//! Container engine integration.
//!
//! The engine (Docker, or any CLI-compatible tool such as Podman) is driven
//! through its command line; nothing here links against an engine API.
//!
//! ## Components
//!
//! - [`engine`]: engine program wrapper and prerequisite check
//! - [`image`]: image builds with streamed output
//! - [`lifecycle`]: replace, run, observe and read logs of the single managed container
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stackdeploy::container::{ContainerEngine, ImageBuilder, LifecycleManager};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = ContainerEngine::host("docker");
//!     if !engine.check_available().await {
//!         return Ok(());
//!     }
//!
//!     ImageBuilder::new(engine.clone())
//!         .build(Path::new("/srv/shop"), "shop", |line| println!("   {}", line.text))
//!         .await?;
//!
//!     let lifecycle = LifecycleManager::new(engine);
//!     lifecycle.remove_existing("shop-container").await;
//!     let id = lifecycle.run("shop", "shop-container", 1000, 8080).await?;
//!     println!("started {}", id.short());
//!     Ok(())
//! }
//! ```

mod engine;
mod image;
mod lifecycle;

pub use engine::ContainerEngine;
pub use image::ImageBuilder;
pub use lifecycle::{LifecycleManager, parse_status};

use crate::executor::ExecutorError;
use serde::Serialize;
use std::fmt;

/// Engine missing or not responding to its version query.
#[derive(Debug, thiserror::Error)]
pub enum PrerequisiteError {
    #[error("{0} is not installed or not on PATH. Installation guide: https://docs.docker.com/get-docker/")]
    NotInstalled(String),

    #[error("`{program} --version` exited with code {exit_code}: {stderr}")]
    VersionQueryFailed {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Failed to query engine version: {0}")]
    Executor(ExecutorError),
}

impl From<ExecutorError> for PrerequisiteError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::ProgramNotFound(program) => Self::NotInstalled(program),
            other => Self::Executor(other),
        }
    }
}

/// Image build failures
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to launch image build: {0}")]
    Launch(#[source] ExecutorError),

    #[error("Image build failed with exit code {exit_code}")]
    Failed { exit_code: i32 },
}

/// Engine refused to start the container
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Container failed to start (exit code {exit_code}): {stderr}")]
    Rejected { exit_code: i32, stderr: String },

    #[error("Failed to launch container run: {0}")]
    Launch(#[source] ExecutorError),
}

/// Log retrieval failures. Never fatal to a deployment.
#[derive(Debug, thiserror::Error)]
pub enum LogFetchError {
    #[error("Log query exited with code {exit_code}: {stderr}")]
    Failed { exit_code: i32, stderr: String },

    #[error("Failed to launch log query: {0}")]
    Launch(#[source] ExecutorError),
}

/// Engine-assigned container id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, the form engines print in listings
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observed state of the managed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    /// No container with that name
    Absent,
    /// Container is running
    Running,
    /// Container exists but is not running (exited, created, dead or crash-restarting)
    Exited,
    /// Engine could not be queried or reported something unrecognized
    Unknown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Absent => write!(f, "absent"),
            ContainerState::Running => write!(f, "running"),
            ContainerState::Exited => write!(f, "exited"),
            ContainerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// One status observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerStatus {
    pub state: ContainerState,
    /// Engine's human-readable status, e.g. `Up 10 seconds`
    pub detail: Option<String>,
    /// Published ports as reported by the engine
    pub ports: Option<String>,
}

impl ContainerStatus {
    pub fn absent() -> Self {
        Self {
            state: ContainerState::Absent,
            detail: None,
            ports: None,
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            state: ContainerState::Unknown,
            detail: Some(reason.into()),
            ports: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }
}

/// Recent container output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerLogs {
    pub stdout: String,
    pub stderr: String,
}

impl ContainerLogs {
    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_short_form() {
        let id = ContainerId::new("3f4e8a9b2c1d0e5f6a7b8c9d");
        assert_eq!(id.short(), "3f4e8a9b2c1d");

        let tiny = ContainerId::new("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn test_prerequisite_error_from_missing_program() {
        let err = PrerequisiteError::from(ExecutorError::ProgramNotFound("podman".to_string()));
        assert!(matches!(err, PrerequisiteError::NotInstalled(ref p) if p == "podman"));
        assert!(err.to_string().contains("podman is not installed"));
    }

    #[test]
    fn test_run_error_carries_stderr() {
        let err = RunError::Rejected {
            exit_code: 125,
            stderr: "Bind for 0.0.0.0:1000 failed: port is already allocated".to_string(),
        };
        assert!(err.to_string().contains("port is already allocated"));
    }

    #[test]
    fn test_logs_emptiness_ignores_whitespace() {
        assert!(ContainerLogs::default().is_empty());
        assert!(
            !ContainerLogs {
                stdout: String::new(),
                stderr: "Started Application in 3.2 seconds".to_string(),
            }
            .is_empty()
        );
    }
}
