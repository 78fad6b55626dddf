//! Per-run deployment configuration.

use crate::env::defaults;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("Failed to render configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything one pipeline run needs. Immutable for the run's duration.
///
/// The container-side port is deliberately absent: it is fixed by the
/// detected stack's recipe family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Project root; becomes the build context
    pub project_dir: PathBuf,
    /// Host port published for the application
    pub host_port: u16,
    /// Tag of the built image
    pub image_name: String,
    /// Name of the managed container
    pub container_name: String,
    /// Engine program (`docker`, `podman`, ...)
    pub engine: String,
    /// Fixed wait between starting the container and observing it
    pub settle_delay: Duration,
    /// Log lines fetched after start
    pub log_tail_lines: usize,
}

impl DeploymentConfig {
    /// Config with default identity and timings
    pub fn new(project_dir: impl Into<PathBuf>, host_port: u16) -> Self {
        Self {
            project_dir: project_dir.into(),
            host_port,
            image_name: defaults::IMAGE_NAME.to_string(),
            container_name: defaults::CONTAINER_NAME.to_string(),
            engine: defaults::ENGINE.to_string(),
            settle_delay: Duration::from_secs(defaults::SETTLE_DELAY_SECS),
            log_tail_lines: defaults::LOG_TAIL_LINES,
        }
    }

    pub fn with_names(mut self, image_name: impl Into<String>, container_name: impl Into<String>) -> Self {
        self.image_name = image_name.into();
        self.container_name = container_name.into();
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_log_tail_lines(mut self, lines: usize) -> Self {
        self.log_tail_lines = lines;
        self
    }

    /// URL the deployed application is reachable at
    pub fn access_url(&self) -> String {
        format!("http://localhost:{}", self.host_port)
    }

    /// Reject values the engine would choke on later.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_port == 0 {
            return Err(ConfigError::Invalid("host port must be between 1 and 65535".to_string()));
        }
        if self.image_name.trim().is_empty() {
            return Err(ConfigError::Invalid("image name must not be empty".to_string()));
        }
        if self.container_name.trim().is_empty() {
            return Err(ConfigError::Invalid("container name must not be empty".to_string()));
        }
        if self.engine.trim().is_empty() {
            return Err(ConfigError::Invalid("engine program must not be empty".to_string()));
        }
        Ok(())
    }
}
