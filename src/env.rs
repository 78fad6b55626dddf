//! Environment constants and path utilities for stackdeploy.
//!
//! Centralizes the fixed file names, default identifiers and configuration
//! locations used throughout the application.

use std::path::{Path, PathBuf};

/// Application directory name for local and per-user configuration
pub const APP_DIR_NAME: &str = ".stackdeploy";

/// Configuration file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up directly in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "stackdeploy.toml";

/// Environment variable selecting the default log level
pub const LOG_LEVEL_ENV: &str = "STACKDEPLOY_LOG_LEVEL";

/// Default deployment identity and runtime settings
pub mod defaults {
    /// Image tag produced by the build stage
    pub const IMAGE_NAME: &str = "crsp-mall";

    /// Name of the single managed container
    pub const CONTAINER_NAME: &str = "crsp-mall-container";

    /// Host-side port published for the application
    pub const HOST_PORT: u16 = 1000;

    /// Container engine program
    pub const ENGINE: &str = "docker";

    /// Seconds to wait between starting the container and observing it
    pub const SETTLE_DELAY_SECS: u64 = 10;

    /// Number of log lines fetched after start
    pub const LOG_TAIL_LINES: usize = 20;
}

/// Marker files probed during stack detection
pub mod markers {
    pub const MAVEN_DESCRIPTOR: &str = "pom.xml";
    pub const GRADLE_DESCRIPTOR: &str = "build.gradle";
    pub const NODE_MANIFEST: &str = "package.json";
    pub const PYTHON_REQUIREMENTS: &str = "requirements.txt";
}

/// Generated files written to the project root
pub mod generated {
    /// Build recipe consumed by the engine
    pub const RECIPE_FILE_NAME: &str = "Dockerfile";

    /// Build-context exclusion list
    pub const EXCLUSION_FILE_NAME: &str = ".dockerignore";
}

/// Build the recipe path inside a project directory
pub fn recipe_path(project_dir: &Path) -> PathBuf {
    project_dir.join(generated::RECIPE_FILE_NAME)
}

/// Build the exclusion list path inside a project directory
pub fn exclusion_path(project_dir: &Path) -> PathBuf {
    project_dir.join(generated::EXCLUSION_FILE_NAME)
}

/// Build config directory path in user's home directory
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    home_dir.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)
}
