//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./stackdeploy.toml or ./.stackdeploy/config.toml
//! 2. User config: ~/.stackdeploy/config.toml
//! 3. System config: /etc/stackdeploy/config.toml
//! 4. Built-in defaults

use crate::env::{self, defaults};
use crate::pipeline::{ConfigError, DeploymentConfig};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Settings that may come from a config file. Missing keys take built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployDefaults {
    pub engine: String,
    pub image_name: String,
    pub container_name: String,
    pub host_port: u16,
    pub settle_delay_secs: u64,
    pub log_tail_lines: usize,
}

impl Default for DeployDefaults {
    fn default() -> Self {
        Self {
            engine: defaults::ENGINE.to_string(),
            image_name: defaults::IMAGE_NAME.to_string(),
            container_name: defaults::CONTAINER_NAME.to_string(),
            host_port: defaults::HOST_PORT,
            settle_delay_secs: defaults::SETTLE_DELAY_SECS,
            log_tail_lines: defaults::LOG_TAIL_LINES,
        }
    }
}

impl DeployDefaults {
    /// Build a validated run configuration, applying command-line overrides.
    ///
    /// Without a directory override the current directory is deployed.
    pub fn to_deployment_config(
        &self,
        dir_override: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<DeploymentConfig, ConfigError> {
        let project_dir = match dir_override {
            Some(dir) => dir,
            None => std_env::current_dir().map_err(ConfigError::CurrentDir)?,
        };

        let config = DeploymentConfig::new(project_dir, port_override.unwrap_or(self.host_port))
            .with_names(self.image_name.clone(), self.container_name.clone())
            .with_engine(self.engine.clone())
            .with_settle_delay(Duration::from_secs(self.settle_delay_secs))
            .with_log_tail_lines(self.log_tail_lines);

        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load `explicit` if given, otherwise the first discovered file, otherwise defaults
    pub fn load(explicit: Option<&Path>) -> Result<DeployDefaults, ConfigError> {
        match explicit {
            Some(path) => {
                info!("Loading configuration override from: {:?}", path);
                DeployDefaults::from_toml_file(path)
            }
            None => Self::discover_config(),
        }
    }

    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<DeployDefaults, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return DeployDefaults::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(DeployDefaults::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::first_existing(Self::get_config_candidates())
    }

    fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Configuration file candidates in priority order
    pub fn get_config_candidates() -> Vec<PathBuf> {
        let current_dir = std_env::current_dir().ok();
        Self::candidates_for(current_dir.as_deref(), Self::get_home_dir().as_deref())
    }

    fn candidates_for(current_dir: Option<&Path>, home_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(current_dir) = current_dir {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(current_dir));
        }

        if let Some(home_dir) = home_dir {
            candidates.push(env::user_config_file_path(home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/stackdeploy/config.toml"));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(PathBuf::from(program_data).join("stackdeploy").join("config.toml"));
        }

        candidates
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info(explicit: Option<&Path>) {
        println!("Configuration Discovery Hierarchy:");
        println!();

        let candidates = Self::get_config_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() { "✓ EXISTS" } else { "✗ NOT A FILE" }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match (explicit, Self::find_config_file()) {
            (Some(path), _) => println!("Active configuration: {:?} (--config)", path),
            (None, Some(found)) => println!("Active configuration: {:?}", found),
            (None, None) => println!("Active configuration: Built-in defaults"),
        }

        println!();
        match Self::load(explicit).and_then(|config| config.to_toml_string()) {
            Ok(rendered) => {
                println!("Effective settings:");
                for line in rendered.lines() {
                    println!("  {}", line);
                }
            }
            Err(e) => println!("Configuration error: {}", e),
        }
    }
}
