//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `deploy`: Detect, generate, build and (re)start the application container
//! - `detect`: Report the detected project type without touching the engine
//! - `status`: Show the managed container's state
//! - `logs`: Show the managed container's recent output
//! - `remove`: Stop and remove the managed container
//! - `show-config`: Show configuration discovery information

use crate::env::LOG_LEVEL_ENV;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    Deploy(DeployOptions),
    Detect(DetectOptions),
    Status { config: Option<PathBuf> },
    Logs { tail: Option<usize>, config: Option<PathBuf> },
    Remove { config: Option<PathBuf> },
    ShowConfig { config: Option<PathBuf> },
}

#[derive(Debug)]
pub struct DeployOptions {
    pub dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub config_override: Option<PathBuf>,
}

#[derive(Debug)]
pub struct DetectOptions {
    pub dir: Option<PathBuf>,
    pub print_recipe: bool,
    pub json: bool,
}

#[derive(Debug, Parser)]
#[command(name = "stackdeploy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Detects a project's stack, generates a Dockerfile, builds the image and (re)starts its container"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long = "log-level",
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build and (re)start the application container
    Deploy {
        /// Project directory (defaults to the current directory)
        #[arg(short = 'd', long = "dir")]
        dir: Option<PathBuf>,
        /// Host port to publish
        #[arg(short = 'p', long = "port", value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Detect the project type
    Detect {
        /// Project directory (defaults to the current directory)
        #[arg(short = 'd', long = "dir")]
        dir: Option<PathBuf>,
        /// Also print the Dockerfile that would be generated
        #[arg(long = "print-recipe")]
        print_recipe: bool,
        /// Print the detection result as JSON
        #[arg(long = "json", conflicts_with = "print_recipe")]
        json: bool,
    },
    /// Show the managed container's status
    Status {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Show the managed container's recent logs
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long = "tail")]
        tail: Option<usize>,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Stop and remove the managed container
    Remove {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Show configuration discovery information
    ShowConfig {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Deploy { dir, port, config }) => Ok(ExecutionMode::Deploy(DeployOptions {
                dir: dir.clone(),
                port: *port,
                config_override: config.clone(),
            })),
            Some(Commands::Detect {
                dir,
                print_recipe,
                json,
            }) => Ok(ExecutionMode::Detect(DetectOptions {
                dir: dir.clone(),
                print_recipe: *print_recipe,
                json: *json,
            })),
            Some(Commands::Status { config }) => Ok(ExecutionMode::Status {
                config: config.clone(),
            }),
            Some(Commands::Logs { tail, config }) => Ok(ExecutionMode::Logs {
                tail: *tail,
                config: config.clone(),
            }),
            Some(Commands::Remove { config }) => Ok(ExecutionMode::Remove {
                config: config.clone(),
            }),
            Some(Commands::ShowConfig { config }) => Ok(ExecutionMode::ShowConfig {
                config: config.clone(),
            }),
            None => Err(
                "No command specified. Use 'stackdeploy --help' to see available commands."
                    .to_string(),
            ),
        }
    }

    /// Log level from flags, then the environment, then `warn`
    pub fn effective_log_level(&self) -> String {
        Self::resolve_log_level(
            self.log_level.as_deref(),
            self.verbose,
            self.quiet,
            std::env::var(LOG_LEVEL_ENV).ok().as_deref(),
        )
    }

    fn resolve_log_level(explicit: Option<&str>, verbose: bool, quiet: bool, from_env: Option<&str>) -> String {
        if let Some(level) = explicit {
            return level.to_string();
        }
        if verbose {
            return "debug".to_string();
        }
        if quiet {
            return "error".to_string();
        }
        from_env
            .map(|level| level.trim().to_lowercase())
            .filter(|level| !level.is_empty())
            .unwrap_or_else(|| "warn".to_string())
    }
}
