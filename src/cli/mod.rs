//! CLI-specific functionality for stackdeploy
//!
//! This module contains all CLI-related code including argument parsing,
//! configuration discovery and terminal progress output.

pub mod args;
pub mod config;
pub mod console;

pub use args::{Args, DeployOptions, DetectOptions, ExecutionMode};
pub use config::{ConfigDiscovery, DeployDefaults};
pub use console::ConsoleObserver;
