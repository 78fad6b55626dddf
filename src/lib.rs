//! # stackdeploy
//!
//! Turns a source checkout into a running container in one step: detect the
//! project's technology stack, write a matching Dockerfile and
//! `.dockerignore`, build an image, replace the previously deployed container
//! and report on the new one.
//!
//! ## Architecture Overview
//!
//! - **[`detect`]**: Marker-file probing and stack selection
//! - **[`recipe`]**: Pure Dockerfile rendering per stack, plus writing it out
//! - **[`executor`]**: Subprocess seam (`HostExecutor` for real runs, `MockExecutor` for tests)
//! - **[`container`]**: Engine prerequisite check, image builds, container lifecycle
//! - **[`pipeline`]**: The fixed-order deployment run and its progress events
//! - **[`cli`]**: Argument parsing, config discovery and console output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stackdeploy::{DeploymentConfig, deploy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = DeploymentConfig::new("/srv/shop", 1000);
//!     if !deploy(&config).await {
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod container;
pub mod detect;
pub mod env;
pub mod executor;
pub mod pipeline;
pub mod recipe;

pub use container::{
    ContainerEngine, ContainerId, ContainerState, ContainerStatus, ImageBuilder, LifecycleManager,
};
pub use detect::{ProjectDescriptor, Stack, detect};
pub use executor::{CommandExecutor, HostExecutor, MockExecutor};
pub use pipeline::{
    DeployError, DeployObserver, DeployReport, Deployer, DeploymentConfig, Stage, deploy,
};
pub use recipe::{BuildRecipe, generate};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
