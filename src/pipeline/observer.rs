//! Progress notifications emitted by the pipeline.
//!
//! The pipeline itself never prints; presentation layers implement
//! [`DeployObserver`] and decide what to show.

use crate::container::{ContainerId, ContainerLogs, ContainerStatus, LogFetchError};
use crate::detect::ProjectDescriptor;
use crate::executor::OutputLine;
use crate::pipeline::{DeployError, DeployReport, DeploymentConfig};
use crate::recipe::{BuildRecipe, GeneratedFiles};
use std::fmt;
use tracing::{debug, info, warn};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Prerequisites,
    Detection,
    RecipeGeneration,
    ImageBuild,
    ContainerReplace,
    ContainerStart,
    Settle,
    StatusCheck,
    LogFetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::Prerequisites => "checking container engine",
            Stage::Detection => "detecting project type",
            Stage::RecipeGeneration => "generating Dockerfile",
            Stage::ImageBuild => "building image",
            Stage::ContainerReplace => "removing previous container",
            Stage::ContainerStart => "starting container",
            Stage::Settle => "waiting for application start",
            Stage::StatusCheck => "checking container status",
            Stage::LogFetch => "fetching container logs",
        };
        f.write_str(text)
    }
}

/// Receives pipeline progress. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait DeployObserver: Send {
    fn stage_started(&mut self, stage: Stage) {}

    fn engine_version(&mut self, version: &str) {}

    fn project_detected(&mut self, descriptor: &ProjectDescriptor) {}

    fn recipe_written(&mut self, recipe: &BuildRecipe, files: &GeneratedFiles) {}

    fn build_output(&mut self, line: &OutputLine) {}

    fn container_started(&mut self, id: &ContainerId, config: &DeploymentConfig) {}

    fn status_observed(&mut self, status: &ContainerStatus) {}

    fn logs_fetched(&mut self, logs: Result<&ContainerLogs, &LogFetchError>) {}

    fn failed(&mut self, stage: Stage, error: &DeployError) {}

    fn finished(&mut self, report: &DeployReport) {}
}

/// Observer that only emits `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl DeployObserver for LoggingObserver {
    fn stage_started(&mut self, stage: Stage) {
        debug!("Stage: {}", stage);
    }

    fn build_output(&mut self, line: &OutputLine) {
        debug!(target: "stackdeploy::build", "{}", line.text);
    }

    fn status_observed(&mut self, status: &ContainerStatus) {
        info!("Container status: {}", status.state);
    }

    fn logs_fetched(&mut self, logs: Result<&ContainerLogs, &LogFetchError>) {
        if let Err(e) = logs {
            warn!("Could not fetch container logs: {}", e);
        }
    }

    fn failed(&mut self, stage: Stage, error: &DeployError) {
        warn!("Deployment failed while {}: {}", stage, error);
    }

    fn finished(&mut self, report: &DeployReport) {
        info!(
            "Deployment finished in {:.1}s: {}",
            report.elapsed().num_milliseconds() as f64 / 1000.0,
            report.access_url
        );
    }
}
