//! End-to-end deployment pipeline.
//!
//! One run executes a fixed sequence and aborts at the first fatal stage:
//!
//! 1. engine prerequisite check
//! 2. project detection
//! 3. Dockerfile and `.dockerignore` generation
//! 4. image build (output streamed)
//! 5. removal of any previous container with the configured name
//! 6. container start
//! 7. fixed settle delay
//! 8. status check
//! 9. log tail (failure here is reported but not fatal)
//!
//! Nothing is rolled back on failure: a generated Dockerfile stays on disk
//! and a previous container removed in step 5 stays removed.

pub mod config;
pub mod observer;

pub use config::{ConfigError, DeploymentConfig};
pub use observer::{DeployObserver, LoggingObserver, Stage};

use crate::container::{
    BuildError, ContainerEngine, ContainerId, ContainerLogs, ContainerStatus, ImageBuilder,
    LifecycleManager, PrerequisiteError, RunError,
};
use crate::detect::{self, DetectionError, ProjectDescriptor};
use crate::recipe::{self, GeneratedFiles, GenerationError};
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Fatal pipeline failures, one variant per stage that can abort a run
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    PrerequisiteMissing(#[from] PrerequisiteError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Run(#[from] RunError),
}

impl DeployError {
    /// Stage that produced this error
    pub fn stage(&self) -> Stage {
        match self {
            DeployError::Config(_) | DeployError::PrerequisiteMissing(_) => Stage::Prerequisites,
            DeployError::Detection(_) => Stage::Detection,
            DeployError::Generation(_) => Stage::RecipeGeneration,
            DeployError::Build(_) => Stage::ImageBuild,
            DeployError::Run(_) => Stage::ContainerStart,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub engine_version: String,
    pub project: ProjectDescriptor,
    pub files: GeneratedFiles,
    pub image_name: String,
    pub container_name: String,
    pub container_id: ContainerId,
    pub status: ContainerStatus,
    /// Log tail, `None` when fetching failed
    pub logs: Option<ContainerLogs>,
    /// Why the log tail is missing
    pub log_error: Option<String>,
    pub access_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeployReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drives one engine through the deployment stages.
#[derive(Debug, Clone)]
pub struct Deployer {
    engine: ContainerEngine,
    images: ImageBuilder,
    lifecycle: LifecycleManager,
}

impl Deployer {
    pub fn new(engine: ContainerEngine) -> Self {
        Self {
            images: ImageBuilder::new(engine.clone()),
            lifecycle: LifecycleManager::new(engine.clone()),
            engine,
        }
    }

    /// Deployer running the configured engine program on the host
    pub fn for_config(config: &DeploymentConfig) -> Self {
        Self::new(ContainerEngine::host(config.engine.clone()))
    }

    pub fn engine(&self) -> &ContainerEngine {
        &self.engine
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Run the pipeline and reduce the outcome to success or failure.
    ///
    /// Failures have already been reported to `observer` and logged.
    pub async fn deploy(&self, config: &DeploymentConfig, observer: &mut dyn DeployObserver) -> bool {
        self.try_deploy(config, observer).await.is_ok()
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first fatal stage's error. Log retrieval failures are
    /// recorded in the report instead.
    pub async fn try_deploy(
        &self,
        config: &DeploymentConfig,
        observer: &mut dyn DeployObserver,
    ) -> Result<DeployReport, DeployError> {
        let mut current = Stage::Prerequisites;
        let result = self.run_stages(config, observer, &mut current).await;

        match &result {
            Ok(report) => {
                info!("Deployment of {} succeeded: {}", report.container_name, report.access_url);
                observer.finished(report);
            }
            Err(e) => {
                error!("Deployment failed while {}: {}", current, e);
                observer.failed(current, e);
            }
        }

        result
    }

    async fn run_stages(
        &self,
        config: &DeploymentConfig,
        observer: &mut dyn DeployObserver,
        current: &mut Stage,
    ) -> Result<DeployReport, DeployError> {
        let started_at = Utc::now();

        enter(current, Stage::Prerequisites, observer);
        config.validate()?;
        let engine_version = self.engine.version().await?;
        info!("Container engine available: {}", engine_version);
        observer.engine_version(&engine_version);

        enter(current, Stage::Detection, observer);
        let project = detect::detect(&config.project_dir)?;
        info!("Detected project type: {}", project.stack);
        observer.project_detected(&project);

        enter(current, Stage::RecipeGeneration, observer);
        let recipe = recipe::generate(&project)?;
        let files = recipe.write_to(&config.project_dir)?;
        observer.recipe_written(&recipe, &files);

        enter(current, Stage::ImageBuild, observer);
        self.images
            .build(&config.project_dir, &config.image_name, |line| observer.build_output(line))
            .await?;

        enter(current, Stage::ContainerReplace, observer);
        self.lifecycle.remove_existing(&config.container_name).await;

        enter(current, Stage::ContainerStart, observer);
        let container_id = self
            .lifecycle
            .run(
                &config.image_name,
                &config.container_name,
                config.host_port,
                recipe.container_port,
            )
            .await?;
        observer.container_started(&container_id, config);

        enter(current, Stage::Settle, observer);
        if !config.settle_delay.is_zero() {
            info!("Waiting {:?} for the application to start", config.settle_delay);
            tokio::time::sleep(config.settle_delay).await;
        }

        enter(current, Stage::StatusCheck, observer);
        let status = self.lifecycle.status(&config.container_name).await;
        observer.status_observed(&status);

        enter(current, Stage::LogFetch, observer);
        let log_result = self
            .lifecycle
            .logs(&config.container_name, config.log_tail_lines)
            .await;
        observer.logs_fetched(log_result.as_ref());
        let (logs, log_error) = match log_result {
            Ok(logs) => (Some(logs), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Ok(DeployReport {
            engine_version,
            project,
            files,
            image_name: config.image_name.clone(),
            container_name: config.container_name.clone(),
            container_id,
            status,
            logs,
            log_error,
            access_url: config.access_url(),
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn enter(current: &mut Stage, stage: Stage, observer: &mut dyn DeployObserver) {
    *current = stage;
    observer.stage_started(stage);
}

/// Deploy with a host engine, reporting progress through `tracing` only.
pub async fn deploy(config: &DeploymentConfig) -> bool {
    Deployer::for_config(config)
        .deploy(config, &mut LoggingObserver)
        .await
}
