//! Container image building.
//!
//! Runs the engine's build with the project directory as build context and
//! forwards output lines as they arrive. Builds can take minutes, so nothing
//! is buffered until completion.

use crate::container::{BuildError, ContainerEngine};
use crate::executor::OutputLine;
use std::path::Path;
use tracing::{error, info, warn};

/// Image builder driving `<engine> build`.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    engine: ContainerEngine,
}

impl ImageBuilder {
    pub fn new(engine: ContainerEngine) -> Self {
        Self { engine }
    }

    /// Build `image_name` from the Dockerfile in `project_dir`.
    ///
    /// `on_line` receives every stdout and stderr line in arrival order. The
    /// stream is fully drained before the exit status is read.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Launch`] if the engine cannot be started and
    /// [`BuildError::Failed`] on a non-zero exit.
    pub async fn build<F>(&self, project_dir: &Path, image_name: &str, mut on_line: F) -> Result<(), BuildError>
    where
        F: FnMut(&OutputLine),
    {
        info!("Building image {} from {}", image_name, project_dir.display());

        let mut stream = self
            .engine
            .stream(&["build", "-t", image_name, "."], project_dir)
            .await
            .map_err(BuildError::Launch)?;

        let mut line_count = 0usize;
        while let Some(line) = stream.next_line().await {
            match line {
                Ok(line) => {
                    line_count += 1;
                    on_line(&line);
                }
                Err(e) => warn!("Error reading build output: {}", e),
            }
        }

        let exit_code = stream.wait().await.map_err(BuildError::Launch)?;
        if exit_code != 0 {
            error!("Image build failed with exit code {} after {} lines", exit_code, line_count);
            return Err(BuildError::Failed { exit_code });
        }

        info!("Successfully built image: {}", image_name);
        Ok(())
    }
}
