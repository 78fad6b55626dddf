//! Build recipe generation.
//!
//! Maps a [`ProjectDescriptor`] to Dockerfile text plus the static
//! `.dockerignore` that keeps editor state, logs and the generated files
//! themselves out of the build context.

mod templates;

pub use templates::EXCLUSION_LIST;

use crate::detect::{DEFAULT_JAVA_VERSION, ProjectDescriptor, Stack};
use crate::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Recipe generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Detection found no recipe-bearing marker
    #[error(
        "Unsupported project type: expected one of pom.xml (Maven), package.json (Node.js) or requirements.txt (Python)"
    )]
    UnsupportedStack,

    #[error("Failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Generated Dockerfile for one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecipe {
    pub stack: Stack,
    pub language_version: Option<String>,
    pub container_port: u16,
    pub dockerfile: String,
}

/// Paths written by [`BuildRecipe::write_to`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub recipe: PathBuf,
    pub exclusions: PathBuf,
}

/// Render the Dockerfile text for a stack.
///
/// Pure function of its inputs; returns `None` for [`Stack::Unrecognized`].
/// Only Maven recipes use `language_version`.
pub fn render(stack: Stack, language_version: Option<&str>, container_port: u16) -> Option<String> {
    match stack {
        Stack::MavenSpring => Some(templates::maven(
            language_version.unwrap_or(DEFAULT_JAVA_VERSION),
            container_port,
        )),
        Stack::Node => Some(templates::node(container_port)),
        Stack::PythonGeneric => Some(templates::python(container_port)),
        Stack::Unrecognized => None,
    }
}

/// Build the recipe for a detected project.
///
/// # Errors
///
/// Returns [`GenerationError::UnsupportedStack`] when the stack is unrecognized.
pub fn generate(descriptor: &ProjectDescriptor) -> Result<BuildRecipe, GenerationError> {
    let container_port = descriptor
        .stack
        .container_port()
        .ok_or(GenerationError::UnsupportedStack)?;
    let dockerfile = render(
        descriptor.stack,
        descriptor.language_version.as_deref(),
        container_port,
    )
    .ok_or(GenerationError::UnsupportedStack)?;

    Ok(BuildRecipe {
        stack: descriptor.stack,
        language_version: descriptor.language_version.clone(),
        container_port,
        dockerfile,
    })
}

impl BuildRecipe {
    /// Base image of the final stage
    pub fn runtime_image(&self) -> Option<&str> {
        self.dockerfile
            .lines()
            .filter_map(|line| line.strip_prefix("FROM "))
            .last()
            .and_then(|rest| rest.split_whitespace().next())
    }

    /// Whether the recipe has separate build and runtime stages
    pub fn is_multi_stage(&self) -> bool {
        self.dockerfile.lines().filter(|l| l.starts_with("FROM ")).count() > 1
    }

    /// Write `Dockerfile` and `.dockerignore` to the project root, replacing
    /// whatever was there.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Io`] naming the file that could not be written.
    pub fn write_to(&self, project_dir: &Path) -> Result<GeneratedFiles, GenerationError> {
        let recipe = env::recipe_path(project_dir);
        write_file(&recipe, &self.dockerfile)?;
        info!("Dockerfile written: {}", recipe.display());

        let exclusions = env::exclusion_path(project_dir);
        write_file(&exclusions, EXCLUSION_LIST)?;
        info!(".dockerignore written: {}", exclusions.display());

        Ok(GeneratedFiles { recipe, exclusions })
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), GenerationError> {
    fs::write(path, content).map_err(|source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    })
}
