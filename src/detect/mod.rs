//! Stack detection from marker files.
//!
//! Every probe runs against the project root regardless of what earlier probes
//! found, accumulating flags. The stack itself is chosen afterwards by walking
//! [`STACK_PRIORITY`], so `pom.xml` beats `package.json` beats `requirements.txt`
//! even when several are present.

mod types;

pub use types::{APPLICATION_PORT, Flag, Marker, ProjectDescriptor, Stack};

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Probe order. All four are evaluated on every detection.
pub const PROBES: [Marker; 4] = [
    Marker::MavenDescriptor,
    Marker::GradleDescriptor,
    Marker::NodeManifest,
    Marker::PythonRequirements,
];

/// Recipe-bearing markers in priority order; the first present one decides the stack.
pub const STACK_PRIORITY: &[(Marker, Stack)] = &[
    (Marker::MavenDescriptor, Stack::MavenSpring),
    (Marker::NodeManifest, Stack::Node),
    (Marker::PythonRequirements, Stack::PythonGeneric),
];

/// Java version used when `pom.xml` declares none of [`KNOWN_JAVA_VERSIONS`]
pub const DEFAULT_JAVA_VERSION: &str = "17";

/// Supported Java versions and the literal that declares each in `pom.xml`
pub const KNOWN_JAVA_VERSIONS: &[(&str, &str)] = &[
    ("17", "<java.version>17</java.version>"),
    ("21", "<java.version>21</java.version>"),
];

const SPRING_BOOT_SIGNATURE: &str = "spring-boot";
const THYMELEAF_SIGNATURE: &str = "thymeleaf";

/// Detection errors. All of them are fatal to a deployment.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Project directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Project path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Cannot read project directory {}: {source}", .path.display())]
    UnreadableDirectory { path: PathBuf, source: io::Error },

    #[error("Cannot read {} as UTF-8 text: {source}", .path.display())]
    UnreadableDescriptor { path: PathBuf, source: io::Error },
}

/// Signals extracted from a Maven descriptor's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenSignals {
    pub spring_boot: bool,
    pub thymeleaf: bool,
    /// Declared version, if it is one of [`KNOWN_JAVA_VERSIONS`]
    pub java_version: Option<&'static str>,
}

/// Scan `pom.xml` content for framework, templating and Java version markers.
pub fn inspect_maven_descriptor(content: &str) -> MavenSignals {
    MavenSignals {
        spring_boot: content.contains(SPRING_BOOT_SIGNATURE),
        thymeleaf: content.contains(THYMELEAF_SIGNATURE),
        java_version: KNOWN_JAVA_VERSIONS
            .iter()
            .find(|(_, literal)| content.contains(literal))
            .map(|(version, _)| *version),
    }
}

/// Pick the stack for a set of present markers.
pub fn select_stack(present: &BTreeSet<Marker>) -> Stack {
    STACK_PRIORITY
        .iter()
        .find(|(marker, _)| present.contains(marker))
        .map(|(_, stack)| *stack)
        .unwrap_or(Stack::Unrecognized)
}

/// Inspect `project_dir` and describe its stack.
///
/// # Errors
///
/// Fails when the directory is missing or unreadable, or when `pom.xml` exists
/// but cannot be read as UTF-8 text.
pub fn detect(project_dir: &Path) -> Result<ProjectDescriptor, DetectionError> {
    ensure_readable_dir(project_dir)?;

    let mut present = BTreeSet::new();
    let mut flags = BTreeSet::new();
    let mut language_version = None;

    for marker in PROBES {
        let path = project_dir.join(marker.file_name());
        if !path.is_file() {
            continue;
        }

        debug!("Found marker {}", path.display());
        present.insert(marker);
        flags.insert(marker.flag());

        if marker == Marker::MavenDescriptor {
            let content = fs::read_to_string(&path)
                .map_err(|source| DetectionError::UnreadableDescriptor { path: path.clone(), source })?;
            let signals = inspect_maven_descriptor(&content);

            if signals.spring_boot {
                flags.insert(Flag::SpringBoot);
            }
            if signals.thymeleaf {
                flags.insert(Flag::Thymeleaf);
            }
            language_version = Some(match signals.java_version {
                Some(version) => version.to_string(),
                None => {
                    flags.insert(Flag::JavaVersionInferred);
                    DEFAULT_JAVA_VERSION.to_string()
                }
            });
        }
    }

    let stack = select_stack(&present);
    info!("Detected stack {} in {}", stack, project_dir.display());

    Ok(ProjectDescriptor {
        stack,
        flags,
        language_version,
    })
}

fn ensure_readable_dir(project_dir: &Path) -> Result<(), DetectionError> {
    let metadata = fs::metadata(project_dir).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DetectionError::MissingDirectory(project_dir.to_path_buf())
        } else {
            DetectionError::UnreadableDirectory {
                path: project_dir.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_dir() {
        return Err(DetectionError::NotADirectory(project_dir.to_path_buf()));
    }

    fs::read_dir(project_dir).map_err(|source| DetectionError::UnreadableDirectory {
        path: project_dir.to_path_buf(),
        source,
    })?;

    Ok(())
}
