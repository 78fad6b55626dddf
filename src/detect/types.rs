//! Detection result types.

use crate::env::markers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Port the application listens on inside the container, shared by every recipe family
pub const APPLICATION_PORT: u16 = 8080;

/// Inferred technology category of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stack {
    /// Maven project, built as a Spring Boot style executable jar
    MavenSpring,
    /// Node.js project started with `npm start`
    Node,
    /// Python project with a `requirements.txt`
    PythonGeneric,
    /// No recipe-bearing marker found
    Unrecognized,
}

impl Stack {
    /// Whether a recipe exists for this stack
    pub fn is_recognized(self) -> bool {
        !matches!(self, Stack::Unrecognized)
    }

    /// Container-internal port of the stack's recipe family
    pub fn container_port(self) -> Option<u16> {
        match self {
            Stack::MavenSpring | Stack::Node | Stack::PythonGeneric => Some(APPLICATION_PORT),
            Stack::Unrecognized => None,
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stack::MavenSpring => write!(f, "Maven (Spring Boot)"),
            Stack::Node => write!(f, "Node.js"),
            Stack::PythonGeneric => write!(f, "Python"),
            Stack::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Marker file whose presence is probed in the project root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    MavenDescriptor,
    GradleDescriptor,
    NodeManifest,
    PythonRequirements,
}

impl Marker {
    pub fn file_name(self) -> &'static str {
        match self {
            Marker::MavenDescriptor => markers::MAVEN_DESCRIPTOR,
            Marker::GradleDescriptor => markers::GRADLE_DESCRIPTOR,
            Marker::NodeManifest => markers::NODE_MANIFEST,
            Marker::PythonRequirements => markers::PYTHON_REQUIREMENTS,
        }
    }

    /// Flag recorded when the marker is present
    pub fn flag(self) -> Flag {
        match self {
            Marker::MavenDescriptor => Flag::MavenDescriptor,
            Marker::GradleDescriptor => Flag::GradleDescriptor,
            Marker::NodeManifest => Flag::NodeManifest,
            Marker::PythonRequirements => Flag::PythonRequirements,
        }
    }
}

/// Secondary signal found during detection; annotates output, never changes the recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    MavenDescriptor,
    SpringBoot,
    Thymeleaf,
    JavaVersionInferred,
    GradleDescriptor,
    NodeManifest,
    PythonRequirements,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Flag::MavenDescriptor => "Maven project (pom.xml)",
            Flag::SpringBoot => "Spring Boot framework",
            Flag::Thymeleaf => "Thymeleaf templating engine",
            Flag::JavaVersionInferred => "Java version not declared, using default",
            Flag::GradleDescriptor => "Gradle project (build.gradle)",
            Flag::NodeManifest => "Node.js project (package.json)",
            Flag::PythonRequirements => "Python project (requirements.txt)",
        };
        f.write_str(text)
    }
}

/// Immutable result of stack detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub stack: Stack,
    pub flags: BTreeSet<Flag>,
    /// Runtime major version (Java for Maven projects)
    pub language_version: Option<String>,
}

impl ProjectDescriptor {
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }
}
