//! Terminal progress output for the `deploy` command.

use crate::container::{ContainerId, ContainerLogs, ContainerStatus, LogFetchError};
use crate::detect::ProjectDescriptor;
use crate::executor::OutputLine;
use crate::pipeline::{DeployError, DeployObserver, DeployReport, DeploymentConfig, Stage};
use crate::recipe::{BuildRecipe, GeneratedFiles};

/// Prints pipeline progress to stdout and failures to stderr.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    show_build_output: bool,
}

impl ConsoleObserver {
    pub fn new(show_build_output: bool) -> Self {
        Self { show_build_output }
    }
}

impl DeployObserver for ConsoleObserver {
    fn stage_started(&mut self, stage: Stage) {
        match stage {
            Stage::ImageBuild | Stage::ContainerStart | Stage::Settle | Stage::LogFetch => {
                println!("==> {}...", capitalize(&stage.to_string()));
            }
            _ => {}
        }
    }

    fn engine_version(&mut self, version: &str) {
        println!("✓ {}", version);
    }

    fn project_detected(&mut self, descriptor: &ProjectDescriptor) {
        println!("✓ Detected project type: {}", descriptor.stack);
        if let Some(version) = &descriptor.language_version {
            println!("  Java version: {}", version);
        }
    }

    fn recipe_written(&mut self, recipe: &BuildRecipe, files: &GeneratedFiles) {
        println!(
            "✓ Generated {} (container port {})",
            files.recipe.display(),
            recipe.container_port
        );
    }

    fn build_output(&mut self, line: &OutputLine) {
        if self.show_build_output {
            println!("    {}", line.text);
        }
    }

    fn container_started(&mut self, id: &ContainerId, config: &DeploymentConfig) {
        println!("✓ Container started: {} ({})", config.container_name, id.short());
        println!("  Application URL: {}", config.access_url());
    }

    fn status_observed(&mut self, status: &ContainerStatus) {
        print_status(status);
    }

    fn logs_fetched(&mut self, logs: Result<&ContainerLogs, &LogFetchError>) {
        match logs {
            Ok(logs) => print_logs(logs),
            Err(e) => eprintln!("⚠ Could not fetch container logs: {}", e),
        }
    }

    fn failed(&mut self, stage: Stage, error: &DeployError) {
        eprintln!("✗ Deployment failed while {}: {}", stage, error);
    }

    fn finished(&mut self, report: &DeployReport) {
        println!();
        println!(
            "✅ Deployed {} as {} in {:.1}s",
            report.image_name,
            report.container_name,
            report.elapsed().num_milliseconds() as f64 / 1000.0
        );
        println!("   Open {}", report.access_url);
    }
}

/// Print one status observation
pub fn print_status(status: &ContainerStatus) {
    println!("Container status: {}", status.state);
    if let Some(detail) = &status.detail {
        println!("  {}", detail);
    }
    if let Some(ports) = &status.ports {
        println!("  Ports: {}", ports);
    }
}

/// Print a log tail, stdout first
pub fn print_logs(logs: &ContainerLogs) {
    if logs.is_empty() {
        println!("(no log output)");
        return;
    }
    for line in logs.stdout.lines().chain(logs.stderr.lines()) {
        println!("  {}", line);
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
