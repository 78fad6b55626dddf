//! In-memory container engine for pipeline integration tests.
//!
//! Understands the subset of the engine CLI the pipeline issues and keeps
//! images and containers in a shared table, so tests can assert on engine
//! state after a run instead of on individual invocations.

#![allow(dead_code)]

use async_trait::async_trait;
use stackdeploy::executor::mock::ScriptedStream;
use stackdeploy::executor::{
    CommandExecutor, ExecutionCommand, ExecutionResult, ExecutorError, OutputStream,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeContainer {
    pub id: String,
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
    pub running: bool,
}

#[derive(Debug, Default)]
struct State {
    images: BTreeSet<String>,
    containers: BTreeMap<String, FakeContainer>,
    next_id: u64,
    journal: Vec<ExecutionCommand>,
    fail_builds: bool,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make every subsequent build exit non-zero
    pub fn fail_builds(&self) {
        self.state().fail_builds = true;
    }

    /// Seed a running container, as if left over from an earlier deployment
    pub fn add_running(&self, name: &str, image: &str, host_port: u16) -> String {
        let mut state = self.state();
        state.images.insert(image.to_string());
        let id = next_id(&mut state);
        state.containers.insert(
            name.to_string(),
            FakeContainer {
                id: id.clone(),
                image: image.to_string(),
                host_port,
                container_port: 8080,
                running: true,
            },
        );
        id
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state().containers.keys().cloned().collect()
    }

    pub fn running_count(&self) -> usize {
        self.state().containers.values().filter(|c| c.running).count()
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.state().images.contains(image)
    }

    /// Subcommands received so far, in order
    pub fn subcommands(&self) -> Vec<String> {
        self.state()
            .journal
            .iter()
            .filter_map(|cmd| cmd.subcommand().map(str::to_string))
            .collect()
    }

    fn handle(&self, cmd: &ExecutionCommand) -> (String, String, i32) {
        let mut state = self.state();
        state.journal.push(cmd.clone());

        let args: Vec<&str> = cmd.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["--version"] => ok("Docker version 27.0.3-fake, build 0000000\n"),
            ["stop", name] => match state.containers.get_mut(*name) {
                Some(container) => {
                    container.running = false;
                    ok(&format!("{}\n", name))
                }
                None => no_such_container(name),
            },
            ["rm", name] => match state.containers.get(*name).map(|c| c.running) {
                Some(true) => (
                    String::new(),
                    format!("Error response from daemon: cannot remove container \"/{}\": container is running\n", name),
                    1,
                ),
                Some(false) => {
                    state.containers.remove(*name);
                    ok(&format!("{}\n", name))
                }
                None => no_such_container(name),
            },
            ["run", "-d", "--name", name, "-p", mapping, "--restart", _, image] => {
                run(&mut state, name, mapping, image)
            }
            ["ps", "-a", "--filter", filter, "--format", _] => {
                let needle = filter.trim_start_matches("name=");
                let rows: String = state
                    .containers
                    .iter()
                    .filter(|(name, _)| name.contains(needle))
                    .map(|(name, c)| {
                        if c.running {
                            format!(
                                "{}\trunning\tUp 1 second\t0.0.0.0:{}->{}/tcp\n",
                                name, c.host_port, c.container_port
                            )
                        } else {
                            format!("{}\texited\tExited (0) 1 second ago\t\n", name)
                        }
                    })
                    .collect();
                ok(&rows)
            }
            ["logs", "--tail", _, name] => {
                if state.containers.contains_key(*name) {
                    ("Application started\n".to_string(), String::new(), 0)
                } else {
                    no_such_container(name)
                }
            }
            _ => (String::new(), format!("unsupported command: {}\n", cmd), 2),
        }
    }

    fn handle_build(&self, cmd: &ExecutionCommand) -> (String, String, i32) {
        let mut state = self.state();
        state.journal.push(cmd.clone());

        let image = match cmd.args.as_slice() {
            [build, tag, image, _] if build == "build" && tag == "-t" => image.clone(),
            _ => return (String::new(), format!("unsupported command: {}\n", cmd), 2),
        };

        let has_recipe = cmd
            .working_dir
            .as_deref()
            .map(|dir| dir.join("Dockerfile").is_file())
            .unwrap_or(false);

        if state.fail_builds || !has_recipe {
            return (
                "#1 [internal] load build definition from Dockerfile\n".to_string(),
                "ERROR: failed to solve: failed to read dockerfile\n".to_string(),
                1,
            );
        }

        state.images.insert(image.clone());
        (
            format!(
                "#1 [internal] load build definition from Dockerfile\n#2 exporting to image\n#3 naming to docker.io/library/{}\n",
                image
            ),
            String::new(),
            0,
        )
    }
}

fn next_id(state: &mut State) -> String {
    state.next_id += 1;
    format!("{:064x}", state.next_id)
}

fn ok(stdout: &str) -> (String, String, i32) {
    (stdout.to_string(), String::new(), 0)
}

fn no_such_container(name: &str) -> (String, String, i32) {
    (
        String::new(),
        format!("Error response from daemon: No such container: {}\n", name),
        1,
    )
}

fn run(state: &mut State, name: &str, mapping: &str, image: &str) -> (String, String, i32) {
    if state.containers.contains_key(name) {
        return (
            String::new(),
            format!(
                "docker: Error response from daemon: Conflict. The container name \"/{}\" is already in use.\n",
                name
            ),
            125,
        );
    }
    if !state.images.contains(image) {
        return (
            String::new(),
            format!("Unable to find image '{}:latest' locally\n", image),
            125,
        );
    }

    let (host, container) = mapping.split_once(':').unwrap_or((mapping, "0"));
    let host_port: u16 = host.parse().unwrap_or(0);
    let container_port: u16 = container.parse().unwrap_or(0);

    if state
        .containers
        .values()
        .any(|c| c.running && c.host_port == host_port)
    {
        return (
            String::new(),
            format!(
                "docker: Error response from daemon: Bind for 0.0.0.0:{} failed: port is already allocated.\n",
                host_port
            ),
            125,
        );
    }

    let id = next_id(state);
    state.containers.insert(
        name.to_string(),
        FakeContainer {
            id: id.clone(),
            image: image.to_string(),
            host_port,
            container_port,
            running: true,
        },
    );
    ok(&format!("{}\n", id))
}

#[async_trait]
impl CommandExecutor for FakeEngine {
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError> {
        let (stdout, stderr, exit_code) = self.handle(&cmd);
        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_code,
            duration: Duration::ZERO,
        })
    }

    async fn spawn_streaming(&self, cmd: ExecutionCommand) -> Result<Box<dyn OutputStream>, ExecutorError> {
        let (stdout, stderr, exit_code) = self.handle_build(&cmd);
        Ok(Box::new(ScriptedStream::new(&stdout, &stderr, exit_code)))
    }

    fn executor_type(&self) -> &'static str {
        "fake"
    }
}

/// Write `files` (name, content) into `dir`
pub fn write_project(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
}
