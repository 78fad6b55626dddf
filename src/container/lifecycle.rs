//! Lifecycle of the single managed container.
//!
//! There is no update path: a deployment always tears down whatever container
//! holds the configured name and starts a fresh one from the new image.
//!
//! ```text
//! absent ──remove_existing (no-op)──▶ absent ──run──▶ running | failed-to-start
//! ```

use crate::container::{
    ContainerEngine, ContainerId, ContainerLogs, ContainerState, ContainerStatus, LogFetchError,
    RunError,
};
use tracing::{debug, info, warn};

/// Restart policy applied to every started container
pub const RESTART_POLICY: &str = "unless-stopped";

/// Go template for `ps --format`, one tab-separated row per container
const STATUS_FORMAT: &str = "{{.Names}}\t{{.State}}\t{{.Status}}\t{{.Ports}}";

/// Stop/remove/run/status/logs against one named container.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    engine: ContainerEngine,
}

impl LifecycleManager {
    pub fn new(engine: ContainerEngine) -> Self {
        Self { engine }
    }

    /// Stop, then remove, any container called `name`.
    ///
    /// Best effort: a missing container, an engine error, or a failed launch
    /// are all ignored.
    pub async fn remove_existing(&self, name: &str) {
        info!("Removing existing container (if any): {}", name);

        for action in ["stop", "rm"] {
            match self.engine.execute(&[action, name]).await {
                Ok(result) if result.success() => debug!("{} {}: done", action, name),
                Ok(result) => debug!(
                    "{} {}: exit code {} ({})",
                    action,
                    name,
                    result.exit_code,
                    result.stderr.trim()
                ),
                Err(e) => debug!("{} {}: {}", action, name, e),
            }
        }
    }

    /// Start `image` detached as `name`, publishing `host_port` to `container_port`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Rejected`] with the engine's stderr when the engine
    /// refuses (name conflict, port already bound, missing image), or
    /// [`RunError::Launch`] when the engine cannot be executed.
    pub async fn run(
        &self,
        image: &str,
        name: &str,
        host_port: u16,
        container_port: u16,
    ) -> Result<ContainerId, RunError> {
        let mapping = format!("{}:{}", host_port, container_port);
        info!("Starting container {} from {} ({})", name, image, mapping);

        let result = self
            .engine
            .execute(&["run", "-d", "--name", name, "-p", mapping.as_str(), "--restart", RESTART_POLICY, image])
            .await
            .map_err(RunError::Launch)?;

        if !result.success() {
            return Err(RunError::Rejected {
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        let id = ContainerId::new(result.stdout.trim());
        info!("Container started: {} ({})", name, id.short());
        Ok(id)
    }

    /// Observe the container once.
    ///
    /// Never fails: query problems surface as [`ContainerState::Unknown`].
    pub async fn status(&self, name: &str) -> ContainerStatus {
        let filter = format!("name={}", name);
        let result = self
            .engine
            .execute(&["ps", "-a", "--filter", filter.as_str(), "--format", STATUS_FORMAT])
            .await;

        match result {
            Ok(result) if result.success() => parse_status(&result.stdout, name),
            Ok(result) => {
                warn!("Status query for {} exited with code {}", name, result.exit_code);
                ContainerStatus::unknown(result.stderr.trim())
            }
            Err(e) => {
                warn!("Status query for {} failed: {}", name, e);
                ContainerStatus::unknown(e.to_string())
            }
        }
    }

    /// Fetch the last `tail_lines` lines of container output.
    ///
    /// # Errors
    ///
    /// Returns [`LogFetchError`]; callers treat it as non-fatal.
    pub async fn logs(&self, name: &str, tail_lines: usize) -> Result<ContainerLogs, LogFetchError> {
        let tail = tail_lines.to_string();
        let result = self
            .engine
            .execute(&["logs", "--tail", tail.as_str(), name])
            .await
            .map_err(LogFetchError::Launch)?;

        if !result.success() {
            return Err(LogFetchError::Failed {
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(ContainerLogs {
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}

/// Parse `ps` output rows in [`STATUS_FORMAT`], keeping only an exact name match.
///
/// The engine's name filter matches substrings, so `web` would also list
/// `web-old`; rows for other names are skipped here.
pub fn parse_status(output: &str, name: &str) -> ContainerStatus {
    for row in output.lines() {
        let mut fields = row.split('\t');
        let row_name = fields.next().unwrap_or_default().trim().trim_start_matches('/');
        if row_name != name {
            continue;
        }

        let raw_state = fields.next().unwrap_or_default().trim();
        let state = match raw_state.to_ascii_lowercase().as_str() {
            "running" => ContainerState::Running,
            "exited" | "created" | "dead" | "restarting" => ContainerState::Exited,
            _ => ContainerState::Unknown,
        };
        let detail = fields.next().map(str::trim).filter(|s| !s.is_empty());
        let ports = fields.next().map(str::trim).filter(|s| !s.is_empty());

        return ContainerStatus {
            state,
            detail: detail.map(str::to_string),
            ports: ports.map(str::to_string),
        };
    }

    ContainerStatus::absent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{MockExecutor, MockResponse};
    use std::sync::Arc;

    fn manager(mock: MockExecutor) -> (LifecycleManager, Arc<MockExecutor>) {
        let mock = Arc::new(mock);
        (LifecycleManager::new(ContainerEngine::new(mock.clone(), "docker")), mock)
    }

    #[tokio::test]
    async fn test_remove_existing_ignores_missing_container() {
        let (lifecycle, mock) = manager(
            MockExecutor::new()
                .on(&["stop"], MockResponse::failure(1, "Error response from daemon: No such container: web"))
                .on(&["rm"], MockResponse::failure(1, "Error response from daemon: No such container: web")),
        );

        lifecycle.remove_existing("web").await;

        assert_eq!(mock.subcommands(), vec!["stop", "rm"]);
    }

    #[tokio::test]
    async fn test_remove_existing_ignores_launch_failure() {
        let (lifecycle, mock) = manager(
            MockExecutor::new()
                .on(&["stop"], MockResponse::Missing)
                .on(&["rm"], MockResponse::Missing),
        );

        lifecycle.remove_existing("web").await;
        assert_eq!(mock.invocations().len(), 2);
    }

    #[tokio::test]
    async fn test_run_arguments_and_id() {
        let (lifecycle, mock) = manager(
            MockExecutor::new().on(&["run"], MockResponse::success("9c1f0e2d3b4a5f6e7d8c9b0a1f2e3d4c\n")),
        );

        let id = lifecycle.run("shop", "shop-container", 1000, 8080).await.unwrap();
        assert_eq!(id.short(), "9c1f0e2d3b4a");

        assert_eq!(
            mock.invocations()[0].args,
            vec![
                "run", "-d", "--name", "shop-container", "-p", "1000:8080", "--restart",
                "unless-stopped", "shop"
            ]
        );
    }

    #[tokio::test]
    async fn test_run_rejected_carries_stderr() {
        let (lifecycle, _) = manager(MockExecutor::new().on(
            &["run"],
            MockResponse::failure(
                125,
                "docker: Error response from daemon: Bind for 0.0.0.0:1000 failed: port is already allocated.\n",
            ),
        ));

        let err = lifecycle.run("shop", "shop-container", 1000, 8080).await.unwrap_err();
        match err {
            RunError::Rejected { exit_code, stderr } => {
                assert_eq!(exit_code, 125);
                assert!(stderr.ends_with("port is already allocated."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_running() {
        let (lifecycle, mock) = manager(MockExecutor::new().on(
            &["ps"],
            MockResponse::success("shop-container\trunning\tUp 10 seconds\t0.0.0.0:1000->8080/tcp\n"),
        ));

        let status = lifecycle.status("shop-container").await;
        assert!(status.is_running());
        assert_eq!(status.detail.as_deref(), Some("Up 10 seconds"));
        assert_eq!(status.ports.as_deref(), Some("0.0.0.0:1000->8080/tcp"));
        assert!(mock.invocations()[0].args.contains(&"name=shop-container".to_string()));
    }

    #[tokio::test]
    async fn test_status_query_failure_is_unknown() {
        let (lifecycle, _) = manager(MockExecutor::new().on(&["ps"], MockResponse::failure(1, "daemon down")));

        let status = lifecycle.status("shop-container").await;
        assert_eq!(status.state, ContainerState::Unknown);
        assert_eq!(status.detail.as_deref(), Some("daemon down"));
    }

    #[tokio::test]
    async fn test_logs_returns_both_streams() {
        let (lifecycle, mock) = manager(MockExecutor::new().on(&["logs"], MockResponse::Output {
            stdout: "Tomcat started on port 8080\n".to_string(),
            stderr: "WARN deprecated property\n".to_string(),
            exit_code: 0,
        }));

        let logs = lifecycle.logs("shop-container", 20).await.unwrap();
        assert!(logs.stdout.contains("Tomcat started"));
        assert!(logs.stderr.contains("WARN"));
        assert_eq!(mock.invocations()[0].args, vec!["logs", "--tail", "20", "shop-container"]);
    }

    #[tokio::test]
    async fn test_logs_failure_is_reported() {
        let (lifecycle, _) = manager(
            MockExecutor::new().on(&["logs"], MockResponse::failure(1, "No such container: shop-container")),
        );

        let err = lifecycle.logs("shop-container", 20).await.unwrap_err();
        assert!(matches!(err, LogFetchError::Failed { exit_code: 1, .. }));
    }

    #[test]
    fn test_parse_status_exact_name_only() {
        let output = "shop-container-old\trunning\tUp 2 hours\t\nshop-container\texited\tExited (1) 3 seconds ago\t\n";

        let status = parse_status(output, "shop-container");
        assert_eq!(status.state, ContainerState::Exited);
        assert_eq!(status.detail.as_deref(), Some("Exited (1) 3 seconds ago"));
        assert_eq!(status.ports, None);
    }

    #[test]
    fn test_parse_status_absent() {
        assert_eq!(parse_status("", "shop").state, ContainerState::Absent);
        assert_eq!(parse_status("shop-2\trunning\tUp\t\n", "shop").state, ContainerState::Absent);
    }

    #[test]
    fn test_parse_status_unrecognized_state() {
        assert_eq!(parse_status("shop\tpaused\tUp (Paused)\t\n", "shop").state, ContainerState::Unknown);
        assert_eq!(
            parse_status("shop\trestarting\tRestarting (1) 2 seconds ago\t\n", "shop").state,
            ContainerState::Exited
        );
    }
}
