//! Scripted command executor.
//!
//! Replies to commands from a list of argument-prefix rules and keeps a journal
//! of every invocation, so engine interactions can be asserted without an engine.

use super::{
    CommandExecutor, ExecutionCommand, ExecutionResult, ExecutorError, OutputLine, OutputStream,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Canned reply for a matched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Process ran and produced this output
    Output {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    /// Stdout split by one failed read; the stream continues afterwards
    Garbled {
        before: String,
        after: String,
        exit_code: i32,
    },
    /// Program is not installed
    Missing,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::Output {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::Output {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

struct Rule {
    prefix: Vec<String>,
    response: MockResponse,
}

/// Executor that never spawns anything.
///
/// Rules are checked in registration order; the first whose prefix matches the
/// command's leading arguments wins. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct MockExecutor {
    rules: Vec<Rule>,
    journal: Mutex<Vec<ExecutionCommand>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `response` to commands whose arguments start with `prefix`
    pub fn on(mut self, prefix: &[&str], response: MockResponse) -> Self {
        self.rules.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        });
        self
    }

    /// Every command received so far, in order
    pub fn invocations(&self) -> Vec<ExecutionCommand> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subcommands received so far (`build`, `run`, ...), in order
    pub fn subcommands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .filter_map(|cmd| cmd.subcommand().map(str::to_string))
            .collect()
    }

    fn respond(&self, cmd: &ExecutionCommand) -> MockResponse {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(cmd.clone());

        self.rules
            .iter()
            .find(|rule| cmd.args.starts_with(&rule.prefix))
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError> {
        match self.respond(&cmd) {
            MockResponse::Output {
                stdout,
                stderr,
                exit_code,
            } => Ok(ExecutionResult {
                stdout,
                stderr,
                exit_code,
                duration: Duration::ZERO,
            }),
            MockResponse::Garbled {
                before,
                after,
                exit_code,
            } => Ok(ExecutionResult {
                stdout: before + &after,
                stderr: String::new(),
                exit_code,
                duration: Duration::ZERO,
            }),
            MockResponse::Missing => Err(ExecutorError::ProgramNotFound(cmd.program)),
        }
    }

    async fn spawn_streaming(
        &self,
        cmd: ExecutionCommand,
    ) -> Result<Box<dyn OutputStream>, ExecutorError> {
        match self.respond(&cmd) {
            MockResponse::Output {
                stdout,
                stderr,
                exit_code,
            } => Ok(Box::new(ScriptedStream::new(&stdout, &stderr, exit_code))),
            MockResponse::Garbled {
                before,
                after,
                exit_code,
            } => Ok(Box::new(ScriptedStream::garbled(&before, &after, exit_code))),
            MockResponse::Missing => Err(ExecutorError::ProgramNotFound(cmd.program)),
        }
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

/// Pre-recorded output replayed line by line.
///
/// A `None` entry replays as a read error.
pub struct ScriptedStream {
    lines: VecDeque<Option<OutputLine>>,
    exit_code: i32,
}

impl ScriptedStream {
    /// Stdout lines first, then stderr lines
    pub fn new(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        let lines = stdout
            .lines()
            .map(OutputLine::stdout)
            .chain(stderr.lines().map(OutputLine::stderr))
            .map(Some)
            .collect();

        Self { lines, exit_code }
    }

    /// Stdout lines with one failed read between `before` and `after`
    pub fn garbled(before: &str, after: &str, exit_code: i32) -> Self {
        let lines = before
            .lines()
            .map(|l| Some(OutputLine::stdout(l)))
            .chain(std::iter::once(None))
            .chain(after.lines().map(|l| Some(OutputLine::stdout(l))))
            .collect();

        Self { lines, exit_code }
    }
}

#[async_trait]
impl OutputStream for ScriptedStream {
    async fn next_line(&mut self) -> Option<Result<OutputLine, ExecutorError>> {
        self.lines.pop_front().map(|line| {
            line.ok_or_else(|| {
                ExecutorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "stream did not contain valid UTF-8",
                ))
            })
        })
    }

    async fn wait(self: Box<Self>) -> Result<i32, ExecutorError> {
        Ok(self.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docker(args: &[&str]) -> ExecutionCommand {
        ExecutionCommand::new("docker", args.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let executor = MockExecutor::new()
            .on(&["logs", "--tail"], MockResponse::success("tail"))
            .on(&["logs"], MockResponse::success("any"));

        let result = executor.execute(docker(&["logs", "--tail", "5", "web"])).await.unwrap();
        assert_eq!(result.stdout, "tail");

        let result = executor.execute(docker(&["logs", "web"])).await.unwrap();
        assert_eq!(result.stdout, "any");
    }

    #[tokio::test]
    async fn test_unmatched_command_succeeds_and_is_journaled() {
        let executor = MockExecutor::new();

        let result = executor.execute(docker(&["stop", "web"])).await.unwrap();
        assert!(result.success());
        assert_eq!(executor.subcommands(), vec!["stop"]);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let executor = MockExecutor::new().on(&["--version"], MockResponse::Missing);

        let result = executor.execute(docker(&["--version"])).await;
        assert!(matches!(result, Err(ExecutorError::ProgramNotFound(p)) if p == "docker"));
    }

    #[tokio::test]
    async fn test_scripted_stream_replays_lines() {
        let executor =
            MockExecutor::new().on(&["build"], MockResponse::Output {
                stdout: "Step 1/2\nStep 2/2\n".to_string(),
                stderr: "warning\n".to_string(),
                exit_code: 1,
            });

        let mut stream = executor.spawn_streaming(docker(&["build", "."])).await.unwrap();
        let mut texts = Vec::new();
        while let Some(line) = stream.next_line().await {
            texts.push(line.unwrap().text);
        }

        assert_eq!(texts, vec!["Step 1/2", "Step 2/2", "warning"]);
        assert_eq!(stream.wait().await.unwrap(), 1);
    }
}
