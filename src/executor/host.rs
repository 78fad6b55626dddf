//! Native host command execution.
//!
//! Executes commands directly on the host system using `tokio::process::Command`.

use super::{
    CommandExecutor, ExecutionCommand, ExecutionResult, ExecutorError, LineSource, OutputLine,
    OutputStream,
};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};
use which::which;

/// Executes commands directly on the host system
#[derive(Debug, Clone)]
pub struct HostExecutor;

impl HostExecutor {
    /// Create a new host executor
    pub fn new() -> Self {
        Self
    }

    fn resolve(program: &str) -> Result<PathBuf, ExecutorError> {
        which(program).map_err(|_| ExecutorError::ProgramNotFound(program.to_string()))
    }

    fn command(cmd: &ExecutionCommand) -> Result<Command, ExecutorError> {
        let mut command = Command::new(Self::resolve(&cmd.program)?);
        command.args(&cmd.args).stdin(Stdio::null());

        if let Some(ref dir) = cmd.working_dir {
            command.current_dir(dir);
        }

        Ok(command)
    }
}

impl Default for HostExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for HostExecutor {
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError> {
        debug!("Executing command on host: {}", cmd);

        let start = Instant::now();
        let output = Self::command(&cmd)?.output().await?;
        let duration = start.elapsed();

        Ok(ExecutionResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
        })
    }

    async fn spawn_streaming(
        &self,
        cmd: ExecutionCommand,
    ) -> Result<Box<dyn OutputStream>, ExecutorError> {
        debug!("Streaming command on host: {}", cmd);

        let mut child = Self::command(&cmd)?
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutorError::ExecutionFailed(format!("Failed to spawn {}: {}", cmd.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecutorError::ExecutionFailed("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExecutorError::ExecutionFailed("Failed to capture stderr".to_string()))?;

        Ok(Box::new(HostOutputStream {
            child,
            stdout: Some(PipeReader::new(stdout)),
            stderr: Some(PipeReader::new(stderr)),
        }))
    }

    fn executor_type(&self) -> &'static str {
        "host"
    }
}

/// Consecutive read errors tolerated on one pipe before it is given up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 3;

/// Line reader over one child pipe.
///
/// Lines are split on raw bytes and decoded lossily, so output that is not
/// valid UTF-8 still drains the pipe. A trailing `\r` is stripped with the
/// newline.
struct PipeReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    failures: u32,
}

impl<R: AsyncRead + Unpin> PipeReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
            failures: 0,
        }
    }

    /// Returns the next line, or `None` at end of stream.
    ///
    /// Bytes read before the future is dropped stay in `buf`, which makes
    /// this usable as a `tokio::select!` branch.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if self.failures >= MAX_CONSECUTIVE_READ_ERRORS {
                return Ok(None);
            }

            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) if self.buf.is_empty() => return Ok(None),
                Ok(_) => {
                    self.failures = 0;
                    return Ok(Some(self.take_line()));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.failures += 1;
                    return Err(e);
                }
            }
        }
    }

    fn take_line(&mut self) -> String {
        let mut end = self.buf.len();
        if self.buf[..end].ends_with(b"\n") {
            end -= 1;
        }
        if self.buf[..end].ends_with(b"\r") {
            end -= 1;
        }
        let text = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf.clear();
        text
    }
}

/// Merged stdout/stderr of a spawned child.
struct HostOutputStream {
    child: Child,
    stdout: Option<PipeReader<ChildStdout>>,
    stderr: Option<PipeReader<ChildStderr>>,
}

impl HostOutputStream {
    fn close(&mut self, source: LineSource) {
        match source {
            LineSource::Stdout => self.stdout = None,
            LineSource::Stderr => self.stderr = None,
        }
    }
}

#[async_trait]
impl OutputStream for HostOutputStream {
    async fn next_line(&mut self) -> Option<Result<OutputLine, ExecutorError>> {
        loop {
            let (source, read) = match (self.stdout.as_mut(), self.stderr.as_mut()) {
                (None, None) => return None,
                (Some(out), None) => (LineSource::Stdout, out.read_line().await),
                (None, Some(err)) => (LineSource::Stderr, err.read_line().await),
                (Some(out), Some(err)) => tokio::select! {
                    read = out.read_line() => (LineSource::Stdout, read),
                    read = err.read_line() => (LineSource::Stderr, read),
                },
            };

            // A pipe closes only at end of stream; read errors are reported
            // and the pipe keeps draining.
            match read {
                Ok(Some(text)) => return Some(Ok(OutputLine { source, text })),
                Ok(None) => self.close(source),
                Err(e) => {
                    warn!("Read error on child {:?}: {}", source, e);
                    return Some(Err(ExecutorError::IoError(e)));
                }
            }
        }
    }

    async fn wait(self: Box<Self>) -> Result<i32, ExecutorError> {
        let mut this = *self;
        this.stdout = None;
        this.stderr = None;

        let status = this.child.wait().await.map_err(|e| {
            ExecutorError::ExecutionFailed(format!("Failed to wait for child process: {}", e))
        })?;

        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_host_executor_simple_command() {
        let executor = HostExecutor::new();

        let cmd = ExecutionCommand::new("echo", vec!["hello".to_string()]);

        let result = executor.execute(cmd).await.unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("hello"));
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_host_executor_working_directory() {
        let executor = HostExecutor::new();

        let cmd = ExecutionCommand::new("pwd", vec![]).with_working_dir(PathBuf::from("/tmp"));

        let result = executor.execute(cmd).await.unwrap();
        assert_eq!(result.exit_code, 0);
        #[cfg(not(target_os = "windows"))]
        assert!(result.stdout.contains("/tmp") || result.stdout.contains("/private/tmp"));
    }

    #[tokio::test]
    async fn test_host_executor_missing_program() {
        let executor = HostExecutor::new();

        let cmd = ExecutionCommand::new("stackdeploy-no-such-engine", vec!["--version".to_string()]);

        let result = executor.execute(cmd).await;
        assert!(matches!(result, Err(ExecutorError::ProgramNotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_host_executor_nonzero_exit_is_not_an_error() {
        let executor = HostExecutor::new();

        let cmd = ExecutionCommand::new("sh", vec!["-c".to_string(), "echo oops >&2; exit 3".to_string()]);

        let result = executor.execute(cmd).await.unwrap();
        assert_eq!(result.exit_code, 3);
        assert!(result.stderr.contains("oops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_host_executor_streams_both_pipes() {
        let executor = HostExecutor::new();

        let cmd = ExecutionCommand::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo step-1; echo warn-1 >&2; echo step-2; exit 7".to_string(),
            ],
        );

        let mut stream = executor.spawn_streaming(cmd).await.unwrap();
        let mut lines = Vec::new();
        while let Some(line) = stream.next_line().await {
            lines.push(line.unwrap());
        }
        let exit_code = stream.wait().await.unwrap();

        assert_eq!(exit_code, 7);
        assert_eq!(lines.len(), 3);

        let stdout: Vec<_> = lines
            .iter()
            .filter(|l| l.source == LineSource::Stdout)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stdout, vec!["step-1", "step-2"]);
        assert!(lines.contains(&OutputLine::stderr("warn-1")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_host_executor_drains_past_invalid_utf8() {
        let executor = HostExecutor::new();

        let script = "printf 'step-1 \\377\\n'; \
                      i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done; \
                      echo done; exit 0";
        let cmd = ExecutionCommand::new("sh", vec!["-c".to_string(), script.to_string()]);

        let mut stream = executor.spawn_streaming(cmd).await.unwrap();
        let mut lines = Vec::new();
        while let Some(line) = stream.next_line().await {
            lines.push(line.expect("lossy decoding should not fail"));
        }
        let exit_code = stream.wait().await.unwrap();

        assert_eq!(exit_code, 0);
        assert_eq!(lines.len(), 20002);
        assert_eq!(lines[0].text, "step-1 \u{FFFD}");
        assert_eq!(lines[1].text, "line-0");
        assert_eq!(lines[20000].text, "line-19999");
        assert_eq!(lines[20001].text, "done");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_host_executor_strips_carriage_returns() {
        let executor = HostExecutor::new();

        let cmd = ExecutionCommand::new(
            "sh",
            vec![
                "-c".to_string(),
                "printf 'first\\r\\nsecond\\r\\n'; printf 'oops\\r\\n' >&2; printf 'tail'".to_string(),
            ],
        );

        let mut stream = executor.spawn_streaming(cmd).await.unwrap();
        let mut lines = Vec::new();
        while let Some(line) = stream.next_line().await {
            lines.push(line.unwrap());
        }
        assert_eq!(stream.wait().await.unwrap(), 0);

        let stdout: Vec<_> = lines
            .iter()
            .filter(|l| l.source == LineSource::Stdout)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stdout, vec!["first", "second", "tail"]);
        assert!(lines.contains(&OutputLine::stderr("oops")));
    }

    #[tokio::test]
    async fn test_pipe_reader_splits_raw_bytes() {
        let input: &[u8] = b"ok\n\xff\xfe bad\r\n\nlast";
        let mut reader = PipeReader::new(input);

        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("ok"));
        assert_eq!(
            reader.read_line().await.unwrap().as_deref(),
            Some("\u{FFFD}\u{FFFD} bad")
        );
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    /// Reader whose every read fails.
    struct BrokenPipe;

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Err(io::Error::other("broken")))
        }
    }

    #[tokio::test]
    async fn test_pipe_reader_gives_up_after_repeated_errors() {
        let mut reader = PipeReader::new(BrokenPipe);

        for _ in 0..MAX_CONSECUTIVE_READ_ERRORS {
            assert!(reader.read_line().await.is_err());
        }
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_host_executor_type() {
        let executor = HostExecutor::new();
        assert_eq!(executor.executor_type(), "host");
    }
}
