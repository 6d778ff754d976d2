//! Process runner for the certification tool
//!
//! Runs an assembled [`CommandLine`] to completion and reports the exit code.
//! Output is either captured in memory or written straight into files (the
//! per-test debug log). Captured output keeps only the last
//! [`MAX_CAPTURED_BYTES`] of each stream.

use std::fs::File;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::launcher::CommandLine;

/// Per-stream limit for captured output; older bytes are dropped
pub const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// Where the child's stdout and stderr go
#[derive(Debug)]
pub enum OutputSink {
    /// Capture into the returned [`ExecutionResult`]
    Capture,
    /// Write into the given files (stdout, stderr)
    Redirect(File, File),
}

/// Outcome of one process run
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Whether the process exited with status 0
    pub fn passed(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit status in `exit status N` form
    pub fn status_text(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Error type for runner operations
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),
}

/// Run a command to completion
pub async fn run(cmd: &CommandLine, sink: OutputSink) -> Result<ExecutionResult, RunnerError> {
    let mut command = cmd.to_command();
    command.stdin(Stdio::null());

    let spawn_err = |e: std::io::Error| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RunnerError::CommandNotFound(cmd.program.display().to_string())
        } else {
            RunnerError::ExecutionFailed(e.to_string())
        }
    };

    let result = match sink {
        OutputSink::Capture => {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
            let mut child = command.spawn().map_err(spawn_err)?;
            let stdout = child.stdout.take();
            let stderr = child.stderr.take();

            let (stdout, stderr, status) = tokio::join!(
                read_tail(stdout, MAX_CAPTURED_BYTES),
                read_tail(stderr, MAX_CAPTURED_BYTES),
                child.wait(),
            );
            let status = status.map_err(|e| RunnerError::ExecutionFailed(e.to_string()))?;

            ExecutionResult {
                exit_code: status.code(),
                stdout,
                stderr,
            }
        }
        OutputSink::Redirect(stdout, stderr) => {
            command.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
            let status = command.status().await.map_err(spawn_err)?;
            ExecutionResult {
                exit_code: status.code(),
                ..Default::default()
            }
        }
    };

    debug!(
        command = %cmd,
        exit_code = ?result.exit_code,
        stdout_bytes = result.stdout.len(),
        stderr_bytes = result.stderr.len(),
        "Process finished"
    );

    Ok(result)
}

/// Drain a child stream to EOF, keeping at most `limit` trailing bytes
async fn read_tail<R: AsyncRead + Unpin>(reader: Option<R>, limit: usize) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };

    let mut tail = Vec::new();
    let mut dropped = 0usize;
    let mut buf = [0u8; 8192];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                // Trim in batches so large outputs are not shifted on every read
                if tail.len() > limit * 2 {
                    let excess = tail.len() - limit;
                    tail.drain(..excess);
                    dropped += excess;
                }
            }
            Err(e) => {
                debug!(error = %e, "Stopped reading child output");
                break;
            }
        }
    }

    if tail.len() > limit {
        let excess = tail.len() - limit;
        tail.drain(..excess);
        dropped += excess;
    }
    if dropped > 0 {
        debug!(dropped_bytes = dropped, "Captured output truncated to its tail");
    }

    String::from_utf8_lossy(&tail).into_owned()
}
