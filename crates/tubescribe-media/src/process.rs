//! Subprocess execution for the external media tools.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use tubescribe_core::EngineError;

/// Captured result of a finished process.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    /// Exit status; -1 when killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last few lines of stderr, for error messages.
    pub fn stderr_tail(&self) -> String {
        let lines: Vec<&str> = self
            .stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(3);
        let tail = lines[start..].join(" | ");
        if tail.is_empty() {
            format!("exit code {}", self.exit_code)
        } else {
            tail
        }
    }
}

/// Why a tool could not be run to completion.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The binary does not exist.
    #[error("{program} not found on PATH")]
    NotFound {
        /// Binary as configured.
        program: String,
    },
    /// Spawning or waiting failed.
    #[error("failed to run {program}: {source}")]
    Io {
        /// Binary as configured.
        program: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The child was killed at the time limit.
    #[error("{program} timed out after {timeout:?}")]
    TimedOut {
        /// Binary as configured.
        program: String,
        /// Limit that was hit.
        timeout: Duration,
    },
}

impl CommandError {
    /// Convert to an engine error. A missing binary means the engine is
    /// unavailable; anything else is reported through `wrap`.
    pub fn into_engine_error(self, wrap: fn(String) -> EngineError) -> EngineError {
        match self {
            Self::NotFound { .. } => EngineError::Unavailable(self.to_string()),
            Self::TimedOut { timeout, .. } => EngineError::Timeout(timeout),
            Self::Io { .. } => wrap(self.to_string()),
        }
    }
}

/// Run `program` with `args`, capturing output. The child is killed if it
/// outlives `timeout` or the returned future is dropped.
pub async fn run_command<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<CommandOutput, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();
    let mut cmd = tokio::process::Command::new(program);
    let _ = cmd
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program, "spawning process");

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            CommandError::NotFound {
                program: program.to_string(),
            }
        } else {
            CommandError::Io {
                program: program.to_string(),
                source: e,
            }
        }
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| CommandError::Io {
            program: program.to_string(),
            source: e,
        })?,
        Err(_) => {
            warn!(program, ?timeout, "process timed out");
            return Err(CommandError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(program, exit_code, duration_ms, "process completed");

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
    })
}
