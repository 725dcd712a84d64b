//! Subprocess execution.
//!
//! Only the exit status and stderr of a child are inspected; stdout is
//! discarded.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// A subprocess that could not be run to successful completion.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// The process exited unsuccessfully.
    #[error("Failed to run cmd: {command} (exit code {}): {stderr}", display_code(*.exit_code))]
    Failed {
        /// Full command line.
        command: String,
        /// Exit code, `None` if killed by a signal.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The process could not be started.
    #[error("Failed to start {command}: {source}")]
    Spawn {
        /// Full command line.
        command: String,
        /// Spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// The process was killed after exceeding the timeout.
    #[error("{command} did not finish within {secs}s")]
    Timeout {
        /// Full command line.
        command: String,
        /// Configured limit in seconds.
        secs: u64,
    },
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Render a program and its arguments as a single line for messages.
pub fn command_line<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Run `program` to completion and check that it succeeded.
///
/// The child is killed if `timeout` elapses first.
pub async fn run<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    timeout: Option<Duration>,
) -> Result<(), InstallerError> {
    let command = command_line(program, args);
    debug!("running {command}");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
            InstallerError::Timeout {
                command: command.clone(),
                secs: limit.as_secs(),
            }
        })?,
        None => child.await,
    }
    .map_err(|source| InstallerError::Spawn {
        command: command.clone(),
        source,
    })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    warn!("{command} failed: {stderr}");
    Err(InstallerError::Failed {
        command,
        exit_code: output.status.code(),
        stderr,
    })
}
