//! External process execution.
//!
//! Every tool the release run depends on (cargo, the strip binaries) is
//! invoked through [`CommandExecutor`], so tests can substitute a stub and
//! the pipeline never spawns processes directly.

use crate::error::{DistError, Result};
use std::io::{self, Read};
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// A non-zero exit status is not an error at this level; callers decide
    /// what a failure means for their stage.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while spawning or waiting for the
    /// command, including [`io::ErrorKind::TimedOut`] when a timeout elapses.
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
///
/// # Examples
///
/// ```no_run
/// use bwt_dist::executor::{CommandExecutor, SystemCommandExecutor};
/// use std::time::Duration;
///
/// let executor = SystemCommandExecutor::with_timeout(Duration::from_secs(30));
/// let output = executor.run("cargo", &["--version"])?;
/// assert!(output.status.success());
/// # Ok::<(), bwt_dist::error::DistError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor {
    timeout: Option<Duration>,
}

impl SystemCommandExecutor {
    /// Create an executor that waits for commands indefinitely.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Create an executor that kills commands running longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(cmd);
        command.args(args);

        let Some(timeout) = self.timeout else {
            return command.output().map_err(DistError::from);
        };

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so a chatty build cannot fill the
        // pipe buffer and stall before the deadline.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: join_drain(stdout)?,
                stderr: join_drain(stderr)?,
            }),
            None => {
                kill_quietly(&mut child);
                Err(DistError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{cmd} timed out after {} seconds", timeout.as_secs()),
                )))
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<io::Result<Vec<u8>>>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn join_drain(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(bytes)
}

fn kill_quietly(child: &mut Child) {
    if child.kill().is_err() {
        // Already exited between the timeout and the kill.
    }
    if child.wait().is_err() {
        // Nothing left to reap.
    }
}

/// Extract a trimmed, lossy UTF-8 rendering of a command's stderr.
#[must_use]
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_owned()
}
