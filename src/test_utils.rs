//! Command stubs for exercising the pipeline without real toolchains.

use crate::error::{DistError, Result};
use crate::executor::CommandExecutor;
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// An expected command invocation and the result to hand back.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g. `cargo`).
    pub cmd: String,
    /// The arguments the command must be called with.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
    /// Files written before returning, standing in for tool side effects
    /// such as cargo producing a binary.
    pub creates: Vec<(Utf8PathBuf, Vec<u8>)>,
}

impl ExpectedCall {
    /// Expect `cmd args...` and return `result`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
            result,
            creates: Vec::new(),
        }
    }

    /// Write `contents` to `path` when the call is made.
    #[must_use]
    pub fn creating(mut self, path: impl Into<Utf8PathBuf>, contents: &[u8]) -> Self {
        self.creates.push((path.into(), contents.to_vec()));
        self
    }
}

/// A stub implementation of [`CommandExecutor`] for testing.
///
/// Calls must arrive in the order given; anything else produces
/// [`DistError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Number of expected calls not yet made.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.expected.borrow().len()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} left: {:?}",
            remaining.len(),
            remaining.front().map(|c| &c.cmd)
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| DistError::StubMismatch {
                message: format!("unexpected invocation of {cmd} {args:?}"),
            })?;

        if call.cmd != cmd || call.args.iter().map(String::as_str).ne(args.iter().copied()) {
            return Err(DistError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {cmd} {args:?}",
                    call.cmd, call.args
                ),
            });
        }

        for (path, contents) in &call.creates {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
        }

        call.result
    }
}
