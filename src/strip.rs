//! Best-effort symbol stripping.
//!
//! Stripping only shrinks the shipped binary; it never changes behaviour.
//! A missing tool, a failing tool, or a target without a known tool is
//! logged and the run carries on with the unstripped binary.

use crate::executor::{CommandExecutor, stderr_text};
use crate::platform::TargetTriple;
use camino::Utf8Path;
use log::{debug, warn};

/// Outcome of a stripping attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripOutcome {
    /// The strip tool ran successfully.
    Stripped,
    /// No strip tool is registered for the target.
    NoTool,
    /// The tool could not be spawned or exited with an error.
    Failed,
}

/// Strip debug symbols from `binary` with the tool registered for `target`.
#[must_use]
pub fn strip_symbols(
    executor: &dyn CommandExecutor,
    target: TargetTriple,
    binary: &Utf8Path,
) -> StripOutcome {
    let Some(tool) = target.profile().strip_tool else {
        debug!("no strip tool for {target}; leaving {binary} unstripped");
        return StripOutcome::NoTool;
    };

    match executor.run(tool, &[binary.as_str()]) {
        Ok(output) if output.status.success() => {
            debug!("stripped {binary} with {tool}");
            StripOutcome::Stripped
        }
        Ok(output) => {
            warn!("{tool} failed on {binary}: {}", stderr_text(&output));
            StripOutcome::Failed
        }
        Err(e) => {
            warn!("could not run {tool} on {binary}: {e}");
            StripOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DistError;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use rstest::rstest;

    const BINARY: &str = "dist/bwt-0.2.4-x86_64-linux/bwt";

    fn strip_with(executor: &StubExecutor, triple: &'static str) -> StripOutcome {
        let outcome = strip_symbols(executor, TargetTriple::new(triple), Utf8Path::new(BINARY));
        executor.assert_finished();
        outcome
    }

    #[rstest]
    #[case::linux("x86_64-unknown-linux-gnu", "strip")]
    #[case::windows("x86_64-pc-windows-gnu", "x86_64-w64-mingw32-strip")]
    #[case::macos("x86_64-apple-darwin", "x86_64-apple-darwin15-strip")]
    #[case::armv7("armv7-unknown-linux-gnueabihf", "arm-linux-gnueabihf-strip")]
    #[case::aarch64("aarch64-unknown-linux-gnu", "aarch64-linux-gnu-strip")]
    fn dispatches_to_target_tool(#[case] triple: &'static str, #[case] tool: &str) {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            tool,
            &[BINARY],
            Ok(success_output()),
        )]);

        assert_eq!(strip_with(&executor, triple), StripOutcome::Stripped);
    }

    #[test]
    fn unknown_target_is_a_no_op() {
        let executor = StubExecutor::new(Vec::new());

        assert_eq!(
            strip_with(&executor, "wasm32-unknown-unknown"),
            StripOutcome::NoTool
        );
    }

    #[test]
    fn tool_failure_is_not_fatal() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "strip",
            &[BINARY],
            Ok(failure_output("File format not recognized")),
        )]);

        assert_eq!(
            strip_with(&executor, "x86_64-unknown-linux-gnu"),
            StripOutcome::Failed
        );
    }

    #[test]
    fn missing_tool_is_not_fatal() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "aarch64-linux-gnu-strip",
            &[BINARY],
            Err(DistError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "aarch64-linux-gnu-strip not found",
            ))),
        )]);

        assert_eq!(
            strip_with(&executor, "aarch64-unknown-linux-gnu"),
            StripOutcome::Failed
        );
    }
}
