//! Error types for the release builder.
//!
//! Each variant names the stage that failed so the single line printed on
//! abort tells the operator which external tool or filesystem step to look at.
//! Symbol stripping has no variant: it is best-effort and only ever logged.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort a release run.
#[derive(Debug, Error)]
pub enum DistError {
    /// `Cargo.toml` was not found in the project directory.
    #[error("Cargo.toml not found at {path}")]
    ManifestNotFound {
        /// Path where the manifest was expected.
        path: Utf8PathBuf,
    },

    /// `Cargo.toml` could not be parsed or lacks a package name or version.
    #[error("invalid Cargo.toml at {path}: {reason}")]
    InvalidManifest {
        /// Path to the offending manifest.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The compiler toolchain failed for one build job.
    #[error("cargo build failed for {artifact} ({target}): {reason}")]
    BuildFailed {
        /// Artifact the job was building.
        artifact: String,
        /// Target triple passed to cargo.
        target: String,
        /// Captured stderr or timeout description.
        reason: String,
    },

    /// Creating or populating a staging directory failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// Writing or finalizing an archive failed.
    #[error("packaging {artifact} failed: {source}")]
    PackagingFailed {
        /// Artifact whose archive could not be sealed.
        artifact: String,
        /// The underlying archive writer error.
        #[source]
        source: crate::packaging_error::PackagingError,
    },

    /// The plugin root alias path is occupied by something other than a link.
    #[error("cannot alias {path}: a real file or directory already exists there")]
    AliasConflict {
        /// Path where the alias was to be created.
        path: Utf8PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write progress or summary output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`DistError`].
pub type Result<T> = std::result::Result<T, DistError>;
