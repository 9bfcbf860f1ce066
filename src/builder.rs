//! Cargo build orchestration for release jobs.
//!
//! One [`BuildJob`] is one `cargo build --release` for a single target triple
//! and feature set. A successful build leaves a staging directory
//! `<dist>/<artifact name>` holding the stripped binary, `README.md` and
//! `LICENSE`, ready for the packager.

use crate::error::{DistError, Result};
use crate::executor::{CommandExecutor, stderr_text};
use crate::features::{FeatureSet, Flavor, features};
use crate::naming::{ArtifactKind, ArtifactName};
use crate::platform::{ArchiveFormat, PlatformEntry, TargetTriple};
use crate::strip::{StripOutcome, strip_symbols};
use crate::version::ProjectInfo;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fs;

/// Documentation files shipped next to every binary.
pub const DOC_FILES: &[&str] = &["README.md", "LICENSE"];

/// A single compile-and-stage unit of the release matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    /// Name of the artifact (and its staging directory).
    pub artifact_name: ArtifactName,
    /// Target triple passed to cargo.
    pub target: TargetTriple,
    /// Cargo features enabled for the build.
    pub features: FeatureSet,
    /// Archive format the staged artifact will be sealed into.
    pub format: ArchiveFormat,
}

impl BuildJob {
    /// Create the job for `flavor` on `platform`.
    #[must_use]
    pub fn new(project: &ProjectInfo, platform: &PlatformEntry, flavor: Flavor) -> Self {
        Self {
            artifact_name: ArtifactName::new(project, ArtifactKind::Build(flavor), platform.alias),
            target: platform.target,
            features: features(platform.alias, flavor),
            format: platform.archive_format(),
        }
    }
}

/// Configuration for the build process.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project being released.
    pub project: ProjectInfo,
    /// Directory holding the project's `Cargo.toml`.
    pub project_dir: Utf8PathBuf,
    /// Directory receiving staging directories and archives.
    pub dist_dir: Utf8PathBuf,
    /// Optional rustup toolchain override, passed as `+<toolchain>`.
    pub toolchain: Option<String>,
}

/// A binary built, moved into its staging directory and stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBinary {
    /// Artifact the staging directory belongs to.
    pub artifact_name: ArtifactName,
    /// `<dist>/<artifact name>`.
    pub staging_dir: Utf8PathBuf,
    /// Location of the staged binary.
    pub binary: Utf8PathBuf,
    /// Result of the best-effort symbol strip.
    pub strip: StripOutcome,
}

/// Builder for compiling and staging release binaries.
#[derive(Debug, Clone)]
pub struct Builder {
    config: BuildConfig,
}

impl Builder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Return the builder configuration.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Arguments passed to `cargo` for `job`.
    #[must_use]
    pub fn cargo_args(&self, job: &BuildJob) -> Vec<String> {
        let project_dir = &self.config.project_dir;
        let mut args = Vec::with_capacity(12);
        if let Some(toolchain) = &self.config.toolchain {
            args.push(format!("+{toolchain}"));
        }
        args.extend(
            [
                "build",
                "--release",
                "--manifest-path",
                project_dir.join("Cargo.toml").as_str(),
                "--target-dir",
                self.target_dir().as_str(),
                "--target",
                job.target.as_str(),
                "--no-default-features",
                "--features",
            ]
            .map(str::to_owned),
        );
        args.push(job.features.to_cargo_arg());
        args
    }

    /// Where cargo leaves the binary built for `target`.
    #[must_use]
    pub fn built_binary_path(&self, target: TargetTriple) -> Utf8PathBuf {
        self.target_dir()
            .join(target.as_str())
            .join("release")
            .join(self.binary_name(target))
    }

    /// Staging directory for `name`.
    #[must_use]
    pub fn staging_dir(&self, name: &ArtifactName) -> Utf8PathBuf {
        self.config.dist_dir.join(name.as_str())
    }

    /// Build `job` and stage its outputs.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::BuildFailed`] if cargo cannot be run, exits
    /// non-zero or times out, and [`DistError::StagingFailed`] if the binary
    /// or documentation cannot be placed in the staging directory.
    pub fn build(&self, executor: &dyn CommandExecutor, job: &BuildJob) -> Result<StagedBinary> {
        info!(
            "building {} for {} with features {}",
            job.artifact_name, job.target, job.features
        );
        let staging_dir = self.staging_dir(&job.artifact_name);
        remove_stale_dir(&staging_dir)?;

        self.run_cargo(executor, job)?;

        fs::create_dir_all(&staging_dir).map_err(|e| DistError::StagingFailed {
            reason: format!("failed to create {staging_dir}: {e}"),
        })?;
        match self.stage(executor, job, &staging_dir) {
            Ok(staged) => {
                debug!("staged {} in {staging_dir}", job.artifact_name);
                Ok(staged)
            }
            Err(err) => {
                if let Err(e) = fs::remove_dir_all(&staging_dir) {
                    warn!("failed to remove partial staging directory {staging_dir}: {e}");
                }
                Err(err)
            }
        }
    }

    fn stage(
        &self,
        executor: &dyn CommandExecutor,
        job: &BuildJob,
        staging_dir: &Utf8Path,
    ) -> Result<StagedBinary> {
        let built = self.built_binary_path(job.target);
        let binary = staging_dir.join(self.binary_name(job.target));
        move_file(&built, &binary)?;

        let strip = strip_symbols(executor, job.target, &binary);

        for doc in DOC_FILES {
            let source = self.config.project_dir.join(doc);
            let dest = staging_dir.join(doc);
            fs::copy(&source, &dest).map_err(|e| DistError::StagingFailed {
                reason: format!("failed to copy {source} to {dest}: {e}"),
            })?;
        }

        Ok(StagedBinary {
            artifact_name: job.artifact_name.clone(),
            staging_dir: staging_dir.to_owned(),
            binary,
            strip,
        })
    }

    fn run_cargo(&self, executor: &dyn CommandExecutor, job: &BuildJob) -> Result<()> {
        let args = self.cargo_args(job);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let failed = |reason: String| DistError::BuildFailed {
            artifact: job.artifact_name.to_string(),
            target: job.target.to_string(),
            reason,
        };

        let output = match executor.run("cargo", &arg_refs) {
            Ok(output) => output,
            Err(DistError::Io(e)) => return Err(failed(e.to_string())),
            Err(other) => return Err(other),
        };
        if !output.status.success() {
            return Err(failed(stderr_text(&output)));
        }
        Ok(())
    }

    fn target_dir(&self) -> Utf8PathBuf {
        self.config.project_dir.join("target")
    }

    fn binary_name(&self, target: TargetTriple) -> String {
        format!("{}{}", self.config.project.name(), target.binary_extension())
    }
}

/// Remove `dir` if left over from an aborted run.
fn remove_stale_dir(dir: &Utf8Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    debug!("removing stale staging directory {dir}");
    fs::remove_dir_all(dir).map_err(|e| DistError::StagingFailed {
        reason: format!("failed to remove stale {dir}: {e}"),
    })
}

/// Move `from` to `to`, copying when a rename crosses filesystems.
fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    if !from.is_file() {
        return Err(DistError::StagingFailed {
            reason: format!("cargo reported success but {from} does not exist"),
        });
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .and_then(|_| fs::remove_file(from))
        .map_err(|e| DistError::StagingFailed {
            reason: format!("failed to move {from} to {to}: {e}"),
        })
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
