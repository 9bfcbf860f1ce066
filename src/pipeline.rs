//! Release pipeline orchestration.
//!
//! Expands the filtered platform matrix into an ordered [`ReleasePlan`] and
//! runs it: per platform, the complete build, the electrum-only build and
//! the plugin repackaging, each sealed before the next starts. The first
//! failure aborts the run. Staging directories are removed only after every
//! archive has been sealed.

use crate::builder::{BuildConfig, BuildJob, Builder};
use crate::cleanup::cleanup;
use crate::error::{DistError, Result};
use crate::executor::CommandExecutor;
use crate::features::Flavor;
use crate::naming::{ArtifactKind, ArtifactName};
use crate::output::write_stderr_line;
use crate::packager::{Packager, SealedArchive};
use crate::platform::{ArchiveFormat, PlatformEntry, PlatformFilter, select_platforms};
use crate::plugin::PluginRepackager;
use crate::version::ProjectInfo;
use camino::Utf8PathBuf;
use log::{info, warn};
use std::fs;
use std::io::Write;

/// Settings for one release run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding the project's `Cargo.toml`, README and LICENSE.
    pub project_dir: Utf8PathBuf,
    /// Directory receiving the archives.
    pub dist_dir: Utf8PathBuf,
    /// Directory holding the Electrum plugin's Python sources.
    pub plugin_dir: Utf8PathBuf,
    /// Which platforms to build.
    pub filter: PlatformFilter,
    /// Optional rustup toolchain override.
    pub toolchain: Option<String>,
    /// Build only the electrum-only and plugin artifacts.
    pub skip_complete: bool,
    /// Do not produce plugin artifacts.
    pub skip_plugin: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// One step of a release plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// Compile, stage and seal a build flavor.
    Build(BuildJob),
    /// Repackage an electrum-only staging directory as the Electrum plugin.
    Plugin {
        /// Platform the plugin is for.
        platform: &'static PlatformEntry,
        /// Name of the plugin artifact.
        artifact_name: ArtifactName,
        /// Electrum-only artifact whose staging directory is carried over.
        source: ArtifactName,
    },
}

impl PlanStep {
    /// Name of the artifact this step seals.
    #[must_use]
    pub fn artifact_name(&self) -> &ArtifactName {
        match self {
            Self::Build(job) => &job.artifact_name,
            Self::Plugin { artifact_name, .. } => artifact_name,
        }
    }

    /// Archive format the step produces.
    #[must_use]
    pub fn format(&self) -> ArchiveFormat {
        match self {
            Self::Build(job) => job.format,
            Self::Plugin { platform, .. } => platform.archive_format(),
        }
    }
}

/// Ordered steps of a release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Project being released.
    pub project: ProjectInfo,
    /// Steps in execution order.
    pub steps: Vec<PlanStep>,
}

impl ReleasePlan {
    /// Archive filenames the plan will produce, in order.
    #[must_use]
    pub fn archive_filenames(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|step| step.artifact_name().archive_filename(step.format()))
            .collect()
    }
}

/// Sequences builds, packaging, plugin repackaging and cleanup.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
    project: ProjectInfo,
}

impl Pipeline {
    /// Create a pipeline releasing `project` with `config`.
    #[must_use]
    pub fn new(config: RunConfig, project: ProjectInfo) -> Self {
        Self { config, project }
    }

    /// Return the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Builder configuration derived from the run configuration.
    #[must_use]
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig {
            project: self.project.clone(),
            project_dir: self.config.project_dir.clone(),
            dist_dir: self.config.dist_dir.clone(),
            toolchain: self.config.toolchain.clone(),
        }
    }

    /// Expand the filtered matrix into the ordered steps of the run.
    #[must_use]
    pub fn plan(&self) -> ReleasePlan {
        let mut steps = Vec::new();
        for platform in select_platforms(&self.config.filter) {
            if !self.config.skip_complete {
                steps.push(PlanStep::Build(BuildJob::new(
                    &self.project,
                    platform,
                    Flavor::Complete,
                )));
            }
            let electrum_only = BuildJob::new(&self.project, platform, Flavor::ElectrumOnly);
            let source = electrum_only.artifact_name.clone();
            steps.push(PlanStep::Build(electrum_only));
            if !self.config.skip_plugin {
                steps.push(PlanStep::Plugin {
                    platform,
                    artifact_name: ArtifactName::new(
                        &self.project,
                        ArtifactKind::ElectrumPlugin,
                        platform.alias,
                    ),
                    source,
                });
            }
        }
        ReleasePlan {
            project: self.project.clone(),
            steps,
        }
    }

    /// Execute the plan, stopping at the first failure.
    ///
    /// Returns the sealed archives in plan order.
    ///
    /// # Errors
    ///
    /// Returns the first build, staging, alias or packaging error. Archives
    /// sealed before the failure are left in place; later steps never run.
    pub fn run(
        &self,
        executor: &dyn CommandExecutor,
        stderr: &mut dyn Write,
    ) -> Result<Vec<SealedArchive>> {
        let plan = self.plan();
        let dist_dir = &self.config.dist_dir;
        if plan.steps.is_empty() {
            warn!("no platform matches the target filter; nothing to build");
            return Ok(Vec::new());
        }

        fs::create_dir_all(dist_dir).map_err(|e| DistError::StagingFailed {
            reason: format!("failed to create {dist_dir}: {e}"),
        })?;

        let builder = Builder::new(self.build_config());
        let packager = Packager::new(dist_dir.clone());
        let repackager = PluginRepackager::new(
            self.project.clone(),
            self.config.plugin_dir.clone(),
            packager.clone(),
        );

        let total = plan.steps.len();
        let mut sealed = Vec::with_capacity(total);
        for (index, step) in plan.steps.iter().enumerate() {
            self.progress(
                stderr,
                format!("[{}/{total}] {}", index + 1, step.artifact_name()),
            );
            let archive = match step {
                PlanStep::Build(job) => {
                    builder.build(executor, job)?;
                    packager.pack(&job.artifact_name, job.format, None)?
                }
                PlanStep::Plugin {
                    platform, source, ..
                } => repackager.repackage(platform, &builder.staging_dir(source))?,
            };
            info!("sealed {}", archive.path);
            sealed.push(archive);
        }

        cleanup(
            dist_dir,
            plan.steps.iter().map(|step| step.artifact_name().as_str()),
        )?;
        Ok(sealed)
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl std::fmt::Display) {
        if !self.config.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
