//! Electrum plugin repackaging.
//!
//! The plugin artifact is the electrum-only build plus the Python plugin
//! sources, sealed so that the archive's top-level directory is
//! [`PLUGIN_MODULE_ID`], the name the Electrum plugin loader looks for.

use crate::alias::RootAlias;
use crate::error::{DistError, Result};
use crate::naming::{ArtifactKind, ArtifactName, PLUGIN_MODULE_ID};
use crate::packager::{Packager, SealedArchive};
use crate::platform::PlatformEntry;
use crate::version::ProjectInfo;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;

/// Extension of the plugin source files copied into the artifact.
const PLUGIN_SOURCE_EXTENSION: &str = "py";

/// Derives plugin archives from electrum-only staging directories.
#[derive(Debug, Clone)]
pub struct PluginRepackager {
    project: ProjectInfo,
    plugin_dir: Utf8PathBuf,
    packager: Packager,
}

impl PluginRepackager {
    /// Create a repackager reading plugin sources from `plugin_dir`.
    #[must_use]
    pub fn new(project: ProjectInfo, plugin_dir: impl Into<Utf8PathBuf>, packager: Packager) -> Self {
        Self {
            project,
            plugin_dir: plugin_dir.into(),
            packager,
        }
    }

    /// Name of the plugin artifact for `platform`.
    #[must_use]
    pub fn artifact_name(&self, platform: &PlatformEntry) -> ArtifactName {
        ArtifactName::new(&self.project, ArtifactKind::ElectrumPlugin, platform.alias)
    }

    /// Stage and seal the plugin artifact for `platform`.
    ///
    /// `electrum_only_dir` is the staging directory of the platform's
    /// electrum-only build; every file in it is carried over.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::StagingFailed`] if the plugin sources or the
    /// electrum-only files cannot be copied, [`DistError::AliasConflict`] if
    /// `<dist>/bwt` is a real directory, and [`DistError::PackagingFailed`]
    /// if sealing fails. The alias is removed in every case.
    pub fn repackage(
        &self,
        platform: &PlatformEntry,
        electrum_only_dir: &Utf8Path,
    ) -> Result<SealedArchive> {
        let name = self.artifact_name(platform);
        let dist_dir = self.packager.dist_dir();
        let staging_dir = dist_dir.join(name.as_str());
        info!("repackaging {name} for the Electrum plugin loader");

        if staging_dir.exists() {
            fs::remove_dir_all(&staging_dir).map_err(|e| staging_failed(&staging_dir, &e))?;
        }
        fs::create_dir_all(&staging_dir).map_err(|e| staging_failed(&staging_dir, &e))?;

        let sources = plugin_sources(&self.plugin_dir)?;
        copy_files(&sources, &staging_dir)?;
        copy_files(&files_in(electrum_only_dir)?, &staging_dir)?;

        let _alias = RootAlias::acquire(dist_dir, PLUGIN_MODULE_ID, &staging_dir)?;
        self.packager
            .pack(&name, platform.archive_format(), Some(PLUGIN_MODULE_ID))
    }
}

/// The `*.py` files directly inside `plugin_dir`, sorted.
fn plugin_sources(plugin_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let sources: Vec<Utf8PathBuf> = files_in(plugin_dir)?
        .into_iter()
        .filter(|p| p.extension() == Some(PLUGIN_SOURCE_EXTENSION))
        .collect();
    if sources.is_empty() {
        return Err(DistError::StagingFailed {
            reason: format!("no plugin sources (*.py) found in {plugin_dir}"),
        });
    }
    debug!("found {} plugin source files in {plugin_dir}", sources.len());
    Ok(sources)
}

/// Regular files directly inside `dir`, sorted by name.
fn files_in(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let entries = dir.read_dir_utf8().map_err(|e| staging_failed(dir, &e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| staging_failed(dir, &e))?;
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn copy_files(files: &[Utf8PathBuf], dest_dir: &Utf8Path) -> Result<()> {
    for source in files {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let dest = dest_dir.join(file_name);
        fs::copy(source, &dest).map_err(|e| DistError::StagingFailed {
            reason: format!("failed to copy {source} to {dest}: {e}"),
        })?;
    }
    Ok(())
}

fn staging_failed(path: &Utf8Path, err: &std::io::Error) -> DistError {
    DistError::StagingFailed {
        reason: format!("{path}: {err}"),
    }
}
