//! Project metadata resolution.
//!
//! Reads the package name and version once from the project's `Cargo.toml`.
//! Both values are used verbatim in every artifact name for the run.

use crate::error::{DistError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;

/// Name and version of the project being released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<PackageSection>,
}

#[derive(Deserialize)]
struct PackageSection {
    name: Option<String>,
    version: Option<toml::Value>,
}

impl ProjectInfo {
    /// Create project info from already-known values.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Read `[package]` name and version from `<project_dir>/Cargo.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::ManifestNotFound`] if the file is missing and
    /// [`DistError::InvalidManifest`] if it cannot be parsed or lacks a
    /// string `name` or `version`. A workspace-inherited version
    /// (`version.workspace = true`) is rejected because the release name
    /// must be known without resolving the workspace.
    pub fn from_project_dir(project_dir: &Utf8Path) -> Result<Self> {
        let path = project_dir.join("Cargo.toml");
        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DistError::ManifestNotFound { path: path.clone() },
            _ => DistError::Io(e),
        })?;
        parse_manifest(&contents).map_err(|reason| DistError::InvalidManifest { path, reason })
    }

    /// Package name, also the name of the produced binary.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the `<name>-<version>` prefix shared by every artifact.
    #[must_use]
    pub fn release_prefix(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Parse manifest text into [`ProjectInfo`], returning a reason on failure.
fn parse_manifest(contents: &str) -> std::result::Result<ProjectInfo, String> {
    let manifest: CargoManifest = toml::from_str(contents).map_err(|e| e.to_string())?;
    let package = manifest
        .package
        .ok_or_else(|| "missing [package] section".to_owned())?;
    let name = package
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "missing package.name".to_owned())?;
    let version = match package.version {
        Some(toml::Value::String(v)) if !v.is_empty() => v,
        Some(toml::Value::Table(_)) => {
            return Err("package.version is inherited from the workspace".to_owned());
        }
        _ => return Err("missing package.version".to_owned()),
    };
    Ok(ProjectInfo { name, version })
}

/// Return the default distribution directory for a project.
#[must_use]
pub fn default_dist_dir(project_dir: &Utf8Path) -> Utf8PathBuf {
    project_dir.join("dist")
}
