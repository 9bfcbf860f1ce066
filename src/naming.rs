//! Artifact naming convention.
//!
//! Names follow `<project>-<version>[-<kind>]-<platform>`, where the kind
//! segment is absent for the complete build. The archive filename appends
//! the format extension.

use crate::features::Flavor;
use crate::platform::ArchiveFormat;
use crate::version::ProjectInfo;
use std::fmt;

/// Directory name the Electrum plugin loader requires for the plugin module.
pub const PLUGIN_MODULE_ID: &str = "bwt";

/// Which artifact of a platform a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Output of a compiled flavor.
    Build(Flavor),
    /// Electrum plugin repackaged from the electrum-only build.
    ElectrumPlugin,
}

impl ArtifactKind {
    const fn segment(self) -> Option<&'static str> {
        match self {
            Self::Build(Flavor::Complete) => None,
            Self::Build(Flavor::ElectrumOnly) => Some("electrum_only"),
            Self::ElectrumPlugin => Some("electrum_plugin"),
        }
    }
}

/// A versioned artifact name such as `bwt-0.2.4-electrum_only-arm64v8`.
///
/// # Examples
///
/// ```
/// use bwt_dist::features::Flavor;
/// use bwt_dist::naming::{ArtifactKind, ArtifactName};
/// use bwt_dist::platform::ArchiveFormat;
/// use bwt_dist::version::ProjectInfo;
///
/// let project = ProjectInfo::new("bwt", "0.2.4");
/// let name = ArtifactName::new(&project, ArtifactKind::Build(Flavor::ElectrumOnly), "x86_64-win");
/// assert_eq!(name.as_str(), "bwt-0.2.4-electrum_only-x86_64-win");
/// assert_eq!(name.archive_filename(ArchiveFormat::Zip), "bwt-0.2.4-electrum_only-x86_64-win.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Build the name for `kind` on the platform with `alias`.
    #[must_use]
    pub fn new(project: &ProjectInfo, kind: ArtifactKind, alias: &str) -> Self {
        let prefix = project.release_prefix();
        match kind.segment() {
            Some(segment) => Self(format!("{prefix}-{segment}-{alias}")),
            None => Self(format!("{prefix}-{alias}")),
        }
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the archive filename for `format`.
    #[must_use]
    pub fn archive_filename(&self, format: ArchiveFormat) -> String {
        format!("{}{}", self.0, format.extension())
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
