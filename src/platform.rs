//! Platform matrix and target capability table.
//!
//! Each release platform has a short alias used in artifact names and a
//! target triple handed to cargo. The triple alone decides which strip tool
//! runs and whether the binary carries an `.exe` suffix; the alias alone
//! decides the archive format.

use log::debug;
use std::fmt;

/// A target triple from the release matrix.
///
/// # Examples
///
/// ```
/// use bwt_dist::platform::TargetTriple;
///
/// let win = TargetTriple::new("x86_64-pc-windows-gnu");
/// assert_eq!(win.binary_extension(), ".exe");
/// assert_eq!(win.profile().strip_tool, Some("x86_64-w64-mingw32-strip"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetTriple(&'static str);

impl TargetTriple {
    /// Wrap a triple string.
    #[must_use]
    pub const fn new(triple: &'static str) -> Self {
        Self(triple)
    }

    /// Return the triple as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Whether this target produces Windows executables.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.0.contains("windows")
    }

    /// Return the executable suffix for this target (`.exe` or empty).
    #[must_use]
    pub fn binary_extension(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Look up the capability record for this target.
    ///
    /// Triples outside the strip table get a profile with no strip tool.
    #[must_use]
    pub fn profile(&self) -> TargetProfile {
        let strip_tool = STRIP_TOOLS
            .iter()
            .find(|(triple, _)| *triple == self.0)
            .map(|(_, tool)| *tool);
        TargetProfile {
            strip_tool,
            binary_extension: self.binary_extension(),
        }
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Toolchain capabilities derived from a target triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    /// Strip binary for this toolchain, if one is known.
    pub strip_tool: Option<&'static str>,
    /// Executable suffix (`.exe` on Windows, otherwise empty).
    pub binary_extension: &'static str,
}

/// Strip tool per target triple, as installed in the cross-build image.
const STRIP_TOOLS: &[(&str, &str)] = &[
    ("x86_64-unknown-linux-gnu", "strip"),
    ("x86_64-pc-windows-gnu", "x86_64-w64-mingw32-strip"),
    ("x86_64-apple-darwin", "x86_64-apple-darwin15-strip"),
    ("armv7-unknown-linux-gnueabihf", "arm-linux-gnueabihf-strip"),
    ("aarch64-unknown-linux-gnu", "aarch64-linux-gnu-strip"),
];

/// Archive container used to seal an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball (`.tar.gz`).
    TarGz,
    /// Zip archive (`.zip`).
    Zip,
}

impl ArchiveFormat {
    /// Select the format for a platform alias.
    ///
    /// Aliases containing `linux` or `arm` ship as tarballs; everything else
    /// ships as zip.
    ///
    /// # Examples
    ///
    /// ```
    /// use bwt_dist::platform::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::for_alias("arm32v7"), ArchiveFormat::TarGz);
    /// assert_eq!(ArchiveFormat::for_alias("x86_64-osx"), ArchiveFormat::Zip);
    /// ```
    #[must_use]
    pub fn for_alias(alias: &str) -> Self {
        if alias.contains("linux") || alias.contains("arm") {
            Self::TarGz
        } else {
            Self::Zip
        }
    }

    /// Return the filename extension including the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => ".tar.gz",
            Self::Zip => ".zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TarGz => f.write_str("tar.gz"),
            Self::Zip => f.write_str("zip"),
        }
    }
}

/// One row of the release matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEntry {
    /// Short alias used in artifact names.
    pub alias: &'static str,
    /// Target triple passed to cargo.
    pub target: TargetTriple,
}

impl PlatformEntry {
    /// Archive format for artifacts of this platform.
    #[must_use]
    pub fn archive_format(&self) -> ArchiveFormat {
        ArchiveFormat::for_alias(self.alias)
    }
}

/// The release matrix, in build order.
pub const PLATFORMS: &[PlatformEntry] = &[
    PlatformEntry {
        alias: "x86_64-linux",
        target: TargetTriple::new("x86_64-unknown-linux-gnu"),
    },
    PlatformEntry {
        alias: "x86_64-osx",
        target: TargetTriple::new("x86_64-apple-darwin"),
    },
    PlatformEntry {
        alias: "x86_64-win",
        target: TargetTriple::new("x86_64-pc-windows-gnu"),
    },
    PlatformEntry {
        alias: "arm32v7",
        target: TargetTriple::new("armv7-unknown-linux-gnueabihf"),
    },
    PlatformEntry {
        alias: "arm64v8",
        target: TargetTriple::new("aarch64-unknown-linux-gnu"),
    },
];

/// Which platforms of the matrix to build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlatformFilter {
    /// Every platform in the matrix.
    #[default]
    All,
    /// Substring match: a platform is enabled when its alias occurs inside
    /// any of the tokens, so `x86_64-linux,arm64v8` as one token enables both.
    Substring(Vec<String>),
}

impl PlatformFilter {
    /// Build a filter from user tokens; no tokens means every platform.
    #[must_use]
    pub fn from_tokens(tokens: &[String]) -> Self {
        let cleaned: Vec<String> = tokens
            .iter()
            .map(String::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        if cleaned.is_empty() {
            Self::All
        } else {
            Self::Substring(cleaned)
        }
    }

    /// Whether the platform with this alias is enabled.
    #[must_use]
    pub fn enables(&self, alias: &str) -> bool {
        match self {
            Self::All => true,
            Self::Substring(tokens) => tokens.iter().any(|token| token.contains(alias)),
        }
    }
}

/// Return the matrix rows enabled by `filter`, in matrix order.
///
/// Tokens that match no alias are ignored.
#[must_use]
pub fn select_platforms(filter: &PlatformFilter) -> Vec<&'static PlatformEntry> {
    if let PlatformFilter::Substring(tokens) = filter {
        for token in tokens {
            if !PLATFORMS.iter().any(|p| token.contains(p.alias)) {
                debug!("platform filter token {token:?} matches no known platform");
            }
        }
    }
    PLATFORMS.iter().filter(|p| filter.enables(p.alias)).collect()
}
