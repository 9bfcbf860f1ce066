//! Scoped directory alias for the plugin archive root.
//!
//! The Electrum plugin loader only accepts a module directory named after the
//! plugin identifier, while the plugin is staged under its full artifact
//! name. [`RootAlias`] creates `<dist>/<identifier>` as a symbolic link to the
//! staging directory for as long as the guard lives and removes it on drop,
//! whichever way the packaging step exits.

use crate::error::{DistError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io;

/// A symbolic link that exists for the lifetime of the guard.
#[derive(Debug)]
pub struct RootAlias {
    link: Utf8PathBuf,
}

impl RootAlias {
    /// Link `<dist_dir>/<name>` to `target`.
    ///
    /// A link already at that path (left by an interrupted run) is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::AliasConflict`] if a real file or directory
    /// occupies the path, and [`DistError::Io`] if the link cannot be made.
    pub fn acquire(dist_dir: &Utf8Path, name: &str, target: &Utf8Path) -> Result<Self> {
        let link = dist_dir.join(name);
        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                debug!("removing stale alias {link}");
                remove_link(&link)?;
            }
            Ok(_) => return Err(DistError::AliasConflict { path: link }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let link_target = link_target(dist_dir, target)?;
        symlink_dir(&link_target, &link)?;
        debug!("aliased {link} -> {link_target}");
        Ok(Self { link })
    }

    /// Path of the link.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.link
    }
}

impl Drop for RootAlias {
    fn drop(&mut self) {
        if let Err(e) = remove_link(&self.link) {
            warn!("failed to remove alias {}: {e}", self.link);
        }
    }
}

/// Path stored in the link, which resolves from the link's own directory.
///
/// A sibling of the link is stored by file name; anything else is stored
/// as an absolute path.
fn link_target(dist_dir: &Utf8Path, target: &Utf8Path) -> Result<Utf8PathBuf> {
    match (target.parent(), target.file_name()) {
        (Some(parent), Some(file_name)) if parent == dist_dir => Ok(Utf8PathBuf::from(file_name)),
        _ => target.canonicalize_utf8().map_err(|e| DistError::StagingFailed {
            reason: format!("cannot resolve alias target {target}: {e}"),
        }),
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(link: &Utf8Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Utf8Path) -> io::Result<()> {
    // Directory symlinks are removed as directories on Windows.
    fs::remove_dir(link)
}
