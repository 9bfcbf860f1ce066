//! Removal of staging directories once their archives are sealed.

use crate::error::{DistError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io;

/// Remove `<dist_dir>/<name>` for every name; absent directories are skipped.
///
/// Returns the directories that were actually removed.
///
/// # Errors
///
/// Returns [`DistError::StagingFailed`] if an existing directory cannot be
/// removed.
pub fn cleanup<I, S>(dist_dir: &Utf8Path, names: I) -> Result<Vec<Utf8PathBuf>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut removed = Vec::new();
    for name in names {
        let dir = dist_dir.join(name.as_ref());
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!("removed staging directory {dir}");
                removed.push(dir);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DistError::StagingFailed {
                    reason: format!("failed to remove {dir}: {e}"),
                });
            }
        }
    }
    Ok(removed)
}
