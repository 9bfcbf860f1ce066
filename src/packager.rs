//! Deterministic archive sealing.
//!
//! Seals a staging directory under the distribution directory into a
//! `.tar.gz` or `.zip` whose bytes depend only on the staged file names,
//! contents and executable bits. Wall-clock time, file ownership, locale and
//! directory iteration order never reach the output:
//!
//! - every timestamp is [`SOURCE_DATE_EPOCH`];
//! - tar entries are owned by uid/gid 0 with empty user and group names;
//! - entries are written in byte-wise sorted path order;
//! - the gzip header carries no file name and a zero mtime;
//! - zip entries carry no extra fields.
//!
//! Archives are written to a temporary file beside the destination and
//! renamed into place only once complete, so a failed run never leaves a
//! truncated archive under the final name.

use crate::error::{DistError, Result};
use crate::naming::ArtifactName;
use crate::packaging_error::PackagingError;
use crate::platform::ArchiveFormat;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::{Compression, GzBuilder};
use log::debug;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Fixed instant stamped on every packaged file: 2017-11-08T16:58:00Z.
pub const SOURCE_DATE_EPOCH: u64 = 1_510_160_280;

/// The same instant as a zip (MS-DOS) date and time, in UTC.
const ZIP_TIMESTAMP: (u16, u8, u8, u8, u8, u8) = (2017, 11, 8, 16, 58, 0);

const DIR_MODE: u32 = 0o755;
const EXECUTABLE_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// A sealed, immutable release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedArchive {
    /// Artifact the archive was built from.
    pub name: ArtifactName,
    /// Final location of the archive.
    pub path: Utf8PathBuf,
    /// Container format.
    pub format: ArchiveFormat,
}

/// Seals staging directories under a distribution directory.
#[derive(Debug, Clone)]
pub struct Packager {
    dist_dir: Utf8PathBuf,
}

impl Packager {
    /// Create a packager for staging directories under `dist_dir`.
    #[must_use]
    pub fn new(dist_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
        }
    }

    /// Return the distribution directory.
    #[must_use]
    pub fn dist_dir(&self) -> &Utf8Path {
        &self.dist_dir
    }

    /// Seal `<dist>/<root>` into `<dist>/<name><ext>`.
    ///
    /// `root` is `root_override` when given, otherwise the artifact name; it
    /// is both the directory read from and the top-level path segment of
    /// every archive entry.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::PackagingFailed`] if the staging tree cannot be
    /// read or the archive cannot be written. No file is left at the final
    /// path in that case.
    pub fn pack(
        &self,
        name: &ArtifactName,
        format: ArchiveFormat,
        root_override: Option<&str>,
    ) -> Result<SealedArchive> {
        let root = root_override.unwrap_or_else(|| name.as_str());
        let path = self.dist_dir.join(name.archive_filename(format));
        debug!("sealing {root} into {path}");

        self.seal(root, format, &path)
            .map_err(|source| DistError::PackagingFailed {
                artifact: name.to_string(),
                source,
            })?;

        Ok(SealedArchive {
            name: name.clone(),
            path,
            format,
        })
    }

    fn seal(
        &self,
        root: &str,
        format: ArchiveFormat,
        destination: &Utf8Path,
    ) -> std::result::Result<(), PackagingError> {
        let source_root = self.dist_dir.join(root);
        if !source_root.is_dir() {
            return Err(PackagingError::MissingSource(source_root.into_std_path_buf()));
        }

        normalize_mtimes(source_root.as_std_path())?;
        let entries = collect_entries(source_root.as_std_path(), root)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".bwt-dist-")
            .suffix(".partial")
            .tempfile_in(&self.dist_dir)?;
        match format {
            ArchiveFormat::TarGz => write_tar_gz(staged.as_file_mut(), &entries)?,
            ArchiveFormat::Zip => write_zip(staged.as_file_mut(), &entries)?,
        }
        staged.as_file().sync_all()?;
        staged.persist(destination)?;
        Ok(())
    }
}

/// Kind of a staged entry, with its normalized permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File { mode: u32, size: u64 },
}

/// One member of the archive.
#[derive(Debug, Clone)]
struct Entry {
    /// Archive path, `/`-separated and rooted at the top-level segment.
    /// Directories end with `/`.
    archive_path: String,
    source: PathBuf,
    kind: EntryKind,
}

/// Stamp the root directory and its direct children with the fixed instant.
fn normalize_mtimes(root: &Path) -> io::Result<()> {
    let instant = UNIX_EPOCH + Duration::from_secs(SOURCE_DATE_EPOCH);
    set_mtime(root, instant)?;
    for child in fs::read_dir(root)? {
        set_mtime(&child?.path(), instant)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mtime(path: &Path, instant: SystemTime) -> io::Result<()> {
    File::open(path)?.set_modified(instant)
}

#[cfg(not(unix))]
fn set_mtime(path: &Path, instant: SystemTime) -> io::Result<()> {
    // Directories cannot be opened as files here; only files are stamped.
    if fs::metadata(path)?.is_dir() {
        return Ok(());
    }
    fs::OpenOptions::new()
        .write(true)
        .open(path)?
        .set_modified(instant)
}

/// List every directory and file under `source_root` (following links),
/// sorted by archive path.
fn collect_entries(
    source_root: &Path,
    root_name: &str,
) -> std::result::Result<Vec<Entry>, PackagingError> {
    let mut entries = Vec::new();
    for item in WalkDir::new(source_root).follow_links(true) {
        let item = item?;
        let relative = archive_relative_path(source_root, item.path())?;
        let metadata = item.metadata()?;
        let (archive_path, kind) = if metadata.is_dir() {
            let path = match relative {
                Some(rel) => format!("{root_name}/{rel}/"),
                None => format!("{root_name}/"),
            };
            (path, EntryKind::Directory)
        } else {
            let Some(rel) = relative else {
                return Err(PackagingError::MissingSource(source_root.to_path_buf()));
            };
            let kind = EntryKind::File {
                mode: normalized_mode(&metadata),
                size: metadata.len(),
            };
            (format!("{root_name}/{rel}"), kind)
        };
        entries.push(Entry {
            archive_path,
            source: item.into_path(),
            kind,
        });
    }
    entries.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));
    Ok(entries)
}

/// Render `path` relative to `root` with `/` separators; `None` for the root.
fn archive_relative_path(
    root: &Path,
    path: &Path,
) -> std::result::Result<Option<String>, PackagingError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| PackagingError::NonUtf8Path(path.to_path_buf()))?;
    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| PackagingError::NonUtf8Path(path.to_path_buf()))?;
        segments.push(segment);
    }
    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments.join("/")))
    }
}

#[cfg(unix)]
fn normalized_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    if metadata.permissions().mode() & 0o111 == 0 {
        FILE_MODE
    } else {
        EXECUTABLE_MODE
    }
}

#[cfg(not(unix))]
fn normalized_mode(_metadata: &fs::Metadata) -> u32 {
    FILE_MODE
}

fn write_tar_gz(file: &mut File, entries: &[Entry]) -> std::result::Result<(), PackagingError> {
    // No file name and a zero mtime in the gzip header.
    let encoder = GzBuilder::new()
        .mtime(0)
        .write(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_uid(0);
        header.set_gid(0);
        header.set_username("")?;
        header.set_groupname("")?;
        header.set_mtime(SOURCE_DATE_EPOCH);
        match entry.kind {
            EntryKind::Directory => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(DIR_MODE);
                header.set_size(0);
                builder.append_data(&mut header, &entry.archive_path, io::empty())?;
            }
            EntryKind::File { mode, size } => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(mode);
                header.set_size(size);
                let reader = File::open(&entry.source)?.take(size);
                builder.append_data(&mut header, &entry.archive_path, reader)?;
            }
        }
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

fn write_zip<W: Write + Seek>(
    writer: W,
    entries: &[Entry],
) -> std::result::Result<(), PackagingError> {
    let (year, month, day, hour, minute, second) = ZIP_TIMESTAMP;
    let timestamp = zip::DateTime::from_date_and_time(year, month, day, hour, minute, second)
        .map_err(|_| PackagingError::InvalidTimestamp)?;
    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(timestamp);

    let mut zip = ZipWriter::new(writer);
    for entry in entries {
        match entry.kind {
            EntryKind::Directory => {
                zip.add_directory(entry.archive_path.as_str(), base.unix_permissions(DIR_MODE))?;
            }
            EntryKind::File { mode, .. } => {
                zip.start_file(entry.archive_path.as_str(), base.unix_permissions(mode))?;
                io::copy(&mut File::open(&entry.source)?, &mut zip)?;
            }
        }
    }
    zip.finish()?;
    Ok(())
}

/// Compute the lowercase hex SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`DistError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
#[path = "packager_tests.rs"]
mod tests;
