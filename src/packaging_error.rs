//! Error types for archive sealing.
//!
//! Covers I/O failures while reading the staging tree or writing the
//! archive, container-specific writer errors, and the final atomic rename.

use std::path::PathBuf;
use thiserror::Error;

/// Errors arising while sealing a staging directory into an archive.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (reading staged files, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// The zip writer rejected an entry or failed to finish the archive.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Walking the staging tree failed (unreadable entry, link loop).
    #[error("failed to walk staging directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// The directory to package does not exist.
    #[error("staging directory {0} does not exist")]
    MissingSource(PathBuf),

    /// A staged path is not valid UTF-8 and cannot be named in the archive.
    #[error("staged path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// The fixed archive timestamp is outside the container's range.
    #[error("fixed archive timestamp is not representable")]
    InvalidTimestamp,

    /// Moving the finished temporary archive to its final name failed.
    #[error("failed to finalize archive: {0}")]
    Persist(#[from] tempfile::PersistError),
}
