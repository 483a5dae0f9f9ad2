#![deny(missing_docs)]

//! This crate builds zip archives from byte buffers, single files, directory trees or in-memory
//! file sets.
//!
//! The archives are reproducible: entries that are added in bulk are always written in ascending
//! order of their names, independent of the order in which a map or the filesystem yields them.
//! Combined with [`ZipArchiver::with_timestamp`] the bytes of an archive only depend on the names
//! and contents of its entries, which makes them suitable for content addressing (see
//! [`compute_archive_digest`]).
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zip_archiver::{ArchiveType, Archiver};
//!
//! let mut archiver = ArchiveType::Zip.archiver("site.zip");
//! archiver.archive_dir(Path::new("public")).unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod archive_digest;
mod archiver;
mod entry;
mod error;
mod source;
mod writer;

pub use archive_digest::{compute_archive_digest, ArchiveDigest, Md5Hash, Sha256Hash};
pub use archiver::ZipArchiver;
pub use error::{ArchiveError, ValidationError};

/// Builds an archive at a fixed target location.
///
/// Every operation creates (or truncates) the target, writes all entries and closes the archive
/// again, also when writing fails halfway. The first error that is encountered is returned;
/// errors that occur while closing the archive are not reported.
pub trait Archiver {
    /// Archives `content` as a single entry called `entry_name`.
    fn archive_content(&mut self, content: &[u8], entry_name: &str) -> Result<(), ArchiveError>;

    /// Archives the regular file at `path` as a single entry named after its file name. The
    /// permissions and modification time of the file are preserved.
    fn archive_file(&mut self, path: &Path) -> Result<(), ArchiveError>;

    /// Archives every regular file beneath `root`. Entries are named by their path relative to
    /// `root`, using `/` as separator. Directories do not produce entries of their own.
    fn archive_dir(&mut self, root: &Path) -> Result<(), ArchiveError>;

    /// Archives every entry of `content`, keyed by entry name, in ascending order of the names.
    fn archive_multiple(&mut self, content: &HashMap<String, Vec<u8>>) -> Result<(), ArchiveError>;

    /// Archives any of the supported input kinds.
    fn archive(&mut self, source: ArchiveSource<'_>) -> Result<(), ArchiveError> {
        match source {
            ArchiveSource::Content {
                content,
                entry_name,
            } => self.archive_content(content, entry_name),
            ArchiveSource::File(path) => self.archive_file(path),
            ArchiveSource::Dir(root) => self.archive_dir(root),
            ArchiveSource::Multiple(content) => self.archive_multiple(content),
        }
    }
}

/// The input of a single archiving operation.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveSource<'a> {
    /// Raw bytes stored under an explicit entry name.
    Content {
        /// The bytes to store.
        content: &'a [u8],
        /// The name of the entry.
        entry_name: &'a str,
    },
    /// A single regular file.
    File(&'a Path),
    /// A directory tree.
    Dir(&'a Path),
    /// A set of byte buffers keyed by entry name.
    Multiple(&'a HashMap<String, Vec<u8>>),
}

/// The archive formats that can be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ArchiveType {
    /// A zip archive.
    Zip,
}

impl ArchiveType {
    /// Tries to determine the archive type from the extension of `path`.
    pub fn try_from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        extension.to_ascii_lowercase().parse().ok()
    }

    /// Constructs an archiver of this type that writes to `target`.
    pub fn archiver(self, target: impl Into<PathBuf>) -> Box<dyn Archiver> {
        match self {
            ArchiveType::Zip => Box::new(ZipArchiver::new(target)),
        }
    }
}
