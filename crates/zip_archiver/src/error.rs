//! Errors returned by the archiving operations.

use std::path::PathBuf;

use thiserror::Error;

/// The inputs of an archiving operation did not satisfy its preconditions.
///
/// These are detected before the target archive is opened wherever possible.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The source path does not exist.
    #[error("could not archive missing file: {}", .0.display())]
    NotFound(PathBuf),

    /// A directory was passed where a single file was expected.
    #[error("could not archive directory as file: {}", .0.display())]
    IsADirectory(PathBuf),

    /// A file was passed where a directory was expected.
    #[error("could not archive file as directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The source path exists but is not a regular file (e.g. a socket or a device).
    #[error("could not archive special file: {}", .0.display())]
    NotARegularFile(PathBuf),

    /// The source path could not be inspected.
    #[error("could not inspect the archive source")]
    Stat(#[source] std::io::Error),

    /// An entry name was empty.
    #[error("archive entry names must not be empty")]
    EmptyEntryName,

    /// The same entry name was supplied more than once.
    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),
}

/// An error that can occur while building an archive.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum ArchiveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not create the archive target")]
    CreateTarget(#[source] std::io::Error),

    #[error("error reading file for archival")]
    ReadSource(#[source] std::io::Error),

    #[error("error walking directory {}", .0.display())]
    Walk(PathBuf, #[source] walkdir::Error),

    #[error("error relativizing {} for archival", .0.display())]
    Relativize(PathBuf),

    #[error("error creating file header: {} is not a valid entry name", .0.display())]
    InvalidEntryName(PathBuf),

    #[error("error creating file inside archive: {0}")]
    CreateEntry(String, #[source] zip::result::ZipError),

    #[error("error writing {0} to archive")]
    WriteEntry(String, #[source] std::io::Error),
}

impl ArchiveError {
    /// Returns true if the operation failed because of invalid inputs.
    pub fn is_validation(&self) -> bool {
        matches!(self, ArchiveError::Validation(_))
    }
}
