//! Validation and discovery of the files that end up in an archive.

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs_err as fs;
use walkdir::WalkDir;

use crate::entry::entry_name_from_relative;
use crate::error::{ArchiveError, ValidationError};

/// A regular file found beneath the root of a directory tree.
#[derive(Debug)]
pub(crate) struct SourceFile {
    /// The location of the file on disk.
    pub path: PathBuf,
    /// The name of the entry, relative to the root and separated by `/`.
    pub name: String,
    pub metadata: Metadata,
}

fn stat(path: &Path) -> Result<Metadata, ValidationError> {
    fs::metadata(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            ValidationError::NotFound(path.to_path_buf())
        } else {
            ValidationError::Stat(err)
        }
    })
}

/// Ensures that `path` points to a regular file and returns its metadata. Symbolic links are
/// followed.
pub(crate) fn assert_valid_file(path: &Path) -> Result<Metadata, ValidationError> {
    let metadata = stat(path)?;
    if metadata.is_dir() {
        return Err(ValidationError::IsADirectory(path.to_path_buf()));
    }
    if !metadata.is_file() {
        return Err(ValidationError::NotARegularFile(path.to_path_buf()));
    }
    Ok(metadata)
}

/// Ensures that `path` points to a directory.
pub(crate) fn assert_valid_dir(path: &Path) -> Result<(), ValidationError> {
    let metadata = stat(path)?;
    if !metadata.is_dir() {
        return Err(ValidationError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Recursively collects every regular file beneath `root`.
///
/// Directories are traversed but produce no files of their own. A symbolic link that resolves to
/// a regular file is collected under the name of the link, with the metadata of the file it
/// points to. Links to directories are not descended into. Dangling links, links to directories
/// and special files are skipped. The result is sorted by entry name so the order does not depend
/// on the order in which the filesystem returns directory entries.
pub(crate) fn collect_dir_files(root: &Path) -> Result<Vec<SourceFile>, ArchiveError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| ArchiveError::Walk(root.to_path_buf(), err))?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        let metadata = if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => {
                    tracing::debug!(
                        path = %entry.path().display(),
                        "skipping link to non-regular file"
                    );
                    continue;
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %entry.path().display(), "skipping dangling link");
                    continue;
                }
                Err(err) => return Err(ArchiveError::ReadSource(err)),
            }
        } else if file_type.is_file() {
            entry
                .metadata()
                .map_err(|err| ArchiveError::Walk(entry.path().to_path_buf(), err))?
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
            continue;
        };

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| ArchiveError::Relativize(entry.path().to_path_buf()))?;
        let name = entry_name_from_relative(relative)
            .ok_or_else(|| ArchiveError::InvalidEntryName(relative.to_path_buf()))?;

        files.push(SourceFile {
            path: entry.into_path(),
            name,
            metadata,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
