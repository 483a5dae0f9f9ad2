//! The zip implementation of [`Archiver`].

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs_err as fs;
use itertools::Itertools;
use tracing::instrument;

use crate::archive_digest::{compute_archive_digest, ArchiveDigest};
use crate::entry::EntryHeader;
use crate::error::{ArchiveError, ValidationError};
use crate::source::{assert_valid_dir, assert_valid_file, collect_dir_files};
use crate::writer::with_archive;
use crate::Archiver;

/// Writes zip archives to a single target location.
///
/// Every operation truncates the target and writes a complete archive, so calling an operation
/// twice leaves only the result of the second call on disk. Entries that are written in bulk
/// are ordered by name, which makes the archive a pure function of its inputs.
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use zip_archiver::{Archiver, ZipArchiver};
///
/// let mut archiver = ZipArchiver::new("bundle.zip");
/// let files = HashMap::from([
///     ("b.txt".to_string(), b"2".to_vec()),
///     ("a.txt".to_string(), b"1".to_vec()),
/// ]);
/// archiver.archive_multiple(&files).unwrap();
/// println!("sha256: {}", archiver.digest().unwrap().sha256_hex());
/// ```
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    target: PathBuf,
    timestamp: Option<DateTime<Utc>>,
}

impl ZipArchiver {
    /// Constructs an archiver that writes to `target`.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            timestamp: None,
        }
    }

    /// Use `timestamp` as the modification time of every entry instead of the modification time
    /// of the source files. Useful for reproducible builds.
    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    /// The location the archive is written to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Computes the hashes of the archive currently stored at the target location.
    pub fn digest(&self) -> Result<ArchiveDigest, std::io::Error> {
        compute_archive_digest(&self.target)
    }

    /// Archives a set of named byte buffers. Unlike [`Archiver::archive_multiple`] this accepts
    /// any sequence of entries, so duplicate names are possible; those are rejected before the
    /// target is touched.
    ///
    /// Entries are written in ascending order of their names, independent of the order in which
    /// they are yielded.
    #[instrument(skip_all, fields(target = %self.target.display()))]
    pub fn archive_entries<I, K, V>(&mut self, entries: I) -> Result<(), ArchiveError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, content)| (name.into(), content))
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .collect::<Vec<(String, V)>>();

        if entries.iter().any(|(name, _)| name.is_empty()) {
            return Err(ValidationError::EmptyEntryName.into());
        }
        if let Some(((name, _), _)) = entries
            .iter()
            .tuple_windows()
            .find(|((a, _), (b, _))| a == b)
        {
            return Err(ValidationError::DuplicateEntry(name.clone()).into());
        }

        with_archive(&self.target, |archive| {
            for (name, content) in &entries {
                let header = self.header(EntryHeader::new(name.as_str()));
                archive.write_entry(&header, content.as_ref())?;
            }
            Ok(())
        })
    }

    fn header(&self, header: EntryHeader) -> EntryHeader {
        header.with_timestamp(self.timestamp.as_ref())
    }
}

impl Archiver for ZipArchiver {
    #[instrument(skip_all, fields(target = %self.target.display(), entry = entry_name))]
    fn archive_content(&mut self, content: &[u8], entry_name: &str) -> Result<(), ArchiveError> {
        if entry_name.is_empty() {
            return Err(ValidationError::EmptyEntryName.into());
        }

        let header = self.header(EntryHeader::new(entry_name));
        with_archive(&self.target, |archive| archive.write_entry(&header, content))
    }

    #[instrument(skip_all, fields(target = %self.target.display(), path = %path.display()))]
    fn archive_file(&mut self, path: &Path) -> Result<(), ArchiveError> {
        let metadata = assert_valid_file(path)?;
        let content = fs::read(path).map_err(ArchiveError::ReadSource)?;

        let name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| ArchiveError::InvalidEntryName(path.to_path_buf()))?;
        let header = self.header(EntryHeader::from_metadata(name, &metadata));

        with_archive(&self.target, |archive| archive.write_entry(&header, &content))
    }

    #[instrument(skip_all, fields(target = %self.target.display(), root = %root.display()))]
    fn archive_dir(&mut self, root: &Path) -> Result<(), ArchiveError> {
        assert_valid_dir(root)?;
        let files = collect_dir_files(root)?;

        with_archive(&self.target, |archive| {
            for file in &files {
                let header = self.header(EntryHeader::from_metadata(
                    file.name.as_str(),
                    &file.metadata,
                ));
                let content = fs::read(&file.path).map_err(ArchiveError::ReadSource)?;
                archive.write_entry(&header, &content)?;
            }
            Ok(())
        })
    }

    fn archive_multiple(&mut self, content: &HashMap<String, Vec<u8>>) -> Result<(), ArchiveError> {
        self.archive_entries(content.iter().map(|(name, bytes)| (name.as_str(), bytes)))
    }
}
