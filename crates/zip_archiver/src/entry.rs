//! The header written in front of every entry of an archive.

use std::fs::Metadata;
use std::path::{Component, Path};

use chrono::{DateTime, Datelike, Timelike, Utc};
use zip::{write::SimpleFileOptions, CompressionMethod};

/// Entries at least this large need the zip64 extensions.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Name and metadata of a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryHeader {
    pub name: String,
    pub unix_mode: Option<u32>,
    pub modified: Option<DateTime<Utc>>,
    pub method: Option<CompressionMethod>,
}

impl EntryHeader {
    /// A header with default metadata, used for entries that are not backed by a file.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unix_mode: None,
            modified: None,
            method: None,
        }
    }

    /// A header that copies the permissions and modification time of a file on disk. These
    /// entries are always deflated.
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            unix_mode: Some(unix_mode(metadata)),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            method: Some(CompressionMethod::Deflated),
        }
    }

    /// Overrides the modification time if a timestamp is given.
    pub fn with_timestamp(mut self, timestamp: Option<&DateTime<Utc>>) -> Self {
        if let Some(timestamp) = timestamp {
            self.modified = Some(*timestamp);
        }
        self
    }

    /// Converts the header into the options the zip writer understands for an entry of `size`
    /// bytes.
    ///
    /// Entries without a modification time get the zip epoch (1980-01-01 00:00:00) instead of
    /// the current time so that the output only depends on the inputs.
    pub fn to_file_options(&self, size: u64) -> SimpleFileOptions {
        let modified = self
            .modified
            .as_ref()
            .map_or_else(zip::DateTime::default, to_zip_datetime);

        let mut options = SimpleFileOptions::default()
            .last_modified_time(modified)
            .large_file(needs_zip64(size));
        if let Some(method) = self.method {
            options = options.compression_method(method);
        }
        if let Some(mode) = self.unix_mode {
            options = options.unix_permissions(mode);
        }
        options
    }
}

/// Returns true if an entry of `size` bytes has to be written with the zip64 extensions.
fn needs_zip64(size: u64) -> bool {
    size >= ZIP64_THRESHOLD
}

/// Builds an entry name from a path relative to the root of a directory tree. Components are
/// joined with `/` regardless of the platform separator.
///
/// Returns `None` if the path is empty, is not a plain relative path, or is not valid UTF-8.
pub(crate) fn entry_name_from_relative(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Zip timestamps use the DOS format which can only express 1980 up to 2107. Anything outside of
/// that range falls back to the zip epoch.
fn to_zip_datetime(timestamp: &DateTime<Utc>) -> zip::DateTime {
    let converted = u16::try_from(timestamp.year()).ok().and_then(|year| {
        zip::DateTime::from_date_and_time(
            year,
            timestamp.month() as u8,
            timestamp.day() as u8,
            timestamp.hour() as u8,
            timestamp.minute() as u8,
            timestamp.second() as u8,
        )
        .ok()
    });

    converted.unwrap_or_else(|| {
        tracing::debug!(
            %timestamp,
            "modification time cannot be stored in a zip archive, using the zip epoch"
        );
        zip::DateTime::default()
    })
}

#[cfg(unix)]
fn unix_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn unix_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::single("a.txt", Some("a.txt"))]
    #[case::nested("sub/dir/x.txt", Some("sub/dir/x.txt"))]
    #[case::current_dir("./sub/x.txt", Some("sub/x.txt"))]
    #[case::empty("", None)]
    #[case::parent("../x.txt", None)]
    #[case::absolute("/x.txt", None)]
    fn test_entry_name_from_relative(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            entry_name_from_relative(&PathBuf::from(path)).as_deref(),
            expected
        );
    }

    #[test]
    fn test_zip_datetime_in_range() {
        let timestamp = Utc.with_ymd_and_hms(2023, 5, 17, 13, 45, 30).unwrap();
        let converted = to_zip_datetime(&timestamp);
        assert_eq!(converted.year(), 2023);
        assert_eq!(converted.month(), 5);
        assert_eq!(converted.day(), 17);
        assert_eq!(converted.hour(), 13);
        assert_eq!(converted.minute(), 45);
        assert_eq!(converted.second(), 30);
    }

    #[test]
    fn test_zip_datetime_before_epoch() {
        let timestamp = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_zip_datetime(&timestamp), zip::DateTime::default());
    }

    #[test]
    fn test_timestamp_override() {
        let timestamp = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let header = EntryHeader::new("a.txt").with_timestamp(Some(&timestamp));
        assert_eq!(header.modified, Some(timestamp));

        let header = EntryHeader::new("a.txt").with_timestamp(None);
        assert_eq!(header.modified, None);
    }

    #[test]
    fn test_header_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        fs_err::write(&path, b"content").unwrap();

        let header = EntryHeader::from_metadata("file.bin", &fs_err::metadata(&path).unwrap());
        assert_eq!(header.name, "file.bin");
        assert_eq!(header.method, Some(CompressionMethod::Deflated));
        assert!(header.modified.is_some());
    }

    #[test]
    fn test_zip64_threshold() {
        assert!(!needs_zip64(0));
        assert!(!needs_zip64(ZIP64_THRESHOLD - 1));
        assert!(needs_zip64(ZIP64_THRESHOLD));
        assert!(needs_zip64(1 << 33));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_mode_keeps_special_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        fs_err::write(&path, b"#!/bin/sh\n").unwrap();
        fs_err::set_permissions(&path, std::fs::Permissions::from_mode(0o4755)).unwrap();

        let header = EntryHeader::from_metadata("tool", &fs_err::metadata(&path).unwrap());
        assert_eq!(header.unix_mode, Some(0o4755));
    }
}
