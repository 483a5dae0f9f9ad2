//! Open/write/close lifecycle of a single zip container.

use std::io::{BufWriter, Write};
use std::path::Path;

use fs_err as fs;
use zip::ZipWriter;

use crate::entry::EntryHeader;
use crate::error::ArchiveError;

/// A zip container that is being written to a file on disk.
pub(crate) struct ArchiveWriter {
    zip: ZipWriter<BufWriter<fs::File>>,
}

impl ArchiveWriter {
    /// Starts a new entry and writes `content` into it.
    pub fn write_entry(&mut self, header: &EntryHeader, content: &[u8]) -> Result<(), ArchiveError> {
        self.zip
            .start_file(
                header.name.as_str(),
                header.to_file_options(content.len() as u64),
            )
            .map_err(|err| ArchiveError::CreateEntry(header.name.clone(), err))?;
        self.zip
            .write_all(content)
            .map_err(|err| ArchiveError::WriteEntry(header.name.clone(), err))?;

        tracing::debug!(entry = %header.name, size = content.len(), "added entry to archive");
        Ok(())
    }

    /// Writes the central directory and closes the underlying file. Failures are logged but not
    /// returned: the error of the operation that used the archive, if any, takes precedence.
    fn close(self) {
        let file = match self.zip.finish() {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!("failed to finalize archive: {err}");
                return;
            }
        };
        if let Err(err) = file.into_inner() {
            tracing::warn!("failed to flush archive: {}", err.error());
        }
    }
}

/// Creates (or truncates) the archive at `target`, hands it to `body` and closes it afterwards.
///
/// The archive is closed on every exit path, also when `body` fails. In that case the file on
/// disk is a finalized but incomplete archive.
pub(crate) fn with_archive<F>(target: &Path, body: F) -> Result<(), ArchiveError>
where
    F: FnOnce(&mut ArchiveWriter) -> Result<(), ArchiveError>,
{
    let file = fs::File::create(target).map_err(ArchiveError::CreateTarget)?;
    let mut archive = ArchiveWriter {
        zip: ZipWriter::new(BufWriter::new(file)),
    };

    let result = body(&mut archive);
    archive.close();
    result
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_closes_archive_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.zip");

        let result = with_archive(&target, |archive| {
            archive.write_entry(&EntryHeader::new("first.txt"), b"first")?;
            Err(ArchiveError::Relativize(dir.path().to_path_buf()))
        });
        assert_matches!(result, Err(ArchiveError::Relativize(_)));

        // The entries written before the failure are part of a readable archive.
        let mut zip = zip::ZipArchive::new(fs::File::open(&target).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut content = String::new();
        zip.by_name("first.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn test_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.zip");

        let result = with_archive(&target, |_| Ok(()));
        assert_matches!(result, Err(ArchiveError::CreateTarget(_)));
        assert!(!target.exists());
    }
}
