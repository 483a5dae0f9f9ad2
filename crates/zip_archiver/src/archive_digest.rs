//! Hashes of finished archives, for consumers that address archives by their content.

use std::io::Write;
use std::path::Path;

use base64::Engine;
use digest::{Digest, Output};
use fs_err as fs;
use md5::Md5;
use sha2::Sha256;

/// A type alias for the output of a SHA256 hash.
pub type Sha256Hash = Output<Sha256>;

/// A type alias for the output of an MD5 hash.
pub type Md5Hash = Output<Md5>;

/// The hashes of an archive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDigest {
    /// The SHA256 hash of the archive.
    pub sha256: Sha256Hash,

    /// The MD5 hash of the archive.
    pub md5: Md5Hash,
}

impl ArchiveDigest {
    /// The SHA256 hash as lowercase hex.
    pub fn sha256_hex(&self) -> String {
        hex::encode(self.sha256)
    }

    /// The MD5 hash as lowercase hex.
    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5)
    }

    /// The SHA256 hash encoded with standard, padded base64.
    pub fn sha256_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.sha256)
    }
}

/// A [`Write`] sink that feeds everything written to it into all hashers at once.
#[derive(Default)]
struct DigestWriter {
    sha256: Sha256,
    md5: Md5,
}

impl Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.sha256.update(buf);
        self.md5.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl DigestWriter {
    fn finalize(self) -> ArchiveDigest {
        ArchiveDigest {
            sha256: self.sha256.finalize(),
            md5: self.md5.finalize(),
        }
    }
}

/// Computes the hashes of the archive at the specified location in a single pass.
pub fn compute_archive_digest(path: impl AsRef<Path>) -> Result<ArchiveDigest, std::io::Error> {
    let mut file = fs::File::open(path.as_ref())?;
    let mut hasher = DigestWriter::default();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compute_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        let digest = compute_archive_digest(&path).unwrap();
        assert_eq!(
            digest.sha256_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(digest.md5_hex(), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(
            digest.sha256_base64(),
            "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ="
        );
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        assert!(compute_archive_digest(dir.path().join("missing.zip")).is_err());
    }
}
