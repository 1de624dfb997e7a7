use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::trace;
use sha1::{Digest, Sha1};

use crate::error::{LauncherError, Result};

/// A file as it currently sits on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub hash: String,
}

/// Content hashes of files already installed. Nothing is cached between calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileIndex;

impl LocalFileIndex {
    /// Whether something is installed at `path`. Only "not found" counts as
    /// missing; any other stat failure is an error.
    pub fn exists(&self, path: &Path) -> Result<bool> {
        path.try_exists().map_err(|e| LauncherError::io("stat", path, e))
    }

    /// Stream `path` through SHA-1 and return the lowercase hex digest.
    pub fn hash(&self, path: &Path) -> Result<String> {
        trace!("hashing {}", path.display());
        let mut file = fs::File::open(path).map_err(|e| LauncherError::io("open", path, e))?;
        let mut hasher = Sha1::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let read = file
                .read(&mut buf)
                .map_err(|e| LauncherError::io("read", path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Look `path` up, returning `None` when nothing is installed there.
    pub fn inspect(&self, path: &Path) -> Result<Option<LocalFile>> {
        if !self.exists(path)? {
            return Ok(None);
        }
        let hash = self.hash(path)?;
        Ok(Some(LocalFile {
            path: path.to_path_buf(),
            hash,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn hashes_file_contents_with_sha1() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        let hash = LocalFileIndex.hash(&path).unwrap();
        assert_eq!(hash, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn hashes_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, b"").unwrap();

        assert_eq!(
            LocalFileIndex.hash(&path).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn hashing_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = LocalFileIndex.hash(&temp.path().join("gone")).unwrap_err();
        assert!(matches!(err, LauncherError::Io { action: "open", .. }));
    }

    #[test]
    fn hashing_a_directory_fails_loudly() {
        let temp = TempDir::new().unwrap();
        assert!(LocalFileIndex.exists(temp.path()).unwrap());
        assert!(LocalFileIndex.hash(temp.path()).is_err());
    }

    #[test]
    fn inspect_reports_missing_and_present_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("phase_4.mf");
        assert_eq!(LocalFileIndex.inspect(&path).unwrap(), None);

        fs::write(&path, b"hello").unwrap();
        let local = LocalFileIndex.inspect(&path).unwrap().unwrap();
        assert_eq!(local.path, path);
        assert_eq!(local.hash, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[cfg(unix)]
    #[test]
    fn path_below_a_regular_file_is_stat_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("resources"), b"not a directory").unwrap();
        let path = temp.path().join("resources").join("x.txt");

        let err = LocalFileIndex.exists(&path).unwrap_err();
        assert!(matches!(err, LauncherError::Io { action: "stat", .. }));
        assert!(LocalFileIndex.inspect(&path).is_err());
    }
}
