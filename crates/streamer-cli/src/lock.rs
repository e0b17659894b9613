//! Exclusive lock serializing catalog writers.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Catalog is locked by another process ({0}); remove it if that process is gone")]
    Held(PathBuf),

    #[error("Cannot create lock file: {0}")]
    Io(#[from] io::Error),
}

/// Held for the duration of a mutating command. The lock file is removed on drop.
#[derive(Debug)]
pub struct CatalogLock {
    path: PathBuf,
}

impl CatalogLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(LockError::Held(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", std::process::id())?;

        debug!("Acquired lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data/.streamer.lock");

        let lock = CatalogLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(matches!(CatalogLock::acquire(&path), Err(LockError::Held(_))));

        drop(lock);
        assert!(!path.exists());
        assert!(CatalogLock::acquire(&path).is_ok());
    }
}
