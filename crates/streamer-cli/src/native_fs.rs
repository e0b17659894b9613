//! Native filesystem implementation using std::fs.

use std::fs;
use std::io;
use std::path::PathBuf;
use streamer_core::fs::{FileEntry, FileStat, FileSystem, FsError, Result};

/// Filesystem rooted at the project directory
pub struct NativeFs {
    base_path: PathBuf,
}

impl NativeFs {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(path)
        }
    }
}

fn map_err(path: &str, e: io::Error) -> FsError {
    match e.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        io::ErrorKind::IsADirectory => FsError::IsDirectory(path.to_string()),
        _ => FsError::Io(e.to_string()),
    }
}

impl FileSystem for NativeFs {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.full_path(path)).map_err(|e| map_err(path, e))
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| map_err(path, e))?;
        }

        fs::write(&full_path, content).map_err(|e| map_err(path, e))
    }

    fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.full_path(path)).map_err(|e| map_err(path, e))? {
            let entry = entry.map_err(|e| map_err(path, e))?;
            let metadata = entry.metadata().map_err(|e| map_err(path, e))?;
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: metadata.is_dir(),
            });
        }
        Ok(entries)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        let metadata = fs::metadata(&full_path).map_err(|e| map_err(path, e))?;

        if metadata.is_dir() {
            fs::remove_dir(&full_path).map_err(|e| map_err(path, e))
        } else {
            fs::remove_file(&full_path).map_err(|e| map_err(path, e))
        }
    }

    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.full_path(path).exists())
    }

    fn stat(&self, path: &str) -> Result<FileStat> {
        let metadata = fs::metadata(self.full_path(path)).map_err(|e| map_err(path, e))?;
        Ok(FileStat {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.full_path(path)).map_err(|e| map_err(path, e))
    }
}
