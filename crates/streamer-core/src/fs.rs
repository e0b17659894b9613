//! FileSystem trait abstraction for the catalog, placeholder and bundle stores.
//!
//! Implementations:
//! - `InMemoryFs` - For testing
//! - `NativeFs` (in streamer-cli) - Uses std::fs under a project root
//!
//! Paths are `/`-separated and relative to the implementation's root.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, FsError>;

/// File metadata
#[derive(Debug, Clone)]
pub struct FileStat {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Directory entry
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// File or directory name (not full path)
    pub name: String,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Platform-independent filesystem abstraction.
pub trait FileSystem {
    /// Read file contents
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write file contents (creates parent directories if needed)
    fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    /// List directory contents
    fn list(&self, path: &str) -> Result<Vec<FileEntry>>;

    /// Delete file or empty directory
    fn delete(&self, path: &str) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &str) -> Result<bool>;

    /// Get file metadata
    fn stat(&self, path: &str) -> Result<FileStat>;

    /// Create directory (and parents if needed)
    fn mkdir(&self, path: &str) -> Result<()>;
}

/// Join a directory and a relative name with a single `/`.
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Every file below `dir`, as full paths, sorted. A missing directory is empty.
pub fn walk_files<F: FileSystem + ?Sized>(fs: &F, dir: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    if !fs.exists(dir)? {
        return Ok(files);
    }

    let mut pending = vec![dir.trim_end_matches('/').to_string()];
    while let Some(current) = pending.pop() {
        for entry in fs.list(&current)? {
            let path = join(&current, &entry.name);
            if entry.is_dir {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// In-memory filesystem for testing
pub struct InMemoryFs {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    dirs: RwLock<BTreeSet<String>>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(String::new()); // Root directory
        Self {
            files: RwLock::new(BTreeMap::new()),
            dirs: RwLock::new(dirs),
        }
    }

    fn normalize_path(path: &str) -> String {
        path.trim_matches('/').to_string()
    }

    fn parent_path(path: &str) -> Option<String> {
        let normalized = Self::normalize_path(path);
        if normalized.is_empty() {
            None
        } else {
            match normalized.rfind('/') {
                Some(pos) => Some(normalized[..pos].to_string()),
                None => Some(String::new()),
            }
        }
    }
}

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for InMemoryFs {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = Self::normalize_path(path);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(&path).cloned().ok_or(FsError::NotFound(path))
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let path = Self::normalize_path(path);
        if self
            .dirs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&path)
        {
            return Err(FsError::IsDirectory(path));
        }

        // Create parent directories
        if let Some(parent) = Self::parent_path(&path) {
            self.mkdir(&parent)?;
        }

        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, content.to_vec());
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let path = Self::normalize_path(path);
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };

        let dirs = self.dirs.read().unwrap_or_else(|e| e.into_inner());
        if !dirs.contains(&path) {
            return Err(FsError::NotFound(path));
        }

        let mut entries = Vec::new();

        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        for file_path in files.keys() {
            if let Some(rest) = file_path.strip_prefix(&prefix) {
                if !rest.contains('/') {
                    entries.push(FileEntry {
                        name: rest.to_string(),
                        is_dir: false,
                    });
                }
            }
        }

        for dir_path in dirs.iter() {
            if let Some(rest) = dir_path.strip_prefix(&prefix) {
                if !rest.is_empty() && !rest.contains('/') {
                    entries.push(FileEntry {
                        name: rest.to_string(),
                        is_dir: true,
                    });
                }
            }
        }

        Ok(entries)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);

        // Try to delete as file first
        {
            let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
            if files.remove(&path).is_some() {
                return Ok(());
            }
        }

        // Try to delete as directory
        {
            let mut dirs = self.dirs.write().unwrap_or_else(|e| e.into_inner());
            if !path.is_empty() && dirs.remove(&path) {
                return Ok(());
            }
        }

        Err(FsError::NotFound(path))
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let path = Self::normalize_path(path);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let dirs = self.dirs.read().unwrap_or_else(|e| e.into_inner());
        Ok(files.contains_key(&path) || dirs.contains(&path))
    }

    fn stat(&self, path: &str) -> Result<FileStat> {
        let path = Self::normalize_path(path);

        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        if let Some(content) = files.get(&path) {
            return Ok(FileStat {
                size: content.len() as u64,
                is_dir: false,
            });
        }

        let dirs = self.dirs.read().unwrap_or_else(|e| e.into_inner());
        if dirs.contains(&path) {
            return Ok(FileStat {
                size: 0,
                is_dir: true,
            });
        }

        Err(FsError::NotFound(path))
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        if path.is_empty() {
            return Ok(()); // Root always exists
        }

        // Create parent first
        if let Some(parent) = Self::parent_path(&path) {
            self.mkdir(&parent)?;
        }

        self.dirs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inmemory_fs_basic_operations() {
        let fs = InMemoryFs::new();

        fs.write("test.txt", b"hello world").unwrap();

        let content = fs.read("test.txt").unwrap();
        assert_eq!(content, b"hello world");
        assert_eq!(fs.stat("test.txt").unwrap().size, 11);

        assert!(fs.exists("test.txt").unwrap());
        assert!(!fs.exists("nonexistent.txt").unwrap());

        fs.delete("test.txt").unwrap();
        assert!(!fs.exists("test.txt").unwrap());
        assert!(matches!(fs.delete("test.txt"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_inmemory_fs_directories() {
        let fs = InMemoryFs::new();

        // Write creates parent directories
        fs.write("a/b/c.txt", b"content").unwrap();

        assert!(fs.exists("a").unwrap());
        assert!(fs.exists("a/b").unwrap());
        assert!(fs.stat("a/b").unwrap().is_dir);

        let entries = fs.list("a").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "b");
        assert!(entries[0].is_dir);

        let entries = fs.list("a/b").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "c.txt");
        assert!(!entries[0].is_dir);

        assert!(matches!(fs.write("a/b", b"x"), Err(FsError::IsDirectory(_))));
    }

    #[test]
    fn test_walk_files_recurses_and_sorts() {
        let fs = InMemoryFs::new();
        fs.write("root/z.png", b"").unwrap();
        fs.write("root/a/b/c.png", b"").unwrap();
        fs.write("root/a/d.png", b"").unwrap();
        fs.write("other/e.png", b"").unwrap();

        let files = walk_files(&fs, "root").unwrap();
        assert_eq!(files, vec!["root/a/b/c.png", "root/a/d.png", "root/z.png"]);

        assert!(walk_files(&fs, "missing").unwrap().is_empty());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("a/b/", "c"), "a/b/c");
        assert_eq!(join("", "c"), "c");
    }
}
