//! FileSystem abstraction used by action caches
//!
//! Caches read descriptors through the [`FileSystem`] trait so resolution
//! can be exercised against an in-memory [`MockFileSystem`] as well as the
//! real disk via [`RealFileSystem`].
//!
//! Both implementations refuse to read through symlinks and refuse to read
//! anything but regular files, matching [`crate::file_utils::safe_read_file`].

use crate::diagnostics::{FileError, FileResult};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Trait for abstracting descriptor lookup.
///
/// Must be `Send + Sync`: one instance is shared by every cache a registry
/// hands out, and caches are used from many threads at once.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Read a whole file, rejecting symlinks, non-regular files and files
    /// larger than `max_size` bytes
    fn read(&self, path: &Path, max_size: u64) -> FileResult<Vec<u8>>;
}

/// Real file system implementation that delegates to `std::fs` and `file_utils`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path, max_size: u64) -> FileResult<Vec<u8>> {
        crate::file_utils::safe_read_file_with_limit(path, max_size)
    }
}

#[derive(Debug, Clone)]
enum MockEntry {
    File { content: Vec<u8> },
    Directory,
    Symlink,
}

/// In-memory file system for tests.
///
/// Besides the stored entries it counts reads per path, which lets tests
/// assert that a descriptor was read at most once.
#[derive(Debug, Default)]
pub struct MockFileSystem {
    entries: RwLock<HashMap<PathBuf, MockEntry>>,
    reads: RwLock<HashMap<PathBuf, usize>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize_mock_path(path.as_ref());
        let mut entries = self.entries.write().expect("MockFileSystem lock poisoned");
        entries.insert(
            path,
            MockEntry::File {
                content: content.into(),
            },
        );
    }

    /// Add a directory
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize_mock_path(path.as_ref());
        let mut entries = self.entries.write().expect("MockFileSystem lock poisoned");
        entries.insert(path, MockEntry::Directory);
    }

    /// Add a symlink. The target is irrelevant since reads never follow it.
    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        let path = normalize_mock_path(path.as_ref());
        let mut entries = self.entries.write().expect("MockFileSystem lock poisoned");
        entries.insert(path, MockEntry::Symlink);
    }

    /// Number of times `read` was called for a path
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let path = normalize_mock_path(path.as_ref());
        let reads = self.reads.read().expect("MockFileSystem lock poisoned");
        reads.get(&path).copied().unwrap_or(0)
    }

    /// Total number of `read` calls across all paths
    pub fn total_reads(&self) -> usize {
        let reads = self.reads.read().expect("MockFileSystem lock poisoned");
        reads.values().sum()
    }

    fn get_entry(&self, path: &Path) -> Option<MockEntry> {
        let entries = self.entries.read().expect("MockFileSystem lock poisoned");
        entries.get(path).cloned()
    }
}

/// Converts backslashes to forward slashes for cross-platform consistency.
fn normalize_mock_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(path_str.replace('\\', "/"))
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.get_entry(&normalize_mock_path(path)).is_some()
    }

    fn read(&self, path: &Path, max_size: u64) -> FileResult<Vec<u8>> {
        let normalized = normalize_mock_path(path);
        {
            let mut reads = self.reads.write().expect("MockFileSystem lock poisoned");
            *reads.entry(normalized.clone()).or_insert(0) += 1;
        }

        match self.get_entry(&normalized) {
            None => Err(FileError::Read {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
            }),
            Some(MockEntry::File { content }) => {
                let size = content.len() as u64;
                if size > max_size {
                    return Err(FileError::TooBig {
                        path: path.to_path_buf(),
                        size,
                        limit: max_size,
                    });
                }
                Ok(content)
            }
            Some(MockEntry::Directory) => Err(FileError::NotRegular {
                path: path.to_path_buf(),
            }),
            Some(MockEntry::Symlink) => Err(FileError::Symlink {
                path: path.to_path_buf(),
            }),
        }
    }
}
