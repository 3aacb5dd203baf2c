//! Safe descriptor reading
//!
//! Descriptors are located by joining user-controlled `uses:` paths onto the
//! project root, so reads are hardened: symlinks are rejected, only regular
//! files are read, and a size limit bounds memory use.
//!
//! There is a TOCTOU window between the `symlink_metadata` check and the
//! read. Closing it needs platform-specific open flags and the impact is
//! limited to reading unexpected content from the local filesystem.

use crate::diagnostics::{FileError, FileResult};
use std::fs;
use std::path::Path;

/// Default maximum descriptor size (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Read a file with the default size limit.
pub fn safe_read_file(path: &Path) -> FileResult<Vec<u8>> {
    safe_read_file_with_limit(path, DEFAULT_MAX_FILE_SIZE)
}

/// Read a file, rejecting symlinks, non-regular files, and files larger than
/// `max_size` bytes. A file of exactly `max_size` bytes is accepted.
pub fn safe_read_file_with_limit(path: &Path, max_size: u64) -> FileResult<Vec<u8>> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.file_type().is_symlink() {
        return Err(FileError::Symlink {
            path: path.to_path_buf(),
        });
    }

    // FIFOs would block the cache lock forever
    if !metadata.is_file() {
        return Err(FileError::NotRegular {
            path: path.to_path_buf(),
        });
    }

    let size = metadata.len();
    if size > max_size {
        return Err(FileError::TooBig {
            path: path.to_path_buf(),
            size,
            limit: max_size,
        });
    }

    fs::read(path).map_err(|e| FileError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}
