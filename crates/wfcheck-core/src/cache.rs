//! Memoizing resolver for local action metadata
//!
//! An [`ActionCache`] turns a `uses:` reference into the [`ActionMetadata`]
//! of the action it points at. Each local reference is resolved at most once
//! per cache: the first lookup reads and parses the descriptor, and the
//! outcome is stored as a terminal entry.
//!
//! Failures are reported once. The caller that triggers a failed resolution
//! gets the error; the entry is then marked failed and every later lookup of
//! the same reference gets `Ok(None)`, so a broken reference used in many
//! places does not produce a flood of identical diagnostics.
//!
//! A single mutex guards the whole entry map and is held across the
//! descriptor read on a miss. Two callers can therefore never both see a
//! reference as unresolved and both read its file. Misses on different
//! references are serialized too; descriptors are small and each is read at
//! most once, so the lock is rarely contended for long.

use crate::action_ref::ActionRef;
use crate::diagnostics::{MetadataError, MetadataResult};
use crate::file_utils::DEFAULT_MAX_FILE_SIZE;
use crate::fs::{FileSystem, RealFileSystem};
use crate::logging::{cache_debug, DebugSink};
use crate::metadata::{ActionMetadata, DESCRIPTOR_FILENAMES};
use crate::project::Project;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Terminal state of a resolved reference
#[derive(Debug, Clone)]
enum CacheEntry {
    Resolved(Arc<ActionMetadata>),
    /// Resolution failed and the error was already handed out
    Failed,
}

/// Observable state of a reference in a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unresolved,
    Resolved,
    Failed,
}

/// Per-project cache of local action metadata.
///
/// Safe to share between threads (usually behind the `Arc` returned by
/// [`crate::registry::ActionCacheRegistry::get_cache`]).
#[derive(Debug)]
pub struct ActionCache {
    project: Option<Project>,
    cwd: PathBuf,
    fs: Arc<dyn FileSystem>,
    max_descriptor_size: u64,
    entries: Mutex<HashMap<String, CacheEntry>>,
    debug: Option<DebugSink>,
}

impl ActionCache {
    /// Create a cache reading from the real filesystem.
    ///
    /// Without a project the cache is inert: every lookup returns `Ok(None)`.
    /// `cwd` is only used to shorten paths in debug lines and error messages.
    pub fn new(
        project: Option<Project>,
        cwd: impl Into<PathBuf>,
        debug: Option<DebugSink>,
    ) -> Self {
        Self {
            project,
            cwd: cwd.into(),
            fs: Arc::new(RealFileSystem),
            max_descriptor_size: DEFAULT_MAX_FILE_SIZE,
            entries: Mutex::new(HashMap::new()),
            debug,
        }
    }

    /// Read descriptors through another filesystem
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Override the descriptor size limit
    pub fn with_max_descriptor_size(mut self, limit: u64) -> Self {
        self.max_descriptor_size = limit;
        self
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve an action reference to its metadata.
    ///
    /// - `Ok(Some(_))`: metadata of a local action.
    /// - `Ok(None)`: no metadata available. The reference is not local, the
    ///   cache has no project, or resolving it already failed earlier.
    /// - `Err(_)`: resolving a local reference failed. Returned to exactly one
    ///   caller per reference; the caller is expected to report it.
    pub fn resolve(&self, spec: &str) -> MetadataResult<Option<Arc<ActionMetadata>>> {
        let Some(project) = &self.project else {
            return Ok(None);
        };
        let ActionRef::Local { path } = ActionRef::parse(spec) else {
            tracing::trace!(component = "action_cache", spec, "not a local action");
            return Ok(None);
        };

        let mut entries = self.lock_entries();
        match entries.get(spec) {
            Some(CacheEntry::Resolved(meta)) => {
                cache_debug!(self.debug.as_ref(), "Cache hit for {}", spec);
                return Ok(Some(Arc::clone(meta)));
            }
            Some(CacheEntry::Failed) => return Ok(None),
            None => {}
        }

        let dir = project.action_dir(path);
        match self.read_metadata(spec, &dir) {
            Ok(meta) => {
                let meta = Arc::new(meta);
                entries.insert(spec.to_string(), CacheEntry::Resolved(Arc::clone(&meta)));
                cache_debug!(
                    self.debug.as_ref(),
                    "New metadata parsed from action {}",
                    self.display_path(&dir).display()
                );
                Ok(Some(meta))
            }
            Err(err) => {
                entries.insert(spec.to_string(), CacheEntry::Failed);
                tracing::debug!(
                    component = "action_cache",
                    spec,
                    error = %err,
                    "resolution failed"
                );
                Err(err)
            }
        }
    }

    /// State of a reference, as stored. Non-local references are never
    /// stored and always report `Unresolved`.
    pub fn state(&self, spec: &str) -> EntryState {
        match self.lock_entries().get(spec) {
            None => EntryState::Unresolved,
            Some(CacheEntry::Resolved(_)) => EntryState::Resolved,
            Some(CacheEntry::Failed) => EntryState::Failed,
        }
    }

    /// Number of references in a terminal state
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Every mutation is one insert of a terminal entry, so a poisoned map
        // is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locate, read and parse the descriptor in `dir`. Candidates are probed
    /// in lookup order and only the first existing one is read.
    fn read_metadata(&self, spec: &str, dir: &Path) -> MetadataResult<ActionMetadata> {
        let file = DESCRIPTOR_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| self.fs.exists(candidate))
            .ok_or_else(|| MetadataError::NotFound {
                dir: self.display_path(dir),
                candidates: DESCRIPTOR_FILENAMES,
            })?;

        let content = self
            .fs
            .read(&file, self.max_descriptor_size)
            .map_err(|source| MetadataError::ReadFailure {
                path: self.display_path(&file),
                source,
            })?;

        ActionMetadata::from_slice(&content).map_err(|source| MetadataError::Schema {
            spec: spec.to_string(),
            source,
        })
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.cwd) {
            Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
            Ok(rel) => rel.to_path_buf(),
            Err(_) => path.to_path_buf(),
        }
    }
}
