//! One action cache per project
//!
//! Rules checking workflows of the same project must share memoized
//! metadata, otherwise every rule would re-read descriptors and re-report
//! the same broken reference. The registry is created once by whatever
//! drives the checking pass and handed to everything that needs a cache.

use crate::cache::ActionCache;
use crate::config::CheckConfig;
use crate::file_utils::DEFAULT_MAX_FILE_SIZE;
use crate::fs::{FileSystem, RealFileSystem};
use crate::logging::DebugSink;
use crate::project::Project;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out exactly one [`ActionCache`] per project root.
///
/// Caches are never evicted; the registry lives for one checking pass.
/// Caches created here share the registry's working directory, debug sink,
/// filesystem and descriptor size limit.
#[derive(Debug)]
pub struct ActionCacheRegistry {
    cwd: PathBuf,
    debug: Option<DebugSink>,
    fs: Arc<dyn FileSystem>,
    max_descriptor_size: u64,
    // `None` keys the inert cache shared by consumers without a project
    caches: Mutex<HashMap<Option<PathBuf>, Arc<ActionCache>>>,
}

impl ActionCacheRegistry {
    pub fn new(cwd: impl Into<PathBuf>, debug: Option<DebugSink>) -> Self {
        Self {
            cwd: cwd.into(),
            debug,
            fs: Arc::new(RealFileSystem),
            max_descriptor_size: DEFAULT_MAX_FILE_SIZE,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Registry configured from a [`CheckConfig`]. `debug = true` attaches
    /// stderr as the debug sink.
    pub fn from_config(cwd: impl Into<PathBuf>, config: &CheckConfig) -> Self {
        let debug = config.debug.then(DebugSink::stderr);
        let mut registry = Self::new(cwd, debug);
        registry.max_descriptor_size = config.max_descriptor_size;
        registry
    }

    /// Read descriptors through another filesystem
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Cache for `project`, creating it on first request.
    ///
    /// The same project root always yields the same cache instance.
    pub fn get_cache(&self, project: Option<&Project>) -> Arc<ActionCache> {
        let key = project.map(|p| p.root().to_path_buf());
        let mut caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        let cache = caches.entry(key).or_insert_with(|| {
            tracing::debug!(
                component = "action_cache_registry",
                project = ?project.map(Project::root),
                "creating action cache"
            );
            Arc::new(
                ActionCache::new(project.cloned(), self.cwd.clone(), self.debug.clone())
                    .with_file_system(Arc::clone(&self.fs))
                    .with_max_descriptor_size(self.max_descriptor_size),
            )
        });
        Arc::clone(cache)
    }

    /// Number of caches handed out so far
    pub fn len(&self) -> usize {
        self.caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::logging::SharedBuffer;

    #[test]
    fn test_same_project_same_cache() {
        let registry = ActionCacheRegistry::new("/path/to/dir", None);
        let p1 = Project::new("path/to/project1");
        let c1 = registry.get_cache(Some(&p1));

        assert_eq!(c1.cwd(), registry.cwd(), "cwd is not propagated");

        let p2 = Project::new("path/to/project2");
        let c2 = registry.get_cache(Some(&p2));
        assert!(!Arc::ptr_eq(&c1, &c2), "different cache was not created");

        let c3 = registry.get_cache(Some(&Project::new("path/to/project1")));
        assert!(Arc::ptr_eq(&c1, &c3), "same cache is not returned for the same project");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_no_project_yields_shared_inert_cache() {
        let registry = ActionCacheRegistry::new("", None);
        let a = registry.get_cache(None);
        let b = registry.get_cache(None);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.project().is_none());
        assert!(a.resolve("./anything").unwrap().is_none());
    }

    #[test]
    fn test_shared_cache_shares_state() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p1/a/action.yml", "name: A");
        fs.add_file("/p2/a/action.yml", "name: B");
        let registry = ActionCacheRegistry::new("", None).with_file_system(fs.clone());

        let p1 = Project::new("/p1");
        let first = registry.get_cache(Some(&p1)).resolve("./a").unwrap().unwrap();
        let again = registry.get_cache(Some(&p1)).resolve("./a").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(fs.read_count("/p1/a/action.yml"), 1);

        let other = registry
            .get_cache(Some(&Project::new("/p2")))
            .resolve("./a")
            .unwrap()
            .unwrap();
        assert_eq!(other.name.as_deref(), Some("B"));
    }

    #[test]
    fn test_error_reported_once_across_consumers() {
        let fs = Arc::new(MockFileSystem::new());
        let registry = ActionCacheRegistry::new("", None).with_file_system(fs);
        let project = Project::new("/repo");

        let first = registry.get_cache(Some(&project)).resolve("./missing");
        let second = registry.get_cache(Some(&project)).resolve("./missing");
        assert!(first.is_err());
        assert!(second.unwrap().is_none());
    }

    #[test]
    fn test_debug_sink_shared_by_caches() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p1/a/action.yml", "name: A");
        fs.add_file("/p2/a/action.yml", "name: B");
        let buf = SharedBuffer::default();
        let registry = ActionCacheRegistry::new("/", Some(DebugSink::new(buf.clone())))
            .with_file_system(fs);

        for root in ["/p1", "/p2"] {
            let cache = registry.get_cache(Some(&Project::new(root)));
            cache.resolve("./a").unwrap();
            cache.resolve("./a").unwrap();
        }

        let logs = buf.lines();
        assert_eq!(logs.len(), 4, "{logs:#?}");
        assert!(logs[0].ends_with("New metadata parsed from action p1/a"));
        assert!(logs[1].ends_with("Cache hit for ./a"));
        assert!(logs[2].ends_with("New metadata parsed from action p2/a"));
    }

    #[test]
    fn test_from_config_applies_size_limit() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/repo/a/action.yml", vec![b'#'; 20]);
        let config = CheckConfig {
            max_descriptor_size: 10,
            ..CheckConfig::default()
        };
        let registry = ActionCacheRegistry::from_config("", &config).with_file_system(fs);

        let err = registry
            .get_cache(Some(&Project::new("/repo")))
            .resolve("./a")
            .unwrap_err();
        assert!(err.to_string().contains("file too large"), "{err}");
    }

    #[test]
    fn test_concurrent_get_cache_returns_one_instance() {
        let registry = ActionCacheRegistry::new("", None);
        let project = Project::new("/repo");

        let caches: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.get_cache(Some(&project))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(caches.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }
}
