//! Project roots
//!
//! A project is the directory local action references are resolved against,
//! i.e. the repository root that contains `.github/workflows`.

use std::path::{Path, PathBuf};

/// Maximum ancestor traversal depth when discovering a project root
const MAX_TRAVERSAL_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the project containing `path` by walking up to the first
    /// directory that has a `.github/workflows` directory.
    pub fn discover(path: &Path) -> Option<Self> {
        let mut current = Some(path);
        let mut depth = 0;
        while let Some(dir) = current {
            if depth >= MAX_TRAVERSAL_DEPTH {
                break;
            }
            if dir.join(".github").join("workflows").is_dir() {
                return Some(Self::new(dir));
            }
            current = dir.parent();
            depth += 1;
        }
        None
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a local action reference such as `./path/to/action`
    /// points at
    pub fn action_dir(&self, local_ref: &str) -> PathBuf {
        let relative = local_ref.strip_prefix("./").unwrap_or(local_ref);
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}
