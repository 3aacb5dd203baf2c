//! Checker configuration

use crate::file_utils::DEFAULT_MAX_FILE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for action metadata resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Largest descriptor accepted, in bytes
    pub max_descriptor_size: u64,

    /// Print cache events to stderr
    pub debug: bool,

    /// References skipped entirely (exact match)
    pub exclude_refs: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_descriptor_size: DEFAULT_MAX_FILE_SIZE,
            debug: false,
            exclude_refs: Vec::new(),
        }
    }
}

impl CheckConfig {
    /// Load config from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config or use default
    pub fn load_or_default(path: Option<&Path>) -> Self {
        path.and_then(|p| Self::load(p).ok()).unwrap_or_default()
    }

    pub fn is_excluded(&self, spec: &str) -> bool {
        self.exclude_refs.iter().any(|r| r == spec)
    }
}
