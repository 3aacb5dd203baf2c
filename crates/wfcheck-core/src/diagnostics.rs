//! Diagnostic types and error reporting

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type MetadataResult<T> = Result<T, MetadataError>;
pub type FileResult<T> = Result<T, FileError>;

/// An error about one action reference, surfaced to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    /// The action reference the diagnostic is about
    pub reference: String,
    pub rule: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(reference: &str, rule: &str, message: String) -> Self {
        Self {
            message,
            reference: reference.to_string(),
            rule: rule.to_string(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

/// Failure to resolve an action reference to its metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(
        "neither {} nor {} is found in directory \"{}\"",
        .candidates[0],
        .candidates[1],
        .dir.display()
    )]
    NotFound {
        dir: PathBuf,
        candidates: [&'static str; 2],
    },

    #[error("could not read action metadata file \"{}\": {source}", .path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    #[error("action \"{spec}\" is invalid: {source}")]
    Schema {
        spec: String,
        #[source]
        source: SchemaError,
    },
}

impl MetadataError {
    /// Suggestion shown next to the diagnostic for this error
    pub fn suggestion(&self) -> String {
        match self {
            MetadataError::NotFound { dir, candidates } => format!(
                "Create {} in {} or fix the path of the action",
                candidates[0],
                dir.display()
            ),
            MetadataError::ReadFailure { path, .. } => {
                format!("Check that {} is a readable regular file", path.display())
            }
            MetadataError::Schema { .. } => {
                "Check that `inputs` and `outputs` are mappings keyed by name".to_string()
            }
        }
    }
}

/// Descriptor content that does not fit the action metadata schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("\"{field}\" must be {expected} but got {found}")]
    InvalidType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Hardened file read failures
#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to read file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to read symlink: {}", .path.display())]
    Symlink { path: PathBuf },

    #[error("not a regular file: {}", .path.display())]
    NotRegular { path: PathBuf },

    #[error("file too large: {} ({size} bytes, limit {limit} bytes)", .path.display())]
    TooBig { path: PathBuf, size: u64, limit: u64 },
}
