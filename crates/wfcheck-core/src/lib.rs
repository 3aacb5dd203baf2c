//! # wfcheck-core
//!
//! Action metadata resolution for the wfcheck workflow linter.
//!
//! When a workflow step uses a local action (`uses: ./path/to/action`), the
//! checker needs the inputs and outputs that action declares. This crate
//! finds the action's `action.yaml` / `action.yml`, parses it, and memoizes
//! the result per project so many rules running in parallel read each
//! descriptor at most once and report each broken reference once.
//!
//! - [`ActionCacheRegistry`]: one [`ActionCache`] per project
//! - [`ActionCache`]: memoizing, thread-safe resolver
//! - [`ActionMetadata`]: parsed descriptor

pub mod action_ref;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod file_utils;
pub mod fs;
pub mod logging;
pub mod metadata;
pub mod project;
pub mod registry;

use std::sync::Arc;

use rayon::prelude::*;

pub use action_ref::ActionRef;
pub use cache::{ActionCache, EntryState};
pub use config::CheckConfig;
pub use diagnostics::{Diagnostic, MetadataError, MetadataResult, SchemaError};
pub use logging::DebugSink;
pub use metadata::ActionMetadata;
pub use project::Project;
pub use registry::ActionCacheRegistry;

/// Rule ID of diagnostics for references whose metadata cannot be resolved
pub const METADATA_RULE: &str = "action::metadata";

/// Outcome of looking up one reference
#[derive(Debug, Clone)]
pub struct Resolution {
    pub reference: String,
    pub metadata: Option<Arc<ActionMetadata>>,
}

/// Result of [`resolve_references`]
#[derive(Debug, Clone, Default)]
pub struct ResolveReport {
    /// One entry per looked-up reference, in input order
    pub resolutions: Vec<Resolution>,
    /// One diagnostic per distinct reference that failed to resolve
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve a batch of references against one shared cache, in parallel.
///
/// Errors returned by the cache become diagnostics. Since the cache hands
/// out each error once, a broken reference listed many times yields a single
/// diagnostic. References excluded by `config` are skipped.
pub fn resolve_references<S>(
    cache: &ActionCache,
    refs: &[S],
    config: &CheckConfig,
) -> ResolveReport
where
    S: AsRef<str> + Sync,
{
    let outcomes: Vec<(Resolution, Option<Diagnostic>)> = refs
        .par_iter()
        .map(|s| <S as AsRef<str>>::as_ref(s))
        .filter(|spec| !config.is_excluded(spec))
        .map(|spec| {
            let (metadata, diagnostic) = match cache.resolve(spec) {
                Ok(metadata) => (metadata, None),
                Err(e) => {
                    let diag = Diagnostic::error(spec, METADATA_RULE, e.to_string())
                        .with_suggestion(e.suggestion());
                    (None, Some(diag))
                }
            };
            let resolution = Resolution {
                reference: spec.to_string(),
                metadata,
            };
            (resolution, diagnostic)
        })
        .collect();

    let mut report = ResolveReport::default();
    for (resolution, diagnostic) in outcomes {
        report.resolutions.push(resolution);
        report.diagnostics.extend(diagnostic);
    }

    // Deterministic output regardless of which thread won a failed lookup
    report.diagnostics.sort_by(|a, b| {
        a.reference
            .cmp(&b.reference)
            .then_with(|| a.rule.cmp(&b.rule))
    });

    report
}
