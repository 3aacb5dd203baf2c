//! Classification of `uses:` action references
//!
//! Three shapes are recognized:
//! - local: `./path/to/action`, relative to the project root
//! - remote: `owner/repo[/path]@ref`
//! - container: `docker://image`
//!
//! Anything else is `Unknown`. Only local references are ever resolved from
//! the filesystem; the others are passed through without metadata.

use regex::Regex;
use std::sync::OnceLock;

fn remote_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^/@\s]+)/([^/@\s]+)(?:/([^@\s]+))?@(\S+)$")
            .expect("BUG: invalid remote action pattern")
    })
}

const LOCAL_PREFIX: &str = "./";
const DOCKER_SCHEME: &str = "docker://";

/// A classified action reference, borrowing from the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRef<'a> {
    /// `./path`, resolved against the project root
    Local { path: &'a str },
    /// `owner/repo[/path]@ref`
    Remote {
        owner: &'a str,
        repo: &'a str,
        path: Option<&'a str>,
        git_ref: &'a str,
    },
    /// `docker://image`
    Docker { image: &'a str },
    Unknown,
}

impl<'a> ActionRef<'a> {
    pub fn parse(spec: &'a str) -> Self {
        if spec.starts_with(LOCAL_PREFIX) {
            return ActionRef::Local { path: spec };
        }
        if let Some(image) = spec.strip_prefix(DOCKER_SCHEME) {
            return ActionRef::Docker { image };
        }
        match remote_pattern().captures(spec) {
            Some(caps) => {
                // Every group except the optional path participates in a match
                let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
                ActionRef::Remote {
                    owner: group(1),
                    repo: group(2),
                    path: caps.get(3).map(|m| m.as_str()),
                    git_ref: group(4),
                }
            }
            None => ActionRef::Unknown,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ActionRef::Local { .. })
    }
}
