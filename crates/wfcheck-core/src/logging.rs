//! Debug output for action caches
//!
//! Every cache event is emitted twice: as a structured `tracing` event
//! (`component = "action_cache"`) and, when a [`DebugSink`] is attached, as
//! one plain text line in the sink. The sink is what `--debug` prints; the
//! tracing events go wherever the binary's subscriber sends them.
//!
//! Sink lines are prefixed with `[ActionCache]`:
//!
//! ```text
//! [ActionCache] New metadata parsed from action .github/actions/setup
//! [ActionCache] Cache hit for ./.github/actions/setup
//! ```

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

const PREFIX: &str = "[ActionCache]";

/// Append-only text destination shared by caches.
///
/// Cloning is cheap and clones write to the same destination. Write errors
/// are ignored: debug output never changes resolution results.
#[derive(Clone)]
pub struct DebugSink {
    out: Arc<Mutex<dyn Write + Send>>,
}

impl DebugSink {
    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    /// Sink writing to stderr
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write one line
    pub fn line(&self, args: fmt::Arguments<'_>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(out, "{PREFIX} {args}");
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugSink").finish_non_exhaustive()
    }
}

/// Emit a cache event to tracing and to the sink, if any.
macro_rules! cache_debug {
    ($sink:expr, $($arg:tt)+) => {{
        tracing::debug!(component = "action_cache", $($arg)+);
        if let Some(sink) = $sink {
            sink.line(format_args!($($arg)+));
        }
    }};
}
pub(crate) use cache_debug;

/// In-memory sink destination for tests
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
