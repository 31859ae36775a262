use std::path::Path;

use crate::Result;
use crate::segments::Segment;

/// Pluggable speech-to-text engine used by [`crate::SubtitleGenerator`].
///
/// A backend owns an expensive model handle. It is built cheaply, loads the model on the first
/// [`Backend::ensure_ready`] call, and reuses that handle for every later file. Backends are
/// driven from one thread at a time; they are not meant to be shared by concurrent batches.
pub trait Backend {
    /// Load the model if it is not loaded yet. Idempotent: once it succeeds, later calls are no-ops.
    fn ensure_ready(&mut self) -> Result<()>;

    /// Whether a model handle is currently loaded.
    fn is_ready(&self) -> bool;

    /// Transcribe one media file, returning segments in emission order.
    ///
    /// Engine faults are returned as errors, never swallowed, and never retried here.
    fn transcribe(&mut self, path: &Path) -> Result<Vec<Segment>>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn ensure_ready(&mut self) -> Result<()> {
        (**self).ensure_ready()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn transcribe(&mut self, path: &Path) -> Result<Vec<Segment>> {
        (**self).transcribe(path)
    }
}
