//! Batch orchestration: roots in, one outcome per media file out.
//!
//! [`SubtitleGenerator`] owns a [`Backend`] and drives it over every media file found under the
//! requested roots, strictly one file at a time and in discovery order. Per-file failures are
//! recorded as [`TranscriptionOutcome`]s and never abort the batch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::Result;
use crate::backend::Backend;
use crate::backends::whisper::WhisperBackend;
use crate::media::{MediaFile, discover_all};
use crate::opts::{BatchOpts, TranscriptionOptions};
use crate::outcome::{TranscriptionOutcome, summarize};
use crate::subtitle::{subtitle_path_for, write_subtitle};

/// Directory-to-subtitle driver.
///
/// Construct once and call [`SubtitleGenerator::process`] for as many batches as needed; the
/// backend's model stays loaded between batches. Not meant to be shared by concurrent batches
/// without external synchronization.
pub struct SubtitleGenerator<B: Backend = WhisperBackend> {
    backend: B,
}

impl SubtitleGenerator<WhisperBackend> {
    /// Validate `opts` and build a generator on the Whisper backend. No model is loaded yet.
    pub fn new(opts: TranscriptionOptions) -> Result<Self> {
        Ok(Self::with_backend(WhisperBackend::new(opts)?))
    }
}

impl<B: Backend> SubtitleGenerator<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Process every media file under `roots`, in argument order.
    ///
    /// Roots are `~`-expanded and made absolute first. When nothing is found, one
    /// [`OutcomeStatus::NoMedia`](crate::OutcomeStatus::NoMedia) outcome is returned per root
    /// (a single one with an empty source when `roots` is empty).
    pub fn process<P: AsRef<Path>>(
        &mut self,
        roots: &[P],
        opts: &BatchOpts,
    ) -> Vec<TranscriptionOutcome> {
        let roots: Vec<PathBuf> = roots.iter().map(|r| expand_root(r.as_ref())).collect();
        let files = discover_all(&roots, opts.recursive);

        if files.is_empty() {
            if roots.is_empty() {
                return vec![TranscriptionOutcome::no_media(PathBuf::new())];
            }
            return roots
                .into_iter()
                .inspect(|root| info!(root = %root.display(), "no media files detected"))
                .map(TranscriptionOutcome::no_media)
                .collect();
        }

        info!(
            roots = roots.len(),
            files = files.len(),
            recursive = opts.recursive,
            overwrite = opts.overwrite,
            skip_existing = opts.skip_existing,
            "starting subtitle batch"
        );

        let mut engine = EngineInit::Pending;
        let outcomes: Vec<TranscriptionOutcome> = files
            .into_iter()
            .map(|file| self.process_file(file, opts, &mut engine))
            .collect();

        let summary = summarize(&outcomes);
        info!(
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            "subtitle batch finished"
        );

        outcomes
    }

    fn process_file(
        &mut self,
        file: MediaFile,
        opts: &BatchOpts,
        engine: &mut EngineInit,
    ) -> TranscriptionOutcome {
        let source = file.into_path();
        let output = subtitle_path_for(&source);

        if output.exists() {
            if opts.overwrite {
                if let Err(err) = remove_existing(&output) {
                    warn!(source = %source.display(), error = %err, "failed to remove existing subtitle");
                    return TranscriptionOutcome::failed(
                        source,
                        format!("could not remove existing '{}': {err}", output.display()),
                    );
                }
            } else if opts.skip_existing {
                info!(source = %source.display(), "subtitle already exists, skipping");
                return TranscriptionOutcome::skipped(source, output);
            }
        }

        match self.transcribe_to(&source, &output, engine) {
            Ok(cues) => {
                info!(source = %source.display(), output = %output.display(), cues, "subtitle created");
                TranscriptionOutcome::created(source, output)
            }
            Err(reason) => {
                warn!(source = %source.display(), error = %reason, "subtitle generation failed");
                TranscriptionOutcome::failed(source, reason)
            }
        }
    }

    fn transcribe_to(
        &mut self,
        source: &Path,
        output: &Path,
        engine: &mut EngineInit,
    ) -> std::result::Result<usize, String> {
        engine.ensure(&mut self.backend)?;

        let segments = self
            .backend
            .transcribe(source)
            .map_err(|e| e.to_string())?;
        write_subtitle(&segments, output).map_err(|e| e.to_string())
    }
}

/// Per-batch record of the one model initialization attempt.
enum EngineInit {
    Pending,
    Ready,
    Failed(String),
}

impl EngineInit {
    fn ensure<B: Backend>(&mut self, backend: &mut B) -> std::result::Result<(), String> {
        match self {
            EngineInit::Ready => Ok(()),
            EngineInit::Failed(reason) => Err(reason.clone()),
            EngineInit::Pending => match backend.ensure_ready() {
                Ok(()) => {
                    *self = EngineInit::Ready;
                    Ok(())
                }
                Err(err) => {
                    let reason = format!("model initialization failed: {err}");
                    warn!(error = %err, "model initialization failed");
                    *self = EngineInit::Failed(reason.clone());
                    Err(reason)
                }
            },
        }
    }
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Expand a leading `~` and make `root` absolute (relative to the current directory).
///
/// Paths that are not valid UTF-8 skip tilde expansion; if the current directory can't be read
/// the path is returned as expanded.
pub fn expand_root(root: &Path) -> PathBuf {
    let expanded = match root.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => root.to_path_buf(),
    };

    std::path::absolute(&expanded).unwrap_or(expanded)
}
