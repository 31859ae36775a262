use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};
use whisper_rs::WhisperContext;

use crate::backend::Backend;
use crate::decoder::decode_file;
use crate::models::{resolve_model_path, resolve_vad_model_path};
use crate::opts::TranscriptionOptions;
use crate::segments::Segment;
use crate::vad::VadProcessor;
use crate::{Error, Result};

mod ctx;
mod logging;
mod segments;

use segments::transcribe_samples;

/// Built-in backend powered by `whisper-rs` / `whisper.cpp`.
///
/// Construction only validates options. The model (and the VAD model, when enabled) is loaded by
/// the first [`Backend::ensure_ready`] call and kept for the life of the backend.
pub struct WhisperBackend {
    opts: TranscriptionOptions,
    loaded: Option<Loaded>,
}

struct Loaded {
    ctx: WhisperContext,
    vad: Option<VadProcessor>,
    model_path: PathBuf,
}

impl WhisperBackend {
    pub fn new(opts: TranscriptionOptions) -> Result<Self> {
        opts.validate()?;
        Ok(Self { opts, loaded: None })
    }

    pub fn options(&self) -> &TranscriptionOptions {
        &self.opts
    }

    /// Path of the loaded model file, once loaded.
    pub fn model_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|l| l.model_path.as_path())
    }

    fn load(&self) -> Result<Loaded> {
        let opts = &self.opts;
        let model_path = resolve_model_path(&opts.model, &opts.models_dir, opts.compute_type)?;

        info!(
            model = %model_path.display(),
            compute_type = %opts.compute_type,
            "loading whisper model"
        );
        let ctx = ctx::load_context(&model_path, opts.compute_type.use_gpu())?;

        let vad = match opts.vad_model.as_deref().filter(|_| opts.vad_filter) {
            Some(vad_model) => {
                let vad_path = resolve_vad_model_path(vad_model, &opts.models_dir)?;
                if !vad_path.is_file() {
                    return Err(Error::config(format!(
                        "VAD model file not found at '{}' (fetch it with `model-downloader --name {vad_model}`)",
                        vad_path.display()
                    )));
                }
                Some(VadProcessor::new(&vad_path)?)
            }
            None => None,
        };

        Ok(Loaded {
            ctx,
            vad,
            model_path,
        })
    }
}

impl Backend for WhisperBackend {
    fn ensure_ready(&mut self) -> Result<()> {
        if self.loaded.is_none() {
            self.loaded = Some(self.load()?);
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    fn transcribe(&mut self, path: &Path) -> Result<Vec<Segment>> {
        self.ensure_ready()?;
        let Some(loaded) = self.loaded.as_mut() else {
            return Err(Error::engine("whisper model is not loaded"));
        };

        let mut samples = decode_file(path)
            .with_context(|| format!("failed to decode '{}'", path.display()))
            .map_err(Error::decode)?;
        debug!(path = %path.display(), samples = samples.len(), "decoded media");

        if samples.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(vad) = loaded.vad.as_mut() {
            if !vad.apply(&mut samples)? {
                debug!(path = %path.display(), "no speech detected");
                return Ok(Vec::new());
            }
        }

        Ok(transcribe_samples(&loaded.ctx, &self.opts, &samples)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_validates_without_loading() -> anyhow::Result<()> {
        let backend = WhisperBackend::new(TranscriptionOptions::default())?;
        assert!(!backend.is_ready());
        assert!(backend.model_path().is_none());

        let bad = TranscriptionOptions {
            model: String::new(),
            ..Default::default()
        };
        assert!(matches!(WhisperBackend::new(bad), Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    fn missing_model_file_fails_ready_and_stays_unloaded() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut backend = WhisperBackend::new(TranscriptionOptions {
            models_dir: dir.path().to_path_buf(),
            vad_filter: false,
            ..Default::default()
        })?;

        let err = backend.ensure_ready().unwrap_err();
        assert!(err.to_string().contains("model-downloader"));
        assert!(!backend.is_ready());
        Ok(())
    }
}
