use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use whisper_rs::{WhisperContext, WhisperContextParameters};

use super::logging::init_whisper_logging;

/// Load a whisper.cpp model from disk.
pub(super) fn load_context(model_path: &Path, use_gpu: bool) -> Result<WhisperContext> {
    init_whisper_logging();

    ensure!(
        model_path.is_file(),
        "model file not found at '{}' (fetch it with `model-downloader --name <model> --dir <models dir>`)",
        model_path.display()
    );
    let path = model_path
        .to_str()
        .ok_or_else(|| anyhow!("model path is not valid UTF-8: {}", model_path.display()))?;

    let mut params = WhisperContextParameters::default();
    params.use_gpu(use_gpu);

    WhisperContext::new_with_params(path, params)
        .with_context(|| format!("failed to load model from path: {path}"))
}
