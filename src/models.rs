//! Known whisper.cpp model artifacts and model identifier resolution.
//!
//! A model identifier is either a path to a GGML file or one of the names in [`WHISPER_MODELS`] /
//! [`VAD_MODELS`]. Names resolve to a file inside the configured models directory; the
//! `model-downloader` binary fetches them there.

use std::path::{Path, PathBuf};

use crate::opts::ComputeType;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Whisper,
    Vad,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Whisper => "whisper",
            ModelKind::Vad => "vad",
        }
    }
}

/// Download source for a known model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub kind: ModelKind,

    /// Friendly name users type (e.g. "large-v3-turbo").
    pub name: &'static str,

    /// Filename written to disk (e.g. "ggml-large-v3-turbo.bin").
    pub filename: &'static str,

    /// Full download URL.
    pub url: &'static str,
}

macro_rules! whisper_model {
    ($name:literal) => {
        ModelSpec {
            kind: ModelKind::Whisper,
            name: $name,
            filename: concat!("ggml-", $name, ".bin"),
            url: concat!(
                "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-",
                $name,
                ".bin"
            ),
        }
    };
}

macro_rules! vad_model {
    ($name:literal) => {
        ModelSpec {
            kind: ModelKind::Vad,
            name: $name,
            filename: concat!("ggml-", $name, ".bin"),
            url: concat!(
                "https://huggingface.co/ggml-org/whisper-vad/resolve/main/ggml-",
                $name,
                ".bin"
            ),
        }
    };
}

/// Whisper models (allowlist), matching whisper.cpp's Hugging Face repo.
pub static WHISPER_MODELS: &[ModelSpec] = &[
    whisper_model!("tiny"),
    whisper_model!("tiny.en"),
    whisper_model!("tiny-q5_1"),
    whisper_model!("tiny.en-q5_1"),
    whisper_model!("tiny-q8_0"),
    whisper_model!("base"),
    whisper_model!("base.en"),
    whisper_model!("base-q5_1"),
    whisper_model!("base.en-q5_1"),
    whisper_model!("base-q8_0"),
    whisper_model!("small"),
    whisper_model!("small.en"),
    whisper_model!("small-q5_1"),
    whisper_model!("small.en-q5_1"),
    whisper_model!("small-q8_0"),
    whisper_model!("medium"),
    whisper_model!("medium.en"),
    whisper_model!("medium-q5_0"),
    whisper_model!("medium.en-q5_0"),
    whisper_model!("medium-q8_0"),
    whisper_model!("large-v1"),
    whisper_model!("large-v2"),
    whisper_model!("large-v2-q5_0"),
    whisper_model!("large-v2-q8_0"),
    whisper_model!("large-v3"),
    whisper_model!("large-v3-q5_0"),
    whisper_model!("large-v3-turbo"),
    whisper_model!("large-v3-turbo-q5_0"),
    whisper_model!("large-v3-turbo-q8_0"),
];

/// Silero VAD models (allowlist).
pub static VAD_MODELS: &[ModelSpec] = &[vad_model!("silero-v5.1.2"), vad_model!("silero-v6.2.0")];

/// Look a catalog name up in both lists.
pub fn lookup_model(name: &str) -> Option<&'static ModelSpec> {
    find(WHISPER_MODELS, name).or_else(|| find(VAD_MODELS, name))
}

fn find(list: &'static [ModelSpec], name: &str) -> Option<&'static ModelSpec> {
    list.iter().find(|m| m.name == name)
}

/// Resolve a Whisper model identifier to a file path.
///
/// - An identifier naming an existing file is used as-is (`~` is expanded).
/// - A catalog name resolves to `models_dir/<filename>`. For int8 compute types the `-q8_0`
///   variant is used when the catalog has one and it is already in `models_dir`.
/// - Anything else is a configuration error.
///
/// The plain catalog path is not required to exist yet; loading reports that.
pub fn resolve_model_path(
    model: &str,
    models_dir: &Path,
    compute_type: ComputeType,
) -> Result<PathBuf> {
    let model = model.trim();
    if let Some(path) = existing_file(model) {
        return Ok(path);
    }

    let quantized = compute_type
        .prefers_quantized()
        .then(|| find(WHISPER_MODELS, &format!("{model}-q8_0")))
        .flatten()
        .map(|spec| models_dir.join(spec.filename))
        .filter(|path| path.is_file());
    if let Some(path) = quantized {
        return Ok(path);
    }

    find(WHISPER_MODELS, model)
        .map(|spec| models_dir.join(spec.filename))
        .ok_or_else(|| unknown(ModelKind::Whisper, model))
}

/// Resolve a VAD model identifier to a file path (see [`resolve_model_path`]).
pub fn resolve_vad_model_path(model: &str, models_dir: &Path) -> Result<PathBuf> {
    let model = model.trim();
    if let Some(path) = existing_file(model) {
        return Ok(path);
    }

    find(VAD_MODELS, model)
        .map(|spec| models_dir.join(spec.filename))
        .ok_or_else(|| unknown(ModelKind::Vad, model))
}

fn existing_file(identifier: &str) -> Option<PathBuf> {
    if identifier.is_empty() {
        return None;
    }
    let path = PathBuf::from(shellexpand::tilde(identifier).as_ref());
    path.is_file().then_some(path)
}

fn unknown(kind: ModelKind, model: &str) -> Error {
    Error::config(format!(
        "unknown {} model '{model}': not an existing file and not a known model name \
         (run `model-downloader --list`)",
        kind.as_str()
    ))
}

/// Human-readable listing of the catalog, grouped by kind.
pub fn model_list_string() -> String {
    let mut out = String::new();

    out.push_str("Whisper models:\n");
    for m in WHISPER_MODELS {
        out.push_str("  - ");
        out.push_str(m.name);
        out.push('\n');
    }

    out.push('\n');
    out.push_str("VAD models:\n");
    for m in VAD_MODELS {
        out.push_str("  - ");
        out.push_str(m.name);
        out.push('\n');
    }

    out
}
