use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result};

/// Options for the transcription engine.
///
/// This struct represents *library-level configuration*, not CLI flags or environment variables.
/// Frontends map their inputs into it and call [`TranscriptionOptions::validate`] (backends do so
/// on construction), so:
/// - the core never reads ambient configuration
/// - invalid values are rejected up front rather than coerced
///
/// One instance is fixed for the lifetime of a backend and reused across every file it
/// transcribes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionOptions {
    /// Model identifier: either a path to a whisper.cpp GGML file or a catalog name such as
    /// `"small"` or `"large-v3-turbo"` (see [`crate::models`]).
    pub model: String,

    /// Directory catalog names are resolved against.
    pub models_dir: PathBuf,

    /// Compute/precision mode.
    pub compute_type: ComputeType,

    /// Forced spoken language (e.g. `"en"`). `None` lets Whisper auto-detect.
    pub language: Option<String>,

    /// Beam search width. `None` uses [`DEFAULT_BEAM_SIZE`].
    pub beam_size: Option<NonZeroUsize>,

    /// Whether to attenuate non-speech regions with a VAD model before inference.
    pub vad_filter: bool,

    /// VAD model identifier (path or catalog name). Required when `vad_filter` is on.
    pub vad_model: Option<String>,
}

/// Beam width used when none is configured.
pub const DEFAULT_BEAM_SIZE: usize = 5;

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            model: "small".to_owned(),
            models_dir: PathBuf::from("./models"),
            compute_type: ComputeType::Int8Float16,
            language: None,
            beam_size: None,
            vad_filter: true,
            vad_model: Some("silero-v6.2.0".to_owned()),
        }
    }
}

impl TranscriptionOptions {
    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model must be provided"));
        }

        if let Some(language) = &self.language {
            let language = language.trim();
            if language.is_empty() {
                return Err(Error::config(
                    "language must be omitted (auto-detect) rather than empty",
                ));
            }
            if !language.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(Error::config(format!(
                    "language must be a language code such as 'en', got '{language}'"
                )));
            }
        }

        if self.vad_filter {
            let has_vad_model = self
                .vad_model
                .as_deref()
                .is_some_and(|m| !m.trim().is_empty());
            if !has_vad_model {
                return Err(Error::config(
                    "VAD filter is enabled but no VAD model was provided",
                ));
            }
        }

        Ok(())
    }

    /// The forced language code, trimmed. `None` means auto-detect.
    pub fn language_code(&self) -> Option<&str> {
        self.language.as_deref().map(str::trim)
    }

    /// The effective beam width.
    pub fn beam_width(&self) -> usize {
        self.beam_size.map_or(DEFAULT_BEAM_SIZE, NonZeroUsize::get)
    }
}

/// Compute/precision mode, named with the faster-whisper vocabulary.
///
/// whisper.cpp has no runtime precision switch, so the mode maps onto what it does have:
/// - modes carrying `float16` run on the GPU when one was compiled in
/// - modes carrying `int8` prefer the `q8_0` quantized file when a catalog model is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeType {
    #[default]
    Default,
    Auto,
    Float32,
    Float16,
    Int8,
    Int8Float16,
    Int8Float32,
}

impl ComputeType {
    pub const ALL: &'static [ComputeType] = &[
        ComputeType::Default,
        ComputeType::Auto,
        ComputeType::Float32,
        ComputeType::Float16,
        ComputeType::Int8,
        ComputeType::Int8Float16,
        ComputeType::Int8Float32,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComputeType::Default => "default",
            ComputeType::Auto => "auto",
            ComputeType::Float32 => "float32",
            ComputeType::Float16 => "float16",
            ComputeType::Int8 => "int8",
            ComputeType::Int8Float16 => "int8_float16",
            ComputeType::Int8Float32 => "int8_float32",
        }
    }

    pub fn use_gpu(self) -> bool {
        matches!(
            self,
            ComputeType::Default
                | ComputeType::Auto
                | ComputeType::Float16
                | ComputeType::Int8Float16
        )
    }

    pub fn prefers_quantized(self) -> bool {
        matches!(
            self,
            ComputeType::Int8 | ComputeType::Int8Float16 | ComputeType::Int8Float32
        )
    }
}

impl fmt::Display for ComputeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComputeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ComputeType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ComputeType::ALL.iter().map(|c| c.as_str()).collect();
                Error::config(format!(
                    "unknown compute type '{}' (expected one of: {})",
                    s.trim(),
                    known.join(", ")
                ))
            })
    }
}

/// Per-batch policy flags for [`crate::SubtitleGenerator::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOpts {
    /// Descend into subdirectories of each root.
    pub recursive: bool,

    /// Delete an existing subtitle and transcribe again.
    pub overwrite: bool,

    /// Leave files that already have a subtitle alone (ignored when `overwrite` is set).
    ///
    /// With both flags off, an existing subtitle is re-transcribed and replaced.
    pub skip_existing: bool,
}

impl Default for BatchOpts {
    fn default() -> Self {
        Self {
            recursive: true,
            overwrite: false,
            skip_existing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() -> anyhow::Result<()> {
        TranscriptionOptions::default().validate()?;
        Ok(())
    }

    #[test]
    fn rejects_empty_model_and_language() {
        let opts = TranscriptionOptions {
            model: "  ".to_owned(),
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(Error::Config(_))));

        let opts = TranscriptionOptions {
            language: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(Error::Config(_))));

        let opts = TranscriptionOptions {
            language: Some("en; rm -rf".to_owned()),
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn language_code_is_trimmed() -> anyhow::Result<()> {
        let opts = TranscriptionOptions {
            language: Some(" en ".to_owned()),
            ..Default::default()
        };
        opts.validate()?;
        assert_eq!(opts.language_code(), Some("en"));

        assert_eq!(TranscriptionOptions::default().language_code(), None);
        Ok(())
    }

    #[test]
    fn vad_filter_requires_a_vad_model() {
        let opts = TranscriptionOptions {
            vad_model: None,
            ..Default::default()
        };
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("VAD"));

        let opts = TranscriptionOptions {
            vad_filter: false,
            vad_model: None,
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn beam_width_defaults_and_overrides() {
        let opts = TranscriptionOptions::default();
        assert_eq!(opts.beam_width(), DEFAULT_BEAM_SIZE);

        let opts = TranscriptionOptions {
            beam_size: NonZeroUsize::new(2),
            ..Default::default()
        };
        assert_eq!(opts.beam_width(), 2);
    }

    #[test]
    fn compute_type_parses_known_names_only() -> anyhow::Result<()> {
        assert_eq!(
            "int8_float16".parse::<ComputeType>()?,
            ComputeType::Int8Float16
        );
        assert_eq!(" FLOAT32 ".parse::<ComputeType>()?, ComputeType::Float32);

        let err = "int4".parse::<ComputeType>().unwrap_err();
        assert!(err.to_string().contains("unknown compute type 'int4'"));
        Ok(())
    }

    #[test]
    fn compute_type_round_trips_through_display() -> anyhow::Result<()> {
        for c in ComputeType::ALL {
            assert_eq!(c.to_string().parse::<ComputeType>()?, *c);
        }
        Ok(())
    }

    #[test]
    fn compute_type_maps_to_gpu_and_quantization() {
        assert!(ComputeType::Int8Float16.use_gpu());
        assert!(ComputeType::Int8Float16.prefers_quantized());
        assert!(!ComputeType::Float32.use_gpu());
        assert!(!ComputeType::Float16.prefers_quantized());
        assert!(!ComputeType::Int8.use_gpu());
    }

    #[test]
    fn batch_defaults_match_directory_mode() {
        let opts = BatchOpts::default();
        assert!(opts.recursive);
        assert!(!opts.overwrite);
        assert!(opts.skip_existing);
    }
}
