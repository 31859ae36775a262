//! Shared command-line surface for the binaries.
//!
//! Every engine option can also come from the environment (`SUBTITLE_*`), so the same container
//! image can be configured either way. Values are parsed and validated here, before any batch
//! runs.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Args;
use clap::builder::BoolishValueParser;

use crate::Result;
use crate::opts::{ComputeType, TranscriptionOptions};

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Whisper model: catalog name (e.g. "small", "large-v3-turbo") or path to a GGML file.
    #[arg(long = "model-size", env = "SUBTITLE_MODEL_SIZE", default_value = "small")]
    pub model: String,

    /// Directory catalog model names resolve against.
    #[arg(long, env = "SUBTITLE_MODELS_DIR", default_value = "./models")]
    pub models_dir: PathBuf,

    /// default, auto, float32, float16, int8, int8_float16 or int8_float32.
    #[arg(long, env = "SUBTITLE_COMPUTE_TYPE", default_value = "int8_float16")]
    pub compute_type: ComputeType,

    /// Spoken language code (e.g. "en"). Auto-detected when unset or empty.
    #[arg(long, env = "SUBTITLE_LANGUAGE")]
    pub language: Option<String>,

    /// Beam search width (positive integer, default 5).
    #[arg(long, env = "SUBTITLE_BEAM_SIZE")]
    pub beam_size: Option<NonZeroUsize>,

    /// Attenuate non-speech audio with a VAD model before transcribing.
    #[arg(
        long,
        env = "SUBTITLE_VAD_FILTER",
        default_value = "true",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub vad_filter: bool,

    /// Shorthand for `--vad-filter false`.
    #[arg(long)]
    pub no_vad: bool,

    /// VAD model: catalog name (e.g. "silero-v6.2.0") or path to a GGML file.
    #[arg(long, env = "SUBTITLE_VAD_MODEL", default_value = "silero-v6.2.0")]
    pub vad_model: String,
}

impl EngineArgs {
    /// Build validated engine options.
    ///
    /// An empty language (e.g. `SUBTITLE_LANGUAGE=""`) means auto-detect.
    pub fn into_options(self) -> Result<TranscriptionOptions> {
        let language = self
            .language
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());

        let opts = TranscriptionOptions {
            model: self.model.trim().to_owned(),
            models_dir: self.models_dir,
            compute_type: self.compute_type,
            language,
            beam_size: self.beam_size,
            vad_filter: self.vad_filter && !self.no_vad,
            vad_model: Some(self.vad_model.trim().to_owned()).filter(|m| !m.is_empty()),
        };

        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        engine: EngineArgs,
    }

    fn parse(args: &[&str]) -> std::result::Result<TestCli, clap::Error> {
        TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied()))
    }

    #[test]
    fn explicit_flags_build_options() -> anyhow::Result<()> {
        let cli = parse(&[
            "--model-size",
            "tiny",
            "--compute-type",
            "float32",
            "--language",
            "de",
            "--beam-size",
            "3",
            "--vad-filter",
            "false",
        ])?;

        let opts = cli.engine.into_options()?;
        assert_eq!(opts.model, "tiny");
        assert_eq!(opts.compute_type, ComputeType::Float32);
        assert_eq!(opts.language.as_deref(), Some("de"));
        assert_eq!(opts.beam_width(), 3);
        assert!(!opts.vad_filter);
        Ok(())
    }

    #[test]
    fn no_vad_disables_the_filter() -> anyhow::Result<()> {
        let opts = parse(&["--model-size", "tiny", "--no-vad"])?
            .engine
            .into_options()?;
        assert!(!opts.vad_filter);
        Ok(())
    }

    #[test]
    fn empty_language_means_auto_detect() -> anyhow::Result<()> {
        let opts = parse(&["--model-size", "tiny", "--language", "  "])?
            .engine
            .into_options()?;
        assert!(opts.language.is_none());
        Ok(())
    }

    #[test]
    fn invalid_numbers_and_compute_types_are_rejected() {
        assert!(parse(&["--beam-size", "0"]).is_err());
        assert!(parse(&["--beam-size", "five"]).is_err());
        assert!(parse(&["--compute-type", "int4"]).is_err());
    }
}
