//! `srt_folders` turns directories of audio/video into SubRip subtitles with Whisper.
//!
//! This crate provides:
//! - Media discovery over directory trees
//! - A lazily loaded whisper.cpp backend (decode, optional VAD, beam search)
//! - An atomic SubRip (`.srt`) writer
//! - A batch orchestrator returning one outcome per file
//!
//! Most consumers should start with [`SubtitleGenerator`]:
//!
//! ```no_run
//! use srt_folders::{BatchOpts, SubtitleGenerator, TranscriptionOptions};
//!
//! # fn main() -> srt_folders::Result<()> {
//! let mut generator = SubtitleGenerator::new(TranscriptionOptions::default())?;
//! for outcome in generator.process(&["~/videos"], &BatchOpts::default()) {
//!     println!("{} ({})", outcome.source().display(), outcome.status());
//! }
//! # Ok(())
//! # }
//! ```

// High-level API.
pub mod generator;
pub mod opts;
pub mod outcome;

// Engine abstraction and the built-in implementation.
pub mod backend;
pub mod backends;
pub mod models;

// Input discovery and decoding.
pub mod audio_pipeline;
pub mod decoder;
pub mod media;
pub mod vad;

// Segments and subtitle output.
pub mod segment_encoder;
pub mod segments;
pub mod srt_encoder;
pub mod subtitle;
pub mod timestamp;

pub mod error;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "cli")]
pub mod cli;

pub use backend::Backend;
pub use backends::whisper::WhisperBackend;
pub use error::{Error, Result};
pub use generator::SubtitleGenerator;
pub use media::{MEDIA_EXTENSIONS, MediaFile};
pub use opts::{BatchOpts, ComputeType, TranscriptionOptions};
pub use outcome::{BatchSummary, OutcomeStatus, TranscriptionOutcome, summarize};
pub use segments::Segment;
pub use subtitle::{subtitle_path_for, write_subtitle};
pub use timestamp::format_timestamp;
