//! Voice activity detection.
//!
//! Applied to the fully decoded buffer before inference when
//! [`TranscriptionOptions::vad_filter`](crate::TranscriptionOptions::vad_filter) is on.

mod policy;
mod processor;

pub use policy::{DEFAULT_VAD_POLICY, VadPolicy, attenuate_non_speech, speech_ranges};
pub use processor::VadProcessor;
