use serde::Serialize;

/// One timed utterance emitted by a transcription backend.
///
/// A file's segments keep the backend's emission order; that order is the cue numbering of the
/// subtitle written for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start_seconds: f64,
    pub end_seconds: f64,

    /// Raw text as emitted. May carry leading/trailing whitespace; the encoder trims it.
    pub text: String,
}

impl Segment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}
