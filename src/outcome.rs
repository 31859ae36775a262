use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Terminal state of one processed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// This run wrote a new subtitle.
    Created,
    /// A subtitle already existed and was left alone.
    Skipped,
    /// Transcription, serialization or removal of the old subtitle failed.
    Failed,
    /// A root produced no media files at all.
    NoMedia,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Created => "created",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::NoMedia => "no_media",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MSG_CREATED: &str = "Subtitle created successfully.";
pub const MSG_SKIPPED: &str = "Subtitle already exists.";
pub const MSG_NO_MEDIA: &str = "No media files detected.";

/// Result of processing one media file (or one empty root).
///
/// `created()` holds only when this run wrote the subtitle, and then `output()` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptionOutcome {
    source: PathBuf,
    output: Option<PathBuf>,
    created: bool,
    status: OutcomeStatus,
    message: String,
}

impl TranscriptionOutcome {
    pub fn created(source: PathBuf, output: PathBuf) -> Self {
        Self::new(source, Some(output), OutcomeStatus::Created, MSG_CREATED)
    }

    pub fn skipped(source: PathBuf, output: PathBuf) -> Self {
        Self::new(source, Some(output), OutcomeStatus::Skipped, MSG_SKIPPED)
    }

    pub fn failed(source: PathBuf, reason: impl fmt::Display) -> Self {
        Self::new(
            source,
            None,
            OutcomeStatus::Failed,
            format!("Failed to generate subtitle: {reason}"),
        )
    }

    pub fn no_media(root: PathBuf) -> Self {
        Self::new(root, None, OutcomeStatus::NoMedia, MSG_NO_MEDIA)
    }

    fn new(
        source: PathBuf,
        output: Option<PathBuf>,
        status: OutcomeStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            output,
            created: status == OutcomeStatus::Created,
            status,
            message: message.into(),
        }
    }

    /// The media file, or the root for [`OutcomeStatus::NoMedia`].
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Per-status counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_media: usize,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

pub fn summarize(outcomes: &[TranscriptionOutcome]) -> BatchSummary {
    outcomes
        .iter()
        .fold(BatchSummary::default(), |mut acc, o| {
            match o.status {
                OutcomeStatus::Created => acc.created += 1,
                OutcomeStatus::Skipped => acc.skipped += 1,
                OutcomeStatus::Failed => acc.failed += 1,
                OutcomeStatus::NoMedia => acc.no_media += 1,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_flag_follows_status() {
        let created = TranscriptionOutcome::created("a.mp4".into(), "a.srt".into());
        assert!(created.is_created());
        assert_eq!(created.output(), Some(Path::new("a.srt")));

        let skipped = TranscriptionOutcome::skipped("b.mp4".into(), "b.srt".into());
        assert!(!skipped.is_created());
        assert_eq!(skipped.output(), Some(Path::new("b.srt")));
        assert_eq!(skipped.message(), MSG_SKIPPED);
    }

    #[test]
    fn failures_carry_the_reason_and_no_output() {
        let failed = TranscriptionOutcome::failed("c.mp4".into(), "decoder failure");
        assert!(!failed.is_created());
        assert!(failed.output().is_none());
        assert_eq!(failed.status(), OutcomeStatus::Failed);
        assert_eq!(failed.message(), "Failed to generate subtitle: decoder failure");
    }

    #[test]
    fn summary_counts_each_status() {
        let outcomes = vec![
            TranscriptionOutcome::created("a".into(), "a.srt".into()),
            TranscriptionOutcome::failed("b".into(), "boom"),
            TranscriptionOutcome::skipped("c".into(), "c.srt".into()),
            TranscriptionOutcome::created("d".into(), "d.srt".into()),
            TranscriptionOutcome::no_media("/empty".into()),
        ];

        let summary = summarize(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                created: 2,
                skipped: 1,
                failed: 1,
                no_media: 1,
            }
        );
        assert!(summary.has_failures());
    }

    #[test]
    fn outcomes_serialize_with_snake_case_status() -> anyhow::Result<()> {
        let json = serde_json::to_value(TranscriptionOutcome::no_media("/data/x".into()))?;
        assert_eq!(json["status"], "no_media");
        assert_eq!(json["created"], false);
        assert!(json["output"].is_null());
        assert_eq!(json["message"], MSG_NO_MEDIA);
        Ok(())
    }
}
