use std::path::PathBuf;

use thiserror::Error;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
///
/// Every variant is file-scoped from the orchestrator's point of view: the batch records the
/// error's `Display` text in that file's outcome and moves on.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value was rejected before any work started.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The transcription engine failed (model load or inference).
    #[error("{0}")]
    Engine(String),

    /// The media file could not be opened or decoded to PCM.
    #[error("{0}")]
    Decode(String),

    /// Writing the subtitle document failed.
    #[error("failed to write subtitle '{}': {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Attach the destination path to a bare IO error raised while producing a subtitle file.
    pub(crate) fn while_writing(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Io(source) => Self::Serialization {
                path: path.into(),
                source,
            },
            other => other,
        }
    }

    /// Flatten an `anyhow` chain from the decode path.
    pub(crate) fn decode(err: anyhow::Error) -> Self {
        Self::Decode(format!("{err:#}"))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Engine(format!("{err:#}"))
    }
}
