//! Error types shared by the ingestion pipeline and the query layer

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single save record could not be decoded. The batch it belongs to
    /// carries on without it.
    #[error("unable to parse player save {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The save directory itself could not be listed.
    #[error("player source unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored value could not be decoded back into its domain type.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid skill: {0}")]
    InvalidSkill(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
