//! Error type for document sessions and configuration loading.

use std::path::PathBuf;

use redline_core::SuggestionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The store refused the operation.
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),

    /// The session task has stopped and no longer accepts commands.
    #[error("document session has shut down")]
    Closed,

    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
