//! Error types for the suggestion engine.
//!
//! Every variant is recoverable: callers match on it and surface
//! [`SuggestionError::user_message`] instead of aborting.

use thiserror::Error;

use crate::types::{CommentId, SuggestionId, SuggestionKind, SuggestionStatus};

/// Errors returned by store operations and record validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionError {
    /// No suggestion with this id exists in the store.
    #[error("suggestion {id} not found")]
    NotFound { id: SuggestionId },

    /// Accept/reject on a suggestion that is no longer pending.
    #[error("suggestion {id} is already {current}")]
    InvalidTransition {
        id: SuggestionId,
        current: SuggestionStatus,
    },

    /// Comment content was empty after trimming, whether added through the
    /// store or found in a loaded record.
    #[error("comment on suggestion {id} is empty")]
    InvalidComment { id: SuggestionId },

    /// Content fields do not match the suggestion type.
    #[error("invalid {kind} content: {reason}")]
    InvalidContent {
        kind: SuggestionKind,
        reason: &'static str,
    },

    /// The comment policy only allows comments on pending suggestions.
    #[error("suggestion {id} is {status}, comments are closed")]
    CommentsClosed {
        id: SuggestionId,
        status: SuggestionStatus,
    },

    /// A loaded suggestion reuses an id already present in the store.
    #[error("suggestion {id} already exists")]
    DuplicateId { id: SuggestionId },

    /// A record's comment thread repeats a comment id.
    #[error("suggestion {id} has more than one comment with id {comment_id}")]
    DuplicateCommentId {
        id: SuggestionId,
        comment_id: CommentId,
    },

    /// A record's `resolvedAt` disagrees with its status.
    #[error("suggestion {id} has status {status} with an inconsistent resolvedAt")]
    InconsistentResolution {
        id: SuggestionId,
        status: SuggestionStatus,
    },
}

impl SuggestionError {
    /// Message suitable for showing to the person who triggered the operation.
    pub fn user_message(&self) -> &'static str {
        match self {
            SuggestionError::NotFound { .. } => "This suggestion no longer exists.",
            SuggestionError::InvalidTransition { .. } => {
                "This suggestion was already resolved by someone else."
            }
            SuggestionError::InvalidComment { .. } => "Comments cannot be empty.",
            SuggestionError::InvalidContent { .. } => "The suggested change is malformed.",
            SuggestionError::CommentsClosed { .. } => {
                "Comments are closed on resolved suggestions."
            }
            SuggestionError::DuplicateId { .. } => "This suggestion already exists.",
            SuggestionError::DuplicateCommentId { .. } => "The suggestion record is corrupt.",
            SuggestionError::InconsistentResolution { .. } => "The suggestion record is corrupt.",
        }
    }
}

/// Failure to parse one of the engine's keyword enums from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what}: {value:?}")]
pub struct ParseError {
    what: &'static str,
    value: String,
}

impl ParseError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_owned(),
        }
    }
}

/// Convenience alias for engine results.
pub type Result<T, E = SuggestionError> = std::result::Result<T, E>;
