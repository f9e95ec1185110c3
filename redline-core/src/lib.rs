//! redline-core — track-changes suggestion engine.
//!
//! Holds the proposed edits against a document, applies the accept/reject
//! lifecycle and comment threads, and produces filtered, sorted, read-only
//! views for a UI layer. Everything is synchronous and in memory; callers that
//! share a store between tasks serialize access themselves (see
//! `redline-session`).

pub mod authors;
pub mod error;
pub mod query;
pub mod store;
pub mod types;

pub use authors::AuthorDirectory;
pub use error::{ParseError, Result, SuggestionError};
pub use query::{KindCounts, SortOrder, StatusFilter, SuggestionCounts, SuggestionQuery};
pub use store::{BulkOutcome, Clock, CommentPolicy, IdGenerator, SuggestionStore, SystemClock, UuidIds};
pub use types::{
    Author, CommentId, ContentParts, NewComment, NewSuggestion, Resolution, Suggestion, SuggestionComment,
    SuggestionContent, SuggestionId, SuggestionKind, SuggestionRecord, SuggestionState, SuggestionStatus,
};
