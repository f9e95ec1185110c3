//! The per-document suggestion store.
//!
//! [`SuggestionStore`] owns every suggestion for one document and is the only
//! place suggestions are mutated. Reads hand out clones so callers can never
//! edit a suggestion in place.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::authors::AuthorDirectory;
use crate::error::{Result, SuggestionError};
use crate::query::{SuggestionCounts, SuggestionQuery};
use crate::types::{
    CommentId, NewComment, NewSuggestion, Resolution, Suggestion, SuggestionComment, SuggestionId,
};

/// Source of "now" for created/resolved timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via `chrono::Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh suggestion and comment ids.
pub trait IdGenerator: Send + Sync {
    fn suggestion_id(&self) -> SuggestionId;
    fn comment_id(&self) -> CommentId;
}

/// UUID v4 ids, the store's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn suggestion_id(&self) -> SuggestionId {
        SuggestionId::generate()
    }

    fn comment_id(&self) -> CommentId {
        CommentId::generate()
    }
}

/// Whether comments may be added after a suggestion is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentPolicy {
    /// Comments are accepted in any state.
    #[default]
    Open,
    /// Comments are accepted only while the suggestion is pending.
    PendingOnly,
}

/// Per-item result of [`SuggestionStore::accept_all`] / [`SuggestionStore::reject_all`].
///
/// Suggestions that were not pending when the call started are not acted on
/// and appear in neither list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Ids that transitioned, in store order.
    pub resolved: Vec<SuggestionId>,
    /// Ids whose transition was refused, with the reason.
    pub failed: Vec<(SuggestionId, SuggestionError)>,
}

impl BulkOutcome {
    /// True when no transition was refused.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// All suggestions for a single document.
pub struct SuggestionStore {
    document_id: String,
    suggestions: Vec<Suggestion>,
    policy: CommentPolicy,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl fmt::Debug for SuggestionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionStore")
            .field("document_id", &self.document_id)
            .field("suggestions", &self.suggestions.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SuggestionStore {
    /// Creates an empty store with the open comment policy, the system clock
    /// and UUID v4 ids.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            suggestions: Vec::new(),
            policy: CommentPolicy::default(),
            clock: Box::new(SystemClock),
            ids: Box::new(UuidIds),
        }
    }

    /// Sets whether resolved suggestions still take comments.
    pub fn with_policy(mut self, policy: CommentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the source of created/resolved timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the source of new suggestion and comment ids.
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// The document these suggestions belong to.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The comment policy in force.
    pub fn policy(&self) -> CommentPolicy {
        self.policy
    }

    /// Number of suggestions, resolved ones included.
    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    /// True when the store holds no suggestions.
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Seeds the store with an existing set of suggestions, appended in order.
    ///
    /// Either every suggestion is added or none is.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestionError::DuplicateId`] if an id repeats within the
    /// batch or already exists in the store.
    pub fn load(&mut self, suggestions: impl IntoIterator<Item = Suggestion>) -> Result<usize> {
        let incoming: Vec<Suggestion> = suggestions.into_iter().collect();
        {
            let mut seen: HashSet<&SuggestionId> = self.suggestions.iter().map(Suggestion::id).collect();
            for suggestion in &incoming {
                if !seen.insert(suggestion.id()) {
                    return Err(SuggestionError::DuplicateId {
                        id: suggestion.id().clone(),
                    });
                }
            }
        }
        let count = incoming.len();
        self.suggestions.extend(incoming);
        debug!(document = %self.document_id, count, "loaded suggestions");
        Ok(count)
    }

    /// Records a new pending suggestion and returns a copy of it.
    pub fn propose(&mut self, draft: NewSuggestion) -> Suggestion {
        let suggestion = Suggestion::propose(self.ids.suggestion_id(), draft, self.clock.now());
        debug!(
            document = %self.document_id,
            suggestion_id = %suggestion.id(),
            kind = %suggestion.kind(),
            "suggestion proposed"
        );
        self.suggestions.push(suggestion.clone());
        suggestion
    }

    /// Returns a copy of the suggestion with `id`.
    pub fn get(&self, id: &SuggestionId) -> Option<Suggestion> {
        self.find(id).cloned()
    }

    /// Copies of every suggestion in insertion order.
    pub fn snapshot(&self) -> Vec<Suggestion> {
        self.suggestions.clone()
    }

    /// Borrows the suggestions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter()
    }

    /// Accepts a pending suggestion.
    ///
    /// # Errors
    ///
    /// [`SuggestionError::NotFound`] for an unknown id,
    /// [`SuggestionError::InvalidTransition`] if it is already resolved.
    pub fn accept(&mut self, id: &SuggestionId) -> Result<Suggestion> {
        self.resolve(id, Resolution::Accept)
    }

    /// Rejects a pending suggestion. Errors as for [`SuggestionStore::accept`].
    pub fn reject(&mut self, id: &SuggestionId) -> Result<Suggestion> {
        self.resolve(id, Resolution::Reject)
    }

    /// Applies `resolution` to a single suggestion.
    pub fn resolve(&mut self, id: &SuggestionId, resolution: Resolution) -> Result<Suggestion> {
        let now = self.clock.now();
        let document = &self.document_id;
        let suggestion = self
            .suggestions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| SuggestionError::NotFound { id: id.clone() })?;
        suggestion.resolve(resolution, now)?;
        debug!(
            document = %document,
            suggestion_id = %id,
            status = %suggestion.status(),
            "suggestion resolved"
        );
        Ok(suggestion.clone())
    }

    /// Accepts every suggestion that is pending when the call starts.
    pub fn accept_all(&mut self) -> BulkOutcome {
        self.resolve_all(Resolution::Accept)
    }

    /// Rejects every suggestion that is pending when the call starts.
    pub fn reject_all(&mut self) -> BulkOutcome {
        self.resolve_all(Resolution::Reject)
    }

    /// Applies `resolution` to each pending suggestion independently.
    ///
    /// One refused transition does not stop the others; every refusal is
    /// reported in [`BulkOutcome::failed`].
    pub fn resolve_all(&mut self, resolution: Resolution) -> BulkOutcome {
        let pending: Vec<SuggestionId> = self
            .suggestions
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.id().clone())
            .collect();

        let mut outcome = BulkOutcome::default();
        for id in pending {
            match self.resolve(&id, resolution) {
                Ok(_) => outcome.resolved.push(id),
                Err(err) => {
                    warn!(document = %self.document_id, suggestion_id = %id, error = %err, "bulk transition refused");
                    outcome.failed.push((id, err));
                }
            }
        }
        info!(
            document = %self.document_id,
            status = %resolution.status(),
            resolved = outcome.resolved.len(),
            failed = outcome.failed.len(),
            "bulk resolution finished"
        );
        outcome
    }

    /// Appends a comment to a suggestion's thread.
    ///
    /// # Errors
    ///
    /// [`SuggestionError::NotFound`] for an unknown id,
    /// [`SuggestionError::InvalidComment`] when the content is blank, and
    /// [`SuggestionError::CommentsClosed`] when the policy is
    /// [`CommentPolicy::PendingOnly`] and the suggestion is resolved.
    pub fn add_comment(&mut self, id: &SuggestionId, comment: NewComment) -> Result<SuggestionComment> {
        let now = self.clock.now();
        let policy = self.policy;
        let suggestion = self
            .suggestions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| SuggestionError::NotFound { id: id.clone() })?;

        if comment.content.trim().is_empty() {
            return Err(SuggestionError::InvalidComment { id: id.clone() });
        }
        if policy == CommentPolicy::PendingOnly && !suggestion.is_pending() {
            return Err(SuggestionError::CommentsClosed {
                id: id.clone(),
                status: suggestion.status(),
            });
        }

        let comment = SuggestionComment {
            id: self.ids.comment_id(),
            author_id: comment.author_id,
            author_name: comment.author_name,
            author_avatar: comment.author_avatar,
            content: comment.content,
            created_at: now,
        };
        suggestion.push_comment(comment.clone());
        debug!(
            document = %self.document_id,
            suggestion_id = %id,
            comment_id = %comment.id,
            "comment added"
        );
        Ok(comment)
    }

    /// Filtered, sorted copies of the stored suggestions.
    pub fn query(&self, query: &SuggestionQuery) -> Vec<Suggestion> {
        query.apply(&self.suggestions)
    }

    /// Status and pending-type tallies over every suggestion.
    pub fn counts(&self) -> SuggestionCounts {
        SuggestionCounts::tally(&self.suggestions)
    }

    /// Distinct authors in first-seen order.
    pub fn authors(&self) -> AuthorDirectory {
        AuthorDirectory::collect(&self.suggestions)
    }

    fn find(&self, id: &SuggestionId) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.id() == id)
    }
}
