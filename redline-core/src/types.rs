use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, SuggestionError};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier verbatim.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh UUID v4 identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// The raw identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a suggestion. UUID v4 text when generated by the store.
    SuggestionId
);

string_id!(
    /// Identifier of a comment within a suggestion's thread.
    CommentId
);

/// The kind of edit a suggestion proposes.
///
/// Variant order matches the lexicographic order of the wire names
/// (`deletion < insertion < replacement`), so `Ord` can drive the type sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Deletion,
    Insertion,
    Replacement,
}

impl SuggestionKind {
    /// Wire name, e.g. `"insertion"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Deletion => "deletion",
            SuggestionKind::Insertion => "insertion",
            SuggestionKind::Replacement => "replacement",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deletion" => Ok(SuggestionKind::Deletion),
            "insertion" => Ok(SuggestionKind::Insertion),
            "replacement" => Ok(SuggestionKind::Replacement),
            other => Err(ParseError::new("suggestion type", other)),
        }
    }
}

/// Flat review status of a suggestion, as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    /// Wire name, e.g. `"pending"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    /// True for suggestions still awaiting a decision.
    pub fn is_pending(self) -> bool {
        self == SuggestionStatus::Pending
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SuggestionStatus::Pending),
            "accepted" => Ok(SuggestionStatus::Accepted),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(ParseError::new("suggestion status", other)),
        }
    }
}

/// A reviewer's decision on a pending suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Accept,
    Reject,
}

impl Resolution {
    /// The status a suggestion ends up in after this resolution.
    pub fn status(self) -> SuggestionStatus {
        match self {
            Resolution::Accept => SuggestionStatus::Accepted,
            Resolution::Reject => SuggestionStatus::Rejected,
        }
    }
}

/// Lifecycle state of a suggestion.
///
/// The resolution timestamp lives inside the terminal variants, so a pending
/// suggestion can never carry one and a resolved suggestion always does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionState {
    Pending,
    Accepted { at: DateTime<Utc> },
    Rejected { at: DateTime<Utc> },
}

impl SuggestionState {
    /// Status without the timestamp.
    pub fn status(&self) -> SuggestionStatus {
        match self {
            SuggestionState::Pending => SuggestionStatus::Pending,
            SuggestionState::Accepted { .. } => SuggestionStatus::Accepted,
            SuggestionState::Rejected { .. } => SuggestionStatus::Rejected,
        }
    }

    /// When the suggestion left `Pending`, if it has.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SuggestionState::Pending => None,
            SuggestionState::Accepted { at } | SuggestionState::Rejected { at } => Some(*at),
        }
    }

    /// Rebuilds a state from its flat `status` + `resolvedAt` form.
    ///
    /// Returns `None` when the two disagree (a pending status with a timestamp,
    /// or a resolved status without one).
    pub fn from_parts(status: SuggestionStatus, resolved_at: Option<DateTime<Utc>>) -> Option<Self> {
        match (status, resolved_at) {
            (SuggestionStatus::Pending, None) => Some(SuggestionState::Pending),
            (SuggestionStatus::Accepted, Some(at)) => Some(SuggestionState::Accepted { at }),
            (SuggestionStatus::Rejected, Some(at)) => Some(SuggestionState::Rejected { at }),
            _ => None,
        }
    }
}

/// The text payload of a suggestion, shaped by its kind.
///
/// Insertions carry only the suggested text, deletions only the original,
/// replacements both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionContent {
    Insertion { suggested: String },
    Deletion { original: String },
    Replacement { original: String, suggested: String },
}

impl SuggestionContent {
    /// Content for inserting `suggested` text.
    pub fn insertion(suggested: impl Into<String>) -> Self {
        SuggestionContent::Insertion { suggested: suggested.into() }
    }

    /// Content for removing `original` text.
    pub fn deletion(original: impl Into<String>) -> Self {
        SuggestionContent::Deletion { original: original.into() }
    }

    /// Content for swapping `original` for `suggested`.
    pub fn replacement(original: impl Into<String>, suggested: impl Into<String>) -> Self {
        SuggestionContent::Replacement {
            original: original.into(),
            suggested: suggested.into(),
        }
    }

    /// Builds content from the loose `{ original?, suggested? }` pair.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestionError::InvalidContent`] when the fields present do not
    /// match `kind`. Empty strings count as present.
    pub fn from_parts(
        kind: SuggestionKind,
        original: Option<String>,
        suggested: Option<String>,
    ) -> Result<Self, SuggestionError> {
        let invalid = |reason| SuggestionError::InvalidContent { kind, reason };
        match (kind, original, suggested) {
            (SuggestionKind::Insertion, None, Some(suggested)) => {
                Ok(SuggestionContent::Insertion { suggested })
            }
            (SuggestionKind::Insertion, Some(_), _) => Err(invalid("insertion must not carry original text")),
            (SuggestionKind::Insertion, None, None) => Err(invalid("insertion requires suggested text")),
            (SuggestionKind::Deletion, Some(original), None) => {
                Ok(SuggestionContent::Deletion { original })
            }
            (SuggestionKind::Deletion, _, Some(_)) => Err(invalid("deletion must not carry suggested text")),
            (SuggestionKind::Deletion, None, None) => Err(invalid("deletion requires original text")),
            (SuggestionKind::Replacement, Some(original), Some(suggested)) => {
                Ok(SuggestionContent::Replacement { original, suggested })
            }
            (SuggestionKind::Replacement, None, _) => Err(invalid("replacement requires original text")),
            (SuggestionKind::Replacement, Some(_), None) => Err(invalid("replacement requires suggested text")),
        }
    }

    /// The kind implied by the variant.
    pub fn kind(&self) -> SuggestionKind {
        match self {
            SuggestionContent::Insertion { .. } => SuggestionKind::Insertion,
            SuggestionContent::Deletion { .. } => SuggestionKind::Deletion,
            SuggestionContent::Replacement { .. } => SuggestionKind::Replacement,
        }
    }

    /// Text being removed or replaced; `None` for insertions.
    pub fn original(&self) -> Option<&str> {
        match self {
            SuggestionContent::Insertion { .. } => None,
            SuggestionContent::Deletion { original } | SuggestionContent::Replacement { original, .. } => {
                Some(original)
            }
        }
    }

    /// Text being added; `None` for deletions.
    pub fn suggested(&self) -> Option<&str> {
        match self {
            SuggestionContent::Deletion { .. } => None,
            SuggestionContent::Insertion { suggested } | SuggestionContent::Replacement { suggested, .. } => {
                Some(suggested)
            }
        }
    }
}

/// Wire form of [`SuggestionContent`]: both fields optional, validated against
/// the sibling `type` field when a [`SuggestionRecord`] is converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentParts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<String>,
}

impl From<SuggestionContent> for ContentParts {
    fn from(content: SuggestionContent) -> Self {
        match content {
            SuggestionContent::Insertion { suggested } => ContentParts {
                original: None,
                suggested: Some(suggested),
            },
            SuggestionContent::Deletion { original } => ContentParts {
                original: Some(original),
                suggested: None,
            },
            SuggestionContent::Replacement { original, suggested } => ContentParts {
                original: Some(original),
                suggested: Some(suggested),
            },
        }
    }
}

/// An author snapshot: who wrote a suggestion or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One entry in a suggestion's discussion thread.
///
/// Comments are owned by their suggestion and have no lifecycle of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionComment {
    pub id: CommentId,
    pub author_id: String,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Input for proposing a new suggestion. The store assigns id, timestamps and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSuggestion {
    pub content: SuggestionContent,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
}

impl NewSuggestion {
    /// Starts a proposal with no avatar.
    pub fn new(content: SuggestionContent, author_id: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self {
            content,
            author_id: author_id.into(),
            author_name: author_name.into(),
            author_avatar: None,
        }
    }

    /// Attaches the author's avatar URL.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.author_avatar = Some(avatar.into());
        self
    }
}

/// Input for appending a comment to a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
}

impl NewComment {
    /// Starts a comment with no avatar.
    pub fn new(author_id: impl Into<String>, author_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            author_name: author_name.into(),
            author_avatar: None,
            content: content.into(),
        }
    }

    /// Attaches the commenter's avatar URL.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.author_avatar = Some(avatar.into());
        self
    }
}

/// A proposed edit to a document, awaiting accept/reject.
///
/// Fields are private: the only ways to change a suggestion are the store's
/// resolve and comment operations, which keep the lifecycle invariants intact.
/// Serializes through [`SuggestionRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SuggestionRecord", into = "SuggestionRecord")]
pub struct Suggestion {
    id: SuggestionId,
    content: SuggestionContent,
    author_id: String,
    author_name: String,
    author_avatar: Option<String>,
    state: SuggestionState,
    created_at: DateTime<Utc>,
    comments: Vec<SuggestionComment>,
}

impl Suggestion {
    pub(crate) fn propose(id: SuggestionId, draft: NewSuggestion, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content: draft.content,
            author_id: draft.author_id,
            author_name: draft.author_name,
            author_avatar: draft.author_avatar,
            state: SuggestionState::Pending,
            created_at,
            comments: Vec::new(),
        }
    }

    /// Stable identifier within the document.
    pub fn id(&self) -> &SuggestionId {
        &self.id
    }

    /// Insertion, deletion or replacement.
    pub fn kind(&self) -> SuggestionKind {
        self.content.kind()
    }

    /// The proposed edit.
    pub fn content(&self) -> &SuggestionContent {
        &self.content
    }

    /// Id of the proposing author.
    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    /// Display name captured when the suggestion was made.
    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    /// Avatar captured when the suggestion was made.
    pub fn author_avatar(&self) -> Option<&str> {
        self.author_avatar.as_deref()
    }

    /// The author fields bundled as an [`Author`] snapshot.
    pub fn author(&self) -> Author {
        Author {
            id: self.author_id.clone(),
            name: self.author_name.clone(),
            avatar: self.author_avatar.clone(),
        }
    }

    /// Lifecycle state including the resolution timestamp.
    pub fn state(&self) -> SuggestionState {
        self.state
    }

    /// Flat status without the timestamp.
    pub fn status(&self) -> SuggestionStatus {
        self.state.status()
    }

    /// True while no accept/reject has been applied.
    pub fn is_pending(&self) -> bool {
        self.status().is_pending()
    }

    /// When the suggestion was proposed. Never changes.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the suggestion was accepted or rejected; `None` while pending.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.state.resolved_at()
    }

    /// Comment thread in insertion order.
    pub fn comments(&self) -> &[SuggestionComment] {
        &self.comments
    }

    /// Moves a pending suggestion to its terminal state.
    ///
    /// The current state is checked at the moment of mutation: a suggestion
    /// that is no longer pending is left untouched.
    pub(crate) fn resolve(&mut self, resolution: Resolution, at: DateTime<Utc>) -> Result<(), SuggestionError> {
        if !self.is_pending() {
            return Err(SuggestionError::InvalidTransition {
                id: self.id.clone(),
                current: self.status(),
            });
        }
        self.state = match resolution {
            Resolution::Accept => SuggestionState::Accepted { at },
            Resolution::Reject => SuggestionState::Rejected { at },
        };
        Ok(())
    }

    pub(crate) fn push_comment(&mut self, comment: SuggestionComment) {
        self.comments.push(comment);
    }
}

/// Flat, serializable form of a [`Suggestion`].
///
/// This is the shape persistence and transport adapters exchange. Converting
/// a record into a [`Suggestion`] validates content against `type`,
/// `status` against `resolvedAt`, and the comment thread (non-blank content,
/// unique comment ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub id: SuggestionId,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    #[serde(default)]
    pub content: ContentParts,
    pub author_id: String,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<SuggestionComment>,
}

impl TryFrom<SuggestionRecord> for Suggestion {
    type Error = SuggestionError;

    fn try_from(record: SuggestionRecord) -> Result<Self, Self::Error> {
        let content = SuggestionContent::from_parts(record.kind, record.content.original, record.content.suggested)?;
        let state = SuggestionState::from_parts(record.status, record.resolved_at).ok_or_else(|| {
            SuggestionError::InconsistentResolution {
                id: record.id.clone(),
                status: record.status,
            }
        })?;
        {
            let mut comment_ids = HashSet::new();
            for comment in &record.comments {
                if comment.content.trim().is_empty() {
                    return Err(SuggestionError::InvalidComment { id: record.id.clone() });
                }
                if !comment_ids.insert(&comment.id) {
                    return Err(SuggestionError::DuplicateCommentId {
                        id: record.id.clone(),
                        comment_id: comment.id.clone(),
                    });
                }
            }
        }
        Ok(Suggestion {
            id: record.id,
            content,
            author_id: record.author_id,
            author_name: record.author_name,
            author_avatar: record.author_avatar,
            state,
            created_at: record.created_at,
            comments: record.comments,
        })
    }
}

impl From<Suggestion> for SuggestionRecord {
    fn from(suggestion: Suggestion) -> Self {
        SuggestionRecord {
            id: suggestion.id,
            kind: suggestion.content.kind(),
            content: suggestion.content.into(),
            author_id: suggestion.author_id,
            author_name: suggestion.author_name,
            author_avatar: suggestion.author_avatar,
            status: suggestion.state.status(),
            created_at: suggestion.created_at,
            resolved_at: suggestion.state.resolved_at(),
            comments: suggestion.comments,
        }
    }
}
