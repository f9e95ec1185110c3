//! Read-only views over a suggestion set: filtering, sorting and tallies.
//!
//! Nothing here mutates its input. Views are owned copies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::{Suggestion, SuggestionKind, SuggestionStatus};

/// Status filter for a suggestion list. `All` passes everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Accepted,
    Rejected,
}

impl StatusFilter {
    /// True if `status` passes this filter.
    pub fn matches(self, status: SuggestionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == SuggestionStatus::Pending,
            StatusFilter::Accepted => status == SuggestionStatus::Accepted,
            StatusFilter::Rejected => status == SuggestionStatus::Rejected,
        }
    }
}

impl From<SuggestionStatus> for StatusFilter {
    fn from(status: SuggestionStatus) -> Self {
        match status {
            SuggestionStatus::Pending => StatusFilter::Pending,
            SuggestionStatus::Accepted => StatusFilter::Accepted,
            SuggestionStatus::Rejected => StatusFilter::Rejected,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            other => SuggestionStatus::from_str(other)
                .map(StatusFilter::from)
                .map_err(|_| ParseError::new("status filter", other)),
        }
    }
}

/// Ordering of a suggestion list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// By type name: deletion, insertion, replacement.
    Type,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Type => "type",
        })
    }
}

impl FromStr for SortOrder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "type" => Ok(SortOrder::Type),
            other => Err(ParseError::new("sort order", other)),
        }
    }
}

/// A composable filter + sort over suggestions.
///
/// Filters combine with AND. Sorting runs after filtering and is stable, so
/// suggestions with equal keys keep their incoming relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionQuery {
    status: StatusFilter,
    author: Option<String>,
    search: Option<String>,
    sort: SortOrder,
}

impl SuggestionQuery {
    /// An unfiltered query sorted newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one status, or `All`.
    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Restricts to suggestions whose `author_id` equals `author_id` exactly.
    pub fn author(mut self, author_id: impl Into<String>) -> Self {
        self.author = Some(author_id.into());
        self
    }

    /// Case-insensitive substring search over original text, suggested text
    /// and author name. A blank query disables the search filter.
    pub fn search(mut self, text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        self.search = if text.trim().is_empty() {
            None
        } else {
            Some(text.to_lowercase())
        };
        self
    }

    /// Sets the ordering applied after filtering.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// True if `suggestion` passes every configured filter.
    pub fn matches(&self, suggestion: &Suggestion) -> bool {
        if !self.status.matches(suggestion.status()) {
            return false;
        }
        if let Some(author) = &self.author {
            if suggestion.author_id() != author {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let content = suggestion.content();
            let hit = [content.original(), content.suggested(), Some(suggestion.author_name())]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Returns owned copies of the matching suggestions in the requested order.
    pub fn apply(&self, suggestions: &[Suggestion]) -> Vec<Suggestion> {
        let mut view: Vec<Suggestion> = suggestions.iter().filter(|s| self.matches(s)).cloned().collect();
        // `sort_by` is stable.
        match self.sort {
            SortOrder::Newest => view.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            SortOrder::Oldest => view.sort_by(|a, b| a.created_at().cmp(&b.created_at())),
            SortOrder::Type => view.sort_by(|a, b| a.kind().cmp(&b.kind())),
        }
        view
    }
}

/// Pending suggestions broken down by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub insertion: usize,
    pub deletion: usize,
    pub replacement: usize,
}

impl KindCounts {
    /// Pending count for `kind`.
    pub fn get(&self, kind: SuggestionKind) -> usize {
        match kind {
            SuggestionKind::Insertion => self.insertion,
            SuggestionKind::Deletion => self.deletion,
            SuggestionKind::Replacement => self.replacement,
        }
    }
}

/// Summary counts for a suggestion set, recomputed from scratch on each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionCounts {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending_by_kind: KindCounts,
}

impl SuggestionCounts {
    /// Counts `suggestions` in a single pass.
    pub fn tally(suggestions: &[Suggestion]) -> Self {
        suggestions.iter().fold(Self::default(), |mut counts, s| {
            counts.total += 1;
            match s.status() {
                SuggestionStatus::Pending => {
                    counts.pending += 1;
                    match s.kind() {
                        SuggestionKind::Insertion => counts.pending_by_kind.insertion += 1,
                        SuggestionKind::Deletion => counts.pending_by_kind.deletion += 1,
                        SuggestionKind::Replacement => counts.pending_by_kind.replacement += 1,
                    }
                }
                SuggestionStatus::Accepted => counts.accepted += 1,
                SuggestionStatus::Rejected => counts.rejected += 1,
            }
            counts
        })
    }
}
