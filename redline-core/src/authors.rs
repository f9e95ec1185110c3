//! Distinct authors among a suggestion set, for populating an author filter.

use std::collections::HashSet;

use crate::types::{Author, Suggestion};

/// Authors in first-seen order.
///
/// The first suggestion from an author fixes that author's name and avatar;
/// later suggestions by the same `author_id` do not refresh the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorDirectory {
    entries: Vec<Author>,
}

impl AuthorDirectory {
    /// Builds the directory in one pass over `suggestions`.
    pub fn collect<'a>(suggestions: impl IntoIterator<Item = &'a Suggestion>) -> Self {
        let mut seen = HashSet::new();
        let entries = suggestions
            .into_iter()
            .filter(|s| seen.insert(s.author_id().to_owned()))
            .map(Suggestion::author)
            .collect();
        Self { entries }
    }

    /// Snapshot for `author_id`, if that author has any suggestion.
    pub fn get(&self, author_id: &str) -> Option<&Author> {
        self.entries.iter().find(|a| a.id == author_id)
    }

    /// Authors in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Author> {
        self.entries.iter()
    }

    /// Number of distinct authors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no suggestions to draw authors from.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the directory, keeping first-seen order.
    pub fn into_vec(self) -> Vec<Author> {
        self.entries
    }
}
