//! Shared fixtures for redline-core integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use redline_core::{
    Clock, CommentId, ContentParts, IdGenerator, Suggestion, SuggestionId, SuggestionKind, SuggestionRecord,
    SuggestionStatus,
};

/// A clock that starts at a fixed instant and advances one second per reading.
pub struct SteppingClock {
    next: AtomicI64,
}

impl SteppingClock {
    pub fn starting_at(secs: i64) -> Self {
        Self {
            next: AtomicI64::new(secs),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        ts(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Numbered ids (`s1`, `c2`, ...) drawn from one shared counter.
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl SequentialIds {
    fn bump(&self) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl IdGenerator for SequentialIds {
    fn suggestion_id(&self) -> SuggestionId {
        SuggestionId::new(format!("s{}", self.bump()))
    }

    fn comment_id(&self) -> CommentId {
        CommentId::new(format!("c{}", self.bump()))
    }
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Builds a pending record with content matching `kind`.
pub fn record(id: &str, kind: SuggestionKind, author_id: &str, author_name: &str, created: i64) -> SuggestionRecord {
    let content = match kind {
        SuggestionKind::Insertion => ContentParts {
            original: None,
            suggested: Some(format!("inserted by {id}")),
        },
        SuggestionKind::Deletion => ContentParts {
            original: Some(format!("deleted by {id}")),
            suggested: None,
        },
        SuggestionKind::Replacement => ContentParts {
            original: Some(format!("old text {id}")),
            suggested: Some(format!("new text {id}")),
        },
    };
    SuggestionRecord {
        id: SuggestionId::new(id),
        kind,
        content,
        author_id: author_id.to_owned(),
        author_name: author_name.to_owned(),
        author_avatar: None,
        status: SuggestionStatus::Pending,
        created_at: ts(created),
        resolved_at: None,
        comments: Vec::new(),
    }
}

pub fn resolved(mut record: SuggestionRecord, status: SuggestionStatus, at: i64) -> SuggestionRecord {
    record.status = status;
    record.resolved_at = Some(ts(at));
    record
}

pub fn suggestion(record: SuggestionRecord) -> Suggestion {
    Suggestion::try_from(record).unwrap()
}

pub fn ids(suggestions: &[Suggestion]) -> Vec<&str> {
    suggestions.iter().map(|s| s.id().as_str()).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("redline_core=debug")
        .with_test_writer()
        .try_init();
}
