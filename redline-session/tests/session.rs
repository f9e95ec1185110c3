//! Integration tests for serialized document sessions.
//!
//! Exercises: DocumentSession::spawn/open, single and bulk resolution,
//! comments, queries, change events and shutdown.

use chrono::Utc;
use redline_core::{
    CommentPolicy, NewComment, NewSuggestion, SortOrder, StatusFilter, Suggestion, SuggestionContent,
    SuggestionError, SuggestionId, SuggestionKind, SuggestionQuery, SuggestionRecord, SuggestionStatus,
    SuggestionStore,
};
use redline_session::{DocumentSession, RedlineConfig, SessionError, SessionEvent};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("redline_session=debug,redline_core=debug")
        .with_test_writer()
        .try_init();
}

fn insertion(text: &str, author_id: &str, author_name: &str) -> NewSuggestion {
    NewSuggestion::new(SuggestionContent::insertion(text), author_id, author_name)
}

fn accepted_record(id: &str) -> Suggestion {
    let now = Utc::now();
    Suggestion::try_from(SuggestionRecord {
        id: SuggestionId::new(id),
        kind: SuggestionKind::Deletion,
        content: redline_core::ContentParts {
            original: Some("old".to_owned()),
            suggested: None,
        },
        author_id: "u2".to_owned(),
        author_name: "Bob".to_owned(),
        author_avatar: None,
        status: SuggestionStatus::Accepted,
        created_at: now,
        resolved_at: Some(now),
        comments: Vec::new(),
    })
    .unwrap()
}

#[tokio::test]
async fn full_review_lifecycle() {
    init_tracing();
    let session = DocumentSession::spawn(SuggestionStore::new("doc-1"), 16);
    let mut events = session.subscribe();
    assert_eq!(session.document_id(), "doc-1");

    let first = session.propose(insertion("Hello", "u1", "Alice")).await.unwrap();
    let second = session.propose(insertion("World", "u2", "Bob")).await.unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Proposed { id: first.id().clone() }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Proposed { id: second.id().clone() }
    );

    let comment = session
        .add_comment(first.id(), NewComment::new("u2", "Bob", "Looks good"))
        .await
        .unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Commented {
            suggestion_id: first.id().clone(),
            comment_id: comment.id.clone(),
        }
    );

    let accepted = session.accept(first.id()).await.unwrap();
    assert_eq!(accepted.status(), SuggestionStatus::Accepted);
    assert_eq!(accepted.comments().len(), 1, "comment thread survives resolution");
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Resolved {
            id: first.id().clone(),
            status: SuggestionStatus::Accepted,
        }
    );

    let pending = session
        .query(SuggestionQuery::new().status(StatusFilter::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id(), second.id());

    let counts = session.counts().await.unwrap();
    assert_eq!((counts.total, counts.pending, counts.accepted), (2, 1, 1));

    let authors = session.authors().await.unwrap();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors.get("u2").unwrap().name, "Bob");
}

#[tokio::test]
async fn double_accept_reports_invalid_transition() {
    let session = DocumentSession::spawn(SuggestionStore::new("doc"), 16);
    let s = session.propose(insertion("x", "u1", "Alice")).await.unwrap();

    session.accept(s.id()).await.unwrap();
    match session.accept(s.id()).await {
        Err(SessionError::Suggestion(SuggestionError::InvalidTransition { current, .. })) => {
            assert_eq!(current, SuggestionStatus::Accepted)
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_accept_and_reject_have_one_winner() {
    init_tracing();
    let session = DocumentSession::spawn(SuggestionStore::new("doc"), 16);

    for _ in 0..20 {
        let s = session.propose(insertion("race", "u1", "Alice")).await.unwrap();
        let (a, b) = (session.clone(), session.clone());
        let (id_a, id_b) = (s.id().clone(), s.id().clone());

        let accept = tokio::spawn(async move { a.accept(&id_a).await });
        let reject = tokio::spawn(async move { b.reject(&id_b).await });
        let results = [accept.await.unwrap(), reject.await.unwrap()];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one of accept/reject may succeed");
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(
            matches!(
                loser,
                SessionError::Suggestion(SuggestionError::InvalidTransition { .. })
            ),
            "the loser sees InvalidTransition, got {loser:?}"
        );

        let stored = session.get(s.id()).await.unwrap().unwrap();
        let winner = results.iter().find_map(|r| r.as_ref().ok()).unwrap();
        assert_eq!(stored.status(), winner.status(), "store reflects the winning transition");
    }
}

#[tokio::test]
async fn accept_all_reports_partial_set() {
    let session = DocumentSession::open("doc", [accepted_record("B")], &RedlineConfig::default()).unwrap();
    let a = session.propose(insertion("a", "u1", "Alice")).await.unwrap();
    let c = session.propose(insertion("c", "u1", "Alice")).await.unwrap();
    let mut events = session.subscribe();

    let outcome = session.accept_all().await.unwrap();
    assert_eq!(outcome.resolved, vec![a.id().clone(), c.id().clone()]);
    assert!(outcome.failed.is_empty());
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::BulkResolved {
            status: SuggestionStatus::Accepted,
            resolved: 2,
            failed: 0,
        }
    );

    let all = session.snapshot().await.unwrap();
    assert!(all.iter().all(|s| s.status() == SuggestionStatus::Accepted));

    let again = session.reject_all().await.unwrap();
    assert!(again.resolved.is_empty(), "nothing pending remains");
}

#[tokio::test]
async fn open_applies_config() {
    let config = RedlineConfig {
        comments: CommentPolicy::PendingOnly,
        default_sort: SortOrder::Oldest,
        event_capacity: 4,
    };
    let session = DocumentSession::open("doc", [accepted_record("B")], &config).unwrap();

    let err = session
        .add_comment(&SuggestionId::new("B"), NewComment::new("u1", "Alice", "late"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SessionError::Suggestion(SuggestionError::CommentsClosed { .. })),
        "pending-only policy closes resolved threads, got {err:?}"
    );

    let newer = session.propose(insertion("new", "u1", "Alice")).await.unwrap();
    let view = session.query(session.default_query()).await.unwrap();
    let order: Vec<&SuggestionId> = view.iter().map(Suggestion::id).collect();
    assert_eq!(order, [&SuggestionId::new("B"), newer.id()], "configured sort is oldest first");
}

#[tokio::test]
async fn open_rejects_duplicate_seed_ids() {
    let err = DocumentSession::open(
        "doc",
        [accepted_record("B"), accepted_record("B")],
        &RedlineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Suggestion(SuggestionError::DuplicateId { .. })
    ));
}

#[tokio::test]
async fn errors_pass_through_unchanged() {
    let session = DocumentSession::spawn(SuggestionStore::new("doc"), 16);
    let s = session.propose(insertion("x", "u1", "Alice")).await.unwrap();

    let blank = session
        .add_comment(s.id(), NewComment::new("u1", "Alice", "  "))
        .await
        .unwrap_err();
    assert!(matches!(
        blank,
        SessionError::Suggestion(SuggestionError::InvalidComment { .. })
    ));

    let missing = session.reject(&SuggestionId::new("nope")).await.unwrap_err();
    assert!(matches!(
        missing,
        SessionError::Suggestion(SuggestionError::NotFound { .. })
    ));
    assert_eq!(session.get(&SuggestionId::new("nope")).await.unwrap(), None);
}

#[tokio::test]
async fn shutdown_returns_store_and_closes_handles() {
    let session = DocumentSession::spawn(SuggestionStore::new("doc"), 16);
    let other = session.clone();
    session.propose(insertion("keep me", "u1", "Alice")).await.unwrap();

    let store = session.shutdown().await.unwrap();
    assert_eq!(store.len(), 1, "queued work is applied before shutdown");
    assert_eq!(store.document_id(), "doc");

    let err = other.counts().await.unwrap_err();
    assert!(matches!(err, SessionError::Closed), "got {err:?}");
}
