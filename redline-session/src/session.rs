//! Serialized access to one document's suggestion store.
//!
//! A [`DocumentSession`] moves a [`SuggestionStore`] into a dedicated tokio task.
//! Every operation is sent to that task over an unbounded MPSC channel and
//! answered over a oneshot, so commands on a document run strictly one at a
//! time. Two reviewers racing to accept and reject the same suggestion get
//! exactly one success; the loser receives `InvalidTransition`.
//!
//! Successful mutations are announced as [`SessionEvent`]s on a broadcast
//! channel. Sends to it never block: with no subscribers, or with a subscriber
//! that has fallen behind, events are dropped for that subscriber only.

use std::sync::Arc;

use redline_core::{
    AuthorDirectory, BulkOutcome, NewComment, NewSuggestion, Resolution, Suggestion, SuggestionComment,
    SuggestionCounts, SuggestionError, SuggestionId, SuggestionQuery, SuggestionStatus, SuggestionStore,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::config::RedlineConfig;
use crate::error::{Result, SessionError};

/// Change notifications emitted after each successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionEvent {
    /// A new suggestion was recorded.
    Proposed { id: SuggestionId },
    /// A single suggestion was accepted or rejected.
    Resolved { id: SuggestionId, status: SuggestionStatus },
    /// A comment was appended to a suggestion's thread.
    Commented {
        suggestion_id: SuggestionId,
        comment_id: redline_core::CommentId,
    },
    /// An accept-all / reject-all finished.
    BulkResolved {
        status: SuggestionStatus,
        resolved: usize,
        failed: usize,
    },
}

enum Command {
    Propose {
        draft: NewSuggestion,
        reply: oneshot::Sender<Suggestion>,
    },
    Resolve {
        id: SuggestionId,
        resolution: Resolution,
        reply: oneshot::Sender<std::result::Result<Suggestion, SuggestionError>>,
    },
    ResolveAll {
        resolution: Resolution,
        reply: oneshot::Sender<BulkOutcome>,
    },
    Comment {
        id: SuggestionId,
        comment: NewComment,
        reply: oneshot::Sender<std::result::Result<SuggestionComment, SuggestionError>>,
    },
    Get {
        id: SuggestionId,
        reply: oneshot::Sender<Option<Suggestion>>,
    },
    Query {
        query: SuggestionQuery,
        reply: oneshot::Sender<Vec<Suggestion>>,
    },
    Counts {
        reply: oneshot::Sender<SuggestionCounts>,
    },
    Authors {
        reply: oneshot::Sender<AuthorDirectory>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<Suggestion>>,
    },
    Shutdown {
        reply: oneshot::Sender<SuggestionStore>,
    },
}

/// Spawns session tasks.
pub struct DocumentSession;

impl DocumentSession {
    /// Moves `store` into a new tokio task and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime. The task ends when every
    /// handle has been dropped or [`SessionHandle::shutdown`] is called.
    pub fn spawn(store: SuggestionStore, event_capacity: usize) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let document_id: Arc<str> = Arc::from(store.document_id());
        let default_query = SuggestionQuery::new();

        debug!(document = %document_id, "session started");
        tokio::spawn(run(store, rx, events.clone()));

        SessionHandle {
            tx,
            events,
            document_id,
            default_query,
        }
    }

    /// Opens a session for `document_id` using the comment policy, default
    /// sort and event capacity from `config`, seeded with `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Suggestion`] if `initial` contains duplicate ids.
    pub fn open(
        document_id: impl Into<String>,
        initial: impl IntoIterator<Item = Suggestion>,
        config: &RedlineConfig,
    ) -> Result<SessionHandle> {
        let mut store = SuggestionStore::new(document_id).with_policy(config.comments);
        store.load(initial)?;
        let mut handle = Self::spawn(store, config.event_capacity);
        handle.default_query = config.default_query();
        Ok(handle)
    }
}

async fn run(
    mut store: SuggestionStore,
    mut rx: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<SessionEvent>,
) {
    // Reply send errors mean the caller stopped waiting; the mutation stands.
    while let Some(command) = rx.recv().await {
        match command {
            Command::Propose { draft, reply } => {
                let suggestion = store.propose(draft);
                let _ = events.send(SessionEvent::Proposed {
                    id: suggestion.id().clone(),
                });
                let _ = reply.send(suggestion);
            }
            Command::Resolve { id, resolution, reply } => {
                let result = store.resolve(&id, resolution);
                if let Ok(resolved) = &result {
                    let _ = events.send(SessionEvent::Resolved {
                        id,
                        status: resolved.status(),
                    });
                }
                let _ = reply.send(result);
            }
            Command::ResolveAll { resolution, reply } => {
                let outcome = store.resolve_all(resolution);
                let _ = events.send(SessionEvent::BulkResolved {
                    status: resolution.status(),
                    resolved: outcome.resolved.len(),
                    failed: outcome.failed.len(),
                });
                let _ = reply.send(outcome);
            }
            Command::Comment { id, comment, reply } => {
                let result = store.add_comment(&id, comment);
                if let Ok(comment) = &result {
                    let _ = events.send(SessionEvent::Commented {
                        suggestion_id: id,
                        comment_id: comment.id.clone(),
                    });
                }
                let _ = reply.send(result);
            }
            Command::Get { id, reply } => {
                let _ = reply.send(store.get(&id));
            }
            Command::Query { query, reply } => {
                let _ = reply.send(store.query(&query));
            }
            Command::Counts { reply } => {
                let _ = reply.send(store.counts());
            }
            Command::Authors { reply } => {
                let _ = reply.send(store.authors());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(store.snapshot());
            }
            Command::Shutdown { reply } => {
                debug!(document = %store.document_id(), "session shut down");
                let _ = reply.send(store);
                return;
            }
        }
    }
    debug!(document = %store.document_id(), "all session handles dropped");
}

/// Cloneable handle to a running document session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SessionEvent>,
    document_id: Arc<str>,
    default_query: SuggestionQuery,
}

impl SessionHandle {
    /// The document this session serves.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Receives every [`SessionEvent`] emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The unfiltered query in the session's configured sort order.
    pub fn default_query(&self) -> SuggestionQuery {
        self.default_query.clone()
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx.send(command(reply)).map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }

    /// Records a new pending suggestion. See [`SuggestionStore::propose`].
    pub async fn propose(&self, draft: NewSuggestion) -> Result<Suggestion> {
        self.call(|reply| Command::Propose { draft, reply }).await
    }

    /// Accepts a pending suggestion. See [`SuggestionStore::accept`].
    pub async fn accept(&self, id: &SuggestionId) -> Result<Suggestion> {
        self.resolve(id, Resolution::Accept).await
    }

    /// Rejects a pending suggestion. See [`SuggestionStore::reject`].
    pub async fn reject(&self, id: &SuggestionId) -> Result<Suggestion> {
        self.resolve(id, Resolution::Reject).await
    }

    async fn resolve(&self, id: &SuggestionId, resolution: Resolution) -> Result<Suggestion> {
        let id = id.clone();
        Ok(self
            .call(|reply| Command::Resolve { id, resolution, reply })
            .await??)
    }

    /// Accepts every pending suggestion. See [`SuggestionStore::accept_all`].
    pub async fn accept_all(&self) -> Result<BulkOutcome> {
        self.call(|reply| Command::ResolveAll {
            resolution: Resolution::Accept,
            reply,
        })
        .await
    }

    /// Rejects every pending suggestion. See [`SuggestionStore::reject_all`].
    pub async fn reject_all(&self) -> Result<BulkOutcome> {
        self.call(|reply| Command::ResolveAll {
            resolution: Resolution::Reject,
            reply,
        })
        .await
    }

    /// Appends a comment. See [`SuggestionStore::add_comment`].
    pub async fn add_comment(&self, id: &SuggestionId, comment: NewComment) -> Result<SuggestionComment> {
        let id = id.clone();
        Ok(self.call(|reply| Command::Comment { id, comment, reply }).await??)
    }

    /// A copy of one suggestion, if it exists.
    pub async fn get(&self, id: &SuggestionId) -> Result<Option<Suggestion>> {
        let id = id.clone();
        self.call(|reply| Command::Get { id, reply }).await
    }

    /// Filtered, sorted copies of the session's suggestions.
    pub async fn query(&self, query: SuggestionQuery) -> Result<Vec<Suggestion>> {
        self.call(|reply| Command::Query { query, reply }).await
    }

    /// Current status tallies.
    pub async fn counts(&self) -> Result<SuggestionCounts> {
        self.call(|reply| Command::Counts { reply }).await
    }

    /// Distinct authors in first-seen order.
    pub async fn authors(&self) -> Result<AuthorDirectory> {
        self.call(|reply| Command::Authors { reply }).await
    }

    /// Copies of every suggestion in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<Suggestion>> {
        self.call(|reply| Command::Snapshot { reply }).await
    }

    /// Stops the session and hands back its store, e.g. for persisting.
    ///
    /// Commands already queued ahead of the shutdown still run. Any handle
    /// used afterwards gets [`SessionError::Closed`].
    pub async fn shutdown(&self) -> Result<SuggestionStore> {
        self.call(|reply| Command::Shutdown { reply }).await
    }
}
