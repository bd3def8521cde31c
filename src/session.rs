//! Conversation session store
//!
//! In-memory session state keyed by UUID. Each session is wrapped in its own
//! async mutex, held by the orchestrator for the full duration of a turn so
//! concurrent turns on the same session serialise while different sessions
//! proceed in parallel. Sessions idle past the timeout are evicted lazily on
//! the next lookup.

use crate::itinerary::Itinerary;
use crate::providers::Message;
use crate::retrieval::Citation;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

/// State carried across the turns of one conversation
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier
    pub id: String,
    /// Full conversation history
    pub history: Vec<Message>,
    /// Current itinerary, if one has been built
    pub itinerary: Option<Itinerary>,
    /// Citations accumulated across turns, deduplicated by URL
    pub sources: Vec<Citation>,
    /// Last time a turn touched this session
    pub last_activity: DateTime<Utc>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            history: Vec::new(),
            itinerary: None,
            sources: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    /// Appends citations not already present, comparing by URL
    ///
    /// A citation for an already-known URL contributes only its associated
    /// activity names, unioned into the existing entry.
    pub fn merge_sources(&mut self, citations: &[Citation]) {
        for citation in citations {
            if let Some(existing) = self.sources.iter_mut().find(|c| c.url == citation.url) {
                for name in &citation.activities {
                    if !existing.activities.contains(name) {
                        existing.activities.push(name.clone());
                    }
                }
            } else {
                self.sources.push(citation.clone());
            }
        }
    }
}

/// Read-only view of a session, for the snapshot endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Session identifier
    pub session_id: String,
    /// Current itinerary, if any
    pub itinerary: Option<Itinerary>,
    /// Accumulated citations
    pub sources: Vec<Citation>,
    /// Number of messages in the history
    pub message_count: usize,
}

/// In-memory store of live sessions
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// Creates a store evicting sessions idle longer than `idle_timeout_minutes`
    pub fn new(idle_timeout_minutes: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: Duration::minutes(idle_timeout_minutes as i64),
        }
    }

    /// Resolves an existing session or creates a new one
    ///
    /// An unknown or expired id silently yields a fresh session, so clients
    /// recover from evictions by starting over rather than erroring. Every
    /// resolve doubles as a housekeeping pass: all sessions idle past the
    /// timeout are evicted, not just the one being looked up, so abandoned
    /// conversations do not accumulate. Returns the session handle and its
    /// id.
    pub fn resolve_or_create(&self, session_id: Option<&str>) -> (Arc<Mutex<Session>>, String) {
        let mut sessions = self.sessions.write().expect("session map lock poisoned");

        let evicted = self.sweep_locked(&mut sessions);
        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle sessions");
        }

        if let Some(id) = session_id {
            if let Some(handle) = sessions.get(id) {
                return (handle.clone(), id.to_string());
            }
        }

        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(Session::new(id.clone())));
        sessions.insert(id.clone(), handle.clone());
        tracing::info!(session_id = %id, "Created session");
        (handle, id)
    }

    /// Returns a read-only snapshot of a session, or `None` for unknown ids
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let handle = {
            let sessions = self.sessions.read().expect("session map lock poisoned");
            sessions.get(session_id).cloned()
        }?;

        let session = handle.lock().await;
        Some(SessionSnapshot {
            session_id: session.id.clone(),
            itinerary: session.itinerary.clone(),
            sources: session.sources.clone(),
            message_count: session.history.len(),
        })
    }

    /// Removes a session outright
    pub fn reset(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .expect("session map lock poisoned")
            .remove(session_id)
            .is_some()
    }

    /// Removes every session idle past the timeout, returning the count
    ///
    /// Runs automatically on every resolve; exposed for explicit
    /// housekeeping sweeps.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.sessions.write().expect("session map lock poisoned");
        self.sweep_locked(&mut sessions)
    }

    fn sweep_locked(&self, sessions: &mut HashMap<String, Arc<Mutex<Session>>>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            // A locked session has a turn in flight and is clearly not idle
            Err(_) => true,
            Ok(session) => !self.is_expired(&session),
        });
        before - sessions.len()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().expect("session map lock poisoned").len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, session: &Session) -> bool {
        Utc::now().signed_duration_since(session.last_activity) > self.idle_timeout
    }
}
