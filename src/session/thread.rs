//! Conversation thread and session storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::artifact::Artifact;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation. Never modified after it is appended.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// State of one interactive session: the conversation and the current game.
///
/// Turns can only be appended; the artifact can only be replaced by another
/// accepted document.
#[derive(Debug)]
pub struct GameSession {
    id: String,
    model: String,
    conversation: Vec<Turn>,
    artifact: Artifact,
}

impl GameSession {
    /// Create an empty session using `model` for its completions.
    #[must_use]
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            conversation: Vec::new(),
            artifact: Artifact::empty(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Model used for the next submission.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.conversation
    }

    #[must_use]
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Add a user message to the conversation.
    pub fn add_user_turn(&mut self, content: impl Into<String>) {
        self.push(Role::User, content.into());
    }

    /// Add an assistant message to the conversation.
    pub fn add_assistant_turn(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content.into());
    }

    /// Replace the current game with a newly accepted one.
    pub fn replace_artifact(&mut self, artifact: Artifact) {
        self.artifact = artifact;
    }

    fn push(&mut self, role: Role, content: String) {
        self.conversation.push(Turn {
            role,
            content,
            created_at: Utc::now(),
        });
    }
}

/// Shared handle to a session.
///
/// The async mutex is held for a whole submission, so a session processes
/// one request at a time.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a new session with a random id.
    #[must_use]
    pub fn create(&self, model: &str) -> (String, SharedSession) {
        let id = Uuid::new_v4().to_string();
        let session = self.insert(GameSession::new(id.clone(), model));
        (id, session)
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SharedSession> {
        let guard = self
            .inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(id).map(Arc::clone)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, session: GameSession) -> SharedSession {
        let id = session.id().to_string();
        let shared = Arc::new(Mutex::new(session));
        let mut guard = self
            .inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(id, Arc::clone(&shared));
        shared
    }
}
