//! Session log: durable, append-only record of chat turns.
//!
//! A turn is written exactly once, after the model has produced an answer.
//! Turns are never updated or deleted here; retention is the store's concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Caller-chosen opaque session identifier.
///
/// Neither format nor uniqueness is validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One user query paired with one assistant response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub session_id: SessionId,
    pub user_input: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
}

/// The core SessionLog trait.
///
/// Implementations: SQLite, in-memory (for testing and ephemeral runs).
#[async_trait]
pub trait SessionLog: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append a turn. The store assigns the timestamp, never earlier than the
    /// latest turn already stored for the same session.
    async fn append(
        &self,
        session_id: &SessionId,
        user_input: &str,
        bot_response: &str,
    ) -> Result<ConversationTurn, StorageError>;

    /// All turns of a session, oldest first. Unknown sessions yield an empty list.
    async fn history(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, StorageError>;
}
