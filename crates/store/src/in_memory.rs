//! In-memory store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use pathwise_core::catalog::{Branch, CatalogReader, CatalogSnapshot, CatalogWriter, College};
use pathwise_core::error::{CatalogError, StorageError};
use pathwise_core::session::{ConversationTurn, SessionId, SessionLog};
use tokio::sync::RwLock;

/// Keeps the catalog and all chat turns in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    catalog: RwLock<CatalogSnapshot>,
    turns: RwLock<Vec<ConversationTurn>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a catalog.
    pub fn with_catalog(snapshot: CatalogSnapshot) -> Self {
        Self {
            catalog: RwLock::new(snapshot),
            turns: RwLock::new(Vec::new()),
        }
    }

    /// Total number of stored turns across all sessions.
    pub async fn turn_count(&self) -> usize {
        self.turns.read().await.len()
    }
}

#[async_trait]
impl CatalogReader for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_colleges(&self) -> Result<Vec<College>, CatalogError> {
        Ok(self.catalog.read().await.colleges.clone())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, CatalogError> {
        Ok(self.catalog.read().await.branches.clone())
    }

    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        Ok(self.catalog.read().await.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl CatalogWriter for InMemoryStore {
    async fn replace_catalog(&self, snapshot: CatalogSnapshot) -> Result<(), StorageError> {
        *self.catalog.write().await = snapshot;
        Ok(())
    }
}

#[async_trait]
impl SessionLog for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(
        &self,
        session_id: &SessionId,
        user_input: &str,
        bot_response: &str,
    ) -> Result<ConversationTurn, StorageError> {
        let mut turns = self.turns.write().await;

        let now = Utc::now();
        let timestamp = turns
            .iter()
            .rev()
            .find(|t| &t.session_id == session_id)
            .map_or(now, |last| last.timestamp.max(now));

        let turn = ConversationTurn {
            session_id: session_id.clone(),
            user_input: user_input.to_string(),
            bot_response: bot_response.to_string(),
            timestamp,
        };
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn history(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, StorageError> {
        let turns = self.turns.read().await;
        Ok(turns
            .iter()
            .filter(|t| &t.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn append_and_replay_in_order() {
        let store = InMemoryStore::new();
        let sid = SessionId::from("s1");
        store.append(&sid, "first", "one").await.unwrap();
        store.append(&sid, "second", "two").await.unwrap();
        let last = store.append(&sid, "third", "three").await.unwrap();

        let history = store.history(&sid).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].user_input, "first");
        assert_eq!(history.last().unwrap(), &last);
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn unknown_session_has_empty_history() {
        let store = InMemoryStore::new();
        store.append(&SessionId::from("a"), "q", "r").await.unwrap();
        let history = store.history(&SessionId::from("zzz")).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn concurrent_sessions_do_not_interleave() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for session in ["alpha", "beta"] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let sid = SessionId::from(session);
                for i in 0..20 {
                    store
                        .append(&sid, &format!("{session}-{i}"), "ok")
                        .await
                        .unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        for session in ["alpha", "beta"] {
            let history = store.history(&SessionId::from(session)).await.unwrap();
            assert_eq!(history.len(), 20);
            for (i, turn) in history.iter().enumerate() {
                assert_eq!(turn.user_input, format!("{session}-{i}"));
            }
        }
        assert_eq!(store.turn_count().await, 40);
    }

    #[tokio::test]
    async fn replace_catalog_swaps_everything() {
        let college = College::new("IIT Delhi", "New Delhi");
        let branch = Branch::new("Civil Engineering", &college.id, "Structures");
        let store = InMemoryStore::with_catalog(CatalogSnapshot::new(
            vec![College::new("Old College", "Nowhere")],
            vec![],
        ));

        store
            .replace_catalog(CatalogSnapshot::new(vec![college.clone()], vec![branch.clone()]))
            .await
            .unwrap();

        assert_eq!(store.list_colleges().await.unwrap(), vec![college]);
        assert_eq!(
            store.get_branch(&branch.id).await.unwrap().map(|b| b.name),
            Some("Civil Engineering".to_string())
        );
    }
}
