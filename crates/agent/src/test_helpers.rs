//! Shared collaborator stubs for agent tests.

use async_trait::async_trait;
use pathwise_core::catalog::{Branch, CatalogReader, CatalogSnapshot, College};
use pathwise_core::error::{CatalogError, ProviderError, StorageError};
use pathwise_core::message::Message;
use pathwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use pathwise_core::session::{ConversationTurn, SessionId, SessionLog};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A provider that replays scripted outcomes in order and records requests.
///
/// Panics if called more times than it has outcomes.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answers(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// The prompt text of every request so far.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.messages[0].content.clone())
            .collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more outcomes");
        outcome.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A catalog that counts reads and can be switched to fail.
pub struct CountingCatalog {
    snapshot: Option<CatalogSnapshot>,
    reads: AtomicUsize,
}

impl CountingCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            snapshot: None,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogReader for CountingCatalog {
    fn name(&self) -> &str {
        "counting"
    }

    async fn list_colleges(&self) -> Result<Vec<College>, CatalogError> {
        Ok(self.snapshot().await?.colleges)
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, CatalogError> {
        Ok(self.snapshot().await?.branches)
    }

    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or_else(|| CatalogError::Unavailable("connection refused".into()))
    }
}

/// A session log whose appends always fail and whose reads return nothing.
#[derive(Default)]
pub struct BrokenLog {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl SessionLog for BrokenLog {
    fn name(&self) -> &str {
        "broken"
    }

    async fn append(
        &self,
        _session_id: &SessionId,
        _user_input: &str,
        _bot_response: &str,
    ) -> Result<ConversationTurn, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::QueryFailed("disk full".into()))
    }

    async fn history(&self, _session_id: &SessionId) -> Result<Vec<ConversationTurn>, StorageError> {
        Err(StorageError::QueryFailed("disk full".into()))
    }
}
