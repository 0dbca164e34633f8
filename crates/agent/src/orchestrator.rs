//! Turn orchestration.
//!
//! Each incoming message runs through a fixed sequence of states:
//!
//! ```text
//! Received → CatalogLoaded → Matched → PromptAssembled → CompletionPending → Logged
//!                  │                                             │
//!                  └──────────────────── Failed ◄────────────────┘
//! ```
//!
//! Validation happens before `Received` and touches no collaborator. A turn
//! is written to the session log only after a successful completion.

use crate::assembler::assemble;
use crate::cache::CachedCatalog;
use crate::invoker::CompletionInvoker;
use crate::matcher::match_entities;
use pathwise_config::{AppConfig, LogFailurePolicy};
use pathwise_core::catalog::CatalogReader;
use pathwise_core::error::{CatalogError, CompletionError, StorageError, ValidationError};
use pathwise_core::provider::Provider;
use pathwise_core::session::{ConversationTurn, SessionId, SessionLog};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Where a turn is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Received,
    CatalogLoaded,
    Matched,
    PromptAssembled,
    CompletionPending,
    Logged,
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::CatalogLoaded => "catalog_loaded",
            Self::Matched => "matched",
            Self::PromptAssembled => "prompt_assembled",
            Self::CompletionPending => "completion_pending",
            Self::Logged => "logged",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One incoming chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }

    fn validate(&self) -> Result<SessionId, ValidationError> {
        if self.message.trim().is_empty() {
            return Err(ValidationError::MissingMessage);
        }
        if self.session_id.trim().is_empty() {
            return Err(ValidationError::MissingSessionId);
        }
        Ok(SessionId::new(self.session_id.clone()))
    }
}

/// The answer to a successful turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub message: String,
    /// False when the answer was delivered but could not be logged.
    pub persisted: bool,
}

/// Why a turn failed. Every failure is terminal for the turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(CatalogError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Failed to persist turn: {0}")]
    Storage(#[from] StorageError),
}

impl TurnError {
    /// The state the turn was in when it failed.
    ///
    /// A failed append leaves the turn in `CompletionPending`; it never
    /// reaches `Logged`.
    pub fn stage(&self) -> TurnState {
        match self {
            Self::Validation(_) => TurnState::Received,
            Self::CatalogUnavailable(_) => TurnState::CatalogLoaded,
            Self::Completion(_) | Self::Storage(_) => TurnState::CompletionPending,
        }
    }
}

/// Sequences catalog read, matching, prompt assembly, completion and logging
/// for each message. Holds no per-request state, so one instance can serve
/// any number of concurrent turns.
pub struct TurnOrchestrator {
    catalog: Arc<dyn CatalogReader>,
    invoker: CompletionInvoker,
    log: Arc<dyn SessionLog>,
    on_log_failure: LogFailurePolicy,
}

impl TurnOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        invoker: CompletionInvoker,
        log: Arc<dyn SessionLog>,
    ) -> Self {
        Self {
            catalog,
            invoker,
            log,
            on_log_failure: LogFailurePolicy::default(),
        }
    }

    /// Wire an orchestrator from config: model settings, optional catalog
    /// cache, and the log-failure policy.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        catalog: Arc<dyn CatalogReader>,
        log: Arc<dyn SessionLog>,
    ) -> Self {
        let catalog: Arc<dyn CatalogReader> = match config.catalog.cache_ttl_secs {
            0 => catalog,
            secs => Arc::new(CachedCatalog::new(catalog, Duration::from_secs(secs))),
        };
        Self::new(catalog, CompletionInvoker::from_config(provider, config), log)
            .with_log_failure_policy(config.session.on_log_failure)
    }

    pub fn with_log_failure_policy(mut self, policy: LogFailurePolicy) -> Self {
        self.on_log_failure = policy;
        self
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogReader> {
        &self.catalog
    }

    pub fn invoker(&self) -> &CompletionInvoker {
        &self.invoker
    }

    /// Process one message end to end.
    pub async fn handle(&self, request: TurnRequest) -> Result<TurnOutcome, TurnError> {
        let session_id = request.validate()?;
        let session = session_id.as_str();
        debug!(session, state = %TurnState::Received, "Turn received");

        let catalog = self.catalog.snapshot().await.map_err(|e| {
            debug!(session, state = %TurnState::Failed, "Catalog read failed: {e}");
            TurnError::CatalogUnavailable(e)
        })?;
        debug!(
            session,
            state = %TurnState::CatalogLoaded,
            colleges = catalog.colleges.len(),
            branches = catalog.branches.len()
        );

        let matched = match_entities(&request.message, &catalog);
        debug!(
            session,
            state = %TurnState::Matched,
            colleges = matched.colleges.len(),
            branches = matched.branches.len()
        );

        let prompt = assemble(&request.message, &matched);
        debug!(session, state = %TurnState::PromptAssembled, prompt_chars = prompt.len());

        debug!(session, state = %TurnState::CompletionPending);
        let answer = self.invoker.invoke(&prompt).await.map_err(|e| {
            debug!(session, state = %TurnState::Failed, "Completion failed: {e}");
            TurnError::Completion(e)
        })?;

        let persisted = match self
            .log
            .append(&session_id, &request.message, &answer)
            .await
        {
            Ok(_) => {
                debug!(session, state = %TurnState::Logged);
                true
            }
            Err(e) => match self.on_log_failure {
                LogFailurePolicy::Deliver => {
                    error!(session, "Answer delivered but turn was not persisted: {e}");
                    false
                }
                LogFailurePolicy::Fail => {
                    error!(session, "Failed to persist turn: {e}");
                    return Err(TurnError::Storage(e));
                }
            },
        };

        info!(session, persisted, "Turn complete");
        Ok(TurnOutcome {
            session_id,
            message: answer,
            persisted,
        })
    }

    /// Replay a session's turns, oldest first.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ConversationTurn>, TurnError> {
        if session_id.trim().is_empty() {
            return Err(ValidationError::MissingSessionId.into());
        }
        Ok(self.log.history(&SessionId::from(session_id)).await?)
    }
}
