//! HTTP API: chat turns, session history and the read-only catalog.
//!
//! Endpoints:
//!
//! - `POST /api/chat` - Send a message, get an answer
//! - `GET  /api/chat/history/{session_id}` - Replay a session, oldest first
//! - `GET  /api/colleges` - Colleges by ranking
//! - `GET  /api/branches?collegeId=` - Branches by name, optionally filtered
//! - `GET  /api/branches/{branch_id}` - One branch
//! - `GET  /api/health` - Liveness plus store status

use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use pathwise_agent::{TurnError, TurnOrchestrator, TurnRequest};
use pathwise_core::catalog::{Branch, CatalogReader, College};
use pathwise_core::error::{CatalogError, CompletionError};
use pathwise_core::session::ConversationTurn;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the API.
pub struct ApiState {
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Direct catalog handle for the read endpoints (bypasses any turn cache).
    pub catalog: Arc<dyn CatalogReader>,
}

pub type SharedApiState = Arc<ApiState>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the API router. Nest this under "/api" in the main router.
pub fn api_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/history/{session_id}", get(history_handler))
        .route("/colleges", get(list_colleges_handler))
        .route("/branches", get(list_branches_handler))
        .route("/branches/{branch_id}", get(get_branch_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollegeSummary {
    pub name: String,
    pub location: String,
}

/// A branch together with a summary of the college offering it.
#[derive(Debug, Serialize, Deserialize)]
pub struct BranchDto {
    #[serde(flatten)]
    pub branch: Branch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<CollegeSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchFilter {
    pub college_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub database: String,
    pub version: String,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// An error rendered as `{error, details?}` with a mapped status code.
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                details: None,
            },
        }
    }

    fn with_details(mut self, details: impl ToString) -> Self {
        self.body.details = Some(details.to_string());
        self
    }

    fn catalog(err: CatalogError) -> Self {
        error!("Catalog read failed: {err}");
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Catalog unavailable").with_details(err)
    }
}

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        let (status, error) = match &err {
            TurnError::Validation(v) => return Self::new(StatusCode::BAD_REQUEST, v.to_string()),
            TurnError::CatalogUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Failed to generate response")
            }
            TurnError::Completion(CompletionError::Upstream(_) | CompletionError::EmptyResponse) => {
                (StatusCode::BAD_GATEWAY, "Failed to generate response")
            }
            TurnError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save chat turn"),
        };
        Self::new(status, error).with_details(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        info!("Rejected chat body: {rejection}");
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid request body").with_details(rejection)
    })?;
    info!(
        session = %payload.session_id,
        message_len = payload.message.len(),
        "Chat request"
    );

    let outcome = state.orchestrator.handle(payload).await.map_err(|e| {
        error!(stage = %e.stage(), "Chat turn failed: {e}");
        ApiError::from(e)
    })?;

    Ok(Json(ChatResponse {
        message: outcome.message,
        session_id: outcome.session_id.to_string(),
    }))
}

async fn history_handler(
    State(state): State<SharedApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ConversationTurn>>, ApiError> {
    let turns = state
        .orchestrator
        .history(&session_id)
        .await
        .map_err(|e| match e {
            TurnError::Storage(inner) => {
                error!("History read failed: {inner}");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch chat history",
                )
                .with_details(inner)
            }
            other => ApiError::from(other),
        })?;
    Ok(Json(turns))
}

async fn list_colleges_handler(
    State(state): State<SharedApiState>,
) -> Result<Json<Vec<College>>, ApiError> {
    let mut colleges = state.catalog.list_colleges().await.map_err(ApiError::catalog)?;
    // Ranked first, ascending; unranked keep catalog order at the end.
    colleges.sort_by_key(|c| (c.ranking.is_none(), c.ranking));
    Ok(Json(colleges))
}

async fn list_branches_handler(
    State(state): State<SharedApiState>,
    Query(filter): Query<BranchFilter>,
) -> Result<Json<Vec<BranchDto>>, ApiError> {
    let snapshot = state.catalog.snapshot().await.map_err(ApiError::catalog)?;

    let mut branches: Vec<BranchDto> = snapshot
        .branches
        .iter()
        .filter(|b| {
            filter
                .college_id
                .as_deref()
                .is_none_or(|id| b.college_id == id)
        })
        .map(|b| BranchDto {
            branch: b.clone(),
            college: snapshot.college(&b.college_id).map(|c| CollegeSummary {
                name: c.name.clone(),
                location: c.location.clone(),
            }),
        })
        .collect();
    branches.sort_by(|a, b| a.branch.name.cmp(&b.branch.name));

    Ok(Json(branches))
}

async fn get_branch_handler(
    State(state): State<SharedApiState>,
    Path(branch_id): Path<String>,
) -> Result<Json<Branch>, ApiError> {
    state
        .catalog
        .get_branch(&branch_id)
        .await
        .map_err(ApiError::catalog)?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Branch not found"))
}

async fn health_handler(State(state): State<SharedApiState>) -> Json<HealthResponse> {
    let database = if state.catalog.health_check().await {
        "connected"
    } else {
        "disconnected"
    };
    Json(HealthResponse {
        status: "ok".into(),
        timestamp: chrono::Utc::now(),
        database: database.into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
