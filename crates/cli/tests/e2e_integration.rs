//! End-to-end integration tests for the Pathwise turn pipeline.
//!
//! These tests exercise the full path from an HTTP chat request to the
//! stored session history: SQLite store seeded with the built-in catalog,
//! entity matching, prompt assembly, completion and logging.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use pathwise_agent::{CompletionInvoker, TurnError, TurnOrchestrator, TurnRequest};
use pathwise_config::{AppConfig, GatewayConfig, LogFailurePolicy, StorageConfig};
use pathwise_core::error::{CompletionError, ProviderError};
use pathwise_core::message::Message;
use pathwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use pathwise_core::session::SessionId;
use pathwise_gateway::{ApiState, build_router};
use pathwise_store::{CatalogSeed, StoreHandles};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted outcomes in sequence and keeps
/// every prompt it was sent.
struct ScriptedProvider {
    outcomes: std::sync::Mutex<Vec<Result<String, ProviderError>>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: std::sync::Mutex::new(outcomes),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn text(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let outcomes = self.outcomes.lock().unwrap();
        let call = prompts.len();
        if call >= outcomes.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                call,
                outcomes.len()
            );
        }
        prompts.push(request.messages[0].content.clone());
        outcomes[call].clone().map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

async fn seeded_stores() -> StoreHandles {
    let stores = pathwise_store::open_from_config(&StorageConfig {
        backend: "sqlite".into(),
        path: "sqlite::memory:".into(),
    })
    .await
    .expect("open sqlite store");
    CatalogSeed::builtin()
        .unwrap()
        .apply(stores.writer.as_ref())
        .await
        .expect("seed catalog");
    stores
}

fn orchestrator(stores: &StoreHandles, provider: Arc<ScriptedProvider>) -> TurnOrchestrator {
    TurnOrchestrator::new(
        stores.catalog.clone(),
        CompletionInvoker::new(provider, "mock"),
        stores.sessions.clone(),
    )
}

fn app(stores: &StoreHandles, provider: Arc<ScriptedProvider>) -> axum::Router {
    let state = Arc::new(ApiState {
        orchestrator: Arc::new(orchestrator(stores, provider)),
        catalog: stores.catalog.clone(),
    });
    build_router(state, &GatewayConfig::default())
}

async fn post_chat(app: axum::Router, session: &str, message: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "message": message, "sessionId": session }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

// ── E2E: Chat over HTTP ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_chat_enriches_prompt_and_persists_turn() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&["IIT Bombay is ranked first."]));

    let (status, body) = post_chat(
        app(&stores, provider.clone()),
        "student-1",
        "Tell me about IIT Bombay",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "IIT Bombay is ranked first.");
    assert_eq!(body["sessionId"], "student-1");

    let prompt = provider.prompt(0);
    assert!(prompt.starts_with("You are a career guidance counselor"));
    assert!(prompt.contains("Information about IIT Bombay:\nLocation: Mumbai, Maharashtra\nRanking: 1\n"));
    assert!(prompt.contains(
        "Available Branches: Computer Science and Engineering, Electrical Engineering, Mechanical Engineering"
    ));
    assert_eq!(prompt.matches("IIT Bombay").count(), 2);
    assert!(prompt.ends_with(
        "Student Query: Tell me about IIT Bombay\n\nProvide a helpful, informative response focusing on career guidance."
    ));

    let (status, history) = get_json(app(&stores, provider), "/api/chat/history/student-1").await;
    assert_eq!(status, StatusCode::OK);
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["userInput"], "Tell me about IIT Bombay");
    assert_eq!(turns[0]["botResponse"], "IIT Bombay is ranked first.");
}

#[tokio::test]
async fn e2e_branch_question_renders_branch_block() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&["EE is a solid core branch."]));

    let (status, _) = post_chat(
        app(&stores, provider.clone()),
        "s",
        "Is electrical engineering a good choice?",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let prompt = provider.prompt(0);
    // Offered by all four colleges, so four branch records match.
    assert_eq!(
        prompt.matches("Information about Electrical Engineering:").count(),
        4
    );
    assert!(prompt.contains(
        "Career Prospects: Power Systems Engineer, Electronics Designer, Control Systems Engineer, IoT Specialist, Research Scientist"
    ));
    assert!(!prompt.contains("Required Skills"));
}

#[tokio::test]
async fn e2e_unmatched_query_still_reaches_model() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&["General advice."]));

    let (status, _) = post_chat(app(&stores, provider.clone()), "s", "How should I prepare?").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        provider
            .prompt(0)
            .contains("Use this context information if relevant:\n\nStudent Query: How should I prepare?")
    );
}

#[tokio::test]
async fn e2e_validation_errors_do_not_reach_model() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&[]));

    let (status, body) = post_chat(app(&stores, provider.clone()), "s", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required");

    let (status, body) = post_chat(app(&stores, provider.clone()), "", "hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Session ID is required");

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn e2e_empty_completion_is_not_logged() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&["   "]));

    let (status, body) = post_chat(app(&stores, provider), "s", "IIT Delhi?").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to generate response");

    let history = stores.sessions.history(&SessionId::from("s")).await.unwrap();
    assert!(history.is_empty());
}

// ── E2E: Orchestrator directly ───────────────────────────────────────────

#[tokio::test]
async fn e2e_multi_turn_history_is_ordered() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&["one", "two", "three"]));
    let orch = orchestrator(&stores, provider.clone());

    for q in ["first", "second", "third"] {
        orch.handle(TurnRequest::new("ordered", q)).await.unwrap();
    }

    let history = orch.history("ordered").await.unwrap();
    let inputs: Vec<_> = history.iter().map(|t| t.user_input.as_str()).collect();
    assert_eq!(inputs, vec!["first", "second", "third"]);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    // Earlier turns never leak into later prompts.
    assert!(!provider.prompt(2).contains("first"));
}

#[tokio::test]
async fn e2e_upstream_failure_surfaces_completion_error() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Timeout(
        "deadline exceeded".into(),
    ))]));
    let orch = orchestrator(&stores, provider)
        .with_log_failure_policy(LogFailurePolicy::Fail);

    let err = orch
        .handle(TurnRequest::new("s", "VIT Pune"))
        .await
        .unwrap_err();
    match err {
        TurnError::Completion(CompletionError::Upstream(detail)) => {
            assert!(detail.contains("deadline exceeded"))
        }
        other => panic!("expected upstream failure, got {other:?}"),
    }
}

#[tokio::test]
async fn e2e_from_config_uses_in_memory_backend() {
    let mut config = AppConfig::default();
    config.storage.backend = "in_memory".into();
    config.catalog.cache_ttl_secs = 30;

    let stores = pathwise_store::open_from_config(&config.storage)
        .await
        .unwrap();
    CatalogSeed::builtin()
        .unwrap()
        .apply(stores.writer.as_ref())
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::text(&["BITS is in Rajasthan."]));
    let orch = TurnOrchestrator::from_config(
        &config,
        provider.clone(),
        stores.catalog.clone(),
        stores.sessions.clone(),
    );

    let outcome = orch
        .handle(TurnRequest::new("cfg", "Where is BITS Pilani?"))
        .await
        .unwrap();
    assert_eq!(outcome.message, "BITS is in Rajasthan.");
    assert!(outcome.persisted);
    assert!(provider.prompt(0).contains("Location: Pilani, Rajasthan"));
}

// ── E2E: Catalog endpoints ───────────────────────────────────────────────

#[tokio::test]
async fn e2e_catalog_endpoints_over_sqlite() {
    let stores = seeded_stores().await;
    let provider = Arc::new(ScriptedProvider::text(&[]));

    let (status, colleges) = get_json(app(&stores, provider.clone()), "/api/colleges").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = colleges
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["IIT Bombay", "IIT Delhi", "BITS Pilani", "VIT Pune"]);

    let vit_id = colleges[3]["id"].as_str().unwrap().to_string();
    let (_, branches) = get_json(
        app(&stores, provider.clone()),
        &format!("/api/branches?collegeId={vit_id}"),
    )
    .await;
    let branches = branches.as_array().unwrap();
    assert_eq!(branches.len(), 3);
    assert_eq!(branches[0]["college"]["name"], "VIT Pune");

    let branch_id = branches[0]["id"].as_str().unwrap();
    let (status, branch) = get_json(
        app(&stores, provider.clone()),
        &format!("/api/branches/{branch_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(branch["courseDuration"], 4);

    let (status, health) = get_json(app(&stores, provider), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["database"], "connected");
}
