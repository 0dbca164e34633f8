//! HTTP gateway for Pathwise.
//!
//! Serves the chat, history and catalog endpoints under `/api`.
//!
//! Built on Axum.

pub mod api;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use pathwise_agent::TurnOrchestrator;
use pathwise_config::{AppConfig, GatewayConfig};

pub use api::{ApiState, SharedApiState, api_router};

/// Build the full router: `/api` routes plus CORS, body limit and tracing.
pub fn build_router(state: SharedApiState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .nest("/api", api_router(state))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server.
///
/// Opens the configured store, builds the provider and orchestrator once,
/// and shares them across all requests.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let stores = pathwise_store::open_from_config(&config.storage).await?;
    if stores.catalog.list_colleges().await?.is_empty() {
        warn!("Catalog is empty; run `pathwise seed` to load the starter catalog");
    }

    if !config.has_api_key() {
        warn!("No API key configured; completion requests will likely fail");
    }
    let router = pathwise_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or("No default provider configured")?;

    let orchestrator = TurnOrchestrator::from_config(
        &config,
        provider,
        stores.catalog.clone(),
        stores.sessions.clone(),
    );

    let state = Arc::new(ApiState {
        orchestrator: Arc::new(orchestrator),
        catalog: stores.catalog,
    });

    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
