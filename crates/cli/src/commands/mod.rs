pub mod chat;
pub mod config_cmd;
pub mod history;
pub mod seed;
pub mod serve;

use pathwise_agent::TurnOrchestrator;
use pathwise_config::AppConfig;
use pathwise_store::StoreHandles;
use std::path::Path;

/// Load config from `path` if given, otherwise from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Open the store and wire an orchestrator around the default provider.
pub async fn build_runtime(
    config: &AppConfig,
) -> Result<(StoreHandles, TurnOrchestrator), Box<dyn std::error::Error>> {
    let stores = pathwise_store::open_from_config(&config.storage).await?;
    let router = pathwise_providers::router::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    let orchestrator = TurnOrchestrator::from_config(
        config,
        provider,
        stores.catalog.clone(),
        stores.sessions.clone(),
    );
    Ok((stores, orchestrator))
}
