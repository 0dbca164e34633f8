//! `pathwise config`: Configuration management commands.

use pathwise_config::AppConfig;
use std::path::{Path, PathBuf};

fn resolve(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_api_key() {
                warnings.push("No API key set (set GEMINI_API_KEY or PATHWISE_API_KEY)");
            }

            if config.gateway.host == "0.0.0.0" && config.gateway.allowed_origins.is_empty() {
                warnings.push("Gateway bound to 0.0.0.0 while accepting any CORS origin");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Model:     {}", config.default_model);
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
            println!("   Storage:   {} ({})", config.storage.backend, config.storage.path);
            println!("   Cache TTL: {}s", config.catalog.cache_ttl_secs);
        }
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".into());
        }
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", resolve(config_path).display());
    Ok(())
}

pub async fn init(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = resolve(config_path);
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote default config to {}", path.display());
    Ok(())
}
