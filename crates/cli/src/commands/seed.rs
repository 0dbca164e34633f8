//! `pathwise seed`: Replace the catalog with seed data.

use pathwise_store::CatalogSeed;
use std::path::{Path, PathBuf};

pub async fn run(
    config_path: Option<&Path>,
    file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let seed = match file.or_else(|| config.catalog.seed_file.clone()) {
        Some(path) => {
            println!("🌱 Seeding catalog from {}", path.display());
            CatalogSeed::load(&path)?
        }
        None => {
            println!("🌱 Seeding built-in catalog");
            CatalogSeed::builtin()?
        }
    };

    let stores = pathwise_store::open_from_config(&config.storage).await?;
    let snapshot = seed.apply(stores.writer.as_ref()).await?;

    println!(
        "   ✅ {} colleges, {} branches",
        snapshot.colleges.len(),
        snapshot.branches.len()
    );
    if config.storage.backend == "in_memory" {
        println!("   ⚠️  Storage backend is in_memory; the catalog is discarded on exit");
    }

    Ok(())
}
