//! Storage backends for the college/branch catalog and the chat session log.

pub mod in_memory;
pub mod seed;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use seed::{CatalogSeed, SeedError};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use pathwise_config::StorageConfig;
use pathwise_core::catalog::{CatalogReader, CatalogWriter};
use pathwise_core::error::StorageError;
use pathwise_core::session::SessionLog;
use std::sync::Arc;

/// One backend viewed through each of its roles.
#[derive(Clone)]
pub struct StoreHandles {
    pub catalog: Arc<dyn CatalogReader>,
    pub writer: Arc<dyn CatalogWriter>,
    pub sessions: Arc<dyn SessionLog>,
}

impl StoreHandles {
    fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: CatalogReader + CatalogWriter + SessionLog + 'static,
    {
        Self {
            catalog: store.clone(),
            writer: store.clone(),
            sessions: store,
        }
    }
}

/// Open the backend selected by `[storage]` in the config.
pub async fn open_from_config(config: &StorageConfig) -> Result<StoreHandles, StorageError> {
    match config.backend.as_str() {
        "in_memory" => {
            tracing::info!("Using in-memory store");
            Ok(StoreHandles::from_backend(Arc::new(InMemoryStore::new())))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            tracing::info!(path = %config.path, "Opening SQLite store");
            let store = SqliteStore::new(&config.path).await?;
            Ok(StoreHandles::from_backend(Arc::new(store)))
        }
        other => Err(StorageError::Storage(format!(
            "Unsupported storage backend: {other}"
        ))),
    }
}
