//! Time-bounded catalog cache.
//!
//! Wraps any [`CatalogReader`] and reuses the last snapshot for at most
//! `ttl`. A stale or missing entry triggers a full re-read. Failed reads are
//! never cached, so an outage is reported on every turn until the store
//! recovers.

use async_trait::async_trait;
use pathwise_core::catalog::{Branch, CatalogReader, CatalogSnapshot, College};
use pathwise_core::error::CatalogError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

pub struct CachedCatalog {
    inner: Arc<dyn CatalogReader>,
    ttl: Duration,
    entry: RwLock<Option<(Instant, CatalogSnapshot)>>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn CatalogReader>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Drop the cached snapshot so the next read goes to the store.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    async fn fresh(&self) -> Option<CatalogSnapshot> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|(loaded_at, _)| loaded_at.elapsed() < self.ttl)
            .map(|(_, snapshot)| snapshot.clone())
    }
}

#[async_trait]
impl CatalogReader for CachedCatalog {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_colleges(&self) -> Result<Vec<College>, CatalogError> {
        Ok(self.snapshot().await?.colleges)
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, CatalogError> {
        Ok(self.snapshot().await?.branches)
    }

    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        if let Some(snapshot) = self.fresh().await {
            debug!("Catalog cache hit");
            return Ok(snapshot);
        }

        let snapshot = self.inner.snapshot().await?;
        *self.entry.write().await = Some((Instant::now(), snapshot.clone()));
        debug!(
            colleges = snapshot.colleges.len(),
            branches = snapshot.branches.len(),
            "Catalog cache refreshed"
        );
        Ok(snapshot)
    }

    async fn get_branch(&self, id: &str) -> Result<Option<Branch>, CatalogError> {
        self.inner.get_branch(id).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}
