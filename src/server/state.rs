//! Application state shared across handlers.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::library::{
    Cache, Catalog, FormatExtractor, LocalStorage, MemoryCache, Metadata, MetadataCache, Storage,
};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Catalog over the library root.
    pub catalog: Arc<Catalog>,
    /// Metadata cache backing the catalog.
    metadata_cache: Arc<MemoryCache<Metadata>>,
}

impl AppState {
    /// Build state for a local library root taken from the configuration.
    pub fn new(config: Config) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.library.root)
                .with_public_url(config.library.public_url.clone()),
        );
        Self::with_storage(config, storage)
    }

    /// Build state over any storage backend.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        let metadata_cache = Arc::new(MemoryCache::new());
        let cache: Arc<dyn Cache<Metadata>> = metadata_cache.clone();

        let metadata = MetadataCache::new(
            storage.clone(),
            cache,
            Arc::new(FormatExtractor),
            config.cache.metadata_ttl(),
        );

        Self {
            config: Arc::new(config),
            catalog: Arc::new(Catalog::new(storage, metadata)),
            metadata_cache,
        }
    }

    /// Get the base URL for generating links.
    pub fn base_url(&self) -> String {
        String::new()
    }

    /// Drop expired metadata cache entries.
    pub fn purge_cache(&self) -> usize {
        self.metadata_cache.purge_expired()
    }

    /// Run catalog work on the blocking pool.
    pub async fn with_catalog<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Catalog) -> Result<T> + Send + 'static,
    {
        let catalog = self.catalog.clone();
        tokio::task::spawn_blocking(move || f(&catalog))
            .await
            .map_err(|e| AppError::Internal(format!("Catalog task failed: {}", e)))?
    }
}
