use std::sync::Arc;
use crate::{
    config::Config,
    infrastructure::{
        database::BlogStore,
        media::MediaStore,
        middleware::{HasBlogStore, HasLoginUrl},
        sqlite_database::SqliteStore,
        cache_layer::PageCache,
    },
};

/// Shared, cheaply clonable handles used by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub page_cache: Arc<PageCache>,
    pub media: Arc<MediaStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let store = SqliteStore::connect(&config.database.url, config.database.node_id).await?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Build state around an existing store (in-memory stores in tests)
    pub fn with_store(config: Config, store: Arc<dyn BlogStore>) -> Self {
        let page_cache = Arc::new(PageCache::new(config.cache.capacity, config.index_cache_ttl()));
        let media = Arc::new(MediaStore::new(config.media.root.clone()));

        Self {
            store,
            page_cache,
            media,
            config,
        }
    }
}

impl HasBlogStore for AppState {
    fn blog_store(&self) -> &Arc<dyn BlogStore> {
        &self.store
    }
}

impl HasLoginUrl for AppState {
    fn login_url(&self) -> &str {
        &self.config.auth.login_url
    }
}
