use std::sync::Arc;
use std::time::Duration;

use crate::comments::ForestCache;
use crate::store::{CommentStore, RecipeStore, SqlStore};

/// Shared handles every request handler gets.
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<dyn CommentStore>,
    pub recipes: Arc<dyn RecipeStore>,
    pub forests: Arc<ForestCache>,
    pub secret_key: Arc<str>,
}

impl AppState {
    pub fn new(
        store: SqlStore,
        secret_key: &str,
        comments_stale_after: Duration,
        comments_cache_time: Duration,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            comments: store.clone(),
            recipes: store,
            forests: Arc::new(ForestCache::new(
                comments_stale_after,
                comments_cache_time,
            )),
            secret_key: Arc::from(secret_key),
        }
    }
}
