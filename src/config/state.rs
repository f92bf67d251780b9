// Application state module
// Shared, immutable per-process state handed to every request

use std::sync::Arc;

use super::types::Config;
use crate::http::CorsPolicy;
use crate::storage::{ObjectStore, PostRepository};

/// Application state
pub struct AppState {
    pub config: Config,
    pub cors: CorsPolicy,
    pub posts: Arc<dyn PostRepository>,
    /// `None` when the object store is disabled; file routes then fall through to 404
    pub objects: Option<Arc<dyn ObjectStore>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        posts: Arc<dyn PostRepository>,
        objects: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        Self {
            config: config.clone(),
            cors: CorsPolicy::from_config(&config.cors),
            posts,
            objects,
        }
    }
}
