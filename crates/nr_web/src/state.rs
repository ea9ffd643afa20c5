use nr_core::{ArticleFetcher, ArticleStore, Feed};
use nr_fetch::NewsEndpoints;
use std::sync::Arc;

/// Everything a request handler needs. Cloned per request behind an `Arc`.
pub struct AppState {
    pub feed: Feed,
    pub fetcher: Arc<dyn ArticleFetcher>,
    pub endpoints: NewsEndpoints,
    /// Probed by `/health`
    pub articles: Arc<dyn ArticleStore>,
}
