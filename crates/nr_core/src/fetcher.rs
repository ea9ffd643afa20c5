use async_trait::async_trait;

use crate::types::NewsApiResponse;
use crate::Result;

#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetch one listing page. Network failures, non-success statuses and
    /// malformed payloads map to `UpstreamUnavailable`, `UpstreamStatus` and
    /// `UpstreamSchema` respectively.
    async fn fetch(&self, url: &str) -> Result<NewsApiResponse>;
}
