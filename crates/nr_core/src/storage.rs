use async_trait::async_trait;

use crate::types::{Article, Bucket, Embedding};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Replace the whole bucket in a single write
    async fn put_bucket(&self, bucket: Bucket, articles: &[Article]) -> Result<()>;

    /// Read a bucket; a bucket that was never written is an empty list
    async fn get_bucket(&self, bucket: Bucket) -> Result<Vec<Article>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Prepend a vector and trim the profile to `PROFILE_CAPACITY`, as one atomic step
    async fn push_profile(&self, user_id: &str, embedding: &[f32]) -> Result<()>;

    /// Up to `limit` most recent vectors, newest first
    async fn get_profile(&self, user_id: &str, limit: usize) -> Result<Vec<Embedding>>;
}
