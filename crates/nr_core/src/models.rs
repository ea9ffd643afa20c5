use async_trait::async_trait;
use std::fmt;

use crate::types::Embedding;
use crate::Result;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync + fmt::Debug {
    /// Human readable provider name, used in logs
    fn name(&self) -> &str;

    /// Embed a batch of texts, returning exactly one vector per input, in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}
