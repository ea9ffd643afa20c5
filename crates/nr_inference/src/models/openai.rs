use async_trait::async_trait;
use nr_core::{Embedding, EmbeddingProvider, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Config;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Embedding,
}

/// Any server speaking the OpenAI `/v1/embeddings` protocol.
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: String,
    batch_size: usize,
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OpenAiModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Inference("OpenAI API key is required".to_string()))?;

        Ok(Self {
            client: config.http_client()?,
            api_key,
            base_url: config.base_url_or(DEFAULT_OPENAI_URL)?,
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Embedding>> {
        let request = EmbeddingRequest {
            input: chunk,
            model: &self.model_name,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Failed to call embeddings API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Embeddings API returned {}: {}",
                status, body
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse embeddings response: {}", e)))?;

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let mut batch = self.embed_chunk(chunk).await?;
            if batch.len() != chunk.len() {
                return Err(Error::Inference(format!(
                    "Embeddings API returned {} vectors for {} texts",
                    batch.len(),
                    chunk.len()
                )));
            }
            embeddings.append(&mut batch);
        }
        Ok(embeddings)
    }
}
