use async_trait::async_trait;
use nr_core::{Embedding, EmbeddingProvider, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::Config;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "all-minilm";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    truncate: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Embedding>,
}

pub struct OllamaModel {
    client: Client,
    base_url: String,
    model_name: String,
    batch_size: usize,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OllamaModel {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.base_url_or(DEFAULT_OLLAMA_URL)?,
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Embedding>> {
        let request = EmbedRequest {
            model: &self.model_name,
            input: chunk,
            truncate: true,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Failed to call Ollama embed API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Ollama embed API returned {}: {}",
                status, body
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse Ollama embed response: {}", e)))?;
        Ok(body.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let mut batch = self.embed_chunk(chunk).await?;
            if batch.len() != chunk.len() {
                return Err(Error::Inference(format!(
                    "Ollama returned {} embeddings for {} texts",
                    batch.len(),
                    chunk.len()
                )));
            }
            embeddings.append(&mut batch);
        }
        debug!(texts = texts.len(), model = %self.model_name, "Embedded batch");
        Ok(embeddings)
    }
}
