use nr_core::{Error, Result};
use std::time::Duration;
use url::Url;

pub mod embeddings;
pub mod models;

pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    /// Vector size produced by the dummy model
    pub dimension: usize,
    /// Texts sent per request to remote providers
    pub batch_size: usize,
    /// Per-request timeout for remote providers
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            base_url: None,
            dimension: DEFAULT_DIMENSION,
            batch_size: 64,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Base URL with any trailing slash removed, validated as an absolute URL.
    pub(crate) fn base_url_or(&self, default: &str) -> Result<String> {
        let base = self.base_url.as_deref().unwrap_or(default);
        Url::parse(base)
            .map_err(|e| Error::Inference(format!("Invalid embedding base URL {}: {}", base, e)))?;
        Ok(base.trim_end_matches('/').to_string())
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Inference(format!("Failed to build HTTP client: {}", e)))
    }
}

pub mod prelude {
    pub use super::embeddings::EmbeddingGenerator;
    pub use super::models::create_model;
    pub use super::Config;
    pub use nr_core::{Article, EmbeddingProvider, Error, Result};
}

pub use embeddings::EmbeddingGenerator;
pub use models::create_model;
