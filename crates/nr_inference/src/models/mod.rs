use nr_core::{EmbeddingProvider, Error, Result};
use std::sync::Arc;
use tracing::info;

use crate::Config;

pub mod dummy;
pub mod ollama;
pub mod openai;

pub use dummy::DummyModel;
pub use ollama::OllamaModel;
pub use openai::OpenAiModel;

/// Build an embedding provider by name: `dummy`, `ollama` or `openai`.
pub fn create_model(kind: &str, config: Config) -> Result<Arc<dyn EmbeddingProvider>> {
    let model: Arc<dyn EmbeddingProvider> = match kind {
        "dummy" => Arc::new(DummyModel::new(config.dimension)),
        "ollama" => Arc::new(OllamaModel::new(config)?),
        "openai" => Arc::new(OpenAiModel::new(config)?),
        other => {
            return Err(Error::Inference(format!(
                "Unknown embedding provider: {} (expected dummy, ollama or openai)",
                other
            )))
        }
    };
    info!("🧠 Embedding provider ready (using {})", model.name());
    Ok(model)
}
