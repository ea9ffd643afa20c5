use async_trait::async_trait;
use nr_core::{Embedding, EmbeddingProvider, Result};
use std::fmt;

/// Offline provider deriving a vector from text length and character
/// frequencies. Deterministic, so equal texts always embed identically.
pub struct DummyModel {
    dimension: usize,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl DummyModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(2),
        }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0; self.dimension];
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return embedding;
        }

        let text_len = chars.len() as f32;
        embedding[0] = text_len / 1000.0;

        let slots = self.dimension - 1;
        for c in chars {
            embedding[1 + (c as usize) % slots] += 1.0 / text_len;
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}
