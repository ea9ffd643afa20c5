use nr_core::{Article, Embedding, EmbeddingProvider, Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Attaches vectors to fetched articles using the configured provider.
#[derive(Debug, Clone)]
pub struct EmbeddingGenerator {
    model: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingGenerator {
    pub fn new(model: Arc<dyn EmbeddingProvider>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Embed every article in one provider call and return them with
    /// `embedding` set. Order is preserved.
    pub async fn embed_articles(&self, mut articles: Vec<Article>) -> Result<Vec<Article>> {
        if articles.is_empty() {
            return Ok(articles);
        }

        let texts: Vec<String> = articles.iter().map(Article::embedding_text).collect();
        let embeddings = self.model.embed(&texts).await?;
        if embeddings.len() != articles.len() {
            return Err(Error::Inference(format!(
                "{} returned {} embeddings for {} articles",
                self.model.name(),
                embeddings.len(),
                articles.len()
            )));
        }

        for (article, embedding) in articles.iter_mut().zip(embeddings) {
            article.embedding = Some(embedding);
        }
        debug!(articles = articles.len(), model = self.model.name(), "Embedded articles");
        Ok(articles)
    }

    pub async fn embed_text(&self, text: &str) -> Result<Embedding> {
        self.model
            .embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Inference(format!("{} returned no embedding", self.model.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use async_trait::async_trait;
    use chrono::Utc;
    use nr_core::Source;

    fn article(title: &str) -> Article {
        Article {
            source: Source {
                id: None,
                name: "Test".to_string(),
            },
            author: None,
            title: title.to_string(),
            description: Some("Test description".to_string()),
            url: Some("http://example.com".to_string()),
            url_to_image: None,
            published_at: Utc::now(),
            content: None,
            embedding: None,
        }
    }

    #[derive(Debug)]
    struct ShortModel;

    #[async_trait]
    impl EmbeddingProvider for ShortModel {
        fn name(&self) -> &str {
            "Short"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(vec![vec![1.0]])
        }
    }

    #[tokio::test]
    async fn test_embedding_generation() {
        let generator = EmbeddingGenerator::new(Arc::new(DummyModel::new(16)));
        assert_eq!(generator.model_name(), "Dummy");

        let articles = generator
            .embed_articles(vec![article("First"), article("Second")])
            .await
            .unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "First");
        assert!(articles.iter().all(|a| a.embedding.as_ref().map(Vec::len) == Some(16)));

        let text_embedding = generator.embed_text(&articles[0].embedding_text()).await.unwrap();
        assert_eq!(Some(text_embedding), articles[0].embedding);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_provider() {
        let generator = EmbeddingGenerator::new(Arc::new(ShortModel));
        assert!(generator.embed_articles(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        let generator = EmbeddingGenerator::new(Arc::new(ShortModel));
        let err = generator
            .embed_articles(vec![article("a"), article("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
