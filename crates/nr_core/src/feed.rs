use std::sync::Arc;
use tracing::{debug, info};

use crate::policy::FailurePolicy;
use crate::ranking::rank_articles;
use crate::storage::{ArticleStore, ProfileStore};
use crate::types::{Article, Bucket, Embedding, PROFILE_CAPACITY};
use crate::{Error, Result};

/// Request-facing operations over the shared stores.
///
/// Reads follow `read_policy` (best effort unless overridden): a store outage
/// degrades to "nothing cached" and an unreadable profile to a cold start.
/// Ingestion is always strict so the caller can retry.
#[derive(Clone)]
pub struct Feed {
    articles: Arc<dyn ArticleStore>,
    profiles: Arc<dyn ProfileStore>,
    read_policy: FailurePolicy,
}

impl Feed {
    pub fn new(articles: Arc<dyn ArticleStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            articles,
            profiles,
            read_policy: FailurePolicy::BestEffort,
        }
    }

    pub fn with_read_policy(mut self, policy: FailurePolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn read_policy(&self) -> FailurePolicy {
        self.read_policy
    }

    /// Cached bucket content in cache order.
    pub async fn bucket(&self, bucket: Bucket) -> Result<Vec<Article>> {
        let articles = self
            .read_policy
            .apply(bucket.as_str(), self.articles.get_bucket(bucket).await)?;
        debug!(bucket = %bucket, articles = articles.len(), "Read bucket");
        Ok(articles)
    }

    /// Bucket content ordered by relevance to the user's recent history.
    pub async fn ranked(&self, user_id: &str, bucket: Bucket) -> Result<Vec<Article>> {
        let articles = self.bucket(bucket).await?;
        let profile = self
            .read_policy
            .apply("profile", self.profiles.get_profile(user_id, PROFILE_CAPACITY).await)?;

        if profile.is_empty() {
            debug!(user_id, "No profile, serving cache order");
            return Ok(articles);
        }

        let ranked = rank_articles(articles, &profile);
        info!(user_id, profile = profile.len(), articles = ranked.len(), "📊 Ranked bucket");
        Ok(ranked)
    }

    /// Record one positive interaction for the user.
    pub async fn ingest(&self, user_id: &str, embedding: Embedding) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(Error::InvalidRequest("userId must not be empty".to_string()));
        }
        validate_embedding(&embedding)?;

        FailurePolicy::Strict.apply(
            "push profile",
            self.profiles.push_profile(user_id, &embedding).await,
        )?;
        debug!(user_id, dimension = embedding.len(), "Stored profile embedding");
        Ok(())
    }
}

pub fn validate_embedding(embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() {
        return Err(Error::InvalidEmbedding("embedding must not be empty".to_string()));
    }
    if embedding.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "embedding must only contain finite values".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct TestStore {
        buckets: RwLock<HashMap<Bucket, Vec<Article>>>,
        profiles: RwLock<HashMap<String, Vec<Embedding>>>,
    }

    #[async_trait]
    impl ArticleStore for TestStore {
        async fn put_bucket(&self, bucket: Bucket, articles: &[Article]) -> Result<()> {
            self.buckets.write().await.insert(bucket, articles.to_vec());
            Ok(())
        }

        async fn get_bucket(&self, bucket: Bucket) -> Result<Vec<Article>> {
            Ok(self.buckets.read().await.get(&bucket).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl ProfileStore for TestStore {
        async fn push_profile(&self, user_id: &str, embedding: &[f32]) -> Result<()> {
            let mut profiles = self.profiles.write().await;
            let profile = profiles.entry(user_id.to_string()).or_default();
            profile.insert(0, embedding.to_vec());
            profile.truncate(PROFILE_CAPACITY);
            Ok(())
        }

        async fn get_profile(&self, user_id: &str, limit: usize) -> Result<Vec<Embedding>> {
            let profiles = self.profiles.read().await;
            Ok(profiles
                .get(user_id)
                .map(|p| p.iter().take(limit).cloned().collect())
                .unwrap_or_default())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ArticleStore for BrokenStore {
        async fn put_bucket(&self, _bucket: Bucket, _articles: &[Article]) -> Result<()> {
            Err(Error::Storage("connection reset".to_string()))
        }

        async fn get_bucket(&self, _bucket: Bucket) -> Result<Vec<Article>> {
            Err(Error::Storage("connection reset".to_string()))
        }
    }

    #[async_trait]
    impl ProfileStore for BrokenStore {
        async fn push_profile(&self, _user_id: &str, _embedding: &[f32]) -> Result<()> {
            Err(Error::Storage("connection reset".to_string()))
        }

        async fn get_profile(&self, _user_id: &str, _limit: usize) -> Result<Vec<Embedding>> {
            Err(Error::Storage("connection reset".to_string()))
        }
    }

    fn article(title: &str, embedding: Vec<f32>) -> Article {
        Article {
            source: Source {
                id: None,
                name: "test".to_string(),
            },
            author: None,
            title: title.to_string(),
            description: None,
            url: None,
            url_to_image: None,
            published_at: Utc::now(),
            content: None,
            embedding: Some(embedding),
        }
    }

    fn feed_over(store: Arc<TestStore>) -> Feed {
        Feed::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_ranked_uses_profile() {
        let store = Arc::new(TestStore::default());
        store
            .put_bucket(
                Bucket::MixHeadlines,
                &[article("sports", vec![0.0, 1.0]), article("tech", vec![1.0, 0.0])],
            )
            .await
            .unwrap();
        let feed = feed_over(store);

        let cold = feed.ranked("alice", Bucket::MixHeadlines).await.unwrap();
        assert_eq!(cold[0].title, "sports");

        feed.ingest("alice", vec![0.9, 0.1]).await.unwrap();
        let warm = feed.ranked("alice", Bucket::MixHeadlines).await.unwrap();
        assert_eq!(warm[0].title, "tech");
    }

    #[tokio::test]
    async fn test_empty_embedding_is_rejected_without_write() {
        let store = Arc::new(TestStore::default());
        let feed = feed_over(store.clone());
        feed.ingest("bob", vec![1.0, 2.0]).await.unwrap();

        let err = feed.ingest("bob", Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidEmbedding(_)));

        let profile = store.get_profile("bob", PROFILE_CAPACITY).await.unwrap();
        assert_eq!(profile, vec![vec![1.0, 2.0]]);
    }

    #[tokio::test]
    async fn test_non_finite_embedding_is_rejected() {
        let feed = feed_over(Arc::new(TestStore::default()));
        let err = feed.ingest("bob", vec![1.0, f32::NAN]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidEmbedding(_)));
        assert!(feed.ingest("  ", vec![1.0]).await.is_err());
    }

    #[tokio::test]
    async fn test_store_outage_degrades_reads_but_fails_ingest() {
        let broken = Arc::new(BrokenStore);
        let feed = Feed::new(broken.clone(), broken);

        assert!(feed.bucket(Bucket::TopHeadlines).await.unwrap().is_empty());
        assert!(feed.ranked("carol", Bucket::MixHeadlines).await.unwrap().is_empty());

        let err = feed.ingest("carol", vec![1.0]).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_strict_read_policy_surfaces_outage() {
        let broken = Arc::new(BrokenStore);
        let feed = Feed::new(broken.clone(), broken).with_read_policy(FailurePolicy::Strict);
        assert_eq!(feed.read_policy(), FailurePolicy::Strict);
        assert!(feed.bucket(Bucket::TopHeadlines).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_read_failure_falls_back_to_cache_order() {
        struct UnreadableProfiles;

        #[async_trait]
        impl ProfileStore for UnreadableProfiles {
            async fn push_profile(&self, _user_id: &str, _embedding: &[f32]) -> Result<()> {
                Ok(())
            }

            async fn get_profile(&self, _user_id: &str, _limit: usize) -> Result<Vec<Embedding>> {
                Err(Error::Storage("timeout".to_string()))
            }
        }

        let articles = Arc::new(TestStore::default());
        articles
            .put_bucket(
                Bucket::MixHeadlines,
                &[article("first", vec![0.0, 1.0]), article("second", vec![1.0, 0.0])],
            )
            .await
            .unwrap();
        let feed = Feed::new(articles, Arc::new(UnreadableProfiles));

        let served = feed.ranked("dave", Bucket::MixHeadlines).await.unwrap();
        assert_eq!(served[0].title, "first");
    }
}
