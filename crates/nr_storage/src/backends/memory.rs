use async_trait::async_trait;
use nr_core::codec::{decode_bucket, decode_embedding, encode_bucket, encode_embedding};
use nr_core::{Article, ArticleStore, Bucket, Embedding, ProfileStore, Result, PROFILE_CAPACITY};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::{BackendConfig, StorageBackend};

/// Process-local cache with the same value layout as the Redis backend:
/// buckets are JSON strings replaced whole, profiles are capped lists of
/// JSON-encoded vectors.
#[derive(Default)]
pub struct InMemoryStorage {
    buckets: RwLock<HashMap<Bucket, String>>,
    profiles: RwLock<HashMap<String, VecDeque<String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_config: &BackendConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn put_bucket(&self, bucket: Bucket, articles: &[Article]) -> Result<()> {
        let raw = encode_bucket(articles)?;
        self.buckets.write().await.insert(bucket, raw);
        Ok(())
    }

    async fn get_bucket(&self, bucket: Bucket) -> Result<Vec<Article>> {
        let raw = self.buckets.read().await.get(&bucket).cloned();
        match raw {
            Some(raw) => decode_bucket(&raw),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryStorage {
    async fn push_profile(&self, user_id: &str, embedding: &[f32]) -> Result<()> {
        let raw = encode_embedding(embedding)?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles.entry(user_id.to_string()).or_default();
        profile.push_front(raw);
        profile.truncate(PROFILE_CAPACITY);
        Ok(())
    }

    async fn get_profile(&self, user_id: &str, limit: usize) -> Result<Vec<Embedding>> {
        let profiles = self.profiles.read().await;
        match profiles.get(user_id) {
            Some(profile) => profile
                .iter()
                .take(limit)
                .map(|raw| decode_embedding(raw))
                .collect(),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nr_core::Source;
    use std::sync::Arc;

    fn snapshot(tag: &str, size: usize) -> Vec<Article> {
        (0..size)
            .map(|i| Article {
                source: Source {
                    id: None,
                    name: tag.to_string(),
                },
                author: None,
                title: format!("{}-{}", tag, i),
                description: None,
                url: None,
                url_to_image: None,
                published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                content: None,
                embedding: Some(vec![i as f32, 1.0]),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unwritten_bucket_is_empty() {
        let storage = InMemoryStorage::new();
        assert!(storage.get_bucket(Bucket::MixHeadlines).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_bucket_replaces_whole_value() {
        let storage = InMemoryStorage::new();
        storage.put_bucket(Bucket::TopHeadlines, &snapshot("old", 5)).await.unwrap();
        storage.put_bucket(Bucket::TopHeadlines, &snapshot("new", 2)).await.unwrap();

        let articles = storage.get_bucket(Bucket::TopHeadlines).await.unwrap();
        assert_eq!(articles, snapshot("new", 2));
        assert!(storage.get_bucket(Bucket::MixHeadlines).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_keeps_ten_most_recent() {
        let storage = InMemoryStorage::new();
        for i in 0..15 {
            storage.push_profile("alice", &[i as f32]).await.unwrap();
        }

        let profile = storage.get_profile("alice", PROFILE_CAPACITY).await.unwrap();
        let expected: Vec<Embedding> = (5..15).rev().map(|i| vec![i as f32]).collect();
        assert_eq!(profile, expected);

        let limited = storage.get_profile("alice", 3).await.unwrap();
        assert_eq!(limited, vec![vec![14.0], vec![13.0], vec![12.0]]);
        assert!(storage.get_profile("nobody", PROFILE_CAPACITY).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_see_whole_snapshots() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.put_bucket(Bucket::MixHeadlines, &snapshot("a", 40)).await.unwrap();

        let writer = {
            let storage = storage.clone();
            tokio::spawn(async move {
                for round in 0..200 {
                    let (tag, size) = if round % 2 == 0 { ("b", 25) } else { ("a", 40) };
                    storage
                        .put_bucket(Bucket::MixHeadlines, &snapshot(tag, size))
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let articles = storage.get_bucket(Bucket::MixHeadlines).await.unwrap();
                        let tag = articles[0].source.name.clone();
                        let expected = if tag == "a" { 40 } else { 25 };
                        assert_eq!(articles.len(), expected);
                        assert!(articles.iter().all(|a| a.source.name == tag));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
