use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, RedisError};
use async_trait::async_trait;
use nr_core::codec::{decode_bucket, decode_embedding, encode_bucket, encode_embedding};
use nr_core::{
    Article, ArticleStore, Bucket, Embedding, Error, ProfileStore, Result, PROFILE_CAPACITY,
};
use std::fmt;
use tracing::{debug, info};

use crate::{profile_key, BackendConfig, StorageBackend};

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

fn storage_error(context: &str, e: RedisError) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

/// Redis-backed cache. Buckets are plain string keys written with a single
/// `SET`; profiles are lists maintained with an atomic `LPUSH` + `LTRIM`.
#[derive(Clone)]
pub struct RedisStorage {
    manager: ConnectionManager,
    url: String,
}

impl fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStorage")
            .field("manager", &"<ConnectionManager>")
            .field("url", &self.url)
            .finish()
    }
}

impl RedisStorage {
    pub async fn new_with_url(url: &str) -> Result<Self> {
        info!("🔌 Connecting to Redis at {}", url);
        let client = Client::open(url).map_err(|e| storage_error("invalid Redis URL", e))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| storage_error("failed to connect to Redis", e))?;

        let storage = Self {
            manager,
            url: url.to_string(),
        };
        storage.ping().await?;
        Ok(storage)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StorageBackend for RedisStorage {
    fn get_error_message() -> &'static str {
        "Redis should be reachable at REDIS_URL (default redis://127.0.0.1:6379)"
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        Self::new_with_url(config.url.as_deref().unwrap_or(DEFAULT_REDIS_URL)).await
    }
}

#[async_trait]
impl ArticleStore for RedisStorage {
    async fn put_bucket(&self, bucket: Bucket, articles: &[Article]) -> Result<()> {
        let raw = encode_bucket(articles)?;
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(bucket.as_str(), raw)
            .await
            .map_err(|e| storage_error("failed to write bucket", e))?;
        debug!(bucket = %bucket, articles = articles.len(), "Bucket replaced");
        Ok(())
    }

    async fn get_bucket(&self, bucket: Bucket) -> Result<Vec<Article>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(bucket.as_str())
            .await
            .map_err(|e| storage_error("failed to read bucket", e))?;
        match raw {
            Some(raw) => decode_bucket(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        ::redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| storage_error("Redis ping failed", e))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RedisStorage {
    async fn push_profile(&self, user_id: &str, embedding: &[f32]) -> Result<()> {
        let key = profile_key(user_id);
        let raw = encode_embedding(embedding)?;
        let mut conn = self.manager.clone();

        ::redis::pipe()
            .atomic()
            .lpush(&key, raw)
            .ignore()
            .ltrim(&key, 0, PROFILE_CAPACITY as isize - 1)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| storage_error("failed to push profile embedding", e))?;
        Ok(())
    }

    async fn get_profile(&self, user_id: &str, limit: usize) -> Result<Vec<Embedding>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = profile_key(user_id);
        let mut conn = self.manager.clone();
        let raw: Vec<String> = conn
            .lrange(&key, 0, limit as isize - 1)
            .await
            .map_err(|e| storage_error("failed to read profile", e))?;

        raw.iter().map(|item| decode_embedding(item)).collect()
    }
}
