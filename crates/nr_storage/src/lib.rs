use async_trait::async_trait;
use nr_core::{ArticleStore, Error, ProfileStore, Result};
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

/// Prefix applied to profile keys so user ids cannot collide with bucket names.
pub const PROFILE_KEY_PREFIX: &str = "profile:";

pub fn profile_key(user_id: &str) -> String {
    format!("{}{}", PROFILE_KEY_PREFIX, user_id)
}

#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub url: Option<String>,
}

impl BackendConfig {
    pub fn with_url(mut self, url: Option<&str>) -> Self {
        self.url = url.map(str::to_string);
        self
    }
}

#[async_trait]
pub trait StorageBackend: ArticleStore + ProfileStore + Sized + 'static {
    fn get_error_message() -> &'static str;
    async fn connect(config: &BackendConfig) -> Result<Self>;
}

/// The two store contracts, served by one backend.
#[derive(Clone)]
pub struct Stores {
    pub articles: Arc<dyn ArticleStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Stores {
    pub fn from_backend<T: ArticleStore + ProfileStore + 'static>(backend: Arc<T>) -> Self {
        Self {
            articles: backend.clone(),
            profiles: backend,
        }
    }
}

async fn connect<T: StorageBackend>(config: &BackendConfig) -> Result<Stores> {
    let backend = T::connect(config)
        .await
        .map_err(|e| Error::Storage(format!("{} ({})", e, T::get_error_message())))?;
    Ok(Stores::from_backend(Arc::new(backend)))
}

/// Build the stores for a backend name (`memory` or `redis`).
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Stores> {
    let config = BackendConfig::default().with_url(url);
    let stores = match kind {
        "memory" => connect::<InMemoryStorage>(&config).await?,
        #[cfg(feature = "redis")]
        "redis" => connect::<RedisStorage>(&config).await?,
        other => {
            return Err(Error::Storage(format!(
                "Unsupported storage backend: {}",
                other
            )))
        }
    };
    info!("🏦 Storage backend ready (using {})", kind);
    Ok(stores)
}
