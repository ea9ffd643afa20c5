pub mod codec;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod models;
pub mod policy;
pub mod ranking;
pub mod storage;
pub mod types;

pub use error::{Error, ErrorKind};
pub use feed::Feed;
pub use fetcher::ArticleFetcher;
pub use models::EmbeddingProvider;
pub use policy::FailurePolicy;
pub use ranking::{cosine_similarity, rank_articles};
pub use storage::{ArticleStore, ProfileStore};
pub use types::{Article, Bucket, Category, Embedding, NewsApiResponse, Source, PROFILE_CAPACITY};

pub type Result<T> = std::result::Result<T, Error>;
