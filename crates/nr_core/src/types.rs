use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A fixed-dimension vector produced by the embedding model.
pub type Embedding = Vec<f32>;

/// Maximum number of vectors kept per user profile.
pub const PROFILE_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Source,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub embedding: Option<Embedding>,
}

impl Article {
    /// Text fed to the embedding model: title, description and content
    /// concatenated, absent fields contributing nothing.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}{}{}",
            self.title,
            self.description.as_deref().unwrap_or_default(),
            self.content.as_deref().unwrap_or_default()
        )
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Listing returned by the news provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    pub total_results: u64,
    pub articles: Vec<Article>,
}

/// Named, atomically replaced cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    TopHeadlines,
    MixHeadlines,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::TopHeadlines, Bucket::MixHeadlines];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::TopHeadlines => "top-headlines",
            Bucket::MixHeadlines => "mix-headlines",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("Unknown bucket: {}", s)))
    }
}

/// Provider categories folded into the mix bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Business,
        Category::Entertainment,
        Category::General,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("Unknown category: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_parses_provider_payload() {
        let payload = r#"{
            "source": {"id": null, "name": "Example Wire"},
            "author": null,
            "title": "Markets rally",
            "description": "Stocks rose",
            "url": "https://example.com/a",
            "urlToImage": null,
            "publishedAt": "2024-05-01T12:34:56Z",
            "content": null
        }"#;

        let article: Article = serde_json::from_str(payload).unwrap();
        assert_eq!(article.source.name, "Example Wire");
        assert_eq!(article.description.as_deref(), Some("Stocks rose"));
        assert!(article.embedding.is_none());
        assert_eq!(article.embedding_text(), "Markets rallyStocks rose");
    }

    #[test]
    fn test_article_serializes_camel_case_with_embedding() {
        let payload = r#"{
            "source": {"id": "wire", "name": "Wire"},
            "title": "t",
            "publishedAt": "2024-05-01T12:34:56Z",
            "embedding": [0.5, -1.0]
        }"#;
        let article: Article = serde_json::from_str(payload).unwrap();
        let value = serde_json::to_value(&article).unwrap();

        assert_eq!(value["publishedAt"], "2024-05-01T12:34:56Z");
        assert_eq!(value["embedding"], serde_json::json!([0.5, -1.0]));
        assert!(value.get("urlToImage").is_some());
    }

    #[test]
    fn test_bucket_and_category_names() {
        assert_eq!("top-headlines".parse::<Bucket>().unwrap(), Bucket::TopHeadlines);
        assert_eq!(Bucket::MixHeadlines.to_string(), "mix-headlines");
        assert!("headlines".parse::<Bucket>().is_err());

        assert_eq!("sports".parse::<Category>().unwrap(), Category::Sports);
        assert!("weather".parse::<Category>().is_err());
        assert_eq!(Category::ALL.len(), 7);
    }
}
