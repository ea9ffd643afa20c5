use async_trait::async_trait;
use nr_core::{ArticleFetcher, Category, Error, NewsApiResponse, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_COUNTRY: &str = "us";

#[derive(Debug, Clone)]
pub struct NewsApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub country: String,
    pub timeout: Duration,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NEWS_API_URL.to_string(),
            api_key: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the provider URLs for each listing the service reads.
#[derive(Debug, Clone)]
pub struct NewsEndpoints {
    base: Url,
    api_key: String,
    country: String,
}

impl NewsEndpoints {
    pub fn new(config: &NewsApiConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            Error::InvalidRequest(format!("Invalid news API URL {}: {}", config.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidRequest(format!(
                "News API URL cannot be a base: {}",
                config.base_url
            )));
        }

        Ok(Self {
            base,
            api_key: config.api_key.clone(),
            country: config.country.clone(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        url.set_path(&format!("{}/{}", self.base.path().trim_end_matches('/'), path));
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("apiKey", &self.api_key);
        }
        url.into()
    }

    pub fn top_headlines(&self) -> String {
        self.endpoint("top-headlines", &[("country", &self.country)])
    }

    pub fn category(&self, category: Category) -> String {
        self.endpoint(
            "top-headlines",
            &[("country", &self.country), ("category", category.as_str())],
        )
    }

    pub fn sources(&self, sources: &str) -> String {
        self.endpoint("top-headlines", &[("sources", sources)])
    }

    pub fn everything(&self, topic: &str) -> String {
        self.endpoint("everything", &[("q", topic)])
    }
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn status_message(body: &str) -> String {
    match serde_json::from_str::<ProviderError>(body) {
        Ok(ProviderError {
            message: Some(message),
            code,
        }) => match code {
            Some(code) => format!("{}: {}", code, message),
            None => message,
        },
        _ => body.chars().take(200).collect(),
    }
}

/// HTTP client for the news provider.
#[derive(Debug, Clone)]
pub struct NewsApiFetcher {
    client: Client,
}

impl NewsApiFetcher {
    pub fn new(config: &NewsApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("newsrec/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleFetcher for NewsApiFetcher {
    async fn fetch(&self, url: &str) -> Result<NewsApiResponse> {
        // Errors drop the URL: it carries the API key.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message: status_message(&body),
            });
        }

        let listing: NewsApiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::UpstreamSchema(format!("invalid listing: {}", e)))?;
        if listing.status != "ok" {
            return Err(Error::UpstreamSchema(format!(
                "unexpected listing status: {}",
                listing.status
            )));
        }

        debug!(
            articles = listing.articles.len(),
            total = listing.total_results,
            "Fetched listing"
        );
        Ok(listing)
    }
}
