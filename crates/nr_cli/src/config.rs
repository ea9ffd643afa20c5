use anyhow::{anyhow, Context};
use nr_core::Category;
use nr_fetch::{NewsApiConfig, RefresherConfig};
use nr_web::WebConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Duration written as `90`, `30s`, `5m`, `1h15m30s` or `1d`. A bare number
/// means seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_value = false;

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            let num = match current_number.parse::<u64>() {
                Ok(num) => num,
                Err(_) => return Err(format!("Invalid duration: {}", s)),
            };
            total_seconds += match c {
                's' => num,
                'm' => num * 60,
                'h' => num * 3600,
                'd' => num * 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            current_number.clear();
            has_value = true;
        }

        if !current_number.is_empty() {
            total_seconds += current_number
                .parse::<u64>()
                .map_err(|_| format!("Invalid duration: {}", s))?;
            has_value = true;
        }

        if !has_value {
            return Err("Duration must include a number".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

/// Process settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_env: String,
    pub log_level: String,
    pub redis_url: String,
    pub news: NewsApiConfig,
    pub embedding_provider: String,
    pub inference: nr_inference::Config,
    pub refresher: RefresherConfig,
    pub web: WebConfig,
    pub shutdown_grace: Duration,
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let duration = |key: &str, default: u64| -> anyhow::Result<Duration> {
            Ok(parse_or(lookup(key), key, HumanDuration(Duration::from_secs(default)))?.0)
        };

        let news = NewsApiConfig {
            base_url: lookup("NEWS_API_BASE_URL")
                .unwrap_or_else(|| nr_fetch::newsapi::DEFAULT_NEWS_API_URL.to_string()),
            api_key: lookup("NEWS_API_KEY").unwrap_or_default(),
            country: lookup("NEWS_COUNTRY")
                .unwrap_or_else(|| nr_fetch::newsapi::DEFAULT_COUNTRY.to_string()),
            timeout: duration("UPSTREAM_TIMEOUT_SECS", 30)?,
        };

        let inference = nr_inference::Config {
            api_key: lookup("EMBEDDING_API_KEY"),
            model_name: lookup("EMBEDDING_MODEL"),
            base_url: lookup("EMBEDDING_BASE_URL"),
            dimension: parse_or(
                lookup("EMBEDDING_DIM"),
                "EMBEDDING_DIM",
                nr_inference::DEFAULT_DIMENSION,
            )?,
            timeout: news.timeout,
            ..nr_inference::Config::default()
        };

        let categories = match lookup("REFRESH_CATEGORIES") {
            Some(raw) => raw
                .split(',')
                .map(|c| c.trim().parse::<Category>())
                .collect::<nr_core::Result<Vec<_>>>()
                .context("invalid value for REFRESH_CATEGORIES")?,
            None => Category::ALL.to_vec(),
        };

        let refresher = RefresherConfig {
            interval: duration("REFRESH_INTERVAL_SECS", 10)?,
            category_delay: duration("CATEGORY_DELAY_SECS", 10)?,
            max_articles: parse_or(lookup("MAX_ARTICLES_PER_FETCH"), "MAX_ARTICLES_PER_FETCH", 200)?,
            call_timeout: news.timeout,
            categories,
        };

        let mut web = WebConfig::default();
        web.bind_addr = parse_or::<SocketAddr>(lookup("BIND_ADDR"), "BIND_ADDR", web.bind_addr)?;
        if let Some(origins) = lookup("CORS_ORIGINS") {
            web.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(Self {
            app_env: lookup("APP_ENV").unwrap_or_else(|| "production".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            news,
            embedding_provider: lookup("EMBEDDING_PROVIDER").unwrap_or_else(|| "ollama".to_string()),
            inference,
            refresher,
            web,
            shutdown_grace: duration("SHUTDOWN_GRACE_SECS", 5)?,
        })
    }

    /// Commands that talk to the news provider need a key.
    pub fn require_news_api_key(&self) -> anyhow::Result<()> {
        if self.news.api_key.is_empty() {
            return Err(anyhow!("NEWS_API_KEY must be set"));
        }
        Ok(())
    }
}
