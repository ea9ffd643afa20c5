use anyhow::Context;
use clap::Parser;
use nr_core::{Bucket, FailurePolicy, Feed};
use nr_fetch::{
    shutdown_channel, CacheRefresher, NewsApiFetcher, NewsEndpoints, ShutdownTrigger,
};
use nr_inference::{create_model, EmbeddingGenerator};
use nr_storage::{create_storage, Stores};
use nr_web::{create_app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod config;
mod logging;

use config::{HumanDuration, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about = "News cache refresher and personalized ranking service", long_about = None)]
pub struct Cli {
    /// Storage backend: redis or memory
    #[arg(long, default_value = "redis")]
    storage: String,
    /// Override BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Embedding provider: ollama, openai or dummy. Overrides EMBEDDING_PROVIDER
    #[arg(long)]
    model: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API with the cache refresher running in the background
    Serve,
    /// Run the cache refresher in the foreground
    Refresh {
        /// Run a single cycle and print its report
        #[arg(long)]
        once: bool,
        /// Abort the cycle on the first failed listing
        #[arg(long)]
        strict: bool,
        /// Pause between cycles (e.g. 10s, 5m). Overrides REFRESH_INTERVAL_SECS
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Print the mixed bucket as ranked for a user
    Rank {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Connect and ping the storage backend. Redis gets a few attempts so the
/// service can start alongside its cache.
async fn connect_storage(kind: &str, settings: &Settings) -> anyhow::Result<Stores> {
    const MAX_RETRIES: u32 = 3;
    if kind != "redis" {
        return Ok(create_storage(kind, None).await?);
    }

    let mut last_error = None;
    for attempt in 1..=MAX_RETRIES {
        let connecting = create_storage(kind, Some(&settings.redis_url));
        let result = match tokio::time::timeout(Duration::from_secs(10), connecting).await {
            Ok(result) => result,
            Err(_) => Err(nr_core::Error::Timeout("storage connection".to_string())),
        };
        match result {
            Ok(stores) => return Ok(stores),
            Err(e) => {
                warn!(attempt, error = %e, "Storage initialization failed");
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    }

    Err(last_error
        .map(anyhow::Error::from)
        .unwrap_or_else(|| anyhow::anyhow!("Storage initialization failed after all retries")))
}

fn embedder(settings: &Settings, model: Option<&str>) -> anyhow::Result<EmbeddingGenerator> {
    let kind = model.unwrap_or(&settings.embedding_provider);
    let model = create_model(kind, settings.inference.clone())
        .with_context(|| format!("failed to set up embedding provider {}", kind))?;
    Ok(EmbeddingGenerator::new(model))
}

/// Pull `trigger` on Ctrl-C (or SIGTERM on unix).
fn trigger_on_signal(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("🛑 Shutdown requested");
}

async fn serve(cli: &Cli, settings: &Settings) -> anyhow::Result<()> {
    settings.require_news_api_key()?;
    let stores = connect_storage(&cli.storage, settings).await?;
    let fetcher = Arc::new(NewsApiFetcher::new(&settings.news)?);
    let endpoints = NewsEndpoints::new(&settings.news)?;

    let refresher = CacheRefresher::new(
        fetcher.clone(),
        embedder(settings, cli.model.as_deref())?,
        stores.articles.clone(),
        endpoints.clone(),
        settings.refresher.clone(),
    )
    .spawn();

    let state = AppState {
        feed: Feed::new(stores.articles.clone(), stores.profiles.clone()),
        fetcher,
        endpoints,
        articles: stores.articles.clone(),
    };
    let app = create_app(state, &settings.web);
    let bind_addr = cli.bind.unwrap_or(settings.web.bind_addr);

    let served = nr_web::serve(app, bind_addr, shutdown_signal()).await;

    if !refresher.shutdown(settings.shutdown_grace).await {
        warn!("Cache refresher was aborted");
    }
    served?;
    info!("👋 Bye");
    Ok(())
}

async fn refresh(
    cli: &Cli,
    settings: &Settings,
    once: bool,
    strict: bool,
    interval: Option<HumanDuration>,
) -> anyhow::Result<()> {
    settings.require_news_api_key()?;
    let stores = connect_storage(&cli.storage, settings).await?;

    let mut refresher_config = settings.refresher.clone();
    if let Some(interval) = interval {
        refresher_config.interval = interval.0;
    }
    let policy = if strict {
        FailurePolicy::Strict
    } else {
        FailurePolicy::BestEffort
    };

    let refresher = CacheRefresher::new(
        Arc::new(NewsApiFetcher::new(&settings.news)?),
        embedder(settings, cli.model.as_deref())?,
        stores.articles,
        NewsEndpoints::new(&settings.news)?,
        refresher_config,
    )
    .with_policy(policy);

    let (trigger, mut signal) = shutdown_channel();
    trigger_on_signal(trigger);

    if !once {
        refresher.run(signal).await;
        return Ok(());
    }

    let report = refresher.run_cycle(&mut signal).await?;
    println!("{}: {} articles", Bucket::TopHeadlines, report.top_headlines);
    println!("{}: {} articles", Bucket::MixHeadlines, report.mix_headlines);
    if !report.is_clean() {
        println!("failed: {}", report.failed.join(", "));
    }
    Ok(())
}

async fn rank(cli: &Cli, settings: &Settings, user: &str, limit: usize) -> anyhow::Result<()> {
    let stores = connect_storage(&cli.storage, settings).await?;
    let feed = Feed::new(stores.articles, stores.profiles).with_read_policy(FailurePolicy::Strict);

    let articles = feed.ranked(user, Bucket::MixHeadlines).await?;
    if articles.is_empty() {
        println!("No cached articles in {}", Bucket::MixHeadlines);
        return Ok(());
    }
    for (i, article) in articles.iter().take(limit).enumerate() {
        println!(
            "{:>3}. {} ({}, {})",
            i + 1,
            article.title,
            article.source.name,
            article.published_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    logging::init_logging(&settings.log_level);
    info!(env = %settings.app_env, storage = %cli.storage, "🚀 Starting newsrec");

    match &cli.command {
        Commands::Serve => serve(&cli, &settings).await,
        Commands::Refresh {
            once,
            strict,
            interval,
        } => refresh(&cli, &settings, *once, *strict, *interval).await,
        Commands::Rank { user, limit } => rank(&cli, &settings, user, *limit).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_refresh_flags() {
        let cli = Cli::try_parse_from([
            "newsrec", "--storage", "memory", "--model", "dummy", "refresh", "--once",
            "--interval", "1m",
        ])
        .unwrap();
        assert_eq!(cli.storage, "memory");
        assert_eq!(cli.model.as_deref(), Some("dummy"));
        match cli.command {
            Commands::Refresh {
                once,
                strict,
                interval,
            } => {
                assert!(once);
                assert!(!strict);
                assert_eq!(interval, Some(HumanDuration(Duration::from_secs(60))));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rank_requires_user() {
        assert!(Cli::try_parse_from(["newsrec", "rank"]).is_err());
    }

    #[tokio::test]
    async fn test_unknown_storage_fails_fast() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        let started = std::time::Instant::now();
        assert!(connect_storage("cassandra", &settings).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_memory_rank_on_empty_cache() {
        let cli = Cli::try_parse_from(["newsrec", "--storage", "memory", "rank", "--user", "u"])
            .unwrap();
        let settings = Settings::from_lookup(|_| None).unwrap();
        rank(&cli, &settings, "u", 5).await.unwrap();
    }
}
