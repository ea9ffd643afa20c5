use nr_core::{
    Article, ArticleFetcher, ArticleStore, Bucket, Category, Error, FailurePolicy, Result,
};
use nr_inference::EmbeddingGenerator;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::newsapi::NewsEndpoints;
use crate::shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};

#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Sleep after each cycle
    pub interval: Duration,
    /// Throttle before each category fetch
    pub category_delay: Duration,
    /// Articles kept per listing
    pub max_articles: usize,
    /// Limit on any single fetch, embed or store call
    pub call_timeout: Duration,
    pub categories: Vec<Category>,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            category_delay: Duration::from_secs(10),
            max_articles: 200,
            call_timeout: Duration::from_secs(30),
            categories: Category::ALL.to_vec(),
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub top_headlines: usize,
    pub mix_headlines: usize,
    /// Listings that failed and contributed nothing
    pub failed: Vec<String>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

async fn with_timeout<T, F>(what: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(format!("{} exceeded {:?}", what, limit)))?
}

/// Keeps the `top-headlines` and `mix-headlines` buckets populated.
pub struct CacheRefresher {
    fetcher: Arc<dyn ArticleFetcher>,
    embedder: EmbeddingGenerator,
    store: Arc<dyn ArticleStore>,
    endpoints: NewsEndpoints,
    config: RefresherConfig,
    policy: FailurePolicy,
}

impl CacheRefresher {
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        embedder: EmbeddingGenerator,
        store: Arc<dyn ArticleStore>,
        endpoints: NewsEndpoints,
        config: RefresherConfig,
    ) -> Self {
        Self {
            fetcher,
            embedder,
            store,
            endpoints,
            config,
            policy: FailurePolicy::BestEffort,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &RefresherConfig {
        &self.config
    }

    async fn fetch_embedded(&self, url: &str, signal: &mut ShutdownSignal) -> Result<Vec<Article>> {
        let limit = self.config.call_timeout;
        let listing = signal
            .guard(with_timeout("fetch", limit, self.fetcher.fetch(url)))
            .await?;

        let mut articles = listing.articles;
        articles.truncate(self.config.max_articles);
        signal
            .guard(with_timeout("embed", limit, self.embedder.embed_articles(articles)))
            .await
    }

    /// Apply the failure policy to one listing, noting it in the report if it
    /// contributed nothing because of an error.
    fn contribution(
        &self,
        label: &str,
        result: Result<Vec<Article>>,
        report: &mut CycleReport,
    ) -> Result<Vec<Article>> {
        let failed = result.is_err();
        let articles = self.policy.apply(label, result)?;
        if failed {
            report.failed.push(label.to_string());
        }
        Ok(articles)
    }

    async fn replace(
        &self,
        bucket: Bucket,
        articles: &[Article],
        signal: &mut ShutdownSignal,
    ) -> Result<()> {
        // An empty write would wipe the previous snapshot
        if articles.is_empty() {
            warn!(bucket = %bucket, "Nothing fetched, keeping previous snapshot");
            return Ok(());
        }
        let written = signal
            .guard(with_timeout(
                "store",
                self.config.call_timeout,
                self.store.put_bucket(bucket, articles),
            ))
            .await;
        self.policy.apply(bucket.as_str(), written)?;
        info!(bucket = %bucket, articles = articles.len(), "💾 Bucket replaced");
        Ok(())
    }

    /// One full pass: top headlines, then every category on top of them.
    pub async fn run_cycle(&self, signal: &mut ShutdownSignal) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let url = self.endpoints.top_headlines();
        let fetched = self.fetch_embedded(&url, signal).await;
        let top = self.contribution(Bucket::TopHeadlines.as_str(), fetched, &mut report)?;
        report.top_headlines = top.len();
        self.replace(Bucket::TopHeadlines, &top, signal).await?;

        let mut mix = top;
        for category in &self.config.categories {
            signal.sleep(self.config.category_delay).await?;

            let url = self.endpoints.category(*category);
            let fetched = self.fetch_embedded(&url, signal).await;
            let mut articles = self.contribution(category.as_str(), fetched, &mut report)?;
            debug!(category = %category, articles = articles.len(), "Category fetched");
            mix.append(&mut articles);
        }

        report.mix_headlines = mix.len();
        self.replace(Bucket::MixHeadlines, &mix, signal).await?;
        Ok(report)
    }

    /// Refresh until `signal` fires. Cycle failures are logged and retried
    /// after the usual interval.
    pub async fn run(self, mut signal: ShutdownSignal) {
        info!(
            interval = ?self.config.interval,
            categories = self.config.categories.len(),
            model = self.embedder.model_name(),
            "🔄 Cache refresher started"
        );

        loop {
            match self.run_cycle(&mut signal).await {
                Ok(report) if report.is_clean() => info!(
                    top = report.top_headlines,
                    mix = report.mix_headlines,
                    "✅ Refresh cycle complete"
                ),
                Ok(report) => warn!(
                    top = report.top_headlines,
                    mix = report.mix_headlines,
                    failed = ?report.failed,
                    "Refresh cycle complete with failures"
                ),
                Err(e) if e.is_cancelled() => break,
                Err(e) => error!(error = %e, "❌ Refresh cycle failed"),
            }

            if signal.sleep(self.config.interval).await.is_err() {
                break;
            }
        }

        info!("🛑 Cache refresher stopped");
    }

    /// Start the loop on the runtime. The returned handle owns the only
    /// shutdown trigger.
    pub fn spawn(self) -> RefresherHandle {
        let (trigger, signal) = shutdown_channel();
        RefresherHandle {
            trigger,
            task: tokio::spawn(self.run(signal)),
        }
    }
}

#[derive(Debug)]
pub struct RefresherHandle {
    trigger: ShutdownTrigger,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop and wait up to `grace` for it to exit, aborting it
    /// otherwise. Returns whether it stopped on its own.
    pub async fn shutdown(self, grace: Duration) -> bool {
        self.trigger.trigger();
        let abort = self.task.abort_handle();

        match tokio::time::timeout(grace, self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(error = %e, "Cache refresher task failed");
                false
            }
            Err(_) => {
                warn!(grace = ?grace, "Cache refresher did not stop in time, aborting");
                abort.abort();
                false
            }
        }
    }
}
