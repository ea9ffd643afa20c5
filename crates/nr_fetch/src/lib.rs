pub mod newsapi;
pub mod refresher;
pub mod shutdown;

pub use newsapi::{NewsApiConfig, NewsApiFetcher, NewsEndpoints};
pub use refresher::{CacheRefresher, CycleReport, RefresherConfig, RefresherHandle};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};

pub mod prelude {
    pub use super::{CacheRefresher, NewsApiFetcher, NewsEndpoints, RefresherConfig};
    pub use nr_core::{Article, ArticleFetcher, Error, Result};
}
