use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use nr_core::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost",
    "https://best-news-recom.vercel.app",
    "https://best-news-aggregator.vercel.app",
];

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn create_app(state: AppState, config: &WebConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/top-headlines", get(handlers::top_headlines))
        .route("/top-headlines/:category", get(handlers::category_headlines))
        .route("/top-headlines/sources/:source", get(handlers::source_headlines))
        .route("/everything", get(handlers::personalized))
        .route("/everything/:topic", get(handlers::everything_topic))
        .route("/store", post(handlers::store_embedding))
        .layer(cors_layer(&config.cors_origins))
        .with_state(Arc::new(state))
}

/// Serve `app` until `shutdown` resolves, letting in-flight requests finish.
pub async fn serve<F>(app: Router, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Web server stopped");
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState, WebConfig};
    pub use nr_core::{Article, Error, Result};
}
