use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nr_core::{Article, Bucket, Category, Embedding};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

pub async fn top_headlines(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.feed.bucket(Bucket::TopHeadlines).await?;
    info!(articles = articles.len(), "Serving top headlines");
    Ok(Json(articles))
}

pub async fn category_headlines(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Article>>> {
    let category: Category = category.parse()?;
    let listing = state.fetcher.fetch(&state.endpoints.category(category)).await?;
    Ok(Json(listing.articles))
}

pub async fn source_headlines(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> ApiResult<Json<Vec<Article>>> {
    let listing = state.fetcher.fetch(&state.endpoints.sources(&source)).await?;
    Ok(Json(listing.articles))
}

pub async fn everything_topic(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
) -> ApiResult<Json<Vec<Article>>> {
    let listing = state.fetcher.fetch(&state.endpoints.everything(&topic)).await?;
    Ok(Json(listing.articles))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub user_id: String,
}

/// Mixed bucket ordered for the user.
pub async fn personalized(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.feed.ranked(&query.user_id, Bucket::MixHeadlines).await?;
    Ok(Json(articles))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_id: String,
    pub embedding: Embedding,
}

pub async fn store_embedding(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserData>,
) -> ApiResult<impl IntoResponse> {
    state.feed.ingest(&payload.user_id, payload.embedding).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "data stored successfully" })),
    ))
}

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    state.articles.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
