//! JSON layout of cached values: a bucket is one JSON array of articles, a
//! profile entry is one JSON float array.

use crate::types::{Article, Embedding};
use crate::Result;

pub fn encode_bucket(articles: &[Article]) -> Result<String> {
    Ok(serde_json::to_string(articles)?)
}

pub fn decode_bucket(raw: &str) -> Result<Vec<Article>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_embedding(embedding: &[f32]) -> Result<String> {
    Ok(serde_json::to_string(embedding)?)
}

pub fn decode_embedding(raw: &str) -> Result<Embedding> {
    Ok(serde_json::from_str(raw)?)
}
