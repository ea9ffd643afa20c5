//! Request-time ranking of cached articles against a user profile.
//!
//! An article's relevance is the mean cosine similarity between its embedding
//! and every vector of the profile. Articles are ordered by descending
//! relevance with a stable sort, so equal scores keep their cache order.
//! Articles that carry no embedding are not scored: they follow the scored
//! ones, still in cache order. An empty profile leaves the input untouched.

use std::cmp::Ordering;

use crate::types::{Article, Embedding};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredArticle {
    pub article: Article,
    /// `None` when the article has no embedding or the profile is empty
    pub score: Option<f32>,
}

/// Cosine similarity of two vectors. Vectors of different length, empty
/// vectors and zero-norm vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    let similarity = dot / denom;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Mean similarity of `embedding` to every profile vector.
pub fn relevance(profile: &[Embedding], embedding: &[f32]) -> f32 {
    if profile.is_empty() {
        return 0.0;
    }
    let total: f32 = profile
        .iter()
        .map(|vector| cosine_similarity(vector, embedding))
        .sum();
    total / profile.len() as f32
}

/// Scores every article in input order without reordering.
pub fn score_articles(articles: Vec<Article>, profile: &[Embedding]) -> Vec<ScoredArticle> {
    articles
        .into_iter()
        .map(|article| {
            let score = match (&article.embedding, profile.is_empty()) {
                (Some(embedding), false) => Some(relevance(profile, embedding)),
                _ => None,
            };
            ScoredArticle { article, score }
        })
        .collect()
}

pub fn rank_scored(articles: Vec<Article>, profile: &[Embedding]) -> Vec<ScoredArticle> {
    let mut scored = score_articles(articles, profile);
    if profile.is_empty() {
        return scored;
    }

    // Vec::sort_by is stable.
    scored.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    scored
}

pub fn rank_articles(articles: Vec<Article>, profile: &[Embedding]) -> Vec<Article> {
    rank_scored(articles, profile)
        .into_iter()
        .map(|scored| scored.article)
        .collect()
}
