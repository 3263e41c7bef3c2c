//! Search trait for the ranking strategies behind the retriever.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A ranked node id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredNode {
    pub id: String,
    pub score: f32,
}

/// Common trait for ranking implementations.
///
/// Implementations rank against an immutable loaded index, so they are safe
/// to share between concurrent callers.
#[async_trait]
pub trait Search: Send + Sync {
    /// Rank nodes for `query`, best first, at most `limit` of them.
    ///
    /// Equal scores keep graph insertion order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredNode>>;

    /// Identifier such as "lexical" or "semantic".
    fn search_type(&self) -> &'static str;
}

/// Stable descending sort by score, then truncate.
pub(crate) fn top_k(mut scored: Vec<ScoredNode>, limit: usize) -> Vec<ScoredNode> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
