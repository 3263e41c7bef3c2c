use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::traits::{top_k, ScoredNode, Search};
use crate::storage::{tokenize, LoadedIndex};

/// Token-overlap ranking over the inverted index.
///
/// A node scores one point per query token it contains (a repeated query
/// token weighs once per occurrence), plus one when its lower-cased name
/// equals the whole normalized query.
pub struct LexicalSearch {
    index: Arc<LoadedIndex>,
}

impl LexicalSearch {
    pub fn new(index: Arc<LoadedIndex>) -> Self {
        Self { index }
    }

    pub fn rank(&self, query: &str, limit: usize) -> Vec<ScoredNode> {
        let counts = self.index.inverted.match_counts(query);
        if counts.is_empty() {
            return Vec::new();
        }
        let normalized = tokenize(query).join(" ");

        // Graph order gives the tie-break.
        let scored: Vec<ScoredNode> = self
            .index
            .graph
            .nodes()
            .iter()
            .filter_map(|node| {
                let hits = *counts.get(node.id.as_str())?;
                let boost = usize::from(node.name.to_lowercase() == normalized);
                Some(ScoredNode {
                    id: node.id.clone(),
                    score: (hits + boost) as f32,
                })
            })
            .collect();

        debug!(query, candidates = scored.len(), "lexical ranking");
        top_k(scored, limit)
    }
}

#[async_trait]
impl Search for LexicalSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredNode>> {
        Ok(self.rank(query, limit))
    }

    fn search_type(&self) -> &'static str {
        "lexical"
    }
}
