use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::traits::{top_k, ScoredNode, Search};
use crate::embeddings::EmbeddingProvider;
use crate::graph::NodeKind;
use crate::storage::LoadedIndex;

/// Semantic ranking: cosine similarity between the query embedding and
/// every embedded CHUNK node.
pub struct VectorSearch {
    index: Arc<LoadedIndex>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl VectorSearch {
    pub fn new(index: Arc<LoadedIndex>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, provider }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }
}

#[async_trait]
impl Search for VectorSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredNode>> {
        let query_vector = self
            .provider
            .embed_query(query)
            .await
            .with_context(|| format!("Failed to embed query: {}", query))?;

        debug!("Generated query embedding with {} dimensions", query_vector.len());

        let scored: Vec<ScoredNode> = self
            .index
            .graph
            .nodes_of_kind(NodeKind::Chunk)
            .filter_map(|node| {
                let embedding = node.embedding.as_ref()?;
                Some(ScoredNode {
                    id: node.id.clone(),
                    score: cosine_similarity(&query_vector, embedding),
                })
            })
            .collect();

        Ok(top_k(scored, limit))
    }

    fn search_type(&self) -> &'static str {
        "semantic"
    }
}

/// Cosine similarity; 0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
