use anyhow::Result;
use async_trait::async_trait;
use std::time::Instant;

use super::provider::{EmbeddingProvider, HealthStatus, ProviderCapabilities};
use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS};

pub const HASH_PROVIDER_NAME: &str = "hash";

/// Offline embedder: every byte of the text is hashed into one of `dimension`
/// buckets, bucket counts are accumulated and the vector is L2-normalized.
///
/// Deterministic and dependency-free. Empty text yields the zero vector.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, byte: u8) -> usize {
        let mixed = (u64::from(byte) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        ((mixed >> 32) % self.dimension as u64) as usize
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for byte in text.bytes() {
            vector[self.bucket(byte)] += 1.0;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in vector.iter_mut() {
                *v /= magnitude;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();
        let vectors = texts.iter().map(|t| self.embed_text(t)).collect();
        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(query))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &'static str {
        HASH_PROVIDER_NAME
    }

    fn max_batch_size(&self) -> usize {
        4096
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus::Healthy)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            is_local: true,
            max_text_length: usize::MAX,
        }
    }
}
