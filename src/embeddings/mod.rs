//! Chunk embedding: the provider trait, the offline hashing provider, the
//! networked providers, and `Embedder` which attaches vectors to CHUNK nodes.

mod config;
#[cfg(feature = "fastembed")]
mod fastembed_provider;
mod hash;
mod openai_provider;
mod provider;
mod registry;

pub use config::{EmbeddingsConfig, FastEmbedConfig, OpenAIConfig, ProviderType};
#[cfg(feature = "fastembed")]
pub use fastembed_provider::FastEmbedProvider;
pub use hash::{HashEmbedder, HASH_PROVIDER_NAME};
pub use openai_provider::OpenAIProvider;
pub use provider::{EmbeddingProvider, HealthStatus, ProviderCapabilities};
pub use registry::{ProviderFactory, ResolvedProvider};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::graph::{CodeGraph, NodeKind};
use crate::metrics::EMBEDDING_FAILURES;
use crate::text;

/// Summary of one embedding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedReport {
    pub embedded: usize,
    /// Chunks left without a vector because their batch failed
    pub failed: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Attaches embeddings to CHUNK nodes in batches.
///
/// A failing batch is logged and skipped; its chunks stay unembedded and the
/// pass carries on. Re-running with the same provider produces the same
/// vectors.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let batch_size = batch_size.clamp(1, provider.max_batch_size().max(1));
        Self {
            provider,
            batch_size,
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimension(&self) -> usize {
        self.provider.embedding_dimension()
    }

    /// Embed every CHUNK node's code in graph order.
    ///
    /// Code longer than the provider's `max_text_length` is truncated; the
    /// node itself keeps the full text.
    pub async fn embed_graph(&self, graph: &mut CodeGraph) -> EmbedReport {
        let capabilities = self.provider.capabilities();
        let pending: Vec<(String, String)> = graph
            .nodes_of_kind(NodeKind::Chunk)
            .map(|n| {
                let code = n.code.as_deref().unwrap_or_default();
                (n.id.clone(), text::truncate(code, capabilities.max_text_length))
            })
            .collect();
        debug!(
            provider = self.provider.provider_name(),
            local = capabilities.is_local,
            chunks = pending.len(),
            "embedding chunks"
        );

        let mut report = EmbedReport::default();
        for batch in pending.chunks(self.batch_size) {
            report.batches += 1;
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();

            match self.embed_batch(&texts).await {
                Ok(vectors) => {
                    for ((id, _), vector) in batch.iter().zip(vectors) {
                        if let Some(node) = graph.node_mut(id) {
                            node.embedding = Some(vector);
                            report.embedded += 1;
                        }
                    }
                }
                Err(e) => {
                    EMBEDDING_FAILURES.inc();
                    warn!(
                        provider = self.provider.provider_name(),
                        chunks = batch.len(),
                        "embedding batch failed, chunks left unembedded: {:#}",
                        e
                    );
                    report.failed += batch.len();
                    report.failed_batches += 1;
                }
            }
        }

        debug!(
            embedded = report.embedded,
            failed = report.failed,
            "embedding pass finished"
        );
        report
    }

    /// Embed one batch, checking the provider kept its contract.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let vectors = self.provider.embed(texts).await?;
        if vectors.len() != texts.len() {
            anyhow::bail!("provider returned {} vectors for {} texts", vectors.len(), texts.len());
        }
        let dimension = self.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            anyhow::bail!("provider returned a {}-dim vector, expected {}", bad.len(), dimension);
        }
        Ok(vectors)
    }
}
