use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::config::FastEmbedConfig;
use super::provider::{EmbeddingProvider, HealthStatus, ProviderCapabilities};
use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS};

pub const FASTEMBED_PROVIDER_NAME: &str = "fastembed";

/// Local ONNX embedding models via fastembed.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    batch_size: usize,
}

impl FastEmbedProvider {
    /// Load the configured model, downloading it on first use.
    pub fn new(config: &FastEmbedConfig, batch_size: usize) -> Result<Self> {
        let model_type = Self::parse_model_name(&config.model);

        info!("Loading embedding model: {}", config.model);

        let mut options = InitOptions::new(model_type).with_show_download_progress(false);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }
        let model = TextEmbedding::try_new(options)
            .with_context(|| format!("Failed to initialize embedding model: {}", config.model))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: config.model.clone(),
            batch_size: batch_size.max(1),
        })
    }

    fn parse_model_name(name: &str) -> EmbeddingModel {
        match name {
            "nomic-embed-text-v1.5" | "nomic-embed-text" => EmbeddingModel::NomicEmbedTextV15,
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
            "bge-small-en-v1.5" | "bge-small" => EmbeddingModel::BGESmallENV15,
            "bge-base-en-v1.5" | "bge-base" => EmbeddingModel::BGEBaseENV15,
            _ => {
                warn!("Unknown model '{}', falling back to bge-small-en-v1.5", name);
                EmbeddingModel::BGESmallENV15
            }
        }
    }

    fn model_dimension(model_name: &str) -> usize {
        match model_name {
            name if name.contains("bge-base") || name.contains("nomic") => 768,
            _ => 384,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        // fastembed is synchronous and CPU bound
        let model = self.model.clone();
        let texts = texts.to_vec();
        let batch_size = self.batch_size;
        let embeddings = tokio::task::spawn_blocking(move || {
            model
                .embed(texts, Some(batch_size))
                .context("Failed to generate embeddings")
        })
        .await
        .context("FastEmbed processing task failed")??;

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());
        Ok(embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding generated for query"))
    }

    fn embedding_dimension(&self) -> usize {
        Self::model_dimension(&self.model_name)
    }

    fn provider_name(&self) -> &'static str {
        FASTEMBED_PROVIDER_NAME
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        match self.embed_query("health check").await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy {
                error: e.to_string(),
            }),
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            is_local: true,
            max_text_length: 512 * 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dimension() {
        assert_eq!(FastEmbedProvider::model_dimension("bge-small-en-v1.5"), 384);
        assert_eq!(FastEmbedProvider::model_dimension("bge-base-en-v1.5"), 768);
        assert_eq!(FastEmbedProvider::model_dimension("nomic-embed-text-v1.5"), 768);
    }

    #[tokio::test]
    #[ignore] // Downloads model weights
    async fn test_embed_texts() {
        let provider = FastEmbedProvider::new(&FastEmbedConfig::default(), 8).unwrap();
        let vectors = provider
            .embed(&["fn main() {}".to_string(), "def main(): pass".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), provider.embedding_dimension());
    }
}
