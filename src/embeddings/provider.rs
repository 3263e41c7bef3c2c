use anyhow::Result;
use async_trait::async_trait;

/// Core trait for embedding providers.
///
/// Callers depend only on `embedding_dimension`, never on which backend
/// produced a vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single query
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>>;

    fn embedding_dimension(&self) -> usize;

    /// Name recorded in the embeddings index so a reader can rebuild the provider
    fn provider_name(&self) -> &'static str;

    fn max_batch_size(&self) -> usize;

    /// Check if provider is ready to serve requests
    async fn health_check(&self) -> Result<HealthStatus>;

    fn capabilities(&self) -> ProviderCapabilities;
}

/// Provider capabilities for feature detection
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    pub is_local: bool,
    /// Approximate input limit in characters; longer chunk text is cut
    /// before it is sent
    pub max_text_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded { reason: String },
    Unhealthy { error: String },
}

impl HealthStatus {
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy { .. })
    }
}
