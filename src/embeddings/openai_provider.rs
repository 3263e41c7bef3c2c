use anyhow::{anyhow, Context, Result};
use async_openai::{
    config::OpenAIConfig as AsyncOpenAIConfig, types::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::OpenAIConfig;
use super::provider::{EmbeddingProvider, HealthStatus, ProviderCapabilities};
use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS};

pub const OPENAI_PROVIDER_NAME: &str = "openai";

/// Hard API limit on inputs per request
const MAX_INPUTS_PER_REQUEST: usize = 2048;

/// OpenAI (or compatible endpoint) embedding provider.
///
/// Every request is bounded by `timeout`; a request that times out counts as
/// a failed attempt and is retried with exponential backoff.
pub struct OpenAIProvider {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAIConfig,
    batch_size: usize,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(config: &OpenAIConfig, batch_size: usize, timeout: Duration) -> Result<Self> {
        let api_key = config
            .load_api_key()
            .context("Failed to load OpenAI API key")?;

        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(api_key);
        if let Some(org) = &config.organization {
            openai_config = openai_config.with_org_id(org);
        }
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        info!(model = %config.model, "initialized OpenAI embedding provider");

        Ok(Self {
            client: Client::with_config(openai_config),
            config: config.clone(),
            batch_size: batch_size.clamp(1, MAX_INPUTS_PER_REQUEST),
            timeout,
        })
    }

    fn model_dimension(model_name: &str) -> usize {
        match model_name {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    async fn request(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.config.model).input(inputs);
        if let Some(dimensions) = self.config.dimensions {
            args.dimensions(dimensions);
        }
        let request = args.build().context("Failed to build OpenAI request")?;

        self.retry_with_backoff(|| {
            let request = request.clone();
            async move {
                let embeddings = self.client.embeddings();
                let response = tokio::time::timeout(self.timeout, embeddings.create(request))
                    .await
                    .map_err(|_| anyhow!("OpenAI request timed out after {:?}", self.timeout))?
                    .context("OpenAI API request failed")?;
                let mut data = response.data;
                data.sort_by_key(|d| d.index);
                Ok(data.into_iter().map(|d| d.embedding).collect())
            }
        })
        .await
    }

    async fn retry_with_backoff<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff = self.config.initial_backoff_ms;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt >= self.config.max_retries => {
                    return Err(e).context("Max retries exceeded");
                }
                Err(e) => {
                    warn!("OpenAI request failed (attempt {}): {}", attempt + 1, e);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    backoff = backoff.saturating_mul(2).min(self.config.max_backoff_ms);
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.request(batch.to_vec()).await?;
            if vectors.len() != batch.len() {
                return Err(anyhow!(
                    "OpenAI returned {} embeddings for {} inputs",
                    vectors.len(),
                    batch.len()
                ));
            }
            all_embeddings.extend(vectors);
            debug!("embedded {} texts via OpenAI", batch.len());
        }

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());
        Ok(all_embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();
        let vectors = self.request(vec![query.to_string()]).await?;
        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());

        vectors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding returned"))
    }

    fn embedding_dimension(&self) -> usize {
        self.config
            .dimensions
            .map(|d| d as usize)
            .unwrap_or_else(|| Self::model_dimension(&self.config.model))
    }

    fn provider_name(&self) -> &'static str {
        OPENAI_PROVIDER_NAME
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        match self.embed_query("health check").await {
            Ok(v) if v.len() == self.embedding_dimension() => Ok(HealthStatus::Healthy),
            Ok(v) => Ok(HealthStatus::Unhealthy {
                error: format!(
                    "expected {} dimensions, got {}",
                    self.embedding_dimension(),
                    v.len()
                ),
            }),
            Err(e) if e.to_string().contains("rate_limit") => Ok(HealthStatus::Degraded {
                reason: "Rate limited".to_string(),
            }),
            Err(e) => Ok(HealthStatus::Unhealthy {
                error: format!("{:#}", e),
            }),
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            is_local: false,
            max_text_length: 8191 * 4,
        }
    }
}
