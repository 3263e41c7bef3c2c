use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::config::{EmbeddingsConfig, ProviderType};
use super::hash::{HashEmbedder, HASH_PROVIDER_NAME};
use super::openai_provider::{OpenAIProvider, OPENAI_PROVIDER_NAME};
use super::provider::{EmbeddingProvider, HealthStatus};

/// Builds embedding providers from configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the configured provider without probing it.
    pub fn create(config: &EmbeddingsConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        Self::create_type(config.provider, config)
    }

    pub fn create_type(
        provider_type: ProviderType,
        config: &EmbeddingsConfig,
    ) -> Result<Arc<dyn EmbeddingProvider>> {
        match provider_type {
            ProviderType::Hash => Ok(Arc::new(HashEmbedder::new(config.dimension))),
            ProviderType::OpenAI => Ok(Arc::new(OpenAIProvider::new(
                &config.openai,
                config.batch_size,
                Duration::from_secs(config.timeout_secs),
            )?)),
            #[cfg(feature = "fastembed")]
            ProviderType::FastEmbed => Ok(Arc::new(
                super::fastembed_provider::FastEmbedProvider::new(
                    &config.fastembed,
                    config.batch_size,
                )?,
            )),
            #[cfg(not(feature = "fastembed"))]
            ProviderType::FastEmbed => Err(anyhow!(
                "fastembed provider requested but the `fastembed` feature is not enabled"
            )),
        }
    }

    /// Create the configured provider and make sure it answers.
    ///
    /// Anything other than the offline provider is probed once, bounded by
    /// `timeout_secs`. On any failure the whole run falls back to the offline
    /// provider so one index never mixes dimensionalities.
    pub async fn create_with_fallback(config: &EmbeddingsConfig) -> ResolvedProvider {
        if config.provider == ProviderType::Hash {
            return ResolvedProvider::offline(config.dimension, None);
        }

        let provider = match Self::create(config) {
            Ok(provider) => provider,
            Err(e) => {
                warn!("Embedding provider {} unavailable: {:#}", config.provider, e);
                return ResolvedProvider::offline(config.dimension, Some(format!("{:#}", e)));
            }
        };

        let probe = tokio::time::timeout(
            Duration::from_secs(config.timeout_secs.max(1)),
            provider.health_check(),
        )
        .await;

        let failure = match probe {
            Ok(Ok(status)) if status.is_usable() => {
                if let HealthStatus::Degraded { reason } = &status {
                    warn!(
                        "Embedding provider {} is degraded: {}",
                        provider.provider_name(),
                        reason
                    );
                }
                info!(
                    provider = provider.provider_name(),
                    dimension = provider.embedding_dimension(),
                    "using embedding provider"
                );
                return ResolvedProvider {
                    provider,
                    fallback_reason: None,
                };
            }
            Ok(Ok(status)) => format!("{:?}", status),
            Ok(Err(e)) => format!("{:#}", e),
            Err(_) => format!("health check timed out after {}s", config.timeout_secs),
        };

        warn!(
            "Embedding provider {} failed its probe ({}), falling back to offline hashing",
            config.provider, failure
        );
        ResolvedProvider::offline(config.dimension, Some(failure))
    }

    /// Rebuild the provider that produced a persisted index.
    ///
    /// Fails if the recorded provider cannot be created or would produce
    /// vectors of a different length.
    pub fn for_index(
        provider_name: &str,
        dimension: usize,
        config: &EmbeddingsConfig,
    ) -> Result<Arc<dyn EmbeddingProvider>> {
        let provider: Arc<dyn EmbeddingProvider> = match provider_name {
            HASH_PROVIDER_NAME => Arc::new(HashEmbedder::new(dimension)),
            OPENAI_PROVIDER_NAME => Self::create_type(ProviderType::OpenAI, config)?,
            other => {
                let provider_type = ProviderType::parse(other).ok_or_else(|| {
                    anyhow!("Unknown embedding provider recorded in index: {}", other)
                })?;
                Self::create_type(provider_type, config)?
            }
        };

        if provider.embedding_dimension() != dimension {
            return Err(anyhow!(
                "Provider {} produces {} dimensions but the index holds {}",
                provider_name,
                provider.embedding_dimension(),
                dimension
            ));
        }
        Ok(provider)
    }
}

/// Outcome of provider construction.
pub struct ResolvedProvider {
    pub provider: Arc<dyn EmbeddingProvider>,
    /// Set when the configured provider was replaced by the offline one
    pub fallback_reason: Option<String>,
}

impl ResolvedProvider {
    fn offline(dimension: usize, fallback_reason: Option<String>) -> Self {
        Self {
            provider: Arc::new(HashEmbedder::new(dimension)),
            fallback_reason,
        }
    }

    pub fn fell_back(&self) -> bool {
        self.fallback_reason.is_some()
    }
}
