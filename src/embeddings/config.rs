use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which embedding backend produces vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Offline byte-bucket hashing, no dependencies
    #[default]
    Hash,
    OpenAI,
    /// Local ONNX models (requires the `fastembed` feature)
    FastEmbed,
}

impl ProviderType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hash" => Some(Self::Hash),
            "openai" => Some(Self::OpenAI),
            "fastembed" => Some(Self::FastEmbed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::OpenAI => "openai",
            Self::FastEmbed => "fastembed",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Embed CHUNK nodes during indexing
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub provider: ProviderType,

    /// Vector length of the hash provider
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Chunks sent to the provider per call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound for a single networked provider call, and for the probe
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub openai: OpenAIConfig,

    #[serde(default)]
    pub fastembed: FastEmbedConfig,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: ProviderType::default(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            openai: OpenAIConfig::default(),
            fastembed: FastEmbedConfig::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_dimension() -> usize {
    256
}

fn default_batch_size() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    30
}

/// FastEmbed provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastEmbedConfig {
    #[serde(default = "default_fastembed_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for FastEmbedConfig {
    fn default() -> Self {
        Self {
            model: default_fastembed_model(),
            cache_dir: None,
        }
    }
}

fn default_fastembed_model() -> String {
    "bge-small-en-v1.5".to_string()
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key, or an environment reference like `${OPENAI_API_KEY}`
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Azure or other compatible endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Requested output dimensionality (text-embedding-3 models only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            organization: None,
            base_url: None,
            dimensions: None,
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_retries() -> usize {
    2
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    5000
}

impl OpenAIConfig {
    /// Resolve the API key from configuration or the environment.
    pub fn load_api_key(&self) -> anyhow::Result<String> {
        use anyhow::Context;

        if !self.api_key.is_empty() && !self.api_key.starts_with("${") {
            return Ok(self.api_key.clone());
        }

        if let Some(var_name) = self
            .api_key
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
        {
            return std::env::var(var_name)
                .with_context(|| format!("Environment variable {} not set", var_name));
        }

        std::env::var("OPENAI_API_KEY")
            .context("No API key configured and OPENAI_API_KEY environment variable not set")
    }
}
