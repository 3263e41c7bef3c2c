use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use crate::embeddings::EmbeddingsConfig;

/// Directory under the repository root holding config, logs and the index
pub const INDEX_DIR: &str = ".codegraph";
const CONFIG_FILE: &str = "config.toml";

/// Invalid input detected before any indexing or loading starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository root does not exist or is not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("query text is empty")]
    EmptyQuery,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Maximum lines per CHUNK node
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Directory names and globs skipped in addition to ignore files
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Walk into dot-directories and dot-files
    #[serde(default)]
    pub include_hidden: bool,

    /// Repository-relative globs; when non-empty only matching files are indexed
    #[serde(default)]
    pub filters: Vec<String>,

    /// Number of parse threads (None = one per core)
    #[serde(default)]
    pub parallel_threads: Option<usize>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            ignore_patterns: default_ignore_patterns(),
            include_hidden: false,
            filters: Vec::new(),
            parallel_threads: None,
        }
    }
}

fn default_max_lines() -> usize {
    crate::indexer::DEFAULT_MAX_LINES
}

fn default_ignore_patterns() -> Vec<String> {
    [
        "node_modules",
        "target",
        "dist",
        "build",
        "__pycache__",
        ".venv",
        "venv",
        "vendor",
        "third_party",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of top hits before expansion
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Outgoing-edge hops added around each hit
    #[serde(default = "default_hops")]
    pub default_hops: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            default_hops: default_hops(),
        }
    }
}

fn default_k() -> usize {
    10
}

fn default_hops() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rolling files
    #[serde(default)]
    pub enabled: bool,

    /// Also log to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// Level for the file layer: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory, relative to the repository root unless absolute
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// hourly, daily, minutely or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: true,
            level: default_log_level(),
            directory: default_log_dir(),
            file_prefix: default_file_prefix(),
            rotation: default_rotation(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_dir() -> PathBuf {
    Path::new(INDEX_DIR).join("logs")
}

fn default_file_prefix() -> String {
    "codegraph.log".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Config {
    /// Load `<root>/.codegraph/config.toml`, or defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(INDEX_DIR).join(CONFIG_FILE);

        let config: Config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))?
        } else {
            Config::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration under the repository's index directory
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = root.join(INDEX_DIR);
        let config_path = config_dir.join(CONFIG_FILE);

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indexer.max_lines == 0 {
            return Err(ConfigError::InvalidArgument(
                "indexer.max_lines must be at least 1".to_string(),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(ConfigError::InvalidArgument(
                "embeddings.dimension must be at least 1".to_string(),
            ));
        }
        if self.embeddings.batch_size == 0 {
            return Err(ConfigError::InvalidArgument(
                "embeddings.batch_size must be at least 1".to_string(),
            ));
        }
        for pattern in &self.indexer.filters {
            glob::Pattern::new(pattern).map_err(|e| {
                ConfigError::InvalidArgument(format!("bad filter glob {:?}: {}", pattern, e))
            })?;
        }
        Ok(())
    }

    /// Default artifact directory for a repository
    pub fn index_dir(root: &Path) -> PathBuf {
        root.join(INDEX_DIR)
    }
}
