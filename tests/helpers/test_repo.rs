//! Temporary repositories for end-to-end tests.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use codegraph::config::Config;
use codegraph::embeddings::EmbeddingsConfig;
use codegraph::indexing::{GraphIndexer, IndexOutcome};
use codegraph::search::{RetrieveOptions, Retriever};

/// A throwaway repository on disk.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn with_file(self, rel_path: &str, content: &str) -> Self {
        self.write(rel_path, content);
        self
    }

    pub fn write(&self, rel_path: &str, content: &str) {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write fixture file");
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn index_dir(&self) -> PathBuf {
        Config::index_dir(&self.root().canonicalize().expect("canonical root"))
    }

    /// Default config with embeddings off, so ranking is lexical.
    pub fn lexical_config() -> Config {
        let mut config = Config::default();
        config.embeddings.enabled = false;
        config
    }

    pub fn indexer(&self, config: Config) -> GraphIndexer {
        GraphIndexer::new(self.root(), config)
            .expect("create indexer")
            .with_progress(false)
    }

    pub async fn index(&self) -> Result<IndexOutcome> {
        self.indexer(Self::lexical_config()).index(true).await
    }

    pub async fn index_with(&self, config: Config) -> Result<IndexOutcome> {
        self.indexer(config).index(true).await
    }

    pub fn retriever(&self) -> Retriever {
        Retriever::load(&self.index_dir(), &EmbeddingsConfig::default()).expect("load retriever")
    }
}

pub fn options(k: usize, hops: usize, with_meta: bool) -> RetrieveOptions {
    RetrieveOptions { k, hops, with_meta }
}
