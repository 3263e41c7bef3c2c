//! Repository indexing: walk, parallel parse, graph assembly, embedding and
//! persistence.

pub mod errors;
pub mod graph_builder;
pub mod parallel;
pub mod pipeline;

pub use errors::{ErrorCollector, ErrorReport, FileError, ProcessingStage};
pub use graph_builder::{BuildStats, GraphBuilder};
pub use parallel::{create_progress_bar, parse_files, ParsedFiles};
pub use pipeline::{process_file, FileFacts, FileOutcome};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::embeddings::{EmbedReport, Embedder, ProviderFactory};
use crate::graph::{CodeGraph, NodeKind};
use crate::indexer::Walker;
use crate::languages::LanguageRegistry;
use crate::metrics::{
    GRAPH_EDGES, GRAPH_NODES, INDEXED_CHUNKS, INDEXED_FILES, INDEX_LATENCY, SKIPPED_FILES,
};
use crate::storage::{IndexStore, Manifest, FORMAT_VERSION};

/// Lifecycle of a repository's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    NotIndexed,
    Indexing,
    Indexed,
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexState::NotIndexed => write!(f, "not indexed"),
            IndexState::Indexing => write!(f, "indexing"),
            IndexState::Indexed => write!(f, "indexed"),
        }
    }
}

/// Summary of one `index` call.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub repo_id: String,
    /// True when an existing index was loaded instead of rebuilt
    pub reused: bool,
    pub files_walked: usize,
    pub files_indexed: usize,
    pub files_unsupported: usize,
    pub files_failed: usize,
    pub build: BuildStats,
    pub nodes: usize,
    pub edges: usize,
    pub embedding: Option<EmbedReport>,
    pub embedding_provider: Option<String>,
    /// Why the configured provider was replaced by the offline one
    pub fallback_reason: Option<String>,
    pub errors: ErrorReport,
    pub duration: Duration,
}

impl IndexReport {
    fn new(repo_id: &str) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            reused: false,
            files_walked: 0,
            files_indexed: 0,
            files_unsupported: 0,
            files_failed: 0,
            build: BuildStats::default(),
            nodes: 0,
            edges: 0,
            embedding: None,
            embedding_provider: None,
            fallback_reason: None,
            errors: ErrorReport::default(),
            duration: Duration::ZERO,
        }
    }
}

/// Graph plus report, returned by every successful `index` call.
#[derive(Debug)]
pub struct IndexOutcome {
    pub graph: CodeGraph,
    pub report: IndexReport,
}

/// Drives a full index of one repository.
pub struct GraphIndexer {
    root: PathBuf,
    repo_id: String,
    config: Config,
    store: IndexStore,
    registry: Arc<LanguageRegistry>,
    state: IndexState,
    embed: bool,
    show_progress: bool,
}

/// First 16 hex chars of blake3 over the canonical root path.
pub fn repo_id_for(root: &Path) -> String {
    let hash = blake3::hash(root.to_string_lossy().as_bytes());
    hash.to_hex().as_str()[..16].to_string()
}

impl GraphIndexer {
    /// Create an indexer for `root`, writing artifacts to `<root>/.codegraph`.
    pub fn new(root: &Path, config: Config) -> Result<Self> {
        if !root.is_dir() {
            return Err(ConfigError::MissingRoot(root.to_path_buf()).into());
        }
        config.validate()?;
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve repository root {:?}", root))?;
        let store = IndexStore::new(Config::index_dir(&root));
        let state = if store.has_index() {
            IndexState::Indexed
        } else {
            IndexState::NotIndexed
        };

        Ok(Self {
            repo_id: repo_id_for(&root),
            embed: config.embeddings.enabled,
            root,
            config,
            store,
            registry: Arc::new(LanguageRegistry::with_builtins()),
            state,
            show_progress: true,
        })
    }

    /// Write artifacts to `dir` instead of the default index directory.
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store = IndexStore::new(dir);
        self.state = if self.store.has_index() {
            IndexState::Indexed
        } else {
            IndexState::NotIndexed
        };
        self
    }

    pub fn with_registry(mut self, registry: Arc<LanguageRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_embeddings(mut self, embed: bool) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Index the repository.
    ///
    /// Without `force`, an existing index is loaded and returned unchanged.
    /// With `force`, or when nothing usable is persisted, prior artifacts
    /// are discarded and the graph is rebuilt from scratch.
    pub async fn index(&mut self, force: bool) -> Result<IndexOutcome> {
        if !force && self.state == IndexState::Indexed {
            match self.load_existing().await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => warn!("Existing index unusable, rebuilding: {:#}", e),
            }
        }

        self.state = IndexState::Indexing;
        match self.rebuild().await {
            Ok(outcome) => {
                self.state = IndexState::Indexed;
                Ok(outcome)
            }
            Err(e) => {
                self.state = IndexState::NotIndexed;
                Err(e)
            }
        }
    }

    async fn load_existing(&self) -> Result<IndexOutcome> {
        let store = self.store.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .context("Index load task panicked")??;

        let graph = loaded.graph;
        let mut report = IndexReport::new(&self.repo_id);
        report.reused = true;
        report.files_indexed = graph.nodes_of_kind(NodeKind::File).count();
        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        report.embedding_provider = loaded.embeddings.map(|e| e.provider);
        record_graph_metrics(&graph);

        info!(
            dir = %self.store.dir().display(),
            nodes = report.nodes,
            "index already present, loaded without reparsing"
        );
        Ok(IndexOutcome { graph, report })
    }

    async fn rebuild(&self) -> Result<IndexOutcome> {
        let start = Instant::now();
        let mut report = IndexReport::new(&self.repo_id);
        let errors = ErrorCollector::new();

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.clear())
            .await
            .context("Index clear task panicked")??;

        let root = self.root.clone();
        let indexer_config = self.config.indexer.clone();
        let files =
            tokio::task::spawn_blocking(move || Walker::new(root, &indexer_config).collect_files())
                .await
                .context("File walk task panicked")?;
        report.files_walked = files.len();
        info!("Indexing {} files under {}", files.len(), self.root.display());

        let progress = create_progress_bar(files.len(), self.show_progress);
        let registry = self.registry.clone();
        let worker_errors = errors.clone();
        let threads = self.config.indexer.parallel_threads;
        let pb = progress.clone();
        let repo_id = self.repo_id.clone();
        let max_lines = self.config.indexer.max_lines;
        let repo_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string());
        let root_str = self.root.display().to_string();

        let (parsed_counts, mut graph, build) = tokio::task::spawn_blocking(move || -> Result<_> {
            let parsed = parse_files(&files, &registry, &worker_errors, threads, &pb)?;
            let (graph, build) =
                GraphBuilder::new(&repo_id, max_lines).build(&repo_name, &root_str, &parsed.facts);
            Ok(((parsed.facts.len(), parsed.unsupported, parsed.failed), graph, build))
        })
        .await
        .context("Parse task panicked")??;
        progress.finish_and_clear();

        (report.files_indexed, report.files_unsupported, report.files_failed) = parsed_counts;
        report.build = build;

        if self.embed {
            let resolved = ProviderFactory::create_with_fallback(&self.config.embeddings).await;
            if let Some(reason) = &resolved.fallback_reason {
                warn!("Embedding provider unavailable, using offline hashing: {}", reason);
            }
            report.fallback_reason = resolved.fallback_reason.clone();
            report.embedding_provider = Some(resolved.provider.provider_name().to_string());

            let embedder = Embedder::new(resolved.provider, self.config.embeddings.batch_size);
            let embed_report = embedder.embed_graph(&mut graph).await;
            if embed_report.failed > 0 {
                errors.record(
                    format!("{} batches", embed_report.failed_batches),
                    format!("{} chunks left without an embedding", embed_report.failed),
                    ProcessingStage::Embedding,
                );
            }
            report.embedding = Some(embed_report);
        }

        let embedded = graph.embedded_chunk_count();
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            repo_id: self.repo_id.clone(),
            root: self.root.display().to_string(),
            created_at: chrono::Utc::now(),
            embedding_provider: report.embedding_provider.clone().filter(|_| embedded > 0),
            embedding_dimension: graph
                .nodes_of_kind(NodeKind::Chunk)
                .find_map(|n| n.embedding.as_ref().map(Vec::len)),
            files: report.files_indexed,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            embedded_chunks: embedded,
        };

        let store = self.store.clone();
        let graph =
            tokio::task::spawn_blocking(move || store.save(&graph, &manifest).map(|_| graph))
                .await
                .context("Index save task panicked")??;

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        report.errors = errors.get_report();
        report.duration = start.elapsed();

        record_graph_metrics(&graph);
        INDEXED_FILES.set(report.files_indexed as f64);
        SKIPPED_FILES.set((report.files_unsupported + report.files_failed) as f64);
        INDEX_LATENCY.observe(report.duration.as_secs_f64());

        info!(
            files = report.files_indexed,
            skipped = report.files_unsupported + report.files_failed,
            nodes = report.nodes,
            edges = report.edges,
            embedded,
            "Indexing completed in {:.2}s",
            report.duration.as_secs_f64()
        );
        Ok(IndexOutcome { graph, report })
    }
}

fn record_graph_metrics(graph: &CodeGraph) {
    GRAPH_NODES.set(graph.node_count() as f64);
    GRAPH_EDGES.set(graph.edge_count() as f64);
    INDEXED_CHUNKS.set(graph.nodes_of_kind(NodeKind::Chunk).count() as f64);
}
