//! Query entry point: ranking mode selection, neighborhood expansion and
//! edge annotation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::lexical::LexicalSearch;
use super::traits::{ScoredNode, Search};
use super::vector::VectorSearch;
use crate::config::{ConfigError, SearchConfig};
use crate::embeddings::{EmbeddingProvider, EmbeddingsConfig, ProviderFactory};
use crate::graph::{CodeGraph, EdgeKind, GraphNode, NodeKind};
use crate::metrics::{RETRIEVAL_LATENCY, RETRIEVAL_REQUESTS, RETRIEVAL_RESULTS};
use crate::storage::{IndexStore, LoadedIndex};

const SNIPPET_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Lexical,
    Semantic,
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMode::Lexical => write!(f, "lexical"),
            RetrievalMode::Semantic => write!(f, "semantic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveOptions {
    pub k: usize,
    pub hops: usize,
    /// Annotate every hit with its incoming and outgoing edges
    pub with_meta: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for RetrieveOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            k: config.default_k,
            hops: config.default_hops,
            with_meta: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One edge touching a hit, seen from the hit's side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeMeta {
    pub direction: Direction,
    pub kind: EdgeKind,
    pub node_id: String,
    pub node_name: String,
    pub node_kind: NodeKind,
    pub snippet: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    pub node: GraphNode,
    /// Ranking score; 0 for nodes added by expansion
    pub score: f32,
    /// 0 for ranked hits, otherwise the expansion hop that reached the node
    pub hop: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeMeta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub mode: RetrievalMode,
    pub hits: Vec<RetrievalHit>,
}

/// Answers queries against one loaded index.
///
/// The index is immutable once loaded, so a retriever can serve any number
/// of concurrent queries.
pub struct Retriever {
    index: Arc<LoadedIndex>,
    lexical: LexicalSearch,
    semantic: Option<VectorSearch>,
}

impl Retriever {
    /// Load the index in `dir` and pick the retrieval mode it supports.
    pub fn load(dir: &Path, config: &EmbeddingsConfig) -> Result<Self> {
        let loaded = IndexStore::new(dir).load()?;
        Ok(Self::new(loaded, config))
    }

    /// Semantic mode when the graph carries vectors and the provider that
    /// produced them can be rebuilt; lexical otherwise.
    pub fn new(index: LoadedIndex, config: &EmbeddingsConfig) -> Self {
        let provider = match (&index.embeddings, index.graph.embedded_chunk_count()) {
            (Some(meta), embedded) if embedded > 0 => {
                match ProviderFactory::for_index(&meta.provider, meta.dimension, config) {
                    Ok(provider) => Some(provider),
                    Err(e) => {
                        warn!("Cannot embed queries for this index, using lexical mode: {:#}", e);
                        None
                    }
                }
            }
            _ => None,
        };
        Self::with_provider(index, provider)
    }

    /// Build with an explicit query provider; `None` forces lexical mode.
    pub fn with_provider(index: LoadedIndex, provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        let index = Arc::new(index);
        let semantic = provider
            .filter(|_| index.graph.embedded_chunk_count() > 0)
            .map(|p| VectorSearch::new(index.clone(), p));
        Self {
            lexical: LexicalSearch::new(index.clone()),
            semantic,
            index,
        }
    }

    pub fn mode(&self) -> RetrievalMode {
        if self.semantic.is_some() {
            RetrievalMode::Semantic
        } else {
            RetrievalMode::Lexical
        }
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.index.graph
    }

    pub fn index(&self) -> &LoadedIndex {
        &self.index
    }

    /// Rank, expand and optionally annotate.
    pub async fn retrieve(&self, query: &str, options: &RetrieveOptions) -> Result<Retrieval> {
        if query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery.into());
        }
        if options.k == 0 {
            return Err(ConfigError::InvalidArgument("k must be at least 1".to_string()).into());
        }

        RETRIEVAL_REQUESTS.inc();
        let start = Instant::now();

        let (mode, ranked) = self.rank(query, options.k).await;
        let mut hits = self.expand(ranked, options.hops);
        if options.with_meta {
            for hit in &mut hits {
                hit.edges = self.edge_meta(&hit.node.id);
            }
        }

        RETRIEVAL_LATENCY.observe(start.elapsed().as_secs_f64());
        RETRIEVAL_RESULTS.observe(hits.len() as f64);
        info!(
            mode = %mode,
            query,
            results = hits.len(),
            "retrieval finished in {:.3}s",
            start.elapsed().as_secs_f64()
        );

        Ok(Retrieval { mode, hits })
    }

    /// A semantic failure at query time falls back to lexical ranking.
    async fn rank(&self, query: &str, k: usize) -> (RetrievalMode, Vec<ScoredNode>) {
        if let Some(semantic) = &self.semantic {
            match semantic.search(query, k).await {
                Ok(ranked) => return (RetrievalMode::Semantic, ranked),
                Err(e) => warn!("Semantic ranking failed, using lexical: {:#}", e),
            }
        }
        (RetrievalMode::Lexical, self.lexical.rank(query, k))
    }

    /// Breadth-first expansion over outgoing edges, `hops` levels deep.
    fn expand(&self, ranked: Vec<ScoredNode>, hops: usize) -> Vec<RetrievalHit> {
        let graph = &self.index.graph;
        let mut seen: HashSet<String> = HashSet::new();
        let mut hits = Vec::new();
        let mut frontier = Vec::new();

        for scored in ranked {
            if let Some(node) = graph.node(&scored.id) {
                if seen.insert(scored.id.clone()) {
                    frontier.push(scored.id.clone());
                    hits.push(hit(node, scored.score, 0));
                }
            }
        }

        for hop in 1..=hops {
            let mut next = Vec::new();
            for id in &frontier {
                for edge in graph.outgoing(id) {
                    if !seen.insert(edge.to.clone()) {
                        continue;
                    }
                    if let Some(node) = graph.node(&edge.to) {
                        next.push(edge.to.clone());
                        hits.push(hit(node, 0.0, hop));
                    }
                }
            }
            debug!(hop, added = next.len(), "expanded neighborhood");
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        hits
    }

    fn edge_meta(&self, id: &str) -> Vec<EdgeMeta> {
        let graph = &self.index.graph;
        let outgoing = graph.outgoing(id).map(|e| (Direction::Outgoing, e, e.to.as_str()));
        let incoming = graph.incoming(id).map(|e| (Direction::Incoming, e, e.from.as_str()));

        outgoing
            .chain(incoming)
            .filter_map(|(direction, edge, other)| {
                let node = graph.node(other)?;
                Some(EdgeMeta {
                    direction,
                    kind: edge.kind,
                    node_id: node.id.clone(),
                    node_name: node.name.clone(),
                    node_kind: node.kind,
                    snippet: node.snippet(SNIPPET_CHARS),
                    meta: edge.meta.clone(),
                })
            })
            .collect()
    }
}

fn hit(node: &GraphNode, score: f32, hop: usize) -> RetrievalHit {
    let mut node = node.clone();
    node.embedding = None;
    RetrievalHit {
        node,
        score,
        hop,
        edges: Vec::new(),
    }
}
