//! Durable index artifacts.
//!
//! An index directory holds:
//!
//! - `graph.json`: every node and edge, embeddings stripped
//! - `embeddings.bin` / `embeddings.json`: packed vectors and their index
//! - `inverted.json`: token -> node ids
//! - `manifest.json`: run summary, written last
//!
//! Only the graph document is required on load. Missing embeddings downgrade
//! retrieval to lexical mode and a missing inverted index is rebuilt in memory.

pub mod embeddings;
mod error;
pub mod inverted;
pub mod manifest;

pub use embeddings::{EmbeddingIndex, EmbeddingSlot};
pub use error::{StorageError, StorageResult};
pub use inverted::{tokenize, InvertedIndex};
pub use manifest::{Manifest, FORMAT_VERSION};

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::{CodeGraph, GraphEdge, GraphNode};

pub const GRAPH_FILE: &str = "graph.json";
pub const INVERTED_FILE: &str = "inverted.json";
pub const EMBEDDINGS_INDEX_FILE: &str = "embeddings.json";
pub const EMBEDDINGS_BLOB_FILE: &str = "embeddings.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

const ARTIFACTS: [&str; 5] = [
    GRAPH_FILE,
    INVERTED_FILE,
    EMBEDDINGS_INDEX_FILE,
    EMBEDDINGS_BLOB_FILE,
    MANIFEST_FILE,
];

#[derive(Serialize)]
struct GraphDocumentRef<'a> {
    nodes: &'a [GraphNode],
    edges: &'a [GraphEdge],
}

#[derive(Deserialize)]
struct GraphDocument {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Provider facts recorded alongside persisted vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingMeta {
    pub provider: String,
    pub dimension: usize,
    /// Nodes that received a vector on load
    pub vectors: usize,
}

/// A fully loaded index, ready for retrieval.
#[derive(Debug)]
pub struct LoadedIndex {
    pub graph: CodeGraph,
    pub inverted: InvertedIndex,
    pub embeddings: Option<EmbeddingMeta>,
    pub manifest: Option<Manifest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub nodes: usize,
    pub edges: usize,
    pub vectors: usize,
    pub tokens: usize,
}

/// Reads and writes the artifacts of one index directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a graph document has been persisted.
    pub fn has_index(&self) -> bool {
        self.dir.join(GRAPH_FILE).is_file()
    }

    /// Persist `graph` and its derived artifacts.
    ///
    /// Files are written in order: embeddings, graph, inverted index,
    /// manifest. Stale embedding files from an earlier run are removed when
    /// the graph carries no vectors.
    pub fn save(&self, graph: &CodeGraph, manifest: &Manifest) -> StorageResult<SaveSummary> {
        fs::create_dir_all(&self.dir).map_err(StorageError::io(&self.dir))?;
        let mut summary = SaveSummary {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            ..Default::default()
        };

        let provider = manifest.embedding_provider.as_deref().unwrap_or("unknown");
        match embeddings::pack(graph, provider)? {
            Some((index, blob)) => {
                summary.vectors = index.entries.len();
                embeddings::write(
                    &self.dir,
                    EMBEDDINGS_INDEX_FILE,
                    EMBEDDINGS_BLOB_FILE,
                    &index,
                    &blob,
                )?;
            }
            None => {
                self.remove(EMBEDDINGS_INDEX_FILE)?;
                self.remove(EMBEDDINGS_BLOB_FILE)?;
            }
        }

        let doc = GraphDocumentRef {
            nodes: graph.nodes(),
            edges: graph.edges(),
        };
        self.write_json(GRAPH_FILE, &doc, true)?;

        let inverted = InvertedIndex::build(graph);
        summary.tokens = inverted.token_count();
        self.write_json(INVERTED_FILE, &inverted, false)?;

        self.write_json(MANIFEST_FILE, manifest, true)?;

        info!(
            dir = %self.dir.display(),
            nodes = summary.nodes,
            edges = summary.edges,
            vectors = summary.vectors,
            "saved index"
        );
        Ok(summary)
    }

    /// Load the graph plus whatever optional artifacts are present.
    pub fn load(&self) -> StorageResult<LoadedIndex> {
        let graph_path = self.dir.join(GRAPH_FILE);
        if !graph_path.is_file() {
            return Err(StorageError::GraphMissing(graph_path));
        }
        let doc: GraphDocument = self.read_json(GRAPH_FILE)?;
        let mut graph = CodeGraph::from_parts(doc.nodes, doc.edges);

        let stored = embeddings::read(&self.dir, EMBEDDINGS_INDEX_FILE, EMBEDDINGS_BLOB_FILE)?;
        let embeddings = match stored {
            Some((index, blob)) => {
                let vectors = embeddings::unpack(&mut graph, &index, &blob)?;
                Some(EmbeddingMeta {
                    provider: index.provider,
                    dimension: index.dimension,
                    vectors,
                })
            }
            None => {
                debug!(dir = %self.dir.display(), "no embeddings persisted");
                None
            }
        };

        let inverted = if self.dir.join(INVERTED_FILE).is_file() {
            self.read_json(INVERTED_FILE)?
        } else {
            warn!(dir = %self.dir.display(), "inverted index missing, rebuilding in memory");
            InvertedIndex::build(&graph)
        };

        let manifest = self.load_manifest()?;
        if let Some(m) = &manifest {
            if !m.is_compatible() {
                warn!(
                    found = m.format_version,
                    expected = FORMAT_VERSION,
                    "index was written by an incompatible version; reindex with --force"
                );
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            embedded = graph.embedded_chunk_count(),
            "loaded index"
        );
        Ok(LoadedIndex {
            graph,
            inverted,
            embeddings,
            manifest,
        })
    }

    pub fn load_manifest(&self) -> StorageResult<Option<Manifest>> {
        if !self.dir.join(MANIFEST_FILE).is_file() {
            return Ok(None);
        }
        self.read_json(MANIFEST_FILE).map(Some)
    }

    /// Delete every index artifact, leaving configuration and logs alone.
    pub fn clear(&self) -> StorageResult<()> {
        for name in ARTIFACTS {
            self.remove(name)?;
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let path = self.dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }

    fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
        pretty: bool,
    ) -> StorageResult<()> {
        let path = self.dir.join(name);
        let file = File::create(&path).map_err(StorageError::io(&path))?;
        let mut writer = BufWriter::new(file);
        let written = if pretty {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        written.map_err(StorageError::json(&path))?;
        writer.flush().map_err(StorageError::io(&path))?;
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> StorageResult<T> {
        let path = self.dir.join(name);
        let file = File::open(&path).map_err(StorageError::io(&path))?;
        serde_json::from_reader(BufReader::new(file)).map_err(StorageError::json(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeKind};
    use tempfile::tempdir;

    fn sample_graph() -> CodeGraph {
        let mut graph = CodeGraph::new();
        let repo = GraphNode::new("r", NodeKind::Repo, "repo", "", None);
        let file = GraphNode::new("r", NodeKind::File, "a.py", "a.py", None).with_lang("python");
        let sym = GraphNode::new("r", NodeKind::Symbol, "foo", "a.py", None)
            .with_signature("def foo():");
        let mut chunk = GraphNode::new("r", NodeKind::Chunk, "foo#0", "a.py", None)
            .with_code("def foo():\n    pass");
        chunk.embedding = Some(vec![0.25, -0.5, 1.0]);

        for (from, to, kind) in [
            (&repo, &file, EdgeKind::Contains),
            (&file, &sym, EdgeKind::Contains),
            (&sym, &chunk, EdgeKind::PartOf),
        ] {
            let edge = GraphEdge::new(from.id.clone(), to.id.clone(), kind);
            graph.add_node(from.clone());
            graph.add_node(to.clone());
            graph.add_edge(edge);
        }
        graph
    }

    fn manifest(graph: &CodeGraph) -> Manifest {
        Manifest {
            format_version: FORMAT_VERSION,
            repo_id: "r".to_string(),
            root: "/tmp/repo".to_string(),
            created_at: chrono::Utc::now(),
            embedding_provider: Some("hash".to_string()),
            embedding_dimension: Some(3),
            files: 1,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            embedded_chunks: graph.embedded_chunk_count(),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("idx"));
        let graph = sample_graph();

        let summary = store.save(&graph, &manifest(&graph)).unwrap();
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.vectors, 1);
        assert!(store.has_index());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.graph.nodes(), graph.nodes());
        assert_eq!(loaded.graph.edges(), graph.edges());
        assert_eq!(
            loaded.embeddings,
            Some(EmbeddingMeta {
                provider: "hash".to_string(),
                dimension: 3,
                vectors: 1
            })
        );
        assert_eq!(loaded.manifest.unwrap().nodes, 4);
        assert!(!loaded.inverted.lookup("foo").is_empty());
    }

    #[test]
    fn test_graph_document_has_no_embeddings() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let graph = sample_graph();
        store.save(&graph, &manifest(&graph)).unwrap();

        let text = fs::read_to_string(dir.path().join(GRAPH_FILE)).unwrap();
        assert!(!text.contains("embedding"));
        assert!(text.contains("PART_OF"));
    }

    #[test]
    fn test_missing_graph_is_an_error() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        assert!(!store.has_index());
        assert!(matches!(store.load(), Err(StorageError::GraphMissing(_))));
    }

    #[test]
    fn test_missing_optional_artifacts_downgrade() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let graph = sample_graph();
        store.save(&graph, &manifest(&graph)).unwrap();

        fs::remove_file(dir.path().join(EMBEDDINGS_BLOB_FILE)).unwrap();
        fs::remove_file(dir.path().join(INVERTED_FILE)).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.embeddings.is_none());
        assert_eq!(loaded.graph.embedded_chunk_count(), 0);
        assert_eq!(loaded.inverted, InvertedIndex::build(&graph));
    }

    #[test]
    fn test_save_without_vectors_removes_stale_blob() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let graph = sample_graph();
        store.save(&graph, &manifest(&graph)).unwrap();
        assert!(dir.path().join(EMBEDDINGS_BLOB_FILE).exists());

        let mut plain = graph.clone();
        for node in plain.nodes_mut() {
            node.embedding = None;
        }
        store.save(&plain, &manifest(&plain)).unwrap();
        assert!(!dir.path().join(EMBEDDINGS_BLOB_FILE).exists());
        assert!(store.load().unwrap().embeddings.is_none());
    }

    #[test]
    fn test_clear_keeps_other_files() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let graph = sample_graph();
        store.save(&graph, &manifest(&graph)).unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();

        store.clear().unwrap();
        assert!(!store.has_index());
        assert!(dir.path().join("config.toml").exists());
    }
}
