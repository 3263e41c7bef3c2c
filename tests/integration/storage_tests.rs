use anyhow::Result;

use codegraph::config::Config;
use codegraph::embeddings::{EmbeddingsConfig, HASH_PROVIDER_NAME};
use codegraph::graph::NodeKind;
use codegraph::search::{RetrievalMode, Retriever};
use codegraph::storage::{
    IndexStore, StorageError, EMBEDDINGS_BLOB_FILE, EMBEDDINGS_INDEX_FILE, FORMAT_VERSION,
    GRAPH_FILE, INVERTED_FILE, MANIFEST_FILE,
};

use crate::helpers::test_repo::{options, TestRepo};

fn sample_repo() -> TestRepo {
    TestRepo::new()
        .with_file(
            "auth/session.py",
            r#"# Session handling.
class Session:
    def refresh(self, token):
        return validate_token(token)
"#,
        )
        .with_file("auth/tokens.py", "def validate_token(token):\n    return len(token) > 8\n")
        .with_file("main.go", "package main\n\nfunc main() {\n\tstart()\n}\n\nfunc start() {}\n")
}

fn embedding_config() -> Config {
    let mut config = Config::default();
    config.embeddings.enabled = true;
    config.embeddings.dimension = 64;
    config
}

#[tokio::test]
async fn test_lexical_index_writes_expected_artifacts() -> Result<()> {
    let repo = sample_repo();
    repo.index().await?;
    let dir = repo.index_dir();

    for name in [GRAPH_FILE, INVERTED_FILE, MANIFEST_FILE] {
        assert!(dir.join(name).is_file(), "{} missing", name);
    }
    assert!(!dir.join(EMBEDDINGS_INDEX_FILE).exists());
    assert!(!dir.join(EMBEDDINGS_BLOB_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_graph_round_trips_through_disk() -> Result<()> {
    let repo = sample_repo();
    let outcome = repo.index().await?;

    let loaded = IndexStore::new(repo.index_dir()).load()?;
    assert_eq!(loaded.graph.nodes(), outcome.graph.nodes());
    assert_eq!(loaded.graph.edges(), outcome.graph.edges());
    assert!(loaded.embeddings.is_none());
    assert!(!loaded.inverted.is_empty());

    let manifest = loaded.manifest.expect("manifest");
    assert_eq!(manifest.format_version, FORMAT_VERSION);
    assert_eq!(manifest.repo_id, outcome.report.repo_id);
    assert_eq!(manifest.files, 3);
    assert_eq!(manifest.nodes, outcome.graph.node_count());
    assert_eq!(manifest.edges, outcome.graph.edge_count());
    assert_eq!(manifest.embedded_chunks, 0);
    assert_eq!(manifest.embedding_provider, None);
    Ok(())
}

#[tokio::test]
async fn test_embeddings_round_trip_bit_identical() -> Result<()> {
    let repo = sample_repo();
    let outcome = repo.index_with(embedding_config()).await?;

    let embedded = outcome.graph.embedded_chunk_count();
    assert_eq!(embedded, outcome.graph.nodes_of_kind(NodeKind::Chunk).count());
    assert_eq!(outcome.report.embedding_provider.as_deref(), Some(HASH_PROVIDER_NAME));

    let loaded = IndexStore::new(repo.index_dir()).load()?;
    let meta = loaded.embeddings.as_ref().expect("embedding meta");
    assert_eq!(meta.provider, HASH_PROVIDER_NAME);
    assert_eq!(meta.dimension, 64);
    assert_eq!(meta.vectors, embedded);

    for node in outcome.graph.nodes() {
        let reloaded = loaded.graph.node(&node.id).expect("node survives reload");
        let bits = |v: &Vec<f32>| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        let before = node.embedding.as_ref().map(bits);
        let after = reloaded.embedding.as_ref().map(bits);
        assert_eq!(before, after, "embedding of {} changed", node.name);
    }
    Ok(())
}

#[tokio::test]
async fn test_graph_document_never_contains_vectors() -> Result<()> {
    let repo = sample_repo();
    repo.index_with(embedding_config()).await?;

    let doc = std::fs::read_to_string(repo.index_dir().join(GRAPH_FILE))?;
    assert!(!doc.contains("\"embedding\""));
    Ok(())
}

#[tokio::test]
async fn test_embedded_index_retrieves_semantically() -> Result<()> {
    let repo = sample_repo();
    repo.index_with(embedding_config()).await?;

    let retriever = Retriever::load(&repo.index_dir(), &EmbeddingsConfig::default())?;
    assert_eq!(retriever.mode(), RetrievalMode::Semantic);

    let result = retriever.retrieve("validate token length", &options(3, 0, false)).await?;
    assert_eq!(result.mode, RetrievalMode::Semantic);
    assert!(!result.hits.is_empty());
    assert!(result.hits.iter().all(|h| h.node.kind == NodeKind::Chunk));
    assert!(result.hits.iter().all(|h| h.node.embedding.is_none()));
    for pair in result.hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    Ok(())
}

#[tokio::test]
async fn test_lexical_reindex_drops_stale_vectors() -> Result<()> {
    let repo = sample_repo();
    repo.index_with(embedding_config()).await?;
    assert!(repo.index_dir().join(EMBEDDINGS_BLOB_FILE).is_file());

    repo.index().await?;
    let loaded = IndexStore::new(repo.index_dir()).load()?;
    assert!(loaded.embeddings.is_none());
    assert_eq!(loaded.graph.embedded_chunk_count(), 0);
    assert_eq!(repo.retriever().mode(), RetrievalMode::Lexical);
    Ok(())
}

#[tokio::test]
async fn test_missing_inverted_index_is_rebuilt() -> Result<()> {
    let repo = sample_repo();
    repo.index().await?;
    let dir = repo.index_dir();
    let original = IndexStore::new(&dir).load()?.inverted;

    std::fs::remove_file(dir.join(INVERTED_FILE))?;
    let loaded = IndexStore::new(&dir).load()?;
    assert_eq!(loaded.inverted, original);
    Ok(())
}

#[tokio::test]
async fn test_truncated_blob_is_rejected() -> Result<()> {
    let repo = sample_repo();
    repo.index_with(embedding_config()).await?;
    let blob = repo.index_dir().join(EMBEDDINGS_BLOB_FILE);
    let bytes = std::fs::read(&blob)?;
    std::fs::write(&blob, &bytes[..bytes.len() / 2])?;

    let err = IndexStore::new(repo.index_dir()).load().unwrap_err();
    assert!(matches!(err, StorageError::CorruptEmbeddings(_)));
    Ok(())
}

#[tokio::test]
async fn test_overflowing_slot_offset_is_rejected() -> Result<()> {
    let repo = sample_repo();
    repo.index_with(embedding_config()).await?;
    let index_path = repo.index_dir().join(EMBEDDINGS_INDEX_FILE);

    let mut index: serde_json::Value = serde_json::from_slice(&std::fs::read(&index_path)?)?;
    let entries = index["entries"].as_object_mut().expect("entries map");
    let first = entries.values_mut().next().expect("one entry");
    first["offset"] = serde_json::json!(usize::MAX - 1);
    std::fs::write(&index_path, serde_json::to_vec(&index)?)?;

    let err = IndexStore::new(repo.index_dir()).load().unwrap_err();
    assert!(matches!(err, StorageError::CorruptEmbeddings(_)));
    Ok(())
}

#[tokio::test]
async fn test_loading_empty_directory_reports_missing_graph() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = IndexStore::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, StorageError::GraphMissing(_)));
}
