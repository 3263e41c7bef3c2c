//! Stats command for displaying index statistics and metrics

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::graph::NodeKind;
use crate::metrics::{
    gather_metrics, MetricSnapshot, GRAPH_EDGES, GRAPH_NODES, INDEXED_CHUNKS, INDEXED_FILES,
};
use crate::storage::{IndexStore, LoadedIndex};
use crate::Config;

/// Run the stats command
///
/// # Arguments
/// * `out` - Index directory (default `./.codegraph`)
/// * `prometheus` - If true, output in Prometheus text format
pub async fn run(out: Option<PathBuf>, prometheus: bool) -> Result<()> {
    let cwd = env::current_dir()?;
    let dir = out.unwrap_or_else(|| Config::index_dir(&cwd));

    let store = IndexStore::new(&dir);
    let loaded = tokio::task::spawn_blocking(move || store.load())
        .await
        .context("Index load task panicked")?
        .with_context(|| format!("Failed to load index from {}", dir.display()))?;
    update_gauges(&loaded);

    if prometheus {
        print!("{}", gather_metrics());
        return Ok(());
    }
    print_human_readable(&dir, &loaded);
    Ok(())
}

fn update_gauges(loaded: &LoadedIndex) {
    let graph = &loaded.graph;
    INDEXED_FILES.set(graph.nodes_of_kind(NodeKind::File).count() as f64);
    INDEXED_CHUNKS.set(graph.nodes_of_kind(NodeKind::Chunk).count() as f64);
    GRAPH_NODES.set(graph.node_count() as f64);
    GRAPH_EDGES.set(graph.edge_count() as f64);
}

fn print_human_readable(dir: &std::path::Path, loaded: &LoadedIndex) {
    let graph = &loaded.graph;

    println!("CodeGraph Index Statistics");
    println!("==========================\n");

    if let Some(manifest) = &loaded.manifest {
        println!("Repository: {}", manifest.root);
        println!("Repo id:    {}", manifest.repo_id);
        println!("Indexed at: {}", manifest.created_at.to_rfc3339());
        println!();
    }

    println!("Nodes: {}", graph.node_count());
    for (kind, count) in graph.count_nodes_by_kind() {
        println!("  {:<10} {}", kind, count);
    }
    println!("Edges: {}", graph.edge_count());
    for (kind, count) in graph.count_edges_by_kind() {
        println!("  {:<10} {}", kind, count);
    }
    println!("Inverted index tokens: {}", loaded.inverted.token_count());
    println!();

    match &loaded.embeddings {
        Some(meta) => println!(
            "Embeddings: {} vectors, {} dimensions ({})",
            meta.vectors, meta.dimension, meta.provider
        ),
        None => println!("Embeddings: none (lexical retrieval only)"),
    }
    println!();

    let snapshot = MetricSnapshot::capture();
    println!("Retrieval Metrics:");
    println!("  Total requests:   {:.0}", snapshot.retrieval_requests_total);
    if snapshot.retrieval_requests_total > 0.0 {
        println!("  Average latency:  {:.3}s", snapshot.retrieval_latency_avg);
        println!("  Average results:  {:.1}", snapshot.retrieval_results_avg);
    }
    println!();

    println!("Storage:");
    println!("  Index path: {}", dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_snapshot_creation() {
        let snapshot = MetricSnapshot::capture();
        assert!(snapshot.retrieval_requests_total >= 0.0);
        assert!(snapshot.indexed_files >= 0.0);
        assert!(snapshot.graph_nodes >= 0.0);
        assert!(snapshot.embedding_requests_total >= 0.0);
    }
}
