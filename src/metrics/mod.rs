//! Prometheus metrics for indexing, embedding and retrieval.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Index metrics
    // ============================================================================

    pub static ref INDEXED_FILES: Gauge = Gauge::with_opts(
        Opts::new("codegraph_indexed_files", "Files parsed in the last index run")
    ).expect("Failed to create INDEXED_FILES gauge");

    pub static ref SKIPPED_FILES: Gauge = Gauge::with_opts(
        Opts::new("codegraph_skipped_files", "Files skipped in the last index run")
    ).expect("Failed to create SKIPPED_FILES gauge");

    pub static ref GRAPH_NODES: Gauge = Gauge::with_opts(
        Opts::new("codegraph_graph_nodes", "Nodes in the last built or loaded graph")
    ).expect("Failed to create GRAPH_NODES gauge");

    pub static ref GRAPH_EDGES: Gauge = Gauge::with_opts(
        Opts::new("codegraph_graph_edges", "Edges in the last built or loaded graph")
    ).expect("Failed to create GRAPH_EDGES gauge");

    pub static ref INDEXED_CHUNKS: Gauge = Gauge::with_opts(
        Opts::new("codegraph_indexed_chunks", "CHUNK nodes in the last built graph")
    ).expect("Failed to create INDEXED_CHUNKS gauge");

    /// Wall time of a full index run in seconds
    pub static ref INDEX_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codegraph_indexing_duration_seconds",
            "Time to index a repository in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0])
    ).expect("Failed to create INDEX_LATENCY histogram");

    // ============================================================================
    // Embedding metrics
    // ============================================================================

    pub static ref EMBEDDING_REQUESTS: Counter = Counter::with_opts(
        Opts::new("codegraph_embedding_requests_total", "Total embedding provider calls")
    ).expect("Failed to create EMBEDDING_REQUESTS counter");

    pub static ref EMBEDDING_FAILURES: Counter = Counter::with_opts(
        Opts::new("codegraph_embedding_failures_total", "Embedding batches that failed")
    ).expect("Failed to create EMBEDDING_FAILURES counter");

    pub static ref EMBEDDING_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codegraph_embedding_latency_seconds",
            "Embedding generation latency in seconds"
        ).buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 10.0])
    ).expect("Failed to create EMBEDDING_LATENCY histogram");

    // ============================================================================
    // Retrieval metrics
    // ============================================================================

    pub static ref RETRIEVAL_REQUESTS: Counter = Counter::with_opts(
        Opts::new("codegraph_retrieval_requests_total", "Total retrieval requests")
    ).expect("Failed to create RETRIEVAL_REQUESTS counter");

    pub static ref RETRIEVAL_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codegraph_retrieval_latency_seconds",
            "Retrieval latency in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
    ).expect("Failed to create RETRIEVAL_LATENCY histogram");

    /// Final result count per request, after expansion
    pub static ref RETRIEVAL_RESULTS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codegraph_retrieval_results_count",
            "Number of nodes returned per retrieval request"
        ).buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0])
    ).expect("Failed to create RETRIEVAL_RESULTS histogram");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(INDEXED_FILES.clone()),
            Box::new(SKIPPED_FILES.clone()),
            Box::new(GRAPH_NODES.clone()),
            Box::new(GRAPH_EDGES.clone()),
            Box::new(INDEXED_CHUNKS.clone()),
            Box::new(INDEX_LATENCY.clone()),
            Box::new(EMBEDDING_REQUESTS.clone()),
            Box::new(EMBEDDING_FAILURES.clone()),
            Box::new(EMBEDDING_LATENCY.clone()),
            Box::new(RETRIEVAL_REQUESTS.clone()),
            Box::new(RETRIEVAL_LATENCY.clone()),
            Box::new(RETRIEVAL_RESULTS.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                tracing::error!("Failed to register metric: {}", e);
            }
        }
    });
}

/// Gather all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if encoding fails.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics contained invalid UTF-8: {}", e);
        String::new()
    })
}

/// Point-in-time view of the metrics, for the `stats` command.
#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub indexed_files: f64,
    pub skipped_files: f64,
    pub graph_nodes: f64,
    pub graph_edges: f64,
    pub indexed_chunks: f64,
    pub embedding_requests_total: f64,
    pub embedding_failures_total: f64,
    pub embedding_latency_avg: f64,
    pub retrieval_requests_total: f64,
    pub retrieval_latency_avg: f64,
    pub retrieval_results_avg: f64,
}

impl MetricSnapshot {
    pub fn capture() -> Self {
        Self {
            indexed_files: INDEXED_FILES.get(),
            skipped_files: SKIPPED_FILES.get(),
            graph_nodes: GRAPH_NODES.get(),
            graph_edges: GRAPH_EDGES.get(),
            indexed_chunks: INDEXED_CHUNKS.get(),
            embedding_requests_total: EMBEDDING_REQUESTS.get(),
            embedding_failures_total: EMBEDDING_FAILURES.get(),
            embedding_latency_avg: calculate_histogram_avg(&EMBEDDING_LATENCY),
            retrieval_requests_total: RETRIEVAL_REQUESTS.get(),
            retrieval_latency_avg: calculate_histogram_avg(&RETRIEVAL_LATENCY),
            retrieval_results_avg: calculate_histogram_avg(&RETRIEVAL_RESULTS),
        }
    }
}

fn calculate_histogram_avg(histogram: &Histogram) -> f64 {
    let count = histogram.get_sample_count();
    if count == 0 {
        return 0.0;
    }
    histogram.get_sample_sum() / count as f64
}
