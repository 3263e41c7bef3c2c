//! Index command implementation.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::indexing::{GraphIndexer, IndexOutcome};

/// Arguments of `codegraph index`.
#[derive(Debug, Clone, Default)]
pub struct IndexArgs {
    pub root: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub max_lines: Option<usize>,
    pub no_embed: bool,
    pub force: bool,
    pub filters: Vec<String>,
    pub threads: Option<usize>,
}

/// Run the index command.
///
/// Configuration comes from `<root>/.codegraph/config.toml`; flags override
/// it. Invalid settings abort before anything is read or written.
pub async fn run(args: IndexArgs) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(ConfigError::MissingRoot(root).into());
    }

    let mut config = Config::load(&root)?;
    if let Some(max_lines) = args.max_lines {
        config.indexer.max_lines = max_lines;
    }
    if let Some(threads) = args.threads {
        if threads == 0 {
            let message = "--threads must be at least 1".to_string();
            return Err(ConfigError::InvalidArgument(message).into());
        }
        config.indexer.parallel_threads = Some(threads);
    }
    config.indexer.filters.extend(args.filters);
    config.validate()?;

    let embed = config.embeddings.enabled && !args.no_embed;
    let mut indexer = GraphIndexer::new(&root, config)?.with_embeddings(embed);
    if let Some(out) = args.out {
        indexer = indexer.with_out_dir(out);
    }

    let outcome = indexer.index(args.force).await?;
    print_summary(&indexer, &outcome);
    Ok(())
}

fn print_summary(indexer: &GraphIndexer, outcome: &IndexOutcome) {
    let report = &outcome.report;
    println!("Repository: {}", indexer.root().display());
    println!("Index: {}", indexer.store().dir().display());

    if report.reused {
        println!(
            "Index already present ({} nodes, {} edges). Use --force to rebuild.",
            report.nodes, report.edges
        );
        return;
    }

    println!(
        "Indexed {} files ({} nodes, {} edges) in {:.2}s",
        report.files_indexed,
        report.nodes,
        report.edges,
        report.duration.as_secs_f64()
    );
    for (kind, count) in outcome.graph.count_nodes_by_kind() {
        println!("  {:<8} {}", kind, count);
    }
    if report.files_unsupported > 0 {
        println!("Skipped {} files with no registered language", report.files_unsupported);
    }

    match (&report.embedding_provider, &report.embedding) {
        (Some(provider), Some(embed)) => {
            println!("Embedded {} chunks with {}", embed.embedded, provider);
            if let Some(reason) = &report.fallback_reason {
                println!("  (configured provider unavailable: {})", reason);
            }
        }
        _ => println!("Embeddings: disabled"),
    }

    if report.errors.has_errors() {
        report.errors.print_summary();
    }
}
