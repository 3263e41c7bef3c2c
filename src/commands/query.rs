use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::search::{Direction, Retrieval, RetrieveOptions, Retriever};

const MAX_SIGNATURE_CHARS: usize = 120;

/// Run the query command against the index in `out` (default `./.codegraph`).
pub async fn run(
    text: &str,
    out: Option<PathBuf>,
    k: Option<usize>,
    hops: Option<usize>,
    meta: bool,
    json: bool,
) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ConfigError::EmptyQuery.into());
    }
    if k == Some(0) {
        return Err(ConfigError::InvalidArgument("--k must be at least 1".to_string()).into());
    }

    let cwd = env::current_dir()?;
    let config = Config::load(&cwd)?;
    let dir = out.unwrap_or_else(|| Config::index_dir(&cwd));

    let mut options = RetrieveOptions::from(&config.search);
    options.k = k.unwrap_or(options.k);
    options.hops = hops.unwrap_or(options.hops);
    options.with_meta = meta;

    let retriever = Retriever::load(&dir, &config.embeddings)
        .with_context(|| format!("Failed to load index from {}", dir.display()))?;
    let retrieval = retriever.retrieve(text, &options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&retrieval)?);
    } else {
        print_results(text, &retrieval);
    }
    Ok(())
}

fn print_results(query: &str, retrieval: &Retrieval) {
    if retrieval.hits.is_empty() {
        println!("No results found for: {}", query);
        return;
    }

    println!(
        "Found {} results for: \"{}\" ({} mode)\n",
        retrieval.hits.len(),
        query,
        retrieval.mode
    );

    for (i, hit) in retrieval.hits.iter().enumerate() {
        let node = &hit.node;
        let location = match node.loc {
            Some(loc) => format!("{}:{}-{}", node.path, loc.start_line, loc.end_line),
            None => node.path.clone(),
        };
        let rank = if hit.hop == 0 {
            format!("score: {:.3}", hit.score)
        } else {
            format!("hop {}", hit.hop)
        };
        println!("{}. [{}] {} {} ({})", i + 1, node.kind, node.name, location, rank);
        println!("   {}", node.snippet(MAX_SIGNATURE_CHARS));

        for edge in &hit.edges {
            let arrow = match edge.direction {
                Direction::Outgoing => "->",
                Direction::Incoming => "<-",
            };
            println!(
                "     {} {} [{}] {}: {}",
                arrow, edge.kind, edge.node_kind, edge.node_name, edge.snippet
            );
        }
    }
}
