use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use codegraph::cli::{Cli, Commands};
use codegraph::commands::index::IndexArgs;
use codegraph::config::Config;
use codegraph::logging::{init_early_logging, init_logging};
use codegraph::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the working directory's config; the index
    // command re-reads config from its own root.
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match Config::load(&project_root) {
        Ok(config) => config,
        Err(e) => {
            init_early_logging();
            return Err(e);
        }
    };
    let _logging_guard = init_logging(&config.logging, &project_root)?;
    tracing::debug!("Loaded configuration from: {}", project_root.display());

    metrics::register_metrics();

    match cli.command {
        Commands::Index {
            root,
            out,
            max_lines,
            no_embed,
            force,
            filters,
            threads,
        } => {
            let args = IndexArgs {
                root,
                out,
                max_lines,
                no_embed,
                force,
                filters,
                threads,
            };
            codegraph::commands::index::run(args).await?;
        }
        Commands::Query {
            text,
            out,
            k,
            hops,
            meta,
            json,
        } => {
            codegraph::commands::query::run(&text, out, k, hops, meta, json).await?;
        }
        Commands::Stats { out, prometheus } => {
            codegraph::commands::stats::run(out, prometheus).await?;
        }
    }

    Ok(())
}
