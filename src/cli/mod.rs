use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(author, version, about = "Code graph indexer and retriever")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a repository into a code graph
    Index {
        /// Repository root (default: current directory)
        root: Option<PathBuf>,

        /// Artifact directory (default: <root>/.codegraph)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Maximum lines per chunk
        #[arg(long)]
        max_lines: Option<usize>,

        /// Skip the embedding step
        #[arg(long)]
        no_embed: bool,

        /// Rebuild even if an index already exists
        #[arg(short, long)]
        force: bool,

        /// Only index paths matching this glob or directory (repeatable)
        #[arg(long = "filter", value_name = "GLOB")]
        filters: Vec<String>,

        /// Parser threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Query an index
    Query {
        /// Query text
        text: String,

        /// Artifact directory (default: ./.codegraph)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of ranked hits
        #[arg(short, long)]
        k: Option<usize>,

        /// Neighborhood expansion hops
        #[arg(long)]
        hops: Option<usize>,

        /// Show edges connected to each hit
        #[arg(long)]
        meta: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics and metrics
    Stats {
        /// Artifact directory (default: ./.codegraph)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output in Prometheus format
        #[arg(long)]
        prometheus: bool,
    },
}
