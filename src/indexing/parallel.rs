//! Parallel file processing using Rayon

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use super::errors::ErrorCollector;
use super::pipeline::{process_file, FileFacts, FileOutcome};
use crate::indexer::WalkedFile;
use crate::languages::{LanguageRegistry, ParserPool};

/// Result of the parallel parse stage
#[derive(Debug, Default)]
pub struct ParsedFiles {
    /// Sorted by repository-relative path
    pub facts: Vec<FileFacts>,
    pub unsupported: usize,
    pub failed: usize,
}

/// Parse every file on a Rayon pool, one `ParserPool` per worker.
///
/// `threads` of `None` uses one thread per core. Output order does not
/// depend on scheduling: facts are sorted by path before returning.
pub fn parse_files(
    files: &[WalkedFile],
    registry: &LanguageRegistry,
    errors: &ErrorCollector,
    threads: Option<usize>,
    progress: &ProgressBar,
) -> Result<ParsedFiles> {
    let threads = threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("codegraph-parse-{i}"))
        .build()
        .context("Failed to initialize Rayon thread pool")?;
    info!("Using {} threads for parallel parsing", threads);

    let outcomes: Vec<FileOutcome> = pool.install(|| {
        files
            .par_iter()
            .map_init(
                || ParserPool::new(registry),
                |parsers, file| {
                    let outcome = process_file(file, parsers, errors);
                    progress.inc(1);
                    outcome
                },
            )
            .collect()
    });

    let mut parsed = ParsedFiles::default();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Parsed(facts) => parsed.facts.push(*facts),
            FileOutcome::Unsupported => parsed.unsupported += 1,
            FileOutcome::Failed => parsed.failed += 1,
        }
    }
    parsed.facts.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(parsed)
}

/// File progress bar; hidden when `visible` is false.
pub fn create_progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            )
            .expect("valid progress template")
            .progress_chars("#>-"),
    );
    pb
}
