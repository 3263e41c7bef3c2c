//! Per-file work: read, resolve the language, parse and extract.
//!
//! Everything here is pure with respect to the graph, so it can run on any
//! worker thread. The results are assembled into the graph afterwards.

use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::UNIX_EPOCH;

use tracing::debug;

use super::errors::{ErrorCollector, ProcessingStage};
use crate::indexer::{extract, Extraction, WalkedFile};
use crate::languages::ParserPool;
use crate::text::LineIndex;

/// Facts gathered from one source file
#[derive(Debug, Clone)]
pub struct FileFacts {
    pub rel_path: String,
    pub lang: &'static str,
    pub source: String,
    pub lines: LineIndex,
    /// blake3 of the raw bytes, hex
    pub content_hash: String,
    /// Seconds since the epoch, 0 when unavailable
    pub mtime: i64,
    pub size: u64,
    pub extraction: Extraction,
}

/// What happened to one walked file
#[derive(Debug)]
pub enum FileOutcome {
    Parsed(Box<FileFacts>),
    /// No registered language handles the extension
    Unsupported,
    /// Recorded in the error collector
    Failed,
}

/// Read, parse and extract one file. Soft failures go to `errors`.
pub fn process_file(
    file: &WalkedFile,
    pool: &mut ParserPool<'_>,
    errors: &ErrorCollector,
) -> FileOutcome {
    let Some(spec) = pool.registry().resolve(&file.path).copied() else {
        debug!(path = %file.rel_path, "unsupported file type, skipping");
        return FileOutcome::Unsupported;
    };

    let bytes = match fs::read(&file.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            errors.record(&file.rel_path, e, ProcessingStage::FileRead);
            return FileOutcome::Failed;
        }
    };
    let content_hash = blake3::hash(&bytes).to_hex().to_string();
    let size = bytes.len() as u64;
    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(e) => {
            errors.record(&file.rel_path, e, ProcessingStage::FileRead);
            return FileOutcome::Failed;
        }
    };

    if pool.parser(&spec).is_none() {
        errors.record(
            &file.rel_path,
            format!("grammar for {} is unavailable", spec.id),
            ProcessingStage::Language,
        );
        return FileOutcome::Failed;
    }
    let Some(tree) = pool.parse(&spec, &source) else {
        errors.record(&file.rel_path, "parser returned no tree", ProcessingStage::Parse);
        return FileOutcome::Failed;
    };
    if tree.root_node().has_error() {
        debug!(path = %file.rel_path, "syntax errors present, extracting what parsed");
    }

    let extracted = catch_unwind(AssertUnwindSafe(|| extract(tree.root_node(), &spec, &source)));
    let extraction = match extracted {
        Ok(extraction) => extraction,
        Err(_) => {
            errors.record(&file.rel_path, "panic during extraction", ProcessingStage::Parse);
            return FileOutcome::Failed;
        }
    };

    let mtime = fs::metadata(&file.path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    debug!(
        path = %file.rel_path,
        lang = spec.id,
        defs = extraction.defs.len(),
        calls = extraction.calls.len(),
        "extracted file"
    );

    FileOutcome::Parsed(Box::new(FileFacts {
        rel_path: file.rel_path.clone(),
        lang: spec.id,
        lines: LineIndex::new(&source),
        source,
        content_hash,
        mtime,
        size,
        extraction,
    }))
}
