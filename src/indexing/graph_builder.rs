//! Graph assembly from per-file facts.
//!
//! Runs on a single thread over facts sorted by path. The first pass adds
//! every FILE, SYMBOL, CHUNK, IMPORT and COMMENT node with its structural
//! edges; the second resolves call sites against the complete symbol table,
//! so CALLS edges never depend on file order.

use tracing::debug;

use super::pipeline::FileFacts;
use crate::graph::{CodeGraph, EdgeKind, GraphEdge, GraphNode, NodeKind};
use crate::indexer::extractor::clean_comment;
use crate::indexer::{RawDef, SymbolChunker};
use crate::symbol::{Resolution, SymbolTable};
use crate::text;

const COMMENT_NAME_CHARS: usize = 48;
const CHUNK_SIGNATURE_CHARS: usize = 120;

/// Node and edge tallies for one assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files: usize,
    pub symbols: usize,
    pub chunks: usize,
    pub imports: usize,
    pub comments: usize,
    pub calls_resolved: usize,
    pub calls_ambiguous: usize,
    pub calls_unknown: usize,
}

pub struct GraphBuilder<'a> {
    repo_id: &'a str,
    chunker: SymbolChunker,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(repo_id: &'a str, max_lines: usize) -> Self {
        Self {
            repo_id,
            chunker: SymbolChunker::new(max_lines),
        }
    }

    /// Build the whole graph. `facts` must be sorted by path.
    pub fn build(
        &self,
        repo_name: &str,
        root: &str,
        facts: &[FileFacts],
    ) -> (CodeGraph, BuildStats) {
        let mut graph = CodeGraph::new();
        let mut stats = BuildStats::default();

        let repo = GraphNode::new(self.repo_id, NodeKind::Repo, repo_name, "", None)
            .with_meta("root", root);
        let repo_id = repo.id.clone();
        graph.add_node(repo);

        let mut symbol_ids: Vec<Vec<String>> = Vec::with_capacity(facts.len());
        let mut file_ids: Vec<String> = Vec::with_capacity(facts.len());
        for file in facts {
            let (file_id, ids) = self.add_file(&mut graph, &repo_id, file, &mut stats);
            file_ids.push(file_id);
            symbol_ids.push(ids);
        }

        let table = SymbolTable::from_graph(&graph);
        for ((file, file_id), ids) in facts.iter().zip(&file_ids).zip(&symbol_ids) {
            self.link_calls(&mut graph, &table, file, file_id, ids, &mut stats);
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            calls = stats.calls_resolved,
            "assembled graph"
        );
        (graph, stats)
    }

    /// First pass for one file. Returns the FILE id and the SYMBOL ids in
    /// definition order.
    fn add_file(
        &self,
        graph: &mut CodeGraph,
        repo_id: &str,
        file: &FileFacts,
        stats: &mut BuildStats,
    ) -> (String, Vec<String>) {
        let path = file.rel_path.as_str();
        let file_node = GraphNode::new(self.repo_id, NodeKind::File, path, path, None)
            .with_lang(file.lang)
            .with_meta("content_hash", file.content_hash.as_str())
            .with_meta("mtime", file.mtime)
            .with_meta("size", file.size)
            .with_meta("lines", file.lines.line_count());
        let file_id = file_node.id.clone();
        graph.add_node(file_node);
        graph.add_edge(GraphEdge::new(repo_id, file_id.as_str(), EdgeKind::Contains));
        stats.files += 1;

        let defs = &file.extraction.defs;
        let mut ids = Vec::with_capacity(defs.len());
        for def in defs {
            let id = self.add_symbol(graph, file, &file_id, def, defs, stats);
            ids.push(id);
        }

        for import in &file.extraction.imports {
            let name = import.name.as_str();
            let node = GraphNode::new(self.repo_id, NodeKind::Import, name, path, Some(import.loc))
                .with_lang(file.lang)
                .with_code(import.text.as_str());
            let id = node.id.clone();
            if graph.add_node(node) {
                graph.add_edge(GraphEdge::new(file_id.as_str(), id, EdgeKind::Contains));
                stats.imports += 1;
            }
        }

        for doc in &file.extraction.docs {
            let cleaned = clean_comment(&doc.text);
            let mut node = GraphNode::new(
                self.repo_id,
                NodeKind::Comment,
                text::first_line(&cleaned, COMMENT_NAME_CHARS),
                path,
                Some(doc.loc),
            )
            .with_lang(file.lang)
            .with_code(doc.text.as_str());
            node.doc = Some(cleaned.clone());
            let id = node.id.clone();
            if !graph.add_node(node) {
                continue;
            }
            graph.add_edge(GraphEdge::new(file_id.as_str(), id.as_str(), EdgeKind::Contains));
            stats.comments += 1;

            if let Some(target) = documented_symbol(defs, doc.loc.end_line) {
                let target_id = &ids[target];
                graph.add_edge(GraphEdge::new(id, target_id.as_str(), EdgeKind::DocsFor));
                if let Some(symbol) = graph.node_mut(target_id) {
                    symbol.doc.get_or_insert(cleaned);
                }
            }
        }

        (file_id, ids)
    }

    fn add_symbol(
        &self,
        graph: &mut CodeGraph,
        file: &FileFacts,
        file_id: &str,
        def: &RawDef,
        defs: &[RawDef],
        stats: &mut BuildStats,
    ) -> String {
        let path = file.rel_path.as_str();
        let chunks = self.chunker.chunk_symbol(&file.source, &file.lines, &def.loc);

        let name = def.name.as_str();
        let mut symbol = GraphNode::new(self.repo_id, NodeKind::Symbol, name, path, Some(def.loc))
            .with_lang(file.lang)
            .with_signature(def.signature.as_str())
            .with_meta("node_type", def.syntax_kind.as_str())
            .with_meta("chunks", chunks.len());
        if let Some(parent) = def.parent.and_then(|i| defs.get(i)) {
            symbol = symbol.with_meta("parent", parent.name.as_str());
        }
        let symbol_id = symbol.id.clone();
        if !graph.add_node(symbol) {
            // Identical name and location twice in one file: keep the first.
            return symbol_id;
        }
        graph.add_edge(GraphEdge::new(file_id, symbol_id.as_str(), EdgeKind::Contains));
        stats.symbols += 1;

        let mut previous: Option<String> = None;
        for chunk in chunks {
            let node = GraphNode::new(
                self.repo_id,
                NodeKind::Chunk,
                format!("{}#{}", def.name, chunk.index),
                path,
                Some(chunk.loc),
            )
            .with_lang(file.lang)
            .with_signature(text::first_line(&chunk.code, CHUNK_SIGNATURE_CHARS))
            .with_code(chunk.code)
            .with_meta("symbol", def.name.as_str())
            .with_meta("index", chunk.index)
            .with_meta("total", chunk.total);
            let chunk_id = node.id.clone();
            graph.add_node(node);
            graph.add_edge(GraphEdge::new(symbol_id.as_str(), chunk_id.as_str(), EdgeKind::PartOf));
            if let Some(prev) = previous.take() {
                graph.add_edge(GraphEdge::new(prev, chunk_id.as_str(), EdgeKind::NextChunk));
            }
            previous = Some(chunk_id);
            stats.chunks += 1;
        }

        symbol_id
    }

    /// Second pass for one file: one CALLS edge per caller/callee pair,
    /// annotated with the first call-site line.
    fn link_calls(
        &self,
        graph: &mut CodeGraph,
        table: &SymbolTable,
        file: &FileFacts,
        file_id: &str,
        symbol_ids: &[String],
        stats: &mut BuildStats,
    ) {
        for call in &file.extraction.calls {
            let caller = call
                .caller
                .and_then(|i| symbol_ids.get(i))
                .map(String::as_str)
                .unwrap_or(file_id);

            match table.resolve(&call.callee, &file.rel_path) {
                Resolution::Resolved(callee) => {
                    let edge = GraphEdge::new(caller, callee.node_id.as_str(), EdgeKind::Calls)
                        .with_meta("line", call.loc.start_line);
                    graph.add_edge(edge);
                    stats.calls_resolved += 1;
                }
                Resolution::Ambiguous(candidates) => {
                    debug!(
                        path = %file.rel_path,
                        callee = %call.callee,
                        candidates,
                        "ambiguous call left unresolved"
                    );
                    stats.calls_ambiguous += 1;
                }
                Resolution::Unknown => stats.calls_unknown += 1,
            }
        }
    }
}

/// Index of the nearest definition starting at or after `end_line`,
/// earliest start byte on ties.
fn documented_symbol(defs: &[RawDef], end_line: usize) -> Option<usize> {
    defs.iter()
        .enumerate()
        .filter(|(_, def)| def.loc.start_line >= end_line)
        .min_by_key(|(_, def)| (def.loc.start_line, def.loc.byte_start))
        .map(|(i, _)| i)
}
