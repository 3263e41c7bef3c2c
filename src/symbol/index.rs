//! In-memory symbol table used to resolve call sites to definitions.

use std::collections::HashMap;
use tracing::debug;

use crate::graph::{CodeGraph, NodeKind};

/// Reference to a SYMBOL node.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRef {
    pub node_id: String,
    pub name: String,
    /// Grammar node kind of the definition
    pub kind: String,
    pub path: String,
    pub start_line: usize,
}

/// Outcome of resolving a callee name.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(SymbolRef),
    /// Several candidates in the deciding scope; nothing is guessed
    Ambiguous(usize),
    Unknown,
}

impl Resolution {
    pub fn resolved(&self) -> Option<&SymbolRef> {
        match self {
            Resolution::Resolved(symbol) => Some(symbol),
            _ => None,
        }
    }
}

/// Per-file and repository-wide name registry.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, Vec<SymbolRef>>,
    by_file: HashMap<String, HashMap<String, Vec<SymbolRef>>>,
    symbol_count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every SYMBOL node of a graph, in graph order.
    pub fn from_graph(graph: &CodeGraph) -> Self {
        let mut table = Self::new();
        for node in graph.nodes_of_kind(NodeKind::Symbol) {
            table.add(SymbolRef {
                node_id: node.id.clone(),
                name: node.name.clone(),
                kind: node
                    .meta
                    .get("node_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                path: node.path.clone(),
                start_line: node.start_line(),
            });
        }
        debug!(
            symbols = table.symbol_count,
            files = table.by_file.len(),
            "built symbol table"
        );
        table
    }

    pub fn add(&mut self, symbol: SymbolRef) {
        self.by_file
            .entry(symbol.path.clone())
            .or_default()
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol.clone());
        self.by_name.entry(symbol.name.clone()).or_default().push(symbol);
        self.symbol_count += 1;
    }

    /// Resolve `name` as seen from a call site in `path`.
    ///
    /// A single same-file definition wins. Several same-file definitions are
    /// ambiguous. With none in the file, a name defined exactly once in the
    /// whole repository resolves to that definition.
    pub fn resolve(&self, name: &str, path: &str) -> Resolution {
        let local = self
            .by_file
            .get(path)
            .and_then(|names| names.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match local {
            [only] => return Resolution::Resolved(only.clone()),
            [] => {}
            many => return Resolution::Ambiguous(many.len()),
        }

        match self.find_by_name(name) {
            [only] => Resolution::Resolved(only.clone()),
            [] => Resolution::Unknown,
            many => Resolution::Ambiguous(many.len()),
        }
    }

    pub fn find_by_name(&self, name: &str) -> &[SymbolRef] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.symbol_count
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_count == 0
    }
}
