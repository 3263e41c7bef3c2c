//! Token -> node id lexical index.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::graph::CodeGraph;

/// Lowercase `text` and split it on runs of characters outside `[a-z0-9_]`.
///
/// Queries go through the same function so lookups match index-time tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Postings list per token, each holding node ids in graph order without repeats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the name, signature and code of every node.
    pub fn build(graph: &CodeGraph) -> Self {
        let mut index = Self::new();
        for node in graph.nodes() {
            let fields = [
                Some(node.name.as_str()),
                node.signature.as_deref(),
                node.code.as_deref(),
            ];
            for text in fields.into_iter().flatten() {
                for token in tokenize(text) {
                    index.insert(token, &node.id);
                }
            }
        }
        index
    }

    fn insert(&mut self, token: String, id: &str) {
        let ids = self.postings.entry(token).or_default();
        // Nodes are indexed one at a time, so a repeat is always the last entry.
        if ids.last().map(String::as_str) != Some(id) {
            ids.push(id.to_string());
        }
    }

    pub fn lookup(&self, token: &str) -> &[String] {
        self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Count, per node id, how many query tokens hit it. A token repeated in
    /// the query is looked up, and counted, once per occurrence.
    pub fn match_counts(&self, query: &str) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokenize(query) {
            for id in self.lookup(token) {
                *counts.entry(id.as_str()).or_default() += 1;
            }
        }
        counts
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
