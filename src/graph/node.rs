use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::text::Location;

/// Kind of fact a graph node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Repo,
    File,
    Symbol,
    Chunk,
    Comment,
    Import,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Repo,
        NodeKind::File,
        NodeKind::Symbol,
        NodeKind::Chunk,
        NodeKind::Comment,
        NodeKind::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Repo => "REPO",
            NodeKind::File => "FILE",
            NodeKind::Symbol => "SYMBOL",
            NodeKind::Chunk => "CHUNK",
            NodeKind::Comment => "COMMENT",
            NodeKind::Import => "IMPORT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Deterministic node identity derived from its defining facts.
///
/// Re-indexing unchanged source produces the same id for the same node.
pub fn node_id(
    repo_id: &str,
    path: &str,
    kind: NodeKind,
    name: &str,
    loc: Option<&Location>,
) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [repo_id, path, kind.as_str(), name] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    if let Some(loc) = loc {
        hasher.update(loc.fingerprint().as_bytes());
    }
    hasher.finalize().to_hex().as_str()[..32].to_string()
}

/// A typed fact about the indexed code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    /// Repository-relative path with `/` separators; empty for the REPO node
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
    /// One-line summary, usually the first line of the definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Verbatim source slice; SYMBOL nodes leave this to their chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    /// Never written to the graph document; persisted in the embeddings blob
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl GraphNode {
    /// Create a node whose id is derived from `repo_id` and the identifying fields.
    pub fn new(
        repo_id: &str,
        kind: NodeKind,
        name: impl Into<String>,
        path: impl Into<String>,
        loc: Option<Location>,
    ) -> Self {
        let name = name.into();
        let path = path.into();
        Self {
            id: node_id(repo_id, &path, kind, &name, loc.as_ref()),
            kind,
            name,
            path,
            lang: None,
            loc,
            signature: None,
            code: None,
            doc: None,
            meta: Map::new(),
            embedding: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Start line, or 0 for nodes without a location.
    pub fn start_line(&self) -> usize {
        self.loc.map(|l| l.start_line).unwrap_or(0)
    }

    /// Short human-readable preview: signature, then code, then name.
    pub fn snippet(&self, max_chars: usize) -> String {
        let source = self
            .signature
            .as_deref()
            .or(self.code.as_deref())
            .unwrap_or(&self.name);
        crate::text::first_line(source, max_chars)
    }
}
