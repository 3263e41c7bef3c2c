use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of directed relation between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Structural parent -> child (REPO -> FILE, FILE -> SYMBOL/IMPORT/COMMENT)
    Contains,
    /// SYMBOL -> CHUNK
    PartOf,
    /// CHUNK -> following CHUNK of the same symbol
    NextChunk,
    /// caller -> callee
    Calls,
    /// COMMENT -> documented SYMBOL
    DocsFor,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 5] = [
        EdgeKind::Contains,
        EdgeKind::PartOf,
        EdgeKind::NextChunk,
        EdgeKind::Calls,
        EdgeKind::DocsFor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::PartOf => "PART_OF",
            EdgeKind::NextChunk => "NEXT_CHUNK",
            EdgeKind::Calls => "CALLS",
            EdgeKind::DocsFor => "DOCS_FOR",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}
