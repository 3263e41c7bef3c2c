use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the on-disk layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// Summary of one persisted index, written last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub repo_id: String,
    pub root: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dimension: Option<usize>,
    pub files: usize,
    pub nodes: usize,
    pub edges: usize,
    pub embedded_chunks: usize,
}

impl Manifest {
    pub fn is_compatible(&self) -> bool {
        self.format_version == FORMAT_VERSION
    }
}
