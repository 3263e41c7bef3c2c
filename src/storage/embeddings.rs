//! Packed embedding vectors.
//!
//! `embeddings.bin` holds every vector back to back as little-endian `f32`.
//! `embeddings.json` records the provider, the shared dimension and, per
//! node id, the byte offset and element count of its slice.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{StorageError, StorageResult};
use crate::graph::{CodeGraph, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSlot {
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    pub provider: String,
    pub dimension: usize,
    pub entries: BTreeMap<String, EmbeddingSlot>,
}

/// Pack the embedded CHUNK nodes of `graph`, in graph order.
///
/// Returns `None` when no chunk carries a vector.
pub fn pack(graph: &CodeGraph, provider: &str) -> StorageResult<Option<(EmbeddingIndex, Vec<u8>)>> {
    let mut entries = BTreeMap::new();
    let mut blob = Vec::new();
    let mut dimension = None;

    for node in graph.nodes_of_kind(NodeKind::Chunk) {
        let Some(vector) = node.embedding.as_ref() else {
            continue;
        };
        match dimension {
            None => dimension = Some(vector.len()),
            Some(d) if d != vector.len() => {
                return Err(StorageError::CorruptEmbeddings(format!(
                    "node {} has {} dimensions, expected {}",
                    node.id,
                    vector.len(),
                    d
                )));
            }
            Some(_) => {}
        }
        entries.insert(
            node.id.clone(),
            EmbeddingSlot {
                offset: blob.len(),
                len: vector.len(),
            },
        );
        for value in vector {
            blob.extend_from_slice(&value.to_le_bytes());
        }
    }

    Ok(dimension.map(|dimension| {
        (
            EmbeddingIndex {
                provider: provider.to_string(),
                dimension,
                entries,
            },
            blob,
        )
    }))
}

/// Attach vectors from `blob` to the nodes named in `index`.
///
/// Entries for ids absent from the graph are ignored. Returns the number of
/// nodes that received a vector.
pub fn unpack(graph: &mut CodeGraph, index: &EmbeddingIndex, blob: &[u8]) -> StorageResult<usize> {
    let mut attached = 0;
    for (id, slot) in &index.entries {
        if slot.len != index.dimension {
            return Err(StorageError::CorruptEmbeddings(format!(
                "entry {} has length {}, index dimension is {}",
                id, slot.len, index.dimension
            )));
        }
        let end = slot
            .len
            .checked_mul(4)
            .and_then(|n| slot.offset.checked_add(n))
            .ok_or_else(|| {
                StorageError::CorruptEmbeddings(format!(
                    "entry {} has offset {} and length {} past the addressable range",
                    id, slot.offset, slot.len
                ))
            })?;
        let bytes = blob.get(slot.offset..end).ok_or_else(|| {
            StorageError::CorruptEmbeddings(format!(
                "entry {} spans bytes {}..{} but the blob holds {}",
                id,
                slot.offset,
                end,
                blob.len()
            ))
        })?;
        let vector: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        match graph.node_mut(id) {
            Some(node) => {
                node.embedding = Some(vector);
                attached += 1;
            }
            None => debug!(id = %id, "embedding for unknown node ignored"),
        }
    }
    Ok(attached)
}

pub fn write(
    dir: &Path,
    index_file: &str,
    blob_file: &str,
    index: &EmbeddingIndex,
    blob: &[u8],
) -> StorageResult<()> {
    let blob_path = dir.join(blob_file);
    fs::write(&blob_path, blob).map_err(StorageError::io(&blob_path))?;

    let index_path = dir.join(index_file);
    let json = serde_json::to_vec_pretty(index).map_err(StorageError::json(&index_path))?;
    fs::write(&index_path, json).map_err(StorageError::io(&index_path))?;
    Ok(())
}

/// Read both embedding files; `None` when either is absent.
pub fn read(
    dir: &Path,
    index_file: &str,
    blob_file: &str,
) -> StorageResult<Option<(EmbeddingIndex, Vec<u8>)>> {
    let index_path = dir.join(index_file);
    let blob_path = dir.join(blob_file);
    if !index_path.exists() || !blob_path.exists() {
        return Ok(None);
    }

    let json = fs::read(&index_path).map_err(StorageError::io(&index_path))?;
    let index: EmbeddingIndex =
        serde_json::from_slice(&json).map_err(StorageError::json(&index_path))?;
    let blob = fs::read(&blob_path).map_err(StorageError::io(&blob_path))?;
    Ok(Some((index, blob)))
}
