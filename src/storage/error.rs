use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures reading or writing index artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no graph document at {0}; run `codegraph index` first")]
    GraphMissing(PathBuf),

    #[error("corrupt embeddings blob: {0}")]
    CorruptEmbeddings(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path) -> impl FnOnce(serde_json::Error) -> Self + '_ {
        move |source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
