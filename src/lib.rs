pub mod cli;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod graph;
pub mod indexer;
pub mod indexing;
pub mod languages;
pub mod logging;
pub mod metrics;
pub mod search;
pub mod storage;
pub mod symbol;
pub mod text;

pub use config::{Config, ConfigError};
pub use graph::{CodeGraph, EdgeKind, GraphEdge, GraphNode, NodeKind};
pub use indexing::{GraphIndexer, IndexOutcome, IndexReport, IndexState};
pub use search::{Retrieval, RetrievalMode, RetrieveOptions, Retriever};
pub use storage::{IndexStore, LoadedIndex, StorageError};
