//! Retrieval over a loaded index.
//!
//! This module contains:
//! - `traits` - Common `Search` trait for ranking implementations
//! - `lexical` - token-overlap ranking over the inverted index
//! - `vector` - cosine ranking over chunk embeddings
//! - `retriever` - mode selection, neighborhood expansion and edge annotation

mod lexical;
pub mod retriever;
pub mod traits;
mod vector;

pub use lexical::LexicalSearch;
pub use retriever::{
    Direction, EdgeMeta, Retrieval, RetrievalHit, RetrievalMode, RetrieveOptions, Retriever,
};
pub use traits::{ScoredNode, Search};
pub use vector::{cosine_similarity, VectorSearch};
