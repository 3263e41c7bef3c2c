pub mod chunker;
pub mod extractor;
pub mod walker;

pub use chunker::{Chunk, SymbolChunker, DEFAULT_MAX_LINES};
pub use extractor::{extract, Extraction, RawCall, RawDef, RawDoc, RawImport};
pub use walker::{WalkedFile, Walker};
