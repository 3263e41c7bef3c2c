//! Symbol registry
//!
//! Keeps every extracted definition addressable by name, per file and across
//! the repository, so call sites can be linked to their callees once all
//! files have been parsed.

pub mod index;

pub use index::{Resolution, SymbolRef, SymbolTable};
