//! Per-worker cache of configured tree-sitter parsers.

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::{Parser, Tree};

use super::{LanguageRegistry, LanguageSpec};

/// One parser per language, created on first use and reused afterwards.
///
/// `Parser` is not shareable across threads, so each parallel worker owns
/// its own pool borrowing the shared registry.
pub struct ParserPool<'r> {
    registry: &'r LanguageRegistry,
    parsers: HashMap<&'static str, Parser>,
}

impl<'r> ParserPool<'r> {
    pub fn new(registry: &'r LanguageRegistry) -> Self {
        Self {
            registry,
            parsers: HashMap::new(),
        }
    }

    /// Parser configured for `spec`, or `None` when its grammar is unavailable.
    pub fn parser(&mut self, spec: &LanguageSpec) -> Option<&mut Parser> {
        if !self.parsers.contains_key(spec.id) {
            let language = self.registry.grammar(spec)?;
            let mut parser = Parser::new();
            if let Err(e) = parser.set_language(&language) {
                debug!(lang = spec.id, error = %e, "failed to configure parser");
                return None;
            }
            self.parsers.insert(spec.id, parser);
        }
        self.parsers.get_mut(spec.id)
    }

    /// Parse `source`. `None` means no grammar or the parser gave up.
    pub fn parse(&mut self, spec: &LanguageSpec, source: &str) -> Option<Tree> {
        self.parser(spec)?.parse(source, None)
    }

    pub fn registry(&self) -> &'r LanguageRegistry {
        self.registry
    }
}
