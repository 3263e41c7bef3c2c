//! Language registry: maps file extensions to grammar descriptors.
//!
//! A descriptor names the syntax-node kinds that count as symbol
//! definitions, imports, call sites and documentation for one language.
//! Grammars are loaded lazily the first time a language is used and the
//! outcome (including failure) is memoized per registry instance, so tests
//! can build isolated registries instead of sharing hidden global state.

mod builtin;
mod parser_pool;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, warn};
use tree_sitter::{Language, Node, Parser};

pub use parser_pool::ParserPool;

/// Static description of how to read one language's syntax tree.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSpec {
    /// Stable identifier, recorded as `lang` on graph nodes
    pub id: &'static str,
    /// Lower-case extensions without the leading dot
    pub extensions: &'static [&'static str],
    pub symbol_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    pub doc_kinds: &'static [&'static str],
    /// Symbol kinds that only count as definitions when they carry a `body`
    /// field (`struct Foo x;` in C is a use, not a definition)
    pub body_required: &'static [&'static str],
    /// Symbol kinds that only count as definitions when their `value` field
    /// is a function (`const f = () => {}` but not `const n = 1`)
    pub value_required: &'static [&'static str],
    pub grammar: fn() -> Language,
}

impl LanguageSpec {
    pub fn is_symbol(&self, kind: &str) -> bool {
        self.symbol_kinds.contains(&kind)
    }

    pub fn is_import(&self, kind: &str) -> bool {
        self.import_kinds.contains(&kind)
    }

    pub fn is_call(&self, kind: &str) -> bool {
        self.call_kinds.contains(&kind)
    }

    pub fn is_doc(&self, kind: &str) -> bool {
        self.doc_kinds.contains(&kind)
    }

    pub fn requires_body(&self, kind: &str) -> bool {
        self.body_required.contains(&kind)
    }

    pub fn requires_function_value(&self, kind: &str) -> bool {
        self.value_required.contains(&kind)
    }

    /// Whether `node` is a symbol definition, applying the `body` and
    /// `value` gates on top of the kind table.
    pub fn is_definition(&self, node: Node<'_>) -> bool {
        let kind = node.kind();
        if !self.is_symbol(kind) {
            return false;
        }
        if self.requires_body(kind) && node.child_by_field_name("body").is_none() {
            return false;
        }
        if self.requires_function_value(kind) {
            return node
                .child_by_field_name("value")
                .is_some_and(|value| FUNCTION_VALUE_KINDS.contains(&value.kind()));
        }
        true
    }
}

/// Expression kinds that make a variable binding a function definition.
const FUNCTION_VALUE_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Extension -> descriptor lookup with memoized grammar loading.
pub struct LanguageRegistry {
    specs: Vec<LanguageSpec>,
    by_extension: HashMap<String, usize>,
    grammars: Mutex<HashMap<&'static str, Option<Language>>>,
}

impl LanguageRegistry {
    /// Empty registry; every file is unsupported until languages are registered.
    pub fn empty() -> Self {
        Self {
            specs: Vec::new(),
            by_extension: HashMap::new(),
            grammars: Mutex::new(HashMap::new()),
        }
    }

    /// Registry with every built-in language.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for spec in builtin::all() {
            registry.register(spec);
        }
        registry
    }

    /// Register a language. Later registrations win for shared extensions.
    pub fn register(&mut self, spec: LanguageSpec) {
        let idx = self.specs.len();
        for ext in spec.extensions {
            self.by_extension.insert(ext.to_ascii_lowercase(), idx);
        }
        self.specs.push(spec);
    }

    /// Descriptor for a path, or `None` when the extension is not registered.
    pub fn resolve(&self, path: &Path) -> Option<&LanguageSpec> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.by_extension.get(&ext).map(|&i| &self.specs[i])
    }

    /// Descriptor by language id.
    pub fn get(&self, id: &str) -> Option<&LanguageSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    /// Loaded grammar for a language, or `None` if it failed to load.
    ///
    /// The load is validated against the linked tree-sitter runtime once;
    /// both successes and failures are cached.
    pub fn grammar(&self, spec: &LanguageSpec) -> Option<Language> {
        let mut cache = match self.grammars.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache
            .entry(spec.id)
            .or_insert_with(|| {
                let language = (spec.grammar)();
                let mut parser = Parser::new();
                match parser.set_language(&language) {
                    Ok(()) => {
                        debug!(lang = spec.id, "loaded grammar");
                        Some(language)
                    }
                    Err(e) => {
                        warn!(
                            lang = spec.id,
                            error = %e,
                            "grammar failed to load, language disabled"
                        );
                        None
                    }
                }
            })
            .clone()
    }

    /// Number of grammars loaded or attempted so far.
    pub fn loaded_grammars(&self) -> usize {
        self.grammars.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageSpec> {
        self.specs.iter()
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.specs.iter().map(|s| s.id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_extension() {
        let registry = LanguageRegistry::with_builtins();
        assert_eq!(registry.resolve(Path::new("src/main.rs")).map(|s| s.id), Some("rust"));
        assert_eq!(registry.resolve(Path::new("pkg/mod.py")).map(|s| s.id), Some("python"));
        assert_eq!(registry.resolve(Path::new("App.TSX")).map(|s| s.id), Some("tsx"));
        assert_eq!(registry.resolve(Path::new("lib.hpp")).map(|s| s.id), Some("cpp"));
        assert_eq!(registry.resolve(Path::new("main.go")).map(|s| s.id), Some("go"));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let registry = LanguageRegistry::with_builtins();
        assert!(registry.resolve(Path::new("notes.txt")).is_none());
        assert!(registry.resolve(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_grammar_loaded_lazily_and_memoized() {
        let registry = LanguageRegistry::with_builtins();
        assert_eq!(registry.loaded_grammars(), 0);

        let spec = *registry.get("python").unwrap();
        assert!(registry.grammar(&spec).is_some());
        assert!(registry.grammar(&spec).is_some());
        assert_eq!(registry.loaded_grammars(), 1);
    }

    #[test]
    fn test_registries_are_isolated() {
        let first = LanguageRegistry::with_builtins();
        let second = LanguageRegistry::with_builtins();
        let spec = *first.get("rust").unwrap();
        first.grammar(&spec);
        assert_eq!(first.loaded_grammars(), 1);
        assert_eq!(second.loaded_grammars(), 0);
    }

    #[test]
    fn test_empty_registry_supports_nothing() {
        let mut registry = LanguageRegistry::empty();
        assert!(!registry.supports(Path::new("a.py")));

        let python = *LanguageRegistry::with_builtins().get("python").unwrap();
        registry.register(python);
        assert!(registry.supports(Path::new("a.py")));
        assert!(!registry.supports(Path::new("a.rs")));
    }
}
