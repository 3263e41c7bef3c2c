//! Descriptor-driven fact extraction from a parsed syntax tree.
//!
//! The walk is iterative over an explicit stack so deeply nested sources
//! cannot exhaust the call stack. Children are pushed in reverse so items
//! come out in source order.

use tree_sitter::Node;

use crate::languages::LanguageSpec;
use crate::text::{self, Location};

const FALLBACK_NAME_CHARS: usize = 48;
const SIGNATURE_CHARS: usize = 160;
const IMPORT_NAME_CHARS: usize = 120;

/// Fields that hold the callee expression of a call site, in lookup order.
const CALLEE_FIELDS: &[&str] = &["function", "macro", "constructor", "name", "type"];

/// A symbol definition candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDef {
    pub name: String,
    /// Grammar node kind, e.g. `function_definition`
    pub syntax_kind: String,
    pub loc: Location,
    pub signature: String,
    /// Index into `Extraction::defs` of the innermost enclosing definition
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawImport {
    pub name: String,
    pub text: String,
    pub loc: Location,
}

/// A call site with its best-guess callee name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCall {
    pub callee: String,
    pub text: String,
    pub loc: Location,
    /// Index into `Extraction::defs` of the calling definition, if any
    pub caller: Option<usize>,
}

/// A comment block. Runs of comments on consecutive lines are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDoc {
    pub text: String,
    pub loc: Location,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub defs: Vec<RawDef>,
    pub imports: Vec<RawImport>,
    pub calls: Vec<RawCall>,
    pub docs: Vec<RawDoc>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
            && self.imports.is_empty()
            && self.calls.is_empty()
            && self.docs.is_empty()
    }
}

/// Walk `root` and collect definitions, imports, call sites and comments.
pub fn extract(root: Node<'_>, spec: &LanguageSpec, source: &str) -> Extraction {
    let mut out = Extraction::default();
    let mut stack: Vec<(Node<'_>, Option<usize>)> = vec![(root, None)];
    let mut cursor = root.walk();

    while let Some((node, enclosing)) = stack.pop() {
        let kind = node.kind();
        let mut scope = enclosing;

        if spec.is_definition(node) {
            let body = node_text(node, source);
            out.defs.push(RawDef {
                name: symbol_name(node, source),
                syntax_kind: kind.to_string(),
                loc: location(node, source),
                signature: text::first_line(body, SIGNATURE_CHARS),
                parent: enclosing,
            });
            scope = Some(out.defs.len() - 1);
        } else if spec.is_import(kind) {
            let body = node_text(node, source);
            out.imports.push(RawImport {
                name: text::first_line(body, IMPORT_NAME_CHARS),
                text: body.to_string(),
                loc: location(node, source),
            });
            // imports never contain anything else worth extracting
            continue;
        } else if spec.is_call(kind) {
            if let Some(callee) = callee_name(node, source) {
                out.calls.push(RawCall {
                    callee,
                    text: node_text(node, source).to_string(),
                    loc: location(node, source),
                    caller: enclosing,
                });
            }
        } else if spec.is_doc(kind) {
            if starts_line(node, source) {
                push_doc(&mut out.docs, node, source);
            }
            continue;
        }

        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, scope)));
    }

    out
}

/// Location of a node. A node whose range ends at the start of a later
/// line (line comments that swallow their newline) ends at the close of
/// the line before.
pub(crate) fn location(node: Node<'_>, source: &str) -> Location {
    let start = node.start_position();
    let end = node.end_position();
    let (end_row, end_col) = if end.column == 0 && end.row > start.row {
        let line = source
            .get(..node.end_byte().saturating_sub(1))
            .map(|head| head.rsplit('\n').next().unwrap_or(head))
            .unwrap_or("");
        (end.row - 1, line.trim_end_matches('\r').len())
    } else {
        (end.row, end.column)
    };
    Location {
        start_line: start.row + 1,
        start_col: start.column,
        end_line: end_row + 1,
        end_col,
        byte_start: node.start_byte(),
        byte_end: node.end_byte(),
    }
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

fn is_identifier_like(kind: &str) -> bool {
    kind.contains("identifier") || kind.contains("name")
}

/// Best-effort definition name.
///
/// Tries the `name` field, then the C-style `declarator` chain, then the
/// `type` field (Rust `impl` blocks), then the first identifier-like
/// child, and finally a truncated slice of the definition text.
fn symbol_name(node: Node<'_>, source: &str) -> String {
    let clean = |n: Node<'_>| text::first_line(node_text(n, source), FALLBACK_NAME_CHARS);

    if let Some(name) = node.child_by_field_name("name") {
        return clean(name);
    }

    let mut declarator = node;
    while let Some(inner) = declarator.child_by_field_name("declarator") {
        declarator = inner;
    }
    if declarator.id() != node.id() && is_identifier_like(declarator.kind()) {
        return clean(declarator);
    }

    if let Some(ty) = node.child_by_field_name("type") {
        return clean(ty);
    }

    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| is_identifier_like(child.kind()));
    match found {
        Some(child) => clean(child),
        None => clean(node),
    }
}

/// Callee name of a call site: last identifier token of the callee
/// expression, else the first identifier token of the whole call.
fn callee_name(node: Node<'_>, source: &str) -> Option<String> {
    let from_field = CALLEE_FIELDS
        .iter()
        .find_map(|field| node.child_by_field_name(field))
        .and_then(|callee| text::identifier_tokens(node_text(callee, source)).last());

    from_field
        .or_else(|| text::identifier_tokens(node_text(node, source)).next())
        .map(str::to_string)
}

/// Whether only whitespace precedes the node on its first line.
fn starts_line(node: Node<'_>, source: &str) -> bool {
    let start = node.start_byte();
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    source[line_start..start].trim().is_empty()
}

fn push_doc(docs: &mut Vec<RawDoc>, node: Node<'_>, source: &str) {
    let loc = location(node, source);
    let body = node_text(node, source);

    if let Some(last) = docs.last_mut() {
        if loc.start_line <= last.loc.end_line + 1 {
            last.text.push('\n');
            last.text.push_str(body);
            last.loc.end_line = loc.end_line;
            last.loc.end_col = loc.end_col;
            last.loc.byte_end = loc.byte_end;
            return;
        }
    }

    docs.push(RawDoc {
        text: body.to_string(),
        loc,
    });
}

/// Strip comment markers, keeping the prose.
pub fn clean_comment(raw: &str) -> String {
    const MARKERS: &[&str] = &["///", "//!", "//", "/**", "/*!", "/*", "*/", "#", "*"];

    raw.lines()
        .map(|line| {
            let mut line = line.trim();
            if let Some(stripped) = line.strip_suffix("*/") {
                line = stripped.trim_end();
            }
            for marker in MARKERS {
                if let Some(stripped) = line.strip_prefix(marker) {
                    line = stripped;
                    break;
                }
            }
            line.trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
