//! Descriptors for the grammars linked into the binary.

use super::LanguageSpec;

pub(super) fn all() -> Vec<LanguageSpec> {
    vec![PYTHON, RUST, JAVASCRIPT, TYPESCRIPT, TSX, GO, JAVA, C, CPP]
}

const PYTHON: LanguageSpec = LanguageSpec {
    id: "python",
    extensions: &["py", "pyi"],
    symbol_kinds: &["function_definition", "class_definition"],
    import_kinds: &["import_statement", "import_from_statement"],
    call_kinds: &["call"],
    doc_kinds: &["comment"],
    body_required: &[],
    value_required: &[],
    grammar: || tree_sitter_python::LANGUAGE.into(),
};

const RUST: LanguageSpec = LanguageSpec {
    id: "rust",
    extensions: &["rs"],
    symbol_kinds: &[
        "function_item",
        "struct_item",
        "enum_item",
        "union_item",
        "trait_item",
        "impl_item",
        "mod_item",
        "type_item",
        "const_item",
        "static_item",
        "macro_definition",
    ],
    import_kinds: &["use_declaration", "extern_crate_declaration"],
    call_kinds: &["call_expression", "macro_invocation"],
    doc_kinds: &["line_comment", "block_comment"],
    body_required: &["mod_item"],
    value_required: &[],
    grammar: || tree_sitter_rust::LANGUAGE.into(),
};

const JS_SYMBOLS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "method_definition",
    "variable_declarator",
];

const JAVASCRIPT: LanguageSpec = LanguageSpec {
    id: "javascript",
    extensions: &["js", "jsx", "mjs", "cjs"],
    symbol_kinds: JS_SYMBOLS,
    import_kinds: &["import_statement"],
    call_kinds: &["call_expression", "new_expression"],
    doc_kinds: &["comment"],
    body_required: &[],
    value_required: &["variable_declarator"],
    grammar: || tree_sitter_javascript::LANGUAGE.into(),
};

const TS_SYMBOLS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "abstract_class_declaration",
    "method_definition",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
    "variable_declarator",
];

const TYPESCRIPT: LanguageSpec = LanguageSpec {
    id: "typescript",
    extensions: &["ts", "mts", "cts"],
    symbol_kinds: TS_SYMBOLS,
    import_kinds: &["import_statement"],
    call_kinds: &["call_expression", "new_expression"],
    doc_kinds: &["comment"],
    body_required: &[],
    value_required: &["variable_declarator"],
    grammar: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
};

const TSX: LanguageSpec = LanguageSpec {
    id: "tsx",
    extensions: &["tsx"],
    grammar: || tree_sitter_typescript::LANGUAGE_TSX.into(),
    ..TYPESCRIPT
};

const GO: LanguageSpec = LanguageSpec {
    id: "go",
    extensions: &["go"],
    symbol_kinds: &["function_declaration", "method_declaration", "type_spec"],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    doc_kinds: &["comment"],
    body_required: &[],
    value_required: &[],
    grammar: || tree_sitter_go::LANGUAGE.into(),
};

const JAVA: LanguageSpec = LanguageSpec {
    id: "java",
    extensions: &["java"],
    symbol_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
        "method_declaration",
        "constructor_declaration",
    ],
    import_kinds: &["import_declaration"],
    call_kinds: &["method_invocation", "object_creation_expression"],
    doc_kinds: &["line_comment", "block_comment"],
    body_required: &[],
    value_required: &[],
    grammar: || tree_sitter_java::LANGUAGE.into(),
};

const C: LanguageSpec = LanguageSpec {
    id: "c",
    extensions: &["c", "h"],
    symbol_kinds: &[
        "function_definition",
        "struct_specifier",
        "enum_specifier",
        "union_specifier",
        "type_definition",
    ],
    import_kinds: &["preproc_include"],
    call_kinds: &["call_expression"],
    doc_kinds: &["comment"],
    body_required: &["struct_specifier", "enum_specifier", "union_specifier"],
    value_required: &[],
    grammar: || tree_sitter_c::LANGUAGE.into(),
};

const CPP: LanguageSpec = LanguageSpec {
    id: "cpp",
    extensions: &["cc", "cpp", "cxx", "c++", "hpp", "hh", "hxx", "h++"],
    symbol_kinds: &[
        "function_definition",
        "class_specifier",
        "struct_specifier",
        "enum_specifier",
        "union_specifier",
        "namespace_definition",
        "type_definition",
    ],
    import_kinds: &["preproc_include", "using_declaration"],
    call_kinds: &["call_expression", "new_expression"],
    doc_kinds: &["comment"],
    body_required: &[
        "class_specifier",
        "struct_specifier",
        "enum_specifier",
        "union_specifier",
    ],
    value_required: &[],
    grammar: || tree_sitter_cpp::LANGUAGE.into(),
};
