use anyhow::Result;
use std::collections::BTreeSet;

use codegraph::graph::{CodeGraph, EdgeKind, NodeKind};

use crate::helpers::test_repo::TestRepo;

fn symbols_in<'g>(graph: &'g CodeGraph, path: &str) -> BTreeSet<&'g str> {
    graph
        .nodes_of_kind(NodeKind::Symbol)
        .filter(|n| n.path == path)
        .map(|n| n.name.as_str())
        .collect()
}

fn calls(graph: &CodeGraph) -> BTreeSet<(String, String)> {
    graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Calls)
        .filter_map(|e| Some((graph.node(&e.from)?.name.clone(), graph.node(&e.to)?.name.clone())))
        .collect()
}

fn languages_repo() -> TestRepo {
    TestRepo::new()
        .with_file(
            "lib.rs",
            r#"pub struct Parser;

pub enum Token { Word }

fn tokenize(s: &str) -> Vec<Token> {
    Vec::new()
}

pub fn parse(s: &str) {
    tokenize(s);
}
"#,
        )
        .with_file(
            "shapes.py",
            r#"import math


class Circle:
    def area(self):
        return square(self.r)


def square(x):
    return x * x
"#,
        )
        .with_file(
            "app.js",
            r#"import { render } from './view';

function boot() {
  return new App();
}

class App {
  start() {
    boot();
  }
}

const handler = async (req) => {
  return boot(req);
};

const retries = 3;
"#,
        )
        .with_file(
            "types.ts",
            r#"export interface Options {
  verbose: boolean;
}

export type Mode = 'fast' | 'slow';

export function configure(o: Options): Mode {
  return 'fast';
}

export const apply = function (o: Options): Mode {
  return configure(o);
};
"#,
        )
        .with_file(
            "server.go",
            r#"package server

import "fmt"

type Server struct{}

func (s *Server) Run() {
	listen()
}

func listen() {
	fmt.Println("up")
}
"#,
        )
        .with_file(
            "Main.java",
            r#"import java.util.List;

public class Main {
    public static void main(String[] args) {
        helper();
    }

    static void helper() {}
}
"#,
        )
        .with_file(
            "util.c",
            r#"#include <stdio.h>

struct point { int x; int y; };

static int twice(int v) {
    return v * 2;
}

int compute(void) {
    return twice(21);
}
"#,
        )
}

#[tokio::test]
async fn test_symbols_across_languages() -> Result<()> {
    let repo = languages_repo();
    let outcome = repo.index().await?;
    let graph = &outcome.graph;
    assert_eq!(outcome.report.files_indexed, 7);
    assert_eq!(outcome.report.files_failed, 0);

    let expected: [(&str, &[&str]); 7] = [
        ("lib.rs", &["Parser", "Token", "tokenize", "parse"]),
        ("shapes.py", &["Circle", "area", "square"]),
        ("app.js", &["boot", "App", "start", "handler"]),
        ("types.ts", &["Options", "Mode", "configure", "apply"]),
        ("server.go", &["Server", "Run", "listen"]),
        ("Main.java", &["Main", "main", "helper"]),
        ("util.c", &["point", "twice", "compute"]),
    ];
    for (path, names) in expected {
        let found = symbols_in(graph, path);
        let wanted: BTreeSet<&str> = names.iter().copied().collect();
        assert_eq!(found, wanted, "symbols of {}", path);
    }
    Ok(())
}

#[tokio::test]
async fn test_calls_across_languages() -> Result<()> {
    let repo = languages_repo();
    let outcome = repo.index().await?;
    let edges = calls(&outcome.graph);

    for (caller, callee) in [
        ("parse", "tokenize"),
        ("area", "square"),
        ("start", "boot"),
        ("boot", "App"),
        ("handler", "boot"),
        ("apply", "configure"),
        ("Run", "listen"),
        ("main", "helper"),
        ("compute", "twice"),
    ] {
        assert!(
            edges.contains(&(caller.to_string(), callee.to_string())),
            "missing {} -> {} in {:?}",
            caller,
            callee,
            edges
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_imports_become_nodes() -> Result<()> {
    let repo = languages_repo();
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let mut import_files: Vec<&str> = graph
        .nodes_of_kind(NodeKind::Import)
        .map(|n| n.path.as_str())
        .collect();
    import_files.sort();
    import_files.dedup();
    assert_eq!(import_files, vec!["Main.java", "app.js", "server.go", "shapes.py", "util.c"]);

    for import in graph.nodes_of_kind(NodeKind::Import) {
        assert!(import.code.as_deref().is_some_and(|c| !c.is_empty()));
        let file = graph
            .incoming(&import.id)
            .find(|e| e.kind == EdgeKind::Contains)
            .and_then(|e| graph.node(&e.from))
            .expect("containing file");
        assert_eq!(file.kind, NodeKind::File);
        assert_eq!(file.path, import.path);
    }
    Ok(())
}

#[tokio::test]
async fn test_chunks_carry_symbol_code() -> Result<()> {
    let repo = languages_repo();
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let chunk = graph
        .nodes_of_kind(NodeKind::Chunk)
        .find(|n| n.name == "square#0")
        .expect("square chunk");
    assert_eq!(chunk.code.as_deref(), Some("def square(x):\n    return x * x"));
    assert_eq!(chunk.signature.as_deref(), Some("def square(x):"));
    assert_eq!(chunk.lang.as_deref(), Some("python"));
    Ok(())
}
