use anyhow::Result;
use std::collections::HashMap;

use codegraph::graph::{CodeGraph, EdgeKind, GraphNode, NodeKind};

use crate::helpers::test_repo::TestRepo;

const SERVICE_RS: &str = r#"use std::collections::HashMap;

/// In-memory key/value store.
pub struct Store {
    items: HashMap<String, String>,
}

impl Store {
    pub fn new() -> Self {
        Self { items: HashMap::new() }
    }

    /// Insert a value, returning the old one.
    pub fn put(&mut self, key: &str, value: &str) -> Option<String> {
        validate(key);
        self.items.insert(key.to_string(), value.to_string())
    }
}

fn validate(key: &str) {
    assert!(!key.is_empty());
}
"#;

fn long_function(lines: usize) -> String {
    let mut body = String::from("def long_one():\n");
    for i in 0..lines {
        body.push_str(&format!("    x{} = {}\n", i, i));
    }
    body.push_str("    return 0\n");
    body
}

fn incoming_of_kind<'g>(graph: &'g CodeGraph, id: &str, kind: EdgeKind) -> Vec<&'g GraphNode> {
    graph
        .incoming(id)
        .filter(|e| e.kind == kind)
        .filter_map(|e| graph.node(&e.from))
        .collect()
}

#[tokio::test]
async fn test_every_edge_endpoint_exists() -> Result<()> {
    let repo = TestRepo::new()
        .with_file("src/service.rs", SERVICE_RS)
        .with_file("util.py", "def helper():\n    return 1\n");
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    assert!(graph.edge_count() > 0);
    for edge in graph.edges() {
        assert!(graph.node(&edge.from).is_some(), "dangling source {:?}", edge);
        assert!(graph.node(&edge.to).is_some(), "dangling target {:?}", edge);
    }
    Ok(())
}

#[tokio::test]
async fn test_every_chunk_belongs_to_one_symbol() -> Result<()> {
    let repo = TestRepo::new()
        .with_file("src/service.rs", SERVICE_RS)
        .with_file("long.py", &long_function(150));
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let chunks: Vec<&GraphNode> = graph.nodes_of_kind(NodeKind::Chunk).collect();
    assert!(!chunks.is_empty());
    for chunk in chunks {
        let owners = incoming_of_kind(graph, &chunk.id, EdgeKind::PartOf);
        assert_eq!(owners.len(), 1, "chunk {} has {} owners", chunk.name, owners.len());
        assert_eq!(owners[0].kind, NodeKind::Symbol);
        assert_eq!(owners[0].path, chunk.path);
    }
    Ok(())
}

#[tokio::test]
async fn test_every_node_is_reachable_from_the_repo() -> Result<()> {
    let repo = TestRepo::new().with_file("src/service.rs", SERVICE_RS);
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let repos: Vec<&GraphNode> = graph.nodes_of_kind(NodeKind::Repo).collect();
    assert_eq!(repos.len(), 1);

    for node in graph.nodes().iter().filter(|n| n.kind != NodeKind::Repo) {
        let parents = graph
            .incoming(&node.id)
            .filter(|e| matches!(e.kind, EdgeKind::Contains | EdgeKind::PartOf))
            .count();
        assert!(parents >= 1, "{} {} has no structural parent", node.kind, node.name);
    }
    Ok(())
}

#[tokio::test]
async fn test_long_symbol_chunks_are_ordered() -> Result<()> {
    let repo = TestRepo::new().with_file("long.py", &long_function(150));
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let symbol = graph
        .nodes_of_kind(NodeKind::Symbol)
        .find(|n| n.name == "long_one")
        .expect("long_one symbol");
    let chunks: Vec<&GraphNode> = graph
        .outgoing(&symbol.id)
        .filter(|e| e.kind == EdgeKind::PartOf)
        .filter_map(|e| graph.node(&e.to))
        .collect();
    // 152 lines at 60 per chunk
    assert_eq!(chunks.len(), 3);

    // Walk the NEXT_CHUNK chain from the chunk nobody points to.
    let first = chunks
        .iter()
        .find(|c| incoming_of_kind(graph, &c.id, EdgeKind::NextChunk).is_empty())
        .expect("chain head");
    let mut order = vec![first.name.clone()];
    let mut current = first.id.clone();
    while let Some(next) = graph.outgoing(&current).find(|e| e.kind == EdgeKind::NextChunk) {
        let node = graph.node(&next.to).expect("next chunk");
        order.push(node.name.clone());
        current = node.id.clone();
    }
    assert_eq!(order, vec!["long_one#0", "long_one#1", "long_one#2"]);

    let mut previous_end = 0;
    for name in &order {
        let chunk = chunks.iter().find(|c| &c.name == name).expect("chunk");
        let loc = chunk.loc.expect("chunk location");
        assert!(loc.start_line > previous_end);
        assert!(loc.line_span() <= 60);
        previous_end = loc.end_line;
    }
    assert_eq!(previous_end, 152);
    Ok(())
}

#[tokio::test]
async fn test_doc_comments_attach_to_following_symbol() -> Result<()> {
    let repo = TestRepo::new().with_file("src/service.rs", SERVICE_RS);
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let documented: HashMap<&str, Vec<&str>> = graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::DocsFor)
        .filter_map(|e| Some((graph.node(&e.from)?, graph.node(&e.to)?)))
        .fold(HashMap::new(), |mut acc, (comment, symbol)| {
            acc.entry(symbol.name.as_str()).or_default().push(comment.name.as_str());
            acc
        });

    assert_eq!(documented.get("Store"), Some(&vec!["In-memory key/value store."]));
    assert_eq!(documented.get("put"), Some(&vec!["Insert a value, returning the old one."]));

    let store = graph
        .nodes_of_kind(NodeKind::Symbol)
        .find(|n| {
            n.name == "Store"
                && n.meta.get("node_type").and_then(|v| v.as_str()) == Some("struct_item")
        })
        .expect("Store struct");
    assert_eq!(store.doc.as_deref(), Some("In-memory key/value store."));
    Ok(())
}

#[tokio::test]
async fn test_method_call_links_to_free_function() -> Result<()> {
    let repo = TestRepo::new().with_file("src/service.rs", SERVICE_RS);
    let outcome = repo.index().await?;
    let graph = &outcome.graph;

    let validate = graph
        .nodes_of_kind(NodeKind::Symbol)
        .find(|n| n.name == "validate")
        .expect("validate symbol");
    let callers: Vec<&str> = incoming_of_kind(graph, &validate.id, EdgeKind::Calls)
        .into_iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(callers, vec!["put"]);
    Ok(())
}

#[tokio::test]
async fn test_file_nodes_carry_content_facts() -> Result<()> {
    let repo = TestRepo::new().with_file("util.py", "def helper():\n    return 1\n");
    let outcome = repo.index().await?;

    let file = outcome
        .graph
        .nodes_of_kind(NodeKind::File)
        .next()
        .expect("file node");
    assert_eq!(file.path, "util.py");
    assert_eq!(file.lang.as_deref(), Some("python"));
    assert_eq!(file.meta.get("lines").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(
        file.meta.get("content_hash").and_then(|v| v.as_str()).map(str::len),
        Some(64)
    );
    Ok(())
}
