use anyhow::Result;

use codegraph::config::ConfigError;
use codegraph::graph::{EdgeKind, NodeKind};
use codegraph::indexing::IndexState;
use codegraph::search::{Direction, RetrievalMode};

use crate::helpers::test_repo::{options, TestRepo};

fn two_file_repo() -> TestRepo {
    TestRepo::new()
        .with_file("a.py", "from b import bar\n\n\ndef foo():\n    return bar()\n")
        .with_file("b.py", "def bar():\n    return 1\n")
}

#[tokio::test]
async fn test_query_finds_callee_and_its_caller() -> Result<()> {
    let repo = two_file_repo();
    let outcome = repo.index().await?;
    assert_eq!(outcome.report.files_indexed, 2);
    assert_eq!(outcome.report.build.calls_resolved, 1);

    let retriever = repo.retriever();
    assert_eq!(retriever.mode(), RetrievalMode::Lexical);

    let result = retriever.retrieve("bar", &options(10, 1, true)).await?;
    assert_eq!(result.mode, RetrievalMode::Lexical);

    let top = &result.hits[0];
    assert_eq!(top.node.kind, NodeKind::Symbol);
    assert_eq!(top.node.name, "bar");
    assert_eq!(top.node.path, "b.py");
    assert_eq!(top.hop, 0);

    let caller = top
        .edges
        .iter()
        .find(|e| e.direction == Direction::Incoming && e.kind == EdgeKind::Calls)
        .expect("incoming CALLS edge on bar");
    assert_eq!(caller.node_name, "foo");
    assert_eq!(caller.node_kind, NodeKind::Symbol);
    assert_eq!(caller.meta.get("line").and_then(|v| v.as_u64()), Some(5));

    // foo's chunk mentions bar, so foo's code is part of the answer too
    assert!(result.hits.iter().any(|h| h.node.name == "foo#0"));
    Ok(())
}

#[tokio::test]
async fn test_ranked_hits_come_before_expansion() -> Result<()> {
    let repo = two_file_repo();
    repo.index().await?;

    let result = repo.retriever().retrieve("bar", &options(2, 2, false)).await?;
    let hops: Vec<usize> = result.hits.iter().map(|h| h.hop).collect();
    let mut sorted = hops.clone();
    sorted.sort();
    assert_eq!(hops, sorted);
    assert_eq!(hops.iter().filter(|&&h| h == 0).count(), 2);

    let mut ids: Vec<&str> = result.hits.iter().map(|h| h.node.id.as_str()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total, "hits must not repeat a node");
    Ok(())
}

#[tokio::test]
async fn test_zero_hops_returns_only_ranked_nodes() -> Result<()> {
    let repo = two_file_repo();
    repo.index().await?;

    let result = repo.retriever().retrieve("bar", &options(3, 0, false)).await?;
    assert!(!result.hits.is_empty());
    assert!(result.hits.len() <= 3);
    assert!(result.hits.iter().all(|h| h.hop == 0 && h.edges.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_query_without_matches_is_empty() -> Result<()> {
    let repo = two_file_repo();
    repo.index().await?;

    let result = repo.retriever().retrieve("zzzqqq", &options(5, 1, true)).await?;
    assert!(result.hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_queries_are_rejected() -> Result<()> {
    let repo = two_file_repo();
    repo.index().await?;
    let retriever = repo.retriever();

    let err = retriever.retrieve("   ", &options(5, 1, false)).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::EmptyQuery)));

    let err = retriever.retrieve("bar", &options(0, 1, false)).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::InvalidArgument(_))));
    Ok(())
}

#[tokio::test]
async fn test_ignored_directory_contributes_nothing() -> Result<()> {
    let repo = TestRepo::new()
        .with_file("main.py", "def main():\n    pass\n")
        .with_file("vendor/lib.py", "def vendored():\n    pass\n")
        .with_file("pkg/vendor/deep.py", "def deep():\n    pass\n");
    let outcome = repo.index().await?;

    assert_eq!(outcome.report.files_indexed, 1);
    assert!(outcome.graph.nodes().iter().all(|n| !n.path.contains("vendor")));
    assert!(outcome.graph.nodes().iter().any(|n| n.name == "main"));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_file_is_skipped() -> Result<()> {
    let repo = TestRepo::new()
        .with_file("app.py", "def run():\n    pass\n")
        .with_file("notes.xyz", "not code at all\n")
        .with_file("README.md", "# readme\n");
    let outcome = repo.index().await?;

    assert_eq!(outcome.report.files_indexed, 1);
    assert_eq!(outcome.report.files_unsupported, 2);
    assert_eq!(outcome.report.files_failed, 0);
    assert!(!outcome.report.errors.has_errors());
    let files: Vec<&str> = outcome
        .graph
        .nodes_of_kind(NodeKind::File)
        .map(|n| n.path.as_str())
        .collect();
    assert_eq!(files, vec!["app.py"]);
    Ok(())
}

#[tokio::test]
async fn test_undecodable_file_is_reported_not_fatal() -> Result<()> {
    let repo = TestRepo::new().with_file("ok.py", "def ok():\n    pass\n");
    std::fs::write(repo.root().join("bad.py"), [0x66u8, 0x6f, 0xff, 0xfe, 0x0a])?;

    let outcome = repo.index().await?;
    assert_eq!(outcome.report.files_indexed, 1);
    assert_eq!(outcome.report.files_failed, 1);
    assert_eq!(outcome.report.errors.total_errors, 1);
    Ok(())
}

#[tokio::test]
async fn test_filters_limit_the_walk() -> Result<()> {
    let repo = TestRepo::new()
        .with_file("src/core.py", "def core():\n    pass\n")
        .with_file("scripts/tool.py", "def tool():\n    pass\n");
    let mut config = TestRepo::lexical_config();
    config.indexer.filters = vec!["src".to_string()];

    let outcome = repo.index_with(config).await?;
    assert_eq!(outcome.report.files_indexed, 1);
    assert!(outcome.graph.nodes().iter().all(|n| !n.path.starts_with("scripts")));
    Ok(())
}

#[tokio::test]
async fn test_unforced_index_reuses_existing_artifacts() -> Result<()> {
    let repo = two_file_repo();
    let first = repo.index().await?;
    assert!(!first.report.reused);

    let mut indexer = repo.indexer(TestRepo::lexical_config());
    assert_eq!(indexer.state(), IndexState::Indexed);
    let second = indexer.index(false).await?;
    assert!(second.report.reused);
    assert_eq!(second.report.nodes, first.report.nodes);
    assert_eq!(second.report.edges, first.report.edges);
    Ok(())
}

#[tokio::test]
async fn test_reindex_is_deterministic() -> Result<()> {
    let repo = two_file_repo().with_file(
        "c.py",
        r#"# Helper.
def helper(x):
    return foo() + x


class Thing:
    def go(self):
        return helper(1)
"#,
    );
    let first = repo.index().await?;
    let second = repo.index().await?;

    let ids = |o: &codegraph::IndexOutcome| -> Vec<String> {
        o.graph.nodes().iter().map(|n| n.id.clone()).collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.graph.edges(), second.graph.edges());
    Ok(())
}
