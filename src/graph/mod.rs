//! In-memory code graph: typed nodes keyed by deterministic ids, typed
//! directed edges, and forward/reverse adjacency for neighbor lookups in
//! either direction.
//!
//! The graph is add-only. Nodes keep their insertion order, which is the
//! tie-break order used by retrieval.

mod edge;
mod node;

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

pub use edge::{EdgeKind, GraphEdge};
pub use node::{node_id, GraphNode, NodeKind};

/// Directed multigraph of code facts.
#[derive(Debug, Clone, Default)]
pub struct CodeGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_keys: HashSet<(String, String, EdgeKind)>,
    /// node id -> indices into `edges` leaving that node
    outgoing: HashMap<String, Vec<usize>>,
    /// node id -> indices into `edges` entering that node
    incoming: HashMap<String, Vec<usize>>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted parts, dropping edges with missing endpoints.
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }

    /// Insert a node. Returns `false` if a node with the same id already exists.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Edges whose endpoints are unknown, or which repeat an existing
    /// `(from, to, kind)` triple, are dropped and `false` is returned.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.index.contains_key(&edge.from) || !self.index.contains_key(&edge.to) {
            debug!(
                from = %edge.from,
                to = %edge.to,
                kind = %edge.kind,
                "dropping edge with missing endpoint"
            );
            return false;
        }
        let key = (edge.from.clone(), edge.to.clone(), edge.kind);
        if !self.edge_keys.insert(key) {
            return false;
        }
        let idx = self.edges.len();
        self.outgoing.entry(edge.from.clone()).or_default().push(idx);
        self.incoming.entry(edge.to.clone()).or_default().push(idx);
        self.edges.push(edge);
        true
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.index.get(id).map(|&i| &mut self.nodes[i])
    }

    /// Insertion position of a node, used as a stable tie-break.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.iter_mut()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Edges leaving `id`, in insertion order.
    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.adjacent(&self.outgoing, id)
    }

    /// Edges entering `id`, in insertion order.
    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.adjacent(&self.incoming, id)
    }

    fn adjacent<'a>(
        &'a self,
        adjacency: &'a HashMap<String, Vec<usize>>,
        id: &str,
    ) -> impl Iterator<Item = &'a GraphEdge> {
        adjacency
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.edges[i])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_nodes_by_kind(&self) -> BTreeMap<NodeKind, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_edges_by_kind(&self) -> BTreeMap<EdgeKind, usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.edges {
            *counts.entry(edge.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Number of CHUNK nodes carrying an embedding.
    pub fn embedded_chunk_count(&self) -> usize {
        self.nodes_of_kind(NodeKind::Chunk)
            .filter(|n| n.embedding.is_some())
            .count()
    }
}
