//! In-memory weighted graph keyed by normalized text.
//!
//! Uses an undirected `petgraph` graph for structure and a `HashMap` from key
//! to `NodeIndex` for O(1) node lookups. Keys passed in are expected to be
//! normalized already; the owning graph types take care of that.

use std::collections::{HashMap, HashSet};

use petgraph::algo::astar;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::error::GraphError;
use crate::normalize::normalize_key;

use super::{EdgeRecord, GraphSnapshot, NodeData, NodeKind, NodeRecord, Related};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Undirected graph with at most one weighted edge per unordered pair.
#[derive(Clone, Default)]
pub struct WeightedGraph {
    graph: UnGraph<NodeData, f64>,
    /// key → NodeIndex mapping.
    index: HashMap<String, NodeIndex>,
}

impl WeightedGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from its persisted form.
    ///
    /// Keys are normalized, so hand-edited files stay reachable; records whose
    /// key normalizes to nothing are skipped. Edges naming unknown nodes create
    /// `concept` nodes; duplicate pairs are merged by summing their weights.
    /// Negative weights are clamped to zero and non-finite ones are dropped.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let mut graph = Self::new();
        for record in &snapshot.nodes {
            let id = normalize_key(&record.id);
            if id.is_empty() {
                continue;
            }
            let (idx, _) = graph.upsert(&id, record.kind);
            let data = &mut graph.graph[idx];
            data.kind = record.kind;
            data.value = record.value.clone();
            data.impact = record.impact.filter(|i| i.is_finite());
        }
        for edge in &snapshot.edges {
            if !edge.weight.is_finite() {
                tracing::warn!(source = %edge.source, target = %edge.target, "dropping non-finite edge weight");
                continue;
            }
            let (source, target) = (normalize_key(&edge.source), normalize_key(&edge.target));
            if source.is_empty() || target.is_empty() {
                continue;
            }
            graph.upsert(&source, NodeKind::Concept);
            graph.upsert(&target, NodeKind::Concept);
            graph.accumulate(&source, &target, edge.weight.max(0.0));
        }
        graph
    }

    /// Persisted form: nodes in insertion order, edges in insertion order.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.graph.node_weights().map(NodeRecord::from).collect(),
            edges: self.edges(),
        }
    }

    /// Ensure a node exists, returning its index and whether it was created.
    ///
    /// An existing node keeps its kind.
    pub fn upsert(&mut self, key: &str, kind: NodeKind) -> (NodeIndex, bool) {
        if let Some(idx) = self.index.get(key) {
            return (*idx, false);
        }
        let idx = self.graph.add_node(NodeData::new(key, kind));
        self.index.insert(key.to_string(), idx);
        (idx, true)
    }

    /// Check if a node exists.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&NodeData> {
        self.index.get(key).map(|idx| &self.graph[*idx])
    }

    pub fn node_mut(&mut self, key: &str) -> Option<&mut NodeData> {
        let idx = *self.index.get(key)?;
        Some(&mut self.graph[idx])
    }

    fn edge_between(&self, a: &str, b: &str) -> Option<EdgeIndex> {
        let a = *self.index.get(a)?;
        let b = *self.index.get(b)?;
        self.graph.find_edge(a, b)
    }

    /// Weight of the edge between two keys, if any.
    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        self.edge_between(a, b).map(|e| self.graph[e])
    }

    /// Add `delta` to the edge between two existing nodes, creating the edge
    /// if needed. Returns the new weight, or `None` if a node is missing.
    pub fn accumulate(&mut self, a: &str, b: &str, delta: f64) -> Option<f64> {
        let ai = *self.index.get(a)?;
        let bi = *self.index.get(b)?;
        let weight = match self.graph.find_edge(ai, bi) {
            Some(e) => {
                let w = &mut self.graph[e];
                *w = (*w + delta).max(0.0);
                *w
            }
            None => {
                let w = delta.max(0.0);
                self.graph.add_edge(ai, bi, w);
                w
            }
        };
        Some(weight)
    }

    /// Add `delta` to an existing edge only. Returns `None` if there is no edge.
    /// Weights never drop below zero.
    pub fn adjust(&mut self, a: &str, b: &str, delta: f64) -> Option<f64> {
        let e = self.edge_between(a, b)?;
        let w = &mut self.graph[e];
        *w = (*w + delta).max(0.0);
        Some(*w)
    }

    /// Keys adjacent to `key` (empty if absent). A self-loop does not make a
    /// node its own neighbor.
    pub fn neighbors(&self, key: &str) -> Vec<&str> {
        match self.index.get(key) {
            Some(idx) => self
                .graph
                .neighbors(*idx)
                .filter(|n| n != idx)
                .map(|n| self.graph[n].key.as_str())
                .collect(),
            None => vec![],
        }
    }

    /// Number of distinct nodes adjacent to both keys, the keys themselves excluded.
    pub fn common_neighbors(&self, a: &str, b: &str) -> usize {
        let left: HashSet<&str> = self.neighbors(a).into_iter().collect();
        let right: HashSet<&str> = self.neighbors(b).into_iter().collect();
        left.intersection(&right)
            .filter(|&&key| key != a && key != b)
            .count()
    }

    /// Neighbors with edge weight ≥ `threshold`, sorted by weight desc then key asc.
    pub fn related(&self, key: &str, threshold: f64) -> Vec<Related> {
        let Some(idx) = self.index.get(key) else {
            return vec![];
        };
        let mut related: Vec<Related> = self
            .graph
            .edges(*idx)
            .filter(|e| *e.weight() >= threshold)
            .filter(|e| e.source() != e.target())
            .map(|e| {
                let other = if e.source() == *idx { e.target() } else { e.source() };
                Related {
                    key: self.graph[other].key.clone(),
                    weight: *e.weight(),
                }
            })
            .collect();
        related.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.key.cmp(&b.key)));
        related
    }

    /// Shortest path by hop count, including both endpoints.
    /// Returns `None` if either key is absent or no path exists.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let from_idx = *self.index.get(from)?;
        let to_idx = *self.index.get(to)?;
        let (_cost, path) = astar(&self.graph, from_idx, |n| n == to_idx, |_| 1usize, |_| 0usize)?;
        Some(path.into_iter().map(|idx| self.graph[idx].key.clone()).collect())
    }

    /// All node keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|n| n.key.as_str())
    }

    /// All nodes of a given kind.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights().filter(move |n| n.kind == kind)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights()
    }

    /// All edges as records.
    pub fn edges(&self) -> Vec<EdgeRecord> {
        self.graph
            .edge_references()
            .map(|e| EdgeRecord {
                source: self.graph[e.source()].key.clone(),
                target: self.graph[e.target()].key.clone(),
                weight: *e.weight(),
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl std::fmt::Debug for WeightedGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
