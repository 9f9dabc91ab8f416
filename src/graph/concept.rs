//! The factual concept graph.
//!
//! [`ConceptStore`] is the one interface the reasoning layer sees. The
//! concrete [`ConceptGraph`] normalizes every key it is handed and writes the
//! whole graph back to disk after each mutation (see [`crate::store`]).
//! Whether it persists is decided at construction: [`ConceptGraph::in_memory`]
//! or [`ConceptGraph::open`].

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::GraphError;
use crate::normalize::normalize_key;
use crate::store::{StoreResult, WriteThrough};

use super::weight::WeightModel;
use super::{GraphResult, GraphSnapshot, NodeKind, Related, WeightedGraph};

/// Operations the reasoning engine needs from a concept graph.
pub trait ConceptStore {
    /// Normalize `key` and create a `concept` node if absent. Returns the
    /// normalized key.
    fn upsert_node(&mut self, key: &str) -> String;

    /// Ensure both nodes exist, then add `weight` to their edge (creating it
    /// if needed). Returns the resulting weight.
    fn add_or_reinforce_edge(&mut self, a: &str, b: &str, weight: f64) -> f64;

    /// Neighbors with weight ≥ `threshold`, heaviest first. Empty if `key` is absent.
    fn related(&self, key: &str, threshold: f64) -> Vec<Related>;

    /// Add `delta` to an existing edge. Fails with
    /// [`GraphError::InvalidRelation`] when the pair has no edge; the caller
    /// decides whether to create one.
    fn reinforce(&mut self, a: &str, b: &str, delta: f64) -> GraphResult<f64>;

    /// Read access to the underlying graph.
    fn graph(&self) -> &WeightedGraph;

    fn contains(&self, key: &str) -> bool {
        self.graph().contains(&normalize_key(key))
    }
}

/// Write-through concept graph.
#[derive(Debug)]
pub struct ConceptGraph {
    graph: WeightedGraph,
    sink: WriteThrough,
}

impl ConceptGraph {
    /// An empty graph that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            graph: WeightedGraph::new(),
            sink: WriteThrough::memory_only(),
        }
    }

    /// Load from `path` (empty if missing or corrupt) and persist there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let sink = WriteThrough::to_file(path);
        let snapshot: GraphSnapshot = sink.load();
        let graph = WeightedGraph::from_snapshot(&snapshot);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "concept graph loaded"
        );
        Self { graph, sink }
    }

    /// Write the full graph now, reporting failures.
    pub fn persist(&self) -> StoreResult<()> {
        self.sink.save(&self.graph.snapshot())
    }

    fn write_through(&self) {
        self.sink.write(&self.graph.snapshot());
    }

    fn upsert_quiet(&mut self, key: &str) -> String {
        let key = normalize_key(key);
        let (_, created) = self.graph.upsert(&key, NodeKind::Concept);
        if created {
            tracing::debug!(concept = %key, "concept created");
        }
        key
    }

    fn accumulate_quiet(&mut self, a: &str, b: &str, weight: f64) -> f64 {
        let a = self.upsert_quiet(a);
        let b = self.upsert_quiet(b);
        let total = self.graph.accumulate(&a, &b, weight).unwrap_or(0.0);
        tracing::debug!(from = %a, to = %b, delta = weight, weight = total, "edge reinforced");
        total
    }

    /// Add a memory edge using the dynamic weight when both concepts are
    /// already known, and `base_weight` otherwise. Returns the resulting weight.
    pub fn add_memory<F>(&mut self, a: &str, b: &str, base_weight: f64, similarity: F) -> f64
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        let total = self.add_memory_quiet(a, b, base_weight, &similarity);
        self.write_through();
        total
    }

    fn add_memory_quiet<F>(&mut self, a: &str, b: &str, base_weight: f64, similarity: &F) -> f64
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        let (a, b) = (normalize_key(a), normalize_key(b));
        let increment = if self.graph.contains(&a) && self.graph.contains(&b) {
            WeightModel::dynamic_weight(&self.graph, &a, &b, similarity)
        } else {
            base_weight
        };
        self.accumulate_quiet(&a, &b, increment)
    }

    /// Connect every distinct pair of co-occurring keywords. Persists once.
    /// Returns the number of pairs touched.
    pub fn learn_keywords<F>(&mut self, keywords: &[String], similarity: F) -> usize
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        let mut seen = HashSet::new();
        let keys: Vec<String> = keywords
            .iter()
            .map(|k| normalize_key(k))
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        for key in &keys {
            self.upsert_quiet(key);
        }
        let mut pairs = 0;
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                self.add_memory_quiet(a, b, 1.0, &similarity);
                pairs += 1;
            }
        }
        if !keys.is_empty() {
            self.write_through();
        }
        pairs
    }

    /// The existing concept most similar to `key` (excluding itself), with its
    /// score. Asks the oracle once per node.
    pub fn nearest_concept<F>(&self, key: &str, similarity: F) -> Option<(String, f64)>
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        let key = normalize_key(key);
        let mut best: Option<(String, f64)> = None;
        for other in self.graph.keys().filter(|k| *k != key) {
            let Some(score) = similarity(&key, other) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, s)| score > *s) {
                best = Some((other.to_string(), score));
            }
        }
        best
    }

    /// Current weight of the edge between two keys.
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        self.graph.edge_weight(&normalize_key(a), &normalize_key(b))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Path of the persisted file, if any.
    pub fn storage_path(&self) -> Option<&std::path::Path> {
        self.sink.path()
    }
}

impl Default for ConceptGraph {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ConceptStore for ConceptGraph {
    fn upsert_node(&mut self, key: &str) -> String {
        let existed = self.graph.contains(&normalize_key(key));
        let key = self.upsert_quiet(key);
        if !existed {
            self.write_through();
        }
        key
    }

    fn add_or_reinforce_edge(&mut self, a: &str, b: &str, weight: f64) -> f64 {
        let total = self.accumulate_quiet(a, b, weight);
        self.write_through();
        total
    }

    fn related(&self, key: &str, threshold: f64) -> Vec<Related> {
        self.graph.related(&normalize_key(key), threshold)
    }

    fn reinforce(&mut self, a: &str, b: &str, delta: f64) -> GraphResult<f64> {
        let (a, b) = (normalize_key(a), normalize_key(b));
        match self.graph.adjust(&a, &b, delta) {
            Some(weight) => {
                tracing::debug!(from = %a, to = %b, delta, weight, "edge reinforced");
                self.write_through();
                Ok(weight)
            }
            None => {
                tracing::warn!(from = %a, to = %b, "no prior relation to reinforce");
                Err(GraphError::InvalidRelation { from: a, to: b })
            }
        }
    }

    fn graph(&self) -> &WeightedGraph {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_similarity(_: &str, _: &str) -> Option<f64> {
        None
    }

    #[test]
    fn upsert_normalizes_and_is_idempotent() {
        let mut g = ConceptGraph::in_memory();
        assert_eq!(g.upsert_node("  Carnívoro "), "carnivoro");
        assert_eq!(g.upsert_node("carnivoro"), "carnivoro");
        assert_eq!(g.node_count(), 1);
        assert!(g.contains("CARNIVORO"));
    }

    #[test]
    fn reinforcement_accumulates_in_any_order() {
        let mut first = ConceptGraph::in_memory();
        first.add_or_reinforce_edge("tigre", "felino", 1.0);
        first.reinforce("tigre", "felino", 0.25).unwrap();
        first.reinforce("felino", "tigre", 0.5).unwrap();

        let mut second = ConceptGraph::in_memory();
        second.add_or_reinforce_edge("felino", "tigre", 1.0);
        second.reinforce("tigre", "felino", 0.5).unwrap();
        second.reinforce("tigre", "felino", 0.25).unwrap();

        assert_eq!(first.weight("tigre", "felino"), Some(1.75));
        assert_eq!(second.weight("tigre", "felino"), Some(1.75));
    }

    #[test]
    fn reinforce_without_edge_is_invalid_relation() {
        let mut g = ConceptGraph::in_memory();
        g.upsert_node("tigre");
        g.upsert_node("piedra");
        let err = g.reinforce("tigre", "piedra", 0.2).unwrap_err();
        assert!(matches!(err, GraphError::InvalidRelation { .. }));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn related_respects_threshold_and_order() {
        let mut g = ConceptGraph::in_memory();
        g.add_or_reinforce_edge("perro", "animal", 1.5);
        g.add_or_reinforce_edge("perro", "hueso", 0.3);
        g.add_or_reinforce_edge("perro", "mascota", 2.0);
        let related = g.related("Perro", 0.5);
        let keys: Vec<&str> = related.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["mascota", "animal"]);
        assert!(g.related("gato", 0.0).is_empty());
    }

    #[test]
    fn add_memory_uses_base_weight_for_new_concepts() {
        let mut g = ConceptGraph::in_memory();
        assert_eq!(g.add_memory("tigre", "felino", 0.8, no_similarity), 0.8);
    }

    #[test]
    fn add_memory_uses_dynamic_weight_for_known_concepts() {
        let mut g = ConceptGraph::in_memory();
        g.add_or_reinforce_edge("tigre", "felino", 1.0);
        g.add_or_reinforce_edge("leon", "felino", 1.0);
        // tigre and leon share "felino": 1.0 + 0.1, plus a 0.9 semantic bonus.
        let w = g.add_memory("tigre", "leon", 5.0, |_, _| Some(0.9));
        assert!((w - 2.0).abs() < 1e-9);
    }

    #[test]
    fn learn_keywords_links_all_pairs() {
        let mut g = ConceptGraph::in_memory();
        let words: Vec<String> = ["tigre", "felino", "asia", "Tigre"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(g.learn_keywords(&words, no_similarity), 3);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn nearest_concept_picks_best_score_and_skips_self() {
        let mut g = ConceptGraph::in_memory();
        g.add_or_reinforce_edge("gato", "felino", 1.0);
        g.upsert_node("roca");
        let nearest = g.nearest_concept("gatos", |_, other| match other {
            "gato" => Some(0.9),
            "felino" => Some(0.4),
            _ => None,
        });
        assert_eq!(nearest, Some(("gato".to_string(), 0.9)));
        assert_eq!(g.nearest_concept("gato", |_, _| Some(0.1)).map(|(k, _)| k != "gato"), Some(true));
    }
}
