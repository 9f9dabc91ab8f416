//! The consciousness graph: identity, decision outcomes and restrictions.
//!
//! Structurally a second [`WeightedGraph`], independent of the concept graph,
//! whose nodes are tagged `attribute`, `decision` or `restriction`:
//!
//! - attributes carry a `value` that is overwritten on every update
//! - decisions carry a cumulative `impact` (positive = favorable)
//! - restrictions name terms the agent must refuse to talk about
//!
//! Like the concept graph it writes itself back after every mutation.

use std::fmt;
use std::path::PathBuf;

use crate::error::GraphError;
use crate::graph::{GraphResult, GraphSnapshot, NodeKind, WeightedGraph};
use crate::normalize::normalize_key;
use crate::store::{StoreResult, WriteThrough};

/// Number of decisions reviewed by [`ConsciousnessGraph::adjust_behavior`].
pub const DEFAULT_REFLECTION_DEPTH: usize = 5;

/// A decision and its cumulative impact.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionImpact {
    pub decision: String,
    pub impact: f64,
}

/// What the consciousness graph knows about a key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptInfo {
    pub key: String,
    pub kind: NodeKind,
    pub value: Option<String>,
    pub impact: Option<f64>,
    /// Neighbor keys, sorted.
    pub related: Vec<String>,
}

impl fmt::Display for ConceptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In my consciousness, '{}' is a {}", self.key, self.kind)?;
        if let Some(value) = &self.value {
            write!(f, " with value \"{value}\"")?;
        }
        match self.impact {
            Some(impact) => write!(f, "; impact {impact:+.2}")?,
            None => write!(f, "; impact not evaluated")?,
        }
        if !self.related.is_empty() {
            write!(f, "; related to: {}", self.related.join(", "))?;
        }
        Ok(())
    }
}

/// Write-through consciousness graph.
#[derive(Debug)]
pub struct ConsciousnessGraph {
    graph: WeightedGraph,
    sink: WriteThrough,
}

impl ConsciousnessGraph {
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
        tracing::info!(nodes = graph.node_count(), "consciousness loaded");
        Self { graph, sink }
    }

    pub fn persist(&self) -> StoreResult<()> {
        self.sink.save(&self.graph.snapshot())
    }

    fn write_through(&self) {
        self.sink.write(&self.graph.snapshot());
    }

    /// Create or overwrite an identity attribute.
    pub fn record_identity(&mut self, attribute: &str, value: impl Into<String>) {
        let key = normalize_key(attribute);
        let value = value.into();
        self.graph.upsert(&key, NodeKind::Attribute);
        if let Some(node) = self.graph.node_mut(&key) {
            node.value = Some(value.clone());
        }
        tracing::info!(attribute = %key, value = %value, "identity updated");
        self.write_through();
    }

    /// Record the outcome of a decision. Impacts accumulate across calls.
    /// Returns the cumulative impact.
    pub fn record_decision(&mut self, decision: &str, impact: f64) -> f64 {
        let key = normalize_key(decision);
        self.graph.upsert(&key, NodeKind::Decision);
        let total = match self.graph.node_mut(&key) {
            Some(node) => {
                let total = node.impact.unwrap_or(0.0) + impact;
                node.impact = Some(total);
                total
            }
            None => impact,
        };
        tracing::debug!(decision = %key, impact, total, "decision evaluated");
        self.write_through();
        total
    }

    /// Mark a term the agent must refuse to respond about. Empty terms are ignored.
    pub fn restrict(&mut self, term: &str) -> bool {
        let key = normalize_key(term);
        if key.is_empty() {
            return false;
        }
        let (_, created) = self.graph.upsert(&key, NodeKind::Restriction);
        if let Some(node) = self.graph.node_mut(&key) {
            node.kind = NodeKind::Restriction;
        }
        tracing::info!(term = %key, created, "restriction recorded");
        self.write_through();
        true
    }

    /// Link an attribute to a decision it influenced. Both nodes must exist.
    pub fn relate(&mut self, attribute: &str, decision: &str, weight: f64) -> GraphResult<f64> {
        let (a, d) = (normalize_key(attribute), normalize_key(decision));
        if !self.graph.contains(&a) || !self.graph.contains(&d) {
            tracing::warn!(attribute = %a, decision = %d, "cannot relate: node missing");
            return Err(GraphError::InvalidRelation { from: a, to: d });
        }
        let total = self.graph.accumulate(&a, &d, weight).unwrap_or(weight);
        self.write_through();
        Ok(total)
    }

    /// The `top_n` decisions by impact, highest first (ties by key).
    pub fn reflect(&self, top_n: usize) -> Vec<DecisionImpact> {
        let mut decisions: Vec<DecisionImpact> = self
            .graph
            .nodes_of_kind(NodeKind::Decision)
            .map(|n| DecisionImpact {
                decision: n.key.clone(),
                impact: n.impact.unwrap_or(0.0),
            })
            .collect();
        decisions.sort_by(|a, b| {
            b.impact
                .total_cmp(&a.impact)
                .then_with(|| a.decision.cmp(&b.decision))
        });
        decisions.truncate(top_n);
        decisions
    }

    /// Review past decisions after negative feedback.
    pub fn adjust_behavior(&self) -> Vec<DecisionImpact> {
        let review = self.reflect(DEFAULT_REFLECTION_DEPTH);
        for entry in &review {
            tracing::info!(decision = %entry.decision, impact = entry.impact, "reviewing past decision");
        }
        review
    }

    /// The restriction term contained in `text`, if any (case-insensitive).
    pub fn restriction_hit(&self, text: &str) -> Option<&str> {
        let text = normalize_key(text);
        self.graph
            .nodes_of_kind(NodeKind::Restriction)
            .map(|n| n.key.as_str())
            .find(|term| !term.is_empty() && text.contains(term))
    }

    pub fn should_restrict(&self, text: &str) -> bool {
        self.restriction_hit(text).is_some()
    }

    /// Cumulative impact of a decision, if it was ever evaluated.
    pub fn impact_of(&self, decision: &str) -> Option<f64> {
        self.graph
            .node(&normalize_key(decision))
            .and_then(|n| n.impact)
    }

    /// What is recorded about `concept`, or `None` if nothing is.
    pub fn describe(&self, concept: &str) -> Option<ConceptInfo> {
        let key = normalize_key(concept);
        let node = self.graph.node(&key)?;
        let mut related: Vec<String> = self
            .graph
            .neighbors(&key)
            .into_iter()
            .map(str::to_string)
            .collect();
        related.sort();
        Some(ConceptInfo {
            key: node.key.clone(),
            kind: node.kind,
            value: node.value.clone(),
            impact: node.impact,
            related,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.graph.contains(&normalize_key(key))
    }

    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Path of the persisted file, if any.
    pub fn storage_path(&self) -> Option<&std::path::Path> {
        self.sink.path()
    }
}

impl Default for ConsciousnessGraph {
    fn default() -> Self {
        Self::in_memory()
    }
}
