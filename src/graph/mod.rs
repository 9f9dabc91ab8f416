//! Weighted knowledge graphs.
//!
//! Both the factual concept graph and the consciousness graph are undirected,
//! weighted graphs keyed by normalized text. They share one in-memory layer,
//! [`WeightedGraph`], and one persisted shape, [`GraphSnapshot`]:
//!
//! ```json
//! { "nodes": [{"id": "tigre", "kind": "concept"}],
//!   "edges": [{"source": "tigre", "target": "felino", "weight": 1.5}] }
//! ```
//!
//! - [`concept`]: the write-through concept graph and its [`concept::ConceptStore`] trait
//! - [`weight`]: the dynamic edge-weight model
//! - [`path`]: hop-count path search with an explicit outcome type

pub mod concept;
pub mod index;
pub mod path;
pub mod weight;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use index::{GraphResult, WeightedGraph};

/// Node tag. Serialized in lowercase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A unit of factual knowledge.
    #[default]
    Concept,
    /// An identity trait; carries a `value`.
    Attribute,
    /// A past decision; carries a cumulative `impact`.
    Decision,
    /// A term the agent refuses to respond about.
    Restriction,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Concept => "concept",
            Self::Attribute => "attribute",
            Self::Decision => "decision",
            Self::Restriction => "restriction",
        };
        f.write_str(s)
    }
}

/// Data stored on each node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Normalized key (node identity).
    pub key: String,
    pub kind: NodeKind,
    /// Free-form value (identity attributes).
    pub value: Option<String>,
    /// Cumulative impact (decisions). Positive is favorable.
    pub impact: Option<f64>,
}

impl NodeData {
    pub fn new(key: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            key: key.into(),
            kind,
            value: None,
            impact: None,
        }
    }
}

/// Persisted form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    /// Missing kinds load as `concept`.
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<f64>,
}

impl From<&NodeData> for NodeRecord {
    fn from(n: &NodeData) -> Self {
        Self {
            id: n.key.clone(),
            kind: n.kind,
            value: n.value.clone(),
            impact: n.impact,
        }
    }
}

/// Persisted form of an undirected edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Full persisted graph: node list and edge list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, alias = "links")]
    pub edges: Vec<EdgeRecord>,
}

/// A neighbor together with the weight of the connecting edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Related {
    pub key: String,
    pub weight: f64,
}
