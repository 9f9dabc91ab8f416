//! Dynamic edge-weight model.
//!
//! Concepts that share context reinforce each other, and near-synonyms get an
//! extra boost:
//!
//! ```text
//! weight = BASE_WEIGHT
//!        + COMMON_NEIGHBOR_COEFFICIENT × |common neighbors|
//!        + similarity        (only if similarity > SEMANTIC_BONUS_THRESHOLD)
//! ```
//!
//! If either key is not in the graph the result is `BASE_WEIGHT`.

use super::WeightedGraph;

/// Weight of a relation with no supporting topology.
pub const BASE_WEIGHT: f64 = 1.0;
/// Increment per shared neighbor.
pub const COMMON_NEIGHBOR_COEFFICIENT: f64 = 0.1;
/// Similarity must exceed this to contribute a semantic bonus.
pub const SEMANTIC_BONUS_THRESHOLD: f64 = 0.7;

/// Pure weight computation over a graph's topology.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightModel;

impl WeightModel {
    /// Compute the weight of a relation between two (normalized) keys.
    ///
    /// `similarity` is only consulted when both keys are present. An undefined
    /// similarity (`None`) contributes nothing.
    pub fn dynamic_weight<F>(graph: &WeightedGraph, a: &str, b: &str, similarity: F) -> f64
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        if !graph.contains(a) || !graph.contains(b) {
            return BASE_WEIGHT;
        }
        let reinforcement = COMMON_NEIGHBOR_COEFFICIENT * graph.common_neighbors(a, b) as f64;
        let semantic_bonus = match similarity(a, b) {
            Some(s) if s > SEMANTIC_BONUS_THRESHOLD => s,
            _ => 0.0,
        };
        BASE_WEIGHT + reinforcement + semantic_bonus
    }
}
