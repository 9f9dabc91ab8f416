//! Hop-count path search gated by a maximum number of steps.

use crate::error::GraphError;

use super::WeightedGraph;

/// Result of searching for a chain between two concepts.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    /// A path of at most `max_steps` hops, endpoints included.
    Found(Vec<String>),
    /// A path exists but needs more than `max_steps` hops. The path is kept
    /// whole, never truncated.
    TooIndirect(Vec<String>),
    /// No path (or an endpoint is missing).
    Disconnected,
}

impl PathOutcome {
    /// Number of hops of the underlying path, if any.
    pub fn hops(&self) -> Option<usize> {
        match self {
            Self::Found(p) | Self::TooIndirect(p) => Some(p.len().saturating_sub(1)),
            Self::Disconnected => None,
        }
    }

    /// Convert into a hard result for callers that want an error on failure.
    pub fn into_result(self, from: &str, to: &str) -> Result<Vec<String>, GraphError> {
        match self {
            Self::Found(path) => Ok(path),
            Self::TooIndirect(path) => Err(GraphError::TooIndirect {
                from: from.to_string(),
                to: to.to_string(),
                hops: path.len().saturating_sub(1),
            }),
            Self::Disconnected => Err(GraphError::NoPath {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

/// Search the unweighted shortest path and classify it against `max_steps`.
pub fn find_path(graph: &WeightedGraph, from: &str, to: &str, max_steps: usize) -> PathOutcome {
    match graph.shortest_path(from, to) {
        Some(path) if path.len().saturating_sub(1) <= max_steps => PathOutcome::Found(path),
        Some(path) => PathOutcome::TooIndirect(path),
        None => PathOutcome::Disconnected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn line(n: usize) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        let keys: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        for k in &keys {
            g.upsert(k, NodeKind::Concept);
        }
        for pair in keys.windows(2) {
            g.accumulate(&pair[0], &pair[1], 1.0);
        }
        g
    }

    #[test]
    fn within_gate_is_found() {
        let g = line(4);
        let outcome = find_path(&g, "n0", "n3", 3);
        assert_eq!(outcome.hops(), Some(3));
        assert!(matches!(outcome, PathOutcome::Found(ref p) if p.len() == 4));
    }

    #[test]
    fn beyond_gate_keeps_full_path() {
        let g = line(5);
        let outcome = find_path(&g, "n0", "n4", 3);
        match outcome {
            PathOutcome::TooIndirect(path) => assert_eq!(path.len(), 5),
            other => panic!("expected TooIndirect, got {other:?}"),
        }
    }

    #[test]
    fn disconnected_converts_to_no_path() {
        let mut g = line(2);
        g.upsert("island", NodeKind::Concept);
        let outcome = find_path(&g, "n0", "island", 3);
        assert_eq!(outcome, PathOutcome::Disconnected);
        assert!(matches!(
            outcome.into_result("n0", "island"),
            Err(GraphError::NoPath { .. })
        ));
    }
}
