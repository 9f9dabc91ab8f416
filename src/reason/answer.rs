//! Reasoning outcomes and their rendering.

use std::fmt;

use crate::consciousness::ConceptInfo;
use crate::graph::Related;

/// The terminal state of one reasoning pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The query touched a restricted term. Nothing was reasoned about.
    Refused { term: String },
    /// A chain within the step limit, endpoints included.
    Chain { path: Vec<String> },
    /// Connected, but only through more steps than allowed. Full path kept.
    TooIndirect { path: Vec<String> },
    /// The link predictor scored the pair high enough to link them.
    Predicted { from: String, to: String, score: f64 },
    /// Fallback linking connected an unresolved term to its nearest concept.
    Linked {
        term: String,
        concept: String,
        similarity: f64,
    },
    /// No path and no sufficiently similar concept.
    Unrelated { from: String, to: String },
    /// What the graphs know about a single key.
    Contextual {
        key: String,
        related: Vec<Related>,
        consciousness: Option<ConceptInfo>,
    },
    /// Recorded impact of a past decision.
    Decision { decision: String, impact: Option<f64> },
    /// Nothing is known about the key.
    Insufficient { key: String },
}

impl Answer {
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Refused { .. })
    }

    /// Whether the graph was changed while producing this answer.
    pub fn learned(&self) -> bool {
        matches!(self, Self::Predicted { .. } | Self::Linked { .. })
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refused { term } => {
                write!(f, "I cannot respond to that: '{term}' is restricted.")
            }
            Self::Chain { path } => {
                let (first, last) = (path.first(), path.last());
                write!(
                    f,
                    "'{}' is related to '{}' through: {}.",
                    first.map_or("", String::as_str),
                    last.map_or("", String::as_str),
                    path.join(" -> ")
                )
            }
            Self::TooIndirect { path } => write!(
                f,
                "'{}' and '{}' are connected, but the relation is too indirect ({} steps: {}).",
                path.first().map_or("", String::as_str),
                path.last().map_or("", String::as_str),
                path.len().saturating_sub(1),
                path.join(" -> ")
            ),
            Self::Predicted { from, to, score } => write!(
                f,
                "I predicted a relation between '{from}' and '{to}' (p = {score:.2}); they are now connected."
            ),
            Self::Linked {
                term,
                concept,
                similarity,
            } => write!(
                f,
                "I had no relation for '{term}', so I linked it to '{concept}' (similarity {similarity:.2})."
            ),
            Self::Unrelated { from, to } => {
                write!(f, "I found no strong relation between '{from}' and '{to}'.")
            }
            Self::Contextual {
                key,
                related,
                consciousness,
            } => {
                write!(f, "About '{key}':")?;
                if !related.is_empty() {
                    let list: Vec<String> = related
                        .iter()
                        .map(|r| format!("{} ({:.2})", r.key, r.weight))
                        .collect();
                    write!(f, " related to {}.", list.join(", "))?;
                }
                if let Some(info) = consciousness {
                    write!(f, " {info}.")?;
                }
                Ok(())
            }
            Self::Decision { decision, impact } => match impact {
                Some(i) if *i > 0.0 => {
                    write!(f, "'{decision}' turned out favorable before (impact {i:+.2}).")
                }
                Some(i) if *i < 0.0 => {
                    write!(f, "'{decision}' turned out unfavorable before (impact {i:+.2}).")
                }
                Some(_) => write!(f, "'{decision}' had a neutral outcome so far."),
                None => write!(f, "I have not evaluated '{decision}' yet."),
            },
            Self::Insufficient { key } => {
                write!(f, "I don't have enough information about '{key}'.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_renders_full_path() {
        let answer = Answer::Chain {
            path: vec!["tigre".into(), "felino".into(), "carnivoro".into()],
        };
        assert_eq!(
            answer.to_string(),
            "'tigre' is related to 'carnivoro' through: tigre -> felino -> carnivoro."
        );
    }

    #[test]
    fn decision_polarity() {
        let good = Answer::Decision {
            decision: "ayudar".into(),
            impact: Some(2.0),
        };
        let unknown = Answer::Decision {
            decision: "volar".into(),
            impact: None,
        };
        assert!(good.to_string().contains("favorable"));
        assert!(unknown.to_string().contains("not evaluated"));
    }

    #[test]
    fn learned_flags_mutating_answers() {
        assert!(
            Answer::Linked {
                term: "a".into(),
                concept: "b".into(),
                similarity: 0.9
            }
            .learned()
        );
        assert!(!Answer::Insufficient { key: "x".into() }.learned());
        assert!(Answer::Refused { term: "x".into() }.is_refusal());
    }
}
