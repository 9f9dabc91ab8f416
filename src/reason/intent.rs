//! Classifying a free-text query.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize_key;

static RE_RELATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+) (?:es|is) (\S+)$").unwrap());

static RE_DECISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:que pasa si|what if) (.+)$").unwrap());

/// What a query asks for. All keys are normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// "tigre es carnivoro": is there a chain between two concepts?
    Relation { from: String, to: String },
    /// "que pasa si mentir": how did this decision turn out before?
    Decision(String),
    /// Anything else: tell me what you know about this.
    Contextual(String),
}

impl QueryIntent {
    pub fn parse(query: &str) -> Self {
        let normalized = normalize_key(query);
        let text = normalized
            .trim_matches(|c: char| !c.is_alphanumeric())
            .trim();
        if let Some(caps) = RE_RELATION.captures(text) {
            return Self::Relation {
                from: caps[1].to_string(),
                to: caps[2].to_string(),
            };
        }
        if let Some(caps) = RE_DECISION.captures(text) {
            return Self::Decision(caps[1].trim().to_string());
        }
        Self::Contextual(text.to_string())
    }

    /// The concept pair of a relation query.
    pub fn relation(&self) -> Option<(&str, &str)> {
        match self {
            Self::Relation { from, to } => Some((from, to)),
            _ => None,
        }
    }
}
