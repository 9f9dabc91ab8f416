//! Query answering over the concept and consciousness graphs.
//!
//! Each query runs through a small state machine that always ends in an
//! [`Answer`]:
//!
//! 1. restriction filter: a restricted term short-circuits to a refusal
//! 2. lookup: an endpoint missing from the concept graph goes to fallback
//! 3. path search: a chain of at most `max_steps` hops is the answer; a
//!    longer one is "too indirect"; none goes to fallback
//! 4. fallback: link the unresolved term to its most similar concept when
//!    the similarity is high enough
//!
//! Fallback mutates the graph. Failed lookups are how the graph grows.

pub mod answer;
pub mod intent;

pub use answer::Answer;
pub use intent::QueryIntent;

use crate::config::ReasoningConfig;
use crate::consciousness::ConsciousnessGraph;
use crate::graph::concept::{ConceptGraph, ConceptStore};
use crate::graph::path::{PathOutcome, find_path};
use crate::language::{LanguageService, LinkPredictor};

/// Fallback links only to a concept more similar than this.
pub const FALLBACK_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Predicted links are only created above this probability.
pub const PREDICTION_THRESHOLD: f64 = 0.7;

/// Borrowed view over the stores needed to answer one query.
pub struct ReasoningEngine<'a> {
    concepts: &'a mut ConceptGraph,
    consciousness: &'a ConsciousnessGraph,
    language: &'a dyn LanguageService,
    predictor: Option<&'a dyn LinkPredictor>,
    config: &'a ReasoningConfig,
}

impl<'a> ReasoningEngine<'a> {
    pub fn new(
        concepts: &'a mut ConceptGraph,
        consciousness: &'a ConsciousnessGraph,
        language: &'a dyn LanguageService,
        config: &'a ReasoningConfig,
    ) -> Self {
        Self {
            concepts,
            consciousness,
            language,
            predictor: None,
            config,
        }
    }

    /// Consult `predictor` when a chain is too indirect or absent.
    pub fn with_predictor(mut self, predictor: Option<&'a dyn LinkPredictor>) -> Self {
        self.predictor = predictor;
        self
    }

    /// Answer a free-text query.
    pub fn process_query(&mut self, query: &str) -> Answer {
        if let Some(term) = self.consciousness.restriction_hit(query) {
            tracing::info!(term, "query refused by restriction");
            return Answer::Refused {
                term: term.to_string(),
            };
        }
        match QueryIntent::parse(query) {
            QueryIntent::Relation { from, to } => self.infer_relation(&from, &to),
            QueryIntent::Decision(decision) => self.evaluate_decision(&decision),
            QueryIntent::Contextual(text) => self.contextual_answer(&text),
        }
    }

    /// Look for a chain between two concepts, falling back to prediction or
    /// similarity linking.
    pub fn infer_relation(&mut self, from: &str, to: &str) -> Answer {
        let from = self.language.normalize(from);
        let to = self.language.normalize(to);

        if !self.concepts.contains(&from) || !self.concepts.contains(&to) {
            tracing::debug!(%from, %to, "endpoint unknown, falling back");
            return self.fallback_link(&from, &to);
        }

        match find_path(self.concepts.graph(), &from, &to, self.config.max_steps) {
            PathOutcome::Found(path) => {
                tracing::debug!(%from, %to, hops = path.len() - 1, "chain found");
                Answer::Chain { path }
            }
            PathOutcome::TooIndirect(path) => {
                tracing::debug!(%from, %to, hops = path.len() - 1, "chain too indirect");
                self.predict_link(&from, &to)
                    .unwrap_or(Answer::TooIndirect { path })
            }
            PathOutcome::Disconnected => {
                tracing::debug!(%from, %to, "no path");
                match self.predict_link(&from, &to) {
                    Some(answer) => answer,
                    None => self.fallback_link(&from, &to),
                }
            }
        }
    }

    /// Ask the optional predictor about a pair. Links and returns an answer
    /// only if the score clears [`PREDICTION_THRESHOLD`].
    fn predict_link(&mut self, from: &str, to: &str) -> Option<Answer> {
        let predictor = self.predictor?;
        let score = predictor.predict_link(from, to);
        if score <= PREDICTION_THRESHOLD {
            tracing::debug!(from, to, score, "prediction below threshold");
            return None;
        }
        self.concepts
            .add_or_reinforce_edge(from, to, self.config.fallback_increment);
        tracing::info!(from, to, score, "predicted link created");
        Some(Answer::Predicted {
            from: from.to_string(),
            to: to.to_string(),
            score,
        })
    }

    /// Link the unresolved term of a query to its most similar concept.
    ///
    /// The unresolved term is `from` unless only `to` is missing. Scans every
    /// node, one similarity call each.
    pub fn fallback_link(&mut self, from: &str, to: &str) -> Answer {
        let term = if self.concepts.contains(from) && !self.concepts.contains(to) {
            to
        } else {
            from
        };
        if term.is_empty() {
            return Answer::Unrelated {
                from: from.to_string(),
                to: to.to_string(),
            };
        }

        let language = self.language;
        let nearest = self
            .concepts
            .nearest_concept(term, |a, b| language.similarity(a, b));
        match nearest {
            Some((concept, similarity)) if similarity > FALLBACK_SIMILARITY_THRESHOLD => {
                self.concepts
                    .add_or_reinforce_edge(term, &concept, self.config.fallback_increment);
                tracing::info!(term, %concept, similarity, "fallback link created");
                Answer::Linked {
                    term: term.to_string(),
                    concept,
                    similarity,
                }
            }
            _ => Answer::Unrelated {
                from: from.to_string(),
                to: to.to_string(),
            },
        }
    }

    /// Report the recorded impact of a decision.
    pub fn evaluate_decision(&self, decision: &str) -> Answer {
        let decision = self.language.normalize(decision);
        let impact = self.consciousness.impact_of(&decision);
        Answer::Decision { decision, impact }
    }

    /// Combine related concepts and consciousness knowledge about one key.
    pub fn contextual_answer(&self, text: &str) -> Answer {
        let key = self.language.normalize(text);
        let related = self.concepts.related(&key, self.config.related_threshold);
        let consciousness = self.consciousness.describe(&key);
        if related.is_empty() && consciousness.is_none() {
            return Answer::Insufficient { key };
        }
        Answer::Contextual {
            key,
            related,
            consciousness,
        }
    }
}
