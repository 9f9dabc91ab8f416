//! The interaction cycle: query, answer, feedback, learning, reflection.
//!
//! [`FeedbackCoordinator`] is the single owner of every stateful store (concept
//! graph, consciousness graph, policy table, feedback log). Callers talk to it
//! through a request/response boundary:
//!
//! ```no_run
//! use cerebro::config::CerebroConfig;
//! use cerebro::coordinator::FeedbackCoordinator;
//! use cerebro::feedback::Feedback;
//! use cerebro::language::LexicalLanguageService;
//!
//! let mut cerebro = FeedbackCoordinator::open(
//!     CerebroConfig::default(),
//!     Box::new(LexicalLanguageService::new()),
//! )?;
//! let interaction = cerebro.handle_query("tigre es carnivoro");
//! println!("{}", interaction.answer);
//! cerebro.submit_feedback(interaction, Feedback::Useful);
//! # Ok::<(), cerebro::error::CerebroError>(())
//! ```
//!
//! An [`Interaction`] dropped without feedback is simply abandoned: nothing
//! it would have recorded is recorded, and nothing is rolled back.
//!
//! Before answering, the policy chooses between [`ANSWER_ACTION`] and
//! [`IMPROVE_ACTION`] for the query. Choosing to improve, greedily after bad
//! feedback or at random with the exploration rate, marks the interaction
//! with `caution`. The exploration rate decays once per completed interaction.

use crate::config::CerebroConfig;
use crate::consciousness::{ConsciousnessGraph, DEFAULT_REFLECTION_DEPTH, DecisionImpact};
use crate::error::{CerebroResult, GraphError, StoreError};
use crate::feedback::{Feedback, FeedbackLog, FeedbackRecord};
use crate::graph::GraphResult;
use crate::graph::concept::{ConceptGraph, ConceptStore};
use crate::graph::path::find_path;
use crate::language::{LanguageService, LinkPredictor};
use crate::policy::ReinforcementPolicy;
use crate::reason::{Answer, QueryIntent, ReasoningEngine};

/// Action whose learned value reflects the quality of past answers.
pub const ANSWER_ACTION: &str = "answer";
/// Action offered in the follow-up state of every update.
pub const IMPROVE_ACTION: &str = "improve";
/// State every answer transitions into.
pub const FOLLOW_UP_STATE: &str = "follow_up";
/// Consciousness attribute holding the agent's identity statement.
pub const IDENTITY_ATTRIBUTE: &str = "identity";

/// A pending interaction: the answer, waiting for feedback.
#[derive(Debug)]
#[must_use = "submit feedback or drop the interaction to abandon it"]
pub struct Interaction {
    /// Query as typed.
    pub query: String,
    /// Normalized query, the policy state.
    pub state: String,
    pub intent: QueryIntent,
    pub answer: Answer,
    /// What the policy chose for this query.
    pub action: &'static str,
    /// The policy chose to improve rather than answer as before.
    pub caution: bool,
}

/// What one piece of feedback changed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackReport {
    pub reward: f64,
    /// New value of `(state, answer)`.
    pub q_value: f64,
    /// Cumulative impact of the query as a decision.
    pub decision_impact: f64,
    /// Past decisions reviewed after negative feedback.
    pub reviewed: Vec<DecisionImpact>,
    /// New weight of the queried pair's edge, if it was reinforced.
    pub reinforced: Option<f64>,
    /// Present when this interaction triggered a reflection pass.
    pub reflection: Option<ReflectionReport>,
}

/// Outcome of replaying the feedback log.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionReport {
    /// Log entries replayed.
    pub replayed: usize,
    /// Edges adjusted.
    pub adjusted: usize,
    /// Relation entries whose pair had no edge.
    pub skipped: usize,
    pub top_decisions: Vec<DecisionImpact>,
}

/// Owns all stores and runs the interaction cycle.
pub struct FeedbackCoordinator {
    config: CerebroConfig,
    concepts: ConceptGraph,
    consciousness: ConsciousnessGraph,
    policy: ReinforcementPolicy,
    log: FeedbackLog,
    language: Box<dyn LanguageService>,
    predictor: Option<Box<dyn LinkPredictor>>,
    completed: usize,
}

impl FeedbackCoordinator {
    /// Load every store from the configured data directory (memory-only if
    /// none) and record the identity attribute on first start.
    pub fn open(config: CerebroConfig, language: Box<dyn LanguageService>) -> CerebroResult<Self> {
        config.validate()?;
        if let Some(dir) = &config.data_dir {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::Io {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        tracing::info!(
            data_dir = ?config.data_dir,
            max_steps = config.reasoning.max_steps,
            "opening cerebro"
        );

        let concepts = config
            .memory_path()
            .map_or_else(ConceptGraph::in_memory, ConceptGraph::open);
        let mut consciousness = config
            .consciousness_path()
            .map_or_else(ConsciousnessGraph::in_memory, ConsciousnessGraph::open);
        let policy_config = config.policy.clone();
        let policy = match config.policy_path() {
            Some(path) => ReinforcementPolicy::open(policy_config, path),
            None => ReinforcementPolicy::in_memory(policy_config),
        };
        let log = config
            .feedback_path()
            .map_or_else(FeedbackLog::in_memory, FeedbackLog::open);

        if !consciousness.contains(IDENTITY_ATTRIBUTE) {
            consciousness.record_identity(IDENTITY_ATTRIBUTE, config.identity.clone());
        }

        Ok(Self {
            config,
            concepts,
            consciousness,
            policy,
            log,
            language,
            predictor: None,
            completed: 0,
        })
    }

    /// Wire in a link predictor.
    pub fn with_predictor(mut self, predictor: Box<dyn LinkPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Make exploration reproducible.
    pub fn with_policy_seed(mut self, seed: u64) -> Self {
        self.policy = self.policy.with_seed(seed);
        self
    }

    /// Answer a query. Feedback, if any, is given through
    /// [`submit_feedback`](Self::submit_feedback).
    pub fn handle_query(&mut self, query: &str) -> Interaction {
        let state = self.language.normalize(query);
        let action = self
            .policy
            .choose_action(&state, &[ANSWER_ACTION, IMPROVE_ACTION])
            .unwrap_or(ANSWER_ACTION);
        let caution = action == IMPROVE_ACTION;
        if caution {
            tracing::info!(%state, exploration = self.policy.exploration_rate(), "policy chose to improve on this answer");
        }

        let answer = self.engine().process_query(query);

        Interaction {
            query: query.to_string(),
            intent: QueryIntent::parse(query),
            state,
            answer,
            action,
            caution,
        }
    }

    /// Relate two concepts directly, without query parsing. Restrictions still apply.
    pub fn relate(&mut self, a: &str, b: &str) -> Answer {
        if let Some(term) = self.consciousness.restriction_hit(&format!("{a} {b}")) {
            tracing::info!(term, "relation refused by restriction");
            return Answer::Refused {
                term: term.to_string(),
            };
        }
        self.engine().infer_relation(a, b)
    }

    fn engine(&mut self) -> ReasoningEngine<'_> {
        ReasoningEngine::new(
            &mut self.concepts,
            &self.consciousness,
            self.language.as_ref(),
            &self.config.reasoning,
        )
        .with_predictor(self.predictor.as_deref())
    }

    /// Learn from feedback on an answer. Refusals are not learned from and
    /// return `None`.
    pub fn submit_feedback(
        &mut self,
        interaction: Interaction,
        feedback: Feedback,
    ) -> Option<FeedbackReport> {
        if interaction.answer.is_refusal() {
            tracing::debug!(state = %interaction.state, "feedback on a refusal ignored");
            return None;
        }
        let state = interaction.state;
        let reward = feedback.reward();

        let q_value = self
            .policy
            .update(&state, ANSWER_ACTION, reward, FOLLOW_UP_STATE, &[IMPROVE_ACTION]);
        let decision_impact = self.consciousness.record_decision(&state, reward);

        let mut reviewed = Vec::new();
        let mut reinforced = None;
        if feedback.is_positive() {
            if let Some((from, to)) = interaction.intent.relation() {
                reinforced = self
                    .concepts
                    .reinforce(from, to, self.config.feedback_reinforcement)
                    .ok();
            }
        } else {
            reviewed = self.consciousness.adjust_behavior();
        }

        self.log.append(FeedbackRecord {
            decision: state.clone(),
            outcome: feedback,
            impact: reward,
        });
        self.policy.decay_exploration();
        self.completed += 1;
        tracing::info!(%state, %feedback, q_value, completed = self.completed, "interaction completed");

        let reflection = (self.completed % self.config.reflection_interval == 0).then(|| self.reflect());

        Some(FeedbackReport {
            reward,
            q_value,
            decision_impact,
            reviewed,
            reinforced,
            reflection,
        })
    }

    /// Replay the whole feedback log onto the concept graph: every relation
    /// query moves its pair's edge by `reflection_step × impact`.
    pub fn reflect(&mut self) -> ReflectionReport {
        let step = self.config.reflection_step;
        let (mut adjusted, mut skipped) = (0, 0);
        for record in self.log.entries() {
            let intent = QueryIntent::parse(&record.decision);
            let Some((from, to)) = intent.relation() else {
                continue;
            };
            match self.concepts.reinforce(from, to, step * record.impact) {
                Ok(_) => adjusted += 1,
                Err(_) => skipped += 1,
            }
        }
        let top_decisions = self.consciousness.reflect(DEFAULT_REFLECTION_DEPTH);
        tracing::info!(
            replayed = self.log.len(),
            adjusted,
            skipped,
            "reflection complete"
        );
        ReflectionReport {
            replayed: self.log.len(),
            adjusted,
            skipped,
            top_decisions,
        }
    }

    /// Teach a relation directly. Uses the dynamic weight when both concepts
    /// are known, `weight` otherwise.
    pub fn remember(&mut self, a: &str, b: &str, weight: f64) -> f64 {
        let language = self.language.as_ref();
        self.concepts
            .add_memory(a, b, weight, |x, y| language.similarity(x, y))
    }

    /// Adjust an existing edge.
    pub fn reinforce(&mut self, a: &str, b: &str, delta: f64) -> GraphResult<f64> {
        self.concepts.reinforce(a, b, delta)
    }

    /// Link every pair of keywords found in `text`. Returns the number of pairs.
    pub fn learn_text(&mut self, text: &str) -> usize {
        let language = self.language.as_ref();
        let keywords = language.keywords(text);
        self.concepts
            .learn_keywords(&keywords, |x, y| language.similarity(x, y))
    }

    pub fn record_identity(&mut self, attribute: &str, value: &str) {
        self.consciousness.record_identity(attribute, value);
    }

    pub fn restrict(&mut self, term: &str) -> bool {
        self.consciousness.restrict(term)
    }

    /// Shortest chain between two known concepts, as a hard result.
    pub fn path(&self, a: &str, b: &str) -> GraphResult<Vec<String>> {
        let (a, b) = (self.language.normalize(a), self.language.normalize(b));
        for key in [&a, &b] {
            if !self.concepts.contains(key) {
                return Err(GraphError::NodeNotFound { key: key.clone() });
            }
        }
        find_path(self.concepts.graph(), &a, &b, self.config.reasoning.max_steps).into_result(&a, &b)
    }

    /// Write every store now. All stores are attempted; the first failure is returned.
    pub fn flush(&self) -> CerebroResult<()> {
        let results = [
            self.concepts.persist(),
            self.consciousness.persist(),
            self.policy.persist(),
            self.log.persist(),
        ];
        for result in results {
            result?;
        }
        tracing::info!("all stores flushed");
        Ok(())
    }

    pub fn concepts(&self) -> &ConceptGraph {
        &self.concepts
    }

    pub fn consciousness(&self) -> &ConsciousnessGraph {
        &self.consciousness
    }

    pub fn policy(&self) -> &ReinforcementPolicy {
        &self.policy
    }

    pub fn feedback_log(&self) -> &FeedbackLog {
        &self.log
    }

    pub fn config(&self) -> &CerebroConfig {
        &self.config
    }

    /// Interactions that received feedback this session.
    pub fn completed_interactions(&self) -> usize {
        self.completed
    }
}
