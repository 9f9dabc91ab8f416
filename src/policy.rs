//! Tabular Q-learning over (query state, response action) pairs.
//!
//! States are normalized query strings, actions are response-quality labels.
//! The table is persisted as `{state: {action: value}}` after every update.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::PolicyConfig;
use crate::store::{StoreResult, WriteThrough};

/// state → action → estimated value.
pub type QTable = BTreeMap<String, BTreeMap<String, f64>>;

/// Action used by [`ReinforcementPolicy::learn`].
pub const LEARN_ACTION: &str = "learn";

/// Epsilon-greedy tabular Q-learning agent.
#[derive(Debug)]
pub struct ReinforcementPolicy {
    table: QTable,
    config: PolicyConfig,
    exploration_rate: f64,
    rng: StdRng,
    sink: WriteThrough,
}

impl ReinforcementPolicy {
    /// An empty, non-persisted policy.
    pub fn in_memory(config: PolicyConfig) -> Self {
        Self::with_sink(config, WriteThrough::memory_only())
    }

    /// Load from `path` (empty if missing or corrupt) and persist there.
    pub fn open(config: PolicyConfig, path: impl Into<PathBuf>) -> Self {
        Self::with_sink(config, WriteThrough::to_file(path))
    }

    fn with_sink(config: PolicyConfig, sink: WriteThrough) -> Self {
        let table: QTable = sink.load();
        tracing::info!(states = table.len(), "policy table loaded");
        Self {
            table,
            exploration_rate: config.exploration_rate,
            config,
            rng: StdRng::from_entropy(),
            sink,
        }
    }

    /// Replace the random source, e.g. with a seeded one for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn persist(&self) -> StoreResult<()> {
        self.sink.save(&self.table)
    }

    fn ensure_state(&mut self, state: &str, actions: &[&str]) {
        let entry = self.table.entry(state.to_string()).or_default();
        if entry.is_empty() {
            for action in actions {
                entry.insert((*action).to_string(), 0.0);
            }
        }
    }

    /// Epsilon-greedy choice among `actions`.
    ///
    /// With probability `exploration_rate` a uniformly random action is
    /// returned; otherwise the one with the highest current value (unseen
    /// actions count as 0, ties go to the earliest in `actions`). Returns
    /// `None` only if `actions` is empty.
    pub fn choose_action<'a>(&mut self, state: &str, actions: &[&'a str]) -> Option<&'a str> {
        if actions.is_empty() {
            return None;
        }
        self.ensure_state(state, actions);
        if self.rng.gen_bool(self.exploration_rate.clamp(0.0, 1.0)) {
            return actions.choose(&mut self.rng).copied();
        }
        let mut best = actions[0];
        let mut best_value = self.value_of(state, best);
        for &action in &actions[1..] {
            let value = self.value_of(state, action);
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        Some(best)
    }

    /// One-step Q-learning update:
    /// `Q[s][a] += α (reward + γ · max Q[s'] − Q[s][a])`. Returns the new value.
    pub fn update(
        &mut self,
        state: &str,
        action: &str,
        reward: f64,
        next_state: &str,
        actions: &[&str],
    ) -> f64 {
        self.ensure_state(state, actions);
        self.ensure_state(next_state, actions);
        let best_next = self
            .table
            .get(next_state)
            .and_then(|values| values.values().copied().reduce(f64::max))
            .unwrap_or(0.0);
        let (alpha, gamma) = (self.config.learning_rate, self.config.discount_factor);
        let slot = self
            .table
            .entry(state.to_string())
            .or_default()
            .entry(action.to_string())
            .or_insert(0.0);
        *slot += alpha * (reward + gamma * best_next - *slot);
        let value = *slot;
        tracing::debug!(state, action, reward, value, "q-value updated");
        self.sink.write(&self.table);
        value
    }

    /// Accumulate `reward` straight into the `learn` action of `state`.
    pub fn learn(&mut self, state: &str, reward: f64) -> f64 {
        let slot = self
            .table
            .entry(state.to_string())
            .or_default()
            .entry(LEARN_ACTION.to_string())
            .or_insert(0.0);
        *slot += reward;
        let value = *slot;
        tracing::debug!(state, reward, value, "learning recorded");
        self.sink.write(&self.table);
        value
    }

    /// Current estimate, 0 if unseen.
    pub fn value_of(&self, state: &str, action: &str) -> f64 {
        self.table
            .get(state)
            .and_then(|values| values.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Multiply the exploration rate by the configured decay, not going below
    /// the configured floor. Returns the new rate.
    pub fn decay_exploration(&mut self) -> f64 {
        self.exploration_rate =
            (self.exploration_rate * self.config.exploration_decay).max(self.config.min_exploration);
        self.exploration_rate
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    /// Action values recorded for a state.
    pub fn values(&self, state: &str) -> Option<&BTreeMap<String, f64>> {
        self.table.get(state)
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Path of the persisted file, if any.
    pub fn storage_path(&self) -> Option<&std::path::Path> {
        self.sink.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greedy() -> PolicyConfig {
        PolicyConfig {
            exploration_rate: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn unseen_values_are_zero_and_states_lazily_initialized() {
        let mut p = ReinforcementPolicy::in_memory(greedy());
        assert_eq!(p.value_of("hola", "answer"), 0.0);
        assert_eq!(p.choose_action("hola", &["answer", "improve"]), Some("answer"));
        assert_eq!(p.values("hola").map(|v| v.len()), Some(2));
        assert_eq!(p.choose_action("hola", &[]), None);
    }

    #[test]
    fn update_follows_q_learning_formula() {
        let mut p = ReinforcementPolicy::in_memory(greedy());
        // α = 0.1, γ = 0.9, next state unseen → max = 0.
        let v = p.update("s", "answer", 1.0, "s2", &["answer"]);
        assert!((v - 0.1).abs() < 1e-12);
        // Seed next state so the bootstrap term matters.
        p.update("s2", "answer", 10.0, "terminal", &["answer"]);
        let before = p.value_of("s", "answer");
        let next_max = p.value_of("s2", "answer");
        let v = p.update("s", "answer", 1.0, "s2", &["answer"]);
        let expected = before + 0.1 * (1.0 + 0.9 * next_max - before);
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn positive_rewards_increase_value_monotonically() {
        let mut p = ReinforcementPolicy::in_memory(greedy());
        let mut last = p.value_of("q", "answer");
        for _ in 0..50 {
            let v = p.update("q", "answer", 1.0, "next", &["improve"]);
            assert!(v > last, "{v} should exceed {last}");
            last = v;
        }
    }

    #[test]
    fn greedy_choice_prefers_highest_value_and_first_on_ties() {
        let mut p = ReinforcementPolicy::in_memory(greedy());
        assert_eq!(p.choose_action("s", &["b", "a"]), Some("b"));
        p.update("s", "a", 1.0, "t", &["a"]);
        assert_eq!(p.choose_action("s", &["b", "a"]), Some("a"));
    }

    #[test]
    fn full_exploration_picks_among_offered_actions() {
        let config = PolicyConfig {
            exploration_rate: 1.0,
            ..Default::default()
        };
        let mut p = ReinforcementPolicy::in_memory(config).with_seed(7);
        for _ in 0..20 {
            let action = p.choose_action("s", &["x", "y", "z"]).unwrap();
            assert!(["x", "y", "z"].contains(&action));
        }
    }

    #[test]
    fn learn_accumulates_reward() {
        let mut p = ReinforcementPolicy::in_memory(greedy());
        p.learn("decir la verdad", 1.0);
        assert_eq!(p.learn("decir la verdad", 0.5), 1.5);
        assert_eq!(p.value_of("decir la verdad", LEARN_ACTION), 1.5);
    }

    #[test]
    fn exploration_decays_to_floor() {
        let config = PolicyConfig {
            exploration_rate: 0.02,
            exploration_decay: 0.5,
            min_exploration: 0.01,
            ..Default::default()
        };
        let mut p = ReinforcementPolicy::in_memory(config);
        assert_eq!(p.decay_exploration(), 0.01);
        assert_eq!(p.decay_exploration(), 0.01);
    }
}
