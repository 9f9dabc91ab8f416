//! Engine configuration, persisted as TOML.
//!
//! Every field has a serde default, so a partial (or empty) file is valid.
//! `CEREBRO_DATA_DIR` and `CEREBRO_LOG` override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Reasoning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Longest accepted chain, in hops.
    pub max_steps: usize,
    /// Minimum edge weight for contextual answers.
    pub related_threshold: f64,
    /// Weight given to an edge created by fallback linking.
    pub fallback_increment: f64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_steps: 3,
            related_threshold: 0.5,
            fallback_increment: 0.5,
        }
    }
}

/// Q-learning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// α
    pub learning_rate: f64,
    /// γ
    pub discount_factor: f64,
    /// ε
    pub exploration_rate: f64,
    pub exploration_decay: f64,
    pub min_exploration: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.2,
            exploration_decay: 0.995,
            min_exploration: 0.01,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CerebroConfig {
    /// Directory for persisted state. `None` runs memory-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_memory_file")]
    pub memory_file: String,
    #[serde(default = "default_consciousness_file")]
    pub consciousness_file: String,
    #[serde(default = "default_policy_file")]
    pub policy_file: String,
    #[serde(default = "default_feedback_file")]
    pub feedback_file: String,
    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Reflect every this many completed interactions.
    #[serde(default = "default_reflection_interval")]
    pub reflection_interval: usize,
    /// Edge adjustment per unit of logged impact during reflection.
    #[serde(default = "default_reflection_step")]
    pub reflection_step: f64,
    /// Immediate edge boost after useful feedback on a relation query.
    #[serde(default = "default_feedback_reinforcement")]
    pub feedback_reinforcement: f64,
    /// Identity statement recorded on first start.
    #[serde(default = "default_identity")]
    pub identity: String,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_memory_file() -> String {
    "memory_graph.json".into()
}
fn default_consciousness_file() -> String {
    "consciousness_graph.json".into()
}
fn default_policy_file() -> String {
    "rl_memory.json".into()
}
fn default_feedback_file() -> String {
    "feedback_log.json".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_reflection_interval() -> usize {
    3
}
fn default_reflection_step() -> f64 {
    0.3
}
fn default_feedback_reinforcement() -> f64 {
    0.5
}
fn default_identity() -> String {
    "CEREBRO - reasoning agent grounded in memory and consciousness".into()
}

impl Default for CerebroConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            memory_file: default_memory_file(),
            consciousness_file: default_consciousness_file(),
            policy_file: default_policy_file(),
            feedback_file: default_feedback_file(),
            log_level: default_log_level(),
            reflection_interval: default_reflection_interval(),
            reflection_step: default_reflection_step(),
            feedback_reinforcement: default_feedback_reinforcement(),
            identity: default_identity(),
            reasoning: ReasoningConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl CerebroConfig {
    /// Memory-only config with a data directory set.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<memory>".into(),
            message: e.to_string(),
        })
    }

    /// Apply `CEREBRO_DATA_DIR` / `CEREBRO_LOG` if set.
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("CEREBRO_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(level) = std::env::var("CEREBRO_LOG") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }
        self
    }

    /// Reject values that would make learning or reasoning meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        let unit = |field: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: format!("{v} is outside [0, 1]"),
                })
            }
        };
        unit("policy.learning_rate", self.policy.learning_rate)?;
        unit("policy.discount_factor", self.policy.discount_factor)?;
        unit("policy.exploration_rate", self.policy.exploration_rate)?;
        unit("policy.exploration_decay", self.policy.exploration_decay)?;
        unit("policy.min_exploration", self.policy.min_exploration)?;
        if self.reasoning.max_steps == 0 {
            return Err(ConfigError::Invalid {
                field: "reasoning.max_steps".into(),
                message: "must be > 0".into(),
            });
        }
        if self.reflection_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "reflection_interval".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }

    fn state_file(&self, name: &str) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(name))
    }

    pub fn memory_path(&self) -> Option<PathBuf> {
        self.state_file(&self.memory_file)
    }

    pub fn consciousness_path(&self) -> Option<PathBuf> {
        self.state_file(&self.consciousness_file)
    }

    pub fn policy_path(&self) -> Option<PathBuf> {
        self.state_file(&self.policy_file)
    }

    pub fn feedback_path(&self) -> Option<PathBuf> {
        self.state_file(&self.feedback_file)
    }
}
