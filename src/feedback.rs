//! User feedback and the append-only feedback log.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::{StoreResult, WriteThrough};

/// Binary verdict on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Useful,
    NotUseful,
}

impl Feedback {
    /// Interpret a free-text reply. Only an explicit "no" counts as negative.
    pub fn from_reply(reply: &str) -> Self {
        match reply.trim().to_lowercase().as_str() {
            "no" | "n" => Self::NotUseful,
            _ => Self::Useful,
        }
    }

    /// +1 for useful, -1 otherwise.
    pub fn reward(self) -> f64 {
        match self {
            Self::Useful => 1.0,
            Self::NotUseful => -1.0,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Self::Useful
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Useful => f.write_str("useful"),
            Self::NotUseful => f.write_str("not useful"),
        }
    }
}

/// One completed interaction. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// The normalized query the feedback is about.
    pub decision: String,
    pub outcome: Feedback,
    pub impact: f64,
}

/// Append-only, write-through log of [`FeedbackRecord`]s.
#[derive(Debug)]
pub struct FeedbackLog {
    entries: Vec<FeedbackRecord>,
    sink: WriteThrough,
}

impl FeedbackLog {
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            sink: WriteThrough::memory_only(),
        }
    }

    /// Load from `path` (empty if missing or corrupt) and persist there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let sink = WriteThrough::to_file(path);
        let entries: Vec<FeedbackRecord> = sink.load();
        tracing::info!(entries = entries.len(), "feedback log loaded");
        Self { entries, sink }
    }

    pub fn append(&mut self, record: FeedbackRecord) {
        tracing::debug!(decision = %record.decision, outcome = %record.outcome, impact = record.impact, "feedback recorded");
        self.entries.push(record);
        self.sink.write(&self.entries);
    }

    pub fn persist(&self) -> StoreResult<()> {
        self.sink.save(&self.entries)
    }

    /// Entries in the order they were appended.
    pub fn entries(&self) -> &[FeedbackRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the persisted file, if any.
    pub fn storage_path(&self) -> Option<&std::path::Path> {
        self.sink.path()
    }
}

impl Default for FeedbackLog {
    fn default() -> Self {
        Self::in_memory()
    }
}
