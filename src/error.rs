//! Rich diagnostic error types for the cerebro engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. None of these are fatal to the
//! interaction loop: the coordinator logs them and moves on to the next query.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the cerebro engine.
#[derive(Debug, Error, Diagnostic)]
pub enum CerebroError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: \"{key}\"")]
    #[diagnostic(
        code(cerebro::graph::node_not_found),
        help(
            "The concept is not in the graph yet. Teach it with `cerebro remember <a> <b>` \
             or ask about it so fallback linking can attach it."
        )
    )]
    NodeNotFound { key: String },

    #[error("no path between \"{from}\" and \"{to}\"")]
    #[diagnostic(
        code(cerebro::graph::no_path),
        help(
            "The two concepts live in disconnected parts of the graph. \
             Ask `cerebro relate` instead to let fallback linking connect them."
        )
    )]
    NoPath { from: String, to: String },

    #[error("\"{from}\" and \"{to}\" are connected, but only through {hops} steps")]
    #[diagnostic(
        code(cerebro::graph::too_indirect),
        help("Raise `reasoning.max_steps` in the config if longer chains are acceptable.")
    )]
    TooIndirect { from: String, to: String, hops: usize },

    #[error("no prior relation between \"{from}\" and \"{to}\"")]
    #[diagnostic(
        code(cerebro::graph::invalid_relation),
        help(
            "Reinforcing or relating requires an existing edge (or existing nodes). \
             Create the connection first with `cerebro remember`."
        )
    )]
    InvalidRelation { from: String, to: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(cerebro::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full. \
             State stays in memory and the next successful save recovers durability."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error on {path}: {message}")]
    #[diagnostic(
        code(cerebro::store::serde),
        help("Failed to encode state as JSON. This indicates a non-finite weight or value.")
    )]
    Serialization { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(cerebro::config::read),
        help("Ensure the config file is readable, or omit it to use defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(cerebro::config::parse),
        help("Check the TOML syntax. Every field is optional and falls back to its default.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(cerebro::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config value for {field}: {message}")]
    #[diagnostic(
        code(cerebro::config::invalid),
        help("Rates must lie in [0, 1] and `max_steps`/`reflection_interval` must be > 0.")
    )]
    Invalid { field: String, message: String },
}

/// Convenience result type for top-level operations.
pub type CerebroResult<T> = std::result::Result<T, CerebroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_wraps_transparently() {
        let err: CerebroError = GraphError::NodeNotFound {
            key: "tigre".into(),
        }
        .into();
        assert_eq!(err.to_string(), "node not found: \"tigre\"");
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("cerebro::graph::node_not_found".to_string())
        );
    }

    #[test]
    fn too_indirect_mentions_hops() {
        let err = GraphError::TooIndirect {
            from: "a".into(),
            to: "e".into(),
            hops: 4,
        };
        assert!(err.to_string().contains("4 steps"));
    }
}
