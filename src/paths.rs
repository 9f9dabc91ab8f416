//! XDG-compliant path resolution for cerebro.
//!
//! Used by the binary when neither `--data-dir` nor `--config` is given.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(cerebro::paths::no_home),
        help("Set the HOME environment variable or pass --data-dir explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(cerebro::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global XDG-compliant directories for cerebro.
#[derive(Debug, Clone, PartialEq)]
pub struct CerebroPaths {
    /// `$XDG_CONFIG_HOME/cerebro/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/cerebro/`
    pub data_dir: PathBuf,
}

impl CerebroPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("cerebro");

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join("cerebro");

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Create both directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolved_paths_are_namespaced() {
        // Reads the environment without mutating it (unsafe in edition 2024).
        if std::env::var("HOME").is_err() {
            return;
        }
        let paths = CerebroPaths::resolve().unwrap();
        assert!(paths.config_dir.ends_with("cerebro"));
        assert!(paths.data_dir.ends_with("cerebro"));
        assert!(paths.config_file().starts_with(&paths.config_dir));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let root = TempDir::new().unwrap();
        let paths = CerebroPaths {
            config_dir: root.path().join("cfg/cerebro"),
            data_dir: root.path().join("data/cerebro"),
        };
        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        assert_eq!(paths.config_file(), root.path().join("cfg/cerebro/config.toml"));
    }
}
