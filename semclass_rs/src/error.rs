//! Library error type.
//!
//! Per-file variants (`Io`, `Parse`) are recoverable: the runner turns them into
//! [`FileFailure`](crate::types::FileFailure) records and moves on. Configuration
//! variants are the only ones that end a run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemclassError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("no input pattern: pass --pattern, --category, or set `pattern` in semclass.toml")]
    MissingPattern,

    #[error("unknown category `{0}` (not listed under [categories] in semclass.toml)")]
    UnknownCategory(String),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SemclassError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = SemclassError> = std::result::Result<T, E>;
