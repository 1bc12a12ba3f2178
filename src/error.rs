use std::path::PathBuf;
use thiserror::Error;

use crate::symbol::TaskKey;

/// A malformed signature or mapping line. Parsers skip the offending entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid method signature `{0}`: missing or misplaced parentheses")]
    Parentheses(String),
    #[error("invalid method signature `{0}`: missing return type")]
    MissingReturnType(String),
    #[error("invalid method signature `{0}`: missing method name")]
    MissingName(String),
    #[error("malformed mapping line: {0}")]
    Line(String),
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network request failed for {url}: {message}")]
    Network { url: String, message: String },

    #[error("`{tool}` failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("{0} is already being built, retry later")]
    Busy(TaskKey),

    #[error("{0} has already been generated")]
    AlreadyGenerated(TaskKey),

    #[error("unknown namespace `{0}`")]
    UnknownNamespace(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("state store error: {0}")]
    Store(#[from] heed::Error),

    #[error("worker pool is shut down")]
    PoolClosed,
}

impl MappingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Busy means "retry later", not an application failure.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

pub type Result<T, E = MappingError> = std::result::Result<T, E>;
