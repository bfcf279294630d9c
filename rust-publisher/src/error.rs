//! Error types for the publishing run.
//!
//! Every failure is fatal for the current invocation; there is no retry. The
//! binary maps any [`PublishError`] to a non-zero exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by broker implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Missing or invalid configuration. Raised before any I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} is set but empty")]
    Empty(&'static str),

    #[error("{var} is not a valid broker URI: {reason}")]
    InvalidUri { var: &'static str, reason: String },
}

/// The source document could not be read or understood.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read source file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed source file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, LoadError::Malformed { .. })
    }
}

/// Any error that aborts a run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to connect to broker")]
    Connect(#[source] BoxError),

    #[error("failed to open channel")]
    Channel(#[source] BoxError),

    #[error("failed to declare queue '{queue}'")]
    Queue {
        queue: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to serialize envelope")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to send message to queue '{queue}'")]
    Send {
        queue: String,
        #[source]
        source: BoxError,
    },
}

/// Raised when a broker step exceeds its deadline.
#[derive(Debug, Error)]
#[error("{step} timed out after {millis} ms")]
pub struct StepTimeout {
    pub step: &'static str,
    pub millis: u64,
}
