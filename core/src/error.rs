//! Error types for reducers and lifecycle runners

use serde_json::Value;
use thiserror::Error;

/// An override reducer failed to evaluate
///
/// Never reaches the caller of a runner: the lifecycle reducer converts it
/// into a failure-shaped state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ReducerError {
    message: String,
}

impl ReducerError {
    /// Create a reducer error with `message`
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ReducerError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Why a lifecycle run was rejected
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The producer (or a thunk it returned) failed before any deferred work started
    ///
    /// The failure action carries the error's message; this variant carries
    /// the original error.
    #[error("Producer failed: {0}")]
    Producer(#[source] anyhow::Error),

    /// The deferred computation itself rejected
    #[error("Deferred computation rejected: {0}")]
    Transport(Value),

    /// The deferred computation resolved, but the parsed response reported a
    /// non-success status; carries the extracted exception
    #[error("Request rejected by service: {0}")]
    Rejected(Value),

    /// The settlement task ended without reporting an outcome
    #[error("Lifecycle settlement was abandoned")]
    Abandoned,
}

impl LifecycleError {
    /// The error value a failure action should carry for this error
    #[must_use]
    pub fn failure_payload(&self) -> Value {
        match self {
            Self::Producer(error) => Value::String(error.to_string()),
            Self::Transport(value) | Self::Rejected(value) => value.clone(),
            Self::Abandoned => Value::String(self.to_string()),
        }
    }
}
