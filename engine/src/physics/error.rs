//! Physics error type
//!
//! World mutators and queries return [`PhysicsResult`] instead of panicking.
//! Character-controller helpers never fail: a missed ray is a valid answer.

use thiserror::Error;

/// Errors reported by [`PhysicsWorld`](super::PhysicsWorld) and configuration loading.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Unexpected internal failure wrapping an underlying cause.
    #[error("engine error: {context}")]
    Engine {
        /// What the engine was doing when the failure happened
        context: String,
        /// Underlying cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The caller supplied an out-of-domain value.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    /// The operation is not available in the current world state (e.g. after dispose).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Result alias used throughout the physics module.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

impl PhysicsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }
}

impl From<std::io::Error> for PhysicsError {
    fn from(e: std::io::Error) -> Self {
        Self::Engine {
            context: "I/O failure".to_string(),
            source: Box::new(e),
        }
    }
}

impl From<serde_json::Error> for PhysicsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Engine {
            context: "malformed JSON configuration".to_string(),
            source: Box::new(e),
        }
    }
}
