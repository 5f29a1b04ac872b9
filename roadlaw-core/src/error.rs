//! Error types for the `roadlaw-core` crate.

use thiserror::Error;

/// Errors raised at the LLM boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The model provider failed or returned an unusable response.
    #[error("Model error: {0}")]
    Model(String),

    /// A tool declaration or tool invocation was malformed.
    #[error("Tool error: {0}")]
    Tool(String),

    /// A configuration value was rejected.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external call did not complete in time.
    #[error("Timed out after {seconds}s waiting for {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The configured bound in seconds.
        seconds: u64,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// A convenience result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
