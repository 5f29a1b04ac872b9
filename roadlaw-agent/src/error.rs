//! Error types for the `roadlaw-agent` crate.

use roadlaw_core::CoreError;
use roadlaw_rag::RagError;
use thiserror::Error;

/// Failures that end a pipeline run.
///
/// None of these reach the client as errors: the pipelines turn them into a
/// single terminal apology answer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Embedding or vector store failure during retrieval.
    #[error(transparent)]
    Retrieval(#[from] RagError),

    /// The decision model call failed or timed out.
    #[error(transparent)]
    Model(#[from] CoreError),

    /// The conversation cannot continue without breaking the tool-call
    /// protocol: unknown tool, unusable arguments, or too many cycles.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, AgentError>;
