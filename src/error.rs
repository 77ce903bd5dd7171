//! Error types for the sift engine.

/// Top-level error type for the retrieval-fusion engine.
///
/// Most failure classes are absorbed before they reach a caller: agents
/// degrade to empty results, the dispatcher isolates per-agent failures,
/// and the router falls back deterministically. Values of this type
/// escape [`crate::engine::Engine::process`] only for total pipeline
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Language-model service call error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Search backend call error.
    #[error("backend error: {0}")]
    Backend(String),

    /// Retrieval agent execution error.
    #[error("agent error: {0}")]
    Agent(String),

    /// A service response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Pipeline coordination error.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SiftError>;
