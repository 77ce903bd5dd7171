//! Error types for the sift-websearch crate.
//!
//! All errors carry stable string messages suitable for diagnostics. API
//! keys never appear in error messages.

/// Errors that can occur during web search operations.
#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    /// All enabled providers failed to return results.
    #[error("all search providers failed: {0}")]
    AllProvidersFailed(String),

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid web search configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for sift-websearch results.
pub type Result<T> = std::result::Result<T, WebSearchError>;
