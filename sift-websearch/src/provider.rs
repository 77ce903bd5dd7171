//! Trait definition for pluggable web search providers.
//!
//! Each provider (SearxNG, Brave) implements [`ProviderClient`] to give
//! the fusion layer a uniform interface for querying and decoding hits.

use crate::config::WebSearchConfig;
use crate::error::WebSearchError;
use crate::types::{SearchHit, SearchProvider};
use std::time::Duration;

/// A pluggable web search provider.
///
/// Implementors call a specific provider's JSON API and decode the
/// response into [`SearchHit`] values. Each provider handles its own URL
/// construction, authentication headers, and response schema.
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
pub trait ProviderClient: Send + Sync {
    /// Perform a web search and return decoded hits.
    ///
    /// # Errors
    ///
    /// Returns [`WebSearchError`] if the HTTP request fails or the
    /// response cannot be decoded.
    fn search(
        &self,
        query: &str,
        config: &WebSearchConfig,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, WebSearchError>> + Send;

    /// Returns which [`SearchProvider`] variant this implementation is.
    fn provider(&self) -> SearchProvider;

    /// Returns the ranking weight for hits from this provider. Delegates
    /// to [`SearchProvider::weight()`].
    fn weight(&self) -> f64 {
        self.provider().weight()
    }
}

/// Build a [`reqwest::Client`] for provider API calls.
///
/// # Errors
///
/// Returns [`WebSearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &WebSearchConfig) -> Result<reqwest::Client, WebSearchError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(|e| WebSearchError::Http(format!("failed to build HTTP client: {e}")))
}
