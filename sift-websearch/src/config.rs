//! Web search configuration with sensible defaults.
//!
//! [`WebSearchConfig`] controls which providers are queried, timeouts,
//! caching, and provider credentials.

use crate::error::WebSearchError;
use crate::types::SearchProvider;
use serde::{Deserialize, Serialize};

/// Configuration for a web search operation.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour. Providers that need connection
/// details (Searx base URL, Brave API key) are validated at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    /// Which providers to query. Queried concurrently; results are fused.
    pub providers: Vec<SearchProvider>,
    /// Maximum number of hits to return after deduplication and ranking.
    pub max_results: usize,
    /// Per-provider HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Base URL of the SearxNG instance, e.g. `http://localhost:8888`.
    pub searx_base_url: Option<String>,
    /// Brave Search API subscription token.
    pub brave_api_key: Option<String>,
    /// How long to cache fused results in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            providers: vec![SearchProvider::Searx],
            max_results: 10,
            timeout_seconds: 8,
            searx_base_url: None,
            brave_api_key: None,
            cache_ttl_seconds: 600,
        }
    }
}

impl WebSearchConfig {
    /// Validates this configuration, returning an error if any field is
    /// invalid or an enabled provider is missing its connection details.
    pub fn validate(&self) -> Result<(), WebSearchError> {
        if self.max_results == 0 {
            return Err(WebSearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(WebSearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(WebSearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        if self.providers.contains(&SearchProvider::Searx) && self.searx_base_url.is_none() {
            return Err(WebSearchError::Config(
                "Searx provider enabled but searx_base_url is not set".into(),
            ));
        }
        if self.providers.contains(&SearchProvider::Brave) && self.brave_api_key.is_none() {
            return Err(WebSearchError::Config(
                "Brave provider enabled but brave_api_key is not set".into(),
            ));
        }
        Ok(())
    }
}
