//! Brave Search API provider — independent index, token-authenticated.

use crate::config::WebSearchConfig;
use crate::error::WebSearchError;
use crate::provider::{build_client, ProviderClient};
use crate::types::{SearchHit, SearchProvider};
use serde::Deserialize;

const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Brave Search API client.
///
/// The endpoint defaults to the public API but can be overridden for
/// testing against a local mock server.
pub struct BraveProvider {
    endpoint: String,
}

impl Default for BraveProvider {
    fn default() -> Self {
        Self {
            endpoint: BRAVE_API_URL.to_owned(),
        }
    }
}

impl BraveProvider {
    /// Create a provider pointed at a custom endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: BraveWebSection,
}

#[derive(Debug, Default, Deserialize)]
struct BraveWebSection {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

impl ProviderClient for BraveProvider {
    async fn search(
        &self,
        query: &str,
        config: &WebSearchConfig,
    ) -> Result<Vec<SearchHit>, WebSearchError> {
        let token = config
            .brave_api_key
            .as_deref()
            .ok_or_else(|| WebSearchError::Config("brave_api_key is not set".into()))?;

        let count = config.max_results.min(20).to_string();
        let client = build_client(config)?;
        let response = client
            .get(&self.endpoint)
            .header("X-Subscription-Token", token)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| WebSearchError::Http(format!("Brave request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WebSearchError::Http(format!(
                "Brave returned status {}",
                response.status()
            )));
        }

        let decoded: BraveResponse = response
            .json()
            .await
            .map_err(|e| WebSearchError::Parse(format!("Brave response decode failed: {e}")))?;

        tracing::trace!(count = decoded.web.results.len(), "Brave returned results");

        Ok(decoded
            .web
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.description,
                provider: SearchProvider::Brave.name().to_owned(),
                score: 0.0,
            })
            .collect())
    }

    fn provider(&self) -> SearchProvider {
        SearchProvider::Brave
    }
}
