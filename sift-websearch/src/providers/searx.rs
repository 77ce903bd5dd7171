//! SearxNG provider — self-hosted metasearch instance via its JSON API.
//!
//! SearxNG aggregates several upstream engines server-side, so a single
//! request already carries diverse results. The instance must be run with
//! `search.formats` including `json`.

use crate::config::WebSearchConfig;
use crate::error::WebSearchError;
use crate::provider::{build_client, ProviderClient};
use crate::types::{SearchHit, SearchProvider};
use serde::Deserialize;

/// SearxNG JSON API client.
pub struct SearxProvider;

/// Response envelope returned by `GET /search?format=json`.
#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
struct SearxResult {
    #[serde(default)]
    title: String,
    url: String,
    /// SearxNG calls the snippet field `content`.
    #[serde(default)]
    content: String,
}

impl ProviderClient for SearxProvider {
    async fn search(
        &self,
        query: &str,
        config: &WebSearchConfig,
    ) -> Result<Vec<SearchHit>, WebSearchError> {
        let base = config
            .searx_base_url
            .as_deref()
            .ok_or_else(|| WebSearchError::Config("searx_base_url is not set".into()))?;
        let base = base.trim_end_matches('/');
        let url = format!("{base}/search");

        let client = build_client(config)?;
        let response = client
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| WebSearchError::Http(format!("Searx request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WebSearchError::Http(format!(
                "Searx returned status {}",
                response.status()
            )));
        }

        let decoded: SearxResponse = response
            .json()
            .await
            .map_err(|e| WebSearchError::Parse(format!("Searx response decode failed: {e}")))?;

        tracing::trace!(count = decoded.results.len(), "Searx returned results");

        Ok(decoded
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
                provider: SearchProvider::Searx.name().to_owned(),
                score: 0.0,
            })
            .collect())
    }

    fn provider(&self) -> SearchProvider {
        SearchProvider::Searx
    }
}
