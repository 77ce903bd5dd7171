//! Web search backend contract and the bundled embedded implementation.

use crate::error::{Result, SiftError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single web search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebHit {
    /// Result page title.
    pub title: String,
    /// Result page URL.
    pub url: String,
    /// Snippet or extracted content.
    pub content: String,
    /// Backend relevance score, higher is better.
    pub score: f64,
}

/// A live web search service.
#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    /// Search the web for `query`, returning up to `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>>;
}

/// The bundled [`WebSearchBackend`] implementation backed by the
/// `sift-websearch` crate (concurrent provider fan-out, fused ranking).
pub struct EmbeddedWebSearch {
    config: sift_websearch::WebSearchConfig,
}

impl EmbeddedWebSearch {
    /// Create an embedded web search backend.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if the provider configuration is
    /// invalid (missing instance URL or API key for an enabled provider).
    pub fn new(config: sift_websearch::WebSearchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SiftError::Config(e.to_string()))?;
        Ok(Self { config })
    }
}

#[async_trait]
impl WebSearchBackend for EmbeddedWebSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>> {
        let config = sift_websearch::WebSearchConfig {
            max_results,
            ..self.config.clone()
        };
        let hits = sift_websearch::search(query, &config)
            .await
            .map_err(|e| SiftError::Backend(e.to_string()))?;
        Ok(hits
            .into_iter()
            .map(|h| WebHit {
                title: h.title,
                url: h.url,
                content: h.snippet,
                score: h.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_backend_rejects_invalid_provider_config() {
        // Searx enabled by default but no base URL set.
        let result = EmbeddedWebSearch::new(sift_websearch::WebSearchConfig::default());
        assert!(matches!(result, Err(SiftError::Config(_))));
    }

    #[test]
    fn embedded_backend_accepts_valid_config() {
        let config = sift_websearch::WebSearchConfig {
            searx_base_url: Some("http://localhost:8888".into()),
            ..Default::default()
        };
        assert!(EmbeddedWebSearch::new(config).is_ok());
    }

    #[test]
    fn web_hit_serde_round_trip() {
        let hit = WebHit {
            title: "Status".into(),
            url: "https://status.example.com".into(),
            content: "all systems operational".into(),
            score: 1.1,
        };
        let json = serde_json::to_string(&hit).expect("serialize");
        let decoded: WebHit = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.url, "https://status.example.com");
    }
}
