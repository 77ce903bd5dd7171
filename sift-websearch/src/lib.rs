//! # sift-websearch
//!
//! Embedded multi-provider web search for sift.
//!
//! This crate answers one question — "what does the public web say about
//! this query right now?" — by fanning the query out to JSON search
//! provider APIs (a self-hosted SearxNG instance, the Brave Search API),
//! merging and ranking their results, and returning a single deduplicated
//! hit list. It compiles into the engine as a library dependency.
//!
//! ## Design
//!
//! - Providers speak JSON APIs; no HTML scraping, no cookie dances
//! - All enabled providers are queried concurrently and their results fused
//! - Weighted scoring with position decay, plus a cross-provider boost for
//!   URLs returned by more than one provider
//! - Deduplication by normalised URL (tracking params stripped)
//! - In-memory result cache with configurable TTL
//! - Graceful degradation: if some providers fail, the rest still serve
//!
//! ## Security
//!
//! - The only secret is an optional Brave API key, read from config
//! - No network listeners — this is a library, not a server
//! - Queries are logged at trace level only

pub mod cache;
pub mod config;
pub mod error;
pub mod fusion;
pub mod provider;
pub mod providers;
pub mod types;
pub mod url_normalize;

pub use config::WebSearchConfig;
pub use error::{Result, WebSearchError};
pub use provider::ProviderClient;
pub use types::{SearchHit, SearchProvider};

/// Search the web using all enabled providers concurrently.
///
/// Queries every provider in `config.providers`, fuses the result lists
/// (weighted scoring, URL dedup, cross-provider boost) and returns up to
/// `config.max_results` hits, best first. Results are served from the
/// in-memory cache when a fresh entry exists.
///
/// # Errors
///
/// Returns [`WebSearchError::AllProvidersFailed`] only if **every**
/// enabled provider fails. Individual provider failures are logged and
/// absorbed as long as at least one provider returns results.
pub async fn search(query: &str, config: &WebSearchConfig) -> Result<Vec<SearchHit>> {
    config.validate()?;

    let key = cache::CacheKey::new(query, &config.providers);
    if config.cache_ttl_seconds > 0 {
        if let Some(hits) = cache::get(&key, config.cache_ttl_seconds).await {
            tracing::debug!(count = hits.len(), "web search served from cache");
            return Ok(hits);
        }
    }

    let hits = fusion::fuse_providers(query, config).await?;

    if config.cache_ttl_seconds > 0 {
        cache::insert(key, hits.clone(), config.cache_ttl_seconds).await;
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_rejects_zero_max_results() {
        let config = WebSearchConfig {
            max_results: 0,
            ..test_config()
        };
        let result = search("test", &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_results"));
    }

    #[tokio::test]
    async fn search_rejects_empty_providers() {
        let config = WebSearchConfig {
            providers: vec![],
            ..test_config()
        };
        let result = search("test", &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("provider"));
    }

    fn test_config() -> WebSearchConfig {
        WebSearchConfig {
            providers: vec![SearchProvider::Searx],
            searx_base_url: Some("http://localhost:8888".into()),
            cache_ttl_seconds: 0,
            ..Default::default()
        }
    }
}
