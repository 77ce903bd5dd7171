//! Core types for web search hits and provider identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single hit returned from a web search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The title of the result page.
    pub title: String,
    /// The URL of the result page.
    pub url: String,
    /// A text snippet summarising the page content.
    pub snippet: String,
    /// Which provider returned this hit.
    pub provider: String,
    /// Fused relevance score (higher is better). Hits returned by several
    /// providers receive a cross-provider boost.
    pub score: f64,
}

/// Supported web search providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchProvider {
    /// A self-hosted SearxNG instance queried via its JSON API.
    Searx,
    /// The Brave Search API — independent index, requires an API key.
    Brave,
}

impl SearchProvider {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Searx => "Searx",
            Self::Brave => "Brave",
        }
    }

    /// Returns the default weight for this provider in result ranking.
    /// Searx aggregates several upstream engines, so its hits rank
    /// slightly above a single-index provider.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Searx => 1.1,
            Self::Brave => 1.0,
        }
    }

    /// Returns all available provider variants.
    pub fn all() -> &'static [SearchProvider] {
        &[Self::Searx, Self::Brave]
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
