//! Keyword (full-text) search backend contract.

use super::Document;
use crate::error::Result;
use async_trait::async_trait;

/// A full-text/keyword store.
///
/// Consumed by the keyword, hybrid, and ensemble agents. The keyword
/// agent additionally samples documents from the store to build its
/// in-process matcher.
#[async_trait]
pub trait KeywordSearchBackend: Send + Sync {
    /// Full-text search for `query`, returning up to `k` documents.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>>;

    /// Return up to `limit` documents sampled from the store, used for
    /// matcher construction. The sample need not be random; any
    /// representative slice of the corpus works.
    async fn sample(&self, limit: usize) -> Result<Vec<Document>>;
}
