//! Semantic/vector search backend contract.

use super::Document;
use crate::error::Result;
use async_trait::async_trait;

/// A vector-similarity store.
///
/// Re-ranking support is probed once via [`supports_rerank`] when the
/// semantic agent is constructed, not per call.
///
/// [`supports_rerank`]: VectorSearchBackend::supports_rerank
#[async_trait]
pub trait VectorSearchBackend: Send + Sync {
    /// Whether the store can re-rank results server-side.
    fn supports_rerank(&self) -> bool;

    /// Similarity search for `query`, returning up to `k` documents,
    /// best first. When `rerank` is true the store applies its
    /// re-ranking stage; callers must only pass `rerank = true` after a
    /// positive [`supports_rerank`] probe.
    ///
    /// [`supports_rerank`]: VectorSearchBackend::supports_rerank
    async fn search(&self, query: &str, k: usize, rerank: bool) -> Result<Vec<Document>>;

    /// Unranked nearest-content scan: return up to `k` documents whose
    /// content matches `query` without any relevance ordering. Last-tier
    /// fallback when ranked search is unavailable.
    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<Document>>;
}
