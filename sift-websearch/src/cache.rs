//! In-memory cache for fused search results.
//!
//! Caches the final deduplicated, scored, sorted hit list keyed by the
//! (lowercased query, sorted provider set) pair. Uses [`moka`] for
//! async-friendly caching with TTL and automatic eviction.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use std::time::Duration;

use moka::future::Cache;

use crate::types::{SearchHit, SearchProvider};

/// Maximum number of cached result sets.
const MAX_CACHE_ENTRIES: u64 = 100;

/// Global process-wide search cache.
///
/// Lazily initialised on first access. TTL is fixed at first creation.
static CACHE: OnceLock<Cache<CacheKey, Vec<SearchHit>>> = OnceLock::new();

/// Composite cache key: normalised query + provider set hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed query string.
    query: String,
    /// Hash of the sorted provider set, so different provider configs
    /// produce different cache entries.
    provider_hash: u64,
}

impl CacheKey {
    /// Build a deterministic cache key from a query and provider list.
    ///
    /// The provider list is sorted before hashing so `[Searx, Brave]` and
    /// `[Brave, Searx]` produce the same key.
    pub fn new(query: &str, providers: &[SearchProvider]) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            provider_hash: hash_providers(providers),
        }
    }
}

fn get_or_init_cache(ttl_seconds: u64) -> &'static Cache<CacheKey, Vec<SearchHit>> {
    CACHE.get_or_init(|| {
        Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build()
    })
}

/// Look up cached hits for the given key.
pub async fn get(key: &CacheKey, ttl_seconds: u64) -> Option<Vec<SearchHit>> {
    get_or_init_cache(ttl_seconds).get(key).await
}

/// Insert fused hits into the cache.
pub async fn insert(key: CacheKey, hits: Vec<SearchHit>, ttl_seconds: u64) {
    get_or_init_cache(ttl_seconds).insert(key, hits).await;
}

/// Deterministic, order-independent hash of a provider set.
fn hash_providers(providers: &[SearchProvider]) -> u64 {
    let mut sorted: Vec<&SearchProvider> = providers.iter().collect();
    sorted.sort_by_key(|p| p.name());
    let mut hasher = DefaultHasher::new();
    for provider in sorted {
        provider.name().hash(&mut hasher);
    }
    hasher.finish()
}
