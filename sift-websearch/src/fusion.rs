//! Provider fan-out and result fusion: dedup, score, rank.
//!
//! Queries all enabled providers concurrently, applies weighted scoring
//! with position decay, deduplicates by normalised URL, applies a
//! cross-provider boost, sorts by final score, and truncates to the
//! requested maximum.

use std::collections::HashMap;

use crate::config::WebSearchConfig;
use crate::error::WebSearchError;
use crate::provider::ProviderClient;
use crate::providers::{BraveProvider, SearxProvider};
use crate::types::{SearchHit, SearchProvider};
use crate::url_normalize::normalize_url;

/// Per-position score decay factor.
const POSITION_DECAY: f64 = 0.1;
/// Boost applied per extra provider that returned the same URL.
const CROSS_PROVIDER_BOOST: f64 = 0.2;

/// Fan a query out to every enabled provider and fuse the results.
///
/// # Errors
///
/// Returns [`WebSearchError::AllProvidersFailed`] only if **every**
/// provider fails. Partial failures are logged at warn level and the
/// surviving providers' hits are still fused and returned.
pub async fn fuse_providers(
    query: &str,
    config: &WebSearchConfig,
) -> Result<Vec<SearchHit>, WebSearchError> {
    let futures: Vec<_> = config
        .providers
        .iter()
        .map(|provider| {
            let q = query.to_string();
            let cfg = config.clone();
            let p = *provider;
            async move {
                let outcome = query_provider(p, &q, &cfg).await;
                (p, outcome)
            }
        })
        .collect();

    let outcomes = futures::future::join_all(futures).await;

    let mut all_hits: Vec<SearchHit> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for (provider, outcome) in outcomes {
        match outcome {
            Ok(hits) => {
                tracing::debug!(%provider, count = hits.len(), "provider returned hits");
                all_hits.extend(score_hits(hits, provider.weight()));
            }
            Err(err) => {
                tracing::warn!(%provider, error = %err, "provider query failed");
                errors.push(format!("{provider}: {err}"));
            }
        }
    }

    if all_hits.is_empty() && !errors.is_empty() {
        return Err(WebSearchError::AllProvidersFailed(errors.join("; ")));
    }

    let mut fused = deduplicate(all_hits);
    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(config.max_results);
    Ok(fused)
}

/// Query a single provider, dispatching to the concrete implementation.
async fn query_provider(
    provider: SearchProvider,
    query: &str,
    config: &WebSearchConfig,
) -> Result<Vec<SearchHit>, WebSearchError> {
    match provider {
        SearchProvider::Searx => SearxProvider.search(query, config).await,
        SearchProvider::Brave => BraveProvider::default().search(query, config).await,
    }
}

/// Assign position-decayed, provider-weighted scores to a hit list.
///
/// `score = weight / (1 + position * POSITION_DECAY)` — the first hit
/// from a provider carries its full weight, later hits decay smoothly.
fn score_hits(mut hits: Vec<SearchHit>, weight: f64) -> Vec<SearchHit> {
    for (position, hit) in hits.iter_mut().enumerate() {
        hit.score = weight / (1.0 + position as f64 * POSITION_DECAY);
    }
    hits
}

/// Deduplicate hits by normalised URL.
///
/// Hits sharing a normalised URL are merged: the highest-scored entry is
/// kept and boosted by [`CROSS_PROVIDER_BOOST`] for every additional
/// provider that returned the same page.
fn deduplicate(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut groups: HashMap<String, (SearchHit, Vec<String>)> = HashMap::new();

    for hit in hits {
        let key = normalize_url(&hit.url);
        groups
            .entry(key)
            .and_modify(|(best, providers)| {
                if !providers.contains(&hit.provider) {
                    providers.push(hit.provider.clone());
                }
                if hit.score > best.score {
                    *best = hit.clone();
                }
            })
            .or_insert_with(|| {
                let providers = vec![hit.provider.clone()];
                (hit, providers)
            });
    }

    groups
        .into_values()
        .map(|(mut hit, providers)| {
            let extra = providers.len().saturating_sub(1);
            hit.score *= 1.0 + CROSS_PROVIDER_BOOST * extra as f64;
            hit
        })
        .collect()
}
