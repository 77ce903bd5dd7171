//! Semantic agent: vector similarity with a three-tier fallback ladder.
//!
//! Tier 1 asks the backend for a re-ranked search (only when the
//! backend advertised re-ranking at construction), tier 2 retries with
//! base similarity, tier 3 falls back to an unranked nearest-content
//! scan. All tiers share one document→context extraction, so callers
//! see a uniform shape whichever tier served.

use crate::backends::VectorSearchBackend;
use crate::error::Result;
use crate::types::AgentKind;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::sync::Arc;

use super::strategy::{first_success, TierFuture};
use super::{contexts_from_docs, effective_limit, AgentOutcome, RetrievalAgent};

const SOURCE_RERANK: &str = "semantic_rerank";
const SOURCE_BASE: &str = "semantic_base";
const SOURCE_SCAN: &str = "semantic_scan";

/// The semantic retrieval agent.
pub struct SemanticAgent {
    backend: Arc<dyn VectorSearchBackend>,
    /// Probed once at construction, not per call.
    rerank_available: bool,
    limit: usize,
    urgent_cap: usize,
}

impl SemanticAgent {
    /// Create a semantic agent, probing the backend's re-rank support.
    pub fn new(backend: Arc<dyn VectorSearchBackend>, limit: usize, urgent_cap: usize) -> Self {
        let rerank_available = backend.supports_rerank();
        Self {
            backend,
            rerank_available,
            limit,
            urgent_cap,
        }
    }
}

#[async_trait]
impl RetrievalAgent for SemanticAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Semantic
    }

    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome> {
        if query.trim().is_empty() {
            return Ok(AgentOutcome::empty(SOURCE_BASE));
        }
        let k = effective_limit(self.limit, self.urgent_cap, urgent);

        let mut tiers: Vec<(&'static str, TierFuture<'_>)> = Vec::new();
        if self.rerank_available {
            tiers.push((
                SOURCE_RERANK,
                async move {
                    let docs = self.backend.search(query, k, true).await?;
                    Ok(contexts_from_docs(docs, SOURCE_RERANK))
                }
                .boxed(),
            ));
        }
        tiers.push((
            SOURCE_BASE,
            async move {
                let docs = self.backend.search(query, k, false).await?;
                Ok(contexts_from_docs(docs, SOURCE_BASE))
            }
            .boxed(),
        ));
        tiers.push((
            SOURCE_SCAN,
            async move {
                let docs = self.backend.nearest(query, k).await?;
                Ok(contexts_from_docs(docs, SOURCE_SCAN))
            }
            .boxed(),
        ));

        let outcome = first_success("semantic", tiers).await;
        let mut result = AgentOutcome {
            contexts: outcome.contexts,
            method: outcome.served_by.unwrap_or("semantic_unavailable").to_owned(),
            metadata: std::collections::HashMap::new(),
        };
        if !outcome.failures.is_empty() {
            let failures: Vec<serde_json::Value> = outcome
                .failures
                .iter()
                .map(|(tier, err)| serde_json::json!({"tier": tier, "error": err}))
                .collect();
            result.metadata.insert("tier_failures".into(), failures.into());
        }
        Ok(result)
    }
}
