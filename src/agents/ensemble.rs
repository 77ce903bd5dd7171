//! Ensemble agent: aggregate several delegate strategies.
//!
//! Invokes its delegates concurrently with a small per-method cap,
//! concatenates their outputs, deduplicates by full normalised content,
//! and truncates to its own limit. A failing delegate costs nothing but
//! its contribution; if every delegate fails the ensemble returns
//! empty.

use crate::error::Result;
use crate::merge::dedup_contexts;
use crate::types::{AgentKind, Context};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::warn;

use super::{effective_limit, AgentOutcome, RetrievalAgent};

const SOURCE: &str = "ensemble";

/// The ensemble retrieval agent.
pub struct EnsembleAgent {
    delegates: Vec<Arc<dyn RetrievalAgent>>,
    per_method: usize,
    limit: usize,
    urgent_cap: usize,
}

impl EnsembleAgent {
    /// Create an ensemble over the given delegates.
    ///
    /// `per_method` caps how many contexts each delegate contributes
    /// before fusion.
    pub fn new(
        delegates: Vec<Arc<dyn RetrievalAgent>>,
        per_method: usize,
        limit: usize,
        urgent_cap: usize,
    ) -> Self {
        Self {
            delegates,
            per_method,
            limit,
            urgent_cap,
        }
    }
}

#[async_trait]
impl RetrievalAgent for EnsembleAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Ensemble
    }

    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome> {
        if query.trim().is_empty() || self.delegates.is_empty() {
            return Ok(AgentOutcome::empty(SOURCE));
        }

        let invocations = self.delegates.iter().map(|delegate| {
            let delegate = Arc::clone(delegate);
            async move {
                let kind = delegate.kind();
                (kind, delegate.retrieve(query, urgent).await)
            }
        });
        let results = join_all(invocations).await;

        let mut outcome = AgentOutcome::empty(SOURCE);
        let mut collected: Vec<Context> = Vec::new();
        let mut served: Vec<serde_json::Value> = Vec::new();
        let mut failed: Vec<serde_json::Value> = Vec::new();

        for (kind, result) in results {
            match result {
                Ok(sub) => {
                    let take = sub.contexts.len().min(self.per_method);
                    served.push(serde_json::json!({
                        "delegate": kind.name(),
                        "method": sub.method,
                        "contributed": take,
                    }));
                    collected.extend(sub.contexts.into_iter().take(take));
                }
                Err(err) => {
                    warn!(delegate = %kind, error = %err, "ensemble delegate failed");
                    failed.push(serde_json::json!({
                        "delegate": kind.name(),
                        "error": err.to_string(),
                    }));
                }
            }
        }

        let mut contexts = dedup_contexts(collected);
        contexts.truncate(effective_limit(self.limit, self.urgent_cap, urgent));
        outcome.contexts = contexts;
        outcome.metadata.insert("sub_methods".into(), served.into());
        if !failed.is_empty() {
            outcome.metadata.insert("sub_method_failures".into(), failed.into());
        }
        Ok(outcome)
    }
}
