//! Hybrid agent: weighted keyword + semantic combination.
//!
//! Issues both backend queries concurrently and fuses the lists with
//! configurable weights. Contributions are rank-based with position
//! decay rather than raw backend scores, because the two stores score
//! on incomparable scales; a document returned by both lists receives
//! the sum of its contributions.

use crate::backends::{Document, KeywordSearchBackend, VectorSearchBackend};
use crate::error::Result;
use crate::merge::normalize_content;
use crate::types::{AgentKind, Context};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::{effective_limit, AgentOutcome, RetrievalAgent};

const SOURCE: &str = "hybrid";
/// Per-position decay within each backend's ranked list.
const POSITION_DECAY: f64 = 0.1;

/// The hybrid retrieval agent.
pub struct HybridAgent {
    keyword: Arc<dyn KeywordSearchBackend>,
    semantic: Arc<dyn VectorSearchBackend>,
    semantic_weight: f64,
    keyword_weight: f64,
    limit: usize,
    urgent_cap: usize,
}

impl HybridAgent {
    /// Create a hybrid agent with the given fusion weights.
    pub fn new(
        keyword: Arc<dyn KeywordSearchBackend>,
        semantic: Arc<dyn VectorSearchBackend>,
        semantic_weight: f64,
        keyword_weight: f64,
        limit: usize,
        urgent_cap: usize,
    ) -> Self {
        Self {
            keyword,
            semantic,
            semantic_weight,
            keyword_weight,
            limit,
            urgent_cap,
        }
    }
}

/// Fold one backend's ranked list into the fusion map.
fn add_ranked(combined: &mut HashMap<String, Context>, docs: Vec<Document>, weight: f64) {
    for (position, doc) in docs.into_iter().enumerate() {
        if doc.content.trim().is_empty() {
            continue;
        }
        let contribution = weight / (1.0 + position as f64 * POSITION_DECAY);
        let key = normalize_content(&doc.content);
        combined
            .entry(key)
            .and_modify(|ctx| ctx.score += contribution)
            .or_insert(Context {
                content: doc.content,
                metadata: doc.metadata,
                source: SOURCE.to_owned(),
                score: contribution,
            });
    }
}

#[async_trait]
impl RetrievalAgent for HybridAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Hybrid
    }

    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome> {
        if query.trim().is_empty() {
            return Ok(AgentOutcome::empty(SOURCE));
        }
        let k = effective_limit(self.limit, self.urgent_cap, urgent);

        let (keyword_result, semantic_result) = tokio::join!(
            self.keyword.search(query, k),
            self.semantic.search(query, k, false),
        );

        let mut outcome = AgentOutcome::empty(SOURCE);
        let mut combined: HashMap<String, Context> = HashMap::new();

        match keyword_result {
            Ok(docs) => add_ranked(&mut combined, docs, self.keyword_weight),
            Err(err) => {
                warn!(error = %err, "hybrid keyword leg failed");
                outcome
                    .metadata
                    .insert("keyword_error".into(), err.to_string().into());
            }
        }
        match semantic_result {
            Ok(docs) => add_ranked(&mut combined, docs, self.semantic_weight),
            Err(err) => {
                warn!(error = %err, "hybrid semantic leg failed");
                outcome
                    .metadata
                    .insert("semantic_error".into(), err.to_string().into());
            }
        }

        let mut contexts: Vec<Context> = combined.into_values().collect();
        contexts.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        contexts.truncate(k);
        outcome.contexts = contexts;
        Ok(outcome)
    }
}
