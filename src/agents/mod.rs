//! Retrieval agents: pluggable strategies behind one contract.
//!
//! Every variant implements [`RetrievalAgent`]; the dispatcher resolves
//! [`crate::types::AgentKind`] values against an [`AgentRegistry`] and
//! invokes the variants uniformly. Variants never raise for ordinary
//! trouble (empty query, backend unavailability) — they degrade to an
//! empty outcome and record what happened in their metadata.

pub mod ensemble;
pub mod hybrid;
pub mod keyword;
pub mod logs;
pub mod semantic;
pub mod strategy;
pub mod web;

pub use ensemble::EnsembleAgent;
pub use hybrid::HybridAgent;
pub use keyword::KeywordAgent;
pub use logs::LogAgent;
pub use semantic::SemanticAgent;
pub use web::WebAgent;

use crate::error::Result;
use crate::types::{AgentKind, Context};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// What one agent produced for one request.
#[derive(Debug, Clone, Default)]
pub struct AgentOutcome {
    /// Retrieved evidence. Every context has non-empty content and a
    /// populated `source` tag.
    pub contexts: Vec<Context>,
    /// Label for the method (and fallback path) that actually served
    /// the call, e.g. `semantic_base` when re-ranking was unavailable.
    pub method: String,
    /// Diagnostic map: tier failures, sub-method counts, windows used…
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentOutcome {
    /// An empty outcome with the given method label.
    pub fn empty(method: impl Into<String>) -> Self {
        Self {
            contexts: Vec::new(),
            method: method.into(),
            metadata: HashMap::new(),
        }
    }
}

/// A pluggable retrieval strategy.
#[async_trait]
pub trait RetrievalAgent: Send + Sync {
    /// Which member of the closed agent set this is.
    fn kind(&self) -> AgentKind;

    /// Retrieve evidence for `query`.
    ///
    /// Implementations return an empty outcome — not an error — for
    /// invalid queries and unavailable backends, and reduce their result
    /// count when `urgent` is set. The dispatcher still isolates any
    /// error that escapes.
    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome>;
}

/// Clamp a configured result limit for urgency.
///
/// Urgent queries bias toward latency over recall: the effective limit
/// is the smaller of the configured limit and the urgent cap.
pub fn effective_limit(limit: usize, urgent_cap: usize, urgent: bool) -> usize {
    if urgent { limit.min(urgent_cap) } else { limit }
}

/// Extract contexts from backend documents, tagging each with `source`.
///
/// Every tier of every variant goes through this one extraction so
/// callers see a uniform context shape regardless of which tier served
/// the request. Documents with empty content are dropped here — agents
/// never emit empty-content contexts.
pub fn contexts_from_docs(docs: Vec<crate::backends::Document>, source: &str) -> Vec<Context> {
    docs.into_iter()
        .filter(|doc| !doc.content.trim().is_empty())
        .map(|doc| Context {
            content: doc.content,
            metadata: doc.metadata,
            source: source.to_owned(),
            score: doc.score,
        })
        .collect()
}

/// The closed registry of retrieval agents for one engine instance.
#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: HashMap<AgentKind, Arc<dyn RetrievalAgent>>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its own kind, replacing any previous
    /// registration.
    pub fn register(&mut self, agent: Arc<dyn RetrievalAgent>) {
        self.agents.insert(agent.kind(), agent);
    }

    /// Look up the agent registered for `kind`.
    pub fn get(&self, kind: AgentKind) -> Option<Arc<dyn RetrievalAgent>> {
        self.agents.get(&kind).cloned()
    }

    /// Kinds with a registered agent.
    pub fn kinds(&self) -> Vec<AgentKind> {
        let mut kinds: Vec<AgentKind> = self.agents.keys().copied().collect();
        kinds.sort_by_key(|k| k.name());
        kinds
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agents are registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubAgent(AgentKind);

    #[async_trait]
    impl RetrievalAgent for StubAgent {
        fn kind(&self) -> AgentKind {
            self.0
        }

        async fn retrieve(&self, _query: &str, _urgent: bool) -> Result<AgentOutcome> {
            Ok(AgentOutcome::empty("stub"))
        }
    }

    #[test]
    fn effective_limit_clamps_only_when_urgent() {
        assert_eq!(effective_limit(10, 5, false), 10);
        assert_eq!(effective_limit(10, 5, true), 5);
        assert_eq!(effective_limit(3, 5, true), 3);
    }

    #[test]
    fn registry_registers_and_resolves() {
        let mut registry = AgentRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(StubAgent(AgentKind::Semantic)));
        registry.register(Arc::new(StubAgent(AgentKind::Web)));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(AgentKind::Semantic).is_some());
        assert!(registry.get(AgentKind::Keyword).is_none());
        assert_eq!(registry.kinds(), vec![AgentKind::Semantic, AgentKind::Web]);
    }

    #[test]
    fn registry_replaces_same_kind() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(StubAgent(AgentKind::Web)));
        registry.register(Arc::new(StubAgent(AgentKind::Web)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn stub_agent_satisfies_trait_object() {
        let agent: Arc<dyn RetrievalAgent> = Arc::new(StubAgent(AgentKind::Log));
        let outcome = agent.retrieve("q", false).await.expect("retrieve");
        assert!(outcome.contexts.is_empty());
        assert_eq!(outcome.method, "stub");
    }
}
