//! Core data model: evidence contexts, agent identifiers, routing
//! decisions, per-agent execution results, and the per-request envelope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// One retrieved unit of evidence.
///
/// Immutable after creation: agents build contexts, the merger and the
/// synthesis boundary only read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// The evidence text. Never empty once past the dispatcher.
    pub content: String,
    /// Open key/value map: ticket key, title, timestamp, URL, log level…
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Tag identifying the agent/sub-method (and fallback path) that
    /// produced this context. Callers depend on this for diagnostics.
    pub source: String,
    /// Relevance score, higher = more relevant. Not normalised across
    /// agents.
    pub score: f64,
}

impl Context {
    /// Create a context with empty metadata.
    pub fn new(content: impl Into<String>, source: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
            source: source.into(),
            score,
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The closed set of retrieval agent identifiers.
///
/// Every routing decision names members of this set; the dispatcher
/// resolves each member against the agent registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// BM25 keyword matcher over sampled backend documents.
    Keyword,
    /// Fast semantic similarity search, the universal default.
    Semantic,
    /// Weighted keyword + semantic combination.
    Hybrid,
    /// Multi-method ensemble aggregating several sub-agents.
    Ensemble,
    /// Live web lookup with LLM query planning.
    Web,
    /// Structured log search.
    Log,
}

impl AgentKind {
    /// Returns the wire identifier of this agent (used in routing
    /// classification requests and replies).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
            Self::Ensemble => "ensemble",
            Self::Web => "web",
            Self::Log => "log",
        }
    }

    /// One-line description of when this agent is appropriate, embedded
    /// in the routing classification prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Keyword => "ticket references and exact keyword lookups (e.g. HBASE-12345)",
            Self::Semantic => "fast semantic similarity; best for urgent or production queries",
            Self::Hybrid => "combined keyword and semantic search for mixed queries",
            Self::Ensemble => "thorough multi-method search when the user can wait",
            Self::Web => "live web lookup for service outages and current status questions",
            Self::Log => "structured log search for exceptions and error investigations",
        }
    }

    /// Returns all known agent identifiers.
    pub fn all() -> &'static [AgentKind] {
        &[
            Self::Keyword,
            Self::Semantic,
            Self::Hybrid,
            Self::Ensemble,
            Self::Web,
            Self::Log,
        ]
    }

    /// Best-effort parse of a wire identifier back to an [`AgentKind`].
    pub fn parse(name: &str) -> Option<AgentKind> {
        let name = name.trim().to_lowercase();
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which agents should handle a query, and why.
///
/// Produced by the router, consumed by the dispatcher. The agent set is
/// never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Agents to dispatch, in dispatch order.
    pub agents: Vec<AgentKind>,
    /// The classifier's (or fallback policy's) stated reasoning.
    pub reasoning: String,
    /// Whether the deterministic fallback policy produced this decision.
    pub fallback: bool,
}

/// The outcome of one dispatched agent for one request.
///
/// Exactly one of these exists per agent named in the routing decision,
/// regardless of success. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionResult {
    /// Which agent this result belongs to.
    pub agent: AgentKind,
    /// Retrieved evidence; empty on failure.
    pub contexts: Vec<Context>,
    /// Descriptive label for the method that actually served the call
    /// (including any fallback path taken).
    pub method: String,
    /// Per-agent diagnostic map.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Whether the agent completed without error.
    pub success: bool,
    /// The captured error message when `success` is false.
    pub error: Option<String>,
}

impl AgentExecutionResult {
    /// Build a successful result.
    pub fn ok(agent: AgentKind, method: impl Into<String>, contexts: Vec<Context>) -> Self {
        Self {
            agent,
            contexts,
            method: method.into(),
            metadata: HashMap::new(),
            success: true,
            error: None,
        }
    }

    /// Build a failed result with no contexts.
    pub fn failed(agent: AgentKind, error: impl Into<String>) -> Self {
        Self {
            agent,
            contexts: Vec::new(),
            method: format!("{agent}_failed"),
            metadata: HashMap::new(),
            success: false,
            error: Some(error.into()),
        }
    }

    /// Attach a diagnostic metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Execution metadata produced by the merger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeMetadata {
    /// Every agent the dispatcher ran, in dispatch order.
    pub agents_executed: Vec<AgentKind>,
    /// The subset that completed successfully.
    pub agents_succeeded: Vec<AgentKind>,
    /// The subset that failed.
    pub agents_failed: Vec<AgentKind>,
    /// Error strings for the failed subset.
    #[serde(default)]
    pub errors: HashMap<String, String>,
    /// Number of unique contexts after deduplication.
    pub total_unique: usize,
    /// Wall-clock duration of the merge step in milliseconds.
    pub merge_duration_ms: u64,
}

/// The per-request envelope, assembled from pure stage outputs.
///
/// Stateless across requests: created at request start, dropped at
/// request end. Concurrent agent invocations never see this value; each
/// receives only the read-only inputs it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestState {
    /// Unique request ID.
    pub id: Uuid,
    /// The user's free-text query.
    pub query: String,
    /// Whether the user accepts a slower, more thorough answer.
    pub user_can_wait: bool,
    /// Whether this query concerns a live production incident.
    pub production_incident: bool,
    /// The routing decision for this request.
    pub routing: RoutingDecision,
    /// One execution result per routed agent.
    pub agent_results: HashMap<AgentKind, AgentExecutionResult>,
    /// The fused, deduplicated evidence set.
    pub merged_contexts: Vec<Context>,
    /// Execution metadata from the merge step.
    pub merge_metadata: MergeMetadata,
    /// Synthesized answer, when the synthesis boundary is wired.
    pub final_answer: Option<String>,
    /// Ticket keys surfaced by the merged evidence.
    pub relevant_tickets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builder_attaches_metadata() {
        let ctx = Context::new("restart the broker", "keyword_bm25", 0.8)
            .with_meta("ticket_key", "HBASE-12345");
        assert_eq!(ctx.content, "restart the broker");
        assert_eq!(ctx.source, "keyword_bm25");
        assert_eq!(
            ctx.metadata.get("ticket_key").and_then(|v| v.as_str()),
            Some("HBASE-12345")
        );
    }

    #[test]
    fn agent_kind_all_covers_six_variants() {
        assert_eq!(AgentKind::all().len(), 6);
    }

    #[test]
    fn agent_kind_parse_round_trips_every_name() {
        for kind in AgentKind::all() {
            assert_eq!(AgentKind::parse(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn agent_kind_parse_is_case_insensitive() {
        assert_eq!(AgentKind::parse(" Ensemble "), Some(AgentKind::Ensemble));
        assert_eq!(AgentKind::parse("WEB"), Some(AgentKind::Web));
    }

    #[test]
    fn agent_kind_parse_rejects_unknown() {
        assert_eq!(AgentKind::parse("telepathy"), None);
        assert_eq!(AgentKind::parse(""), None);
    }

    #[test]
    fn agent_kind_serde_uses_snake_case_names() {
        let json = serde_json::to_string(&AgentKind::Keyword).expect("serialize");
        assert_eq!(json, "\"keyword\"");
        let decoded: AgentKind = serde_json::from_str("\"ensemble\"").expect("deserialize");
        assert_eq!(decoded, AgentKind::Ensemble);
    }

    #[test]
    fn execution_result_ok_and_failed() {
        let ok = AgentExecutionResult::ok(
            AgentKind::Semantic,
            "semantic_rerank",
            vec![Context::new("doc", "semantic_rerank", 0.9)],
        );
        assert!(ok.success);
        assert!(ok.error.is_none());
        assert_eq!(ok.contexts.len(), 1);

        let failed = AgentExecutionResult::failed(AgentKind::Web, "provider down");
        assert!(!failed.success);
        assert!(failed.contexts.is_empty());
        assert_eq!(failed.error.as_deref(), Some("provider down"));
    }

    #[test]
    fn context_serde_round_trip() {
        let ctx = Context::new("text", "web_search", 1.5).with_meta("url", "https://x.com");
        let json = serde_json::to_string(&ctx).expect("serialize");
        let decoded: Context = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.content, "text");
        assert!((decoded.score - 1.5).abs() < f64::EPSILON);
    }
}
