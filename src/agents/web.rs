//! Web agent: LLM-planned live web lookup.
//!
//! An assessment call classifies the query goal (status check, error
//! troubleshooting, general research) and proposes one to five search
//! queries; a deterministic heuristic takes over when the call fails.
//! Planned queries run concurrently against the web backend and every
//! hit becomes a context carrying its URL in metadata.

use crate::backends::{WebHit, WebSearchBackend};
use crate::error::Result;
use crate::llm::{strip_code_fences, ChatClient};
use crate::types::{AgentKind, Context};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{effective_limit, AgentOutcome, RetrievalAgent};

const SOURCE: &str = "web_search";

const PLANNER_SYSTEM_PROMPT: &str = "You plan web searches for a support engineer. \
Classify the query goal as one of: status_check (is a service up?), \
error_troubleshooting (diagnosing an error), general_research (anything else). \
Reply with JSON only: {\"goal\": \"<goal>\", \"queries\": [\"...\"]} \
with 1 to 5 search queries.";

/// What kind of answer the user is after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryGoal {
    /// "Is X down right now?"
    StatusCheck,
    /// "Why am I seeing this error?"
    ErrorTroubleshooting,
    /// Everything else.
    GeneralResearch,
}

impl QueryGoal {
    /// Wire/diagnostic name for this goal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusCheck => "status_check",
            Self::ErrorTroubleshooting => "error_troubleshooting",
            Self::GeneralResearch => "general_research",
        }
    }

    fn parse(name: &str) -> Option<QueryGoal> {
        match name.trim().to_lowercase().as_str() {
            "status_check" => Some(Self::StatusCheck),
            "error_troubleshooting" => Some(Self::ErrorTroubleshooting),
            "general_research" => Some(Self::GeneralResearch),
            _ => None,
        }
    }
}

/// A planned set of web searches.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    /// The classified goal.
    pub goal: QueryGoal,
    /// One to five search queries, in execution order.
    pub queries: Vec<String>,
    /// Whether the heuristic fallback produced this plan.
    pub heuristic: bool,
}

/// Deterministic plan used when the assessment call fails or returns
/// something unusable.
pub fn heuristic_plan(query: &str, max_queries: usize) -> SearchPlan {
    let lower = query.to_lowercase();
    let status_markers = ["down", "outage", "status", "unreachable", "not responding"];
    let error_markers = ["error", "exception", "failed", "failure", "crash"];

    let (goal, mut queries) = if status_markers.iter().any(|m| lower.contains(m)) {
        (
            QueryGoal::StatusCheck,
            vec![query.to_owned(), format!("{query} status")],
        )
    } else if error_markers.iter().any(|m| lower.contains(m)) {
        (
            QueryGoal::ErrorTroubleshooting,
            vec![query.to_owned(), format!("{query} fix")],
        )
    } else {
        (QueryGoal::GeneralResearch, vec![query.to_owned()])
    };

    queries.truncate(max_queries.max(1));
    SearchPlan {
        goal,
        queries,
        heuristic: true,
    }
}

/// The web retrieval agent.
pub struct WebAgent {
    chat: Arc<dyn ChatClient>,
    backend: Arc<dyn WebSearchBackend>,
    limit: usize,
    urgent_cap: usize,
    max_planned: usize,
}

impl WebAgent {
    /// Create a web agent over a planner and a search backend.
    pub fn new(
        chat: Arc<dyn ChatClient>,
        backend: Arc<dyn WebSearchBackend>,
        limit: usize,
        urgent_cap: usize,
        max_planned: usize,
    ) -> Self {
        Self {
            chat,
            backend,
            limit,
            urgent_cap,
            max_planned,
        }
    }

    /// Plan searches via the assessment call, falling back to the
    /// heuristic on any failure.
    async fn plan(&self, query: &str) -> SearchPlan {
        let reply = match self.chat.complete(PLANNER_SYSTEM_PROMPT, query).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "web planning call failed; using heuristic plan");
                return heuristic_plan(query, self.max_planned);
            }
        };

        match parse_plan(&reply, self.max_planned) {
            Some(plan) => plan,
            None => {
                debug!(reply = %reply, "unparseable web plan; using heuristic plan");
                heuristic_plan(query, self.max_planned)
            }
        }
    }
}

fn parse_plan(reply: &str, max_queries: usize) -> Option<SearchPlan> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(reply)).ok()?;
    let goal = QueryGoal::parse(value["goal"].as_str()?)?;
    let mut queries: Vec<String> = value["queries"]
        .as_array()?
        .iter()
        .filter_map(|q| q.as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned)
        .collect();
    if queries.is_empty() {
        return None;
    }
    queries.truncate(max_queries.max(1));
    Some(SearchPlan {
        goal,
        queries,
        heuristic: false,
    })
}

fn hit_to_context(hit: WebHit) -> Option<Context> {
    let content = if hit.content.trim().is_empty() {
        hit.title.trim().to_owned()
    } else {
        hit.content
    };
    if content.is_empty() || hit.url.trim().is_empty() {
        return None;
    }
    Some(
        Context::new(content, SOURCE, hit.score)
            .with_meta("url", hit.url)
            .with_meta("title", hit.title),
    )
}

#[async_trait]
impl RetrievalAgent for WebAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Web
    }

    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome> {
        if query.trim().is_empty() {
            return Ok(AgentOutcome::empty(SOURCE));
        }
        let k = effective_limit(self.limit, self.urgent_cap, urgent);

        let plan = self.plan(query).await;
        debug!(
            goal = plan.goal.as_str(),
            queries = plan.queries.len(),
            heuristic = plan.heuristic,
            "executing web search plan"
        );

        let searches = plan
            .queries
            .iter()
            .map(|q| self.backend.search(q, k));
        let results = join_all(searches).await;

        let mut outcome = AgentOutcome::empty(format!("web_{}", plan.goal.as_str()));
        outcome.metadata.insert(
            "planned_queries".into(),
            plan.queries.clone().into(),
        );
        outcome
            .metadata
            .insert("plan_heuristic".into(), plan.heuristic.into());

        let mut by_url: HashMap<String, Context> = HashMap::new();
        let mut failures: Vec<serde_json::Value> = Vec::new();

        for (planned, result) in plan.queries.iter().zip(results) {
            match result {
                Ok(hits) => {
                    for context in hits.into_iter().filter_map(hit_to_context) {
                        let url = context
                            .metadata
                            .get("url")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_owned();
                        by_url
                            .entry(url)
                            .and_modify(|existing| {
                                if context.score > existing.score {
                                    *existing = context.clone();
                                }
                            })
                            .or_insert(context);
                    }
                }
                Err(err) => {
                    warn!(query = %planned, error = %err, "web sub-query failed");
                    failures.push(serde_json::json!({
                        "query": planned,
                        "error": err.to_string(),
                    }));
                }
            }
        }
        if !failures.is_empty() {
            outcome.metadata.insert("query_failures".into(), failures.into());
        }

        let mut contexts: Vec<Context> = by_url.into_values().collect();
        contexts.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        contexts.truncate(k);
        outcome.contexts = contexts;
        Ok(outcome)
    }
}
