//! Query routing: decide which retrieval agents handle a query.
//!
//! The router asks an external classification call to pick agents, then
//! defends every failure path with deterministic parsing fallbacks: a
//! structured-JSON parse, a textual scan for known agent names, and
//! finally a flag-driven default. `route` never errors and never
//! returns an empty agent set.

use crate::llm::{strip_code_fences, ChatClient};
use crate::types::{AgentKind, RoutingDecision};
use std::sync::Arc;
use tracing::{debug, warn};

/// The query router.
pub struct Router {
    chat: Arc<dyn ChatClient>,
}

fn routing_system_prompt() -> String {
    let mut prompt = String::from(
        "You route support queries to retrieval agents. Known agents:\n",
    );
    for kind in AgentKind::all() {
        prompt.push_str(&format!("- {}: {}\n", kind.name(), kind.description()));
    }
    prompt.push_str(
        "Pick the best agent (or several, for outage-style queries that \
         benefit from web, log, and semantic evidence together). Reply with \
         JSON only: {\"agent\": \"<name>\", \"reasoning\": \"...\"} or \
         {\"agents\": [\"<name>\", ...], \"reasoning\": \"...\"}.",
    );
    prompt
}

impl Router {
    /// Create a router over the given classification client.
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Decide which agents handle `query`.
    ///
    /// Never errors and never returns an empty agent set: every failure
    /// path terminates in the deterministic fallback policy.
    pub async fn route(
        &self,
        query: &str,
        user_can_wait: bool,
        production_incident: bool,
    ) -> RoutingDecision {
        let user_prompt = format!(
            "Query: {query}\nuser_can_wait: {user_can_wait}\nproduction_incident: {production_incident}"
        );

        let reply = match self.chat.complete(&routing_system_prompt(), &user_prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "routing classification failed; using fallback policy");
                return fallback_decision(user_can_wait, production_incident);
            }
        };

        match parse_decision(&reply) {
            Some(decision) => {
                debug!(agents = ?decision.agents, "routing classified");
                decision
            }
            None => {
                warn!(reply = %reply, "unusable routing reply; using fallback policy");
                fallback_decision(user_can_wait, production_incident)
            }
        }
    }
}

/// Parse a classification reply into a routing decision.
///
/// Tries structured JSON first (`{"agent": ...}` or `{"agents": [...]}`,
/// code fences tolerated), then a best-effort textual scan for known
/// agent names. Unknown names are dropped; an empty surviving set means
/// the reply was unusable.
fn parse_decision(reply: &str) -> Option<RoutingDecision> {
    let cleaned = strip_code_fences(reply);

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) {
        let reasoning = value["reasoning"].as_str().unwrap_or_default().to_owned();

        let mut named: Vec<&str> = Vec::new();
        if let Some(single) = value["agent"].as_str() {
            named.push(single);
        }
        if let Some(many) = value["agents"].as_array() {
            named.extend(many.iter().filter_map(|v| v.as_str()));
        }

        let agents = dedup_kinds(named.into_iter().filter_map(AgentKind::parse));
        if !agents.is_empty() {
            return Some(RoutingDecision {
                agents,
                reasoning,
                fallback: false,
            });
        }
    }

    // Textual best-effort: scan the reply for known agent names.
    let lower = cleaned.to_lowercase();
    let agents = dedup_kinds(
        AgentKind::all()
            .iter()
            .copied()
            .filter(|kind| lower.contains(kind.name())),
    );
    if agents.is_empty() {
        return None;
    }
    Some(RoutingDecision {
        agents,
        reasoning: format!("recovered agent names from unstructured reply: {}", cleaned.trim()),
        fallback: false,
    })
}

fn dedup_kinds(kinds: impl Iterator<Item = AgentKind>) -> Vec<AgentKind> {
    let mut out: Vec<AgentKind> = Vec::new();
    for kind in kinds {
        if !out.contains(&kind) {
            out.push(kind);
        }
    }
    out
}

/// The deterministic fallback policy.
///
/// Production incidents route to the fast semantic agent; patient users
/// get the ensemble; everyone else gets the semantic agent as the
/// universal default. Always exactly one agent.
pub fn fallback_decision(user_can_wait: bool, production_incident: bool) -> RoutingDecision {
    let (agent, reasoning) = if production_incident {
        (
            AgentKind::Semantic,
            "fallback policy: production incident routes to the fast semantic agent",
        )
    } else if user_can_wait {
        (
            AgentKind::Ensemble,
            "fallback policy: patient query routes to the ensemble agent",
        )
    } else {
        (
            AgentKind::Semantic,
            "fallback policy: default to the fast semantic agent",
        )
    };

    RoutingDecision {
        agents: vec![agent],
        reasoning: reasoning.to_owned(),
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SiftError};
    use async_trait::async_trait;

    struct ScriptedChat(std::result::Result<String, String>);

    #[async_trait]
    impl ChatClient for ScriptedChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            match &self.0 {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => Err(SiftError::Llm(message.clone())),
            }
        }
    }

    fn router_replying(reply: &str) -> Router {
        Router::new(Arc::new(ScriptedChat(Ok(reply.to_owned()))))
    }

    fn failing_router() -> Router {
        Router::new(Arc::new(ScriptedChat(Err("LLM offline".into()))))
    }

    #[tokio::test]
    async fn structured_single_agent_reply() {
        let router = router_replying(
            "{\"agent\": \"keyword\", \"reasoning\": \"ticket reference in query\"}",
        );
        let decision = router.route("HBASE-12345 connection timeout", false, false).await;
        assert_eq!(decision.agents, vec![AgentKind::Keyword]);
        assert!(!decision.fallback);
        assert!(decision.reasoning.contains("ticket"));
    }

    #[tokio::test]
    async fn structured_multi_agent_reply() {
        let router = router_replying(
            "{\"agents\": [\"web\", \"log\", \"semantic\"], \"reasoning\": \"outage query\"}",
        );
        let decision = router.route("is GitHub down right now", false, true).await;
        assert_eq!(
            decision.agents,
            vec![AgentKind::Web, AgentKind::Log, AgentKind::Semantic]
        );
    }

    #[tokio::test]
    async fn fenced_json_reply_parses() {
        let router =
            router_replying("```json\n{\"agent\": \"ensemble\", \"reasoning\": \"thorough\"}\n```");
        let decision = router.route("deep dive please", true, false).await;
        assert_eq!(decision.agents, vec![AgentKind::Ensemble]);
    }

    #[tokio::test]
    async fn free_text_reply_recovered_by_substring() {
        let router = router_replying("I would use the web agent for this one.");
        let decision = router.route("is the site down", false, false).await;
        assert_eq!(decision.agents, vec![AgentKind::Web]);
        assert!(!decision.fallback);
    }

    #[tokio::test]
    async fn duplicate_names_deduplicated() {
        let router = router_replying(
            "{\"agents\": [\"web\", \"web\", \"log\"], \"reasoning\": \"\"}",
        );
        let decision = router.route("q", false, false).await;
        assert_eq!(decision.agents, vec![AgentKind::Web, AgentKind::Log]);
    }

    #[tokio::test]
    async fn unknown_agent_name_falls_back() {
        let router = router_replying("{\"agent\": \"telepathy\", \"reasoning\": \"?\"}");
        let decision = router.route("q", false, false).await;
        assert!(decision.fallback);
        assert_eq!(decision.agents, vec![AgentKind::Semantic]);
    }

    #[tokio::test]
    async fn call_failure_incident_yields_semantic() {
        let decision = failing_router().route("q", false, true).await;
        assert!(decision.fallback);
        assert_eq!(decision.agents, vec![AgentKind::Semantic]);
    }

    #[tokio::test]
    async fn call_failure_patient_yields_ensemble() {
        let decision = failing_router().route("q", true, false).await;
        assert!(decision.fallback);
        assert_eq!(decision.agents, vec![AgentKind::Ensemble]);
    }

    #[tokio::test]
    async fn call_failure_default_yields_semantic() {
        let decision = failing_router().route("q", false, false).await;
        assert_eq!(decision.agents, vec![AgentKind::Semantic]);
    }

    #[tokio::test]
    async fn incident_flag_wins_over_patience_in_fallback() {
        let decision = failing_router().route("q", true, true).await;
        assert_eq!(decision.agents, vec![AgentKind::Semantic]);
    }

    #[tokio::test]
    async fn every_decision_names_known_agents_only() {
        let replies = [
            "{\"agent\": \"keyword\", \"reasoning\": \"\"}",
            "{\"agents\": [\"web\", \"log\"], \"reasoning\": \"\"}",
            "use the hybrid agent",
            "garbage with no names at all",
        ];
        for reply in replies {
            let decision = router_replying(reply).route("q", false, false).await;
            assert!(!decision.agents.is_empty());
            for agent in &decision.agents {
                assert!(AgentKind::all().contains(agent));
            }
        }
    }

    #[test]
    fn system_prompt_describes_every_agent() {
        let prompt = routing_system_prompt();
        for kind in AgentKind::all() {
            assert!(prompt.contains(kind.name()));
        }
    }
}
