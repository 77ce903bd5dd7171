//! Concurrent agent fan-out with per-agent failure isolation.
//!
//! One task per routed agent, joined with a wait-for-all barrier: the
//! merger never runs until every dispatched agent has completed or
//! failed. A failing — or panicking — agent is converted into a failed
//! execution result and never disturbs its siblings. There is no
//! per-agent timeout; a slow agent delays the whole request.

use crate::agents::AgentRegistry;
use crate::types::{AgentExecutionResult, AgentKind};
use std::collections::HashMap;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Substituted when a routing decision somehow arrives empty.
pub const DEFAULT_AGENT: AgentKind = AgentKind::Semantic;

type AgentTask = JoinHandle<(crate::error::Result<crate::agents::AgentOutcome>, u64)>;

/// Fan `query` out to every agent in `agents` concurrently and wait for
/// all of them.
///
/// Returns exactly one [`AgentExecutionResult`] per distinct agent in
/// the input, regardless of success. Empty-content contexts are
/// filtered here, before anything reaches the merger.
pub async fn dispatch(
    registry: &AgentRegistry,
    agents: &[AgentKind],
    query: &str,
    urgent: bool,
) -> HashMap<AgentKind, AgentExecutionResult> {
    let agents: Vec<AgentKind> = if agents.is_empty() {
        warn!("empty routing set reached dispatch; substituting default agent");
        vec![DEFAULT_AGENT]
    } else {
        agents.to_vec()
    };

    let mut handles: Vec<(AgentKind, Option<AgentTask>)> = Vec::with_capacity(agents.len());
    for kind in &agents {
        match registry.get(*kind) {
            Some(agent) => {
                let query = query.to_owned();
                let handle = tokio::spawn(async move {
                    let start = Instant::now();
                    let result = agent.retrieve(&query, urgent).await;
                    (result, start.elapsed().as_millis() as u64)
                });
                handles.push((*kind, Some(handle)));
            }
            None => handles.push((*kind, None)),
        }
    }

    // Wait-for-all barrier: every agent completes or fails before the
    // merger sees anything.
    let mut results: HashMap<AgentKind, AgentExecutionResult> = HashMap::new();
    for (kind, handle) in handles {
        let result = match handle {
            None => {
                warn!(agent = %kind, "no agent registered for routed kind");
                AgentExecutionResult::failed(kind, "agent not registered")
            }
            Some(handle) => match handle.await {
                Ok((Ok(outcome), elapsed_ms)) => {
                    let contexts: Vec<_> = outcome
                        .contexts
                        .into_iter()
                        .filter(|c| !c.content.trim().is_empty())
                        .collect();
                    debug!(
                        agent = %kind,
                        method = %outcome.method,
                        contexts = contexts.len(),
                        elapsed_ms,
                        "agent completed"
                    );
                    let mut result = AgentExecutionResult::ok(kind, outcome.method, contexts);
                    result.metadata = outcome.metadata;
                    result.metadata.insert("elapsed_ms".into(), elapsed_ms.into());
                    result
                }
                Ok((Err(err), elapsed_ms)) => {
                    warn!(agent = %kind, error = %err, elapsed_ms, "agent failed");
                    AgentExecutionResult::failed(kind, err.to_string())
                }
                Err(join_err) => {
                    warn!(agent = %kind, error = %join_err, "agent task aborted");
                    AgentExecutionResult::failed(kind, format!("agent task aborted: {join_err}"))
                }
            },
        };
        results.insert(kind, result);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentOutcome, RetrievalAgent};
    use crate::error::{Result, SiftError};
    use crate::types::Context;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedAgent {
        kind: AgentKind,
        contexts: Vec<Context>,
        delay_ms: u64,
    }

    #[async_trait]
    impl RetrievalAgent for FixedAgent {
        fn kind(&self) -> AgentKind {
            self.kind
        }

        async fn retrieve(&self, _query: &str, _urgent: bool) -> Result<AgentOutcome> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            Ok(AgentOutcome {
                contexts: self.contexts.clone(),
                method: format!("{}_fixed", self.kind),
                metadata: Default::default(),
            })
        }
    }

    struct ErroringAgent(AgentKind);

    #[async_trait]
    impl RetrievalAgent for ErroringAgent {
        fn kind(&self) -> AgentKind {
            self.0
        }

        async fn retrieve(&self, _query: &str, _urgent: bool) -> Result<AgentOutcome> {
            Err(SiftError::Agent("backend exploded".into()))
        }
    }

    struct PanickingAgent(AgentKind);

    #[async_trait]
    impl RetrievalAgent for PanickingAgent {
        fn kind(&self) -> AgentKind {
            self.0
        }

        async fn retrieve(&self, _query: &str, _urgent: bool) -> Result<AgentOutcome> {
            panic!("agent bug");
        }
    }

    fn ctx(content: &str) -> Context {
        Context::new(content, "fixed", 1.0)
    }

    #[tokio::test]
    async fn one_failing_agent_does_not_abort_siblings() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent {
            kind: AgentKind::Keyword,
            contexts: vec![ctx("a"), ctx("b"), ctx("c")],
            delay_ms: 0,
        }));
        registry.register(Arc::new(ErroringAgent(AgentKind::Web)));

        let results = dispatch(
            &registry,
            &[AgentKind::Keyword, AgentKind::Web],
            "q",
            false,
        )
        .await;

        assert_eq!(results.len(), 2);
        let keyword = &results[&AgentKind::Keyword];
        assert!(keyword.success);
        assert_eq!(keyword.contexts.len(), 3);

        let web = &results[&AgentKind::Web];
        assert!(!web.success);
        assert!(web.error.as_deref().is_some_and(|e| e.contains("exploded")));
        assert!(web.contexts.is_empty());
    }

    #[tokio::test]
    async fn panicking_agent_is_isolated() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(PanickingAgent(AgentKind::Log)));
        registry.register(Arc::new(FixedAgent {
            kind: AgentKind::Semantic,
            contexts: vec![ctx("survivor")],
            delay_ms: 0,
        }));

        let results = dispatch(
            &registry,
            &[AgentKind::Log, AgentKind::Semantic],
            "q",
            false,
        )
        .await;

        assert!(!results[&AgentKind::Log].success);
        assert!(results[&AgentKind::Semantic].success);
    }

    #[tokio::test]
    async fn empty_routing_set_substitutes_default() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent {
            kind: DEFAULT_AGENT,
            contexts: vec![ctx("default")],
            delay_ms: 0,
        }));

        let results = dispatch(&registry, &[], "q", false).await;
        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&DEFAULT_AGENT));
    }

    #[tokio::test]
    async fn unregistered_agent_yields_failed_result() {
        let registry = AgentRegistry::new();
        let results = dispatch(&registry, &[AgentKind::Hybrid], "q", false).await;
        let result = &results[&AgentKind::Hybrid];
        assert!(!result.success);
        assert!(result.error.as_deref().is_some_and(|e| e.contains("not registered")));
    }

    #[tokio::test]
    async fn empty_content_contexts_filtered_before_merge() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent {
            kind: AgentKind::Semantic,
            contexts: vec![ctx("keep"), Context::new("   ", "fixed", 1.0), ctx("also keep")],
            delay_ms: 0,
        }));

        let results = dispatch(&registry, &[AgentKind::Semantic], "q", false).await;
        assert_eq!(results[&AgentKind::Semantic].contexts.len(), 2);
    }

    #[tokio::test]
    async fn waits_for_every_agent_before_returning() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent {
            kind: AgentKind::Keyword,
            contexts: vec![ctx("fast")],
            delay_ms: 0,
        }));
        registry.register(Arc::new(FixedAgent {
            kind: AgentKind::Log,
            contexts: vec![ctx("slow")],
            delay_ms: 50,
        }));

        let results = dispatch(
            &registry,
            &[AgentKind::Keyword, AgentKind::Log],
            "q",
            false,
        )
        .await;

        // Both present: the barrier held until the slow agent finished.
        assert_eq!(results.len(), 2);
        assert!(results[&AgentKind::Log].success);
    }

    #[tokio::test]
    async fn records_elapsed_time_in_metadata() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent {
            kind: AgentKind::Semantic,
            contexts: vec![ctx("x")],
            delay_ms: 0,
        }));

        let results = dispatch(&registry, &[AgentKind::Semantic], "q", false).await;
        assert!(results[&AgentKind::Semantic].metadata.contains_key("elapsed_ms"));
    }
}
