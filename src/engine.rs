//! The engine: route → dispatch → merge → synthesis handoff.
//!
//! Each stage is a pure function from the previous stage's output; the
//! per-request envelope is assembled at the end rather than threaded
//! mutably through the pipeline. Partial agent failure degrades result
//! richness; only a total pipeline failure surfaces as an error.

use crate::agents::AgentRegistry;
use crate::config::EngineConfig;
use crate::dispatch::dispatch;
use crate::error::{Result, SiftError};
use crate::llm::ChatClient;
use crate::merge::merge;
use crate::router::Router;
use crate::synthesis::{build_synthesis_request, Synthesizer};
use crate::types::{Context, RequestState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// The query-routing and retrieval-fusion engine.
pub struct Engine {
    config: EngineConfig,
    router: Router,
    registry: AgentRegistry,
    synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl Engine {
    /// Create an engine over a classification client and an agent
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if the configuration is invalid or
    /// the registry is empty.
    pub fn new(
        config: EngineConfig,
        chat: Arc<dyn ChatClient>,
        registry: AgentRegistry,
    ) -> Result<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(SiftError::Config("agent registry is empty".into()));
        }
        Ok(Self {
            config,
            router: Router::new(chat),
            registry,
            synthesizer: None,
        })
    }

    /// Attach the answer-synthesis boundary.
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer one support query.
    ///
    /// Routes the query, fans out to the chosen agents, merges their
    /// evidence, and — when a synthesizer is attached — requests a final
    /// answer. Partial agent failure still produces a best-effort
    /// result; synthesis failure leaves `final_answer` unset.
    ///
    /// # Errors
    ///
    /// Only total pipeline failures surface here; per-agent and routing
    /// failures are absorbed into the request state.
    pub async fn process(
        &self,
        query: &str,
        user_can_wait: bool,
        production_incident: bool,
    ) -> Result<RequestState> {
        let id = Uuid::new_v4();
        let start = Instant::now();
        info!(%id, query, user_can_wait, production_incident, "processing query");

        let routing = self
            .router
            .route(query, user_can_wait, production_incident)
            .await;
        info!(%id, agents = ?routing.agents, fallback = routing.fallback, "routed");

        let urgent = production_incident;
        let agent_results = dispatch(&self.registry, &routing.agents, query, urgent).await;

        let (merged_contexts, merge_metadata) = merge(&routing.agents, &agent_results);

        let relevant_tickets = extract_tickets(&merged_contexts);

        let final_answer = match &self.synthesizer {
            Some(synthesizer) => {
                let request = build_synthesis_request(
                    query,
                    production_incident,
                    &routing.agents,
                    &agent_results,
                    &merged_contexts,
                );
                match synthesizer.synthesize(&request).await {
                    Ok(answer) => Some(answer),
                    Err(err) => {
                        warn!(%id, error = %err, "synthesis failed; returning evidence only");
                        None
                    }
                }
            }
            None => None,
        };

        info!(
            %id,
            contexts = merged_contexts.len(),
            succeeded = merge_metadata.agents_succeeded.len(),
            failed = merge_metadata.agents_failed.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request complete"
        );

        Ok(RequestState {
            id,
            query: query.to_owned(),
            user_can_wait,
            production_incident,
            routing,
            agent_results,
            merged_contexts,
            merge_metadata,
            final_answer,
            relevant_tickets,
        })
    }
}

/// Collect distinct ticket keys surfaced by the merged evidence.
fn extract_tickets(contexts: &[Context]) -> Vec<String> {
    let mut tickets: Vec<String> = Vec::new();
    for context in contexts {
        if let Some(key) = context.metadata.get("ticket_key").and_then(|v| v.as_str()) {
            if !key.is_empty() && !tickets.iter().any(|t| t == key) {
                tickets.push(key.to_owned());
            }
        }
    }
    tickets
}
