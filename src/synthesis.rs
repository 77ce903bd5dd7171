//! Answer-synthesis boundary.
//!
//! The engine's output contract ends at [`SynthesisRequest`]: the fused
//! evidence plus the per-agent breakdown, shaped for the external
//! answer-writing call. [`LlmSynthesizer`] is the bundled implementation
//! over [`ChatClient`]; a synthesis failure never fails the request.

use crate::llm::ChatClient;
use crate::error::Result;
use crate::types::{AgentExecutionResult, AgentKind, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a support engineer writing a final answer. \
Use only the evidence provided. Cite ticket keys and URLs when present. \
If the evidence is thin, say what is missing instead of guessing.";

/// Per-agent summary included in the synthesis payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Which agent.
    pub agent: AgentKind,
    /// The method that served (or failed to serve) the call.
    pub method: String,
    /// How many contexts the agent contributed.
    pub context_count: usize,
    /// Whether the agent succeeded.
    pub success: bool,
    /// The captured error when it did not.
    pub error: Option<String>,
}

/// Everything the external answer-writing call needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// The user's query.
    pub query: String,
    /// Whether this is a production incident.
    pub production_incident: bool,
    /// Distinct methods that produced evidence, in dispatch order.
    pub methods_used: Vec<String>,
    /// Every agent executed, in dispatch order.
    pub agents_executed: Vec<AgentKind>,
    /// Per-agent result summaries, in dispatch order.
    pub agent_summaries: Vec<AgentSummary>,
    /// The fused evidence set.
    pub evidence: Vec<Context>,
}

/// Build the synthesis payload from merged pipeline output.
///
/// Pure: reads the per-agent results and the merged evidence, calls
/// nothing.
pub fn build_synthesis_request(
    query: &str,
    production_incident: bool,
    order: &[AgentKind],
    agent_results: &HashMap<AgentKind, AgentExecutionResult>,
    merged_contexts: &[Context],
) -> SynthesisRequest {
    let mut methods_used: Vec<String> = Vec::new();
    let mut agent_summaries: Vec<AgentSummary> = Vec::new();

    for kind in order {
        let Some(result) = agent_results.get(kind) else {
            continue;
        };
        if result.success && !methods_used.contains(&result.method) {
            methods_used.push(result.method.clone());
        }
        agent_summaries.push(AgentSummary {
            agent: *kind,
            method: result.method.clone(),
            context_count: result.contexts.len(),
            success: result.success,
            error: result.error.clone(),
        });
    }

    SynthesisRequest {
        query: query.to_owned(),
        production_incident,
        methods_used,
        agents_executed: order.to_vec(),
        agent_summaries,
        evidence: merged_contexts.to_vec(),
    }
}

/// The external answer-writing call.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produce a free-text answer from the payload.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String>;
}

/// Bundled synthesizer that formats the payload into a prompt for the
/// shared LLM client.
pub struct LlmSynthesizer {
    chat: Arc<dyn ChatClient>,
}

impl LlmSynthesizer {
    /// Create a synthesizer over the given chat client.
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }
}

/// Render the payload as prompt text.
fn format_request(request: &SynthesisRequest) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Query: {}", request.query);
    let _ = writeln!(prompt, "Production incident: {}", request.production_incident);
    let _ = writeln!(prompt, "Methods used: {}", request.methods_used.join(", "));

    let _ = writeln!(prompt, "\nAgent breakdown:");
    for summary in &request.agent_summaries {
        match &summary.error {
            Some(error) => {
                let _ = writeln!(prompt, "- {} failed: {error}", summary.agent);
            }
            None => {
                let _ = writeln!(
                    prompt,
                    "- {} via {}: {} contexts",
                    summary.agent, summary.method, summary.context_count
                );
            }
        }
    }

    let _ = writeln!(prompt, "\nEvidence:");
    for (index, context) in request.evidence.iter().enumerate() {
        let _ = write!(prompt, "[{}] ({}, score {:.2})", index + 1, context.source, context.score);
        for key in ["ticket_key", "url"] {
            if let Some(value) = context.metadata.get(key).and_then(|v| v.as_str()) {
                let _ = write!(prompt, " {key}={value}");
            }
        }
        let _ = writeln!(prompt, "\n{}", context.content);
    }

    prompt
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String> {
        self.chat
            .complete(SYNTHESIS_SYSTEM_PROMPT, &format_request(request))
            .await
    }
}
