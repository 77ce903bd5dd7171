//! Demo binary: run one query through the engine with in-memory
//! backends.
//!
//! ```text
//! sift-query "HBASE-12345 connection timeout" [--wait] [--incident]
//! ```
//!
//! Without a reachable LLM service the router exercises its
//! deterministic fallback policy, so this works fully offline.

use anyhow::Context as _;
use chrono::{Duration, Utc};
use sift::agents::{
    AgentRegistry, EnsembleAgent, HybridAgent, KeywordAgent, LogAgent, RetrievalAgent,
    SemanticAgent,
};
use sift::agents::WebAgent;
use sift::backends::memory::{InMemoryDocumentIndex, InMemoryLogStore};
use sift::backends::{Document, EmbeddedWebSearch, LogEntry, LogSeverity};
use sift::llm::HttpChatClient;
use sift::{Engine, EngineConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "HBASE-12345 connection timeout on region server resolved by raising \
             hbase.rpc.timeout to 120s and checking GC pauses",
        )
        .with_meta("ticket_key", "HBASE-12345")
        .with_meta("title", "Region server connection timeouts"),
        Document::new(
            "KAFKA-901 stale broker metadata after rolling upgrade; restart the \
             affected brokers in order",
        )
        .with_meta("ticket_key", "KAFKA-901"),
        Document::new("Connection pool exhaustion under sustained ingestion load")
            .with_meta("title", "Pool tuning runbook"),
        Document::new("ZooKeeper session expiry causes cascading region server aborts")
            .with_meta("ticket_key", "HBASE-9800"),
    ]
}

fn sample_logs() -> Vec<LogEntry> {
    let now = Utc::now();
    [
        (5, LogSeverity::Error, "SocketTimeoutException calling region server rs-3"),
        (12, LogSeverity::Warn, "slow WAL sync took 4200 ms"),
        (40, LogSeverity::Info, "region server heartbeat ok"),
    ]
    .into_iter()
    .map(|(minutes, severity, message)| LogEntry {
        timestamp: now - Duration::minutes(minutes),
        severity,
        logger: "org.apache.hadoop.hbase".into(),
        message: message.into(),
        raw: message.into(),
    })
    .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let user_can_wait = args.iter().any(|a| a == "--wait");
    let production_incident = args.iter().any(|a| a == "--incident");
    let query = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .context("usage: sift-query <query> [--wait] [--incident]")?;

    let config = EngineConfig::default();
    let chat = Arc::new(HttpChatClient::new(config.llm.clone())?);

    let index = Arc::new(InMemoryDocumentIndex::new(sample_documents()));
    let logs = Arc::new(InMemoryLogStore::new(sample_logs()));

    let retrieval = &config.retrieval;
    let keyword: Arc<dyn RetrievalAgent> = Arc::new(KeywordAgent::new(
        index.clone(),
        index.clone(),
        retrieval.default_limit,
        retrieval.urgent_limit,
        retrieval.matcher_sample_size,
    ));
    let semantic: Arc<dyn RetrievalAgent> = Arc::new(SemanticAgent::new(
        index.clone(),
        retrieval.default_limit,
        retrieval.urgent_limit,
    ));
    let hybrid: Arc<dyn RetrievalAgent> = Arc::new(HybridAgent::new(
        index.clone(),
        index.clone(),
        retrieval.hybrid_semantic_weight,
        retrieval.hybrid_keyword_weight,
        retrieval.default_limit,
        retrieval.urgent_limit,
    ));
    let ensemble: Arc<dyn RetrievalAgent> = Arc::new(EnsembleAgent::new(
        vec![keyword.clone(), semantic.clone(), hybrid.clone()],
        retrieval.ensemble_per_method,
        retrieval.default_limit,
        retrieval.urgent_limit,
    ));
    let log_agent: Arc<dyn RetrievalAgent> = Arc::new(LogAgent::new(
        logs,
        retrieval.default_limit,
        retrieval.urgent_limit,
        config.log.window_hours,
        config.log.urgent_window_hours,
    ));

    let mut registry = AgentRegistry::new();
    registry.register(keyword);
    registry.register(semantic);
    registry.register(hybrid);
    registry.register(ensemble);
    registry.register(log_agent);

    // Live web search only when a SearxNG instance is configured; the
    // rest of the demo stays fully offline.
    if let Ok(searx_url) = std::env::var("SIFT_SEARX_URL") {
        let web_backend = EmbeddedWebSearch::new(sift_websearch::WebSearchConfig {
            searx_base_url: Some(searx_url),
            ..Default::default()
        })?;
        registry.register(Arc::new(WebAgent::new(
            chat.clone(),
            Arc::new(web_backend),
            retrieval.default_limit,
            retrieval.urgent_limit,
            config.web.max_planned_queries,
        )));
    }

    let engine = Engine::new(config, chat, registry)?;
    let state = engine
        .process(query, user_can_wait, production_incident)
        .await?;

    println!("request {}", state.id);
    println!(
        "routed to [{}] (fallback: {}): {}",
        state
            .routing
            .agents
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", "),
        state.routing.fallback,
        state.routing.reasoning
    );
    println!(
        "agents succeeded: {:?}, failed: {:?}",
        state.merge_metadata.agents_succeeded, state.merge_metadata.agents_failed
    );
    if !state.relevant_tickets.is_empty() {
        println!("relevant tickets: {}", state.relevant_tickets.join(", "));
    }

    println!("\nevidence ({} unique):", state.merged_contexts.len());
    for (index, context) in state.merged_contexts.iter().enumerate() {
        println!(
            "  [{}] {:.2} {} — {}",
            index + 1,
            context.score,
            context.source,
            context.content
        );
    }

    if let Some(answer) = &state.final_answer {
        println!("\nanswer:\n{answer}");
    }

    Ok(())
}
