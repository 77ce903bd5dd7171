//! Sift: a support-query answering engine built on multi-agent
//! retrieval fusion.
//!
//! Free-text support queries are routed to one or more retrieval
//! strategies (keyword, semantic, hybrid, ensemble, web, logs), the
//! chosen agents run concurrently with per-agent failure isolation, and
//! their evidence is deduplicated and ranked into one set handed to an
//! answer-writing step.
//!
//! # Architecture
//!
//! The pipeline is built from pure stages:
//! - **Router**: picks agents via an LLM classification call with a
//!   deterministic fallback policy
//! - **Dispatcher**: one task per agent, wait-for-all barrier, failures
//!   isolated into per-agent results
//! - **Retrieval agents**: six strategies behind one trait, each
//!   degrading gracefully through ordered fallback tiers
//! - **Merger**: full-content dedup, highest score wins, execution
//!   metadata
//! - **Synthesis boundary**: the fused evidence payload for the external
//!   answer-writing call

pub mod agents;
pub mod backends;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod llm;
pub mod merge;
pub mod router;
pub mod synthesis;
pub mod types;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Result, SiftError};
pub use types::{AgentExecutionResult, AgentKind, Context, MergeMetadata, RequestState, RoutingDecision};
