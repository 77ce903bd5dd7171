//! Evidence fusion: deduplicate and rank per-agent results into one set.
//!
//! The merger is a pure function over the dispatcher's output. It calls
//! no external services and never fails; a completely empty input yields
//! an empty output plus metadata marking zero successes.

use crate::types::{AgentExecutionResult, AgentKind, Context, MergeMetadata};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Normalise content into a deduplication key.
///
/// Whitespace runs collapse to single spaces and the ends are trimmed,
/// so reflowed copies of the same evidence merge. The **full** content
/// participates — hashing a truncated prefix would falsely merge long
/// near-duplicate documents.
pub fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deduplicate contexts by normalised content, keeping the
/// higher-scored entry on collision.
///
/// Order is stable: each surviving context keeps the position of its
/// first occurrence.
pub fn dedup_contexts(contexts: Vec<Context>) -> Vec<Context> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Context> = Vec::new();

    for context in contexts {
        let key = normalize_content(&context.content);
        match seen.get(&key) {
            Some(&index) => {
                if context.score > unique[index].score {
                    unique[index] = context;
                }
            }
            None => {
                seen.insert(key, unique.len());
                unique.push(context);
            }
        }
    }

    unique
}

/// Merge per-agent execution results into one deduplicated evidence set.
///
/// Contexts from successful agents are concatenated in dispatch order
/// (`order`), then deduplicated by normalised full content with
/// highest-score-wins collisions. The returned metadata records which
/// agents ran, succeeded, and failed, the failure messages, the unique
/// context count, and the merge duration.
pub fn merge(
    order: &[AgentKind],
    results: &HashMap<AgentKind, AgentExecutionResult>,
) -> (Vec<Context>, MergeMetadata) {
    let start = Instant::now();

    let mut concatenated: Vec<Context> = Vec::new();
    let mut metadata = MergeMetadata {
        agents_executed: order.to_vec(),
        ..Default::default()
    };

    for kind in order {
        let Some(result) = results.get(kind) else {
            // A routed agent with no result is a dispatcher bug; record
            // it as a failure rather than inventing contexts.
            metadata.agents_failed.push(*kind);
            metadata
                .errors
                .insert(kind.name().to_owned(), "no execution result".to_owned());
            continue;
        };

        if result.success {
            metadata.agents_succeeded.push(*kind);
            concatenated.extend(result.contexts.iter().cloned());
        } else {
            metadata.agents_failed.push(*kind);
            metadata.errors.insert(
                kind.name().to_owned(),
                result.error.clone().unwrap_or_else(|| "unknown error".to_owned()),
            );
        }
    }

    let merged = dedup_contexts(concatenated);
    metadata.total_unique = merged.len();
    metadata.merge_duration_ms = start.elapsed().as_millis() as u64;

    debug!(
        executed = metadata.agents_executed.len(),
        succeeded = metadata.agents_succeeded.len(),
        failed = metadata.agents_failed.len(),
        unique = metadata.total_unique,
        "merge complete"
    );

    (merged, metadata)
}
