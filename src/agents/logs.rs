//! Log agent: structured log search with severity-weighted ranking.
//!
//! Plans two kinds of queries — an exception-type search for each
//! exception-shaped token in the user query, plus a time-windowed
//! general search — executes them concurrently, deduplicates
//! near-identical lines (after stripping timestamps and digits), and
//! ranks the survivors by severity-weighted term relevance.

use crate::backends::{LogEntry, LogQueryFilter, LogSearchBackend, LogSeverity};
use crate::error::Result;
use crate::types::{AgentKind, Context};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

use super::{effective_limit, AgentOutcome, RetrievalAgent};

const SOURCE: &str = "log_search";
/// At most this many exception-type searches per request.
const MAX_EXCEPTION_QUERIES: usize = 3;

/// Extract exception-shaped tokens (`SocketTimeoutException`,
/// `OutOfMemoryError`) from a query, preserving their casing.
pub fn exception_tokens(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| {
            (t.ends_with("Exception") && t.len() > "Exception".len())
                || (t.ends_with("Error") && t.len() > "Error".len())
        })
        .filter(|t| seen.insert(t.to_owned()))
        .map(str::to_owned)
        .take(MAX_EXCEPTION_QUERIES)
        .collect()
}

/// Normalise a log line for near-duplicate detection: digits stripped
/// (which removes timestamps, counters, and IDs), lowercased, and
/// whitespace collapsed.
pub fn normalize_line(message: &str) -> String {
    let stripped: String = message
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lower_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Severity-weighted relevance: severity weight scaled by how many
/// query terms the message shares.
fn relevance(query_tokens: &HashSet<String>, entry: &LogEntry) -> f64 {
    let overlap = lower_tokens(&entry.message)
        .intersection(query_tokens)
        .count();
    entry.severity.weight() * (1.0 + overlap as f64)
}

/// The log retrieval agent.
pub struct LogAgent {
    backend: Arc<dyn LogSearchBackend>,
    limit: usize,
    urgent_cap: usize,
    window_hours: i64,
    urgent_window_hours: i64,
}

impl LogAgent {
    /// Create a log agent over the given backend.
    pub fn new(
        backend: Arc<dyn LogSearchBackend>,
        limit: usize,
        urgent_cap: usize,
        window_hours: i64,
        urgent_window_hours: i64,
    ) -> Self {
        Self {
            backend,
            limit,
            urgent_cap,
            window_hours,
            urgent_window_hours,
        }
    }

    fn plan_filters(&self, query: &str, urgent: bool) -> (Vec<LogQueryFilter>, i64) {
        let mut filters: Vec<LogQueryFilter> = exception_tokens(query)
            .into_iter()
            .map(|token| LogQueryFilter {
                text: Some(token),
                severity: Some(LogSeverity::Warn),
                ..Default::default()
            })
            .collect();

        let window_hours = if urgent {
            self.urgent_window_hours
        } else {
            self.window_hours
        };
        let now = Utc::now();
        filters.push(LogQueryFilter {
            severity: Some(LogSeverity::Warn),
            time_range: Some((now - Duration::hours(window_hours), now)),
            ..Default::default()
        });

        (filters, window_hours)
    }
}

#[async_trait]
impl RetrievalAgent for LogAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Log
    }

    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome> {
        if query.trim().is_empty() {
            return Ok(AgentOutcome::empty(SOURCE));
        }
        let k = effective_limit(self.limit, self.urgent_cap, urgent);

        let (filters, window_hours) = self.plan_filters(query, urgent);
        let searches = filters.iter().map(|f| self.backend.search(f, k));
        let results = join_all(searches).await;

        let mut outcome = AgentOutcome::empty(SOURCE);
        outcome
            .metadata
            .insert("window_hours".into(), window_hours.into());
        outcome
            .metadata
            .insert("planned_queries".into(), (filters.len() as u64).into());

        let mut entries: Vec<LogEntry> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        for result in results {
            match result {
                Ok(found) => entries.extend(found),
                Err(err) => {
                    warn!(error = %err, "log sub-query failed");
                    failures.push(err.to_string());
                }
            }
        }
        if !failures.is_empty() {
            outcome
                .metadata
                .insert("query_failures".into(), failures.into());
        }

        // Near-duplicate removal: keep the most severe copy of each
        // normalised line.
        let mut unique: HashMap<String, LogEntry> = HashMap::new();
        for entry in entries {
            let key = normalize_line(&entry.message);
            if key.is_empty() {
                continue;
            }
            unique
                .entry(key)
                .and_modify(|existing| {
                    if entry.severity > existing.severity {
                        *existing = entry.clone();
                    }
                })
                .or_insert(entry);
        }

        let query_tokens = lower_tokens(query);
        let mut contexts: Vec<Context> = unique
            .into_values()
            .map(|entry| {
                let score = relevance(&query_tokens, &entry);
                Context::new(entry.message.clone(), SOURCE, score)
                    .with_meta("timestamp", entry.timestamp.to_rfc3339())
                    .with_meta("level", entry.severity.name())
                    .with_meta("logger", entry.logger.clone())
            })
            .collect();

        contexts.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        contexts.truncate(k);
        outcome.contexts = contexts;
        Ok(outcome)
    }
}
