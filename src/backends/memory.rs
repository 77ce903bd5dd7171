//! In-memory reference backends.
//!
//! [`InMemoryDocumentIndex`] implements both the keyword and the vector
//! contracts with plain token arithmetic; [`InMemoryLogStore`] implements
//! the log contract over a fixed entry list. The demo binary and the
//! integration tests run the full pipeline against these, with no
//! external services.

use super::logs::{LogEntry, LogQueryFilter, LogSearchBackend};
use super::{Document, KeywordSearchBackend, VectorSearchBackend};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// A document index held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentIndex {
    docs: Vec<Document>,
}

impl InMemoryDocumentIndex {
    /// Build an index over the given documents.
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Jaccard similarity between two token sets.
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

#[async_trait]
impl KeywordSearchBackend for InMemoryDocumentIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let query_tokens = tokens(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Document> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let overlap = tokens(&doc.content)
                    .intersection(&query_tokens)
                    .count();
                (overlap > 0).then(|| doc.clone().with_score(overlap as f64))
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Document>> {
        Ok(self.docs.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl VectorSearchBackend for InMemoryDocumentIndex {
    fn supports_rerank(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, k: usize, rerank: bool) -> Result<Vec<Document>> {
        let query_tokens = tokens(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let query_lower = query.to_lowercase();
        let mut scored: Vec<Document> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let mut score = jaccard(&tokens(&doc.content), &query_tokens);
                // The "re-rank" stage favours documents containing the
                // query as a phrase, approximating a cross-encoder pass.
                if rerank && doc.content.to_lowercase().contains(&query_lower) {
                    score *= 1.5;
                }
                (score > 0.0).then(|| doc.clone().with_score(score))
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let query_tokens = tokens(query);
        Ok(self
            .docs
            .iter()
            .filter(|doc| {
                let doc_tokens = tokens(&doc.content);
                query_tokens.iter().any(|t| doc_tokens.contains(t))
            })
            .take(k)
            .cloned()
            .collect())
    }
}

/// A log store held entirely in memory. Entries are returned newest
/// first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogStore {
    entries: Vec<LogEntry>,
}

impl InMemoryLogStore {
    /// Build a store over the given entries.
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl LogSearchBackend for InMemoryLogStore {
    async fn search(&self, filter: &LogQueryFilter, max_results: usize) -> Result<Vec<LogEntry>> {
        let mut matched: Vec<LogEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                if let Some(ref text) = filter.text {
                    if !entry
                        .message
                        .to_lowercase()
                        .contains(&text.to_lowercase())
                    {
                        return false;
                    }
                }
                if let Some(min_severity) = filter.severity {
                    if entry.severity < min_severity {
                        return false;
                    }
                }
                if let Some(ref logger) = filter.logger {
                    if !entry.logger.contains(logger.as_str()) {
                        return false;
                    }
                }
                if let Some((start, end)) = filter.time_range {
                    if entry.timestamp < start || entry.timestamp >= end {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(max_results);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::logs::LogSeverity;
    use chrono::{Duration, Utc};

    fn sample_index() -> InMemoryDocumentIndex {
        InMemoryDocumentIndex::new(vec![
            Document::new("HBASE-12345 connection timeout fixed by increasing RPC timeout")
                .with_meta("ticket_key", "HBASE-12345"),
            Document::new("Kafka broker restart resolves stale metadata")
                .with_meta("ticket_key", "KAFKA-777"),
            Document::new("connection pool exhaustion under load"),
        ])
    }

    #[tokio::test]
    async fn keyword_search_ranks_by_overlap() {
        let index = sample_index();
        let docs = KeywordSearchBackend::search(&index, "HBASE-12345 connection timeout", 10)
            .await
            .expect("search");
        assert!(!docs.is_empty());
        assert!(docs[0].content.contains("HBASE-12345"));
    }

    #[tokio::test]
    async fn keyword_search_empty_query_returns_empty() {
        let index = sample_index();
        let docs = KeywordSearchBackend::search(&index, "   ", 10)
            .await
            .expect("search");
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn sample_respects_limit() {
        let index = sample_index();
        let docs = index.sample(2).await.expect("sample");
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn vector_search_rerank_boosts_phrase_match() {
        let index = sample_index();
        let reranked = VectorSearchBackend::search(&index, "connection timeout", 10, true)
            .await
            .expect("search");
        let base = VectorSearchBackend::search(&index, "connection timeout", 10, false)
            .await
            .expect("search");
        assert!(!reranked.is_empty());
        assert!(reranked[0].score >= base[0].score);
    }

    #[tokio::test]
    async fn nearest_returns_unranked_matches() {
        let index = sample_index();
        let docs = index.nearest("connection", 10).await.expect("nearest");
        assert_eq!(docs.len(), 2);
        // Corpus order, not score order.
        assert!(docs[0].content.contains("HBASE-12345"));
    }

    fn entry(age_minutes: i64, severity: LogSeverity, message: &str) -> LogEntry {
        let timestamp = Utc::now() - Duration::minutes(age_minutes);
        LogEntry {
            timestamp,
            severity,
            logger: "org.apache.hadoop.hbase.client".into(),
            message: message.into(),
            raw: format!("{timestamp} {severity} {message}"),
        }
    }

    #[tokio::test]
    async fn log_store_filters_by_text_and_severity() {
        let store = InMemoryLogStore::new(vec![
            entry(5, LogSeverity::Error, "SocketTimeoutException on region server"),
            entry(10, LogSeverity::Info, "region server heartbeat ok"),
            entry(15, LogSeverity::Warn, "slow sync on WAL"),
        ]);

        let filter = LogQueryFilter {
            text: Some("timeout".into()),
            severity: Some(LogSeverity::Warn),
            ..Default::default()
        };
        let entries = store.search(&filter, 10).await.expect("search");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains("SocketTimeoutException"));
    }

    #[tokio::test]
    async fn log_store_respects_time_window_and_order() {
        let store = InMemoryLogStore::new(vec![
            entry(120, LogSeverity::Error, "old failure"),
            entry(5, LogSeverity::Error, "recent failure"),
            entry(30, LogSeverity::Error, "mid failure"),
        ]);

        let filter = LogQueryFilter {
            time_range: Some((Utc::now() - Duration::hours(1), Utc::now())),
            ..Default::default()
        };
        let entries = store.search(&filter, 10).await.expect("search");
        assert_eq!(entries.len(), 2);
        // Newest first.
        assert!(entries[0].message.contains("recent"));
    }

    #[tokio::test]
    async fn log_store_truncates_to_max_results() {
        let entries: Vec<LogEntry> = (0..20)
            .map(|i| entry(i, LogSeverity::Info, &format!("message {i}")))
            .collect();
        let store = InMemoryLogStore::new(entries);
        let found = store
            .search(&LogQueryFilter::default(), 5)
            .await
            .expect("search");
        assert_eq!(found.len(), 5);
    }
}
