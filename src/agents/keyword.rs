//! Keyword agent: BM25 matching over sampled backend documents.
//!
//! The matcher is built once, lazily, from a corpus sample served by the
//! keyword backend. A degenerate corpus — too few usable documents,
//! contents too short, or a zero average token length — permanently
//! disables the matcher, and the variant transparently serves from the
//! semantic backend instead, tagging results so callers can see the
//! fallback path.

use crate::backends::{Document, KeywordSearchBackend, VectorSearchBackend};
use crate::error::{Result, SiftError};
use crate::types::{AgentKind, Context};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{contexts_from_docs, effective_limit, AgentOutcome, RetrievalAgent};

/// BM25 term-saturation parameter.
const BM25_K1: f64 = 1.5;
/// BM25 length-normalisation parameter.
const BM25_B: f64 = 0.75;

/// Minimum usable documents for matcher construction.
const MIN_CORPUS_DOCS: usize = 2;
/// Minimum average content length in characters.
const MIN_AVG_CONTENT_CHARS: f64 = 10.0;

/// Source tag for matcher-served results.
const SOURCE_BM25: &str = "keyword_bm25";
/// Source tag when the variant serves from the semantic backend.
const SOURCE_FALLBACK: &str = "keyword_fallback_semantic";

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// An in-process Okapi BM25 matcher over a fixed document corpus.
#[derive(Debug)]
pub struct Bm25Matcher {
    docs: Vec<Document>,
    doc_tokens: Vec<Vec<String>>,
    doc_freq: HashMap<String, usize>,
    avg_doc_len: f64,
}

impl Bm25Matcher {
    /// Build a matcher from a corpus sample.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Agent`] when the corpus is degenerate:
    /// fewer than two usable documents, average content under ten
    /// characters, or a zero average token count (which would divide by
    /// zero in the score formula).
    pub fn build(docs: Vec<Document>) -> Result<Self> {
        let usable: Vec<Document> = docs
            .into_iter()
            .filter(|d| !d.content.trim().is_empty())
            .collect();

        if usable.len() < MIN_CORPUS_DOCS {
            return Err(SiftError::Agent(format!(
                "matcher corpus too small: {} usable documents",
                usable.len()
            )));
        }

        let avg_chars = usable
            .iter()
            .map(|d| d.content.trim().len())
            .sum::<usize>() as f64
            / usable.len() as f64;
        if avg_chars < MIN_AVG_CONTENT_CHARS {
            return Err(SiftError::Agent(format!(
                "matcher corpus too short: {avg_chars:.1} average characters"
            )));
        }

        let doc_tokens: Vec<Vec<String>> =
            usable.iter().map(|d| tokenize(&d.content)).collect();
        let total_tokens: usize = doc_tokens.iter().map(Vec::len).sum();
        let avg_doc_len = total_tokens as f64 / doc_tokens.len() as f64;
        if avg_doc_len == 0.0 {
            return Err(SiftError::Agent(
                "matcher corpus degenerate: zero average document length".into(),
            ));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for tokens in &doc_tokens {
            let mut seen: Vec<&String> = tokens.iter().collect();
            seen.sort();
            seen.dedup();
            for token in seen {
                *doc_freq.entry(token.clone()).or_default() += 1;
            }
        }

        Ok(Self {
            docs: usable,
            doc_tokens,
            doc_freq,
            avg_doc_len,
        })
    }

    /// Number of documents in the matcher corpus.
    pub fn corpus_size(&self) -> usize {
        self.docs.len()
    }

    fn score_doc(&self, index: usize, query_tokens: &[String]) -> f64 {
        let tokens = &self.doc_tokens[index];
        let doc_len = tokens.len() as f64;
        let n = self.docs.len() as f64;

        query_tokens
            .iter()
            .map(|term| {
                let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
                if df == 0.0 {
                    return 0.0;
                }
                let tf = tokens.iter().filter(|t| *t == term).count() as f64;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                let saturation = (tf * (BM25_K1 + 1.0))
                    / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / self.avg_doc_len));
                idf * saturation
            })
            .sum()
    }

    /// Score the corpus against `query` and return the top `k` matches
    /// as contexts.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<Context> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = (0..self.docs.len())
            .map(|i| (i, self.score_doc(i, &query_tokens)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let doc = &self.docs[i];
                Context {
                    content: doc.content.clone(),
                    metadata: doc.metadata.clone(),
                    source: SOURCE_BM25.to_owned(),
                    score,
                }
            })
            .collect()
    }
}

/// The keyword retrieval agent.
pub struct KeywordAgent {
    backend: Arc<dyn KeywordSearchBackend>,
    semantic_fallback: Arc<dyn VectorSearchBackend>,
    limit: usize,
    urgent_cap: usize,
    sample_size: usize,
    /// Built on first use; `None` records a permanently disabled
    /// matcher.
    matcher: OnceCell<Option<Bm25Matcher>>,
}

impl KeywordAgent {
    /// Create a keyword agent over the given backends.
    pub fn new(
        backend: Arc<dyn KeywordSearchBackend>,
        semantic_fallback: Arc<dyn VectorSearchBackend>,
        limit: usize,
        urgent_cap: usize,
        sample_size: usize,
    ) -> Self {
        Self {
            backend,
            semantic_fallback,
            limit,
            urgent_cap,
            sample_size,
            matcher: OnceCell::new(),
        }
    }

    async fn matcher(&self) -> &Option<Bm25Matcher> {
        self.matcher
            .get_or_init(|| async {
                let docs = match self.backend.sample(self.sample_size).await {
                    Ok(docs) => docs,
                    Err(err) => {
                        warn!(error = %err, "keyword corpus sampling failed; matcher disabled");
                        return None;
                    }
                };
                match Bm25Matcher::build(docs) {
                    Ok(matcher) => {
                        debug!(corpus = matcher.corpus_size(), "keyword matcher built");
                        Some(matcher)
                    }
                    Err(err) => {
                        warn!(error = %err, "keyword matcher construction failed; matcher disabled");
                        None
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl RetrievalAgent for KeywordAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Keyword
    }

    async fn retrieve(&self, query: &str, urgent: bool) -> Result<AgentOutcome> {
        if query.trim().is_empty() {
            return Ok(AgentOutcome::empty(SOURCE_BM25));
        }
        let k = effective_limit(self.limit, self.urgent_cap, urgent);

        match self.matcher().await {
            Some(matcher) => {
                let contexts = matcher.top_k(query, k);
                let mut outcome = AgentOutcome {
                    contexts,
                    method: SOURCE_BM25.to_owned(),
                    metadata: HashMap::new(),
                };
                outcome
                    .metadata
                    .insert("corpus_size".into(), matcher.corpus_size().into());
                Ok(outcome)
            }
            None => {
                let mut outcome = AgentOutcome::empty(SOURCE_FALLBACK);
                outcome.metadata.insert("matcher_disabled".into(), true.into());
                match self.semantic_fallback.search(query, k, false).await {
                    Ok(docs) => {
                        outcome.contexts = contexts_from_docs(docs, SOURCE_FALLBACK);
                    }
                    Err(err) => {
                        warn!(error = %err, "keyword fallback search failed");
                        outcome
                            .metadata
                            .insert("fallback_error".into(), err.to_string().into());
                    }
                }
                Ok(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::InMemoryDocumentIndex;

    fn healthy_corpus() -> Vec<Document> {
        vec![
            Document::new("HBASE-12345 connection timeout fixed by increasing RPC timeout")
                .with_meta("ticket_key", "HBASE-12345"),
            Document::new("Kafka broker restart resolves stale metadata after upgrade"),
            Document::new("ZooKeeper session expiry causes region server aborts"),
            Document::new("connection pool exhaustion under sustained load"),
        ]
    }

    #[test]
    fn matcher_ranks_ticket_document_first() {
        let matcher = Bm25Matcher::build(healthy_corpus()).expect("build");
        let contexts = matcher.top_k("HBASE-12345 connection timeout", 3);
        assert!(!contexts.is_empty());
        assert!(contexts[0].content.contains("HBASE-12345"));
        assert_eq!(contexts[0].source, "keyword_bm25");
        assert_eq!(
            contexts[0].metadata.get("ticket_key").and_then(|v| v.as_str()),
            Some("HBASE-12345")
        );
    }

    #[test]
    fn matcher_scores_decrease_down_the_list() {
        let matcher = Bm25Matcher::build(healthy_corpus()).expect("build");
        let contexts = matcher.top_k("connection timeout", 4);
        for pair in contexts.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn matcher_rejects_tiny_corpus() {
        let err = Bm25Matcher::build(vec![Document::new("only one document here")]).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn matcher_rejects_short_contents() {
        let docs = vec![Document::new("ab"), Document::new("cd"), Document::new("ef")];
        let err = Bm25Matcher::build(docs).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn matcher_ignores_empty_documents() {
        let mut docs = healthy_corpus();
        docs.push(Document::new("   "));
        let matcher = Bm25Matcher::build(docs).expect("build");
        assert_eq!(matcher.corpus_size(), 4);
    }

    #[test]
    fn matcher_unknown_terms_score_zero() {
        let matcher = Bm25Matcher::build(healthy_corpus()).expect("build");
        assert!(matcher.top_k("quantum chromodynamics", 5).is_empty());
    }

    fn agent_over(docs: Vec<Document>) -> KeywordAgent {
        let index = Arc::new(InMemoryDocumentIndex::new(docs));
        KeywordAgent::new(index.clone(), index, 10, 5, 200)
    }

    #[tokio::test]
    async fn agent_serves_from_matcher() {
        let agent = agent_over(healthy_corpus());
        let outcome = agent
            .retrieve("HBASE-12345 connection timeout", false)
            .await
            .expect("retrieve");
        assert_eq!(outcome.method, "keyword_bm25");
        assert!(!outcome.contexts.is_empty());
    }

    #[tokio::test]
    async fn agent_empty_query_returns_empty() {
        let agent = agent_over(healthy_corpus());
        let outcome = agent.retrieve("  ", false).await.expect("retrieve");
        assert!(outcome.contexts.is_empty());
    }

    #[tokio::test]
    async fn agent_urgent_caps_results() {
        let docs: Vec<Document> = (0..12)
            .map(|i| Document::new(format!("connection troubleshooting note number {i}")))
            .collect();
        let agent = agent_over(docs);
        let outcome = agent.retrieve("connection", true).await.expect("retrieve");
        assert!(outcome.contexts.len() <= 5);
    }

    #[tokio::test]
    async fn degenerate_corpus_falls_back_to_semantic_permanently() {
        // One short doc: matcher construction fails, but the semantic
        // view of the same index still matches by token overlap.
        let agent = agent_over(vec![Document::new("broker connection reset investigation")]);

        let first = agent.retrieve("broker connection", false).await.expect("retrieve");
        assert_eq!(first.method, "keyword_fallback_semantic");
        assert!(first.metadata.get("matcher_disabled").is_some());
        assert!(first.contexts.iter().all(|c| c.source == "keyword_fallback_semantic"));

        // Subsequent calls stay on the fallback path.
        let second = agent.retrieve("broker", false).await.expect("retrieve");
        assert_eq!(second.method, "keyword_fallback_semantic");
    }
}
