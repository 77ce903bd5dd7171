//! Search backend call contracts.
//!
//! The engine treats every concrete store — keyword index, vector store,
//! web search, structured logs — as an external collaborator behind one
//! of these traits. Only the call contracts live here; backend-internal
//! indexing and ranking math are out of scope. [`memory`] provides
//! in-memory reference implementations for the demo binary and tests.

pub mod keyword;
pub mod logs;
pub mod memory;
pub mod vector;
pub mod web;

pub use keyword::KeywordSearchBackend;
pub use logs::{LogEntry, LogQueryFilter, LogSearchBackend, LogSeverity};
pub use vector::VectorSearchBackend;
pub use web::{EmbeddedWebSearch, WebHit, WebSearchBackend};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document returned by the keyword or vector backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The document text.
    pub content: String,
    /// Open key/value map: ticket key, title, timestamps…
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Backend-assigned relevance score, when the backend ranks.
    #[serde(default)]
    pub score: f64,
}

impl Document {
    /// Create a document with empty metadata and zero score.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
            score: 0.0,
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the backend score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}
