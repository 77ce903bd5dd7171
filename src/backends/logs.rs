//! Structured log search backend contract.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Log severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSeverity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogSeverity {
    /// Relevance weight used by the log agent's severity-weighted
    /// ranking. Errors matter more than chatter.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Debug => 0.2,
            Self::Info => 0.5,
            Self::Warn => 1.0,
            Self::Error => 2.0,
            Self::Fatal => 3.0,
        }
    }

    /// Best-effort parse of a level string (`WARN`, `warning`, …).
    pub fn parse(level: &str) -> Option<LogSeverity> {
        match level.trim().to_uppercase().as_str() {
            "DEBUG" | "TRACE" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warn),
            "ERROR" | "ERR" => Some(Self::Error),
            "FATAL" | "CRITICAL" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Returns the canonical level name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Record timestamp.
    pub timestamp: DateTime<Utc>,
    /// Severity level.
    pub severity: LogSeverity,
    /// Logger name, e.g. `org.apache.hadoop.hbase.client`.
    pub logger: String,
    /// The log message.
    pub message: String,
    /// The raw line as ingested.
    pub raw: String,
}

/// Filter for a structured log query. All populated fields must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQueryFilter {
    /// Substring to look for in the message.
    pub text: Option<String>,
    /// Minimum severity.
    pub severity: Option<LogSeverity>,
    /// Logger name substring.
    pub logger: Option<String>,
    /// Inclusive start / exclusive end of the time window.
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// A structured log store.
#[async_trait]
pub trait LogSearchBackend: Send + Sync {
    /// Query log records matching `filter`, newest first, up to
    /// `max_results`.
    async fn search(&self, filter: &LogQueryFilter, max_results: usize) -> Result<Vec<LogEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_matches_weights() {
        assert!(LogSeverity::Fatal > LogSeverity::Error);
        assert!(LogSeverity::Error > LogSeverity::Warn);
        assert!(LogSeverity::Fatal.weight() > LogSeverity::Debug.weight());
    }

    #[test]
    fn severity_parse_accepts_aliases() {
        assert_eq!(LogSeverity::parse("warning"), Some(LogSeverity::Warn));
        assert_eq!(LogSeverity::parse("ERR"), Some(LogSeverity::Error));
        assert_eq!(LogSeverity::parse("critical"), Some(LogSeverity::Fatal));
        assert_eq!(LogSeverity::parse("trace"), Some(LogSeverity::Debug));
        assert_eq!(LogSeverity::parse("nope"), None);
    }

    #[test]
    fn severity_display_round_trips() {
        for level in [
            LogSeverity::Debug,
            LogSeverity::Info,
            LogSeverity::Warn,
            LogSeverity::Error,
            LogSeverity::Fatal,
        ] {
            assert_eq!(LogSeverity::parse(level.name()), Some(level));
        }
    }

    #[test]
    fn filter_default_is_unconstrained() {
        let filter = LogQueryFilter::default();
        assert!(filter.text.is_none());
        assert!(filter.severity.is_none());
        assert!(filter.logger.is_none());
        assert!(filter.time_range.is_none());
    }
}
