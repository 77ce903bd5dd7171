//! Engine configuration with sensible defaults.
//!
//! [`EngineConfig`] is loadable from a TOML file and validated before the
//! engine starts. Every section has defaults tuned for a small support
//! deployment; the only field without a usable default is the LLM service
//! URL when routing classification or synthesis is wired to a real
//! service.

use crate::error::{Result, SiftError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// LLM service connection (routing classification, planning, synthesis).
    pub llm: LlmConfig,
    /// Retrieval limits and fusion weights.
    pub retrieval: RetrievalConfig,
    /// Web agent query planning.
    pub web: WebPlanConfig,
    /// Log agent search windows.
    pub log: LogSearchConfig,
}

/// Connection details for the OpenAI-compatible LLM service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, e.g. `http://localhost:11434/v1`.
    pub api_url: String,
    /// Bearer token; empty for unauthenticated local servers.
    pub api_key: String,
    /// Model identifier sent in requests.
    pub api_model: String,
    /// Sampling temperature for classification and planning calls.
    pub temperature: f32,
    /// Response token cap.
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/v1".to_owned(),
            api_key: String::new(),
            api_model: "llama3.1:8b".to_owned(),
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

/// Result limits and score weights shared by the retrieval agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Per-agent result limit for normal queries.
    pub default_limit: usize,
    /// Per-agent result limit for urgent queries. Agents clamp to
    /// `min(default_limit, urgent_limit)` when urgency is flagged.
    pub urgent_limit: usize,
    /// How many backend documents the keyword agent samples when
    /// building its matcher.
    pub matcher_sample_size: usize,
    /// Semantic score weight in the hybrid combination.
    pub hybrid_semantic_weight: f64,
    /// Keyword score weight in the hybrid combination.
    pub hybrid_keyword_weight: f64,
    /// Per-delegate result cap inside the ensemble agent.
    pub ensemble_per_method: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            urgent_limit: 5,
            matcher_sample_size: 200,
            hybrid_semantic_weight: 0.7,
            hybrid_keyword_weight: 0.3,
            ensemble_per_method: 3,
        }
    }
}

/// Web agent planning limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebPlanConfig {
    /// Upper bound on planned search queries per request (1–5).
    pub max_planned_queries: usize,
}

impl Default for WebPlanConfig {
    fn default() -> Self {
        Self {
            max_planned_queries: 3,
        }
    }
}

/// Log agent search windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSearchConfig {
    /// Time window for the general log search, in hours.
    pub window_hours: i64,
    /// Narrower window used for urgent queries, in hours.
    pub urgent_window_hours: i64,
}

impl Default for LogSearchConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            urgent_window_hours: 1,
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if the file cannot be read, parsed,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SiftError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let config: EngineConfig = toml::from_str(&raw).map_err(|e| {
            SiftError::Config(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.default_limit == 0 {
            return Err(SiftError::Config(
                "retrieval.default_limit must be greater than 0".into(),
            ));
        }
        if self.retrieval.urgent_limit == 0 {
            return Err(SiftError::Config(
                "retrieval.urgent_limit must be greater than 0".into(),
            ));
        }
        if self.retrieval.matcher_sample_size < 2 {
            return Err(SiftError::Config(
                "retrieval.matcher_sample_size must be at least 2".into(),
            ));
        }
        let weight_sum =
            self.retrieval.hybrid_semantic_weight + self.retrieval.hybrid_keyword_weight;
        if self.retrieval.hybrid_semantic_weight < 0.0
            || self.retrieval.hybrid_keyword_weight < 0.0
            || weight_sum <= 0.0
        {
            return Err(SiftError::Config(
                "hybrid weights must be non-negative and sum to a positive value".into(),
            ));
        }
        if self.retrieval.ensemble_per_method == 0 {
            return Err(SiftError::Config(
                "retrieval.ensemble_per_method must be greater than 0".into(),
            ));
        }
        if self.web.max_planned_queries == 0 || self.web.max_planned_queries > 5 {
            return Err(SiftError::Config(
                "web.max_planned_queries must be between 1 and 5".into(),
            ));
        }
        if self.log.window_hours <= 0 || self.log.urgent_window_hours <= 0 {
            return Err(SiftError::Config(
                "log search windows must be positive".into(),
            ));
        }
        Ok(())
    }
}
