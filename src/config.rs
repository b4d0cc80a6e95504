//! Scoring configuration
//!
//! Operational settings only. Clinical and hybrid weights are fixed constants
//! (see [`crate::composite`] and [`crate::enrichment`]).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ScoringError;
use crate::extractor::ExtractionStrategy;

/// Default bound on a single enrichment service call
pub const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 15_000;

/// Upper bound accepted for the enrichment timeout
const MAX_ENRICHMENT_TIMEOUT_MS: u64 = 120_000;

/// Settings for an [`crate::pipeline::AssessmentProcessor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// How answers are located in the transcript
    pub extraction_strategy: ExtractionStrategy,
    /// Whether baseline assessments attempt multimodal enrichment
    pub multimodal_enabled: bool,
    /// Timeout for the enrichment service call (milliseconds)
    pub enrichment_timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            extraction_strategy: ExtractionStrategy::Positional,
            multimodal_enabled: true,
            enrichment_timeout_ms: DEFAULT_ENRICHMENT_TIMEOUT_MS,
        }
    }
}

impl ScoringConfig {
    /// Load and validate a configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ScoringError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String, ScoringError> {
        serde_json::to_string(self).map_err(ScoringError::JsonError)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.enrichment_timeout_ms == 0 || self.enrichment_timeout_ms > MAX_ENRICHMENT_TIMEOUT_MS {
            return Err(ScoringError::InvalidConfig(format!(
                "enrichment_timeout_ms must be within 1..={MAX_ENRICHMENT_TIMEOUT_MS}, got {}",
                self.enrichment_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_millis(self.enrichment_timeout_ms)
    }
}
