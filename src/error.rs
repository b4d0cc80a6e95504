//! Error types for the Mind Measure scoring core
//!
//! The scoring path itself never fails: parse ambiguity resolves to defaults and
//! enrichment failures degrade to clinical-only scoring. These errors cover the
//! surfaces around it (configuration, JSON encoding, FFI marshalling).

use thiserror::Error;

/// Errors raised outside the scoring path
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid assessment stage transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Failures reported by an external enrichment service.
///
/// Always absorbed by the enrichment adapter; never surfaced to end users.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnrichmentError {
    #[error("enrichment service timed out after {0} ms")]
    Timeout(u64),

    #[error("enrichment service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed enrichment response: {0}")]
    MalformedResponse(String),
}
