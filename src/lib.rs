//! Mind Measure - Scoring core for conversational wellbeing assessments
//!
//! Turns a captured check-in conversation into a validated clinical score
//! through a deterministic pipeline: transcript parsing → response extraction
//! → PHQ-2/GAD-2 scoring → composite fusion → optional multimodal blend →
//! validation and encoding.
//!
//! ## Modules
//!
//! - **Clinical pipeline**: Score any assessment from its transcript alone
//! - **Enrichment**: Blend audio/visual wellbeing proxies into baseline scores,
//!   degrading to clinical-only scoring on any failure

pub mod composite;
pub mod config;
pub mod encoder;
pub mod enrichment;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod scorer;
pub mod transcript;
pub mod types;
pub mod validator;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ScoringConfig;
pub use error::{EnrichmentError, ScoringError};
pub use pipeline::{
    assessment_to_json, validation_to_json, AssessmentInput, AssessmentProcessor,
    AssessmentRequest, ScoredAssessment, TranscriptInput,
};

// Stage exports
pub use composite::CompositeFusion;
pub use encoder::AssessmentEncoder;
pub use enrichment::{
    blend, EnrichmentResponse, EnrichmentService, MediaCapture, MultimodalEnricher,
};
pub use extractor::{ExtractionStrategy, QuestionId, ResponseExtractor};
pub use scorer::ClinicalScorer;
pub use transcript::TranscriptParser;
pub use validator::AssessmentValidator;

/// Scoring engine version embedded in every result
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name embedded in every result
pub const PRODUCER_NAME: &str = "mind-measure-core";
