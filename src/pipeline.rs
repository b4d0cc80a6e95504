//! Pipeline orchestration
//!
//! This module provides the public API for the scoring core. It runs an
//! assessment from raw transcript to persisted result:
//!
//! 1. TranscriptParser - Parse speaker-tagged turns
//! 2. ResponseExtractor - Extract PHQ-2/GAD-2 answers and mood
//! 3. ClinicalScorer - Compute totals and positive screens
//! 4. CompositeFusion - Fuse into the 0-100 composite
//! 5. MultimodalEnricher - Blend audio/visual signal (baselines only)
//! 6. AssessmentValidator - Check readiness for persistence
//! 7. AssessmentEncoder - Assemble the result record

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::composite::CompositeFusion;
use crate::config::ScoringConfig;
use crate::encoder::{AssessmentEncoder, ScoredStages};
use crate::enrichment::{
    blend, EnrichmentOutcome, EnrichmentResponse, EnrichmentService, MediaCapture,
    MultimodalEnricher, StageTracker,
};
use crate::error::ScoringError;
use crate::extractor::{ExtractedResponses, QuestionId, ResponseExtractor};
use crate::scorer::ClinicalScorer;
use crate::transcript::TranscriptParser;
use crate::types::{
    AssessmentState, AssessmentType, ClinicalScores, ConversationTranscript,
    HybridAssessmentResult, MindMeasureComposite, ResponseValues, SessionWindow, Speaker, Turn,
    ValidationReport,
};
use crate::validator::{session_duration, timestamp_to_utc, AssessmentValidator};

/// Transcript as handed over by the conversation subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptInput {
    /// Newline-delimited `role: text` lines
    Text(String),
    /// Structured `{role, text}` turns
    Turns(Vec<Turn>),
}

impl Default for TranscriptInput {
    fn default() -> Self {
        TranscriptInput::Text(String::new())
    }
}

impl TranscriptInput {
    fn parse(&self) -> ConversationTranscript {
        match self {
            TranscriptInput::Text(text) => TranscriptParser::parse(text),
            TranscriptInput::Turns(turns) => TranscriptParser::from_turns(turns),
        }
    }

    /// Raw transcript text, as checked by the validator
    fn raw_text(&self) -> String {
        match self {
            TranscriptInput::Text(text) => text.clone(),
            TranscriptInput::Turns(turns) => turns
                .iter()
                .filter(|t| !t.text.trim().is_empty())
                .map(|t| format!("{}: {}", t.speaker.as_str(), t.text))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One captured conversation awaiting scoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentInput {
    #[serde(default)]
    pub transcript: TranscriptInput,
    /// Session start (epoch milliseconds)
    #[serde(default)]
    pub started_at_ms: Option<i64>,
    /// Session end (epoch milliseconds)
    #[serde(default)]
    pub ended_at_ms: Option<i64>,
}

impl AssessmentInput {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: TranscriptInput::Text(transcript.into()),
            started_at_ms: None,
            ended_at_ms: None,
        }
    }

    pub fn with_session(mut self, started_at_ms: i64, ended_at_ms: i64) -> Self {
        self.started_at_ms = Some(started_at_ms);
        self.ended_at_ms = Some(ended_at_ms);
        self
    }
}

/// Request accepted by the one-shot API: a check-in, or a baseline with
/// feature scores already obtained from the enrichment service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub assessment_type: AssessmentType,
    #[serde(flatten)]
    pub input: AssessmentInput,
    #[serde(default)]
    pub multimodal: Option<EnrichmentResponse>,
}

/// Scored assessment with its persistence readiness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAssessment {
    pub result: HybridAssessmentResult,
    pub validation: ValidationReport,
    /// Questions that fell back to a default answer
    pub unanswered: Vec<QuestionId>,
}

/// Clinical stages shared by every assessment type
struct ClinicalStages {
    transcript: ConversationTranscript,
    extracted: ExtractedResponses,
    scores: ClinicalScores,
    composite: MindMeasureComposite,
}

/// Convert a request JSON to a scored assessment JSON (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let scored_json = assessment_to_json(request_json)?;
/// ```
pub fn assessment_to_json(request_json: String) -> Result<String, ScoringError> {
    let request: AssessmentRequest = serde_json::from_str(&request_json)
        .map_err(|e| ScoringError::ParseError(format!("Failed to parse assessment request: {e}")))?;

    let processor = AssessmentProcessor::new();
    let scored = processor.score_request(&request);
    serde_json::to_string(&scored).map_err(ScoringError::JsonError)
}

/// Validate an assessment state JSON and return the validation report JSON.
pub fn validation_to_json(state_json: String) -> Result<String, ScoringError> {
    let state: AssessmentState = serde_json::from_str(&state_json)
        .map_err(|e| ScoringError::ParseError(format!("Failed to parse assessment state: {e}")))?;

    let report = AssessmentValidator::validate(&state);
    serde_json::to_string(&report).map_err(ScoringError::JsonError)
}

/// Processor holding configuration and the result encoder.
///
/// Holds no per-assessment state; one processor can score many assessments
/// concurrently.
pub struct AssessmentProcessor {
    config: ScoringConfig,
    extractor: ResponseExtractor,
    enricher: MultimodalEnricher,
    encoder: AssessmentEncoder,
}

impl Default for AssessmentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::from_valid_config(ScoringConfig::default())
    }

    /// Create a processor from a validated configuration
    pub fn with_config(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ScoringConfig) -> Self {
        Self {
            extractor: ResponseExtractor::new(config.extraction_strategy),
            enricher: MultimodalEnricher::new(config.enrichment_timeout()),
            encoder: AssessmentEncoder::new(),
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a check-in (clinical only)
    pub fn score_check_in(&self, input: &AssessmentInput) -> ScoredAssessment {
        let assessment_id = Uuid::new_v4();
        let clinical = self.clinical_stages(assessment_id, input);
        self.finish(assessment_id, AssessmentType::CheckIn, input, clinical, None)
    }

    /// Score a baseline, calling the enrichment service for captured media
    pub async fn score_baseline(
        &self,
        input: &AssessmentInput,
        capture: &MediaCapture,
        service: &dyn EnrichmentService,
    ) -> ScoredAssessment {
        let assessment_id = Uuid::new_v4();
        let clinical = self.clinical_stages(assessment_id, input);

        let outcome = if self.config.multimodal_enabled {
            self.enricher.enrich(assessment_id, capture, service).await
        } else {
            disabled_outcome()
        };

        self.finish(
            assessment_id,
            AssessmentType::Baseline,
            input,
            clinical,
            Some(outcome),
        )
    }

    /// Score a baseline whose feature scores were obtained elsewhere.
    ///
    /// `None` means enrichment produced nothing and the clinical score stands.
    pub fn score_baseline_with_features(
        &self,
        input: &AssessmentInput,
        features: Option<EnrichmentResponse>,
    ) -> ScoredAssessment {
        let assessment_id = Uuid::new_v4();
        let clinical = self.clinical_stages(assessment_id, input);

        let outcome = match features {
            _ if !self.config.multimodal_enabled => disabled_outcome(),
            Some(response) => {
                EnrichmentOutcome::from_response(Ok(response), StageTracker::new(), Duration::ZERO)
            }
            None => EnrichmentOutcome::degraded(
                "multimodal scores not provided",
                StageTracker::new(),
                Duration::ZERO,
            ),
        };

        self.finish(
            assessment_id,
            AssessmentType::Baseline,
            input,
            clinical,
            Some(outcome),
        )
    }

    /// Score a one-shot request
    pub fn score_request(&self, request: &AssessmentRequest) -> ScoredAssessment {
        match request.assessment_type {
            AssessmentType::CheckIn => self.score_check_in(&request.input),
            AssessmentType::Baseline => {
                self.score_baseline_with_features(&request.input, request.multimodal)
            }
        }
    }

    /// Encode a scored result to JSON
    pub fn encode_to_json(&self, result: &HybridAssessmentResult) -> Result<String, ScoringError> {
        self.encoder.encode_to_json(result)
    }

    fn clinical_stages(&self, assessment_id: Uuid, input: &AssessmentInput) -> ClinicalStages {
        // Stage 1: Parse transcript
        let transcript = input.transcript.parse();

        // Stage 2: Extract responses
        let extracted = self.extractor.extract(&transcript);

        // Stage 3: Score clinical sub-scales
        let scores = ClinicalScorer::score(&extracted.responses, extracted.mood_score);

        // Stage 4: Fuse into the composite
        let composite = CompositeFusion::fuse(&scores);

        tracing::debug!(
            %assessment_id,
            user_turns = transcript.turns.iter().filter(|t| t.speaker == Speaker::User).count(),
            unanswered = extracted.unanswered.len(),
            phq2_total = scores.phq2_total,
            gad2_total = scores.gad2_total,
            mood_scale = scores.mood_scale,
            composite = composite.score,
            "clinical scoring complete"
        );

        ClinicalStages {
            transcript,
            extracted,
            scores,
            composite,
        }
    }

    fn finish(
        &self,
        assessment_id: Uuid,
        assessment_type: AssessmentType,
        input: &AssessmentInput,
        clinical: ClinicalStages,
        outcome: Option<EnrichmentOutcome>,
    ) -> ScoredAssessment {
        // Stage 5: Blend multimodal signal
        let hybrid = outcome.map(|mut outcome| {
            outcome.mark_scored();
            blend(clinical.composite.score, &outcome)
        });

        // Stage 6: Validate
        let state = AssessmentState {
            transcript: input.transcript.raw_text(),
            responses: ResponseValues::from(clinical.extracted.responses),
            mood_score: clinical.extracted.mood_score.map(|m| m.value() as f64),
            started_at_ms: input.started_at_ms,
            ended_at_ms: input.ended_at_ms,
        };
        let validation = AssessmentValidator::validate(&state);
        if !validation.is_valid {
            tracing::warn!(
                %assessment_id,
                details = ?validation.details,
                parsed_turns = clinical.transcript.turns.len(),
                "assessment incomplete"
            );
        }

        // Stage 7: Assemble the result
        let result = self.encoder.build(ScoredStages {
            assessment_id,
            assessment_type,
            session: session_window(&state),
            extracted: &clinical.extracted,
            clinical_scores: clinical.scores,
            composite: clinical.composite,
            hybrid,
        });

        tracing::debug!(
            %assessment_id,
            assessment_type = assessment_type.as_str(),
            final_score = result.final_score,
            model_version = result.model_version.as_str(),
            "assessment scored"
        );

        ScoredAssessment {
            result,
            validation,
            unanswered: clinical.extracted.unanswered,
        }
    }
}

fn disabled_outcome() -> EnrichmentOutcome {
    EnrichmentOutcome::degraded(
        "multimodal enrichment disabled",
        StageTracker::new(),
        Duration::ZERO,
    )
}

fn session_window(state: &AssessmentState) -> Option<SessionWindow> {
    let duration = session_duration(state)?;
    Some(SessionWindow {
        started_at: timestamp_to_utc(state.started_at_ms?)?,
        ended_at: timestamp_to_utc(state.ended_at_ms?)?,
        duration_sec: duration.num_seconds(),
    })
}
