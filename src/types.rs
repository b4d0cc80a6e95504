//! Core types for the Mind Measure scoring pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: transcript turns, extracted clinical responses, derived clinical
//! scores, the fused composite, and the persisted assessment result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    User,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Agent => "agent",
            Speaker::User => "user",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(alias = "role")]
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered conversation transcript captured by the voice subsystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTranscript {
    pub turns: Vec<Turn>,
}

impl ConversationTranscript {
    /// User-authored utterances in transcript order
    pub fn user_utterances(&self) -> Vec<String> {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::User)
            .map(|t| t.text.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Answers to the two PHQ-2 and two GAD-2 items, each on the 0-3 frequency scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalResponses {
    pub phq2_q1: u8,
    pub phq2_q2: u8,
    pub gad2_q1: u8,
    pub gad2_q2: u8,
}

impl ClinicalResponses {
    /// Highest frequency code ("nearly every day")
    pub const MAX_ITEM: u8 = 3;

    pub fn new(phq2_q1: u8, phq2_q2: u8, gad2_q1: u8, gad2_q2: u8) -> Self {
        Self {
            phq2_q1,
            phq2_q2,
            gad2_q1,
            gad2_q2,
        }
    }
}

/// Self-reported mood on a 1-10 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodScore(u8);

impl MoodScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Returns `None` outside 1-10
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Validated clinical sub-scores derived from a set of responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalScores {
    /// PHQ-2 total (0-6)
    pub phq2_total: u8,
    /// GAD-2 total (0-6)
    pub gad2_total: u8,
    /// Mood on 1-10; 5 when mood was not captured
    pub mood_scale: u8,
    pub phq2_positive_screen: bool,
    pub gad2_positive_screen: bool,
}

impl ClinicalScores {
    /// True when either short-form screen is at or above its cut-off
    pub fn requires_follow_up(&self) -> bool {
        self.phq2_positive_screen || self.gad2_positive_screen
    }
}

/// Fused 0-100 wellbeing score with its weighted contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMeasureComposite {
    pub score: u8,
    pub phq2_component: u8,
    pub gad2_component: u8,
    pub mood_component: u8,
}

/// Audio and visual wellbeing proxies supplied by the enrichment service (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultimodalFeatureScores {
    pub audio_score: f64,
    pub visual_score: f64,
}

impl MultimodalFeatureScores {
    /// Mean of the two modalities
    pub fn combined(&self) -> f64 {
        (self.audio_score + self.visual_score) / 2.0
    }
}

/// Kind of assessment being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    /// First/reference assessment; eligible for multimodal enrichment
    Baseline,
    /// Recurring check-in; clinical scoring only
    CheckIn,
}

impl AssessmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Baseline => "baseline",
            AssessmentType::CheckIn => "check_in",
        }
    }
}

/// Scoring model tag persisted with every result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVersion {
    #[serde(rename = "v1.0-clinical")]
    Clinical,
    #[serde(rename = "v1.1-multimodal")]
    Multimodal,
}

impl ModelVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVersion::Clinical => "v1.0-clinical",
            ModelVersion::Multimodal => "v1.1-multimodal",
        }
    }
}

/// Breakdown of the multimodal blend (baseline assessments only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultimodalEnrichment {
    pub enabled: bool,
    pub clinical_score: u8,
    pub audio_score: Option<f64>,
    pub visual_score: Option<f64>,
    pub multimodal_score: Option<f64>,
    pub clinical_weight: f64,
    pub multimodal_weight: f64,
    /// Service-reported confidence (0-1), when provided
    pub confidence: Option<f64>,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
}

/// Conversation session bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_sec: i64,
}

/// Analysis payload embedded in the persisted result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAnalysis {
    pub assessment_type: AssessmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionWindow>,
    pub clinical_responses: ClinicalResponses,
    pub mood_score: Option<MoodScore>,
    pub clinical_scores: ClinicalScores,
    pub mind_measure_composite: MindMeasureComposite,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multimodal_enrichment: Option<MultimodalEnrichment>,
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Final persisted assessment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridAssessmentResult {
    pub assessment_id: Uuid,
    pub score: u8,
    pub final_score: u8,
    pub model_version: ModelVersion,
    pub computed_at: DateTime<Utc>,
    pub producer: AssessmentProducer,
    pub analysis: AssessmentAnalysis,
}

/// Loosely typed clinical answers as handed over by upstream collaborators.
///
/// Values may be absent or NaN when upstream parsing was corrupted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseValues {
    pub phq2_q1: Option<f64>,
    pub phq2_q2: Option<f64>,
    pub gad2_q1: Option<f64>,
    pub gad2_q2: Option<f64>,
}

impl ResponseValues {
    pub fn values(&self) -> [Option<f64>; 4] {
        [self.phq2_q1, self.phq2_q2, self.gad2_q1, self.gad2_q2]
    }
}

impl From<ClinicalResponses> for ResponseValues {
    fn from(r: ClinicalResponses) -> Self {
        Self {
            phq2_q1: Some(r.phq2_q1 as f64),
            phq2_q2: Some(r.phq2_q2 as f64),
            gad2_q1: Some(r.gad2_q1 as f64),
            gad2_q2: Some(r.gad2_q2 as f64),
        }
    }
}

/// In-memory bundle checked by the validator before persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentState {
    pub transcript: String,
    pub responses: ResponseValues,
    pub mood_score: Option<f64>,
    /// Session start (epoch milliseconds)
    pub started_at_ms: Option<i64>,
    /// Session end (epoch milliseconds)
    pub ended_at_ms: Option<i64>,
}

/// Itemized validator outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub has_transcript: bool,
    pub has_duration: bool,
    pub has_all_questions: bool,
    pub has_mood: bool,
}

/// Validator result: overall readiness plus the individual checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub details: ValidationDetails,
}
