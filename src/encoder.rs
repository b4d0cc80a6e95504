//! Assessment result encoder
//!
//! Assembles the persisted `HybridAssessmentResult` from the outputs of each
//! pipeline stage and encodes it to JSON for the storage layer.

use chrono::Utc;
use uuid::Uuid;

use crate::enrichment::HybridScore;
use crate::error::ScoringError;
use crate::extractor::ExtractedResponses;
use crate::types::{
    AssessmentAnalysis, AssessmentProducer, AssessmentType, ClinicalScores,
    HybridAssessmentResult, MindMeasureComposite, ModelVersion, SessionWindow,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Everything the encoder needs from one scored assessment
#[derive(Debug, Clone)]
pub struct ScoredStages<'a> {
    pub assessment_id: Uuid,
    pub assessment_type: AssessmentType,
    pub session: Option<SessionWindow>,
    pub extracted: &'a ExtractedResponses,
    pub clinical_scores: ClinicalScores,
    pub composite: MindMeasureComposite,
    /// Present for baseline assessments only
    pub hybrid: Option<HybridScore>,
}

/// Result encoder
pub struct AssessmentEncoder {
    instance_id: String,
}

impl Default for AssessmentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build the persisted result record
    pub fn build(&self, stages: ScoredStages<'_>) -> HybridAssessmentResult {
        let (final_score, model_version, multimodal_enrichment) = match stages.hybrid {
            Some(hybrid) => (
                hybrid.final_score,
                hybrid.model_version,
                Some(hybrid.enrichment),
            ),
            None => (stages.composite.score, ModelVersion::Clinical, None),
        };

        HybridAssessmentResult {
            assessment_id: stages.assessment_id,
            score: final_score,
            final_score,
            model_version,
            computed_at: Utc::now(),
            producer: AssessmentProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            analysis: AssessmentAnalysis {
                assessment_type: stages.assessment_type,
                session: stages.session,
                clinical_responses: stages.extracted.responses,
                mood_score: stages.extracted.mood_score,
                clinical_scores: stages.clinical_scores,
                mind_measure_composite: stages.composite,
                multimodal_enrichment,
            },
        }
    }

    /// Encode a result to JSON
    pub fn encode_to_json(&self, result: &HybridAssessmentResult) -> Result<String, ScoringError> {
        serde_json::to_string(result).map_err(ScoringError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{blend, EnrichmentOutcome, EnrichmentResponse, StageTracker};
    use crate::types::{ClinicalResponses, MoodScore};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn extracted() -> ExtractedResponses {
        ExtractedResponses {
            responses: ClinicalResponses::new(0, 1, 2, 3),
            mood_score: MoodScore::new(7),
            unanswered: vec![],
        }
    }

    fn clinical() -> (ClinicalScores, MindMeasureComposite) {
        (
            ClinicalScores {
                phq2_total: 1,
                gad2_total: 5,
                mood_scale: 7,
                phq2_positive_screen: false,
                gad2_positive_screen: true,
            },
            MindMeasureComposite {
                score: 60,
                phq2_component: 21,
                gad2_component: 4,
                mood_component: 35,
            },
        )
    }

    #[test]
    fn test_check_in_result() {
        let extracted = extracted();
        let (clinical_scores, composite) = clinical();
        let encoder = AssessmentEncoder::with_instance_id("test-instance".to_string());

        let result = encoder.build(ScoredStages {
            assessment_id: Uuid::new_v4(),
            assessment_type: AssessmentType::CheckIn,
            session: None,
            extracted: &extracted,
            clinical_scores,
            composite,
            hybrid: None,
        });

        assert_eq!(result.score, 60);
        assert_eq!(result.final_score, 60);
        assert_eq!(result.model_version, ModelVersion::Clinical);
        assert_eq!(result.producer.name, PRODUCER_NAME);
        assert_eq!(result.producer.version, ENGINE_VERSION);
        assert_eq!(result.producer.instance_id, "test-instance");
        assert!(result.analysis.multimodal_enrichment.is_none());
    }

    #[test]
    fn test_json_shape() {
        let extracted = extracted();
        let (clinical_scores, composite) = clinical();
        let outcome = EnrichmentOutcome::from_response(
            Ok(EnrichmentResponse {
                audio_score: Some(80.0),
                visual_score: Some(76.0),
                confidence: None,
            }),
            StageTracker::new(),
            Duration::from_millis(900),
        );
        let encoder = AssessmentEncoder::new();

        let result = encoder.build(ScoredStages {
            assessment_id: Uuid::new_v4(),
            assessment_type: AssessmentType::Baseline,
            session: None,
            extracted: &extracted,
            clinical_scores,
            composite,
            hybrid: Some(blend(composite.score, &outcome)),
        });
        let json: serde_json::Value =
            serde_json::from_str(&encoder.encode_to_json(&result).unwrap()).unwrap();

        // 60 * 0.7 + 78 * 0.3 = 65.4
        assert_eq!(json["score"], 65);
        assert_eq!(json["final_score"], 65);
        assert_eq!(json["model_version"], "v1.1-multimodal");
        assert_eq!(json["analysis"]["assessment_type"], "baseline");
        assert_eq!(json["analysis"]["clinical_scores"]["gad2_positive_screen"], true);
        assert_eq!(json["analysis"]["mind_measure_composite"]["score"], 60);
        assert_eq!(json["analysis"]["mood_score"], 7);
        assert_eq!(json["analysis"]["multimodal_enrichment"]["enabled"], true);
        assert_eq!(json["analysis"]["multimodal_enrichment"]["processing_time_ms"], 900);
        assert!(json["analysis"].get("session").is_none());
    }

    #[test]
    fn test_round_trip_preserves_record() {
        let extracted = extracted();
        let (clinical_scores, composite) = clinical();
        let encoder = AssessmentEncoder::new();
        let result = encoder.build(ScoredStages {
            assessment_id: Uuid::new_v4(),
            assessment_type: AssessmentType::CheckIn,
            session: None,
            extracted: &extracted,
            clinical_scores,
            composite,
            hybrid: None,
        });

        let decoded: HybridAssessmentResult =
            serde_json::from_str(&encoder.encode_to_json(&result).unwrap()).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_unique_instance_ids() {
        assert_ne!(
            AssessmentEncoder::new().instance_id(),
            AssessmentEncoder::new().instance_id()
        );
    }
}
