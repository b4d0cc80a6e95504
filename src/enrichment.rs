//! Multimodal enrichment (baseline assessments only)
//!
//! Blends the clinical composite with audio/visual wellbeing proxies computed by
//! an external enrichment service:
//!
//! ```text
//! CAPTURING -> ENRICHING -> { ENRICHED | DEGRADED } -> SCORED
//! CAPTURING -> DEGRADED   (capture failed or was declined)
//! ```
//!
//! Any failure (declined capture, timeout, service error, partial or malformed
//! response) lands in DEGRADED, which scores with the clinical composite alone.
//! Enrichment never blocks an assessment from completing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::composite::round_score;
use crate::error::{EnrichmentError, ScoringError};
use crate::types::{ModelVersion, MultimodalEnrichment, MultimodalFeatureScores};

/// Weight of the clinical composite in a hybrid score
pub const CLINICAL_WEIGHT: f64 = 0.70;
/// Weight of the averaged audio/visual score in a hybrid score
pub const MULTIMODAL_WEIGHT: f64 = 0.30;

/// Processing stage of a baseline assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStage {
    Capturing,
    Enriching,
    Enriched,
    Degraded,
    Scored,
}

impl AssessmentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStage::Capturing => "CAPTURING",
            AssessmentStage::Enriching => "ENRICHING",
            AssessmentStage::Enriched => "ENRICHED",
            AssessmentStage::Degraded => "DEGRADED",
            AssessmentStage::Scored => "SCORED",
        }
    }

    pub fn can_advance_to(self, next: AssessmentStage) -> bool {
        use AssessmentStage::*;
        matches!(
            (self, next),
            (Capturing, Enriching)
                | (Capturing, Degraded)
                | (Enriching, Enriched)
                | (Enriching, Degraded)
                | (Enriched, Scored)
                | (Degraded, Scored)
        )
    }
}

impl fmt::Display for AssessmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the stages an assessment has passed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTracker {
    history: Vec<AssessmentStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    /// Start in CAPTURING
    pub fn new() -> Self {
        Self {
            history: vec![AssessmentStage::Capturing],
        }
    }

    pub fn current(&self) -> AssessmentStage {
        *self.history.last().unwrap_or(&AssessmentStage::Capturing)
    }

    pub fn history(&self) -> &[AssessmentStage] {
        &self.history
    }

    /// Move to `next`, rejecting transitions outside the state machine
    pub fn advance(&mut self, next: AssessmentStage) -> Result<(), ScoringError> {
        let current = self.current();
        if !current.can_advance_to(next) {
            return Err(ScoringError::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(next);
        Ok(())
    }
}

/// Why media capture produced nothing to enrich
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFailure {
    PermissionDenied,
    UnsupportedBrowser,
    Declined,
    DeviceError(String),
}

impl fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureFailure::PermissionDenied => f.write_str("media permissions denied"),
            CaptureFailure::UnsupportedBrowser => f.write_str("media capture not supported"),
            CaptureFailure::Declined => f.write_str("user declined media capture"),
            CaptureFailure::DeviceError(msg) => write!(f, "capture device error: {msg}"),
        }
    }
}

/// Audio and video captured during the baseline conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedMedia {
    pub audio: Vec<u8>,
    pub video_frames: Vec<Vec<u8>>,
    pub duration_ms: u64,
}

/// Result of the capture step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCapture {
    Captured(CapturedMedia),
    Unavailable(CaptureFailure),
}

/// Raw response from the enrichment service
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    pub audio_score: Option<f64>,
    pub visual_score: Option<f64>,
    pub confidence: Option<f64>,
}

impl EnrichmentResponse {
    /// Both modalities, when present and within 0-100
    pub fn feature_scores(&self) -> Result<MultimodalFeatureScores, String> {
        let audio_score = checked_score("audio", self.audio_score)?;
        let visual_score = checked_score("visual", self.visual_score)?;
        Ok(MultimodalFeatureScores {
            audio_score,
            visual_score,
        })
    }
}

fn checked_score(modality: &str, score: Option<f64>) -> Result<f64, String> {
    match score {
        None => Err(format!("{modality} score missing from enrichment response")),
        Some(s) if !(0.0..=100.0).contains(&s) => {
            Err(format!("{modality} score {s} outside 0-100"))
        }
        Some(s) => Ok(s),
    }
}

/// External service computing audio/visual wellbeing proxies
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn enrich(
        &self,
        assessment_id: Uuid,
        media: &CapturedMedia,
    ) -> Result<EnrichmentResponse, EnrichmentError>;
}

/// Outcome of the enrichment attempt for one assessment
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentOutcome {
    pub features: Option<MultimodalFeatureScores>,
    pub confidence: Option<f64>,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
    pub lifecycle: StageTracker,
}

impl EnrichmentOutcome {
    /// Degraded outcome for a failure before or during enrichment
    pub fn degraded(reason: impl Into<String>, lifecycle: StageTracker, elapsed: Duration) -> Self {
        let mut outcome = Self {
            features: None,
            confidence: None,
            processing_time_ms: elapsed.as_millis() as u64,
            warnings: vec![reason.into()],
            lifecycle,
        };
        outcome.transition(AssessmentStage::Degraded);
        outcome
    }

    /// Evaluate a service response (or pre-computed scores) into an outcome
    pub fn from_response(
        response: Result<EnrichmentResponse, EnrichmentError>,
        mut lifecycle: StageTracker,
        elapsed: Duration,
    ) -> Self {
        if lifecycle.current() == AssessmentStage::Capturing {
            advance_logged(&mut lifecycle, AssessmentStage::Enriching);
        }

        let response = match response {
            Ok(response) => response,
            Err(e) => return Self::degraded(e.to_string(), lifecycle, elapsed),
        };

        match response.feature_scores() {
            Ok(features) => {
                let mut outcome = Self {
                    features: Some(features),
                    confidence: response
                        .confidence
                        .filter(|c| c.is_finite())
                        .map(|c| c.clamp(0.0, 1.0)),
                    processing_time_ms: elapsed.as_millis() as u64,
                    warnings: Vec::new(),
                    lifecycle,
                };
                outcome.transition(AssessmentStage::Enriched);
                outcome
            }
            Err(reason) => Self::degraded(reason, lifecycle, elapsed),
        }
    }

    pub fn stage(&self) -> AssessmentStage {
        self.lifecycle.current()
    }

    pub fn is_enriched(&self) -> bool {
        self.features.is_some()
    }

    /// Mark the assessment as scored
    pub fn mark_scored(&mut self) {
        self.transition(AssessmentStage::Scored);
    }

    fn transition(&mut self, next: AssessmentStage) {
        advance_logged(&mut self.lifecycle, next);
    }
}

fn advance_logged(lifecycle: &mut StageTracker, next: AssessmentStage) {
    if let Err(e) = lifecycle.advance(next) {
        tracing::error!(error = %e, "unexpected assessment stage transition");
    }
}

/// Runs the enrichment step with a bounded, single-attempt service call
#[derive(Debug, Clone, Copy)]
pub struct MultimodalEnricher {
    timeout: Duration,
}

impl MultimodalEnricher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Enrich captured media; resolves to DEGRADED on any failure
    pub async fn enrich(
        &self,
        assessment_id: Uuid,
        capture: &MediaCapture,
        service: &dyn EnrichmentService,
    ) -> EnrichmentOutcome {
        let started = Instant::now();
        let lifecycle = StageTracker::new();

        let media = match capture {
            MediaCapture::Captured(media) => media,
            MediaCapture::Unavailable(reason) => {
                let reason = format!("multimodal capture unavailable: {reason}");
                tracing::warn!(%assessment_id, %reason, "multimodal enrichment degraded");
                return EnrichmentOutcome::degraded(reason, lifecycle, started.elapsed());
            }
        };

        tracing::debug!(
            %assessment_id,
            audio_bytes = media.audio.len(),
            video_frames = media.video_frames.len(),
            "requesting multimodal enrichment"
        );

        // Dropping the call on timeout cancels it
        let response = match tokio::time::timeout(self.timeout, service.enrich(assessment_id, media)).await
        {
            Ok(response) => response,
            Err(_) => Err(EnrichmentError::Timeout(self.timeout.as_millis() as u64)),
        };

        let outcome = EnrichmentOutcome::from_response(response, lifecycle, started.elapsed());
        if outcome.is_enriched() {
            tracing::debug!(
                %assessment_id,
                processing_time_ms = outcome.processing_time_ms,
                "multimodal enrichment complete"
            );
        } else {
            tracing::warn!(
                %assessment_id,
                reason = %outcome.warnings.join("; "),
                "multimodal enrichment degraded"
            );
        }
        outcome
    }
}

/// Final score after the optional multimodal blend
#[derive(Debug, Clone, PartialEq)]
pub struct HybridScore {
    pub final_score: u8,
    pub model_version: ModelVersion,
    pub enrichment: MultimodalEnrichment,
}

/// Blend the clinical composite with the enrichment outcome.
///
/// Without both modalities the clinical score passes through unchanged.
pub fn blend(clinical_score: u8, outcome: &EnrichmentOutcome) -> HybridScore {
    match outcome.features {
        Some(features) => {
            let multimodal_score = features.combined();
            let final_score = round_score(
                clinical_score as f64 * CLINICAL_WEIGHT + multimodal_score * MULTIMODAL_WEIGHT,
            );

            HybridScore {
                final_score,
                model_version: ModelVersion::Multimodal,
                enrichment: MultimodalEnrichment {
                    enabled: true,
                    clinical_score,
                    audio_score: Some(features.audio_score),
                    visual_score: Some(features.visual_score),
                    multimodal_score: Some(multimodal_score),
                    clinical_weight: CLINICAL_WEIGHT,
                    multimodal_weight: MULTIMODAL_WEIGHT,
                    confidence: outcome.confidence,
                    processing_time_ms: outcome.processing_time_ms,
                    warnings: outcome.warnings.clone(),
                },
            }
        }
        None => HybridScore {
            final_score: clinical_score,
            model_version: ModelVersion::Clinical,
            enrichment: MultimodalEnrichment {
                enabled: false,
                clinical_score,
                audio_score: None,
                visual_score: None,
                multimodal_score: None,
                clinical_weight: 1.0,
                multimodal_weight: 0.0,
                confidence: None,
                processing_time_ms: outcome.processing_time_ms,
                warnings: outcome.warnings.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedService(Result<EnrichmentResponse, EnrichmentError>);

    #[async_trait]
    impl EnrichmentService for FixedService {
        async fn enrich(
            &self,
            _assessment_id: Uuid,
            _media: &CapturedMedia,
        ) -> Result<EnrichmentResponse, EnrichmentError> {
            self.0.clone()
        }
    }

    struct SlowService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EnrichmentService for SlowService {
        async fn enrich(
            &self,
            _assessment_id: Uuid,
            _media: &CapturedMedia,
        ) -> Result<EnrichmentResponse, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(EnrichmentResponse {
                audio_score: Some(90.0),
                visual_score: Some(90.0),
                confidence: Some(0.9),
            })
        }
    }

    fn response(audio: Option<f64>, visual: Option<f64>) -> EnrichmentResponse {
        EnrichmentResponse {
            audio_score: audio,
            visual_score: visual,
            confidence: Some(0.82),
        }
    }

    fn captured() -> MediaCapture {
        MediaCapture::Captured(CapturedMedia {
            audio: vec![0u8; 64],
            video_frames: vec![vec![0u8; 16]; 3],
            duration_ms: 90_000,
        })
    }

    fn enriched_outcome(audio: f64, visual: f64) -> EnrichmentOutcome {
        EnrichmentOutcome::from_response(
            Ok(response(Some(audio), Some(visual))),
            StageTracker::new(),
            Duration::from_millis(1200),
        )
    }

    #[test]
    fn test_blend_with_both_modalities() {
        let hybrid = blend(82, &enriched_outcome(75.0, 73.0));

        // 82 * 0.7 + 74 * 0.3 = 79.6
        assert_eq!(hybrid.final_score, 80);
        assert_eq!(hybrid.model_version, ModelVersion::Multimodal);
        assert!(hybrid.enrichment.enabled);
        assert_eq!(hybrid.enrichment.multimodal_score, Some(74.0));
        assert_eq!(hybrid.enrichment.clinical_weight, CLINICAL_WEIGHT);
        assert_eq!(hybrid.enrichment.multimodal_weight, MULTIMODAL_WEIGHT);
        assert_eq!(hybrid.enrichment.confidence, Some(0.82));
        assert_eq!(hybrid.enrichment.processing_time_ms, 1200);
        assert!(hybrid.enrichment.warnings.is_empty());
    }

    #[test]
    fn test_blend_bounds() {
        assert_eq!(blend(100, &enriched_outcome(100.0, 100.0)).final_score, 100);
        assert_eq!(blend(0, &enriched_outcome(0.0, 0.0)).final_score, 0);
    }

    #[test]
    fn test_partial_response_falls_back() {
        for (audio, visual) in [(Some(70.0), None), (None, Some(70.0)), (None, None)] {
            let outcome = EnrichmentOutcome::from_response(
                Ok(response(audio, visual)),
                StageTracker::new(),
                Duration::ZERO,
            );
            let hybrid = blend(64, &outcome);

            assert_eq!(outcome.stage(), AssessmentStage::Degraded);
            assert_eq!(hybrid.final_score, 64);
            assert_eq!(hybrid.model_version, ModelVersion::Clinical);
            assert!(!hybrid.enrichment.enabled);
            assert_eq!(hybrid.enrichment.clinical_weight, 1.0);
            assert_eq!(hybrid.enrichment.warnings.len(), 1);
        }
    }

    #[test]
    fn test_out_of_range_scores_are_malformed() {
        let outcome = EnrichmentOutcome::from_response(
            Ok(response(Some(140.0), Some(50.0))),
            StageTracker::new(),
            Duration::ZERO,
        );
        assert!(!outcome.is_enriched());
        assert_eq!(outcome.warnings, vec!["audio score 140 outside 0-100".to_string()]);

        let outcome = EnrichmentOutcome::from_response(
            Ok(response(Some(50.0), Some(f64::NAN))),
            StageTracker::new(),
            Duration::ZERO,
        );
        assert!(!outcome.is_enriched());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let outcome = EnrichmentOutcome::from_response(
            Ok(EnrichmentResponse {
                audio_score: Some(60.0),
                visual_score: Some(60.0),
                confidence: Some(1.7),
            }),
            StageTracker::new(),
            Duration::ZERO,
        );
        assert_eq!(outcome.confidence, Some(1.0));
    }

    #[test]
    fn test_stage_transitions() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.current(), AssessmentStage::Capturing);
        assert!(tracker.advance(AssessmentStage::Scored).is_err());

        tracker.advance(AssessmentStage::Enriching).unwrap();
        tracker.advance(AssessmentStage::Degraded).unwrap();
        assert!(tracker.advance(AssessmentStage::Enriched).is_err());
        tracker.advance(AssessmentStage::Scored).unwrap();

        assert_eq!(
            tracker.history(),
            &[
                AssessmentStage::Capturing,
                AssessmentStage::Enriching,
                AssessmentStage::Degraded,
                AssessmentStage::Scored
            ]
        );
        assert!(tracker.advance(AssessmentStage::Capturing).is_err());
    }

    #[test]
    fn test_from_response_continues_existing_lifecycle() {
        let mut lifecycle = StageTracker::new();
        lifecycle.advance(AssessmentStage::Enriching).unwrap();

        let outcome = EnrichmentOutcome::from_response(
            Ok(response(Some(70.0), Some(70.0))),
            lifecycle,
            Duration::ZERO,
        );
        assert_eq!(
            outcome.lifecycle.history(),
            &[
                AssessmentStage::Capturing,
                AssessmentStage::Enriching,
                AssessmentStage::Enriched
            ]
        );

        let outcome = EnrichmentOutcome::from_response(
            Ok(response(Some(70.0), Some(70.0))),
            StageTracker::new(),
            Duration::ZERO,
        );
        assert_eq!(outcome.lifecycle.history().len(), 3);
    }

    #[tokio::test]
    async fn test_enrich_success() {
        let enricher = MultimodalEnricher::new(Duration::from_secs(5));
        let service = FixedService(Ok(response(Some(75.0), Some(73.0))));

        let mut outcome = enricher.enrich(Uuid::new_v4(), &captured(), &service).await;
        assert_eq!(outcome.stage(), AssessmentStage::Enriched);
        assert_eq!(
            outcome.features,
            Some(MultimodalFeatureScores {
                audio_score: 75.0,
                visual_score: 73.0
            })
        );

        outcome.mark_scored();
        assert_eq!(
            outcome.lifecycle.history(),
            &[
                AssessmentStage::Capturing,
                AssessmentStage::Enriching,
                AssessmentStage::Enriched,
                AssessmentStage::Scored
            ]
        );
    }

    #[tokio::test]
    async fn test_capture_unavailable_skips_service() {
        let enricher = MultimodalEnricher::new(Duration::from_secs(5));
        let service = SlowService {
            calls: AtomicUsize::new(0),
        };

        let capture = MediaCapture::Unavailable(CaptureFailure::PermissionDenied);
        let outcome = enricher.enrich(Uuid::new_v4(), &capture, &service).await;

        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.stage(), AssessmentStage::Degraded);
        assert_eq!(
            outcome.lifecycle.history(),
            &[AssessmentStage::Capturing, AssessmentStage::Degraded]
        );
        assert_eq!(
            outcome.warnings,
            vec!["multimodal capture unavailable: media permissions denied".to_string()]
        );
    }

    #[tokio::test]
    async fn test_service_error_degrades() {
        let enricher = MultimodalEnricher::new(Duration::from_secs(5));
        let service = FixedService(Err(EnrichmentError::Unavailable("503".to_string())));

        let outcome = enricher.enrich(Uuid::new_v4(), &captured(), &service).await;
        assert_eq!(outcome.stage(), AssessmentStage::Degraded);
        assert_eq!(
            outcome.warnings,
            vec!["enrichment service unavailable: 503".to_string()]
        );
        assert_eq!(blend(71, &outcome).final_score, 71);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_after_single_attempt() {
        let enricher = MultimodalEnricher::new(Duration::from_millis(250));
        let service = SlowService {
            calls: AtomicUsize::new(0),
        };

        let outcome = enricher.enrich(Uuid::new_v4(), &captured(), &service).await;

        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.stage(), AssessmentStage::Degraded);
        assert_eq!(
            outcome.warnings,
            vec!["enrichment service timed out after 250 ms".to_string()]
        );
        assert!(outcome.processing_time_ms >= 250);

        let hybrid = blend(58, &outcome);
        assert_eq!(hybrid.final_score, 58);
        assert_eq!(hybrid.model_version, ModelVersion::Clinical);
    }
}
