//! Composite fusion
//!
//! Fuses clinical sub-scores into the single 0-100 Mind Measure score:
//! - PHQ-2 and GAD-2 totals inverted onto 0-100 (no symptoms = 100)
//! - Mood mapped linearly onto 10-100
//! - Weighted 25/25/50, clamped, rounded once
//!
//! The displayed components are rounded independently, so their sum may differ
//! from `score` by one or two points. Stored records depend on this.

use crate::types::{ClinicalScores, MindMeasureComposite};

/// Weight of the inverted PHQ-2 score
pub const PHQ2_WEIGHT: f64 = 0.25;
/// Weight of the inverted GAD-2 score
pub const GAD2_WEIGHT: f64 = 0.25;
/// Weight of the scaled mood score
pub const MOOD_WEIGHT: f64 = 0.50;

/// Maximum PHQ-2/GAD-2 total
const MAX_SUBSCALE_TOTAL: f64 = 6.0;

/// Fusion engine for the clinical composite
pub struct CompositeFusion;

impl CompositeFusion {
    /// Fuse clinical scores into the composite
    pub fn fuse(scores: &ClinicalScores) -> MindMeasureComposite {
        let phq2_score = invert_subscale(scores.phq2_total);
        let gad2_score = invert_subscale(scores.gad2_total);
        let mood_score = scale_mood(scores.mood_scale);

        let fused = PHQ2_WEIGHT * phq2_score + GAD2_WEIGHT * gad2_score + MOOD_WEIGHT * mood_score;

        MindMeasureComposite {
            score: round_score(fused),
            phq2_component: round_score(phq2_score * PHQ2_WEIGHT),
            gad2_component: round_score(gad2_score * GAD2_WEIGHT),
            mood_component: round_score(mood_score * MOOD_WEIGHT),
        }
    }
}

/// Map a 0-6 symptom total onto 100-0
fn invert_subscale(total: u8) -> f64 {
    (100.0 - (total as f64 / MAX_SUBSCALE_TOTAL) * 100.0).max(0.0)
}

/// Map a 1-10 mood onto 10-100
fn scale_mood(mood: u8) -> f64 {
    (mood.clamp(1, 10) as f64 / 10.0) * 100.0
}

/// Clamp to 0-100 and round half away from zero
pub(crate) fn round_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}
