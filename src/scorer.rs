//! Clinical scoring
//!
//! Converts extracted responses into PHQ-2/GAD-2 totals, positive-screen flags,
//! and the mood scale used by the composite.

use crate::types::{ClinicalResponses, ClinicalScores, MoodScore};

/// Standard short-form screening cut-off (PHQ-2 and GAD-2)
pub const POSITIVE_SCREEN_CUTOFF: u8 = 3;

/// Mood used when the user's rating could not be captured
pub const NEUTRAL_MOOD: u8 = 5;

/// Scorer for clinical sub-scales
pub struct ClinicalScorer;

impl ClinicalScorer {
    /// Score a set of responses.
    ///
    /// Items must already be within 0-3; the extractor guarantees this.
    pub fn score(responses: &ClinicalResponses, mood: Option<MoodScore>) -> ClinicalScores {
        debug_assert!(
            [
                responses.phq2_q1,
                responses.phq2_q2,
                responses.gad2_q1,
                responses.gad2_q2
            ]
            .iter()
            .all(|item| *item <= ClinicalResponses::MAX_ITEM),
            "clinical response out of range: {responses:?}"
        );

        let phq2_total = responses.phq2_q1 + responses.phq2_q2;
        let gad2_total = responses.gad2_q1 + responses.gad2_q2;

        ClinicalScores {
            phq2_total,
            gad2_total,
            mood_scale: mood.map(MoodScore::value).unwrap_or(NEUTRAL_MOOD),
            phq2_positive_screen: phq2_total >= POSITIVE_SCREEN_CUTOFF,
            gad2_positive_screen: gad2_total >= POSITIVE_SCREEN_CUTOFF,
        }
    }
}
