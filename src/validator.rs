//! Assessment validation
//!
//! Checks that an assessment carries everything needed for persistence. Zero is
//! a legitimate clinical answer ("not at all") and must never read as missing.

use chrono::{DateTime, Duration, Utc};

use crate::types::{AssessmentState, ValidationDetails, ValidationReport};

/// Validator for assessments awaiting persistence
pub struct AssessmentValidator;

impl AssessmentValidator {
    /// Validate an assessment; never fails, returns the itemized checks
    pub fn validate(state: &AssessmentState) -> ValidationReport {
        let details = ValidationDetails {
            has_transcript: !state.transcript.trim().is_empty(),
            has_duration: session_duration(state).is_some(),
            has_all_questions: state.responses.values().iter().all(|v| is_number(*v)),
            has_mood: is_number(state.mood_score),
        };

        ValidationReport {
            is_valid: details.has_transcript
                && details.has_duration
                && details.has_all_questions
                && details.has_mood,
            details,
        }
    }
}

/// Session length, when both timestamps are present and ordered
pub fn session_duration(state: &AssessmentState) -> Option<Duration> {
    match (state.started_at_ms, state.ended_at_ms) {
        (Some(start), Some(end)) if end > start => {
            end.checked_sub(start).and_then(Duration::try_milliseconds)
        }
        _ => None,
    }
}

/// Convert an epoch-millisecond timestamp to UTC
pub fn timestamp_to_utc(epoch_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(epoch_ms)
}

fn is_number(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}
