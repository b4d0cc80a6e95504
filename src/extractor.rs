//! Clinical response extraction
//!
//! Maps user utterances to PHQ-2/GAD-2 frequency codes and a 1-10 mood score.
//! Extraction never fails: unparseable or missing frequency answers default to
//! 0 ("not at all") and an unparseable mood is left absent. Every question that
//! fell back to a default is listed in [`ExtractedResponses::unanswered`].

use serde::{Deserialize, Serialize};

use crate::types::{ClinicalResponses, ConversationTranscript, MoodScore, Speaker};

/// Frequency phrases in match order, with their PHQ/GAD codes
const FREQUENCY_PHRASES: [(&str, u8); 4] = [
    ("not at all", 0),
    ("several day", 1),
    ("more than half", 2),
    ("nearly every day", 3),
];

/// Number words scanned in ascending order when no digit is present
const NUMBER_WORDS: [&str; 10] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// How answers are located in the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Fixed user-turn positions of the scripted conversation
    #[default]
    Positional,
    /// Locate each question by cue phrases in the agent turns and take the
    /// following user turn as its answer
    Cued,
}

/// Questions of the scripted check-in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    Readiness,
    Phq2Interest,
    Phq2Depressed,
    Gad2Nervous,
    Gad2Worry,
    Mood,
}

impl QuestionId {
    /// Scored questions, in script order
    pub const SCORED: [QuestionId; 5] = [
        QuestionId::Phq2Interest,
        QuestionId::Phq2Depressed,
        QuestionId::Gad2Nervous,
        QuestionId::Gad2Worry,
        QuestionId::Mood,
    ];

    /// User-turn index under the positional protocol
    pub fn position(self) -> usize {
        match self {
            QuestionId::Readiness => 0,
            QuestionId::Phq2Interest => 1,
            QuestionId::Phq2Depressed => 2,
            QuestionId::Gad2Nervous => 3,
            QuestionId::Gad2Worry => 4,
            QuestionId::Mood => 5,
        }
    }

    fn cues(self) -> &'static [&'static str] {
        match self {
            QuestionId::Readiness => &[],
            QuestionId::Phq2Interest => &["interest or pleasure", "little interest"],
            QuestionId::Phq2Depressed => &["depressed", "hopeless"],
            QuestionId::Gad2Nervous => &["nervous", "anxious", "on edge"],
            QuestionId::Gad2Worry => &["worrying", "stop or control"],
            QuestionId::Mood => &["mood", "1 to 10", "one to ten"],
        }
    }

    /// Identify which scored question an agent turn asks, if any.
    ///
    /// Worry is checked before nervousness: the GAD-2 worry item is the one
    /// likely to mention both.
    pub fn identify(agent_text: &str) -> Option<QuestionId> {
        let text = agent_text.to_lowercase();
        [
            QuestionId::Phq2Interest,
            QuestionId::Phq2Depressed,
            QuestionId::Gad2Worry,
            QuestionId::Gad2Nervous,
            QuestionId::Mood,
        ]
        .into_iter()
        .find(|q| q.cues().iter().any(|cue| text.contains(cue)))
    }
}

/// Extractor output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedResponses {
    pub responses: ClinicalResponses,
    pub mood_score: Option<MoodScore>,
    /// Questions whose answer was missing or unparseable
    pub unanswered: Vec<QuestionId>,
}

/// Extracts clinical answers from a conversation
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor {
    strategy: ExtractionStrategy,
}

impl ResponseExtractor {
    pub fn new(strategy: ExtractionStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        self.strategy
    }

    /// Extract answers from a parsed transcript
    pub fn extract(&self, transcript: &ConversationTranscript) -> ExtractedResponses {
        match self.strategy {
            ExtractionStrategy::Positional => {
                Self::extract_positional(&transcript.user_utterances())
            }
            ExtractionStrategy::Cued => Self::extract_cued(transcript),
        }
    }

    /// Positional extraction over the ordered user utterances
    pub fn extract_positional(utterances: &[String]) -> ExtractedResponses {
        collect(|q| utterances.get(q.position()).map(String::as_str))
    }

    fn extract_cued(transcript: &ConversationTranscript) -> ExtractedResponses {
        let mut answers: Vec<(QuestionId, &str)> = Vec::new();
        let mut pending: Option<QuestionId> = None;

        for turn in &transcript.turns {
            match turn.speaker {
                // Agent turns that ask nothing scored leave the open question in place
                Speaker::Agent => {
                    if let Some(question) = QuestionId::identify(&turn.text) {
                        pending = Some(question);
                    }
                }
                Speaker::User => {
                    if let Some(question) = pending.take() {
                        answers.push((question, turn.text.as_str()));
                    }
                }
            }
        }

        // A re-asked question keeps its latest parseable answer
        collect(|q| {
            let mut candidates = answers.iter().rev().filter(|(id, _)| *id == q);
            let latest = candidates.clone().next().map(|(_, text)| *text);
            candidates
                .find(|(_, text)| is_parseable(q, text))
                .map(|(_, text)| *text)
                .or(latest)
        })
    }
}

fn is_parseable(question: QuestionId, text: &str) -> bool {
    match question {
        QuestionId::Mood => parse_mood(text).is_some(),
        _ => parse_frequency(text).is_some(),
    }
}

fn collect<'a>(answer_for: impl Fn(QuestionId) -> Option<&'a str>) -> ExtractedResponses {
    let mut unanswered = Vec::new();

    let mut frequency = |q: QuestionId| match answer_for(q).and_then(parse_frequency) {
        Some(code) => code,
        None => {
            unanswered.push(q);
            0
        }
    };

    let responses = ClinicalResponses {
        phq2_q1: frequency(QuestionId::Phq2Interest),
        phq2_q2: frequency(QuestionId::Phq2Depressed),
        gad2_q1: frequency(QuestionId::Gad2Nervous),
        gad2_q2: frequency(QuestionId::Gad2Worry),
    };

    let mood_score = answer_for(QuestionId::Mood).and_then(parse_mood);
    if mood_score.is_none() {
        unanswered.push(QuestionId::Mood);
    }

    ExtractedResponses {
        responses,
        mood_score,
        unanswered,
    }
}

/// Map a frequency answer to its 0-3 code by phrase containment
pub fn parse_frequency(text: &str) -> Option<u8> {
    let text = text.to_lowercase();
    FREQUENCY_PHRASES
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, code)| *code)
}

/// Parse a 1-10 mood rating from a digit token or an English number word
pub fn parse_mood(text: &str) -> Option<MoodScore> {
    let text = text.to_lowercase();
    let tokens: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();

    // First numeric token in text order; "7 out of 10" is a 7
    let digit = tokens.iter().find_map(|t| match t.as_bytes() {
        b"10" => Some(10),
        [d @ b'1'..=b'9'] => Some(d - b'0'),
        _ => None,
    });
    if let Some(d) = digit {
        return MoodScore::new(d);
    }

    NUMBER_WORDS
        .iter()
        .position(|word| tokens.contains(word))
        .and_then(|i| MoodScore::new(i as u8 + 1))
}
