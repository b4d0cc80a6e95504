//! Transcript parsing
//!
//! Turns a captured conversation into ordered, speaker-tagged turns. The plain
//! text form is one turn per line, `agent: ...` or `user: ...`; lines without a
//! recognized tag (continuations, blank lines, system notes) are skipped.

use crate::error::ScoringError;
use crate::types::{ConversationTranscript, Speaker, Turn};

/// Parser for captured conversation transcripts
pub struct TranscriptParser;

impl TranscriptParser {
    /// Parse a newline-delimited, speaker-tagged transcript.
    ///
    /// Never fails: malformed lines are skipped, never rejected.
    pub fn parse(text: &str) -> ConversationTranscript {
        let turns = text.lines().filter_map(parse_line).collect();
        ConversationTranscript { turns }
    }

    /// Parse a transcript supplied as a JSON array of `{role, text}` turns
    pub fn parse_json(json: &str) -> Result<ConversationTranscript, ScoringError> {
        let turns: Vec<Turn> = serde_json::from_str(json)
            .map_err(|e| ScoringError::ParseError(format!("Failed to parse transcript turns: {e}")))?;

        Ok(Self::from_turns(&turns))
    }

    /// Build a transcript from already-structured turns
    pub fn from_turns(turns: &[Turn]) -> ConversationTranscript {
        ConversationTranscript {
            turns: turns
                .iter()
                .map(|t| Turn {
                    speaker: t.speaker,
                    text: normalize(&t.text),
                })
                .collect(),
        }
    }

    /// User utterances in transcript order (trimmed, lower-cased, tag stripped)
    pub fn user_utterances(text: &str) -> Vec<String> {
        Self::parse(text).user_utterances()
    }
}

fn parse_line(line: &str) -> Option<Turn> {
    let (tag, rest) = line.split_once(':')?;
    let speaker = match tag.trim() {
        t if t.eq_ignore_ascii_case("agent") => Speaker::Agent,
        t if t.eq_ignore_ascii_case("user") => Speaker::User,
        _ => return None,
    };

    Some(Turn {
        speaker,
        text: normalize(rest),
    })
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
