//! One in-flight question: reveal state, hint progression, guess matching.

use crate::types::QuestionRecord;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Regex, RegexBuilder};

/// Character used for not-yet-revealed positions.
const MASK: char = '.';

#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("no question provided")]
    MissingQuestion,
    #[error("no answer provided")]
    MissingAnswer,
    #[error("invalid answer pattern: {0}")]
    BadPattern(#[from] regex::Error),
}

/// The reveal state of the active question.
///
/// The full revealed text (flavor included) is permuted into a queue of
/// (position, character) pairs at construction; each hint pops one pair and
/// fills in that position of the placeholder.
pub struct Challenge {
    question: String,
    answer_string: String,
    hint_string: String,
    hint_queue: Vec<(usize, char)>,
    placeholder: Vec<char>,
    hints_given: u32,
    matcher: Regex,
}

impl Challenge {
    pub fn new<R: Rng>(record: &QuestionRecord, rng: &mut R) -> Result<Self, ChallengeError> {
        if record.question.trim().is_empty() {
            return Err(ChallengeError::MissingQuestion);
        }
        if record.answer.trim().is_empty() {
            return Err(ChallengeError::MissingAnswer);
        }

        let (answer_string, hint_string) = split_canonical(&record.answer);

        // The canonical answer doubles as the pattern unless the record
        // overrides it. It is compiled unescaped, as the question data
        // expects; reserved characters in an answer are a data problem.
        let pattern = record.regexp.as_deref().unwrap_or(&answer_string);
        let matcher = RegexBuilder::new(pattern).case_insensitive(true).build()?;

        let mut hint_queue: Vec<(usize, char)> = hint_string.chars().enumerate().collect();
        hint_queue.shuffle(rng);

        let placeholder = vec![MASK; hint_queue.len()];

        Ok(Self {
            question: record.question.clone(),
            answer_string,
            hint_string,
            hint_queue,
            placeholder,
            hints_given: 0,
            matcher,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// The canonical matchable answer.
    pub fn answer_string(&self) -> &str {
        &self.answer_string
    }

    /// The full revealed text shown at round end, flavor included.
    pub fn hint_string(&self) -> &str {
        &self.hint_string
    }

    /// The current masked string, always as long as the revealed text.
    pub fn hint_placeholder(&self) -> String {
        self.placeholder.iter().collect()
    }

    pub fn hints_given(&self) -> u32 {
        self.hints_given
    }

    /// How many positions are still masked.
    pub fn hints_remaining(&self) -> usize {
        self.hint_queue.len()
    }

    /// Reveal one more character, in the random order fixed at
    /// construction. No-op once the queue is exhausted.
    pub fn add_hint(&mut self) {
        if let Some((position, character)) = self.hint_queue.pop() {
            self.placeholder[position] = character;
            self.hints_given += 1;
        }
    }

    /// True iff the matcher matches anywhere in `text`.
    pub fn check_guess(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Extract the canonical answer from a `#...#` marked string. The canonical
/// part is the text between the first and last `#`; the revealed text is
/// the whole string with every `#` stripped. Without markers, both are the
/// whole string.
fn split_canonical(answer: &str) -> (String, String) {
    match (answer.find('#'), answer.rfind('#')) {
        (Some(first), Some(last)) if last > first + 1 => (
            answer[first + 1..last].to_string(),
            answer.replace('#', ""),
        ),
        _ => (answer.to_string(), answer.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn record(question: &str, answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: question.into(),
            answer: answer.into(),
            regexp: None,
        }
    }

    #[test]
    fn test_marked_answer_extraction() {
        let challenge = Challenge::new(&record("Q", "#cat#"), &mut rng()).unwrap();

        assert_eq!(challenge.answer_string(), "cat");
        assert_eq!(challenge.hint_string(), "cat");
        assert_eq!(challenge.hint_placeholder(), "...");
    }

    #[test]
    fn test_flavor_text_is_revealed_but_not_matched() {
        let challenge =
            Challenge::new(&record("Q", "The #Rhine# river"), &mut rng()).unwrap();

        assert_eq!(challenge.answer_string(), "Rhine");
        assert_eq!(challenge.hint_string(), "The Rhine river");
        assert_eq!(challenge.hint_placeholder().len(), "The Rhine river".len());
        assert!(challenge.check_guess("it must be the rhine!"));
        assert!(!challenge.check_guess("the river"));
    }

    #[test]
    fn test_unmarked_answer_is_both_canonical_and_revealed() {
        let challenge = Challenge::new(&record("Q", "Bonn"), &mut rng()).unwrap();

        assert_eq!(challenge.answer_string(), "Bonn");
        assert_eq!(challenge.hint_string(), "Bonn");
    }

    #[test]
    fn test_guess_matching_is_case_insensitive_substring() {
        let challenge = Challenge::new(&record("Q", "Bonn"), &mut rng()).unwrap();

        assert!(challenge.check_guess("BONN"));
        assert!(challenge.check_guess("is it bonn?"));
        assert!(!challenge.check_guess("berlin"));
    }

    #[test]
    fn test_explicit_regexp_override_takes_precedence() {
        let mut rec = record("Q", "four");
        rec.regexp = Some(r"^\s*4\s*$".into());
        let challenge = Challenge::new(&rec, &mut rng()).unwrap();

        assert!(challenge.check_guess("4"));
        assert!(!challenge.check_guess("four"));
    }

    #[test]
    fn test_hints_fill_placeholder_at_stable_length() {
        let mut challenge = Challenge::new(&record("Q", "#cat#"), &mut rng()).unwrap();
        let length = challenge.hint_string().chars().count();

        for revealed in 1..=length {
            challenge.add_hint();
            let placeholder = challenge.hint_placeholder();
            assert_eq!(placeholder.chars().count(), length);
            assert_eq!(
                placeholder.chars().filter(|&c| c != '.').count(),
                revealed
            );
            assert_eq!(challenge.hints_given(), revealed as u32);
        }

        assert_eq!(challenge.hint_placeholder(), "cat");
        assert_eq!(challenge.hints_remaining(), 0);

        // Exhausted queue: further hints change nothing.
        challenge.add_hint();
        assert_eq!(challenge.hints_given(), length as u32);
    }

    #[test]
    fn test_hint_positions_are_character_based() {
        let mut challenge = Challenge::new(&record("Q", "über"), &mut rng()).unwrap();
        assert_eq!(challenge.hint_placeholder(), "....");

        for _ in 0..4 {
            challenge.add_hint();
        }
        assert_eq!(challenge.hint_placeholder(), "über");
    }

    #[test]
    fn test_construction_rejects_empty_fields() {
        assert!(matches!(
            Challenge::new(&record("", "a"), &mut rng()),
            Err(ChallengeError::MissingQuestion)
        ));
        assert!(matches!(
            Challenge::new(&record("Q", "  "), &mut rng()),
            Err(ChallengeError::MissingAnswer)
        ));
    }

    #[test]
    fn test_construction_rejects_invalid_override_pattern() {
        let mut rec = record("Q", "fine");
        rec.regexp = Some("(unclosed".into());
        assert!(matches!(
            Challenge::new(&rec, &mut rng()),
            Err(ChallengeError::BadPattern(_))
        ));
    }

    #[test]
    fn test_split_canonical_edge_cases() {
        // A single '#' or an empty marker pair is not a marker.
        assert_eq!(split_canonical("a#b"), ("a#b".into(), "a#b".into()));
        assert_eq!(split_canonical("##"), ("##".into(), "##".into()));
        // Inner hashes stay in the canonical part but not the revealed text.
        assert_eq!(split_canonical("#a#b#"), ("a#b".into(), "ab".into()));
    }
}
