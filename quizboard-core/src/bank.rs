//! Question and event content, grouped by difficulty tier.
//!
//! Banks are read-only and deterministic: a bank always returns the same
//! ordered records for a tier. Random selection happens in the turn
//! controller, never here.

use crate::board::Tier;
use crate::content;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Identifier of a question, unique within a bank.
pub type QuestionId = u32;

/// Identifier of an event card, unique within a bank.
pub type EventId = u32;

/// Number of options on every question.
pub const OPTION_COUNT: usize = 4;

/// Errors from loading or validating content.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Question {id} has {count} options (expected 4)")]
    OptionCount { id: QuestionId, count: usize },

    #[error("Question {id} repeats the option {option:?}")]
    DuplicateOption { id: QuestionId, option: String },

    #[error("Question {id} has a correct answer that is not one of its options")]
    AnswerNotAnOption { id: QuestionId },

    #[error("Question id {0} is used more than once in tier {1}")]
    DuplicateQuestionId(QuestionId, Tier),

    #[error("Event id {0} is used more than once in tier {1}")]
    DuplicateEventId(EventId, Tier),
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default = "default_question_points")]
    pub points: u32,
}

fn default_question_points() -> u32 {
    1
}

impl Question {
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: [&str; OPTION_COUNT],
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct_answer.into(),
            explanation: None,
            points: default_question_points(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    /// Option by zero-based index.
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Whether a submitted answer matches the correct option.
    ///
    /// Surrounding whitespace is ignored; the comparison is otherwise exact.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim() == self.correct_answer
    }

    /// Check the shape of the question.
    pub fn validate(&self) -> Result<(), BankError> {
        if self.options.len() != OPTION_COUNT {
            return Err(BankError::OptionCount {
                id: self.id,
                count: self.options.len(),
            });
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(BankError::DuplicateOption {
                    id: self.id,
                    option: option.clone(),
                });
            }
        }

        if !seen.contains(self.correct_answer.as_str()) {
            return Err(BankError::AnswerNotAnOption { id: self.id });
        }

        Ok(())
    }
}

/// What an event card does when resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventEffect {
    /// Move the player by the card's value.
    Move,
    /// The player rolls again.
    Reroll,
    /// The player loses their next turn.
    Skip,
}

impl fmt::Display for EventEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventEffect::Move => write!(f, "move"),
            EventEffect::Reroll => write!(f, "reroll"),
            EventEffect::Skip => write!(f, "skip"),
        }
    }
}

/// A chance card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    pub id: EventId,
    pub description: String,
    pub effect: EventEffect,
    /// Signed distance; only meaningful for [`EventEffect::Move`].
    #[serde(default)]
    pub value: i32,
}

impl EventCard {
    pub fn new(id: EventId, description: impl Into<String>, effect: EventEffect, value: i32) -> Self {
        Self {
            id,
            description: description.into(),
            effect,
            value,
        }
    }
}

/// Read-only access to content for each tier.
pub trait QuestionBank: Send + Sync {
    fn questions_for(&self, tier: Tier) -> &[Question];
    fn events_for(&self, tier: Tier) -> &[EventCard];
}

/// Questions and events for one tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierContent {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub events: Vec<EventCard>,
}

impl TierContent {
    /// Validate every question and check ids are unique.
    pub fn validate(&self, tier: Tier) -> Result<(), BankError> {
        let mut question_ids = HashSet::new();
        for question in &self.questions {
            question.validate()?;
            if !question_ids.insert(question.id) {
                return Err(BankError::DuplicateQuestionId(question.id, tier));
            }
        }

        let mut event_ids = HashSet::new();
        for event in &self.events {
            if !event_ids.insert(event.id) {
                return Err(BankError::DuplicateEventId(event.id, tier));
            }
        }

        Ok(())
    }
}

/// The content shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBank;

impl QuestionBank for DefaultBank {
    fn questions_for(&self, tier: Tier) -> &[Question] {
        match tier {
            Tier::Beginner => &content::BEGINNER.questions,
            Tier::Intermediate => &content::INTERMEDIATE.questions,
            Tier::Expert => &content::EXPERT.questions,
        }
    }

    fn events_for(&self, tier: Tier) -> &[EventCard] {
        match tier {
            Tier::Beginner => &content::BEGINNER.events,
            Tier::Intermediate => &content::INTERMEDIATE.events,
            Tier::Expert => &content::EXPERT.events,
        }
    }
}

/// Content loaded from a JSON document keyed by tier name.
///
/// ```json
/// { "beginner": { "questions": [...], "events": [...] } }
/// ```
///
/// Tiers missing from the document have no content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonBank {
    tiers: HashMap<Tier, TierContent>,
}

impl JsonBank {
    /// Build a bank from per-tier content, validating all of it.
    pub fn from_tiers(tiers: HashMap<Tier, TierContent>) -> Result<Self, BankError> {
        for (tier, content) in &tiers {
            content.validate(*tier)?;
        }
        Ok(Self { tiers })
    }

    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let tiers: HashMap<Tier, TierContent> = serde_json::from_str(json)?;
        Self::from_tiers(tiers)
    }

    /// Load a bank from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }
}

impl QuestionBank for JsonBank {
    fn questions_for(&self, tier: Tier) -> &[Question] {
        self.tiers
            .get(&tier)
            .map(|c| c.questions.as_slice())
            .unwrap_or(&[])
    }

    fn events_for(&self, tier: Tier) -> &[EventCard] {
        self.tiers
            .get(&tier)
            .map(|c| c.events.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question::new(1, "2 + 2?", ["3", "4", "5", "22"], "4")
    }

    #[test]
    fn test_question_validation() {
        assert!(sample_question().validate().is_ok());

        let mut wrong_count = sample_question();
        wrong_count.options.pop();
        assert!(matches!(
            wrong_count.validate(),
            Err(BankError::OptionCount { id: 1, count: 3 })
        ));

        let duplicate = Question::new(2, "?", ["a", "b", "a", "c"], "a");
        assert!(matches!(
            duplicate.validate(),
            Err(BankError::DuplicateOption { id: 2, .. })
        ));

        let missing = Question::new(3, "?", ["a", "b", "c", "d"], "e");
        assert!(matches!(
            missing.validate(),
            Err(BankError::AnswerNotAnOption { id: 3 })
        ));
    }

    #[test]
    fn test_answer_matching() {
        let question = sample_question();
        assert!(question.is_correct("4"));
        assert!(question.is_correct("  4 "));
        assert!(!question.is_correct("5"));
        assert_eq!(question.option(1), Some("4"));
        assert_eq!(question.option(4), None);
    }

    #[test]
    fn test_default_bank_is_valid() {
        for tier in Tier::ALL {
            let content = TierContent {
                questions: DefaultBank.questions_for(tier).to_vec(),
                events: DefaultBank.events_for(tier).to_vec(),
            };
            content.validate(tier).unwrap();
            assert!(!content.questions.is_empty(), "{tier} has no questions");
            assert!(!content.events.is_empty(), "{tier} has no events");
        }
    }

    #[test]
    fn test_default_bank_is_deterministic() {
        let first: Vec<_> = DefaultBank
            .questions_for(Tier::Expert)
            .iter()
            .map(|q| q.id)
            .collect();
        let second: Vec<_> = DefaultBank
            .questions_for(Tier::Expert)
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_bank() {
        let json = r#"{
            "beginner": {
                "questions": [
                    {
                        "id": 1,
                        "text": "Largest planet?",
                        "options": ["Mars", "Jupiter", "Venus", "Earth"],
                        "correct_answer": "Jupiter"
                    }
                ],
                "events": [
                    { "id": 9, "description": "Tailwind", "effect": "move", "value": 2 }
                ]
            }
        }"#;

        let bank = JsonBank::from_json(json).unwrap();
        assert_eq!(bank.questions_for(Tier::Beginner).len(), 1);
        assert_eq!(bank.questions_for(Tier::Beginner)[0].points, 1);
        assert_eq!(bank.events_for(Tier::Beginner)[0].effect, EventEffect::Move);
        assert!(bank.questions_for(Tier::Expert).is_empty());
    }

    #[test]
    fn test_json_bank_rejects_duplicate_ids() {
        let json = r#"{
            "expert": {
                "questions": [
                    { "id": 1, "text": "a", "options": ["1","2","3","4"], "correct_answer": "1" },
                    { "id": 1, "text": "b", "options": ["1","2","3","4"], "correct_answer": "2" }
                ]
            }
        }"#;

        assert!(matches!(
            JsonBank::from_json(json),
            Err(BankError::DuplicateQuestionId(1, Tier::Expert))
        ));
    }

    #[tokio::test]
    async fn test_json_bank_load_from_file() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("bank.json");
        let mut tiers = HashMap::new();
        tiers.insert(
            Tier::Intermediate,
            TierContent {
                questions: vec![sample_question()],
                events: vec![EventCard::new(1, "Nap", EventEffect::Skip, 0)],
            },
        );
        std::fs::write(&path, serde_json::to_string(&tiers).unwrap()).unwrap();

        let bank = JsonBank::load(&path).await.expect("Load should succeed");
        assert_eq!(bank.questions_for(Tier::Intermediate), &[sample_question()]);
    }
}
