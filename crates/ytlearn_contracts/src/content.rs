#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContractViolation, Validate};

pub const QUIZ_MAX_OPTIONS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "reponseCorrecte")]
    pub correct_index: usize,
    #[serde(rename = "explication", default)]
    pub explanation: String,
}

impl Validate for QuizQuestion {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.question.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "quiz_question.question",
                reason: "must not be empty",
            });
        }
        if self.options.len() < 2 || self.options.len() > QUIZ_MAX_OPTIONS {
            return Err(ContractViolation::InvalidValue {
                field: "quiz_question.options",
                reason: "must contain 2..=6 options",
            });
        }
        if self.correct_index >= self.options.len() {
            return Err(ContractViolation::InvalidRange {
                field: "quiz_question.reponseCorrecte",
                min: 0.0,
                max: (self.options.len() - 1) as f64,
                got: self.correct_index as f64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Drops questions that fail validation and returns how many went.
    pub fn retain_valid(&mut self) -> usize {
        let before = self.questions.len();
        self.questions.retain(|q| q.validate().is_ok());
        before - self.questions.len()
    }

    /// Item-by-item conversion of a `{"title", "questions": [...]}` object:
    /// questions that do not deserialize or validate are dropped and counted.
    /// `None` when `value` is not an object.
    pub fn from_value_lossy(value: &Value) -> Option<(Self, usize)> {
        let (title, questions, dropped) = lossy_parts(value, "questions")?;
        let mut quiz = Self { title, questions };
        let dropped = dropped + quiz.retain_valid();
        Some((quiz, dropped))
    }
}

impl Validate for Quiz {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.questions.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "quiz.questions",
                reason: "must not be empty",
            });
        }
        for q in &self.questions {
            q.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Validate for Flashcard {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.front.trim().is_empty() || self.back.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "flashcards.cards",
                reason: "front and back must not be empty",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcards {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Flashcard>,
}

impl Validate for Flashcards {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.cards.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "flashcards.cards",
                reason: "must not be empty",
            });
        }
        for card in &self.cards {
            card.validate()?;
        }
        Ok(())
    }
}

impl Flashcards {
    pub fn retain_valid(&mut self) -> usize {
        let before = self.cards.len();
        self.cards.retain(|c| c.validate().is_ok());
        before - self.cards.len()
    }

    /// Same contract as [`Quiz::from_value_lossy`] over `cards`.
    pub fn from_value_lossy(value: &Value) -> Option<(Self, usize)> {
        let (title, cards, dropped) = lossy_parts(value, "cards")?;
        let mut deck = Self { title, cards };
        let dropped = dropped + deck.retain_valid();
        Some((deck, dropped))
    }
}

fn lossy_parts<T: DeserializeOwned>(
    value: &Value,
    items_key: &str,
) -> Option<(String, Vec<T>, usize)> {
    let map = value.as_object()?;
    let title = map
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let raw_items = map
        .get(items_key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let items: Vec<T> = raw_items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();
    let dropped = raw_items.len() - items.len();
    Some((title, items, dropped))
}

/// Design of an interactive game, produced by the first generation stage and
/// folded into the code-generation prompt of the second.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSpec {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub game_type: String,
    pub mechanics: Vec<String>,
    pub educational_goals: Vec<String>,
    pub difficulty: String,
    pub target_audience: String,
    pub additional_details: String,
    /// Technical constraints appended after stage one; never produced by the model.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub addendum: String,
}

impl Validate for GameSpec {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.title.trim().is_empty() && self.description.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "game_spec",
                reason: "title or description must be present",
            });
        }
        Ok(())
    }
}
