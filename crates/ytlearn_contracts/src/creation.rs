#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContractViolation, Identifiable, UnixTimeMs, Validate};

pub const METADATA_QUESTIONS_KEY: &str = "questions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Quiz,
    Flashcards,
    Interactive,
}

impl GameType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Flashcards => "flashcards",
            Self::Interactive => "interactive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quiz" => Some(Self::Quiz),
            "flashcards" => Some(Self::Flashcards),
            "interactive" => Some(Self::Interactive),
            _ => None,
        }
    }
}

/// Where a creation came from. `sourceUrl` exists only for YouTube sources and
/// `sourceFileName` only for PDFs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CreationSource {
    Youtube {
        #[serde(rename = "sourceUrl")]
        source_url: String,
    },
    Pdf {
        #[serde(rename = "sourceFileName")]
        source_file_name: String,
    },
}

impl CreationSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Youtube { .. } => "youtube",
            Self::Pdf { .. } => "pdf",
        }
    }
}

/// How `Creation::content` must be interpreted at playback time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Html,
    QuizJson,
    FlashcardsJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creation {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub source: CreationSource,
    pub thumbnail: String,
    pub game_type: GameType,
    pub content: String,
    /// Absent on records written before the format was tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_format: Option<ContentFormat>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub created_at: UnixTimeMs,
    pub updated_at: UnixTimeMs,
}

impl Creation {
    pub fn question_count(&self) -> Option<u64> {
        self.metadata
            .get(METADATA_QUESTIONS_KEY)
            .and_then(Value::as_u64)
    }
}

impl Identifiable for Creation {
    fn record_id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

impl Validate for Creation {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.id.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "creation.id",
                reason: "must not be empty",
            });
        }
        if self.title.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "creation.title",
                reason: "must not be empty",
            });
        }
        if self.updated_at < self.created_at {
            return Err(ContractViolation::InvalidValue {
                field: "creation.updated_at",
                reason: "must be >= created_at",
            });
        }
        let format_matches = match (self.game_type, self.content_format) {
            (_, None) => true,
            (GameType::Interactive, Some(f)) => f == ContentFormat::Html,
            (GameType::Quiz, Some(f)) => f != ContentFormat::FlashcardsJson,
            (GameType::Flashcards, Some(f)) => f != ContentFormat::QuizJson,
        };
        if !format_matches {
            return Err(ContractViolation::InvalidValue {
                field: "creation.content_format",
                reason: "does not match game_type",
            });
        }
        Ok(())
    }
}
