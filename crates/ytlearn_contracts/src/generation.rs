#![forbid(unsafe_code)]

use crate::creation::GameType;
use crate::{ContractViolation, Validate};

pub const MIN_ITEM_COUNT: u8 = 1;
pub const MAX_ITEM_COUNT: u8 = 50;
pub const DEFAULT_ITEM_COUNT: u8 = 10;

/// Raw source handed to a generation request, before URL/PDF checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSource {
    YoutubeUrl(String),
    Pdf { file_name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub source: GenerationSource,
    pub game_type: GameType,
    pub difficulty: String,
    /// Questions for a quiz, cards for flashcards; ignored for interactive games.
    pub item_count: u8,
    pub instructions: Option<String>,
    pub title: Option<String>,
}

impl GenerationOptions {
    pub fn v1(source: GenerationSource, game_type: GameType) -> Self {
        Self {
            source,
            game_type,
            difficulty: "moyen".to_string(),
            item_count: DEFAULT_ITEM_COUNT,
            instructions: None,
            title: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = difficulty.into();
        self
    }

    pub fn with_item_count(mut self, item_count: u8) -> Self {
        self.item_count = item_count;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Trimmed instructions, `None` when blank.
    pub fn instructions_text(&self) -> Option<&str> {
        self.instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Validate for GenerationOptions {
    fn validate(&self) -> Result<(), ContractViolation> {
        match &self.source {
            GenerationSource::YoutubeUrl(url) if url.trim().is_empty() => {
                return Err(ContractViolation::InvalidValue {
                    field: "generation_options.source",
                    reason: "missing YouTube URL",
                });
            }
            GenerationSource::Pdf { bytes, .. } if bytes.is_empty() => {
                return Err(ContractViolation::InvalidValue {
                    field: "generation_options.source",
                    reason: "missing PDF file",
                });
            }
            _ => {}
        }
        if self.difficulty.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "generation_options.difficulty",
                reason: "must not be empty",
            });
        }
        if self.game_type != GameType::Interactive
            && !(MIN_ITEM_COUNT..=MAX_ITEM_COUNT).contains(&self.item_count)
        {
            return Err(ContractViolation::InvalidRange {
                field: "generation_options.item_count",
                min: f64::from(MIN_ITEM_COUNT),
                max: f64::from(MAX_ITEM_COUNT),
                got: f64::from(self.item_count),
            });
        }
        Ok(())
    }
}

/// Sub-steps of the `generating` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    GameSpec,
    GameCode,
    StructuredContent,
}

impl GenerationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameSpec => "game_spec",
            Self::GameCode => "game_code",
            Self::StructuredContent => "structured_content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStep {
    Idle,
    Initializing,
    Analyzing,
    Generating(GenerationStage),
    Saving,
    Done,
    Error,
}

impl GenerationStep {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Short French label shown next to the progress bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "En attente",
            Self::Initializing => "Initialisation",
            Self::Analyzing => "Analyse du contenu",
            Self::Generating(GenerationStage::GameSpec) => "Conception du jeu",
            Self::Generating(GenerationStage::GameCode) => "Génération du code du jeu",
            Self::Generating(GenerationStage::StructuredContent) => "Génération du contenu",
            Self::Saving => "Sauvegarde",
            Self::Done => "Terminé",
            Self::Error => "Erreur",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationProgress {
    pub step: GenerationStep,
    pub percent: u8,
    pub label: String,
    pub error: Option<String>,
}

impl GenerationProgress {
    pub fn idle() -> Self {
        Self {
            step: GenerationStep::Idle,
            percent: 0,
            label: GenerationStep::Idle.label().to_string(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_generation_01_blank_sources_fail_before_any_call() {
        let yt = GenerationOptions::v1(GenerationSource::YoutubeUrl("  ".to_string()), GameType::Quiz);
        assert!(yt.validate().is_err());
        let pdf = GenerationOptions::v1(
            GenerationSource::Pdf {
                file_name: "a.pdf".to_string(),
                bytes: vec![],
            },
            GameType::Flashcards,
        );
        assert!(pdf.validate().is_err());
    }

    #[test]
    fn at_generation_02_item_count_bounds_skip_interactive() {
        let src = GenerationSource::YoutubeUrl("https://youtu.be/x".to_string());
        let quiz = GenerationOptions::v1(src.clone(), GameType::Quiz).with_item_count(0);
        assert!(matches!(
            quiz.validate(),
            Err(ContractViolation::InvalidRange { .. })
        ));
        let game = GenerationOptions::v1(src, GameType::Interactive).with_item_count(0);
        assert!(game.validate().is_ok());
    }

    #[test]
    fn at_generation_03_blank_instructions_are_absent() {
        let opts = GenerationOptions::v1(
            GenerationSource::YoutubeUrl("u".to_string()),
            GameType::Quiz,
        )
        .with_instructions("   ");
        assert_eq!(opts.instructions_text(), None);
    }
}
