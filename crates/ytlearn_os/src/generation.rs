#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::env;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, error, info, warn};
use ytlearn_contracts::content::{Flashcards, GameSpec, Quiz};
use ytlearn_contracts::creation::{ContentFormat, Creation, GameType, METADATA_QUESTIONS_KEY};
use ytlearn_contracts::generation::{
    GenerationOptions, GenerationProgress, GenerationStage, GenerationStep,
};
use ytlearn_contracts::{ContractViolation, UnixTimeMs, Validate};
use ytlearn_engines::ai_client::{AiError, GenerationParams, GenerativeClient, MediaInput};
use ytlearn_engines::normalizer::{extract_html_document, parse_json_keyed};
use ytlearn_engines::prompts::{self, PromptParams};
use ytlearn_engines::thumbnail::placeholder_thumbnail;
use ytlearn_storage::CreationRepository;

use crate::source::{ResolvedSource, SourceError};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const METADATA_MODEL_KEY: &str = "model";

const PERCENT_INITIALIZING: u8 = 5;
const PERCENT_ANALYZING: u8 = 15;
const PERCENT_SPEC: u8 = 30;
const PERCENT_STRUCTURED: u8 = 40;
const PERCENT_CODE: u8 = 60;
const PERCENT_SAVING: u8 = 90;
const PERCENT_DONE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    /// Game spec, quiz and flashcards requests.
    pub structured: StageParams,
    pub code: StageParams,
}

impl GenerationConfig {
    pub fn mvp_v1() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            structured: StageParams {
                temperature: 0.7,
                max_output_tokens: 8_192,
            },
            code: StageParams {
                temperature: 0.7,
                max_output_tokens: 32_768,
            },
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::mvp_v1();
        if let Some(model) = env::var("YTLEARN_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
        {
            config.model = model;
        }
        config
    }

    pub fn params_for(&self, stage: GenerationStage) -> GenerationParams {
        let stage_params = match stage {
            GenerationStage::GameCode => self.code,
            GenerationStage::GameSpec | GenerationStage::StructuredContent => self.structured,
        };
        GenerationParams {
            model: self.model.clone(),
            temperature: stage_params.temperature,
            max_output_tokens: stage_params.max_output_tokens,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("La génération a échoué : {0}")]
    Transport(#[from] AiError),
    #[error("La génération a échoué : réponse inexploitable ({})", .stage.as_str())]
    UnusableOutput { stage: GenerationStage },
    #[error("La création n'a pas pu être enregistrée.")]
    PersistRejected,
}

impl From<ContractViolation> for GenerationError {
    fn from(value: ContractViolation) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<SourceError> for GenerationError {
    fn from(value: SourceError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

/// What a successful generation produced, before it becomes a `Creation`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Artifact {
    title: String,
    content: String,
    format: ContentFormat,
    item_count: Option<usize>,
}

struct ProgressTracker<'a, F: FnMut(&GenerationProgress)> {
    current: GenerationProgress,
    last: &'a Mutex<GenerationProgress>,
    on_progress: F,
}

impl<'a, F: FnMut(&GenerationProgress)> ProgressTracker<'a, F> {
    fn new(last: &'a Mutex<GenerationProgress>, on_progress: F) -> Self {
        Self {
            current: GenerationProgress::idle(),
            last,
            on_progress,
        }
    }

    /// Percent never goes backwards.
    fn advance(&mut self, step: GenerationStep, percent: u8) {
        self.current = GenerationProgress {
            step,
            percent: percent.clamp(self.current.percent, PERCENT_DONE),
            label: step.label().to_string(),
            error: None,
        };
        self.publish();
    }

    fn fail(&mut self, message: String) {
        self.current = GenerationProgress {
            step: GenerationStep::Error,
            percent: self.current.percent,
            label: GenerationStep::Error.label().to_string(),
            error: Some(message),
        };
        self.publish();
    }

    fn publish(&mut self) {
        debug!(
            step = ?self.current.step,
            percent = self.current.percent,
            "generation progress"
        );
        if let Ok(mut last) = self.last.lock() {
            *last = self.current.clone();
        }
        (self.on_progress)(&self.current);
    }
}

/// Validates the request, runs one structured stage (quiz, flashcards) or two
/// dependent stages (game spec, then game code), and persists a single
/// `Creation`. Nothing is written unless every stage succeeds.
pub struct GenerationWiring<C, R>
where
    C: GenerativeClient,
    R: CreationRepository,
{
    config: GenerationConfig,
    client: C,
    repository: R,
    last_progress: Mutex<GenerationProgress>,
}

impl<C, R> GenerationWiring<C, R>
where
    C: GenerativeClient,
    R: CreationRepository,
{
    pub fn new(config: GenerationConfig, client: C, repository: R) -> Result<Self, ContractViolation> {
        if config.model.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "generation_config.model",
                reason: "must not be empty",
            });
        }
        for stage in [config.structured, config.code] {
            if !stage.temperature.is_finite() {
                return Err(ContractViolation::NotFinite {
                    field: "generation_config.temperature",
                });
            }
            if stage.max_output_tokens == 0 {
                return Err(ContractViolation::InvalidValue {
                    field: "generation_config.max_output_tokens",
                    reason: "must be > 0",
                });
            }
        }
        Ok(Self {
            config,
            client,
            repository,
            last_progress: Mutex::new(GenerationProgress::idle()),
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Progress of the most recent run.
    pub fn progress(&self) -> GenerationProgress {
        self.last_progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|_| GenerationProgress::idle())
    }

    pub fn generate(&self, options: &GenerationOptions) -> Result<Creation, GenerationError> {
        self.generate_with_progress(options, |_| {})
    }

    pub fn generate_with_progress<F>(
        &self,
        options: &GenerationOptions,
        on_progress: F,
    ) -> Result<Creation, GenerationError>
    where
        F: FnMut(&GenerationProgress),
    {
        let mut tracker = ProgressTracker::new(&self.last_progress, on_progress);
        tracker.advance(GenerationStep::Initializing, PERCENT_INITIALIZING);
        match self.run(options, &mut tracker) {
            Ok(creation) => {
                tracker.advance(GenerationStep::Done, PERCENT_DONE);
                info!(id = %creation.id, game_type = creation.game_type.as_str(), "creation saved");
                Ok(creation)
            }
            Err(err) => {
                error!(error = %err, "generation failed");
                tracker.fail(err.to_string());
                Err(err)
            }
        }
    }

    fn run<F: FnMut(&GenerationProgress)>(
        &self,
        options: &GenerationOptions,
        tracker: &mut ProgressTracker<'_, F>,
    ) -> Result<Creation, GenerationError> {
        options.validate()?;
        let source = ResolvedSource::resolve(&options.source)?;
        let params = PromptParams {
            difficulty: options.difficulty.trim(),
            item_count: options.item_count,
            instructions: options.instructions_text(),
        };

        tracker.advance(GenerationStep::Analyzing, PERCENT_ANALYZING);
        let artifact = match options.game_type {
            GameType::Interactive => self.generate_game(&source, params, tracker)?,
            GameType::Quiz => self.generate_quiz(&source, params, tracker)?,
            GameType::Flashcards => self.generate_flashcards(&source, params, tracker)?,
        };

        tracker.advance(GenerationStep::Saving, PERCENT_SAVING);
        let creation = self.build_creation(options, &source, artifact);
        creation.validate()?;
        if !self.repository.add(creation.clone()) {
            return Err(GenerationError::PersistRejected);
        }
        Ok(creation)
    }

    fn call(
        &self,
        stage: GenerationStage,
        prompt: &str,
        media: &MediaInput<'_>,
    ) -> Result<String, GenerationError> {
        debug!(stage = stage.as_str(), prompt_len = prompt.len(), "model call");
        Ok(self
            .client
            .generate(prompt, media, &self.config.params_for(stage))?)
    }

    fn generate_game<F: FnMut(&GenerationProgress)>(
        &self,
        source: &ResolvedSource<'_>,
        params: PromptParams<'_>,
        tracker: &mut ProgressTracker<'_, F>,
    ) -> Result<Artifact, GenerationError> {
        let stage = GenerationStage::GameSpec;
        tracker.advance(GenerationStep::Generating(stage), PERCENT_SPEC);
        let prompt = if source.is_video() {
            prompts::game_spec_from_video_prompt(params)
        } else {
            prompts::game_spec_from_pdf_prompt(params)
        };
        let raw = self.call(stage, &prompt, &source.media())?;
        let spec = parse_json_keyed(&raw, "spec")
            .into_typed::<GameSpec>()
            .filter(|spec| spec.validate().is_ok())
            .ok_or(GenerationError::UnusableOutput { stage })?;

        let stage = GenerationStage::GameCode;
        tracker.advance(GenerationStep::Generating(stage), PERCENT_CODE);
        let raw = self.call(
            stage,
            &prompts::game_code_from_spec_prompt(&spec),
            &MediaInput::None,
        )?;
        let html = extract_html_document(&raw).ok_or(GenerationError::UnusableOutput { stage })?;
        Ok(Artifact {
            title: spec.title,
            content: html,
            format: ContentFormat::Html,
            item_count: None,
        })
    }

    fn generate_quiz<F: FnMut(&GenerationProgress)>(
        &self,
        source: &ResolvedSource<'_>,
        params: PromptParams<'_>,
        tracker: &mut ProgressTracker<'_, F>,
    ) -> Result<Artifact, GenerationError> {
        let stage = GenerationStage::StructuredContent;
        tracker.advance(GenerationStep::Generating(stage), PERCENT_STRUCTURED);
        let prompt = if source.is_video() {
            prompts::quiz_from_video_prompt(params)
        } else {
            prompts::quiz_from_pdf_prompt(params)
        };
        let raw = self.call(stage, &prompt, &source.media())?;
        let (quiz, dropped) = parse_json_keyed(&raw, "quiz")
            .as_value()
            .and_then(Quiz::from_value_lossy)
            .ok_or(GenerationError::UnusableOutput { stage })?;
        if dropped > 0 {
            warn!(dropped, "invalid quiz questions dropped");
        }
        quiz.validate()
            .map_err(|_| GenerationError::UnusableOutput { stage })?;
        let content =
            serde_json::to_string(&quiz).map_err(|_| GenerationError::UnusableOutput { stage })?;
        Ok(Artifact {
            item_count: Some(quiz.questions.len()),
            title: quiz.title,
            content,
            format: ContentFormat::QuizJson,
        })
    }

    fn generate_flashcards<F: FnMut(&GenerationProgress)>(
        &self,
        source: &ResolvedSource<'_>,
        params: PromptParams<'_>,
        tracker: &mut ProgressTracker<'_, F>,
    ) -> Result<Artifact, GenerationError> {
        let stage = GenerationStage::StructuredContent;
        tracker.advance(GenerationStep::Generating(stage), PERCENT_STRUCTURED);
        let prompt = if source.is_video() {
            prompts::flashcards_from_video_prompt(params)
        } else {
            prompts::flashcards_from_pdf_prompt(params)
        };
        let raw = self.call(stage, &prompt, &source.media())?;
        let (deck, dropped) = parse_json_keyed(&raw, "flashcards")
            .as_value()
            .and_then(Flashcards::from_value_lossy)
            .ok_or(GenerationError::UnusableOutput { stage })?;
        if dropped > 0 {
            warn!(dropped, "incomplete flashcards dropped");
        }
        deck.validate()
            .map_err(|_| GenerationError::UnusableOutput { stage })?;
        let content =
            serde_json::to_string(&deck).map_err(|_| GenerationError::UnusableOutput { stage })?;
        Ok(Artifact {
            item_count: Some(deck.cards.len()),
            title: deck.title,
            content,
            format: ContentFormat::FlashcardsJson,
        })
    }

    fn build_creation(
        &self,
        options: &GenerationOptions,
        source: &ResolvedSource<'_>,
        artifact: Artifact,
    ) -> Creation {
        let title = [options.title.as_deref(), Some(artifact.title.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| source.fallback_title());

        let mut metadata = BTreeMap::new();
        if let Some(count) = artifact.item_count {
            metadata.insert(METADATA_QUESTIONS_KEY.to_string(), Value::from(count));
        }
        metadata.insert(
            METADATA_MODEL_KEY.to_string(),
            Value::from(self.config.model.clone()),
        );

        let now = now_unix_ms();
        Creation {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            source: source.creation_source(),
            thumbnail: placeholder_thumbnail(options.game_type),
            game_type: options.game_type,
            content: artifact.content,
            content_format: Some(artifact.format),
            difficulty: options.difficulty.trim().to_string(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

fn now_unix_ms() -> UnixTimeMs {
    UnixTimeMs(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(1)
            .max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use ytlearn_contracts::creation::CreationSource;
    use ytlearn_contracts::generation::GenerationSource;
    use ytlearn_engines::render::render_quiz_value;
    use ytlearn_storage::{KvStore, LocalCreationRepo, MemoryKvBackend};

    const VIDEO: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SeenMedia {
        None,
        Video(String),
        Pdf(usize),
    }

    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, AiError>>>,
        calls: Mutex<Vec<(String, SeenMedia, GenerationParams)>>,
    }

    impl ScriptedClient {
        fn replying(replies: Vec<Result<String, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, SeenMedia, GenerationParams)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GenerativeClient for ScriptedClient {
        fn generate(
            &self,
            prompt: &str,
            media: &MediaInput<'_>,
            params: &GenerationParams,
        ) -> Result<String, AiError> {
            let seen = match media {
                MediaInput::None => SeenMedia::None,
                MediaInput::Video { url } => SeenMedia::Video((*url).to_string()),
                MediaInput::Pdf { bytes } => SeenMedia::Pdf(bytes.len()),
            };
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), seen, params.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AiError::EmptyResponse))
        }
    }

    fn repo() -> LocalCreationRepo<MemoryKvBackend> {
        LocalCreationRepo::new(KvStore::new(MemoryKvBackend::new(), "test_"), 10)
    }

    fn wiring<'a>(
        client: &'a ScriptedClient,
        repo: &'a LocalCreationRepo<MemoryKvBackend>,
    ) -> GenerationWiring<&'a ScriptedClient, &'a LocalCreationRepo<MemoryKvBackend>> {
        GenerationWiring::new(GenerationConfig::mvp_v1(), client, repo).unwrap()
    }

    fn video(game_type: GameType) -> GenerationOptions {
        GenerationOptions::v1(GenerationSource::YoutubeUrl(VIDEO.to_string()), game_type)
    }

    fn pdf(game_type: GameType) -> GenerationOptions {
        GenerationOptions::v1(
            GenerationSource::Pdf {
                file_name: "Biologie cellulaire.pdf".to_string(),
                bytes: b"%PDF-1.7\n%fake".to_vec(),
            },
            game_type,
        )
    }

    const SPEC_REPLY: &str = r#"```json
{"spec": {"title": "Chasse aux cellules", "description": "Associer organites et fonctions",
"type": "association", "mechanics": ["glisser-déposer"], "educationalGoals": ["organites"],
"difficulty": "moyen", "targetAudience": "lycée", "additionalDetails": "mitochondrie = énergie"}}
```"#;

    #[test]
    fn at_gen_01_quiz_happy_path_persists_structured_content() {
        let client = ScriptedClient::replying(vec![Ok(r#"{"quiz":{"title":"T","questions":[{"question":"Q1","options":["a","b","c","d"],"reponseCorrecte":1,"explication":"E"}]}}"#.to_string())]);
        let repo = repo();
        let w = wiring(&client, &repo);

        let creation = w.generate(&video(GameType::Quiz).with_item_count(1)).unwrap();

        assert_eq!(creation.game_type, GameType::Quiz);
        assert_eq!(creation.question_count(), Some(1));
        assert_eq!(creation.title, "T");
        assert_eq!(creation.content_format, Some(ContentFormat::QuizJson));
        assert_eq!(
            creation.source,
            CreationSource::Youtube {
                source_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()
            }
        );
        let parsed: Value = serde_json::from_str(&creation.content).unwrap();
        assert!(render_quiz_value(&parsed).contains("Q1"));

        let stored = repo.user_creations();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], creation);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("quiz de 1 questions"));
        assert_eq!(
            calls[0].1,
            SeenMedia::Video("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );
        assert_eq!(calls[0].2.max_output_tokens, 8_192);
        assert_eq!(w.progress().step, GenerationStep::Done);
        assert_eq!(w.progress().percent, 100);
    }

    #[test]
    fn at_gen_02_failed_code_stage_persists_nothing() {
        let client = ScriptedClient::replying(vec![
            Ok(SPEC_REPLY.to_string()),
            Err(AiError::Http {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);
        let repo = repo();
        let w = wiring(&client, &repo);
        let mut seen = Vec::new();

        let err = w
            .generate_with_progress(&video(GameType::Interactive), |p| seen.push(p.clone()))
            .unwrap_err();

        assert!(matches!(err, GenerationError::Transport(_)));
        assert!(err.to_string().starts_with("La génération a échoué"));
        assert!(repo.user_creations().is_empty());
        assert_eq!(client.calls().len(), 2);

        let last = seen.last().unwrap();
        assert_eq!(last.step, GenerationStep::Error);
        assert!(last.error.as_deref().unwrap().contains("boom"));
        assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!(seen
            .iter()
            .any(|p| p.step == GenerationStep::Generating(GenerationStage::GameCode)));
    }

    #[test]
    fn at_gen_03_unparseable_flashcards_reply_fails_loudly() {
        let client = ScriptedClient::replying(vec![Ok("Sorry, I cannot do that.".to_string())]);
        let repo = repo();
        let w = wiring(&client, &repo);

        let err = w.generate(&video(GameType::Flashcards)).unwrap_err();

        assert!(matches!(
            err,
            GenerationError::UnusableOutput {
                stage: GenerationStage::StructuredContent
            }
        ));
        assert!(repo.user_creations().is_empty());
        assert_eq!(w.progress().step, GenerationStep::Error);
    }

    #[test]
    fn at_gen_04_interactive_runs_spec_then_code() {
        let client = ScriptedClient::replying(vec![
            Ok(SPEC_REPLY.to_string()),
            Ok("Voici :\n```html\n<!DOCTYPE html>\n<html><body>jeu</body></html>\n```".to_string()),
        ]);
        let repo = repo();
        let w = wiring(&client, &repo);
        let mut steps = Vec::new();

        let creation = w
            .generate_with_progress(&video(GameType::Interactive), |p| steps.push(p.step))
            .unwrap();

        assert_eq!(creation.content, "<!DOCTYPE html>\n<html><body>jeu</body></html>");
        assert_eq!(creation.content_format, Some(ContentFormat::Html));
        assert_eq!(creation.title, "Chasse aux cellules");
        assert_eq!(creation.question_count(), None);
        assert_eq!(
            steps,
            vec![
                GenerationStep::Initializing,
                GenerationStep::Analyzing,
                GenerationStep::Generating(GenerationStage::GameSpec),
                GenerationStep::Generating(GenerationStage::GameCode),
                GenerationStep::Saving,
                GenerationStep::Done,
            ]
        );

        let calls = client.calls();
        assert!(matches!(calls[0].1, SeenMedia::Video(_)));
        assert_eq!(calls[1].1, SeenMedia::None);
        assert!(calls[1].0.contains("Chasse aux cellules"));
        assert!(calls[1].0.contains("\"addendum\""));
        assert_eq!(calls[1].2.max_output_tokens, 32_768);
    }

    #[test]
    fn at_gen_05_invalid_input_never_reaches_the_model() {
        let client = ScriptedClient::default();
        let repo = repo();
        let w = wiring(&client, &repo);

        let blank = GenerationOptions::v1(
            GenerationSource::YoutubeUrl("  ".to_string()),
            GameType::Quiz,
        );
        assert!(matches!(w.generate(&blank), Err(GenerationError::InvalidInput(_))));

        let vimeo = GenerationOptions::v1(
            GenerationSource::YoutubeUrl("https://vimeo.com/1".to_string()),
            GameType::Quiz,
        );
        assert!(matches!(w.generate(&vimeo), Err(GenerationError::InvalidInput(_))));

        let too_many = video(GameType::Flashcards).with_item_count(51);
        assert!(matches!(w.generate(&too_many), Err(GenerationError::InvalidInput(_))));

        let not_pdf = GenerationOptions::v1(
            GenerationSource::Pdf {
                file_name: "notes.pdf".to_string(),
                bytes: b"hello".to_vec(),
            },
            GameType::Quiz,
        );
        assert!(matches!(w.generate(&not_pdf), Err(GenerationError::InvalidInput(_))));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn at_gen_06_pdf_titles_fall_back_to_file_stem_unless_given() {
        let reply = r#"{"flashcards": {"title": "", "cards": [{"front": "ATP", "back": "énergie"}, {"front": " ", "back": "x"}]}}"#;
        let client = ScriptedClient::replying(vec![Ok(reply.to_string()), Ok(reply.to_string())]);
        let repo = repo();
        let w = wiring(&client, &repo);

        let first = w.generate(&pdf(GameType::Flashcards)).unwrap();
        assert_eq!(first.title, "Biologie cellulaire");
        assert_eq!(first.question_count(), Some(1));
        assert_eq!(
            first.source,
            CreationSource::Pdf {
                source_file_name: "Biologie cellulaire.pdf".to_string()
            }
        );
        assert_eq!(client.calls()[0].1, SeenMedia::Pdf(14));

        let second = w
            .generate(&pdf(GameType::Flashcards).with_title("Mes cartes"))
            .unwrap();
        assert_eq!(second.title, "Mes cartes");
        assert_ne!(first.id, second.id);
        assert_eq!(repo.user_creations().len(), 2);
    }

    #[test]
    fn at_gen_07_storage_refusal_is_reported() {
        let client = ScriptedClient::replying(vec![Ok(
            r#"{"quiz":{"title":"T","questions":[{"question":"Q","options":["a","b"],"reponseCorrecte":0}]}}"#
                .to_string(),
        )]);
        let repo = LocalCreationRepo::new(KvStore::new(MemoryKvBackend::with_quota(16), "t_"), 5);
        let w = GenerationWiring::new(GenerationConfig::mvp_v1(), &client, &repo).unwrap();

        assert!(matches!(
            w.generate(&video(GameType::Quiz)),
            Err(GenerationError::PersistRejected)
        ));
        assert!(repo.user_creations().is_empty());
    }

    #[test]
    fn at_gen_08_invalid_questions_are_dropped_and_empty_quiz_fails() {
        let partly_bad = r#"{"quiz":{"title":"T","questions":[
            {"question":"ok","options":["a","b","c","d"],"reponseCorrecte":3},
            {"question":"bad","options":["a","b","c","d"],"reponseCorrecte":7}]}}"#;
        let all_bad = r#"{"quiz":{"title":"T","questions":[
            {"question":"bad","options":["a"],"reponseCorrecte":0}]}}"#;
        let client = ScriptedClient::replying(vec![Ok(partly_bad.to_string()), Ok(all_bad.to_string())]);
        let repo = repo();
        let w = wiring(&client, &repo);

        let kept = w.generate(&video(GameType::Quiz)).unwrap();
        assert_eq!(kept.question_count(), Some(1));
        assert!(!kept.content.contains("bad"));

        assert!(matches!(
            w.generate(&video(GameType::Quiz)),
            Err(GenerationError::UnusableOutput { .. })
        ));
        assert_eq!(repo.user_creations().len(), 1);
    }

    #[test]
    fn at_gen_09_config_is_validated() {
        let client = ScriptedClient::default();
        let repo = repo();
        let mut config = GenerationConfig::mvp_v1();
        config.model = " ".to_string();
        assert!(GenerationWiring::new(config, &client, &repo).is_err());
        let mut config = GenerationConfig::mvp_v1();
        config.code.max_output_tokens = 0;
        assert!(GenerationWiring::new(config, &client, &repo).is_err());
    }

    #[test]
    fn at_gen_10_malformed_items_do_not_sink_the_reply() {
        let quiz = r#"{"quiz":{"title":"T","questions":[
            {"question":"Q1","options":["a","b","c","d"],"reponseCorrecte":1},
            {"question":"Q2","options":["a","b","c","d"],"reponseCorrecte":"2"},
            {"question":"Q3","reponseCorrecte":0}]}}"#;
        let deck = r#"{"flashcards":{"title":"D","cards":[
            {"front":"ATP","back":"énergie"},
            {"front":"ADN"}]}}"#;
        let client = ScriptedClient::replying(vec![Ok(quiz.to_string()), Ok(deck.to_string())]);
        let repo = repo();
        let w = wiring(&client, &repo);

        let kept_quiz = w.generate(&video(GameType::Quiz)).unwrap();
        assert_eq!(kept_quiz.question_count(), Some(1));
        assert!(kept_quiz.content.contains("Q1"));
        assert!(!kept_quiz.content.contains("Q2"));

        let kept_deck = w.generate(&video(GameType::Flashcards)).unwrap();
        assert_eq!(kept_deck.question_count(), Some(1));
        assert!(kept_deck.content.contains("ATP"));
        assert!(!kept_deck.content.contains("ADN"));

        assert_eq!(repo.user_creations().len(), 2);
        assert_eq!(client.calls().len(), 2);
    }
}
