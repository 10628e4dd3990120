#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use ytlearn_contracts::creation::GameType;
use ytlearn_contracts::generation::{GenerationOptions, GenerationProgress, GenerationSource};
use ytlearn_os::playback::resolve_playback_html;
use ytlearn_os::seed::seed_examples;
use ytlearn_storage::{CreationRepository, FileKvBackend, KvStore, LocalCreationRepo, StoreConfig};

pub fn open_local_repo(config: &StoreConfig) -> LocalCreationRepo<FileKvBackend> {
    LocalCreationRepo::new(
        KvStore::new(
            FileKvBackend::new(config.data_path.clone()),
            config.namespace.clone(),
        ),
        config.max_creations,
    )
    .with_seed_examples(seed_examples())
}

pub struct GenerateArgs<'a> {
    pub youtube: Option<&'a str>,
    pub pdf: Option<&'a Path>,
    pub game_type: &'a str,
    pub difficulty: Option<&'a str>,
    pub count: Option<u8>,
    pub instructions: Option<&'a str>,
    pub title: Option<&'a str>,
}

pub fn build_generation_options(args: &GenerateArgs<'_>) -> Result<GenerationOptions, String> {
    let game_type = GameType::parse(args.game_type).ok_or_else(|| {
        format!(
            "unknown game type '{}'. expected one of: quiz, flashcards, interactive",
            args.game_type
        )
    })?;
    let source = match (args.youtube, args.pdf) {
        (Some(url), None) => GenerationSource::YoutubeUrl(url.to_string()),
        (None, Some(path)) => {
            let bytes =
                fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            GenerationSource::Pdf { file_name, bytes }
        }
        _ => return Err("exactly one of --youtube or --pdf is required".to_string()),
    };

    let mut options = GenerationOptions::v1(source, game_type);
    if let Some(difficulty) = args.difficulty {
        options = options.with_difficulty(difficulty);
    }
    if let Some(count) = args.count {
        options = options.with_item_count(count);
    }
    if let Some(instructions) = args.instructions {
        options = options.with_instructions(instructions);
    }
    if let Some(title) = args.title {
        options = options.with_title(title);
    }
    Ok(options)
}

pub fn progress_line(progress: &GenerationProgress) -> String {
    match &progress.error {
        Some(err) => format!("[{:>3}%] {} : {err}", progress.percent, progress.label),
        None => format!("[{:>3}%] {}", progress.percent, progress.label),
    }
}

/// One creation per line, newest first: `id<TAB>gameType<TAB>title`.
pub fn list_creations(repo: &impl CreationRepository) -> String {
    let mut creations = repo.list();
    creations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    creations
        .iter()
        .map(|c| format!("{}\t{}\t{}", c.id, c.game_type.as_str(), c.title))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn show_creation(repo: &impl CreationRepository, id: &str) -> Result<String, String> {
    repo.get_by_id(id)
        .map(|c| resolve_playback_html(&c))
        .ok_or_else(|| format!("no creation with id '{id}'"))
}

pub fn export_creation(
    repo: &impl CreationRepository,
    id: &str,
    out: &Path,
) -> Result<String, String> {
    let html = show_creation(repo, id)?;
    fs::write(out, html).map_err(|e| format!("failed to write {}: {e}", out.display()))?;
    Ok(out.display().to_string())
}

pub fn delete_creation(repo: &impl CreationRepository, id: &str) -> Result<String, String> {
    if repo.delete(id) {
        Ok("OK".to_string())
    } else {
        Err(format!("failed to delete '{id}'"))
    }
}

pub fn get_preferences(repo: &impl CreationRepository) -> Result<String, String> {
    serde_json::to_string_pretty(&repo.preferences()).map_err(|e| e.to_string())
}

/// `raw` is taken as JSON when it parses, as a plain string otherwise.
pub fn set_preference(
    repo: &impl CreationRepository,
    key: &str,
    raw: &str,
) -> Result<String, String> {
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
    let mut partial = Map::new();
    partial.insert(key.to_string(), value);
    if repo.update_preferences(&partial) {
        Ok("OK".to_string())
    } else {
        Err(format!("preference '{key}' was rejected"))
    }
}
