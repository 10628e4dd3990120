#![forbid(unsafe_code)]

use serde_json::Value;
use tracing::debug;
use ytlearn_contracts::creation::{ContentFormat, Creation, GameType};
use ytlearn_engines::render::{render_error_html, render_flashcards_value, render_quiz_value};

/// Browser-loadable HTML for a stored creation. Never fails: unreadable
/// content degrades to the error page.
pub fn resolve_playback_html(creation: &Creation) -> String {
    match creation.content_format {
        Some(ContentFormat::Html) => creation.content.clone(),
        Some(ContentFormat::QuizJson) => render_stored_json(&creation.content, GameType::Quiz),
        Some(ContentFormat::FlashcardsJson) => {
            render_stored_json(&creation.content, GameType::Flashcards)
        }
        None => resolve_legacy(creation),
    }
}

/// Records written before `contentFormat` existed: JSON means structured
/// content still to render, anything else is an already-rendered page.
fn resolve_legacy(creation: &Creation) -> String {
    if creation.game_type == GameType::Interactive {
        return creation.content.clone();
    }
    match serde_json::from_str::<Value>(&creation.content) {
        Ok(value) => {
            debug!(id = %creation.id, "legacy structured content rendered at playback");
            render_value(unwrap_key(value, creation.game_type), creation.game_type)
        }
        Err(_) => creation.content.clone(),
    }
}

fn render_stored_json(content: &str, game_type: GameType) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(value) => render_value(unwrap_key(value, game_type), game_type),
        Err(err) => {
            debug!(error = %err, "stored structured content is not json");
            render_error_html("Le contenu enregistré est illisible.")
        }
    }
}

fn render_value(value: Value, game_type: GameType) -> String {
    match game_type {
        GameType::Quiz => render_quiz_value(&value),
        GameType::Flashcards => render_flashcards_value(&value),
        GameType::Interactive => render_error_html("Ce jeu n'a pas de contenu affichable."),
    }
}

fn unwrap_key(value: Value, game_type: GameType) -> Value {
    let key = game_type.as_str();
    match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or_default(),
        other => other,
    }
}
