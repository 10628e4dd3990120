#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::creation::GameType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Single per-installation preferences record. Unknown keys are kept in
/// `extra` so a shallow merge never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_game_type")]
    pub default_game_type: GameType,
    #[serde(default)]
    pub has_seen_tutorial: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_difficulty() -> String {
    "moyen".to_string()
}

fn default_game_type() -> GameType {
    GameType::Quiz
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            difficulty: default_difficulty(),
            default_game_type: default_game_type(),
            has_seen_tutorial: false,
            extra: Map::new(),
        }
    }
}

impl UserPreferences {
    /// Shallow merge: top-level keys of `partial` replace the current ones.
    /// Fails if the merged document no longer fits the typed fields.
    pub fn merged(&self, partial: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut doc = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in partial {
            doc.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(doc))
    }
}
