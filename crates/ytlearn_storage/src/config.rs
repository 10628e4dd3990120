#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "ytlearn_";
pub const DEFAULT_MAX_CREATIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub namespace: String,
    pub max_creations: usize,
    pub data_path: PathBuf,
}

impl StoreConfig {
    pub fn mvp_v1() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_creations: DEFAULT_MAX_CREATIONS,
            data_path: default_data_path(),
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::mvp_v1();
        if let Some(path) = non_empty_env("YTLEARN_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(namespace) = non_empty_env("YTLEARN_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(max) = non_empty_env("YTLEARN_MAX_CREATIONS")
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|max| *max > 0)
        {
            config.max_creations = max;
        }
        config
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_data_path() -> PathBuf {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config_home).join("ytlearn").join("store.json");
    }
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("ytlearn")
            .join("store.json");
    }
    PathBuf::from(".ytlearn").join("store.json")
}
