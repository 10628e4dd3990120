#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use ytlearn_contracts::creation::Creation;
use ytlearn_contracts::preferences::UserPreferences;
use ytlearn_contracts::Identifiable;

use crate::config::{StoreConfig, DEFAULT_MAX_CREATIONS};
use crate::kv::{KvBackend, KvStore};

pub const CREATIONS_KEY: &str = "creations";
pub const PREFERENCES_KEY: &str = "preferences";
pub const INSTALL_PROMPT_KEY: &str = "install_prompt_shown";

/// Persistence boundary for creations, preferences and one-time flags.
/// Implementations report failures as `false`/`None`/defaults, never as panics.
pub trait CreationRepository {
    /// User creations plus seed examples; no ordering guarantee.
    fn list(&self) -> Vec<Creation>;
    fn add(&self, creation: Creation) -> bool;
    /// Succeeds for ids that are not present. Seed examples cannot be deleted:
    /// a seed id only removes the user's stored replacement, and fails when
    /// there is none.
    fn delete(&self, id: &str) -> bool;
    fn get_by_id(&self, id: &str) -> Option<Creation>;
    fn preferences(&self) -> UserPreferences;
    fn update_preferences(&self, partial: &Map<String, Value>) -> bool;
    fn has_shown_install_prompt(&self) -> bool;
    fn mark_install_prompt_shown(&self) -> bool;
    fn reset_install_prompt(&self) -> bool;
}

impl<R: CreationRepository + ?Sized> CreationRepository for &R {
    fn list(&self) -> Vec<Creation> {
        (**self).list()
    }

    fn add(&self, creation: Creation) -> bool {
        (**self).add(creation)
    }

    fn delete(&self, id: &str) -> bool {
        (**self).delete(id)
    }

    fn get_by_id(&self, id: &str) -> Option<Creation> {
        (**self).get_by_id(id)
    }

    fn preferences(&self) -> UserPreferences {
        (**self).preferences()
    }

    fn update_preferences(&self, partial: &Map<String, Value>) -> bool {
        (**self).update_preferences(partial)
    }

    fn has_shown_install_prompt(&self) -> bool {
        (**self).has_shown_install_prompt()
    }

    fn mark_install_prompt_shown(&self) -> bool {
        (**self).mark_install_prompt_shown()
    }

    fn reset_install_prompt(&self) -> bool {
        (**self).reset_install_prompt()
    }
}

#[derive(Debug)]
pub struct LocalCreationRepo<B: KvBackend> {
    store: KvStore<B>,
    max_creations: usize,
    seed_examples: Vec<Creation>,
}

impl<B: KvBackend> LocalCreationRepo<B> {
    pub fn new(store: KvStore<B>, max_creations: usize) -> Self {
        Self {
            store,
            max_creations: max_creations.max(1),
            seed_examples: Vec::new(),
        }
    }

    pub fn from_config(backend: B, config: &StoreConfig) -> Self {
        Self::new(
            KvStore::new(backend, config.namespace.clone()),
            config.max_creations,
        )
    }

    pub fn with_default_capacity(store: KvStore<B>) -> Self {
        Self::new(store, DEFAULT_MAX_CREATIONS)
    }

    pub fn with_seed_examples(mut self, seed_examples: Vec<Creation>) -> Self {
        self.seed_examples = seed_examples;
        self
    }

    pub fn store(&self) -> &KvStore<B> {
        &self.store
    }

    pub fn max_creations(&self) -> usize {
        self.max_creations
    }

    /// The user's own creations, without seed examples.
    pub fn user_creations(&self) -> Vec<Creation> {
        let raw: Vec<Value> = self.store.get(CREATIONS_KEY, Vec::new());
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<Creation>(value) {
                Ok(creation) => Some(creation),
                Err(err) => {
                    warn!(error = %err, "skipping malformed stored creation");
                    None
                }
            })
            .filter(|creation| !creation.has_reserved_id())
            .collect()
    }

    /// Newest first by `createdAt`, ties broken by id.
    pub fn list_recent(&self) -> Vec<Creation> {
        let mut all = self.list();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }

    fn persist(&self, creations: &[Creation]) -> bool {
        self.store.set(CREATIONS_KEY, creations)
    }
}

impl<B: KvBackend> CreationRepository for LocalCreationRepo<B> {
    fn list(&self) -> Vec<Creation> {
        let mut out = self.user_creations();
        let user_ids: BTreeSet<String> = out.iter().map(|c| c.id.clone()).collect();
        out.extend(
            self.seed_examples
                .iter()
                .filter(|seed| !seed.has_reserved_id() && !user_ids.contains(&seed.id))
                .cloned(),
        );
        out
    }

    fn add(&self, creation: Creation) -> bool {
        if creation.has_reserved_id() {
            warn!(id = %creation.id, "refusing to store creation with reserved id");
            return false;
        }
        let mut creations = self.user_creations();
        creations.retain(|existing| existing.id != creation.id);
        while creations.len() >= self.max_creations {
            let Some(oldest) = creations
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.created_at)
                .map(|(idx, _)| idx)
            else {
                break;
            };
            let evicted = creations.remove(oldest);
            debug!(id = %evicted.id, "evicting oldest creation at capacity");
        }
        creations.push(creation);
        self.persist(&creations)
    }

    fn delete(&self, id: &str) -> bool {
        let mut creations = self.user_creations();
        let before = creations.len();
        creations.retain(|existing| existing.id != id);
        if self.seed_examples.iter().any(|seed| seed.id == id) && creations.len() == before {
            warn!(id, "seed examples cannot be deleted");
            return false;
        }
        self.persist(&creations)
    }

    fn get_by_id(&self, id: &str) -> Option<Creation> {
        if ytlearn_contracts::is_reserved_id(id) {
            return None;
        }
        self.list().into_iter().find(|c| c.id == id)
    }

    fn preferences(&self) -> UserPreferences {
        self.store
            .get(PREFERENCES_KEY, UserPreferences::default())
    }

    fn update_preferences(&self, partial: &Map<String, Value>) -> bool {
        match self.preferences().merged(partial) {
            Ok(next) => self.store.set(PREFERENCES_KEY, &next),
            Err(err) => {
                warn!(error = %err, "preferences update rejected");
                false
            }
        }
    }

    fn has_shown_install_prompt(&self) -> bool {
        self.store.get(INSTALL_PROMPT_KEY, false)
    }

    fn mark_install_prompt_shown(&self) -> bool {
        self.store.set(INSTALL_PROMPT_KEY, &true)
    }

    fn reset_install_prompt(&self) -> bool {
        self.store.remove(INSTALL_PROMPT_KEY)
    }
}
