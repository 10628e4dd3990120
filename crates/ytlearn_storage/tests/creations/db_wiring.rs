#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde_json::json;
use ytlearn_contracts::creation::{ContentFormat, Creation, CreationSource, GameType};
use ytlearn_contracts::preferences::Theme;
use ytlearn_contracts::UnixTimeMs;
use ytlearn_storage::kv::{KvBackend, KvStore, MemoryKvBackend};
use ytlearn_storage::repo::{CreationRepository, LocalCreationRepo, CREATIONS_KEY};

fn creation(id: &str, created_at: u64) -> Creation {
    Creation {
        id: id.to_string(),
        title: format!("Vidéo {id}"),
        source: CreationSource::Youtube {
            source_url: format!("https://www.youtube.com/watch?v={id}"),
        },
        thumbnail: String::new(),
        game_type: GameType::Quiz,
        content: r#"{"title":"T","questions":[]}"#.to_string(),
        content_format: Some(ContentFormat::QuizJson),
        difficulty: "facile".to_string(),
        metadata: BTreeMap::from([("questions".to_string(), json!(1))]),
        created_at: UnixTimeMs(created_at),
        updated_at: UnixTimeMs(created_at),
    }
}

fn repo(max: usize) -> LocalCreationRepo<MemoryKvBackend> {
    LocalCreationRepo::new(KvStore::new(MemoryKvBackend::new(), "ytlearn_"), max)
}

fn user_ids(r: &LocalCreationRepo<MemoryKvBackend>) -> Vec<String> {
    let mut ids: Vec<String> = r.user_creations().into_iter().map(|c| c.id).collect();
    ids.sort();
    ids
}

#[test]
fn at_creations_db_01_fifo_eviction_keeps_size_at_capacity() {
    let r = repo(3);
    for (id, at) in [("a", 40), ("b", 10), ("c", 30)] {
        assert!(r.add(creation(id, at)));
    }
    assert!(r.add(creation("d", 50)));
    assert_eq!(user_ids(&r), vec!["a", "c", "d"]);
    assert_eq!(r.user_creations().len(), 3);
}

#[test]
fn at_creations_db_02_capacity_two_scenario() {
    let r = repo(2);
    assert!(r.add(creation("first", 100)));
    assert!(r.add(creation("second", 200)));
    assert!(r.add(creation("third", 300)));
    let mut stamps: Vec<u64> = r.user_creations().iter().map(|c| c.created_at.0).collect();
    stamps.sort();
    assert_eq!(stamps, vec![200, 300]);
}

#[test]
fn at_creations_db_03_reserved_ids_rejected_on_add() {
    let r = repo(5);
    assert!(r.add(creation("ok", 1)));
    let before = r.store().backend().read("ytlearn_creations").unwrap();
    for id in ["fox", "FOX-1", "Foxtrot"] {
        assert!(!r.add(creation(id, 2)));
    }
    assert_eq!(r.store().backend().read("ytlearn_creations").unwrap(), before);
}

#[test]
fn at_creations_db_04_preexisting_reserved_records_never_surface() {
    let r = repo(5);
    let poisoned = json!([
        serde_json::to_value(creation("fox-seeded", 1)).unwrap(),
        serde_json::to_value(creation("clean", 2)).unwrap(),
    ]);
    r.store()
        .backend()
        .write(&r.store().key_for(CREATIONS_KEY), &poisoned.to_string())
        .unwrap();
    let ids: Vec<String> = r.list().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["clean".to_string()]);
    assert!(r.get_by_id("fox-seeded").is_none());
    assert!(r.get_by_id("clean").is_some());
}

#[test]
fn at_creations_db_05_delete_is_idempotent() {
    let r = repo(5);
    assert!(r.add(creation("a", 1)));
    assert!(r.delete("missing"));
    assert_eq!(user_ids(&r), vec!["a"]);
    assert!(r.delete("a"));
    assert!(r.delete("a"));
    assert!(r.user_creations().is_empty());
}

#[test]
fn at_creations_db_06_malformed_entries_are_skipped_not_fatal() {
    let r = repo(5);
    let mixed = json!([
        {"id": "broken"},
        serde_json::to_value(creation("fine", 2)).unwrap(),
    ]);
    r.store()
        .backend()
        .write("ytlearn_creations", &mixed.to_string())
        .unwrap();
    assert_eq!(user_ids(&r), vec!["fine"]);
}

#[test]
fn at_creations_db_07_add_fails_when_storage_quota_is_exhausted() {
    let r = LocalCreationRepo::new(KvStore::new(MemoryKvBackend::with_quota(64), "ytlearn_"), 5);
    assert!(!r.add(creation("big", 1)));
    assert!(r.user_creations().is_empty());
}

#[test]
fn at_creations_db_08_preferences_merge_round_trip() {
    let r = repo(5);
    assert_eq!(r.preferences().theme, Theme::System);
    assert!(r.update_preferences(json!({"theme": "dark", "language": "en"}).as_object().unwrap()));
    assert!(r.update_preferences(json!({"difficulty": "difficile"}).as_object().unwrap()));
    let prefs = r.preferences();
    assert_eq!(prefs.theme, Theme::Dark);
    assert_eq!(prefs.difficulty, "difficile");
    assert_eq!(prefs.extra.get("language"), Some(&json!("en")));

    assert!(!r.update_preferences(json!({"theme": 3}).as_object().unwrap()));
    assert_eq!(r.preferences().theme, Theme::Dark);
}

#[test]
fn at_creations_db_09_install_prompt_flag_can_be_reset() {
    let r = repo(5);
    assert!(!r.has_shown_install_prompt());
    assert!(r.mark_install_prompt_shown());
    assert!(r.has_shown_install_prompt());
    assert!(r.reset_install_prompt());
    assert!(!r.has_shown_install_prompt());
}
