#![forbid(unsafe_code)]

use serde_json::{json, Value};
use ytlearn_storage::kv::{
    FileKvBackend, KvBackend, KvStore, MemoryKvBackend, StorageChange, StorageChangeKind,
};

fn store() -> KvStore<MemoryKvBackend> {
    KvStore::new(MemoryKvBackend::new(), "ytlearn_")
}

#[test]
fn at_kv_db_01_keys_are_namespaced_in_the_backend() {
    let s = store();
    assert_eq!(s.key_for("creations"), "ytlearn_creations");
    assert!(s.set("flag", &true));
    assert_eq!(s.backend().keys(), vec!["ytlearn_flag".to_string()]);
    assert!(s.get("flag", false));
}

#[test]
fn at_kv_db_02_missing_and_corrupt_values_fall_back_to_default() {
    let s = store();
    assert_eq!(s.get::<Vec<u32>>("absent", vec![7]), vec![7]);

    s.backend().write("ytlearn_broken", "{not json").unwrap();
    assert_eq!(s.get::<Vec<u32>>("broken", vec![1]), vec![1]);

    s.backend().write("ytlearn_shape", "\"text\"").unwrap();
    assert_eq!(s.get::<Vec<u32>>("shape", vec![2]), vec![2]);
}

#[test]
fn at_kv_db_03_reserved_records_are_filtered_on_read() {
    let s = store();
    s.backend()
        .write(
            "ytlearn_items",
            r#"[{"id":"keep"},{"id":"Fox-poison"},{"id":"also","nested":{"id":"fox"}}]"#,
        )
        .unwrap();
    let items: Vec<Value> = s.get("items", Vec::new());
    assert_eq!(items, vec![json!({"id": "keep"}), json!({"id": "also"})]);

    s.backend()
        .write("ytlearn_single", r#"{"id":"FOX1","title":"x"}"#)
        .unwrap();
    assert_eq!(s.get("single", json!(null)), json!(null));
}

#[test]
fn at_kv_db_04_reserved_root_write_is_refused_without_touching_storage() {
    let s = store();
    assert!(s.set("single", &json!({"id": "ok"})));
    assert!(!s.set("single", &json!({"id": "fox-new"})));
    assert_eq!(
        s.backend().read("ytlearn_single").unwrap().as_deref(),
        Some(r#"{"id":"ok"}"#)
    );
}

#[test]
fn at_kv_db_05_nested_reserved_records_are_stripped_on_write() {
    let s = store();
    assert!(s.set("items", &json!([{"id": "a"}, {"id": "fOx-b"}])));
    assert_eq!(
        s.backend().read("ytlearn_items").unwrap().as_deref(),
        Some(r#"[{"id":"a"}]"#)
    );
}

#[test]
fn at_kv_db_06_quota_failure_reports_false() {
    let s = KvStore::new(MemoryKvBackend::with_quota(32), "ytlearn_");
    assert!(s.set("a", &"small"));
    assert!(!s.set("b", &"x".repeat(64)));
    assert_eq!(s.get("b", String::new()), "");
}

#[test]
fn at_kv_db_07_listeners_see_namespaced_changes() {
    let s = store();
    let rx = s.subscribe();
    assert!(s.set("creations", &Vec::<u8>::new()));
    assert!(s.remove("creations"));
    assert!(!s.set("x", &json!({"id": "fox"})));
    let changes: Vec<StorageChange> = rx.try_iter().collect();
    assert_eq!(
        changes,
        vec![
            StorageChange {
                key: "ytlearn_creations".to_string(),
                kind: StorageChangeKind::Set,
            },
            StorageChange {
                key: "ytlearn_creations".to_string(),
                kind: StorageChangeKind::Removed,
            },
        ]
    );
}

#[test]
fn at_kv_db_08_file_backend_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");
    {
        let s = KvStore::new(FileKvBackend::new(&path), "ytlearn_");
        assert!(s.set("prefs", &json!({"theme": "dark"})));
        assert!(s.set("gone", &1u8));
        assert!(s.remove("gone"));
    }
    let reopened = KvStore::new(FileKvBackend::new(&path), "ytlearn_");
    assert_eq!(reopened.get("prefs", json!({})), json!({"theme": "dark"}));
    assert_eq!(reopened.get("gone", 0u8), 0);
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"schema_version\": 1"));
}

#[test]
fn at_kv_db_09_unreadable_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "garbage").unwrap();
    let s = KvStore::new(FileKvBackend::new(&path), "ytlearn_");
    assert_eq!(s.get("prefs", 5u8), 5);
    assert!(!s.set("prefs", &6u8));
}
