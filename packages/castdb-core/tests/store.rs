//! Integration tests for the store: durability, rollback, and
//! concurrent access.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use ntest::timeout;
use tempfile::tempdir;

use castdb_core::persistence::PersistenceAdapter;
use castdb_core::query::SearchTerms;
use castdb_core::{Store, StoreConfig, StoreError, Value};

const SAMPLE: &str = "\
id,first_name,last_name
1,Ross,Geller
2,Rachel,Green
3,Chandler,Bing
";

fn config_for(path: &Path) -> StoreConfig {
    StoreConfig {
        data_path: path.to_path_buf(),
        ..Default::default()
    }
}

fn body(pairs: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[timeout(1000)]
#[test]
fn test_every_mutation_is_reloadable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("characters.csv");
    fs::write(&path, SAMPLE).unwrap();

    let config = config_for(&path);
    let store = Store::open(config.clone());
    let adapter = PersistenceAdapter::new(&config);

    store
        .insert(&body(&[
            ("first_name", serde_json::json!("Monica")),
            ("last_name", serde_json::json!("Geller")),
        ]))
        .unwrap();
    assert_eq!(adapter.load().unwrap().all(), store.get_all().unwrap());

    store
        .update(2, &body(&[("last_name", serde_json::json!("Geller"))]))
        .unwrap();
    assert_eq!(adapter.load().unwrap().all(), store.get_all().unwrap());

    store.delete(3).unwrap();
    assert_eq!(adapter.load().unwrap().all(), store.get_all().unwrap());
}

#[timeout(1000)]
#[test]
fn test_delete_then_get_reports_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("characters.csv");
    fs::write(&path, SAMPLE).unwrap();

    let store = Store::open(config_for(&path));
    store.delete(2).unwrap();
    assert!(matches!(
        store.get_by_id(2),
        Err(StoreError::RecordNotFound { id: 2 })
    ));
}

#[timeout(1000)]
#[test]
fn test_search_through_the_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("characters.csv");
    fs::write(&path, SAMPLE).unwrap();

    let store = Store::open(config_for(&path));
    let terms = SearchTerms {
        first_name: Some("ross".to_string()),
        last_name: None,
    };
    let matches = store.search(&terms).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches[0].field("last_name"),
        Some(&Value::Str("Geller".to_string()))
    );
}

#[timeout(5000)]
#[test]
fn test_concurrent_update_and_delete_both_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("characters.csv");
    fs::write(&path, SAMPLE).unwrap();

    let config = config_for(&path);
    let store = Arc::new(Store::open(config.clone()));

    let updater = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            store
                .update(1, &body(&[("last_name", serde_json::json!("Geller-Green"))]))
                .unwrap();
        })
    };
    let deleter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            store.delete(2).unwrap();
        })
    };
    updater.join().unwrap();
    deleter.join().unwrap();

    // Both changes visible in memory
    assert_eq!(
        store.get_by_id(1).unwrap().field("last_name"),
        Some(&Value::Str("Geller-Green".to_string()))
    );
    assert!(store.get_by_id(2).is_err());

    // ...and in the backing file (no lost update)
    let reloaded = PersistenceAdapter::new(&config).load().unwrap();
    assert_eq!(reloaded.all(), store.get_all().unwrap());
}

#[timeout(5000)]
#[test]
fn test_readers_share_the_table_during_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("characters.csv");
    fs::write(&path, SAMPLE).unwrap();

    let store = Arc::new(Store::open(config_for(&path)));
    let mut handles = Vec::new();

    for worker in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for round in 0..25 {
                if worker == 0 {
                    let last = format!("Geller{}", round);
                    store
                        .update(1, &body(&[("last_name", serde_json::json!(last))]))
                        .unwrap();
                } else {
                    // Readers must always observe a complete row set.
                    let rows = store.get_all().unwrap();
                    assert_eq!(rows.len(), 3);
                    store.get_by_id(1).unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[cfg(unix)]
#[timeout(1000)]
#[test]
fn test_failed_write_back_rolls_the_mutation_back() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("characters.csv");
    fs::write(&path, SAMPLE).unwrap();

    let store = Store::open(config_for(&path));
    let before = store.get_all().unwrap();

    // Make the directory unwritable so the snapshot write fails.
    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
    let result = store.update(1, &body(&[("last_name", serde_json::json!("Nope"))]));
    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(StoreError::Io(_))));
    assert_eq!(store.get_all().unwrap(), before);
}

#[timeout(1000)]
#[test]
fn test_missing_backing_file_degrades_instead_of_crashing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nowhere.csv");

    let store = Store::open(config_for(&path));
    assert!(!store.is_available());
    assert!(matches!(store.get_all(), Err(StoreError::Unavailable)));
    assert!(matches!(store.paginate(1, 10), Err(StoreError::Unavailable)));
    assert!(matches!(
        store.insert(&body(&[("first_name", serde_json::json!("Ross"))])),
        Err(StoreError::Unavailable)
    ));
}
