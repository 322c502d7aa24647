/// On-disk behaviour of the file-backed store
use std::time::Duration;

use habit_share::*;
use tempfile::TempDir;

use crate::helpers::{as_user, day, disk_store};

#[test]
fn test_state_survives_reopen() {
    let (dir, storage) = disk_store();
    let path = dir.path().join("habits.json");

    let alice = as_user(&storage, "alice");
    let habit_id = alice.create_habit("Read", "twenty pages", 3).unwrap();
    alice.share_habit(&habit_id, "bob").unwrap();
    for d in [10, 8, 9] {
        alice.create_activity(&habit_id, day(2024, 1, d), "SUCCESS").unwrap();
    }
    alice.create_activity(&habit_id, day(2024, 1, 11), "NOT_DONE").unwrap();

    let before = storage.snapshot().unwrap();
    let reopened = FileStorage::open(&StoreConfig::file(&path)).unwrap();
    let after = reopened.snapshot().unwrap();

    assert_eq!(after, before);
    let dates: Vec<_> = after.habits[&habit_id]
        .activities
        .iter()
        .map(|a| a.logged_date)
        .collect();
    assert_eq!(dates, vec![day(2024, 1, 8), day(2024, 1, 9), day(2024, 1, 10), day(2024, 1, 11)]);
}

#[test]
fn test_save_then_load_is_identity() {
    let (dir, storage) = disk_store();
    let alice = as_user(&storage, "alice");
    let first = alice.create_habit("Walk", "", 1).unwrap();
    let second = alice.create_habit("Swim", "", 2).unwrap();
    alice.share_habit(&first, "carol").unwrap();
    alice.share_habit(&second, "carol").unwrap();
    alice.archive_habit(&second).unwrap();

    let copy = dir.path().join("copy.json");
    let document = storage.snapshot().unwrap();
    document.save(&copy).unwrap();

    assert_eq!(StoreDocument::load(&copy).unwrap(), document);
}

#[test]
fn test_stale_cache_reloads_external_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("habits.json");

    let eager = FileStorage::open(&StoreConfig::file(&path).with_freshness(Duration::ZERO)).unwrap();
    let lazy = FileStorage::open(&StoreConfig::file(&path).with_freshness(Duration::from_secs(3600))).unwrap();

    let habit_id = as_user(&eager, "alice").create_habit("Stretch", "", 1).unwrap();

    // The long-lived cache has not expired, so it still serves the old state
    assert!(matches!(
        lazy.get_habit(&habit_id),
        Err(StorageError::HabitNotFound { .. })
    ));

    let reader = FileStorage::open(&StoreConfig::file(&path).with_freshness(Duration::ZERO)).unwrap();
    as_user(&eager, "alice").change_name(&habit_id, "Stretch more").unwrap();
    assert_eq!(reader.get_habit(&habit_id).unwrap().name, "Stretch more");
}

#[test]
fn test_unchanged_upsert_does_not_rewrite() {
    let (dir, storage) = disk_store();
    let path = dir.path().join("habits.json");
    let alice = as_user(&storage, "alice");
    let habit_id = alice.create_habit("Meditate", "", 7).unwrap();
    alice.create_activity(&habit_id, day(2024, 2, 1), "MINIMUM").unwrap();

    std::fs::remove_file(&path).unwrap();
    alice.create_activity(&habit_id, day(2024, 2, 1), "MINIMUM").unwrap();
    assert!(!path.exists());

    alice.create_activity(&habit_id, day(2024, 2, 1), "SUCCESS").unwrap();
    assert!(path.exists());
}

#[test]
fn test_corrupted_file_fails_to_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("habits.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = FileStorage::open(&StoreConfig::file(&path));
    assert!(matches!(result, Err(StorageError::Serialization(_))));
}

#[test]
fn test_in_memory_store_never_writes() {
    let storage = FileStorage::in_memory();
    assert!(storage.path().is_none());

    let habit_id = as_user(&storage, "dana").create_habit("Journal", "", 2).unwrap();
    assert_eq!(storage.get_habit(&habit_id).unwrap().name, "Journal");
}

#[test]
fn test_failed_write_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    let path = data.join("habits.json");
    let storage = FileStorage::open(&StoreConfig::file(&path).with_freshness(Duration::from_secs(3600))).unwrap();

    let alice = as_user(&storage, "alice");
    let kept = alice.create_habit("Kept", "", 1).unwrap();

    std::fs::remove_dir_all(&data).unwrap();
    let err = alice.create_habit("Phantom", "", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    let err = alice.share_habit(&kept, "bob").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let names: Vec<_> = alice
        .get_my_habits(None, true)
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(names, vec!["Kept"]);
    assert!(alice.get_shared_with(&kept).unwrap().is_empty());

    // The next successful write must not carry the failed ones along
    std::fs::create_dir(&data).unwrap();
    alice.change_name(&kept, "Kept2").unwrap();

    let reopened = FileStorage::open(&StoreConfig::file(&path)).unwrap();
    let document = reopened.snapshot().unwrap();
    assert_eq!(document.habits.len(), 1);
    assert_eq!(document.habits[&kept].habit.name, "Kept2");
    assert!(document.habits[&kept].habit.shared_with.is_empty());
    assert!(!document.users.contains_key(&UserId::new("bob")));
}

#[test]
fn test_concurrent_writers_are_serialized() {
    let (dir, storage) = disk_store();
    let path = dir.path().join("habits.json");
    let habit_id = as_user(&storage, "alice").create_habit("Run", "", 1).unwrap();

    std::thread::scope(|scope| {
        for d in 1..=16 {
            let storage = &storage;
            let habit_id = &habit_id;
            scope.spawn(move || {
                as_user(storage, "alice")
                    .create_activity(habit_id, day(2024, 5, d), "SUCCESS")
                    .unwrap();
            });
        }
    });

    let document = storage.snapshot().unwrap();
    let dates: Vec<_> = document.habits[&habit_id]
        .activities
        .iter()
        .map(|a| a.logged_date)
        .collect();
    let expected: Vec<_> = (1..=16).map(|d| day(2024, 5, d)).collect();
    assert_eq!(dates, expected);

    assert_eq!(StoreDocument::load(&path).unwrap(), document);
}
