use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracker_core::db::open_db_in_memory;
use tracker_core::{
    CollectionKind, EntityId, FixedClock, HabitDraft, ImportError, KeyValueStore, KvWrite,
    NoteDraft, Settings, SqliteKvStore, StoreError, StoreEvent, StoreResult, TaskDraft, Tracker,
    TrackerConfig,
};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
    ))
}

fn tracker_with_store() -> (Tracker, Arc<SqliteKvStore>) {
    let store = Arc::new(SqliteKvStore::new(open_db_in_memory().unwrap(), "tracker").unwrap());
    (Tracker::with_store(store.clone(), clock()), store)
}

fn seed(tracker: &Tracker) {
    tracker.tasks().add(TaskDraft::new("Review goals")).unwrap();
    let habit = tracker.habits().add(HabitDraft::new("Reading")).unwrap();
    tracker
        .habits()
        .toggle_date_completion(&habit.id, tracker.today())
        .unwrap();
    tracker
        .notes()
        .add(NoteDraft::new("Project Ideas", "1. Tracker"))
        .unwrap();
    tracker.settings().set("theme", "dark").unwrap();
}

#[test]
fn export_clear_import_restores_every_collection() {
    let (tracker, _) = tracker_with_store();
    seed(&tracker);
    let tasks = tracker.tasks().list().unwrap();
    let habits = tracker.habits().list().unwrap();
    let notes = tracker.notes().list().unwrap();
    let settings = tracker.settings().get().unwrap();

    let exported = tracker.backup().export_json().unwrap();
    let removed = tracker.backup().clear_all_data().unwrap();
    assert_eq!(removed, 4);
    assert!(tracker.tasks().list().unwrap().is_empty());
    assert!(tracker.habits().list().unwrap().is_empty());
    assert!(tracker.notes().list().unwrap().is_empty());
    assert_eq!(tracker.settings().get().unwrap(), Settings::default());

    let report = tracker.backup().import(&exported).unwrap();
    assert_eq!(report.replaced, CollectionKind::ALL.to_vec());
    assert_eq!(report.export_date, Some(tracker.now()));
    assert_eq!(tracker.tasks().list().unwrap(), tasks);
    assert_eq!(tracker.habits().list().unwrap(), habits);
    assert_eq!(tracker.notes().list().unwrap(), notes);
    assert_eq!(tracker.settings().get().unwrap(), settings);
}

#[test]
fn export_uses_original_field_names() {
    let (tracker, _) = tracker_with_store();
    seed(&tracker);

    let exported = tracker.backup().export_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(value["exportDate"], "2024-01-15T12:00:00Z");
    assert_eq!(value["tasks"][0]["dueDate"], "2024-01-15");
    assert_eq!(value["habits"][0]["completedDates"][0], "2024-01-15");
    assert!(value["notes"][0]["createdAt"].is_string());
    assert_eq!(value["settings"]["theme"], "dark");
}

#[test]
fn settings_only_import_leaves_other_collections_untouched() {
    let (tracker, store) = tracker_with_store();
    seed(&tracker);
    let before: Vec<Option<String>> = ["tasks", "habits", "notes"]
        .into_iter()
        .map(|key| store.get(key).unwrap())
        .collect();

    let report = tracker
        .backup()
        .import(r#"{"settings":{"theme":"minimal","autoSave":false}}"#)
        .unwrap();

    assert_eq!(report.replaced, vec![CollectionKind::Settings]);
    assert_eq!(report.export_date, None);
    let after: Vec<Option<String>> = ["tasks", "habits", "notes"]
        .into_iter()
        .map(|key| store.get(key).unwrap())
        .collect();
    assert_eq!(before, after);

    let settings = tracker.settings().get().unwrap();
    assert_eq!(settings.get_bool("autoSave"), Some(false));
    assert_eq!(settings.get_str("theme"), Some("minimal"));
    assert_eq!(settings.len(), 2);
}

#[test]
fn invalid_document_mutates_nothing() {
    let (tracker, store) = tracker_with_store();
    seed(&tracker);
    let before = store.keys().unwrap();
    let tasks = tracker.tasks().list().unwrap();
    let events = tracker.subscribe();

    for raw in [
        "not json at all",
        r#"{"tasks":[{"id":"1"}],"settings":{"theme":"dark"}}"#,
        r#"{"habits":"nope"}"#,
    ] {
        assert!(matches!(
            tracker.backup().import(raw),
            Err(ImportError::Parse(_))
        ));
    }

    assert_eq!(store.keys().unwrap(), before);
    assert_eq!(tracker.tasks().list().unwrap(), tasks);
    assert_eq!(tracker.settings().get().unwrap().get_str("theme"), Some("dark"));
    assert!(events.try_recv().is_err());
}

#[test]
fn import_accepts_foreign_ids_and_empty_sections() {
    let (tracker, _) = tracker_with_store();
    seed(&tracker);

    tracker
        .backup()
        .import(
            r#"{"tasks":[{"id":"1700000000000","text":"Imported","completed":true,
                "dueDate":"2024-01-10","priority":"low","category":"weekly"}],
               "notes":[]}"#,
        )
        .unwrap();

    let tasks = tracker.tasks().list().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id.as_str(), "1700000000000");
    assert!(tasks[0].completed);
    assert!(tracker.notes().list().unwrap().is_empty());
    assert_eq!(tracker.habits().list().unwrap().len(), 1);
}

#[test]
fn import_and_clear_emit_events() {
    let (tracker, _) = tracker_with_store();
    let events = tracker.subscribe();

    tracker
        .backup()
        .import(r#"{"tasks":[],"habits":[]}"#)
        .unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::Imported(vec![CollectionKind::Tasks, CollectionKind::Habits])
    );

    tracker.backup().clear_all_data().unwrap();
    assert_eq!(events.try_recv().unwrap(), StoreEvent::Cleared);
    assert!(events.try_recv().is_err());
}

#[test]
fn default_file_name_uses_today() {
    let (tracker, _) = tracker_with_store();
    assert_eq!(
        tracker.backup().default_file_name(),
        "tracker-backup-2024-01-15.json"
    );
    assert_eq!(
        tracker.today(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    );
}

#[test]
fn opened_tracker_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrackerConfig {
        data_dir: dir.path().join("data"),
        ..TrackerConfig::default()
    };

    let task = {
        let tracker = Tracker::open(&config).unwrap();
        tracker.settings().set("showCompleted", false).unwrap();
        tracker.tasks().add(TaskDraft::new("Survive restart")).unwrap()
    };

    assert!(config.db_path().exists());
    let reopened = Tracker::open(&config).unwrap();
    assert_eq!(reopened.tasks().list().unwrap(), vec![task]);
    assert_eq!(
        reopened.settings().get().unwrap().get_bool("showCompleted"),
        Some(false)
    );
}

#[test]
fn namespaces_do_not_see_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let base = TrackerConfig {
        data_dir: dir.path().to_path_buf(),
        ..TrackerConfig::default()
    };
    let other = TrackerConfig {
        namespace: "sandbox".to_string(),
        ..base.clone()
    };

    let tracker = Tracker::open(&base).unwrap();
    tracker.tasks().add(TaskDraft::new("Mine")).unwrap();

    let sandbox = Tracker::open(&other).unwrap();
    assert!(sandbox.tasks().list().unwrap().is_empty());
    assert_eq!(sandbox.backup().clear_all_data().unwrap(), 0);
    assert_eq!(tracker.tasks().list().unwrap().len(), 1);
}

#[test]
fn duplicate_ids_in_a_section_are_rejected() {
    let (tracker, store) = tracker_with_store();
    seed(&tracker);
    let before = store.get("tasks").unwrap();

    let err = tracker
        .backup()
        .import(
            r#"{"tasks":[
                {"id":"7","text":"a","completed":false,"dueDate":"2024-01-10","priority":"low","category":"daily"},
                {"id":"7","text":"b","completed":false,"dueDate":"2024-01-11","priority":"low","category":"daily"}
            ]}"#,
        )
        .unwrap_err();

    match err {
        ImportError::DuplicateId { collection, id } => {
            assert_eq!(collection, CollectionKind::Tasks);
            assert_eq!(id, EntityId::from("7"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.get("tasks").unwrap(), before);
}

fn sqlite_store() -> SqliteKvStore {
    SqliteKvStore::new(open_db_in_memory().unwrap(), "tracker").unwrap()
}

/// Store that refuses every batch write.
struct ReadOnlyBatchStore(SqliteKvStore);

impl KeyValueStore for ReadOnlyBatchStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.0.get(key)
    }
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.0.set(key, value)
    }
    fn remove(&self, key: &str) -> StoreResult<()> {
        self.0.remove(key)
    }
    fn write_batch(&self, _writes: &[KvWrite]) -> StoreResult<()> {
        Err(StoreError::LockPoisoned)
    }
    fn keys(&self) -> StoreResult<Vec<String>> {
        self.0.keys()
    }
    fn clear_namespace(&self) -> StoreResult<usize> {
        self.0.clear_namespace()
    }
}

#[test]
fn failed_import_write_keeps_everything_as_it_was() {
    let tracker = Tracker::with_store(Arc::new(ReadOnlyBatchStore(sqlite_store())), clock());
    let task = tracker.tasks().add(TaskDraft::new("Keep me")).unwrap();
    let events = tracker.subscribe();

    let err = tracker
        .backup()
        .import(r#"{"tasks":[],"settings":{"theme":"dark"}}"#)
        .unwrap_err();

    assert!(matches!(err, ImportError::Store(_)));
    assert_eq!(tracker.tasks().list().unwrap(), vec![task.clone()]);
    tracker.tasks().reload().unwrap();
    assert_eq!(tracker.tasks().list().unwrap(), vec![task]);
    assert_eq!(tracker.settings().get().unwrap(), Settings::default());
    assert!(events.try_recv().is_err());
}

/// Store whose next `set` blocks until the test releases it.
struct PausingStore {
    inner: SqliteKvStore,
    armed: AtomicBool,
    paused: Mutex<Sender<()>>,
    resume: Mutex<Receiver<()>>,
}

impl KeyValueStore for PausingStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.paused.lock().unwrap().send(()).unwrap();
            self.resume.lock().unwrap().recv().unwrap();
        }
        self.inner.set(key, value)
    }
    fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key)
    }
    fn write_batch(&self, writes: &[KvWrite]) -> StoreResult<()> {
        self.inner.write_batch(writes)
    }
    fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys()
    }
    fn clear_namespace(&self) -> StoreResult<usize> {
        self.inner.clear_namespace()
    }
}

/// Runs `replace` on another thread while a task add is stalled inside its
/// write, then lets the add finish. Returns the task texts left afterwards.
fn replace_during_stalled_add<F>(replace: F) -> Vec<String>
where
    F: FnOnce(&Tracker<PausingStore>) + Send,
{
    let (paused_tx, paused_rx) = channel();
    let (resume_tx, resume_rx) = channel();
    let store = Arc::new(PausingStore {
        inner: sqlite_store(),
        armed: AtomicBool::new(false),
        paused: Mutex::new(paused_tx),
        resume: Mutex::new(resume_rx),
    });
    let tracker = Tracker::with_store(store.clone(), clock());
    tracker.tasks().add(TaskDraft::new("seed")).unwrap();
    store.armed.store(true, Ordering::SeqCst);

    thread::scope(|scope| {
        let adder = scope.spawn(|| tracker.tasks().add(TaskDraft::new("concurrent")).unwrap());
        paused_rx.recv().unwrap();
        let replacer = scope.spawn(|| replace(&tracker));
        thread::sleep(Duration::from_millis(100));
        resume_tx.send(()).unwrap();
        adder.join().unwrap();
        replacer.join().unwrap();
    });

    tracker.tasks().reload().unwrap();
    tracker
        .tasks()
        .list()
        .unwrap()
        .into_iter()
        .map(|task| task.text)
        .collect()
}

#[test]
fn import_is_not_overwritten_by_a_concurrent_add() {
    let texts = replace_during_stalled_add(|tracker| {
        tracker
            .backup()
            .import(
                r#"{"tasks":[{"id":"imp","text":"imported","completed":false,
                    "dueDate":"2024-01-15","priority":"medium","category":"daily"}]}"#,
            )
            .unwrap();
    });
    assert_eq!(texts, vec!["imported".to_string()]);
}

#[test]
fn clear_is_not_undone_by_a_concurrent_add() {
    let texts = replace_during_stalled_add(|tracker| {
        tracker.backup().clear_all_data().unwrap();
    });
    assert!(texts.is_empty());
}
