use jarvis_local_lib::model::{NewEvent, NewTask, SettingsPatch, TaskPatch, TaskStatus, Theme};
use jarvis_local_lib::storage::{KeyValueStore, SqliteStore};
use jarvis_local_lib::store::{AppStore, EVENTS_KEY, TASKS_KEY};
use std::sync::Arc;

fn open(path: &std::path::Path) -> AppStore {
    let db = SqliteStore::open(path).unwrap();
    let mut store = AppStore::new(Arc::new(db));
    store.initialize();
    store
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("jarvis.db");

    let (task_id, event_id) = {
        let mut store = open(&path);
        let task = store
            .add_task(NewTask {
                title: "Water plants".to_string(),
                ..NewTask::default()
            })
            .unwrap();
        store
            .update_task(
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        let event = store
            .add_event(NewEvent {
                title: "Dentist".to_string(),
                start_time: "2030-01-01T09:00".to_string(),
                end_time: "2030-01-01T10:00".to_string(),
                ..NewEvent::default()
            })
            .unwrap();
        store
            .update_settings(SettingsPatch {
                theme: Some(Theme::Light),
                ..SettingsPatch::default()
            })
            .unwrap();
        (task.id, event.id)
    };

    let mut store = open(&path);
    let tasks = store.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task_id);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert_eq!(store.events()[0].id, event_id);
    assert_eq!(store.settings().theme, Theme::Light);
    assert_eq!(store.skills().len(), 4);

    // ids keep growing past what was persisted
    let next = store.add_task(NewTask::default()).unwrap();
    assert!(next.id > task_id);
    assert!(next.id > event_id);
}

#[test]
fn test_collections_are_whole_json_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jarvis.db");
    let mut store = open(&path);
    let task = store.add_task(NewTask::default()).unwrap();
    store.delete_task(task.id).unwrap();
    drop(store);

    let db = SqliteStore::open(&path).unwrap();
    assert_eq!(db.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    assert_eq!(db.get(EVENTS_KEY).unwrap(), None);
}
