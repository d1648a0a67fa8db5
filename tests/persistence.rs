// Round trips through the on-disk blob stores

use std::fs;
use tasklist::{
    BlobStore, DEFAULT_COLOR, FileBlobStore, Priority, SequentialIds, SqliteBlobStore, TASKS_KEY, Task, TaskStore,
};
use tempfile::TempDir;

fn seed<B: BlobStore>(store: &mut TaskStore<B, SequentialIds>) {
    store.add("Buy milk", Priority::Low, "2024-01-05", DEFAULT_COLOR).unwrap();
    store.add("File taxes", Priority::High, "2024-01-01", "#ff8800").unwrap();
    store.add("Call mom", Priority::Medium, "", DEFAULT_COLOR).unwrap();
}

#[test]
fn test_sqlite_reload_reproduces_tasks() {
    let temp = TempDir::new().unwrap();

    let before: Vec<Task> = {
        let mut store: TaskStore<_, SequentialIds> = TaskStore::open(SqliteBlobStore::open(temp.path()).unwrap()).unwrap();
        seed(&mut store);
        store.toggle_completion("task-2").unwrap();
        store.sort_by_due_date().unwrap();
        store.tasks().to_vec()
    };

    let store: TaskStore<_, SequentialIds> = TaskStore::open(SqliteBlobStore::open(temp.path()).unwrap()).unwrap();
    assert_eq!(store.tasks(), before.as_slice());

    let order: Vec<&str> = store.tasks().iter().map(|t| t.description.as_str()).collect();
    assert_eq!(order, vec!["Call mom", "File taxes", "Buy milk"]);
    assert!(store.get("task-2").unwrap().is_completed);
}

#[test]
fn test_file_store_writes_json_array_under_tasks_key() {
    let temp = TempDir::new().unwrap();

    {
        let mut store: TaskStore<_, SequentialIds> = TaskStore::open(FileBlobStore::open(temp.path()).unwrap()).unwrap();
        seed(&mut store);
        store.delete("task-3").unwrap();
    }

    let raw = fs::read_to_string(temp.path().join(format!("{}.json", TASKS_KEY))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let array = json.as_array().unwrap();

    assert_eq!(array.len(), 2);
    assert_eq!(array[0]["description"], "Buy milk");
    assert_eq!(array[1]["priority"], "High");
    assert_eq!(array[1]["color"], "#ff8800");
    assert_eq!(array[1]["isCompleted"], false);
}

#[test]
fn test_filter_is_not_persisted() {
    let temp = TempDir::new().unwrap();

    {
        let mut store: TaskStore<_, SequentialIds> = TaskStore::open(SqliteBlobStore::open(temp.path()).unwrap()).unwrap();
        seed(&mut store);
        store.filter_by_priority(Priority::High);
        assert_eq!(store.view().len(), 1);
    }

    let store: TaskStore<_, SequentialIds> = TaskStore::open(SqliteBlobStore::open(temp.path()).unwrap()).unwrap();
    assert_eq!(store.view().len(), 3);
    assert!(store.active_filters().is_empty());
}

#[test]
fn test_legacy_browser_data_loads() {
    let temp = TempDir::new().unwrap();
    let legacy = r##"[
        {"id":0.5123,"description":"Old task","priority":"Low","dueDate":"2023-11-02","isCompleted":true,"color":"#aabbcc"},
        {"id":0.0042,"description":"No date","priority":"High","dueDate":"","isCompleted":false,"color":"#ffffff"}
    ]"##;
    fs::write(temp.path().join("tasks.json"), legacy).unwrap();

    let mut store: TaskStore<_, SequentialIds> = TaskStore::open(FileBlobStore::open(temp.path()).unwrap()).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.tasks()[0].id, "0.5123");
    assert!(store.tasks()[0].is_completed);

    store.toggle_completion("0.5123").unwrap();
    store.sort_by_due_date().unwrap();

    let reopened: TaskStore<_, SequentialIds> = TaskStore::open(FileBlobStore::open(temp.path()).unwrap()).unwrap();
    assert_eq!(reopened.tasks()[0].description, "No date");
    assert!(!reopened.get("0.5123").unwrap().is_completed);
}

#[test]
fn test_corrupt_file_yields_empty_list_then_recovers() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tasks.json"), "[{\"id\": truncated").unwrap();

    let mut store: TaskStore<_, SequentialIds> = TaskStore::open(FileBlobStore::open(temp.path()).unwrap()).unwrap();
    assert!(store.is_empty());

    store.add("Fresh start", Priority::Medium, "", DEFAULT_COLOR).unwrap();

    let reopened: TaskStore<_, SequentialIds> = TaskStore::open(FileBlobStore::open(temp.path()).unwrap()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.tasks()[0].description, "Fresh start");
}

#[test]
fn test_uuid_ids_survive_reload() {
    let temp = TempDir::new().unwrap();

    let id = {
        let mut store: TaskStore<_> = TaskStore::open(SqliteBlobStore::open(temp.path()).unwrap()).unwrap();
        store.add("uuid task", Priority::Low, "", DEFAULT_COLOR).unwrap()
    };

    let store: TaskStore<_> = TaskStore::open(SqliteBlobStore::open(temp.path()).unwrap()).unwrap();
    assert_eq!(store.get(&id).unwrap().description, "uuid task");
    assert_eq!(id.len(), 36);
}
