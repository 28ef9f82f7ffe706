use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{InputError, StoreError, StoreResult};
use crate::input::{is_affirmative, NewTask, TaskPatch};
use crate::task::{Status, Task, DEFAULT_CATEGORY};

pub const DEFAULT_FILE: &str = "tasks.json";

#[derive(Serialize)]
struct Snapshot<'a> {
    next_id: u64,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct StoredSnapshot {
    next_id: u64,
    tasks: Vec<Task>,
}

/// Ordered task list backed by a JSON file.
///
/// Ids come from a persisted `next_id` watermark, so removing a task never
/// lets a later one reuse its id. The watermark is wider than an id so it
/// can sit one past `u32::MAX` once every id is spent.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// Open the store at `path`. A missing file gives an empty store; an
    /// unreadable or malformed one also gives an empty store, and the error
    /// is handed back so the caller can warn about it.
    pub fn open(path: impl Into<PathBuf>) -> (Self, Option<StoreError>) {
        let path = path.into();
        match load(&path) {
            Ok((tasks, next_id)) => {
                debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
                (TaskStore { path, tasks, next_id }, None)
            }
            Err(err) => {
                warn!(%err, "starting with an empty task list");
                (TaskStore::empty(path), Some(err))
            }
        }
    }

    fn empty(path: PathBuf) -> Self {
        TaskStore {
            path,
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Overwrite the backing file with every task, pretty printed.
    pub fn save(&self) -> StoreResult<()> {
        let snapshot = Snapshot {
            next_id: self.next_id,
            tasks: &self.tasks,
        };
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot.serialize(&mut serializer)?;
        buf.push(b'\n');

        fs::write(&self.path, buf).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    /// Append a task and persist. The task stays in memory even if the
    /// write fails, so a later save can still pick it up.
    pub fn add(&mut self, new: NewTask, today: NaiveDate) -> StoreResult<&Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(InputError::EmptyTitle.into());
        }
        let id = u32::try_from(self.next_id).map_err(|_| StoreError::IdsExhausted)?;
        let category = match new.category.trim() {
            "" => DEFAULT_CATEGORY.to_owned(),
            other => other.to_owned(),
        };

        let task = Task {
            id,
            title: title.to_owned(),
            description: new.description,
            priority: new.priority,
            status: new.status,
            category,
            due_date: new.due_date,
            created_at: today,
            estimated_hours: new.estimated_hours,
            actual_hours: 0,
        };
        self.next_id += 1;
        info!(id = task.id, title = %task.title, "added task");
        self.tasks.push(task);
        self.save()?;
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// All tasks in store order, or only those with the given status.
    pub fn list(&self, status: Option<Status>) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect()
    }

    pub fn search(&self, keyword: &str) -> StoreResult<Vec<&Task>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Err(InputError::EmptyKeyword.into());
        }
        Ok(self.tasks.iter().filter(|t| t.matches(&needle)).collect())
    }

    /// Apply `patch` to task `id` and persist, even when nothing changed.
    pub fn edit(&mut self, id: u32, patch: TaskPatch) -> StoreResult<&Task> {
        let idx = self.index_of(id)?;
        if patch.is_empty() {
            debug!(id, "edit changes nothing");
        }
        let task = &mut self.tasks[idx];
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(hours) = patch.estimated_hours {
            task.estimated_hours = hours;
        }
        if let Some(hours) = patch.actual_hours {
            task.actual_hours = hours;
        }
        info!(id, "updated task");
        self.save()?;
        Ok(&self.tasks[idx])
    }

    /// Remove task `id` if `confirmation` is affirmative. Returns the removed
    /// task, or `None` when the deletion was cancelled.
    pub fn delete(&mut self, id: u32, confirmation: &str) -> StoreResult<Option<Task>> {
        let idx = self.index_of(id)?;
        if !is_affirmative(confirmation) {
            debug!(id, "deletion cancelled");
            return Ok(None);
        }
        let removed = self.tasks.remove(idx);
        info!(id, title = %removed.title, "deleted task");
        self.save()?;
        Ok(Some(removed))
    }

    fn index_of(&self, id: u32) -> StoreResult<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

fn load(path: &Path) -> StoreResult<(Vec<Task>, u64)> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), 1)),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let malformed = |source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    // Older versions wrote a bare array of tasks.
    let (mut tasks, stored_next) = if data.trim_start().starts_with('[') {
        (serde_json::from_str::<Vec<Task>>(&data).map_err(malformed)?, 0)
    } else {
        let snapshot: StoredSnapshot = serde_json::from_str(&data).map_err(malformed)?;
        (snapshot.tasks, snapshot.next_id)
    };

    let floor = tasks.iter().map(|t| u64::from(t.id)).max().unwrap_or(0) + 1;
    let mut next_id = stored_next.max(floor);
    renumber_duplicates(&mut tasks, &mut next_id);
    Ok((tasks, next_id))
}

/// Count-based ids in older files can repeat after a delete. Later copies get
/// fresh ids from the watermark so every task stays addressable.
fn renumber_duplicates(tasks: &mut [Task], next_id: &mut u64) {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks.iter_mut() {
        if seen.insert(task.id) {
            continue;
        }
        let Ok(fresh) = u32::try_from(*next_id) else {
            warn!(id = task.id, "duplicate task id left as is, no ids left");
            continue;
        };
        warn!(old = task.id, new = fresh, title = %task.title, "renumbered duplicate task id");
        task.id = fresh;
        seen.insert(fresh);
        *next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::{date, sample};
    use crate::task::Priority;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> TaskStore {
        let (store, warning) = TaskStore::open(dir.path().join(DEFAULT_FILE));
        assert!(warning.is_none());
        store
    }

    fn new_task(title: &str, status: Status) -> NewTask {
        NewTask {
            title: title.into(),
            status,
            ..NewTask::default()
        }
    }

    fn today() -> NaiveDate {
        date("2026-10-18")
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn malformed_file_opens_empty_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        fs::write(&path, "{ not json").unwrap();
        let (store, warning) = TaskStore::open(&path);
        assert!(store.is_empty());
        assert!(matches!(warning, Some(StoreError::Malformed { .. })));
    }

    #[test]
    fn save_then_open_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("Design schema", Status::Todo), today()).unwrap();
        let mut second = new_task("Write tests", Status::InProgress);
        second.priority = Priority::High;
        second.description = "cover edge cases".into();
        second.due_date = "2026-11-01".into();
        second.estimated_hours = 6;
        store.add(second, today()).unwrap();
        store
            .edit(2, TaskPatch { actual_hours: Some(3), ..TaskPatch::default() })
            .unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.tasks(), store.tasks());
        assert_eq!(reopened.next_id(), 3);
    }

    #[test]
    fn saved_file_is_indented_with_stable_field_order() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("Ship", Status::Todo), today()).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n    \"next_id\": 2"));
        let order = ["\"id\"", "\"title\"", "\"description\"", "\"priority\"", "\"status\"",
            "\"category\"", "\"due_date\"", "\"created_at\"", "\"estimated_hours\"",
            "\"actual_hours\""];
        let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reads_legacy_array_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        let legacy = r#"[
    {
        "id": 1,
        "title": "Old task",
        "description": "",
        "priority": "low",
        "status": "completed",
        "category": "General",
        "due_date": "",
        "created_at": "2025-03-02",
        "estimated_hours": 2,
        "actual_hours": 1
    },
    {
        "id": 4,
        "title": "Another",
        "description": "x",
        "priority": "high",
        "status": "in-progress",
        "category": "Testing",
        "due_date": "2025-04-01",
        "created_at": "2025-03-03",
        "estimated_hours": 0,
        "actual_hours": 0
    }
]"#;
        fs::write(&path, legacy).unwrap();
        let (store, warning) = TaskStore::open(&path);
        assert!(warning.is_none());
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].priority, Priority::Low);
        assert_eq!(store.tasks()[1].status, Status::InProgress);
        assert_eq!(store.next_id(), 5);
    }

    #[test]
    fn stale_watermark_is_raised_above_existing_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        let mut task = sample(7, "Seven", Status::Todo);
        task.created_at = today();
        let body = serde_json::json!({ "next_id": 2, "tasks": [task] });
        fs::write(&path, body.to_string()).unwrap();
        let (store, _) = TaskStore::open(&path);
        assert_eq!(store.next_id(), 8);
    }

    #[test]
    fn add_assigns_sequential_ids_and_defaults() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let first = store.add(new_task("One", Status::Todo), today()).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.category, DEFAULT_CATEGORY);
        assert_eq!(first.created_at, today());
        assert_eq!(first.actual_hours, 0);
        let second = store.add(new_task("Two", Status::Todo), today()).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn add_with_blank_title_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let err = store.add(new_task("  ", Status::Todo), today()).unwrap_err();
        assert!(matches!(err, StoreError::Input(InputError::EmptyTitle)));
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        for title in ["a", "b", "c"] {
            store.add(new_task(title, Status::Todo), today()).unwrap();
        }
        store.delete(1, "yes").unwrap();
        let added = store.add(new_task("d", Status::Todo), today()).unwrap().id;
        assert_eq!(added, 4);
        let ids: Vec<u32> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);

        let reopened = store_in(&dir);
        assert_eq!(reopened.next_id(), 5);
    }

    #[test]
    fn list_filters_by_status_in_order() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("a", Status::Completed), today()).unwrap();
        store.add(new_task("b", Status::Todo), today()).unwrap();
        store.add(new_task("c", Status::Completed), today()).unwrap();

        let done: Vec<&str> = store
            .list(Some(Status::Completed))
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(done, vec!["a", "c"]);
        assert!(store.list(Some(Status::InProgress)).is_empty());
        assert_eq!(store.list(None).len(), 3);
    }

    #[test]
    fn search_matches_title_description_and_category() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("Fix LOGIN bug", Status::Todo), today()).unwrap();
        let mut with_desc = new_task("Refactor", Status::Todo);
        with_desc.description = "touches login flow".into();
        store.add(with_desc, today()).unwrap();
        let mut with_cat = new_task("Audit", Status::Todo);
        with_cat.category = "Login-Security".into();
        store.add(with_cat, today()).unwrap();
        store.add(new_task("Unrelated", Status::Todo), today()).unwrap();

        let hits: Vec<u32> = store.search("Login").unwrap().iter().map(|t| t.id).collect();
        assert_eq!(hits, vec![1, 2, 3]);
        assert!(store.search("nothing here").unwrap().is_empty());
        assert!(matches!(
            store.search("  "),
            Err(StoreError::Input(InputError::EmptyKeyword))
        ));
    }

    #[test]
    fn empty_patch_keeps_fields_but_still_saves() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("Keep me", Status::InProgress), today()).unwrap();
        let before = store.tasks()[0].clone();
        fs::remove_file(store.path()).unwrap();

        let after = store.edit(1, TaskPatch::default()).unwrap().clone();
        assert_eq!(after, before);
        assert!(store.path().exists());
    }

    #[test]
    fn edit_missing_task_reports_not_found_without_saving() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let err = store.edit(9, TaskPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(9)));
        assert!(!store.path().exists());
    }

    #[test]
    fn edit_applies_patch() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("Draft", Status::Todo), today()).unwrap();
        let patch = TaskPatch {
            title: Some("Final".into()),
            status: Some(Status::Completed),
            actual_hours: Some(5),
            ..TaskPatch::default()
        };
        let task = store.edit(1, patch).unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.actual_hours, 5);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn delete_requires_yes() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(new_task("Doomed", Status::Todo), today()).unwrap();

        for answer in ["no", "y", "", "yess"] {
            assert_eq!(store.delete(1, answer).unwrap(), None);
            assert_eq!(store.tasks().len(), 1);
        }
        let removed = store.delete(1, "YES").unwrap().unwrap();
        assert_eq!(removed.title, "Doomed");
        assert!(store.is_empty());
        assert!(store_in(&dir).is_empty());
    }

    fn legacy_task(id: u32, title: &str, estimated: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "description": "",
            "priority": "medium",
            "status": "todo",
            "category": "General",
            "due_date": "",
            "created_at": "2025-03-02",
            "estimated_hours": estimated,
            "actual_hours": 0
        })
    }

    #[test]
    fn add_stops_when_ids_run_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        fs::write(&path, format!(r#"{{"next_id": {}, "tasks": []}}"#, u32::MAX)).unwrap();
        let (mut store, warning) = TaskStore::open(&path);
        assert!(warning.is_none());

        let last = store.add(new_task("Last", Status::Todo), today()).unwrap().id;
        assert_eq!(last, u32::MAX);
        let err = store.add(new_task("One more", Status::Todo), today()).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted));
        assert_eq!(store.tasks().len(), 1);

        let reopened = store_in(&dir);
        assert_eq!(reopened.tasks().len(), 1);
        assert_eq!(reopened.next_id(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn legacy_file_with_max_id_opens_without_overflow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        let legacy = serde_json::json!([legacy_task(u32::MAX, "Huge", 1)]);
        fs::write(&path, legacy.to_string()).unwrap();
        let (mut store, warning) = TaskStore::open(&path);
        assert!(warning.is_none());
        assert_eq!(store.tasks().len(), 1);
        assert!(matches!(
            store.add(new_task("Next", Status::Todo), today()),
            Err(StoreError::IdsExhausted)
        ));
    }

    #[test]
    fn legacy_negative_hours_keep_the_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        let legacy = serde_json::json!([legacy_task(1, "Fine", 4), legacy_task(2, "Odd", -3)]);
        fs::write(&path, legacy.to_string()).unwrap();

        let (store, warning) = TaskStore::open(&path);
        assert!(warning.is_none());
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].estimated_hours, 4);
        assert_eq!(store.tasks()[1].estimated_hours, 0);

        store.save().unwrap();
        assert_eq!(store_in(&dir).tasks().len(), 2);
    }

    #[test]
    fn malformed_warning_points_at_the_problem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        fs::write(&path, "{\n    \"next_id\": 2,\n    \"tasks\": [ { \"id\": \"one\" } ]\n}").unwrap();
        let (_, warning) = TaskStore::open(&path);
        let message = warning.unwrap().to_string();
        assert!(message.contains("line 3"), "{message}");
        assert!(!message.contains("untagged"), "{message}");

        fs::write(&path, "[ { \"id\": 1 } ]").unwrap();
        let (_, warning) = TaskStore::open(&path);
        let message = warning.unwrap().to_string();
        assert!(message.contains("missing field"), "{message}");
    }

    #[test]
    fn duplicate_legacy_ids_are_renumbered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE);
        let legacy = serde_json::json!([
            legacy_task(1, "a", 0),
            legacy_task(2, "b", 0),
            legacy_task(2, "c", 0),
        ]);
        fs::write(&path, legacy.to_string()).unwrap();

        let (mut store, warning) = TaskStore::open(&path);
        assert!(warning.is_none());
        let ids: Vec<u32> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.next_id(), 4);

        let removed = store.delete(3, "yes").unwrap().unwrap();
        assert_eq!(removed.title, "c");
        assert_eq!(store.get(2).unwrap().title, "b");
    }

    #[test]
    fn delete_missing_task_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        assert!(matches!(store.delete(3, "yes"), Err(StoreError::NotFound(3))));
    }
}
