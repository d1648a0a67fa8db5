// Task list state: the full set, the current view, and the edit draft

use crate::blob::BlobStore;
use crate::filter::Filter;
use crate::record::Record;
use crate::task::{IdGenerator, Priority, Task, TaskDraft, UuidGenerator};
use eyre::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Owns every task and mirrors the full set into a blob store after each mutation
///
/// The current view is a list of ids into the full set. Filtering only
/// rebuilds the view; sorting reorders (and persists) the full set itself.
pub struct TaskStore<B: BlobStore, G: IdGenerator = UuidGenerator> {
    blobs: B,
    ids: G,
    tasks: Vec<Task>,
    view: Vec<String>,
    filters: Vec<Filter>,
    draft: Option<TaskDraft>,
}

impl<B: BlobStore, G: IdGenerator + Default> TaskStore<B, G> {
    /// Load the task list from `blobs`
    ///
    /// A missing or unparsable value starts an empty list; entries that
    /// don't parse as tasks are skipped.
    pub fn open(blobs: B) -> Result<Self> {
        Self::open_with_ids(blobs, G::default())
    }
}

impl<B: BlobStore, G: IdGenerator> TaskStore<B, G> {
    pub fn open_with_ids(blobs: B, ids: G) -> Result<Self> {
        let tasks = load_tasks(&blobs)?;
        let view = tasks.iter().map(|t| t.id.clone()).collect();

        info!(count = tasks.len(), "Loaded task list");

        Ok(Self {
            blobs,
            ids,
            tasks,
            view,
            filters: Vec::new(),
            draft: None,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The full set, in stored order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The current view, in display order
    pub fn view(&self) -> Vec<&Task> {
        let by_id: HashMap<&str, &Task> = self.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        self.view.iter().filter_map(|id| by_id.get(id.as_str()).copied()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks whose id starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.id.starts_with(prefix)).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Filters the current view was built from; empty when showing everything
    pub fn active_filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    // ========================================================================
    // Mutations (persisted)
    // ========================================================================

    /// Create a task and append it to the full set and the current view
    ///
    /// Inputs are taken as-is; an empty description is a valid task.
    pub fn add(
        &mut self,
        description: impl Into<String>,
        priority: Priority,
        due_date: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<String> {
        let id = self.fresh_id();
        let task = Task {
            id: id.clone(),
            description: description.into(),
            priority,
            due_date: due_date.into(),
            is_completed: false,
            color: color.into(),
        };

        info!(id = %task.id, priority = %task.priority, "Adding task");
        self.tasks.push(task);
        self.view.push(id.clone());
        self.persist()?;

        Ok(id)
    }

    /// Write the draft's fields back onto its task and clear the draft
    ///
    /// Id and completion state are left alone. Nothing happens without a
    /// draft or when its task has since been deleted.
    pub fn commit_edit(&mut self) -> Result<()> {
        let Some(draft) = self.draft.take() else {
            debug!("commit_edit: no draft");
            return Ok(());
        };

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == draft.id) else {
            debug!(id = %draft.id, "commit_edit: task not found");
            return Ok(());
        };

        task.description = draft.description;
        task.priority = draft.priority;
        task.due_date = draft.due_date;
        task.color = draft.color;

        info!(id = %draft.id, "Saved task edit");
        self.persist()
    }

    /// Remove a task from the full set and the current view
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let Some(pos) = self.position(id) else {
            debug!(id, "delete: task not found");
            return Ok(());
        };

        self.tasks.remove(pos);
        self.view.retain(|v| v != id);
        if self.is_editing(id) {
            self.draft = None;
        }

        info!(id, "Deleted task");
        self.persist()
    }

    pub fn toggle_completion(&mut self, id: &str) -> Result<()> {
        let Some(pos) = self.position(id) else {
            debug!(id, "toggle_completion: task not found");
            return Ok(());
        };

        let task = &mut self.tasks[pos];
        task.is_completed = !task.is_completed;

        debug!(id, completed = task.is_completed, "Toggled task");
        self.persist()
    }

    /// Stable ascending sort of the full set by due date, then persist it
    ///
    /// Empty or unparsable dates come first. The current view keeps its
    /// membership and follows the new order.
    pub fn sort_by_due_date(&mut self) -> Result<()> {
        self.tasks.sort_by_key(|t| t.due());

        let order: HashMap<&str, usize> = self.tasks.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
        self.view.sort_by_key(|id| order.get(id.as_str()).copied().unwrap_or(usize::MAX));

        debug!(count = self.tasks.len(), "Sorted tasks by due date");
        self.persist()
    }

    // ========================================================================
    // Draft handling (not persisted)
    // ========================================================================

    /// Load a task into the draft; returns false (and leaves any draft alone)
    /// when the id is unknown
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(draft) = self.get(id).map(TaskDraft::from) else {
            debug!(id, "begin_edit: task not found");
            return false;
        };

        self.draft = Some(draft);
        true
    }

    pub fn draft(&self) -> Option<&TaskDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.draft.as_mut()
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.draft.as_ref().is_some_and(|d| d.id == id)
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    // ========================================================================
    // View handling (not persisted)
    // ========================================================================

    pub fn filter_by_priority(&mut self, priority: Priority) {
        self.apply_filters(vec![Filter::equals("priority", priority.as_str())]);
    }

    /// Replace the current view with the full-set tasks matching every filter
    pub fn apply_filters(&mut self, filters: Vec<Filter>) {
        self.view = self
            .tasks
            .iter()
            .filter(|t| Filter::all_match(&filters, *t))
            .map(|t| t.id.clone())
            .collect();

        debug!(filters = filters.len(), shown = self.view.len(), "Applied view filters");
        self.filters = filters;
    }

    pub fn show_all(&mut self) {
        self.view = self.tasks.iter().map(|t| t.id.clone()).collect();
        self.filters.clear();
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = self.ids.next_id();
            if self.position(&id).is_none() {
                return id;
            }
            warn!(id = %id, "Generated id already in use, drawing another");
        }
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.blobs
            .set(Task::collection_name(), &json)
            .context("Failed to persist tasks")?;
        Ok(())
    }
}

/// Read the full set from storage, falling back to empty on bad data
fn load_tasks<B: BlobStore>(blobs: &B) -> Result<Vec<Task>> {
    let key = Task::collection_name();

    let Some(raw) = blobs.get(key).context("Failed to read tasks from storage")? else {
        debug!(key, "No stored tasks yet");
        return Ok(Vec::new());
    };

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(key, error = ?e, "Failed to parse stored tasks, starting empty");
            return Ok(Vec::new());
        }
    };

    // Skip bad entries; keep the first of any duplicated ids
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let task: Task = match serde_json::from_value(entry) {
            Ok(t) => t,
            Err(e) => {
                warn!(key, index, error = ?e, "Failed to parse stored task, skipping");
                continue;
            }
        };

        if seen.insert(task.id.clone()) {
            tasks.push(task);
        } else {
            warn!(id = %task.id, "Duplicate task id in storage, skipping");
        }
    }

    Ok(tasks)
}
