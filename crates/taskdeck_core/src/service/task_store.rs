//! Task list store: the single owner of in-memory task state.
//!
//! # Responsibility
//! - Provide create/update/toggle/delete/restore/reorder use-cases.
//! - Keep the in-memory snapshot in sync with the repository through an
//!   explicit write-then-reload cycle.
//! - Serve filtered and sorted views from immutable snapshots.
//!
//! # Invariants
//! - Mutations are serialized by one mutex that also guards the repository.
//! - The snapshot only ever changes by a successful `fetch_all`; a failed
//!   write or reload leaves it as it was.
//! - `reorder` persists all changed positions in one transaction.
//! - The store keeps no trash; callers hold deleted records for undo.

use crate::model::task::{Priority, Task, TaskId, TaskValidationError};
use crate::repo::task_repo::{PendingChange, RepoError, TaskRepository, TaskSortKey};
use crate::service::task_view::{
    sorted_tasks, FilteredTasks, SortCriterion, TaskFilter, TaskProgress,
};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Caller input rejected before touching the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Title is empty after trimming.
    BlankTitle,
    /// Reorder list does not cover every active task exactly once.
    ReorderLengthMismatch { expected: usize, actual: usize },
    DuplicateId(TaskId),
    UnknownId(TaskId),
    /// Move offset or destination outside the current list.
    OffsetOutOfRange { offset: usize, len: usize },
    /// Record handed to `restore` fails model validation.
    InvalidTask(TaskValidationError),
}

impl Display for InvalidArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::ReorderLengthMismatch { expected, actual } => write!(
                f,
                "reorder expects {expected} task ids, got {actual}"
            ),
            Self::DuplicateId(id) => write!(f, "reorder lists task {id} more than once"),
            Self::UnknownId(id) => write!(f, "reorder lists unknown task {id}"),
            Self::OffsetOutOfRange { offset, len } => {
                write!(f, "offset {offset} is out of range for {len} tasks")
            }
            Self::InvalidTask(err) => write!(f, "{err}"),
        }
    }
}

/// Errors from task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Repository read or write failed.
    Storage(RepoError),
    NotFound(TaskId),
    /// Restore collided with an existing task id.
    Conflict(TaskId),
    InvalidArgument(InvalidArgument),
    /// A thread panicked while holding the store lock.
    Poisoned,
    /// A write succeeded but its read-back did not show the record.
    InconsistentState(&'static str),
}

impl StoreError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Poisoned => "poisoned",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "task storage failed: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Conflict(id) => write!(f, "task already exists: {id}"),
            Self::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            Self::Poisoned => write!(f, "task store lock poisoned"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Conflict(id) => Self::Conflict(id),
            RepoError::Validation(err) => Self::InvalidArgument(InvalidArgument::InvalidTask(err)),
            other => Self::Storage(other),
        }
    }
}

impl From<InvalidArgument> for StoreError {
    fn from(value: InvalidArgument) -> Self {
        Self::InvalidArgument(value)
    }
}

/// Editable task fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    /// Empty text is stored as `None`.
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_date(mut self, due_date_ms: i64) -> Self {
        self.due_date = Some(due_date_ms);
        self
    }

    fn apply_to(self, task: &mut Task) {
        task.title = self.title;
        task.description = self.description.filter(|text| !text.is_empty());
        task.priority = self.priority;
        task.due_date = self.due_date;
    }
}

struct StoreState<R> {
    repo: R,
    tasks: Arc<[Task]>,
}

impl<R: TaskRepository> StoreState<R> {
    fn reload(&mut self) -> StoreResult<()> {
        let tasks = self.repo.fetch_all(TaskSortKey::Position, true)?;
        self.tasks = tasks.into();
        Ok(())
    }

    fn find(&self, id: TaskId) -> StoreResult<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn read_back(&self, id: TaskId, details: &'static str) -> StoreResult<Task> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(StoreError::InconsistentState(details))
    }

    fn reorder(&mut self, ordered_ids: &[TaskId]) -> StoreResult<usize> {
        let changes = plan_reorder(&self.tasks, ordered_ids)?;
        if !changes.is_empty() {
            self.repo.save_transaction(&changes)?;
        }
        self.reload()?;
        Ok(changes.len())
    }
}

/// Single-writer task list over a `TaskRepository`.
pub struct TaskStore<R: TaskRepository> {
    state: Mutex<StoreState<R>>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Creates an empty store; call `load` to read persisted tasks.
    pub fn new(repo: R) -> Self {
        Self {
            state: Mutex::new(StoreState {
                repo,
                tasks: Arc::from(Vec::new()),
            }),
        }
    }

    /// Creates a store and loads persisted tasks.
    pub fn open(repo: R) -> StoreResult<Self> {
        let store = Self::new(repo);
        store.load()?;
        Ok(store)
    }

    /// Replaces the snapshot with all tasks ordered by position.
    ///
    /// On failure the previous snapshot is kept.
    pub fn load(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|mut state| {
            state.reload()?;
            Ok(state.tasks.len())
        });
        match &result {
            Ok(count) => debug!(
                "event=task_load module=store status=ok count={count} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=task_load module=store status=error error_code={} error={err}",
                err.code()
            ),
        }
        result.map(|_| ())
    }

    /// Creates a pending task at the end of the manual order.
    ///
    /// # Errors
    /// - `InvalidArgument(BlankTitle)` when the title is blank.
    /// - `Storage` when the insert or reload fails; the snapshot is unchanged.
    pub fn create(&self, draft: TaskDraft) -> StoreResult<Task> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|mut state| {
            let title = draft.title.trim().to_string();
            if title.is_empty() {
                return Err(InvalidArgument::BlankTitle.into());
            }

            let mut task = Task::new(String::new(), state.tasks.len() as i64);
            TaskDraft { title, ..draft }.apply_to(&mut task);

            state.repo.insert(&task)?;
            state.reload()?;
            state.read_back(task.id, "created task missing after reload")
        });
        log_outcome("task_create", started_at, &result);
        result
    }

    /// Overwrites title, description, priority and due date.
    ///
    /// Completion and position are left untouched.
    pub fn update(&self, id: TaskId, draft: TaskDraft) -> StoreResult<Task> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|mut state| {
            let mut task = state.find(id)?.clone();
            draft.apply_to(&mut task);
            state.repo.update(&task)?;
            state.reload()?;
            state.read_back(id, "updated task missing after reload")
        });
        log_outcome("task_update", started_at, &result);
        result
    }

    /// Flips completion state and returns the stored record.
    pub fn toggle_completion(&self, id: TaskId) -> StoreResult<Task> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|mut state| {
            let mut task = state.find(id)?.clone();
            task.toggle_completion();
            state.repo.update(&task)?;
            state.reload()?;
            state.read_back(id, "toggled task missing after reload")
        });
        log_outcome("task_toggle", started_at, &result);
        result
    }

    /// Removes a task and returns the removed record.
    ///
    /// Keep the returned record to offer a one-step `restore`. Remaining
    /// positions are not compacted.
    pub fn delete(&self, id: TaskId) -> StoreResult<Task> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|mut state| {
            let removed = state.find(id)?.clone();
            state.repo.delete(id)?;
            state.reload()?;
            Ok(removed)
        });
        log_outcome("task_delete", started_at, &result);
        result
    }

    /// Re-inserts a previously deleted record unchanged.
    ///
    /// # Errors
    /// - `Conflict` when a task with the same id exists.
    /// - `InvalidArgument(InvalidTask)` when the record fails validation.
    pub fn restore(&self, task: Task) -> StoreResult<()> {
        let started_at = Instant::now();
        let id = task.id;
        let result = self.lock().and_then(|mut state| {
            if state.tasks.iter().any(|existing| existing.id == id) {
                return Err(StoreError::Conflict(id));
            }
            state.repo.insert(&task)?;
            state.reload()
        });
        log_outcome("task_restore", started_at, &result);
        result
    }

    /// Assigns `position = index` following `ordered_ids`.
    ///
    /// `ordered_ids` must be a permutation of every active task id. Changed
    /// positions are written in one transaction.
    pub fn reorder(&self, ordered_ids: &[TaskId]) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self
            .lock()
            .and_then(|mut state| state.reorder(ordered_ids));
        match &result {
            Ok(changed) => info!(
                "event=task_reorder module=store status=ok changed={changed} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=task_reorder module=store status=error error_code={} error={err}",
                err.code()
            ),
        }
        result.map(|_| ())
    }

    /// Moves the tasks at `offsets` so they land before `destination`.
    ///
    /// Offsets index the position-ordered list. `destination` is an index in
    /// that same list before removal and may equal its length (move to end).
    pub fn move_tasks(&self, offsets: &[usize], destination: usize) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.lock().and_then(|mut state| {
            let ordered_ids = plan_move(&state.tasks, offsets, destination)?;
            state.reorder(&ordered_ids)
        });
        log_outcome("task_move", started_at, &result);
        result.map(|_| ())
    }

    /// Current snapshot ordered by position.
    pub fn snapshot(&self) -> StoreResult<Arc<[Task]>> {
        Ok(Arc::clone(&self.lock()?.tasks))
    }

    /// Owned copy of the current tasks ordered by position.
    pub fn tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(self.snapshot()?.to_vec())
    }

    pub fn get(&self, id: TaskId) -> StoreResult<Task> {
        self.lock()?.find(id).cloned()
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.tasks.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Lazy view of the snapshot matching `filter`.
    pub fn filtered(&self, filter: TaskFilter) -> StoreResult<FilteredTasks> {
        Ok(FilteredTasks::new(self.snapshot()?, filter))
    }

    /// All tasks reordered by `criterion`.
    pub fn sorted(&self, criterion: SortCriterion) -> StoreResult<Vec<Task>> {
        self.view(TaskFilter::All, criterion)
    }

    /// Tasks matching `filter`, reordered by `criterion`.
    pub fn view(&self, filter: TaskFilter, criterion: SortCriterion) -> StoreResult<Vec<Task>> {
        let view = self.filtered(filter)?;
        Ok(sorted_tasks(view.iter().cloned(), criterion))
    }

    pub fn progress(&self) -> StoreResult<TaskProgress> {
        Ok(TaskProgress::from_tasks(self.snapshot()?.iter()))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreState<R>>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn plan_reorder(tasks: &[Task], ordered_ids: &[TaskId]) -> StoreResult<Vec<PendingChange>> {
    if ordered_ids.len() != tasks.len() {
        return Err(InvalidArgument::ReorderLengthMismatch {
            expected: tasks.len(),
            actual: ordered_ids.len(),
        }
        .into());
    }

    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id, task)).collect();
    let mut seen = HashSet::with_capacity(ordered_ids.len());
    let mut changes = Vec::new();

    for (index, id) in ordered_ids.iter().enumerate() {
        let task = by_id.get(id).ok_or(InvalidArgument::UnknownId(*id))?;
        if !seen.insert(*id) {
            return Err(InvalidArgument::DuplicateId(*id).into());
        }

        let position = index as i64;
        if task.position != position {
            let mut moved = (*task).clone();
            moved.position = position;
            changes.push(PendingChange::Update(moved));
        }
    }

    Ok(changes)
}

fn plan_move(tasks: &[Task], offsets: &[usize], destination: usize) -> StoreResult<Vec<TaskId>> {
    let len = tasks.len();
    let offsets: BTreeSet<usize> = offsets.iter().copied().collect();
    if let Some(&offset) = offsets.iter().find(|&&offset| offset >= len) {
        return Err(InvalidArgument::OffsetOutOfRange { offset, len }.into());
    }
    if destination > len {
        return Err(InvalidArgument::OffsetOutOfRange {
            offset: destination,
            len,
        }
        .into());
    }

    let (moving, remaining): (Vec<_>, Vec<_>) = tasks
        .iter()
        .enumerate()
        .partition(|(index, _)| offsets.contains(index));
    let insert_at = destination - offsets.range(..destination).count();
    let (before, after) = remaining.split_at(insert_at);

    Ok(before
        .iter()
        .chain(&moving)
        .chain(after)
        .map(|(_, task)| task.id)
        .collect())
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &StoreResult<T>) {
    match result {
        Ok(_) => info!(
            "event={event} module=store status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=store status=error duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
}
