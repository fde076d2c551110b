//! Client-side task collection and its filtered view.
//!
//! [`TaskStore`] is the ordered list the board renders from. Reads are public;
//! every write is crate-private so that only the reconciler can mutate it and
//! there is exactly one owner of the last known-good state. Each write bumps a
//! revision counter, which [`VisibleSet`] uses to memoize the filtered view.

use std::collections::HashMap;
use std::sync::Arc;

use sprintboard_proto::task::{Priority, Task, TaskId, TaskStatus};

/// Priority half of the board filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PriorityFilter {
    /// Show every priority.
    #[default]
    All,
    /// Show only tasks with this priority.
    Only(Priority),
}

impl PriorityFilter {
    /// Whether a task with `priority` passes the filter.
    #[must_use]
    pub fn admits(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == priority,
        }
    }
}

impl std::str::FromStr for PriorityFilter {
    type Err = sprintboard_proto::task::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

impl std::fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(p) => write!(f, "{p}"),
        }
    }
}

/// Search text plus priority filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    /// Case-insensitive substring matched against titles.
    pub search: String,
    /// Priority restriction.
    pub priority: PriorityFilter,
}

impl FilterState {
    /// Builds a filter from its two parts.
    pub fn new(search: impl Into<String>, priority: PriorityFilter) -> Self {
        Self {
            search: search.into(),
            priority,
        }
    }

    /// Whether `task` belongs to the visible set under this filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if !self.priority.admits(task.priority) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || task.title.to_lowercase().contains(&needle)
    }
}

/// Immutable copy of the collection taken before an optimistic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    tasks: Arc<[Task]>,
}

impl Snapshot {
    /// Tasks as they were when the snapshot was taken.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the snapshot holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Ordered collection of tasks, newest first.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    revision: u64,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            revision: 0,
        }
    }

    /// Replaces the whole collection, e.g. after the initial fetch.
    pub fn load(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.bump();
    }

    /// All tasks in store order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    /// Whether a task with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Monotonic counter bumped by every write.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Id → column mapping, the observable state rollback must preserve.
    #[must_use]
    pub fn status_map(&self) -> HashMap<TaskId, TaskStatus> {
        self.tasks.iter().map(|t| (t.id.clone(), t.status)).collect()
    }

    /// Tasks passing `filter`, in store order.
    ///
    /// Lazy and side-effect free; calling it again yields the same sequence
    /// as long as the store has not been written to.
    pub fn query<'a>(&'a self, filter: &'a FilterState) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    /// Takes an immutable copy of the current collection.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.iter().cloned().collect(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: &Snapshot) {
        self.tasks = snapshot.tasks.to_vec();
        self.bump();
    }

    /// Moves a task, returning its previous column.
    pub(crate) fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Option<TaskStatus> {
        let task = self.tasks.iter_mut().find(|t| t.id == *id)?;
        let previous = std::mem::replace(&mut task.status, status);
        self.bump();
        Some(previous)
    }

    pub(crate) fn prepend(&mut self, task: Task) {
        self.tasks.insert(0, task);
        self.bump();
    }

    /// Swaps the task `id` for `task` at the same position.
    ///
    /// Returns `false` without touching the store if `id` is gone.
    pub(crate) fn replace(&mut self, id: &TaskId, task: Task) -> bool {
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == *id) else {
            return false;
        };
        *slot = task;
        self.bump();
        true
    }

    pub(crate) fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == *id)?;
        let removed = self.tasks.remove(idx);
        self.bump();
        Some(removed)
    }

    const fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Memoized visible set.
///
/// Recomputes only when the store revision or the filter differs from the
/// last call.
#[derive(Debug, Default)]
pub struct VisibleSet {
    key: Option<(u64, FilterState)>,
    tasks: Vec<Task>,
    recomputations: usize,
}

impl VisibleSet {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible tasks for `store` under `filter`.
    pub fn get(&mut self, store: &TaskStore, filter: &FilterState) -> &[Task] {
        let fresh = self
            .key
            .as_ref()
            .is_some_and(|(rev, f)| *rev == store.revision() && f == filter);
        if !fresh {
            self.tasks = store.query(filter).cloned().collect();
            self.key = Some((store.revision(), filter.clone()));
            self.recomputations += 1;
        }
        &self.tasks
    }

    /// How many times the set has been rebuilt.
    #[must_use]
    pub const fn recomputations(&self) -> usize {
        self.recomputations
    }
}
