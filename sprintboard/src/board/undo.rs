//! Single-slot, time-boxed undo for column moves.
//!
//! The slot holds at most one [`UndoEntry`]. Arming a new entry drops the old
//! one, and dropping an entry drops its [`ExpiryTimer`], which aborts the
//! pending expiry task. Every way an entry can leave the slot therefore
//! cancels its timer synchronously, and a timer that fires anyway only clears
//! the entry whose generation it was created for.

use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use sprintboard_proto::task::{TaskId, TaskStatus};

use super::store::Snapshot;

/// How long a move stays undoable.
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);

/// Abort-on-drop handle to a spawned expiry task.
#[derive(Debug)]
pub struct ExpiryTimer(AbortHandle);

impl ExpiryTimer {
    pub(crate) const fn new(handle: AbortHandle) -> Self {
        Self(handle)
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A move that can still be reverted.
#[derive(Debug)]
pub struct UndoEntry {
    generation: u64,
    task_id: TaskId,
    previous_status: TaskStatus,
    snapshot: Snapshot,
    expires_at: Instant,
    timer: Option<ExpiryTimer>,
}

impl UndoEntry {
    /// The moved task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Column the task was in before the move.
    #[must_use]
    pub const fn previous_status(&self) -> TaskStatus {
        self.previous_status
    }

    /// Whether the undo window has closed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Cancels the timer and hands back what a revert needs.
    pub(crate) fn into_parts(self) -> (TaskId, TaskStatus, Snapshot) {
        let Self {
            task_id,
            previous_status,
            snapshot,
            timer,
            ..
        } = self;
        drop(timer);
        (task_id, previous_status, snapshot)
    }
}

/// Read-only view of the live entry, for rendering the undo affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUndo {
    /// The moved task.
    pub task_id: TaskId,
    /// Column an undo would put it back in.
    pub previous_status: TaskStatus,
    /// When the entry stops being undoable.
    pub expires_at: Instant,
}

/// Holder for the single live undo entry.
#[derive(Debug, Default)]
pub struct UndoSlot {
    entry: Option<UndoEntry>,
    next_generation: u64,
}

impl UndoSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new entry, discarding (and cancelling) any previous one.
    ///
    /// Returns the new entry's generation and the entry it superseded.
    pub(crate) fn arm(
        &mut self,
        task_id: TaskId,
        previous_status: TaskStatus,
        snapshot: Snapshot,
        expires_at: Instant,
    ) -> (u64, Option<UndoEntry>) {
        self.next_generation = self.next_generation.wrapping_add(1);
        let generation = self.next_generation;
        let superseded = self.entry.replace(UndoEntry {
            generation,
            task_id,
            previous_status,
            snapshot,
            expires_at,
            timer: None,
        });
        (generation, superseded)
    }

    /// Attaches the expiry timer to the entry of `generation`.
    ///
    /// If that entry is already gone the timer is dropped, which aborts it.
    pub(crate) fn attach_timer(&mut self, generation: u64, timer: ExpiryTimer) {
        if let Some(entry) = self.entry.as_mut().filter(|e| e.generation == generation) {
            entry.timer = Some(timer);
        }
    }

    /// Removes the entry only if it is still the one of `generation`.
    pub(crate) fn discard_if(&mut self, generation: u64) -> Option<UndoEntry> {
        if self.entry.as_ref()?.generation == generation {
            self.entry.take()
        } else {
            None
        }
    }

    /// Removes whatever entry is live.
    pub(crate) fn take(&mut self) -> Option<UndoEntry> {
        self.entry.take()
    }

    /// Describes the live entry, if any.
    #[must_use]
    pub fn pending(&self) -> Option<PendingUndo> {
        self.entry.as_ref().map(|e| PendingUndo {
            task_id: e.task_id.clone(),
            previous_status: e.previous_status,
            expires_at: e.expires_at,
        })
    }

    /// Whether an entry is live and unexpired at `now`.
    #[must_use]
    pub fn is_available(&self, now: Instant) -> bool {
        self.entry.as_ref().is_some_and(|e| !e.is_expired(now))
    }
}
