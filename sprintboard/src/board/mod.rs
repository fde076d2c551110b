//! Optimistic board state.
//!
//! The [`Reconciler`] owns the [`TaskStore`] and the single undo slot. Every
//! user action is applied locally first, sent to the remote service second,
//! and rolled back to a snapshot if the service refuses it. Renderers observe
//! the board through [`BoardEvent`]s and read-only accessors; they never write
//! to the store.

pub mod reconciler;
pub mod store;
pub mod undo;

use std::fmt;

use sprintboard_proto::task::{TaskId, ValidationError};

use crate::remote::RemoteError;

pub use reconciler::{LoadState, Reconciler};
pub use store::{FilterState, PriorityFilter, Snapshot, TaskStore, VisibleSet};
pub use undo::{PendingUndo, UNDO_WINDOW, UndoSlot};

/// The user action a failed remote call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailedAction {
    /// Initial fetch of the board.
    Load,
    /// Moving a task to another column.
    Update,
    /// Creating a task.
    Create,
    /// Deleting a task.
    Delete,
    /// Sending an undone move back to the service.
    Revert,
}

impl FailedAction {
    /// Notification text shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Load => "Failed to load tasks.",
            Self::Update => "Failed to update task on server. Reverting change.",
            Self::Create => "Failed to create task on server.",
            Self::Delete => "Failed to delete task on server.",
            Self::Revert => "Failed to revert move on server.",
        }
    }
}

impl fmt::Display for FailedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A failure the user has to be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What failed.
    pub action: FailedAction,
    /// Why the service refused it.
    pub cause: RemoteError,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action.message())
    }
}

/// Why an undo offer went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoEnd {
    /// The window closed.
    Expired,
    /// The user undid the move.
    Used,
    /// A newer move took the slot.
    Superseded,
    /// The move itself was rolled back.
    RolledBack,
}

/// Notifications emitted by the [`Reconciler`] for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The store was written to; re-read and re-render.
    Changed {
        /// Store revision after the write.
        revision: u64,
    },
    /// The initial fetch finished.
    Loaded {
        /// Number of tasks fetched.
        count: usize,
    },
    /// The initial fetch failed; the board shows an error instead.
    LoadFailed {
        /// Error text to display.
        message: String,
    },
    /// A move can be undone.
    UndoOffered {
        /// The moved task.
        task_id: TaskId,
    },
    /// The undo offer for a move is gone.
    UndoWithdrawn {
        /// The moved task.
        task_id: TaskId,
        /// What ended it.
        reason: UndoEnd,
    },
    /// A remote call failed and the user should be told.
    Notice(Notice),
}

/// Errors returned by reconciler operations.
///
/// By the time one of these is returned the local store has already been
/// rolled back where the protocol calls for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The create payload was rejected before anything happened.
    #[error("invalid task: {0}")]
    Validation(#[from] ValidationError),

    /// The initial fetch failed.
    #[error("failed to load tasks: {0}")]
    Load(#[source] RemoteError),

    /// A move was refused and rolled back.
    #[error("failed to update task on server, reverting: {0}")]
    Update(#[source] RemoteError),

    /// A create was refused and the placeholder removed.
    #[error("failed to create task on server: {0}")]
    Create(#[source] RemoteError),

    /// A delete was refused and the task restored.
    #[error("failed to delete task on server: {0}")]
    Delete(#[source] RemoteError),

    /// An undo was applied locally but the service kept the moved state.
    #[error("failed to revert move on server: {0}")]
    Revert(#[source] RemoteError),
}

impl BoardError {
    /// The remote failure behind this error, if any.
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Validation(_) => None,
            Self::Load(e) | Self::Update(e) | Self::Create(e) | Self::Delete(e) | Self::Revert(e) => {
                Some(e)
            }
        }
    }

    /// The action that failed remotely, if any.
    #[must_use]
    pub const fn action(&self) -> Option<FailedAction> {
        match self {
            Self::Validation(_) => None,
            Self::Load(_) => Some(FailedAction::Load),
            Self::Update(_) => Some(FailedAction::Update),
            Self::Create(_) => Some(FailedAction::Create),
            Self::Delete(_) => Some(FailedAction::Delete),
            Self::Revert(_) => Some(FailedAction::Revert),
        }
    }
}
