//! Remote task service abstraction.
//!
//! Defines the [`RemoteTaskService`] trait the reconciler talks to. The
//! service owns the authoritative task collection; the board only ever sees
//! it through these four calls. Implementations include:
//! - [`simulated::SimulatedRemote`]: in-process service with failure
//!   injection, used by the binary and the tests

pub mod simulated;

use std::future::Future;

use sprintboard_proto::task::{NewTask, Task, TaskId, TaskStatus};

/// Errors a remote call can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The referenced task does not exist on the service (404).
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The service answered with a non-success status.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP-style status code.
        status: u16,
        /// Message from the error body.
        message: String,
    },

    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Whether the error is a 404-equivalent rather than a transient fault.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::NotFound(_) => false,
            Self::Server { status, .. } => *status >= 500,
            Self::Transport(_) => true,
        }
    }
}

/// Async client for the remote task collection.
///
/// Every method is a single request; none of them retry. `update_status` and
/// `delete` are idempotent from the client's point of view, `create` is not:
/// each successful call adds a new record, so callers must never repeat a
/// failed create on their own.
pub trait RemoteTaskService: Send + Sync {
    /// Fetch every task, in the service's order.
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, RemoteError>> + Send;

    /// Create a task. The service assigns the id and sets `status = todo`.
    fn create(&self, new: &NewTask) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    /// Move a task to another column, returning the updated record.
    fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    /// Remove a task, returning the removed record.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<Task, RemoteError>> + Send;
}
