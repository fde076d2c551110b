//! Optimistic-update protocol between the local store and the remote service.
//!
//! Each operation follows the same shape:
//! 1. Lock the board state, snapshot it, apply the change, unlock.
//! 2. Emit [`BoardEvent::Changed`] so renderers redraw immediately.
//! 3. Await the remote call (the only suspension point).
//! 4. On failure, restore the snapshot and emit a [`Notice`].
//!
//! The state lock is never held across an await. Remote calls are not
//! sequenced against each other: if two moves are in flight and the older one
//! fails after the newer one was applied, the older snapshot wins.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::Instant;

use sprintboard_proto::task::{NewTask, Task, TaskId, TaskStatus};

use crate::remote::{RemoteError, RemoteTaskService};

use super::store::{FilterState, Snapshot, TaskStore};
use super::undo::{ExpiryTimer, PendingUndo, UNDO_WINDOW, UndoSlot};
use super::{BoardError, BoardEvent, FailedAction, Notice, UndoEnd};

/// Whether the initial fetch has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Fetch not finished yet.
    #[default]
    Loading,
    /// Board is populated.
    Ready,
    /// Fetch failed; the message replaces the board.
    Failed(String),
}

#[derive(Debug, Default)]
struct BoardState {
    store: TaskStore,
    undo: UndoSlot,
    load: LoadState,
}

/// State shared with spawned expiry timers.
struct Shared {
    state: Mutex<BoardState>,
    events: broadcast::Sender<BoardEvent>,
}

impl Shared {
    fn emit(&self, event: BoardEvent) {
        // No subscribers is fine; nothing is rendering.
        let _ = self.events.send(event);
    }

    fn expire_undo(&self, generation: u64) {
        let expired = self.state.lock().undo.discard_if(generation);
        if let Some(entry) = expired {
            tracing::debug!(task_id = %entry.task_id(), "undo window closed");
            self.emit(BoardEvent::UndoWithdrawn {
                task_id: entry.task_id().clone(),
                reason: UndoEnd::Expired,
            });
        }
    }
}

/// Mediates every mutation of the board.
///
/// Owns the [`TaskStore`] and the undo slot; the renderer subscribes to
/// [`BoardEvent`]s and reads through [`read`](Self::read).
pub struct Reconciler<R: RemoteTaskService> {
    remote: R,
    shared: Arc<Shared>,
}

impl<R: RemoteTaskService> Reconciler<R> {
    /// Creates an empty board talking to `remote`.
    ///
    /// `event_buffer` bounds how many events a slow subscriber may lag
    /// behind before it starts missing them.
    pub fn new(remote: R, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            remote,
            shared: Arc::new(Shared {
                state: Mutex::new(BoardState::default()),
                events,
            }),
        }
    }

    /// The remote service this board talks to.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Subscribes to board notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.shared.events.subscribe()
    }

    /// Runs `f` against the current store.
    pub fn read<T>(&self, f: impl FnOnce(&TaskStore) -> T) -> T {
        f(&self.shared.state.lock().store)
    }

    /// Copy of every task in store order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.read(|store| store.tasks().to_vec())
    }

    /// Current column of a task.
    #[must_use]
    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.read(|store| store.get(id).map(|t| t.status))
    }

    /// The visible set under `filter`.
    #[must_use]
    pub fn visible(&self, filter: &FilterState) -> Vec<Task> {
        self.read(|store| store.query(filter).cloned().collect())
    }

    /// Progress of the initial fetch.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.shared.state.lock().load.clone()
    }

    /// The live undo entry, if it has not expired.
    #[must_use]
    pub fn pending_undo(&self) -> Option<PendingUndo> {
        let state = self.shared.state.lock();
        if state.undo.is_available(Instant::now()) {
            state.undo.pending()
        } else {
            None
        }
    }

    /// Fetches the board from the service, replacing the local collection.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Load`] if the service call fails; the board is
    /// then in [`LoadState::Failed`].
    pub async fn load(&self) -> Result<usize, BoardError> {
        self.shared.state.lock().load = LoadState::Loading;
        match self.remote.list().await {
            Ok(tasks) => {
                let count = tasks.len();
                let revision = {
                    let mut state = self.shared.state.lock();
                    state.store.load(tasks);
                    state.load = LoadState::Ready;
                    state.store.revision()
                };
                tracing::info!(count, "board loaded");
                self.shared.emit(BoardEvent::Loaded { count });
                self.shared.emit(BoardEvent::Changed { revision });
                Ok(count)
            }
            Err(err) => {
                let message = format!("{} ({err})", FailedAction::Load.message());
                tracing::warn!(error = %err, "board load failed");
                self.shared.state.lock().load = LoadState::Failed(message.clone());
                self.shared.emit(BoardEvent::LoadFailed { message });
                Err(BoardError::Load(err))
            }
        }
    }

    /// Moves a task to `destination`, optimistically.
    ///
    /// Unknown ids are ignored. The move becomes undoable for
    /// [`UNDO_WINDOW`], replacing any earlier undo offer.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Update`] if the service refused the move; the
    /// store has been restored to its pre-move snapshot and the move's undo
    /// offer withdrawn.
    pub async fn move_task(&self, id: &TaskId, destination: TaskStatus) -> Result<(), BoardError> {
        let Some((snapshot, generation)) = self.apply_move(id, destination) else {
            tracing::debug!(task_id = %id, "move ignored, task not on board");
            return Ok(());
        };

        match self.remote.update_status(id, destination).await {
            Ok(_) => {
                tracing::info!(task_id = %id, status = %destination, "move confirmed");
                Ok(())
            }
            Err(err) => {
                let (revision, withdrawn) = {
                    let mut state = self.shared.state.lock();
                    state.store.restore(&snapshot);
                    let withdrawn = state.undo.discard_if(generation).is_some();
                    (state.store.revision(), withdrawn)
                };
                tracing::warn!(task_id = %id, error = %err, "move refused, rolled back");
                self.shared.emit(BoardEvent::Changed { revision });
                if withdrawn {
                    self.shared.emit(BoardEvent::UndoWithdrawn {
                        task_id: id.clone(),
                        reason: UndoEnd::RolledBack,
                    });
                }
                self.report(FailedAction::Update, &err);
                Err(BoardError::Update(err))
            }
        }
    }

    /// Reverts the most recent move if its undo window is still open.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. The local store is
    /// restored before the service is asked to move the task back.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Revert`] if the service did not accept the
    /// revert. The local state is left as restored; only the service is out
    /// of step.
    pub async fn undo(&self) -> Result<bool, BoardError> {
        let now = Instant::now();
        let taken = {
            let mut state = self.shared.state.lock();
            match state.undo.take() {
                None => None,
                Some(entry) if entry.is_expired(now) => {
                    Some(Err(entry.task_id().clone()))
                }
                Some(entry) => {
                    let (task_id, previous, snapshot) = entry.into_parts();
                    state.store.restore(&snapshot);
                    Some(Ok((task_id, previous, state.store.revision())))
                }
            }
        };

        let (task_id, previous, revision) = match taken {
            None => return Ok(false),
            Some(Err(task_id)) => {
                self.shared.emit(BoardEvent::UndoWithdrawn {
                    task_id,
                    reason: UndoEnd::Expired,
                });
                return Ok(false);
            }
            Some(Ok(parts)) => parts,
        };

        tracing::debug!(task_id = %task_id, status = %previous, "move undone locally");
        self.shared.emit(BoardEvent::Changed { revision });
        self.shared.emit(BoardEvent::UndoWithdrawn {
            task_id: task_id.clone(),
            reason: UndoEnd::Used,
        });

        match self.remote.update_status(&task_id, previous).await {
            Ok(_) => {
                tracing::info!(task_id = %task_id, status = %previous, "undo confirmed");
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "service kept the undone move");
                self.report(FailedAction::Revert, &err);
                Err(BoardError::Revert(err))
            }
        }
    }

    /// Creates a task, showing a placeholder until the service answers.
    ///
    /// The placeholder is prepended under a temporary id and replaced in
    /// place by the server's record. If the placeholder was deleted in the
    /// meantime the server record is not re-inserted.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] for a blank title (nothing is
    /// changed or sent), or [`BoardError::Create`] if the service refused the
    /// task, in which case the placeholder has been removed.
    pub async fn create_task(&self, new: NewTask) -> Result<Task, BoardError> {
        let new = new.normalized().inspect_err(|e| {
            tracing::debug!(reason = %e, "create rejected");
        })?;
        let temp_id = TaskId::temporary();
        let revision = {
            let mut state = self.shared.state.lock();
            state.store.prepend(Task::from_new(temp_id.clone(), &new));
            state.store.revision()
        };
        tracing::debug!(task_id = %temp_id, title = %new.title, "placeholder added");
        self.shared.emit(BoardEvent::Changed { revision });

        match self.remote.create(&new).await {
            Ok(task) => {
                let replaced = {
                    let mut state = self.shared.state.lock();
                    state
                        .store
                        .replace(&temp_id, task.clone())
                        .then(|| state.store.revision())
                };
                match replaced {
                    Some(revision) => {
                        tracing::info!(task_id = %task.id, temp_id = %temp_id, "create confirmed");
                        self.shared.emit(BoardEvent::Changed { revision });
                    }
                    None => {
                        tracing::debug!(temp_id = %temp_id, "placeholder gone, server record not inserted");
                    }
                }
                Ok(task)
            }
            Err(err) => {
                let removed = {
                    let mut state = self.shared.state.lock();
                    state
                        .store
                        .remove(&temp_id)
                        .map(|_| state.store.revision())
                };
                tracing::warn!(temp_id = %temp_id, error = %err, "create refused, placeholder removed");
                if let Some(revision) = removed {
                    self.shared.emit(BoardEvent::Changed { revision });
                }
                self.report(FailedAction::Create, &err);
                Err(BoardError::Create(err))
            }
        }
    }

    /// Deletes a task, optimistically. Unknown ids are ignored.
    ///
    /// A service answer of "not found" counts as success: the record is
    /// already gone.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Delete`] if the service refused the delete; the
    /// store has been restored to its pre-delete snapshot.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), BoardError> {
        let applied = {
            let mut state = self.shared.state.lock();
            let snapshot = state.store.snapshot();
            state
                .store
                .remove(id)
                .map(|_| (snapshot, state.store.revision()))
        };
        let Some((snapshot, revision)) = applied else {
            tracing::debug!(task_id = %id, "delete ignored, task not on board");
            return Ok(());
        };
        self.shared.emit(BoardEvent::Changed { revision });

        match self.remote.delete(id).await {
            Ok(_) => {
                tracing::info!(task_id = %id, "delete confirmed");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(task_id = %id, "task already absent on server");
                Ok(())
            }
            Err(err) => {
                let revision = self.restore(&snapshot);
                tracing::warn!(task_id = %id, error = %err, "delete refused, rolled back");
                self.shared.emit(BoardEvent::Changed { revision });
                self.report(FailedAction::Delete, &err);
                Err(BoardError::Delete(err))
            }
        }
    }

    /// Drops the undo offer (and its timer), e.g. when the board closes.
    pub fn close(&self) {
        let discarded = self.shared.state.lock().undo.take();
        if let Some(entry) = discarded {
            tracing::debug!(task_id = %entry.task_id(), "undo offer dropped on close");
        }
    }

    /// Local half of a move: snapshot, mutate, arm undo.
    fn apply_move(&self, id: &TaskId, destination: TaskStatus) -> Option<(Snapshot, u64)> {
        let (snapshot, generation, revision, superseded) = {
            let mut state = self.shared.state.lock();
            let snapshot = state.store.snapshot();
            let previous = state.store.set_status(id, destination)?;
            let expires_at = Instant::now() + UNDO_WINDOW;
            let (generation, superseded) =
                state
                    .undo
                    .arm(id.clone(), previous, snapshot.clone(), expires_at);
            let timer = self.spawn_expiry(generation, expires_at);
            state.undo.attach_timer(generation, timer);
            tracing::debug!(task_id = %id, from = %previous, to = %destination, "move applied locally");
            (
                snapshot,
                generation,
                state.store.revision(),
                superseded.map(|e| e.task_id().clone()),
            )
        };

        self.shared.emit(BoardEvent::Changed { revision });
        if let Some(task_id) = superseded {
            self.shared.emit(BoardEvent::UndoWithdrawn {
                task_id,
                reason: UndoEnd::Superseded,
            });
        }
        self.shared.emit(BoardEvent::UndoOffered {
            task_id: id.clone(),
        });
        Some((snapshot, generation))
    }

    fn spawn_expiry(&self, generation: u64, expires_at: Instant) -> ExpiryTimer {
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            shared.expire_undo(generation);
        });
        ExpiryTimer::new(handle.abort_handle())
    }

    fn restore(&self, snapshot: &Snapshot) -> u64 {
        let mut state = self.shared.state.lock();
        state.store.restore(snapshot);
        state.store.revision()
    }

    /// Surfaces a remote failure, except 404s, which are silent no-ops.
    fn report(&self, action: FailedAction, err: &RemoteError) {
        if err.is_not_found() {
            tracing::debug!(?action, error = %err, "not found, no notice");
            return;
        }
        self.shared.emit(BoardEvent::Notice(Notice {
            action,
            cause: err.clone(),
        }));
    }
}

impl<R: RemoteTaskService> Drop for Reconciler<R> {
    fn drop(&mut self) {
        self.close();
    }
}
