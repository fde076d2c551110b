//! Integration tests for remote calls resolving out of order.
//!
//! The board does not sequence remote calls: each move rolls back to the
//! snapshot it took, whenever its answer arrives. These tests pin that
//! "last network response wins" contract with a service whose answers are
//! released by hand.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use sprintboard::board::{BoardError, Reconciler};
use sprintboard::remote::{RemoteError, RemoteTaskService};
use sprintboard::remote::simulated::demo_tasks;
use sprintboard_proto::task::{NewTask, Task, TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Gated service
// ---------------------------------------------------------------------------

type Gate = oneshot::Receiver<Result<(), RemoteError>>;

/// Service whose status updates wait for a gate to be opened.
///
/// Each `update_status` call takes the next queued gate, in call order, and
/// answers with whatever outcome the gate is opened with.
struct GatedRemote {
    tasks: Mutex<Vec<Task>>,
    gates: Mutex<VecDeque<Gate>>,
}

impl GatedRemote {
    fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            gates: Mutex::new(VecDeque::new()),
        }
    }

    /// Queues a gate for the next status update and returns its opener.
    fn gate(&self) -> oneshot::Sender<Result<(), RemoteError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push_back(rx);
        tx
    }
}

impl RemoteTaskService for GatedRemote {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        Ok(self.tasks.lock().clone())
    }

    async fn create(&self, _new: &NewTask) -> Result<Task, RemoteError> {
        Err(RemoteError::Transport("create not supported".into()))
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, RemoteError> {
        let gate = self.gates.lock().pop_front();
        if let Some(gate) = gate {
            gate.await
                .unwrap_or_else(|_| Err(RemoteError::Transport("gate dropped".into())))?;
        }
        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        task.status = status;
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<Task, RemoteError> {
        Err(RemoteError::NotFound(id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn gated_board() -> Arc<Reconciler<GatedRemote>> {
    let board = Arc::new(Reconciler::new(GatedRemote::new(demo_tasks()), 64));
    board.load().await.unwrap();
    board
}

async fn spawn_move(
    board: &Arc<Reconciler<GatedRemote>>,
    id: &str,
    status: TaskStatus,
) -> JoinHandle<Result<(), BoardError>> {
    let board = Arc::clone(board);
    let id = TaskId::new(id);
    let handle = tokio::spawn(async move { board.move_task(&id, status).await });
    // Let the local half run before returning.
    tokio::task::yield_now().await;
    handle
}

fn server_error() -> RemoteError {
    RemoteError::Server {
        status: 500,
        message: "Simulated failure".into(),
    }
}

fn t(id: &str) -> TaskId {
    TaskId::new(id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn later_answers_first_both_succeed() {
    let board = gated_board().await;
    let first = board.remote().gate();
    let second = board.remote().gate();

    let a = spawn_move(&board, "t1", TaskStatus::InProgress).await;
    let b = spawn_move(&board, "t1", TaskStatus::Done).await;
    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Done));

    second.send(Ok(())).unwrap();
    b.await.unwrap().unwrap();
    first.send(Ok(())).unwrap();
    a.await.unwrap().unwrap();

    // Local state reflects the last local action; the service took the last
    // answer it processed.
    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Done));
    assert_eq!(
        board.remote().tasks.lock()[0].status,
        TaskStatus::InProgress
    );
}

#[tokio::test]
async fn late_failure_of_earlier_move_clobbers_later_move() {
    let board = gated_board().await;
    let first = board.remote().gate();
    let second = board.remote().gate();

    let a = spawn_move(&board, "t1", TaskStatus::InProgress).await;
    let b = spawn_move(&board, "t1", TaskStatus::Done).await;

    second.send(Ok(())).unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Done));

    first.send(Err(server_error())).unwrap();
    assert!(matches!(a.await.unwrap(), Err(BoardError::Update(_))));

    // The first move's snapshot predates both moves.
    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Todo));

    // The undo offer belongs to the second move and survives the rollback.
    let pending = board.pending_undo().unwrap();
    assert_eq!(pending.task_id, t("t1"));
    assert_eq!(pending.previous_status, TaskStatus::InProgress);
}

#[tokio::test]
async fn late_failure_reverts_other_tasks_moved_meanwhile() {
    let board = gated_board().await;
    let first = board.remote().gate();
    let second = board.remote().gate();

    let a = spawn_move(&board, "t1", TaskStatus::Done).await;
    let b = spawn_move(&board, "t2", TaskStatus::Done).await;

    second.send(Ok(())).unwrap();
    b.await.unwrap().unwrap();
    first.send(Err(server_error())).unwrap();
    let _ = a.await.unwrap();

    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Todo));
    assert_eq!(board.status_of(&t("t2")), Some(TaskStatus::InProgress));
}

#[tokio::test]
async fn early_failure_then_later_success_keeps_later_move() {
    let board = gated_board().await;
    let first = board.remote().gate();
    let second = board.remote().gate();

    let a = spawn_move(&board, "t1", TaskStatus::InProgress).await;
    first.send(Err(server_error())).unwrap();
    let _ = a.await.unwrap();
    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Todo));

    let b = spawn_move(&board, "t1", TaskStatus::Done).await;
    second.send(Ok(())).unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(board.status_of(&t("t1")), Some(TaskStatus::Done));
}
