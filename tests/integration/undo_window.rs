//! Integration tests for the single-slot undo window.
//!
//! Runs on a paused clock so the five-second window can be stepped through
//! exactly.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::broadcast;

use sprintboard::board::{BoardError, BoardEvent, FailedAction, Reconciler, UNDO_WINDOW, UndoEnd};
use sprintboard::remote::simulated::{FailurePolicy, RemoteCall, SimulatedRemote};
use sprintboard_proto::task::{TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn demo_board() -> Reconciler<SimulatedRemote> {
    let board = Reconciler::new(
        SimulatedRemote::demo().with_failures(FailurePolicy::Never),
        64,
    );
    board.load().await.unwrap();
    board
}

/// Lets spawned timer tasks run after the clock moved.
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

async fn advance(by: Duration) {
    tokio::time::advance(by).await;
    settle().await;
}

fn drain(rx: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn id(s: &str) -> TaskId {
    TaskId::new(s)
}

fn update_calls(board: &Reconciler<SimulatedRemote>) -> usize {
    board
        .remote()
        .calls()
        .iter()
        .filter(|c| matches!(c, RemoteCall::UpdateStatus { .. }))
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn undo_inside_window_restores_and_reverts_remotely() {
    let board = demo_board().await;
    board.move_task(&id("t1"), TaskStatus::Done).await.unwrap();

    advance(UNDO_WINDOW - Duration::from_millis(1)).await;
    assert!(board.undo().await.unwrap());

    assert_eq!(board.status_of(&id("t1")), Some(TaskStatus::Todo));
    assert_eq!(
        board.remote().calls().last(),
        Some(&RemoteCall::UpdateStatus {
            id: id("t1"),
            status: TaskStatus::Todo
        })
    );
}

#[tokio::test(start_paused = true)]
async fn second_undo_is_a_noop() {
    let board = demo_board().await;
    board.move_task(&id("t2"), TaskStatus::Done).await.unwrap();

    assert!(board.undo().await.unwrap());
    let calls = update_calls(&board);
    let tasks = board.tasks();

    assert!(!board.undo().await.unwrap());
    assert_eq!(update_calls(&board), calls);
    assert_eq!(board.tasks(), tasks);
}

#[tokio::test(start_paused = true)]
async fn window_closes_after_five_seconds() {
    let board = demo_board().await;
    let mut events = board.subscribe();
    board.move_task(&id("t1"), TaskStatus::Done).await.unwrap();
    assert!(board.pending_undo().is_some());

    advance(UNDO_WINDOW).await;

    assert!(board.pending_undo().is_none());
    assert!(drain(&mut events).contains(&BoardEvent::UndoWithdrawn {
        task_id: id("t1"),
        reason: UndoEnd::Expired,
    }));

    let calls = update_calls(&board);
    assert!(!board.undo().await.unwrap());
    assert_eq!(update_calls(&board), calls);
    assert_eq!(board.status_of(&id("t1")), Some(TaskStatus::Done));
}

#[tokio::test(start_paused = true)]
async fn newer_move_replaces_the_offer() {
    let board = demo_board().await;
    let mut events = board.subscribe();
    board.move_task(&id("t1"), TaskStatus::Done).await.unwrap();
    board.move_task(&id("t2"), TaskStatus::Todo).await.unwrap();

    assert!(drain(&mut events).contains(&BoardEvent::UndoWithdrawn {
        task_id: id("t1"),
        reason: UndoEnd::Superseded,
    }));
    assert!(board.undo().await.unwrap());

    assert_eq!(board.status_of(&id("t2")), Some(TaskStatus::InProgress));
    assert_eq!(board.status_of(&id("t1")), Some(TaskStatus::Done));
    assert!(!board.undo().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn superseded_timer_does_not_clear_newer_entry() {
    let board = demo_board().await;
    let mut events = board.subscribe();

    board.move_task(&id("t1"), TaskStatus::Done).await.unwrap();
    advance(Duration::from_secs(3)).await;
    board.move_task(&id("t2"), TaskStatus::Done).await.unwrap();

    // Past the first move's deadline, inside the second's.
    advance(Duration::from_secs(3)).await;

    let pending = board.pending_undo().unwrap();
    assert_eq!(pending.task_id, id("t2"));
    assert!(
        !drain(&mut events)
            .iter()
            .any(|e| matches!(e, BoardEvent::UndoWithdrawn { reason: UndoEnd::Expired, .. }))
    );

    advance(Duration::from_secs(2)).await;
    assert!(board.pending_undo().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_revert_keeps_local_state_and_warns() {
    let board = demo_board().await;
    board.move_task(&id("t3"), TaskStatus::Todo).await.unwrap();
    board.remote().set_failure_policy(FailurePolicy::Always);
    let mut events = board.subscribe();

    let err = board.undo().await.unwrap_err();

    assert!(matches!(err, BoardError::Revert(_)));
    assert_eq!(board.status_of(&id("t3")), Some(TaskStatus::Done));
    assert_eq!(board.remote().records()[2].status, TaskStatus::Todo);
    let notices: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            BoardEvent::Notice(n) => Some(n.action),
            _ => None,
        })
        .collect();
    assert_eq!(notices, [FailedAction::Revert]);
}

#[tokio::test(start_paused = true)]
async fn closing_the_board_cancels_the_offer() {
    let board = demo_board().await;
    board.move_task(&id("t1"), TaskStatus::Done).await.unwrap();
    board.close();
    assert!(board.pending_undo().is_none());
    advance(UNDO_WINDOW).await;
    assert!(!board.undo().await.unwrap());
}
