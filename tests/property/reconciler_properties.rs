//! Property-based tests for the board protocol.
//!
//! Uses proptest to verify:
//! 1. A refused move leaves the id → column map exactly as it was.
//! 2. A confirmed create adds exactly one task and no placeholder; a refused
//!    one leaves the size unchanged.
//! 3. The same filter applied twice yields the same visible set.
//! 4. A second undo after one move changes nothing.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use sprintboard::board::{FilterState, PriorityFilter, Reconciler, TaskStore, VisibleSet};
use sprintboard::remote::simulated::{FailurePolicy, SimulatedRemote};
use sprintboard_proto::task::{NewTask, Priority, Task, TaskId, TaskStatus};

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

fn arb_filter() -> impl Strategy<Value = FilterState> {
    (
        "[a-zA-Z ]{0,4}",
        prop_oneof![
            Just(PriorityFilter::All),
            arb_priority().prop_map(PriorityFilter::Only),
        ],
    )
        .prop_map(|(search, priority)| FilterState::new(search, priority))
}

/// One to eight tasks with distinct ids.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(("[A-Za-z ]{1,16}", arb_priority(), arb_status()), 1..8).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (title, priority, status))| Task {
                    id: TaskId::new(format!("t{i}")),
                    title,
                    description: String::new(),
                    priority,
                    status,
                    updated_at: None,
                })
                .collect()
        },
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

async fn board(tasks: Vec<Task>, policy: FailurePolicy) -> Reconciler<SimulatedRemote> {
    let board = Reconciler::new(
        SimulatedRemote::with_tasks(tasks).with_failures(FailurePolicy::Never),
        16,
    );
    board.load().await.unwrap();
    board.remote().set_failure_policy(policy);
    board
}

proptest! {
    #[test]
    fn refused_move_round_trips(
        tasks in arb_tasks(),
        pick in any::<prop::sample::Index>(),
        destination in arb_status(),
    ) {
        let id = tasks[pick.index(tasks.len())].id.clone();
        runtime().block_on(async {
            let board = board(tasks, FailurePolicy::Always).await;
            let before = board.read(TaskStore::status_map);
            let result = board.move_task(&id, destination).await;
            prop_assert!(result.is_err());
            prop_assert_eq!(board.read(TaskStore::status_map), before);
            prop_assert!(board.pending_undo().is_none());
            Ok(())
        })?;
    }

    #[test]
    fn create_adds_exactly_one_or_nothing(
        tasks in arb_tasks(),
        title in "[a-z]{1,12}",
        fail in any::<bool>(),
    ) {
        runtime().block_on(async {
            let policy = if fail { FailurePolicy::Always } else { FailurePolicy::Never };
            let board = board(tasks, policy).await;
            let size = board.tasks().len();
            let result = board.create_task(NewTask::new(title)).await;
            let after = board.tasks();
            prop_assert!(!after.iter().any(|t| t.id.is_temporary()));
            match result {
                Ok(created) => {
                    prop_assert!(!fail);
                    prop_assert_eq!(after.len(), size + 1);
                    prop_assert_eq!(after.iter().filter(|t| t.id == created.id).count(), 1);
                }
                Err(_) => {
                    prop_assert!(fail);
                    prop_assert_eq!(after.len(), size);
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn filter_is_idempotent(tasks in arb_tasks(), filter in arb_filter()) {
        let mut store = TaskStore::new();
        store.load(tasks);
        let first: Vec<Task> = store.query(&filter).cloned().collect();
        let second: Vec<Task> = store.query(&filter).cloned().collect();
        prop_assert_eq!(&first, &second);

        let mut visible = VisibleSet::new();
        prop_assert_eq!(visible.get(&store, &filter), first.as_slice());
        prop_assert_eq!(visible.get(&store, &filter), first.as_slice());
        prop_assert_eq!(visible.recomputations(), 1);
        prop_assert!(first.iter().all(|t| filter.matches(t)));
    }

    #[test]
    fn second_undo_changes_nothing(
        tasks in arb_tasks(),
        pick in any::<prop::sample::Index>(),
        destination in arb_status(),
    ) {
        let id = tasks[pick.index(tasks.len())].id.clone();
        runtime().block_on(async {
            let board = board(tasks, FailurePolicy::Never).await;
            let before = board.read(TaskStore::status_map);
            board.move_task(&id, destination).await.unwrap();
            prop_assert!(board.undo().await.unwrap());
            prop_assert_eq!(board.read(TaskStore::status_map), before.clone());
            let calls = board.remote().calls().len();
            prop_assert!(!board.undo().await.unwrap());
            prop_assert_eq!(board.read(TaskStore::status_map), before);
            prop_assert_eq!(board.remote().calls().len(), calls);
            Ok(())
        })?;
    }
}
