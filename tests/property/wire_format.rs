//! Property-based tests for the task service wire format.
//!
//! Uses proptest to verify:
//! 1. Any task survives a JSON encode → decode trip.
//! 2. Random bytes never cause a panic in `decode` (returns `Err` gracefully).
//! 3. Column and priority names parse back from their display form.

use proptest::prelude::*;
use sprintboard_proto::codec;
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

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9]{1,12}",
        "[^\x00]{1,64}",
        ".{0,64}",
        arb_priority(),
        arb_status(),
    )
        .prop_map(|(id, title, description, priority, status)| Task {
            id: TaskId::new(id),
            title,
            description,
            priority,
            status,
            updated_at: None,
        })
}

proptest! {
    #[test]
    fn task_survives_json(task in arb_task()) {
        let bytes = codec::encode(&task).unwrap();
        let decoded: Task = codec::decode(&bytes).unwrap();
        prop_assert_eq!(task, decoded);
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = codec::decode_task_list(&bytes);
        let _ = codec::decode::<NewTask>(&bytes);
    }

    #[test]
    fn names_parse_back(status in arb_status(), priority in arb_priority()) {
        prop_assert_eq!(status.to_string().parse::<TaskStatus>().unwrap(), status);
        prop_assert_eq!(priority.to_string().parse::<Priority>().unwrap(), priority);
    }
}
