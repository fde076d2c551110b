//! Shared contract types for the Sprint Board task service.

pub mod codec;
pub mod task;

pub use task::{NewTask, Priority, Task, TaskId, TaskStatus, ValidationError};
