//! `sprintboard`: terminal kanban board with optimistic updates, rollback
//! and time-boxed undo against an unreliable task service.

pub mod app;
pub mod board;
pub mod config;
pub mod remote;
pub mod ui;
