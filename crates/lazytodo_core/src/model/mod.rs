//! Task list domain model.
//!
//! # Responsibility
//! - Define the task record and the list state the reducer transforms.
//!
//! # Invariants
//! - Every task is identified by an ordinal `TaskId` unique within its list.
//! - Removal is the only way a task leaves the list.

pub mod state;
pub mod task;
