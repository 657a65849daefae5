//! Domain model for the task list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one task shape shared by persistence and list views.
//!
//! # Invariants
//! - Every task is identified by a stable, non-nil `TaskId`.
//! - `position` defines manual order; sort criteria never rewrite it.

pub mod task;
