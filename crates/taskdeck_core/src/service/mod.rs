//! Use-case services above repositories.
//!
//! # Responsibility
//! - Orchestrate task mutations over the repository contract.
//! - Derive list views (filter/sort/progress) from in-memory snapshots.

pub mod task_store;
pub mod task_view;
