//! Core task-list logic for Taskdeck.
//! This crate is the single source of truth for task invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use repo::task_repo::{
    PendingChange, RepoError, RepoResult, SqliteTaskRepository, TaskRepository, TaskSortKey,
};
pub use service::task_store::{InvalidArgument, StoreError, StoreResult, TaskDraft, TaskStore};
pub use service::task_view::{sorted_tasks, FilteredTasks, SortCriterion, TaskFilter, TaskProgress};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
