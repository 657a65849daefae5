//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskdeck_core` linkage without any UI runtime.
//! - Bootstrap core file logging under the system temp directory.
//! - Exercise one store round-trip against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use std::error::Error;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::{
    default_log_level, init_logging, logging_status, Priority, SortCriterion,
    SqliteTaskRepository, TaskDraft, TaskFilter, TaskStore,
};

const LOG_DIR_NAME: &str = "taskdeck-logs";

fn main() -> Result<(), Box<dyn Error>> {
    println!("taskdeck_core ping={}", taskdeck_core::ping());
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    let log_dir = std::env::temp_dir().join(LOG_DIR_NAME);
    init_logging(default_log_level(), &log_dir.to_string_lossy())?;
    if let Some((level, dir)) = logging_status() {
        println!("taskdeck_core logging level={level} dir={}", dir.display());
    }

    let repo = SqliteTaskRepository::try_new(open_db_in_memory()?)?;
    let store = TaskStore::open(repo)?;
    let milk = store.create(TaskDraft::new("Buy milk"))?;
    store.create(TaskDraft::new("Call Alice").priority(Priority::High))?;
    store.toggle_completion(milk.id)?;

    let by_priority = store.sorted(SortCriterion::Priority)?;
    let pending = store.filtered(TaskFilter::Pending)?;
    let progress = store.progress()?;
    println!(
        "taskdeck_core smoke tasks={} pending={} completed={} first_by_priority={}",
        by_priority.len(),
        pending.count(),
        progress.completed,
        by_priority
            .first()
            .map(|task| task.priority.as_str())
            .unwrap_or("none")
    );
    Ok(())
}
