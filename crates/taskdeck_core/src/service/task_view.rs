//! Read-side projections over task snapshots.
//!
//! # Responsibility
//! - Filter a snapshot by completion status without copying it.
//! - Sort task sequences by priority, due date or title.
//! - Summarize completion progress.
//!
//! # Invariants
//! - Nothing here touches the repository.
//! - Every sort is stable: equal keys keep their input order.
//! - Undated tasks sort after every dated task.

use crate::model::task::Task;
use feruca::Collator;
use std::cmp::Ordering;
use std::sync::Arc;

/// Completion-status predicate for list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl TaskFilter {
    /// Returns whether `task` belongs to this view.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.is_completed,
            Self::Pending => !task.is_completed,
        }
    }
}

/// Ordering applied by `sorted_tasks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortCriterion {
    /// High first, then Medium, then Low.
    #[default]
    Priority,
    /// Earliest first; undated last.
    DueDate,
    /// By title in Unicode collation order (CLDR root locale).
    Alphabetical,
}

/// Lazy view over one immutable snapshot.
///
/// Iterating never blocks the store and can be repeated; each `iter()` call
/// starts from the beginning of the same snapshot.
#[derive(Debug, Clone)]
pub struct FilteredTasks {
    snapshot: Arc<[Task]>,
    filter: TaskFilter,
}

impl FilteredTasks {
    pub(crate) fn new(snapshot: Arc<[Task]>, filter: TaskFilter) -> Self {
        Self { snapshot, filter }
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> + '_ {
        let filter = self.filter;
        self.snapshot.iter().filter(move |task| filter.matches(task))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Materializes the view into owned records.
    pub fn to_vec(&self) -> Vec<Task> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a FilteredTasks {
    type Item = &'a Task;
    type IntoIter = Box<dyn Iterator<Item = &'a Task> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Completion summary for a task list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskProgress {
    pub completed: usize,
    pub total: usize,
}

impl TaskProgress {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks
            .into_iter()
            .fold(Self { completed: 0, total: 0 }, |acc, task| Self {
                completed: acc.completed + usize::from(task.is_completed),
                total: acc.total + 1,
            })
    }

    /// Completed share in `0.0..=1.0`; `0.0` for an empty list.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Returns `tasks` reordered by `criterion`.
pub fn sorted_tasks(tasks: impl IntoIterator<Item = Task>, criterion: SortCriterion) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks.into_iter().collect();
    match criterion {
        SortCriterion::Priority => tasks.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortCriterion::DueDate => tasks.sort_by(|a, b| compare_due_dates(a.due_date, b.due_date)),
        SortCriterion::Alphabetical => {
            let mut collator = Collator::default();
            tasks.sort_by(|a, b| compare_titles(&mut collator, &a.title, &b.title));
        }
    }
    tasks
}

fn compare_due_dates(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Accents and case only break ties between otherwise equal letters, so
/// `"éclair"` sorts between `"Eagle"` and `"fig"`.
fn compare_titles(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    collator.collate(a, b)
}

#[cfg(test)]
mod tests {
    use super::{compare_titles, sorted_tasks, SortCriterion, TaskFilter, TaskProgress};
    use crate::model::task::{Priority, Task};
    use feruca::Collator;
    use std::cmp::Ordering;

    fn task(title: &str, priority: Priority, due_date: Option<i64>) -> Task {
        let mut task = Task::new(title, 0);
        task.priority = priority;
        task.due_date = due_date;
        task
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn priority_sort_is_stable_for_equal_priorities() {
        let input = vec![
            task("high-1", Priority::High, None),
            task("low", Priority::Low, None),
            task("high-2", Priority::High, None),
            task("medium", Priority::Medium, None),
        ];

        let sorted = sorted_tasks(input, SortCriterion::Priority);
        assert_eq!(titles(&sorted), ["high-1", "high-2", "medium", "low"]);
    }

    #[test]
    fn due_date_sort_puts_undated_tasks_last() {
        let input = vec![
            task("undated-1", Priority::Low, None),
            task("late", Priority::Low, Some(2_000)),
            task("undated-2", Priority::Low, None),
            task("early", Priority::Low, Some(1_000)),
        ];

        let sorted = sorted_tasks(input, SortCriterion::DueDate);
        assert_eq!(titles(&sorted), ["early", "late", "undated-1", "undated-2"]);
    }

    #[test]
    fn alphabetical_sort_groups_case_variants() {
        let input = vec![
            task("banana", Priority::Low, None),
            task("Apple", Priority::Low, None),
            task("apple", Priority::Low, None),
            task("Cherry", Priority::Low, None),
        ];

        let sorted = sorted_tasks(input, SortCriterion::Alphabetical);
        assert_eq!(titles(&sorted), ["apple", "Apple", "banana", "Cherry"]);
    }

    #[test]
    fn alphabetical_sort_places_accented_titles_with_their_base_letter() {
        let input = vec![
            task("zebra", Priority::Low, None),
            task("éclair", Priority::Low, None),
            task("fig", Priority::Low, None),
            task("Eagle", Priority::Low, None),
        ];

        let sorted = sorted_tasks(input, SortCriterion::Alphabetical);
        assert_eq!(titles(&sorted), ["Eagle", "éclair", "fig", "zebra"]);
    }

    #[test]
    fn compare_titles_uses_accents_only_as_tie_break() {
        let mut collator = Collator::default();
        assert_eq!(compare_titles(&mut collator, "resume", "résumé"), Ordering::Less);
        assert_eq!(compare_titles(&mut collator, "résumé", "rose"), Ordering::Less);
        assert_eq!(compare_titles(&mut collator, "Émile", "emilie"), Ordering::Less);
        assert_eq!(compare_titles(&mut collator, "éa", "ÉB"), Ordering::Less);
    }

    #[test]
    fn filter_partitions_by_completion() {
        let mut done = task("done", Priority::Low, None);
        done.is_completed = true;
        let open = task("open", Priority::Low, None);

        assert!(TaskFilter::All.matches(&done) && TaskFilter::All.matches(&open));
        assert!(TaskFilter::Completed.matches(&done) && !TaskFilter::Completed.matches(&open));
        assert!(TaskFilter::Pending.matches(&open) && !TaskFilter::Pending.matches(&done));
    }

    #[test]
    fn progress_ratio_is_zero_for_empty_list() {
        let progress = TaskProgress::from_tasks(Vec::<Task>::new().iter());
        assert_eq!(progress.total, 0);
        assert_eq!(progress.ratio(), 0.0);
    }
}
