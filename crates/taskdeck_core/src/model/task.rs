//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its priority scale.
//! - Provide construction and validation helpers used by write paths.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `id` is never the nil UUID.
//! - New tasks start pending with `Priority::Low` unless told otherwise.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task record.
pub type TaskId = Uuid;

/// Closed priority scale. Ordering is `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a stored name. Accepts any ASCII casing (`"High"`, `"high"`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Task id must not be the nil UUID.
    NilId,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
    pub is_completed: bool,
    /// Manual drag-and-drop order key.
    pub position: i64,
}

impl Task {
    /// Creates a pending task with a generated id.
    pub fn new(title: impl Into<String>, position: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            is_completed: false,
            position,
        }
    }

    /// Creates a pending task with a caller-provided id.
    ///
    /// Used by restore/import paths where identity already exists.
    ///
    /// # Errors
    /// - Returns `TaskValidationError::NilId` for the nil UUID.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        position: i64,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            ..Self::new(title, position)
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        Ok(())
    }

    /// Flips completion state.
    pub fn toggle_completion(&mut self) {
        self.is_completed = !self.is_completed;
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskValidationError};
    use uuid::Uuid;

    #[test]
    fn priority_orders_low_to_high() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn priority_parse_accepts_display_casing() {
        assert_eq!(Priority::parse("High"), Some(Priority::High));
        assert_eq!(Priority::parse(" medium "), Some(Priority::Medium));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn with_id_rejects_nil() {
        let err = Task::with_id(Uuid::nil(), "nil", 0).unwrap_err();
        assert_eq!(err, TaskValidationError::NilId);
    }

    #[test]
    fn toggle_completion_flips_back() {
        let mut task = Task::new("flip", 0);
        task.toggle_completion();
        assert!(task.is_completed);
        task.toggle_completion();
        assert!(!task.is_completed);
    }
}
