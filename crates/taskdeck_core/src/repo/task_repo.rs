//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide fetch/insert/update/delete and transactional batch APIs over the
//!   `tasks` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing is deterministic: ties on the sort key break by insertion order.
//! - `save_transaction` is all-or-nothing.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::task::{Priority, Task, TaskId, TaskValidationError};
use rusqlite::{ffi, params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    due_date,
    is_completed,
    position
FROM tasks";

const REQUIRED_COLUMNS: [&str; 7] = [
    "id",
    "title",
    "description",
    "priority",
    "due_date",
    "is_completed",
    "position",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    /// Insert collided with an existing task id.
    Conflict(TaskId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Conflict(id) => write!(f, "task already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column used to order `fetch_all` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    Position,
    /// Undated tasks always come last, regardless of direction.
    DueDate,
    Title,
}

impl TaskSortKey {
    fn order_by(self, ascending: bool) -> String {
        let direction = if ascending { "ASC" } else { "DESC" };
        match self {
            Self::Position => format!("position {direction}, rowid ASC"),
            Self::DueDate => format!("due_date IS NULL ASC, due_date {direction}, rowid ASC"),
            Self::Title => format!("title {direction}, rowid ASC"),
        }
    }
}

/// One queued write applied by `save_transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Insert(Task),
    Update(Task),
    Delete(TaskId),
}

/// Persistence contract consumed by `TaskStore`.
pub trait TaskRepository {
    /// Loads every task ordered by `sort_key`.
    fn fetch_all(&self, sort_key: TaskSortKey, ascending: bool) -> RepoResult<Vec<Task>>;
    /// Inserts a new record. Fails with `Conflict` when the id exists.
    fn insert(&self, task: &Task) -> RepoResult<()>;
    /// Overwrites every stored field. Fails with `NotFound` when absent.
    fn update(&self, task: &Task) -> RepoResult<()>;
    /// Removes one record. Fails with `NotFound` when absent.
    fn delete(&self, id: TaskId) -> RepoResult<()>;
    /// Applies `changes` in order; commits all of them or none.
    fn save_transaction(&self, changes: &[PendingChange]) -> RepoResult<()>;
}

/// SQLite-backed task repository owning its connection.
pub struct SqliteTaskRepository {
    conn: Connection,
}

impl SqliteTaskRepository {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_task_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn fetch_all(&self, sort_key: TaskSortKey, ascending: bool) -> RepoResult<Vec<Task>> {
        let sql = format!(
            "{TASK_SELECT_SQL} ORDER BY {};",
            sort_key.order_by(ascending)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn insert(&self, task: &Task) -> RepoResult<()> {
        insert_task(&self.conn, task)
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        update_task(&self.conn, task)
    }

    fn delete(&self, id: TaskId) -> RepoResult<()> {
        delete_task(&self.conn, id)
    }

    fn save_transaction(&self, changes: &[PendingChange]) -> RepoResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        for change in changes {
            match change {
                PendingChange::Insert(task) => insert_task(&tx, task)?,
                PendingChange::Update(task) => update_task(&tx, task)?,
                PendingChange::Delete(id) => delete_task(&tx, *id)?,
            }
        }
        // Dropping `tx` on an early return rolls everything back.
        tx.commit()?;
        Ok(())
    }
}

fn insert_task(conn: &Connection, task: &Task) -> RepoResult<()> {
    task.validate()?;

    let result = conn.execute(
        "INSERT INTO tasks (
            id,
            title,
            description,
            priority,
            due_date,
            is_completed,
            position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            task.id.to_string(),
            task.title.as_str(),
            task.description.as_deref(),
            task.priority.as_str(),
            task.due_date,
            task.is_completed,
            task.position,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if matches!(
                err.extended_code,
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
            ) =>
        {
            Err(RepoError::Conflict(task.id))
        }
        Err(err) => Err(err.into()),
    }
}

fn update_task(conn: &Connection, task: &Task) -> RepoResult<()> {
    task.validate()?;

    let changed = conn.execute(
        "UPDATE tasks
         SET
            title = ?1,
            description = ?2,
            priority = ?3,
            due_date = ?4,
            is_completed = ?5,
            position = ?6,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?7;",
        params![
            task.title.as_str(),
            task.description.as_deref(),
            task.priority.as_str(),
            task.due_date,
            task.is_completed,
            task.position,
            task.id.to_string(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(task.id));
    }
    Ok(())
}

fn delete_task(conn: &Connection, id: TaskId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in tasks.id")))?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let task = Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        due_date: row.get("due_date")?,
        is_completed,
        position: row.get("position")?,
    };
    task.validate()?;
    Ok(task)
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'tasks'
        );",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(tasks);")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column,
        });
    }

    Ok(())
}
