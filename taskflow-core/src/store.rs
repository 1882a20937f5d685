//! Task persistence over SQLite.
//!
//! `TaskStore` is the seam between the dispatch layer and storage; the
//! production implementation is `SqliteTaskStore`, and tests open it in
//! memory. The store owns the `completed_at` invariant: the timestamp is
//! set exactly when a task transitions to completed and cleared when it
//! returns to pending.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{NewTask, Priority, StatusFilter, Task, TaskPatch, TaskStatus};

/// Abstract task storage consumed by the dispatcher and chat agent.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task owned by `owner`. Status starts as pending.
    async fn create(&self, owner: Uuid, new_task: NewTask) -> Result<Task, StoreError>;

    /// List tasks in insertion order, newest last.
    async fn list(
        &self,
        owner: Option<Uuid>,
        status: StatusFilter,
        priority: Option<Priority>,
        limit: usize,
    ) -> Result<Vec<Task>, StoreError>;

    /// Fetch a task by id. `Ok(None)` when it does not exist.
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Apply a partial update and return the updated task.
    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task, StoreError>;

    /// Delete a task by id.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Number of tasks owned by `owner`.
    async fn count(&self, owner: Uuid) -> Result<usize, StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT,
    status       TEXT NOT NULL,
    priority     TEXT NOT NULL,
    due_date     TEXT,
    owner_id     TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    completed_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);
";

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "Opened task store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store. Used by tests and the mock server mode.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        let id: String = row.get(0)?;
        let status: String = row.get(3)?;
        let priority: String = row.get(4)?;
        let due_date: Option<String> = row.get(5)?;
        let owner_id: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let updated_at: String = row.get(8)?;
        let completed_at: Option<String> = row.get(9)?;

        Ok(Task {
            id: id.parse().unwrap_or_default(),
            title: row.get(1)?,
            description: row.get(2)?,
            status: TaskStatus::parse(&status).unwrap_or_default(),
            priority: Priority::parse(&priority).unwrap_or_default(),
            due_date: due_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            owner_id: owner_id.parse().unwrap_or_default(),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
            completed_at: completed_at.map(|t| parse_timestamp(&t)),
        })
    }

    async fn get_inner(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, title, description, status, priority, due_date,
                    owner_id, created_at, updated_at, completed_at
             FROM tasks WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id.to_string()], Self::row_to_task)?;
        match rows.next() {
            Some(task) => Ok(Some(task?)),
            None => Ok(None),
        }
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, owner: Uuid, new_task: NewTask) -> Result<Task, StoreError> {
        let task = Task::from_new(owner, new_task);

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, due_date,
                                owner_id, created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                task.id.to_string(),
                task.title,
                task.description,
                task.status.to_string(),
                task.priority.to_string(),
                task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                task.owner_id.to_string(),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
                Option::<String>::None,
            ],
        )?;
        debug!(task_id = %task.id, owner = %owner, "Created task");
        Ok(task)
    }

    async fn list(
        &self,
        owner: Option<Uuid>,
        status: StatusFilter,
        priority: Option<Priority>,
        limit: usize,
    ) -> Result<Vec<Task>, StoreError> {
        let mut sql = String::from(
            "SELECT id, title, description, status, priority, due_date,
                    owner_id, created_at, updated_at, completed_at
             FROM tasks WHERE 1=1",
        );
        let mut values: Vec<String> = Vec::new();

        if let Some(owner) = owner {
            values.push(owner.to_string());
            sql.push_str(&format!(" AND owner_id = ?{}", values.len()));
        }
        match status {
            StatusFilter::All => {}
            StatusFilter::Pending => {
                values.push(TaskStatus::Pending.to_string());
                sql.push_str(&format!(" AND status = ?{}", values.len()));
            }
            StatusFilter::Completed => {
                values.push(TaskStatus::Completed.to_string());
                sql.push_str(&format!(" AND status = ?{}", values.len()));
            }
        }
        if let Some(priority) = priority {
            values.push(priority.to_string());
            sql.push_str(&format!(" AND priority = ?{}", values.len()));
        }
        sql.push_str(&format!(" ORDER BY rowid LIMIT {}", limit.min(100)));

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), Self::row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.get_inner(id).await
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut task = self
            .get_inner(id)
            .await?
            .ok_or(StoreError::NotFound { id })?;

        let previous_status = task.status;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(status) = patch.status {
            task.status = status;
            // completed_at is set iff status is completed
            match (previous_status, status) {
                (TaskStatus::Pending, TaskStatus::Completed) => {
                    task.completed_at = Some(Utc::now());
                }
                (TaskStatus::Completed, TaskStatus::Pending) => {
                    task.completed_at = None;
                }
                _ => {}
            }
        }
        task.updated_at = Utc::now();

        let conn = self.conn.lock().await;
        let affected = conn.execute(
            "UPDATE tasks
             SET title = ?2, description = ?3, status = ?4, priority = ?5,
                 due_date = ?6, updated_at = ?7, completed_at = ?8
             WHERE id = ?1",
            rusqlite::params![
                task.id.to_string(),
                task.title,
                task.description,
                task.status.to_string(),
                task.priority.to_string(),
                task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                task.updated_at.to_rfc3339(),
                task.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound { id });
        }
        debug!(task_id = %task.id, "Updated task");
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound { id });
        }
        debug!(task_id = %id, "Deleted task");
        Ok(())
    }

    async fn count(&self, owner: Uuid) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE owner_id = ?1",
            [owner.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
