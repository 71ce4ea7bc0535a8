//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and scheduling queries over the `tasks` table.
//! - Expose targeted mutators (`set_status`, `set_due_date`) used by the
//!   adjustment applier.
//!
//! # Invariants
//! - Updates touching a missing id return `RepoError::NotFound`.
//! - List ordering is deterministic (`updated_at DESC, id ASC`).

use crate::model::entity::{EntityId, Priority, Task, TaskStatus};
use crate::repo::{decode_column, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    status,
    priority,
    due_date,
    project_id,
    updated_at
FROM tasks";

/// Query options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub project_id: Option<EntityId>,
    pub status: Option<TaskStatus>,
    /// Keep only tasks due strictly before this epoch-ms instant.
    pub due_before: Option<i64>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<EntityId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: EntityId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn set_status(&self, id: EntityId, status: TaskStatus) -> RepoResult<()>;
    fn set_due_date(&self, id: EntityId, due_date: Option<i64>) -> RepoResult<()>;
    fn delete_task(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO tasks (title, status, priority, due_date, project_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.title.as_str(),
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date,
                task.project_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                status = ?2,
                priority = ?3,
                due_date = ?4,
                project_id = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                task.title.as_str(),
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date,
                task.project_id,
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task.id,
            });
        }
        Ok(())
    }

    fn get_task(&self, id: EntityId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(project_id) = query.project_id {
            sql.push_str(" AND project_id = ?");
            bind_values.push(Value::Integer(project_id));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(due_before) = query.due_before {
            sql.push_str(" AND due_date IS NOT NULL AND due_date < ?");
            bind_values.push(Value::Integer(due_before));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn set_status(&self, id: EntityId, status: TaskStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET status = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }
        Ok(())
    }

    fn set_due_date(&self, id: EntityId, due_date: Option<i64>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET due_date = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![due_date, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }
        Ok(())
    }

    fn delete_task(&self, id: EntityId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    let priority_text: String = row.get("priority")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        status: decode_column(TaskStatus::parse, &status_text, "tasks.status")?,
        priority: decode_column(Priority::parse, &priority_text, "tasks.priority")?,
        due_date: row.get("due_date")?,
        project_id: row.get("project_id")?,
        updated_at: row.get("updated_at")?,
    })
}
