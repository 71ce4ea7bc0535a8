//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `projects` table.
//! - Own progress recomputation from the project's task set.
//!
//! # Invariants
//! - `progress` stays in `0..=100` on every write path.
//! - A project with no tasks recomputes to progress 0.

use crate::model::entity::{EntityId, Project, ProjectStatus};
use crate::repo::{check_progress, decode_column, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    status,
    progress,
    goal_id,
    updated_at
FROM projects";

/// Repository interface for project operations.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<EntityId>;
    fn update_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: EntityId) -> RepoResult<Option<Project>>;
    fn list_projects(&self, goal_id: Option<EntityId>) -> RepoResult<Vec<Project>>;
    fn set_status(&self, id: EntityId, status: ProjectStatus) -> RepoResult<()>;
    fn set_progress(&self, id: EntityId, progress: u8) -> RepoResult<()>;
    /// Recomputes progress as `done tasks / all tasks` and persists it.
    ///
    /// Returns the new progress value.
    fn recompute_progress(&self, id: EntityId) -> RepoResult<u8>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<EntityId> {
        check_progress(project.progress, "projects.progress")?;
        self.conn.execute(
            "INSERT INTO projects (name, status, progress, goal_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                project.name.as_str(),
                project.status.as_str(),
                project.progress,
                project.goal_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_project(&self, project: &Project) -> RepoResult<()> {
        check_progress(project.progress, "projects.progress")?;
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                name = ?1,
                status = ?2,
                progress = ?3,
                goal_id = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?5;",
            params![
                project.name.as_str(),
                project.status.as_str(),
                project.progress,
                project.goal_id,
                project.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project.id,
            });
        }
        Ok(())
    }

    fn get_project(&self, id: EntityId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self, goal_id: Option<EntityId>) -> RepoResult<Vec<Project>> {
        let (sql, params): (String, Vec<i64>) = match goal_id {
            Some(goal_id) => (
                format!("{PROJECT_SELECT_SQL} WHERE goal_id = ?1 ORDER BY updated_at DESC, id ASC;"),
                vec![goal_id],
            ),
            None => (
                format!("{PROJECT_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"),
                Vec::new(),
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn set_status(&self, id: EntityId, status: ProjectStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET status = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }

    fn set_progress(&self, id: EntityId, progress: u8) -> RepoResult<()> {
        check_progress(progress, "projects.progress")?;
        let changed = self.conn.execute(
            "UPDATE projects
             SET progress = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![progress, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }

    fn recompute_progress(&self, id: EntityId) -> RepoResult<u8> {
        let counts: Option<(i64, i64)> = self
            .conn
            .query_row(
                "SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'done')
                 FROM tasks
                 WHERE project_id = ?1;",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (total, done) = counts.unwrap_or((0, 0));
        let progress = if total == 0 {
            0
        } else {
            ((done * 100) / total) as u8
        };

        self.set_progress(id, progress)?;
        Ok(progress)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let status_text: String = row.get("status")?;
    let progress: i64 = row.get("progress")?;
    if !(0..=100).contains(&progress) {
        return Err(RepoError::InvalidData(format!(
            "invalid value `{progress}` in projects.progress"
        )));
    }

    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        status: decode_column(ProjectStatus::parse, &status_text, "projects.status")?,
        progress: progress as u8,
        goal_id: row.get("goal_id")?,
        updated_at: row.get("updated_at")?,
    })
}
