//! Goal and vision repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide CRUD over the `goals` and `visions` tables.
//! - Own goal progress recomputation from linked project progress.
//!
//! # Invariants
//! - `progress` stays in `0..=100` on every write path.
//! - A goal with no linked projects recomputes to progress 0.

use crate::model::entity::{EntityId, Goal, GoalStatus, Vision};
use crate::repo::{check_progress, decode_column, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const GOAL_SELECT_SQL: &str = "SELECT
    id,
    title,
    status,
    progress,
    vision_id,
    target_date,
    updated_at
FROM goals";

/// Repository interface for goal and vision operations.
pub trait GoalRepository {
    fn create_goal(&self, goal: &Goal) -> RepoResult<EntityId>;
    fn update_goal(&self, goal: &Goal) -> RepoResult<()>;
    fn get_goal(&self, id: EntityId) -> RepoResult<Option<Goal>>;
    fn list_goals(&self, vision_id: Option<EntityId>) -> RepoResult<Vec<Goal>>;
    fn set_progress(&self, id: EntityId, progress: u8) -> RepoResult<()>;
    /// Recomputes progress as the mean of linked project progress and
    /// persists it. Returns the new progress value.
    fn recompute_progress(&self, id: EntityId) -> RepoResult<u8>;
    /// Restamps `updated_at` without changing any field.
    fn touch(&self, id: EntityId) -> RepoResult<()>;

    fn create_vision(&self, vision: &Vision) -> RepoResult<EntityId>;
    fn get_vision(&self, id: EntityId) -> RepoResult<Option<Vision>>;
    fn list_visions(&self) -> RepoResult<Vec<Vision>>;
}

/// SQLite-backed goal/vision repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, goal: &Goal) -> RepoResult<EntityId> {
        check_progress(goal.progress, "goals.progress")?;
        self.conn.execute(
            "INSERT INTO goals (title, status, progress, vision_id, target_date)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                goal.title.as_str(),
                goal.status.as_str(),
                goal.progress,
                goal.vision_id,
                goal.target_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_goal(&self, goal: &Goal) -> RepoResult<()> {
        check_progress(goal.progress, "goals.progress")?;
        let changed = self.conn.execute(
            "UPDATE goals
             SET
                title = ?1,
                status = ?2,
                progress = ?3,
                vision_id = ?4,
                target_date = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                goal.title.as_str(),
                goal.status.as_str(),
                goal.progress,
                goal.vision_id,
                goal.target_date,
                goal.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "goal",
                id: goal.id,
            });
        }
        Ok(())
    }

    fn get_goal(&self, id: EntityId) -> RepoResult<Option<Goal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GOAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }
        Ok(None)
    }

    fn list_goals(&self, vision_id: Option<EntityId>) -> RepoResult<Vec<Goal>> {
        let (sql, params): (String, Vec<i64>) = match vision_id {
            Some(vision_id) => (
                format!("{GOAL_SELECT_SQL} WHERE vision_id = ?1 ORDER BY updated_at DESC, id ASC;"),
                vec![vision_id],
            ),
            None => (
                format!("{GOAL_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"),
                Vec::new(),
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    fn set_progress(&self, id: EntityId, progress: u8) -> RepoResult<()> {
        check_progress(progress, "goals.progress")?;
        let changed = self.conn.execute(
            "UPDATE goals
             SET progress = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![progress, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "goal", id });
        }
        Ok(())
    }

    fn recompute_progress(&self, id: EntityId) -> RepoResult<u8> {
        let mean: Option<f64> = self.conn.query_row(
            "SELECT AVG(progress) FROM projects WHERE goal_id = ?1;",
            [id],
            |row| row.get(0),
        )?;

        let progress = mean.map_or(0, |value| value.round() as u8);
        self.set_progress(id, progress)?;
        Ok(progress)
    }

    fn touch(&self, id: EntityId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE goals
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "goal", id });
        }
        Ok(())
    }

    fn create_vision(&self, vision: &Vision) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO visions (title, description) VALUES (?1, ?2);",
            params![vision.title.as_str(), vision.description.as_deref()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_vision(&self, id: EntityId) -> RepoResult<Option<Vision>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, description, created_at FROM visions WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_vision_row(row)?));
        }
        Ok(None)
    }

    fn list_visions(&self) -> RepoResult<Vec<Vision>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, description, created_at FROM visions ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut visions = Vec::new();
        while let Some(row) = rows.next()? {
            visions.push(parse_vision_row(row)?);
        }
        Ok(visions)
    }
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let status_text: String = row.get("status")?;
    let progress: i64 = row.get("progress")?;
    if !(0..=100).contains(&progress) {
        return Err(RepoError::InvalidData(format!(
            "invalid value `{progress}` in goals.progress"
        )));
    }

    Ok(Goal {
        id: row.get("id")?,
        title: row.get("title")?,
        status: decode_column(GoalStatus::parse, &status_text, "goals.status")?,
        progress: progress as u8,
        vision_id: row.get("vision_id")?,
        target_date: row.get("target_date")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_vision_row(row: &Row<'_>) -> RepoResult<Vision> {
    Ok(Vision {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}
