//! Habit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `habits` table.
//! - Own streak maintenance (`mark_completed`, `reset_streak`).
//!
//! # Invariants
//! - `mark_completed` increments the streak by exactly one and stamps
//!   `last_completed`.
//! - `reset_streak` zeroes the streak but keeps `last_completed` as history.

use crate::model::entity::{EntityId, Habit, HabitFrequency};
use crate::repo::{decode_column, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    name,
    frequency,
    streak,
    last_completed,
    updated_at
FROM habits";

/// Repository interface for habit operations.
pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<EntityId>;
    fn get_habit(&self, id: EntityId) -> RepoResult<Option<Habit>>;
    fn list_habits(&self) -> RepoResult<Vec<Habit>>;
    /// Records one completion at `completed_at` and returns the new streak.
    fn mark_completed(&self, id: EntityId, completed_at: i64) -> RepoResult<u32>;
    fn reset_streak(&self, id: EntityId) -> RepoResult<()>;
    fn delete_habit(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO habits (name, frequency, streak, last_completed)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                habit.name.as_str(),
                habit.frequency.as_str(),
                habit.streak,
                habit.last_completed,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_habit(&self, id: EntityId) -> RepoResult<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }
        Ok(None)
    }

    fn list_habits(&self) -> RepoResult<Vec<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn mark_completed(&self, id: EntityId, completed_at: i64) -> RepoResult<u32> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                streak = streak + 1,
                last_completed = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![completed_at, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "habit", id });
        }

        let streak: u32 =
            self.conn
                .query_row("SELECT streak FROM habits WHERE id = ?1;", [id], |row| {
                    row.get(0)
                })?;
        Ok(streak)
    }

    fn reset_streak(&self, id: EntityId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET streak = 0, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "habit", id });
        }
        Ok(())
    }

    fn delete_habit(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "habit", id });
        }
        Ok(())
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let frequency_text: String = row.get("frequency")?;
    let streak: i64 = row.get("streak")?;
    if streak < 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid value `{streak}` in habits.streak"
        )));
    }

    Ok(Habit {
        id: row.get("id")?,
        name: row.get("name")?,
        frequency: decode_column(HabitFrequency::parse, &frequency_text, "habits.frequency")?,
        streak: streak as u32,
        last_completed: row.get("last_completed")?,
        updated_at: row.get("updated_at")?,
    })
}
