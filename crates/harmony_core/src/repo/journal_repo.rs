//! Journal and idea repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Persist dated journal entries and free-form ideas.
//! - Provide date-range listing for the journal/calendar views.
//!
//! # Invariants
//! - Entry timestamps are caller-provided epoch milliseconds, never assigned
//!   by the store, so listings are reproducible.
//! - Range queries treat `since` as inclusive and `until` as exclusive.

use crate::model::entity::{EntityId, Idea, JournalEntry};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Date-range query for journal listings.
#[derive(Debug, Clone, Default)]
pub struct JournalRangeQuery {
    /// Inclusive lower bound in epoch milliseconds.
    pub since: Option<i64>,
    /// Exclusive upper bound in epoch milliseconds.
    pub until: Option<i64>,
    pub limit: Option<u32>,
}

/// Repository interface for journal and idea operations.
pub trait JournalRepository {
    fn add_entry(
        &self,
        content: &str,
        mood: Option<&str>,
        created_at: i64,
    ) -> RepoResult<EntityId>;
    fn get_entry(&self, id: EntityId) -> RepoResult<Option<JournalEntry>>;
    fn list_entries(&self, query: &JournalRangeQuery) -> RepoResult<Vec<JournalEntry>>;
    fn delete_entry(&self, id: EntityId) -> RepoResult<()>;

    fn add_idea(&self, content: &str, created_at: i64) -> RepoResult<EntityId>;
    fn list_ideas(&self) -> RepoResult<Vec<Idea>>;
}

/// SQLite-backed journal/idea repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn add_entry(
        &self,
        content: &str,
        mood: Option<&str>,
        created_at: i64,
    ) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO journal_entries (content, mood, created_at)
             VALUES (?1, ?2, ?3);",
            params![content, mood, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_entry(&self, id: EntityId) -> RepoResult<Option<JournalEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, mood, created_at
             FROM journal_entries
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn list_entries(&self, query: &JournalRangeQuery) -> RepoResult<Vec<JournalEntry>> {
        let mut sql = String::from(
            "SELECT id, content, mood, created_at
             FROM journal_entries
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(since) = query.since {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(since));
        }
        if let Some(until) = query.until {
            sql.push_str(" AND created_at < ?");
            bind_values.push(Value::Integer(until));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn delete_entry(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM journal_entries WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "journal_entry",
                id,
            });
        }
        Ok(())
    }

    fn add_idea(&self, content: &str, created_at: i64) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO ideas (content, created_at) VALUES (?1, ?2);",
            params![content, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_ideas(&self) -> RepoResult<Vec<Idea>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, created_at
             FROM ideas
             ORDER BY created_at DESC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut ideas = Vec::new();
        while let Some(row) = rows.next()? {
            ideas.push(Idea {
                id: row.get("id")?,
                content: row.get("content")?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(ideas)
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<JournalEntry> {
    Ok(JournalEntry {
        id: row.get("id")?,
        content: row.get("content")?,
        mood: row.get("mood")?,
        created_at: row.get("created_at")?,
    })
}
