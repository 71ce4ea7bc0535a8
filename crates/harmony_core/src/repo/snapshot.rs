//! Full-store snapshot used as context for impact analysis.
//!
//! # Responsibility
//! - Scan every life-domain table in full and bundle the rows.
//! - Serialize the bundle into the JSON context sent to the model endpoint.
//!
//! # Invariants
//! - The snapshot covers all nine tables; an empty store yields an empty
//!   snapshot, not an error.
//! - Snapshots are read-only and never written back.

use crate::model::entity::{
    Goal, Habit, HealthMetric, Idea, JournalEntry, Project, Task, Transaction, Vision,
};
use crate::repo::finance_repo::{FinanceRepository, SqliteFinanceRepository, TransactionRangeQuery};
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::repo::habit_repo::{HabitRepository, SqliteHabitRepository};
use crate::repo::health_repo::{HealthRepository, SqliteHealthRepository};
use crate::repo::journal_repo::{JournalRangeQuery, JournalRepository, SqliteJournalRepository};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;
use serde::Serialize;

/// Point-in-time copy of every stored record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreSnapshot {
    pub visions: Vec<Vision>,
    pub goals: Vec<Goal>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    pub journal_entries: Vec<JournalEntry>,
    pub ideas: Vec<Idea>,
    pub transactions: Vec<Transaction>,
    pub health_metrics: Vec<HealthMetric>,
}

impl StoreSnapshot {
    /// Total record count across all tables.
    pub fn total_records(&self) -> usize {
        self.visions.len()
            + self.goals.len()
            + self.projects.len()
            + self.tasks.len()
            + self.habits.len()
            + self.journal_entries.len()
            + self.ideas.len()
            + self.transactions.len()
            + self.health_metrics.len()
    }

    /// Serializes the snapshot into the JSON context for the model prompt.
    pub fn to_context_json(&self) -> serde_json::Value {
        // Serializing a plain struct of Vecs cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Read-only provider of full-store snapshots.
///
/// The impact engine consumes the store through this seam instead of a
/// process-wide singleton, so tests and alternate stores can be injected.
pub trait SnapshotSource {
    fn gather(&self) -> RepoResult<StoreSnapshot>;
}

/// Snapshot source backed by the SQLite store.
pub struct SqliteSnapshotSource<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotSource<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotSource for SqliteSnapshotSource<'_> {
    fn gather(&self) -> RepoResult<StoreSnapshot> {
        let goals = SqliteGoalRepository::new(self.conn);
        let projects = SqliteProjectRepository::new(self.conn);
        let tasks = SqliteTaskRepository::new(self.conn);
        let habits = SqliteHabitRepository::new(self.conn);
        let journal = SqliteJournalRepository::new(self.conn);
        let finance = SqliteFinanceRepository::new(self.conn);
        let health = SqliteHealthRepository::new(self.conn);

        Ok(StoreSnapshot {
            visions: goals.list_visions()?,
            goals: goals.list_goals(None)?,
            projects: projects.list_projects(None)?,
            tasks: tasks.list_tasks(&TaskListQuery::default())?,
            habits: habits.list_habits()?,
            journal_entries: journal.list_entries(&JournalRangeQuery::default())?,
            ideas: journal.list_ideas()?,
            transactions: finance.list_transactions(&TransactionRangeQuery::default())?,
            health_metrics: health.list_metrics(None)?,
        })
    }
}
