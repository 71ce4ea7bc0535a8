//! Adjustment applier: turns suggested adjustments into store mutations.
//!
//! # Responsibility
//! - Perform the follow-up mutation each change tag calls for: progress
//!   recomputation up the task -> project -> goal chain, goal restamps and
//!   habit streak maintenance.
//!
//! # Invariants
//! - The report always echoes the input adjustment list.
//! - A change referencing a missing record is a no-op, not an error.
//! - Unknown change tags mutate nothing and still succeed.
//! - Goal tags restamp the row only; a user's direct goal edit is never
//!   recomputed away.

use crate::model::change::ChangeEvent;
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::repo::habit_repo::{HabitRepository, SqliteHabitRepository};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoResult;
use log::{error, info};
use rusqlite::Connection;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of one `apply_adjustments` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentReport {
    pub success: bool,
    /// The adjustment list that was acted on, echoed back to the caller.
    pub applied: Vec<String>,
    /// Number of records mutated in the store.
    pub records_touched: u32,
}

/// Applies the store mutations implied by a change event.
///
/// The suggested adjustments come from the impact analysis; the mutation
/// performed is keyed on `change.change_type`, not on the suggestion text.
pub fn apply_adjustments(
    conn: &Connection,
    change: &ChangeEvent,
    adjustments: &[String],
) -> AdjustmentReport {
    match mutate_for_change(conn, change) {
        Ok(records_touched) => {
            info!(
                "event=apply_adjustments module=impact status=ok change_type={} records_touched={records_touched}",
                change.change_type
            );
            AdjustmentReport {
                success: true,
                applied: adjustments.to_vec(),
                records_touched,
            }
        }
        Err(err) => {
            error!(
                "event=apply_adjustments module=impact status=error change_type={} error={err}",
                change.change_type
            );
            AdjustmentReport {
                success: false,
                applied: adjustments.to_vec(),
                records_touched: 0,
            }
        }
    }
}

fn mutate_for_change(conn: &Connection, change: &ChangeEvent) -> RepoResult<u32> {
    match change.change_type.as_str() {
        "task_status_changed" | "task_due_date_changed" | "task_priority_changed" => {
            refresh_task_chain(conn, change.entity_id)
        }
        "project_status_changed" | "project_progress_changed" => {
            refresh_project_chain(conn, change.entity_id)
        }
        "goal_updated" | "goal_progress_changed" => {
            // The event reports a goal the user already edited; restamp it
            // instead of recomputing over the edit.
            let goals = SqliteGoalRepository::new(conn);
            match goals.get_goal(change.entity_id)? {
                Some(goal) => {
                    goals.touch(goal.id)?;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
        "habit_completed" => {
            let habits = SqliteHabitRepository::new(conn);
            match habits.get_habit(change.entity_id)? {
                Some(habit) => {
                    habits.mark_completed(habit.id, now_ms())?;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
        "habit_missed" => {
            let habits = SqliteHabitRepository::new(conn);
            match habits.get_habit(change.entity_id)? {
                Some(habit) => {
                    habits.reset_streak(habit.id)?;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
        // transaction_added, health_metric_recorded and unknown tags have no
        // dependent records to refresh.
        _ => Ok(0),
    }
}

/// Recomputes progress for the task's project and that project's goal.
fn refresh_task_chain(conn: &Connection, task_id: i64) -> RepoResult<u32> {
    let tasks = SqliteTaskRepository::new(conn);
    let Some(task) = tasks.get_task(task_id)? else {
        return Ok(0);
    };
    let Some(project_id) = task.project_id else {
        return Ok(0);
    };

    let projects = SqliteProjectRepository::new(conn);
    projects.recompute_progress(project_id)?;
    let mut touched = 1;

    if let Some(project) = projects.get_project(project_id)? {
        if let Some(goal_id) = project.goal_id {
            SqliteGoalRepository::new(conn).recompute_progress(goal_id)?;
            touched += 1;
        }
    }
    Ok(touched)
}

/// Recomputes progress for the project's goal.
fn refresh_project_chain(conn: &Connection, project_id: i64) -> RepoResult<u32> {
    let projects = SqliteProjectRepository::new(conn);
    let Some(project) = projects.get_project(project_id)? else {
        return Ok(0);
    };
    let Some(goal_id) = project.goal_id else {
        return Ok(0);
    };

    SqliteGoalRepository::new(conn).recompute_progress(goal_id)?;
    Ok(1)
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
