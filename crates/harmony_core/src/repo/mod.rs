//! Repository contracts and SQLite implementations per life domain.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the Harmony store tables.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate domain constraints before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::entity::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod finance_repo;
pub mod goal_repo;
pub mod habit_repo;
pub mod health_repo;
pub mod journal_repo;
pub mod project_repo;
pub mod snapshot;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for store persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(String),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: EntityId,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid record: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

/// Rejects percentages outside `0..=100` before they reach SQL.
pub(crate) fn check_progress(progress: u8, field: &str) -> RepoResult<()> {
    if progress > 100 {
        return Err(RepoError::Validation(format!(
            "{field} must be within 0..=100, got {progress}"
        )));
    }
    Ok(())
}

/// Decodes a persisted status column via `parse`, rejecting unknown values.
pub(crate) fn decode_column<T>(
    parse: impl FnOnce(&str) -> Option<T>,
    value: &str,
    column: &str,
) -> RepoResult<T> {
    parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}
