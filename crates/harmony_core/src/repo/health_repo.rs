//! Health indicator repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist health readings (weight, sleep hours, ...) keyed by metric name.
//! - Provide the latest reading per metric for dashboard-style summaries.

use crate::model::entity::{EntityId, HealthMetric};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for health readings.
pub trait HealthRepository {
    fn record_metric(&self, metric: &HealthMetric) -> RepoResult<EntityId>;
    fn list_metrics(&self, metric: Option<&str>) -> RepoResult<Vec<HealthMetric>>;
    /// Returns the most recent reading for one metric name, if any.
    fn latest(&self, metric: &str) -> RepoResult<Option<HealthMetric>>;
    fn delete_metric(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed health repository.
pub struct SqliteHealthRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHealthRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HealthRepository for SqliteHealthRepository<'_> {
    fn record_metric(&self, metric: &HealthMetric) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO health_metrics (metric, value, unit, recorded_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                metric.metric.as_str(),
                metric.value,
                metric.unit.as_deref(),
                metric.recorded_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_metrics(&self, metric: Option<&str>) -> RepoResult<Vec<HealthMetric>> {
        let base = "SELECT id, metric, value, unit, recorded_at FROM health_metrics";
        let mut readings = Vec::new();

        match metric {
            Some(name) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{base} WHERE metric = ?1 ORDER BY recorded_at DESC, id ASC;"
                ))?;
                let mut rows = stmt.query([name])?;
                while let Some(row) = rows.next()? {
                    readings.push(parse_metric_row(row)?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{base} ORDER BY recorded_at DESC, id ASC;"))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    readings.push(parse_metric_row(row)?);
                }
            }
        }

        Ok(readings)
    }

    fn latest(&self, metric: &str) -> RepoResult<Option<HealthMetric>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, metric, value, unit, recorded_at
             FROM health_metrics
             WHERE metric = ?1
             ORDER BY recorded_at DESC, id DESC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([metric])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_metric_row(row)?));
        }
        Ok(None)
    }

    fn delete_metric(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM health_metrics WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "health_metric",
                id,
            });
        }
        Ok(())
    }
}

fn parse_metric_row(row: &Row<'_>) -> RepoResult<HealthMetric> {
    Ok(HealthMetric {
        id: row.get("id")?,
        metric: row.get("metric")?,
        value: row.get("value")?,
        unit: row.get("unit")?,
        recorded_at: row.get("recorded_at")?,
    })
}
