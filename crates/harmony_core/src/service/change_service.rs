//! Change-propagation use-case service.
//!
//! # Responsibility
//! - Wire the impact engine to the SQLite store and an optional model.
//! - Offer the analyze-then-apply flow as one entry point.
//!
//! # Invariants
//! - `analyze_change` never fails; degraded paths fall back to the rule
//!   table inside the engine.

use crate::ai::client::TextModel;
use crate::impact::adjust::{apply_adjustments, AdjustmentReport};
use crate::impact::engine::ImpactEngine;
use crate::model::change::{ChangeEvent, ImpactAnalysis};
use crate::repo::snapshot::SqliteSnapshotSource;
use rusqlite::Connection;

/// Use-case service for change propagation over one store connection.
pub struct ChangeService<'conn> {
    conn: &'conn Connection,
    model: Option<Box<dyn TextModel>>,
}

impl<'conn> ChangeService<'conn> {
    /// Creates a service that analyzes with the rule table only.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn, model: None }
    }

    /// Creates a service that consults `model` before the rule table.
    pub fn with_model(conn: &'conn Connection, model: Box<dyn TextModel>) -> Self {
        Self {
            conn,
            model: Some(model),
        }
    }

    /// Computes the impact summary for one change event.
    pub fn analyze_change(&self, change: &ChangeEvent) -> ImpactAnalysis {
        let store = SqliteSnapshotSource::new(self.conn);
        match self.model.as_deref() {
            Some(model) => ImpactEngine::with_model(store, model).analyze(change),
            None => ImpactEngine::new(store).analyze(change),
        }
    }

    /// Applies the store mutations implied by `change` for an already
    /// computed adjustment list.
    pub fn apply_adjustments(
        &self,
        change: &ChangeEvent,
        adjustments: &[String],
    ) -> AdjustmentReport {
        apply_adjustments(self.conn, change, adjustments)
    }

    /// Analyze-then-apply convenience flow.
    pub fn analyze_and_apply(&self, change: &ChangeEvent) -> (ImpactAnalysis, AdjustmentReport) {
        let analysis = self.analyze_change(change);
        let report = self.apply_adjustments(change, &analysis.suggested_adjustments);
        (analysis, report)
    }
}
