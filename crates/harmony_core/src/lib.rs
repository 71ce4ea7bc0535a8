//! Core domain logic for Harmony.
//! This crate is the single source of truth for business invariants.

pub mod ai;
pub mod db;
pub mod impact;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use ai::client::{AiClient, AiClientConfig, AiError, AiResult, TextModel};
pub use impact::adjust::{apply_adjustments, AdjustmentReport};
pub use impact::engine::ImpactEngine;
pub use impact::rules::{fallback_analysis, rule_for, ImpactRule, DEFAULT_RULE, IMPACT_RULES};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::change::{ChangeEvent, ImpactAnalysis, PsychologicalImpact};
pub use model::entity::{
    EntityId, Goal, GoalStatus, Habit, HabitFrequency, HealthMetric, Idea, JournalEntry, Priority,
    Project, ProjectStatus, Task, TaskStatus, Transaction, TransactionKind, Vision,
};
pub use repo::snapshot::{SnapshotSource, SqliteSnapshotSource, StoreSnapshot};
pub use repo::{RepoError, RepoResult};
pub use service::change_service::ChangeService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
