//! Stored entity records, one per life domain.
//!
//! # Responsibility
//! - Define the record shapes for visions, goals, projects, tasks, habits,
//!   journal entries, ideas, transactions and health metrics.
//! - Provide text codecs for status enums shared by persistence and serde.
//!
//! # Invariants
//! - `id == 0` means the record has not been persisted yet; the store assigns
//!   the real id on insert. Row timestamps start at 0 for the same reason and
//!   are stamped by the store.
//! - Timestamps are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};

/// Stable store-assigned identifier for every record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntityId = i64;

/// Goal lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Paused,
    Achieved,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Achieved => "achieved",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "achieved" => Some(Self::Achieved),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "planned" => Some(Self::Planned),
            "active" => Some(Self::Active),
            "on_hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Task priority bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Habit repetition cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitFrequency {
    Daily,
    Weekly,
}

impl HabitFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

/// Money flow direction for a financial record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Long-horizon life direction that goals attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vision {
    pub id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: i64,
}

impl Vision {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: None,
            created_at: 0,
        }
    }
}

/// Measurable outcome, optionally attached to a vision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: EntityId,
    pub title: String,
    pub status: GoalStatus,
    /// Completion percentage in `0..=100`.
    pub progress: u8,
    pub vision_id: Option<EntityId>,
    /// Target date in epoch milliseconds.
    pub target_date: Option<i64>,
    pub updated_at: i64,
}

impl Goal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            status: GoalStatus::Active,
            progress: 0,
            vision_id: None,
            target_date: None,
            updated_at: 0,
        }
    }
}

/// Unit of work grouping tasks under a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub status: ProjectStatus,
    /// Completion percentage in `0..=100`.
    pub progress: u8,
    pub goal_id: Option<EntityId>,
    pub updated_at: i64,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            status: ProjectStatus::Planned,
            progress: 0,
            goal_id: None,
            updated_at: 0,
        }
    }
}

/// Actionable item, optionally scheduled and attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Due date in epoch milliseconds.
    pub due_date: Option<i64>,
    pub project_id: Option<EntityId>,
    pub updated_at: i64,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: None,
            project_id: None,
            updated_at: 0,
        }
    }
}

/// Recurring behavior with a completion streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: EntityId,
    pub name: String,
    pub frequency: HabitFrequency,
    pub streak: u32,
    /// Last completion in epoch milliseconds.
    pub last_completed: Option<i64>,
    pub updated_at: i64,
}

impl Habit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            frequency: HabitFrequency::Daily,
            streak: 0,
            last_completed: None,
            updated_at: 0,
        }
    }
}

/// Free-form dated journal entry with an optional mood tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntityId,
    pub content: String,
    pub mood: Option<String>,
    /// Entry date in epoch milliseconds.
    pub created_at: i64,
}

/// Captured thought not yet promoted to a goal or task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: EntityId,
    pub content: String,
    pub created_at: i64,
}

/// Single financial record.
///
/// Amounts are stored in integer cents to avoid float drift in sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub occurred_at: i64,
}

/// Single health indicator reading (weight, sleep hours, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetric {
    pub id: EntityId,
    pub metric: String,
    pub value: f64,
    pub unit: Option<String>,
    pub recorded_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_defaults() {
        let task = Task::new("write report");
        assert_eq!(task.id, 0);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, None);

        let goal = Goal::new("run a marathon");
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.progress, 0);

        let habit = Habit::new("meditate");
        assert_eq!(habit.frequency, HabitFrequency::Daily);
        assert_eq!(habit.streak, 0);
    }

    #[test]
    fn status_codecs_roundtrip() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            ProjectStatus::Planned,
            ProjectStatus::Active,
            ProjectStatus::OnHold,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("blocked"), None);
        assert_eq!(TransactionKind::parse("transfer"), None);
    }

    #[test]
    fn serde_uses_snake_case_tags() {
        let json = serde_json::to_value(TaskStatus::InProgress).unwrap();
        assert_eq!(json, "in_progress");
        let json = serde_json::to_value(ProjectStatus::OnHold).unwrap();
        assert_eq!(json, "on_hold");
    }
}
