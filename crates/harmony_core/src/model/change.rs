//! Change-event and impact-analysis types.
//!
//! # Responsibility
//! - Describe one user edit to a stored record (`ChangeEvent`).
//! - Describe the impact summary the engine returns (`ImpactAnalysis`).
//!
//! # Invariants
//! - `change_type` is an open string tag; unknown tags are valid input and
//!   fall into the generic rule.
//! - `impact_score` stays in `0..=100`.
//! - An impact analysis is produced fresh per call and never persisted.

use crate::model::entity::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of one edit to a stored record.
///
/// Constructed at the call site when the user edits an entity, consumed once
/// by the impact engine and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Open string tag identifying what changed, e.g. `task_status_changed`.
    #[serde(rename = "type")]
    pub change_type: String,
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl ChangeEvent {
    pub fn new(change_type: impl Into<String>, entity_id: EntityId) -> Self {
        Self {
            change_type: change_type.into(),
            entity_id,
            old_value: None,
            new_value: None,
        }
    }

    /// Attaches before/after values for richer model context.
    pub fn with_values(mut self, old_value: Value, new_value: Value) -> Self {
        self.old_value = Some(old_value);
        self.new_value = Some(new_value);
        self
    }
}

/// How emotionally significant a change is judged to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsychologicalImpact {
    Low,
    Medium,
    High,
}

impl PsychologicalImpact {
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

/// Impact summary for one change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    /// Entity-type tags likely to need revisiting.
    pub affected_entities: Vec<String>,
    /// Human-readable follow-up suggestions.
    pub suggested_adjustments: Vec<String>,
    /// Severity in `0..=100`.
    pub impact_score: u8,
    pub psychological_impact: PsychologicalImpact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_event_wire_shape_matches_endpoint_contract() {
        let change = ChangeEvent::new("task_due_date_changed", 42)
            .with_values(json!(1_700_000_000_000_i64), json!(1_700_086_400_000_i64));

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["type"], "task_due_date_changed");
        assert_eq!(json["entityId"], 42);
        assert_eq!(json["oldValue"], 1_700_000_000_000_i64);
        assert_eq!(json["newValue"], 1_700_086_400_000_i64);
    }

    #[test]
    fn change_event_values_are_optional_on_the_wire() {
        let json = serde_json::to_value(ChangeEvent::new("goal_updated", 7)).unwrap();
        assert!(json.get("oldValue").is_none());
        assert!(json.get("newValue").is_none());

        let decoded: ChangeEvent =
            serde_json::from_value(json!({"type": "goal_updated", "entityId": 7})).unwrap();
        assert_eq!(decoded.change_type, "goal_updated");
        assert_eq!(decoded.old_value, None);
    }

    #[test]
    fn impact_analysis_serializes_camel_case() {
        let analysis = ImpactAnalysis {
            affected_entities: vec!["project".to_string()],
            suggested_adjustments: vec!["Update the parent project's progress".to_string()],
            impact_score: 25,
            psychological_impact: PsychologicalImpact::Low,
        };

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["affectedEntities"][0], "project");
        assert_eq!(json["impactScore"], 25);
        assert_eq!(json["psychologicalImpact"], "low");
    }

    #[test]
    fn psychological_impact_parse_rejects_unknown_bucket() {
        assert_eq!(
            PsychologicalImpact::parse("medium"),
            Some(PsychologicalImpact::Medium)
        );
        assert_eq!(PsychologicalImpact::parse("severe"), None);
    }
}
