//! Static change-tag rule table and fallback scoring.
//!
//! # Responsibility
//! - Map known change tags to affected entity types, follow-up suggestions
//!   and a severity range.
//! - Provide the generic rule for unrecognized tags.
//!
//! # Invariants
//! - Every rule has non-empty affected and adjustment lists.
//! - The fallback score is the fixed midpoint of the rule's range, so
//!   repeated analyses of the same change agree.

use crate::model::change::{ImpactAnalysis, PsychologicalImpact};

/// One entry of the change-tag dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct ImpactRule {
    pub change_type: &'static str,
    pub affected_entities: &'static [&'static str],
    pub suggested_adjustments: &'static [&'static str],
    /// Half-open severity range `[lo, hi)`.
    pub score_range: (u8, u8),
}

pub const IMPACT_RULES: &[ImpactRule] = &[
    ImpactRule {
        change_type: "task_due_date_changed",
        affected_entities: &["project", "calendar", "goals"],
        suggested_adjustments: &[
            "Review the project timeline for downstream slips",
            "Check calendar entries scheduled around the new date",
            "Confirm the parent goal's target date still holds",
        ],
        score_range: (30, 60),
    },
    ImpactRule {
        change_type: "task_status_changed",
        affected_entities: &["project", "goals", "journal"],
        suggested_adjustments: &[
            "Update the parent project's progress",
            "Reassess goal progress if this task was a milestone",
            "Capture a short journal note about the status change",
        ],
        score_range: (15, 35),
    },
    ImpactRule {
        change_type: "task_priority_changed",
        affected_entities: &["project", "calendar"],
        suggested_adjustments: &[
            "Reorder the project's task queue",
            "Revisit this week's schedule for displaced work",
        ],
        score_range: (20, 40),
    },
    ImpactRule {
        change_type: "goal_updated",
        affected_entities: &["projects", "tasks", "visions"],
        suggested_adjustments: &[
            "Align linked projects with the revised goal",
            "Re-check task relevance under the new goal framing",
            "Confirm the goal still serves its vision",
        ],
        score_range: (40, 70),
    },
    ImpactRule {
        change_type: "goal_progress_changed",
        affected_entities: &["projects", "journal"],
        suggested_adjustments: &[
            "Verify project progress adds up to the new goal progress",
            "Note the progress shift in the journal",
        ],
        score_range: (25, 50),
    },
    ImpactRule {
        change_type: "project_status_changed",
        affected_entities: &["tasks", "goals"],
        suggested_adjustments: &[
            "Update open tasks to match the project status",
            "Recompute the parent goal's progress",
        ],
        score_range: (35, 65),
    },
    ImpactRule {
        change_type: "project_progress_changed",
        affected_entities: &["goals", "tasks"],
        suggested_adjustments: &[
            "Recompute the parent goal's progress",
            "Close out tasks already covered by the new progress",
        ],
        score_range: (20, 45),
    },
    ImpactRule {
        change_type: "habit_completed",
        affected_entities: &["health", "journal", "goals"],
        suggested_adjustments: &[
            "Record any related health metric",
            "Add a quick journal reflection",
            "Check habit-linked goal progress",
        ],
        score_range: (10, 25),
    },
    ImpactRule {
        change_type: "habit_missed",
        affected_entities: &["health", "journal"],
        suggested_adjustments: &[
            "Review what blocked the habit today",
            "Consider lowering the habit frequency",
        ],
        score_range: (20, 40),
    },
    ImpactRule {
        change_type: "transaction_added",
        affected_entities: &["finance", "goals"],
        suggested_adjustments: &[
            "Re-check category budgets for this month",
            "Update savings-goal projections",
        ],
        score_range: (15, 35),
    },
    ImpactRule {
        change_type: "health_metric_recorded",
        affected_entities: &["health", "habits"],
        suggested_adjustments: &[
            "Compare against the previous reading",
            "Adjust linked habits if the trend is off",
        ],
        score_range: (10, 30),
    },
];

/// Generic rule for change tags not present in [`IMPACT_RULES`].
pub const DEFAULT_RULE: ImpactRule = ImpactRule {
    change_type: "*",
    affected_entities: &["general"],
    suggested_adjustments: &["Review recently edited areas for knock-on effects"],
    score_range: (10, 30),
};

/// Looks up the rule for a change tag, falling back to [`DEFAULT_RULE`].
pub fn rule_for(change_type: &str) -> &'static ImpactRule {
    IMPACT_RULES
        .iter()
        .find(|rule| rule.change_type == change_type)
        .unwrap_or(&DEFAULT_RULE)
}

/// Deterministic score for a rule: the midpoint of its half-open range.
pub fn midpoint_score(range: (u8, u8)) -> u8 {
    let (lo, hi) = range;
    lo + (hi - lo) / 2
}

/// Buckets a severity score into a psychological-impact band.
pub fn bucket_for(score: u8) -> PsychologicalImpact {
    match score {
        0..=33 => PsychologicalImpact::Low,
        34..=66 => PsychologicalImpact::Medium,
        _ => PsychologicalImpact::High,
    }
}

/// Builds the table-driven analysis for one change tag.
pub fn fallback_analysis(change_type: &str) -> ImpactAnalysis {
    let rule = rule_for(change_type);
    let score = midpoint_score(rule.score_range);
    ImpactAnalysis {
        affected_entities: rule
            .affected_entities
            .iter()
            .map(|tag| tag.to_string())
            .collect(),
        suggested_adjustments: rule
            .suggested_adjustments
            .iter()
            .map(|text| text.to_string())
            .collect(),
        impact_score: score,
        psychological_impact: bucket_for(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_is_well_formed() {
        for rule in IMPACT_RULES.iter().chain([&DEFAULT_RULE]) {
            assert!(
                !rule.affected_entities.is_empty(),
                "rule `{}` has no affected entities",
                rule.change_type
            );
            assert!(
                !rule.suggested_adjustments.is_empty(),
                "rule `{}` has no adjustments",
                rule.change_type
            );
            let (lo, hi) = rule.score_range;
            assert!(lo < hi, "rule `{}` has an empty range", rule.change_type);
            assert!(hi <= 100);

            let score = midpoint_score(rule.score_range);
            assert!(
                (lo..hi).contains(&score),
                "rule `{}` midpoint {score} escapes [{lo},{hi})",
                rule.change_type
            );
        }
    }

    #[test]
    fn rule_tags_are_unique() {
        for (index, rule) in IMPACT_RULES.iter().enumerate() {
            assert!(
                !IMPACT_RULES[index + 1..]
                    .iter()
                    .any(|other| other.change_type == rule.change_type),
                "duplicate rule tag `{}`",
                rule.change_type
            );
        }
    }

    #[test]
    fn unknown_tag_falls_back_to_default_rule() {
        let rule = rule_for("totally_unknown_tag");
        assert_eq!(rule.affected_entities, ["general"]);
        assert_eq!(rule.score_range, (10, 30));
    }

    #[test]
    fn bucket_thresholds() {
        assert_eq!(bucket_for(0), PsychologicalImpact::Low);
        assert_eq!(bucket_for(33), PsychologicalImpact::Low);
        assert_eq!(bucket_for(34), PsychologicalImpact::Medium);
        assert_eq!(bucket_for(66), PsychologicalImpact::Medium);
        assert_eq!(bucket_for(67), PsychologicalImpact::High);
        assert_eq!(bucket_for(100), PsychologicalImpact::High);
    }

    #[test]
    fn fallback_is_deterministic() {
        let first = fallback_analysis("task_status_changed");
        let second = fallback_analysis("task_status_changed");
        assert_eq!(first, second);
        assert_eq!(first.impact_score, 25);
    }
}
