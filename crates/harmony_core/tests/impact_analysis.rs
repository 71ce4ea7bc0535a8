use harmony_core::db::open_db_in_memory;
use harmony_core::{
    fallback_analysis, AiError, AiResult, ChangeEvent, ChangeService, ImpactEngine,
    PsychologicalImpact, RepoError, RepoResult, SnapshotSource, StoreSnapshot, TextModel,
    IMPACT_RULES,
};
use serde_json::Value;

struct CannedModel {
    reply: &'static str,
}

impl TextModel for CannedModel {
    fn complete(&self, _query_type: &str, _payload: &Value) -> AiResult<String> {
        Ok(self.reply.to_string())
    }
}

struct OfflineModel;

impl TextModel for OfflineModel {
    fn complete(&self, _query_type: &str, _payload: &Value) -> AiResult<String> {
        Err(AiError::Transport("connection refused".to_string()))
    }
}

struct BrokenStore;

impl SnapshotSource for BrokenStore {
    fn gather(&self) -> RepoResult<StoreSnapshot> {
        Err(RepoError::InvalidData("store unavailable".to_string()))
    }
}

#[test]
fn every_known_tag_has_non_empty_fallback() {
    for rule in IMPACT_RULES {
        let analysis = fallback_analysis(rule.change_type);
        assert!(
            !analysis.affected_entities.is_empty(),
            "tag `{}` has empty affected entities",
            rule.change_type
        );
        assert!(
            !analysis.suggested_adjustments.is_empty(),
            "tag `{}` has empty adjustments",
            rule.change_type
        );
        let (lo, hi) = rule.score_range;
        assert!((lo..hi).contains(&analysis.impact_score));
    }
}

#[test]
fn task_status_change_uses_expected_fallback_entry() {
    let conn = open_db_in_memory().unwrap();
    let service = ChangeService::new(&conn);

    let analysis = service.analyze_change(&ChangeEvent::new("task_status_changed", 7));
    assert_eq!(analysis.affected_entities, ["project", "goals", "journal"]);
    assert!((15..35).contains(&analysis.impact_score));
    assert_eq!(analysis.psychological_impact, PsychologicalImpact::Low);
}

#[test]
fn unknown_tag_falls_into_generic_entry() {
    let conn = open_db_in_memory().unwrap();
    let service = ChangeService::new(&conn);

    let analysis = service.analyze_change(&ChangeEvent::new("totally_unknown_tag", 1));
    assert_eq!(analysis.affected_entities, ["general"]);
    assert!((10..30).contains(&analysis.impact_score));
}

#[test]
fn analysis_is_idempotent_for_the_same_change() {
    let conn = open_db_in_memory().unwrap();
    let service = ChangeService::new(&conn);
    let change = ChangeEvent::new("goal_updated", 3);

    assert_eq!(
        service.analyze_change(&change),
        service.analyze_change(&change)
    );
}

#[test]
fn valid_model_reply_passes_through_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let model = CannedModel {
        reply: r#"{"affectedEntities":["finance","goals"],"suggestedAdjustments":["Rebalance the monthly budget"],"impactScore":88,"psychologicalImpact":"high"}"#,
    };
    let service = ChangeService::with_model(&conn, Box::new(model));

    let analysis = service.analyze_change(&ChangeEvent::new("transaction_added", 9));
    assert_eq!(analysis.affected_entities, ["finance", "goals"]);
    assert_eq!(
        analysis.suggested_adjustments,
        ["Rebalance the monthly budget"]
    );
    assert_eq!(analysis.impact_score, 88);
    assert_eq!(analysis.psychological_impact, PsychologicalImpact::High);
}

#[test]
fn fenced_model_reply_is_accepted() {
    let conn = open_db_in_memory().unwrap();
    let model = CannedModel {
        reply: "```json\n{\"affectedEntities\":[\"journal\"],\"impactScore\":12}\n```",
    };
    let service = ChangeService::with_model(&conn, Box::new(model));

    let analysis = service.analyze_change(&ChangeEvent::new("journal_entry_added", 2));
    assert_eq!(analysis.affected_entities, ["journal"]);
    assert_eq!(analysis.impact_score, 12);
    // Missing fields default rather than fail.
    assert!(analysis.suggested_adjustments.is_empty());
    assert_eq!(analysis.psychological_impact, PsychologicalImpact::Low);
}

#[test]
fn malformed_model_reply_degrades_to_rule_table() {
    let conn = open_db_in_memory().unwrap();
    let model = CannedModel {
        reply: "The change looks significant, maybe 60 out of 100?",
    };
    let service = ChangeService::with_model(&conn, Box::new(model));

    let change = ChangeEvent::new("habit_completed", 4);
    let analysis = service.analyze_change(&change);
    assert_eq!(analysis, fallback_analysis("habit_completed"));
}

#[test]
fn transport_failure_degrades_to_rule_table() {
    let conn = open_db_in_memory().unwrap();
    let service = ChangeService::with_model(&conn, Box::new(OfflineModel));

    let analysis = service.analyze_change(&ChangeEvent::new("project_status_changed", 11));
    assert_eq!(analysis, fallback_analysis("project_status_changed"));
}

#[test]
fn store_failure_does_not_break_analysis() {
    let engine = ImpactEngine::new(BrokenStore);
    let analysis = engine.analyze(&ChangeEvent::new("task_due_date_changed", 5));
    assert_eq!(analysis, fallback_analysis("task_due_date_changed"));
}
