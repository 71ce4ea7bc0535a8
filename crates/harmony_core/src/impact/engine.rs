//! Impact-analysis engine.
//!
//! # Responsibility
//! - Turn one change event into an impact summary, preferring the remote
//!   model and degrading to the static rule table.
//!
//! # Invariants
//! - `analyze` is total: store failures, transport failures and malformed
//!   model replies all degrade to the rule table instead of surfacing.
//! - A well-formed model reply passes through verbatim; missing fields
//!   default to empty lists, score 0 and a low bucket.

use crate::ai::client::TextModel;
use crate::impact::rules::fallback_analysis;
use crate::model::change::{ChangeEvent, ImpactAnalysis, PsychologicalImpact};
use crate::repo::snapshot::SnapshotSource;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

// Models often wrap JSON replies in ``` or ```json fences.
static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence regex"));

/// Reply shape expected from the model, all fields optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelReply {
    affected_entities: Vec<String>,
    suggested_adjustments: Vec<String>,
    impact_score: i64,
    psychological_impact: Option<String>,
}

/// Engine mapping change events to impact summaries.
///
/// The store is consumed through [`SnapshotSource`] and the model through
/// [`TextModel`], so both can be replaced in tests.
pub struct ImpactEngine<'m, S: SnapshotSource> {
    store: S,
    model: Option<&'m dyn TextModel>,
}

impl<'m, S: SnapshotSource> ImpactEngine<'m, S> {
    /// Creates an engine with no model; every analysis uses the rule table.
    pub fn new(store: S) -> Self {
        Self { store, model: None }
    }

    /// Creates an engine that consults the model before the rule table.
    pub fn with_model(store: S, model: &'m dyn TextModel) -> Self {
        Self {
            store,
            model: Some(model),
        }
    }

    /// Analyzes one change event. Never fails.
    pub fn analyze(&self, change: &ChangeEvent) -> ImpactAnalysis {
        info!(
            "event=impact_analyze module=impact status=start change_type={} entity_id={}",
            change.change_type, change.entity_id
        );

        let context = match self.store.gather() {
            Ok(snapshot) => {
                debug!(
                    "event=impact_context module=impact status=ok records={}",
                    snapshot.total_records()
                );
                snapshot.to_context_json()
            }
            Err(err) => {
                warn!(
                    "event=impact_context module=impact status=error error={err}; continuing with empty context"
                );
                Value::Null
            }
        };

        // Local signal: size of the serialized context. Logged only; the
        // heuristic keys on the rule table or model output.
        let context_bytes = context.to_string().len();
        debug!("event=impact_local_signal module=impact status=ok context_bytes={context_bytes}");

        if let Some(model) = self.model {
            let payload = serde_json::json!({ "change": change, "context": context });
            match model.complete("impact_analysis", &payload) {
                Ok(reply) => {
                    if let Some(analysis) = parse_model_reply(&reply) {
                        info!(
                            "event=impact_analyze module=impact status=ok source=model change_type={} score={}",
                            change.change_type, analysis.impact_score
                        );
                        return analysis;
                    }
                    warn!(
                        "event=impact_analyze module=impact status=fallback reason=unparseable_reply change_type={}",
                        change.change_type
                    );
                }
                Err(err) => {
                    warn!(
                        "event=impact_analyze module=impact status=fallback reason=model_error change_type={} error={err}",
                        change.change_type
                    );
                }
            }
        }

        let analysis = fallback_analysis(&change.change_type);
        info!(
            "event=impact_analyze module=impact status=ok source=rules change_type={} score={}",
            change.change_type, analysis.impact_score
        );
        analysis
    }
}

/// Extracts an impact analysis from raw model text.
///
/// Strips a markdown code fence if present, then parses JSON. Returns `None`
/// when the reply is not valid JSON of the expected shape.
fn parse_model_reply(reply: &str) -> Option<ImpactAnalysis> {
    let body = CODE_FENCE_RE
        .captures(reply)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| reply.trim(), |inner| inner.as_str());

    let parsed: ModelReply = serde_json::from_str(body).ok()?;
    let score = parsed.impact_score.clamp(0, 100) as u8;
    let bucket = parsed
        .psychological_impact
        .as_deref()
        .and_then(PsychologicalImpact::parse)
        .unwrap_or(PsychologicalImpact::Low);

    Some(ImpactAnalysis {
        affected_entities: parsed.affected_entities,
        suggested_adjustments: parsed.suggested_adjustments,
        impact_score: score,
        psychological_impact: bucket,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json_reply() {
        let reply = r#"{"affectedEntities":["project"],"suggestedAdjustments":["Shift the deadline"],"impactScore":72,"psychologicalImpact":"high"}"#;
        let analysis = parse_model_reply(reply).unwrap();
        assert_eq!(analysis.affected_entities, ["project"]);
        assert_eq!(analysis.impact_score, 72);
        assert_eq!(analysis.psychological_impact, PsychologicalImpact::High);
    }

    #[test]
    fn parses_fenced_json_reply() {
        let reply = "Here you go:\n```json\n{\"impactScore\": 41}\n```";
        let analysis = parse_model_reply(reply).unwrap();
        assert_eq!(analysis.impact_score, 41);
        assert!(analysis.affected_entities.is_empty());
        assert_eq!(analysis.psychological_impact, PsychologicalImpact::Low);
    }

    #[test]
    fn missing_fields_default_to_empty_zero_low() {
        let analysis = parse_model_reply("{}").unwrap();
        assert!(analysis.affected_entities.is_empty());
        assert!(analysis.suggested_adjustments.is_empty());
        assert_eq!(analysis.impact_score, 0);
        assert_eq!(analysis.psychological_impact, PsychologicalImpact::Low);
    }

    #[test]
    fn out_of_range_scores_clamp() {
        let analysis = parse_model_reply(r#"{"impactScore": 900}"#).unwrap();
        assert_eq!(analysis.impact_score, 100);
        let analysis = parse_model_reply(r#"{"impactScore": -5}"#).unwrap();
        assert_eq!(analysis.impact_score, 0);
    }

    #[test]
    fn unknown_bucket_defaults_to_low() {
        let analysis = parse_model_reply(r#"{"psychologicalImpact":"devastating"}"#).unwrap();
        assert_eq!(analysis.psychological_impact, PsychologicalImpact::Low);
    }

    #[test]
    fn prose_reply_is_rejected() {
        assert!(parse_model_reply("I think this change is fine.").is_none());
        assert!(parse_model_reply("").is_none());
    }
}
