//! Quality Judge (C8, §4.8). Reviews a merged record's fields against the
//! source text and returns a [`Judgement`]: per-field verdicts, record-level
//! issues, and a terminal [`RecordVerdict`]. Like C6, failures never
//! propagate as `Err` — a judge call failure yields a conservative
//! `needs_review` verdict carrying the record's own confidence as score
//! (§4.8 "fail safe, never silently approve").

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::EngineConfig;
use crate::kinds::{FieldKind, FieldVerdict, RecordVerdict, Severity};
use crate::record::{Correction, ExtractionRecord, FieldJudgement, FieldSlot, FieldValue, Issue, Judgement};

#[async_trait]
pub trait JudgeProvider: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32, deadline: Duration) -> Result<String, String>;
}

/// §4.8 step-by-step: build a prompt from the record's fields and a
/// (possibly truncated) copy of the source text, parse a structured verdict,
/// and fall back to `needs_review` on any failure to parse or call.
pub async fn judge(provider: &dyn JudgeProvider, text: &str, record: &ExtractionRecord, config: &EngineConfig) -> Judgement {
    let truncated: String = text.chars().take(config.judge_max_text_chars).collect();
    let prompt = build_prompt(&truncated, record);
    let deadline = Duration::from_millis(config.judge_call_deadline_ms);

    let response = match provider.generate(&prompt, 1200, 0.0, deadline).await {
        Ok(r) => r,
        Err(err) => {
            warn!(error = %err, "judge call failed, falling back to needs_review");
            return fallback_judgement(record);
        }
    };

    match serde_json::from_str::<Value>(response.trim()) {
        Ok(parsed) => parse_judgement(&parsed, record),
        Err(err) => {
            warn!(error = %err.to_string(), "judge returned non-JSON response, falling back to needs_review");
            fallback_judgement(record)
        }
    }
}

fn build_prompt(text: &str, record: &ExtractionRecord) -> String {
    let mut lines = Vec::new();
    for (kind, slot) in &record.fields {
        match slot {
            FieldSlot::Single(f) => lines.push(format!("{kind}: {} (confidence {})", f.value.canonical_form(), f.confidence)),
            FieldSlot::Multi(items) => {
                for f in items {
                    lines.push(format!("{kind}[]: {} (confidence {})", f.value.canonical_form(), f.confidence));
                }
            }
        }
    }
    format!(
        "Review the following extracted shipping fields against the source correspondence. \
         For each field, return a verdict (correct, likely_correct, suspicious, incorrect, missing), \
         a short reason, and a suggested_value if you believe the extraction is wrong. \
         Return a JSON object: {{\"field_judgements\": [...], \"issues\": [...], \"score\": 0-100, \"verdict\": \"approved\"|\"needs_review\"|\"rejected\"}}.\n\n\
         Extracted fields:\n{}\n\n---\n{}\n---",
        lines.join("\n"),
        text
    )
}

/// §8 item 8: corrections derived from a judgement never raise confidence.
/// Builds the `Correction` list the orchestrator applies via
/// [`ExtractionRecord::with_corrections`], keeping only suggestions for
/// fields the judge called `incorrect` with a concrete `suggested_value`.
pub fn corrections_from_judgement(record: &ExtractionRecord, judgement: &Judgement) -> Vec<Correction> {
    judgement
        .field_judgements
        .iter()
        .filter(|fj| fj.verdict == FieldVerdict::Incorrect)
        .filter_map(|fj| {
            let suggested = fj.suggested_value.clone()?;
            let previous = record.field(fj.kind)?.value.clone();
            Some(Correction { kind: fj.kind, previous_value: previous, new_value: suggested, reason: fj.reason.clone() })
        })
        .collect()
}

fn fallback_judgement(record: &ExtractionRecord) -> Judgement {
    Judgement {
        field_judgements: Vec::new(),
        issues: vec![Issue {
            severity: Severity::Warning,
            field: None,
            description: "quality judge call failed".to_string(),
            impact: "record was not independently reviewed; treat as unverified".to_string(),
        }],
        score: record.metadata.overall_confidence,
        verdict: RecordVerdict::NeedsReview,
    }
}

fn parse_judgement(parsed: &Value, record: &ExtractionRecord) -> Judgement {
    let Some(obj) = parsed.as_object() else {
        return fallback_judgement(record);
    };

    let field_judgements = obj
        .get("field_judgements")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(parse_field_judgement).collect())
        .unwrap_or_default();

    let issues = obj
        .get("issues")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(parse_issue).collect())
        .unwrap_or_default();

    let score = obj.get("score").and_then(|v| v.as_u64()).map(|n| n.min(100) as u8).unwrap_or(record.metadata.overall_confidence);

    let verdict = obj
        .get("verdict")
        .and_then(|v| v.as_str())
        .and_then(parse_verdict)
        .unwrap_or(RecordVerdict::NeedsReview);

    Judgement { field_judgements, issues, score, verdict }
}

fn parse_field_judgement(value: &Value) -> Option<FieldJudgement> {
    let obj = value.as_object()?;
    let kind = parse_field_kind(obj.get("kind")?.as_str()?)?;
    let verdict = parse_field_verdict(obj.get("verdict")?.as_str()?)?;
    let reason = obj.get("reason").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let suggested_value = obj.get("suggested_value").and_then(parse_suggested_value);
    Some(FieldJudgement { kind, verdict, reason, suggested_value })
}

/// Parses the judge's `suggested_value` (§4.8 step-by-step, the model's own
/// corrected value for a field it calls `incorrect`). Accepts either the
/// tagged `FieldValue` shape (`{"type": "text", "0": "..."}` etc.) this
/// crate itself serializes, or a bare JSON string/number for the common
/// text/number correction case, since a model is not guaranteed to echo the
/// tagged shape back verbatim.
fn parse_suggested_value(value: &Value) -> Option<FieldValue> {
    if value.is_null() {
        return None;
    }
    if let Ok(parsed) = serde_json::from_value::<FieldValue>(value.clone()) {
        return Some(parsed);
    }
    match value {
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Number(n) => n.as_i64().map(FieldValue::Number),
        _ => None,
    }
}

fn parse_issue(value: &Value) -> Option<Issue> {
    let obj = value.as_object()?;
    let severity = match obj.get("severity")?.as_str()? {
        "critical" => Severity::Critical,
        "warning" => Severity::Warning,
        "info" => Severity::Info,
        _ => return None,
    };
    let field = obj.get("field").and_then(|v| v.as_str()).and_then(parse_field_kind);
    let description = obj.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let impact = obj.get("impact").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    Some(Issue { severity, field, description, impact })
}

fn parse_verdict(s: &str) -> Option<RecordVerdict> {
    match s {
        "approved" => Some(RecordVerdict::Approved),
        "needs_review" => Some(RecordVerdict::NeedsReview),
        "rejected" => Some(RecordVerdict::Rejected),
        _ => None,
    }
}

fn parse_field_verdict(s: &str) -> Option<FieldVerdict> {
    match s {
        "correct" => Some(FieldVerdict::Correct),
        "likely_correct" => Some(FieldVerdict::LikelyCorrect),
        "suspicious" => Some(FieldVerdict::Suspicious),
        "incorrect" => Some(FieldVerdict::Incorrect),
        "missing" => Some(FieldVerdict::Missing),
        _ => None,
    }
}

fn parse_field_kind(s: &str) -> Option<FieldKind> {
    FieldKind::ALL.iter().copied().find(|k| k.to_string() == s)
}

/// Decides whether C8 should run at all (§4.8 policy, any one holding is
/// sufficient): disabled globally short-circuits to `false`; otherwise the
/// document type is declared high-value, the overall confidence falls in
/// the medium band (`[low, medium_high)`), AI produced more fields than
/// regex+schema combined, or ≥2 critical identifiers came from AI.
pub fn should_invoke_judge(record: &ExtractionRecord, config: &EngineConfig) -> bool {
    if !config.judge_enabled {
        return false;
    }

    let high_value = record.document_type.as_deref().is_some_and(|dt| config.judge_high_value_doc_types.iter().any(|d| d == dt));

    let thresholds = config.confidence_thresholds;
    let medium_confidence_band =
        record.metadata.overall_confidence >= thresholds.low && record.metadata.overall_confidence < thresholds.medium_high;

    let ai_dominant = record.metadata.ai_field_count as usize > (record.metadata.regex_field_count + record.metadata.schema_field_count) as usize;

    let ai_critical_identifiers = record
        .metadata
        .field_sources
        .iter()
        .filter(|(kind, method)| kind.is_critical_identifier() && **method == crate::kinds::Method::Ai)
        .count();

    high_value || medium_confidence_band || ai_dominant || ai_critical_identifiers >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Method, Strategy};
    use crate::record::{FieldExtraction, FieldValue, Metadata};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn sample_record(confidence: u8, document_type: Option<&str>) -> ExtractionRecord {
        let mut fields = BTreeMap::new();
        fields.insert(
            FieldKind::BookingNumber,
            FieldSlot::Single(FieldExtraction {
                kind: FieldKind::BookingNumber,
                value: FieldValue::Text("234567890".to_string()),
                raw_span: "BKG#234567890".to_string(),
                confidence,
                method: Method::RegexSubject,
                pattern_id: None,
            }),
        );
        ExtractionRecord {
            id: Uuid::new_v4(),
            source_ref: "msg-1".to_string(),
            sender_category: None,
            carrier: None,
            document_type: document_type.map(|s| s.to_string()),
            fields,
            parties: BTreeMap::new(),
            tables: BTreeMap::new(),
            metadata: Metadata {
                processing_time_ms: 0,
                regex_time_ms: 0,
                ai_time_ms: 0,
                regex_field_count: 1,
                ai_field_count: 0,
                schema_field_count: 0,
                total_field_count: 1,
                regex_confidence: confidence,
                overall_confidence: confidence,
                strategy: Strategy::RegexOnly,
                field_sources: BTreeMap::new(),
                party_sources: BTreeMap::new(),
                ai_called: false,
                ai_reason: None,
                catalog_version: 1,
                schema_set_version: 1,
            },
            judgement: None,
            state: crate::record::RecordState::Created,
            corrected_from: None,
            corrections_applied: Vec::new(),
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl JudgeProvider for FailingProvider {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> Result<String, String> {
            Err("timeout".to_string())
        }
    }

    struct StubProvider {
        response: String,
    }

    #[async_trait]
    impl JudgeProvider for StubProvider {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> Result<String, String> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn judge_failure_yields_needs_review_with_original_confidence() {
        let record = sample_record(88, None);
        let config = EngineConfig::default();
        let judgement = judge(&FailingProvider, "text", &record, &config).await;
        assert_eq!(judgement.verdict, RecordVerdict::NeedsReview);
        assert_eq!(judgement.score, 88);
    }

    #[tokio::test]
    async fn approved_verdict_parses_from_structured_response() {
        let response = r#"{"field_judgements": [], "issues": [], "score": 95, "verdict": "approved"}"#;
        let provider = StubProvider { response: response.to_string() };
        let record = sample_record(90, None);
        let config = EngineConfig::default();
        let judgement = judge(&provider, "text", &record, &config).await;
        assert_eq!(judgement.verdict, RecordVerdict::Approved);
        assert_eq!(judgement.score, 95);
    }

    #[test]
    fn high_value_doc_type_always_invokes_judge() {
        let record = sample_record(95, Some("hbl"));
        let config = EngineConfig::default();
        assert!(should_invoke_judge(&record, &config));
    }

    #[test]
    fn medium_band_confidence_invokes_judge_even_for_ordinary_doc_type() {
        let record = sample_record(60, Some("booking_confirmation"));
        let config = EngineConfig::default();
        assert!(should_invoke_judge(&record, &config));
    }

    #[test]
    fn high_confidence_ordinary_doc_type_does_not_invoke_judge() {
        let record = sample_record(95, Some("booking_confirmation"));
        let config = EngineConfig::default();
        assert!(!should_invoke_judge(&record, &config));
    }

    #[test]
    fn disabled_judge_never_invoked() {
        let record = sample_record(10, Some("hbl"));
        let mut config = EngineConfig::default();
        config.judge_enabled = false;
        assert!(!should_invoke_judge(&record, &config));
    }

    #[tokio::test]
    async fn incorrect_verdict_with_suggested_value_produces_a_correction() {
        let response = r#"{
            "field_judgements": [
                {"kind": "booking_number", "verdict": "incorrect", "reason": "transposed digits", "suggested_value": "234567899"}
            ],
            "issues": [],
            "score": 40,
            "verdict": "needs_review"
        }"#;
        let provider = StubProvider { response: response.to_string() };
        let record = sample_record(60, None);
        let config = EngineConfig::default();
        let judgement = judge(&provider, "text", &record, &config).await;

        let fj = &judgement.field_judgements[0];
        assert_eq!(fj.verdict, FieldVerdict::Incorrect);
        assert_eq!(fj.suggested_value, Some(FieldValue::Text("234567899".to_string())));

        let corrections = corrections_from_judgement(&record, &judgement);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].new_value, FieldValue::Text("234567899".to_string()));
    }

    #[test]
    fn null_suggested_value_parses_to_none() {
        let value = serde_json::json!({
            "kind": "booking_number",
            "verdict": "suspicious",
            "reason": "looks odd",
            "suggested_value": null
        });
        let fj = parse_field_judgement(&value).expect("parses");
        assert_eq!(fj.suggested_value, None);
    }
}
