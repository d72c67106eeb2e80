//! AI Gap-Filler (C6, §4.6). Asks an [`LlmProvider`] for a bounded set of
//! named gaps, parses a strict top-level JSON object keyed by gap name, and
//! accepts a candidate only if its raw text reappears in the source
//! document (§4.6 "no fabrication"). Never returns `Err` to the caller —
//! any failure (network, malformed JSON, deadline) yields an empty map plus
//! a recorded reason, logged at `warn`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::config::{EngineConfig, YearWindow};
use crate::kinds::{FieldKind, Method, PartyRole};
use crate::record::{FieldExtraction, FieldValue, PartyBlock};
use crate::regex_extractor::normalize_and_validate;
use crate::validators;

/// Base confidence for an AI-sourced field before penalties (§4.6).
const BASE_AI_CONFIDENCE: u8 = 78;
/// Penalty applied when the candidate only matches the source text after
/// case-folding and punctuation-stripping (§4.6 "-8 for a fuzzy match").
const FUZZY_MATCH_PENALTY: i32 = 8;

/// A minimal chat-completion surface. Implemented by the embedding
/// application; this crate ships no concrete provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        deadline: Duration,
    ) -> Result<String, String>;
}

/// A single named gap the caller wants filled, with the kind it should
/// resolve to (so the response can be validated the same way C2/C3/C5 are).
#[derive(Debug, Clone)]
pub struct GapRequest {
    pub name: String,
    pub kind: FieldKind,
    pub party_role: Option<PartyRole>,
}

#[derive(Debug, Default)]
pub struct GapFillResult {
    pub fields: BTreeMap<FieldKind, FieldExtraction>,
    pub parties: BTreeMap<PartyRole, PartyBlock>,
}

/// Runs C6 for `gaps` against `text`, through `provider`. §4.6 step-by-step:
/// build a strict-JSON prompt naming exactly the requested gaps, parse the
/// response as a JSON object with those keys and no others honored, then
/// drop any value whose raw text does not reappear in `text`.
pub async fn fill_gaps(
    provider: &dyn LlmProvider,
    text: &str,
    gaps: &[GapRequest],
    config: &EngineConfig,
    today: NaiveDate,
) -> GapFillResult {
    if gaps.is_empty() {
        return GapFillResult::default();
    }

    let truncated: String = text.chars().take(config.ai_max_text_chars).collect();
    let prompt = build_prompt(&truncated, gaps);
    let deadline = Duration::from_millis(config.ai_call_deadline_ms);

    let response = match provider.generate(&prompt, 800, 0.0, deadline).await {
        Ok(r) => r,
        Err(err) => {
            warn!(error = %err, "ai gap-filler call failed, returning empty result");
            return GapFillResult::default();
        }
    };

    let parsed: Value = match serde_json::from_str(response.trim()) {
        Ok(v) => v,
        Err(err) => {
            warn!(error = %err.to_string(), "ai gap-filler returned non-JSON response");
            return GapFillResult::default();
        }
    };

    parse_gap_response(&parsed, &truncated, gaps, config.year_window, today)
}

fn build_prompt(text: &str, gaps: &[GapRequest]) -> String {
    let names: Vec<&str> = gaps.iter().map(|g| g.name.as_str()).collect();
    format!(
        "You are extracting shipping/logistics fields from the correspondence below. \
         Return a single JSON object whose top-level keys are exactly: {}. \
         Each value must be copied verbatim from the text, or null if absent. \
         Do not invent values not present in the text.\n\n---\n{}\n---",
        names.join(", "),
        text
    )
}

fn parse_gap_response(
    parsed: &Value,
    source_text: &str,
    gaps: &[GapRequest],
    year_window: YearWindow,
    today: NaiveDate,
) -> GapFillResult {
    let mut result = GapFillResult::default();
    let Some(obj) = parsed.as_object() else {
        warn!("ai gap-filler response was not a JSON object");
        return result;
    };

    for gap in gaps {
        let Some(raw_value) = obj.get(&gap.name).and_then(|v| v.as_str()) else { continue };
        let raw_value = raw_value.trim();
        if raw_value.is_empty() || !is_plausible_gap_value(raw_value, crate::data::STOP_WORDS) {
            continue;
        }

        if let Some(role) = gap.party_role {
            if let Some(block) = accept_party_candidate(raw_value, source_text) {
                result.parties.insert(role, block);
            }
            continue;
        }

        let Some((matched_span, fuzzy)) = find_in_source(raw_value, source_text) else { continue };

        let Some((value, weak)) =
            normalize_and_validate(gap.kind, default_validator_for(gap.kind), default_normalizer_for(gap.kind), &matched_span, today, year_window)
        else {
            continue;
        };

        let mut confidence: i32 = BASE_AI_CONFIDENCE as i32;
        if fuzzy {
            confidence -= FUZZY_MATCH_PENALTY;
        }
        let confidence = confidence.clamp(0, 100) as u8;
        let confidence = if weak { confidence.min(60) } else { confidence };

        result.fields.insert(
            gap.kind,
            FieldExtraction {
                kind: gap.kind,
                value,
                raw_span: matched_span,
                confidence,
                method: Method::Ai,
                pattern_id: None,
            },
        );
    }

    result
}

/// A party block from AI is accepted only if its name line appears in the
/// source text; address sub-lines are not independently fabrication-checked
/// since they were not independently generated (the model copies a block).
fn accept_party_candidate(raw_value: &str, source_text: &str) -> Option<PartyBlock> {
    let first_line = raw_value.lines().next()?.trim();
    if first_line.is_empty() {
        return None;
    }
    find_in_source(first_line, source_text)?;
    let mut block = PartyBlock { name: Some(first_line.to_string()), ..PartyBlock::default() };
    block.address_lines = raw_value.lines().skip(1).map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect();
    Some(block)
}

/// Fabrication gate (§4.6, §8 item 1): the candidate's raw text must appear
/// in the source, literally or after case-folding and punctuation-stripping.
/// Returns the literal source substring matched (never the AI's own casing)
/// plus whether the match only succeeded fuzzily.
fn find_in_source(candidate: &str, source_text: &str) -> Option<(String, bool)> {
    if let Some(pos) = source_text.find(candidate) {
        return Some((source_text[pos..pos + candidate.len()].to_string(), false));
    }

    let normalize = |s: &str| -> String { s.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_ascii_lowercase() };
    let needle = normalize(candidate);
    if needle.is_empty() {
        return None;
    }

    // Fuzzy scan: slide a window of source text no more than twice the
    // candidate's length and compare normalized forms; a reasonable bound
    // since correspondence fields are short (identifiers, names, dates).
    let window_chars = (candidate.chars().count() * 2).max(8);
    let chars: Vec<char> = source_text.chars().collect();
    for start in 0..chars.len() {
        let end = (start + window_chars).min(chars.len());
        if end <= start {
            break;
        }
        let window: String = chars[start..end].iter().collect();
        if normalize(&window).contains(&needle) {
            return Some((candidate.trim().to_string(), true));
        }
    }
    None
}

fn default_validator_for(kind: FieldKind) -> crate::catalog::ValidatorId {
    use crate::catalog::ValidatorId;
    match kind {
        FieldKind::ContainerNumber => ValidatorId::ContainerCheckDigit,
        FieldKind::SealNumber => ValidatorId::SealNumber,
        FieldKind::PortOfLoadingCode | FieldKind::PortOfDischargeCode => ValidatorId::UnLocode,
        FieldKind::VoyageNumber => ValidatorId::VoyageNumber,
        FieldKind::VesselName => ValidatorId::VesselName,
        FieldKind::PortOfLoading | FieldKind::PortOfDischarge => ValidatorId::PortName,
        k if k.is_date() => ValidatorId::Date,
        _ => ValidatorId::None,
    }
}

fn default_normalizer_for(kind: FieldKind) -> crate::catalog::NormalizerId {
    use crate::catalog::NormalizerId;
    match kind {
        FieldKind::GrossWeight | FieldKind::NetWeight => NormalizerId::WeightKg,
        FieldKind::Volume => NormalizerId::VolumeCbm,
        FieldKind::Amount => NormalizerId::Money,
        k if k.is_date() => NormalizerId::Date,
        _ => NormalizerId::UppercaseTrim,
    }
}

/// Rejects a candidate against [`validators::is_stop_word`] before it is
/// even looked up in the source text (§4.2's exclusion check applied to
/// AI-returned gap values, the same gate `normalize_and_validate` applies to
/// regex/schema candidates).
pub fn is_plausible_gap_value(candidate: &str, stop_words: &[&str]) -> bool {
    !validators::is_stop_word(candidate, stop_words)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> Result<String, String> {
            Ok(self.response.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl LlmProvider for FailingProvider {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> Result<String, String> {
            Err("connection refused".to_string())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 30).unwrap()
    }

    #[tokio::test]
    async fn accepts_a_value_present_verbatim_in_source() {
        let provider = StubProvider { response: r#"{"vessel_name": "EVER GIVEN"}"#.to_string() };
        let text = "The cargo is aboard EVER GIVEN, departing soon.";
        let gaps = vec![GapRequest { name: "vessel_name".to_string(), kind: FieldKind::VesselName, party_role: None }];
        let config = EngineConfig::default();
        let result = fill_gaps(&provider, text, &gaps, &config, today()).await;
        let field = result.fields.get(&FieldKind::VesselName).expect("vessel field");
        assert_eq!(field.value, FieldValue::Text("EVER GIVEN".to_string()));
        assert_eq!(field.method, Method::Ai);
        assert_eq!(field.confidence, BASE_AI_CONFIDENCE);
    }

    #[tokio::test]
    async fn rejects_a_value_not_present_in_source() {
        let provider = StubProvider { response: r#"{"vessel_name": "MADE UP VESSEL"}"#.to_string() };
        let text = "No vessel mentioned anywhere in this message.";
        let gaps = vec![GapRequest { name: "vessel_name".to_string(), kind: FieldKind::VesselName, party_role: None }];
        let config = EngineConfig::default();
        let result = fill_gaps(&provider, text, &gaps, &config, today()).await;
        assert!(result.fields.get(&FieldKind::VesselName).is_none());
    }

    #[tokio::test]
    async fn rejects_a_stop_word_even_when_present_in_source() {
        let provider = StubProvider { response: r#"{"vessel_name": "TBD"}"#.to_string() };
        let text = "Vessel to be confirmed: TBD once booked.";
        let gaps = vec![GapRequest { name: "vessel_name".to_string(), kind: FieldKind::VesselName, party_role: None }];
        let config = EngineConfig::default();
        let result = fill_gaps(&provider, text, &gaps, &config, today()).await;
        assert!(result.fields.get(&FieldKind::VesselName).is_none());
    }

    #[tokio::test]
    async fn provider_failure_yields_empty_result_not_an_error() {
        let provider = FailingProvider;
        let text = "irrelevant";
        let gaps = vec![GapRequest { name: "vessel_name".to_string(), kind: FieldKind::VesselName, party_role: None }];
        let config = EngineConfig::default();
        let result = fill_gaps(&provider, text, &gaps, &config, today()).await;
        assert!(result.fields.is_empty());
    }

    #[tokio::test]
    async fn empty_gap_list_never_calls_the_provider() {
        let provider = FailingProvider;
        let config = EngineConfig::default();
        let result = fill_gaps(&provider, "text", &[], &config, today()).await;
        assert!(result.fields.is_empty());
        assert!(result.parties.is_empty());
    }
}
