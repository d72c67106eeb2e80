//! Pipeline Orchestrator (C9, §4.9). Decides which layers to invoke for a
//! given input, enforces budgets, and emits the final [`ExtractionRecord`]
//! with full metadata. This is the crate's single public entry point;
//! everything else is a collaborator it wires together.
//!
//! Per §7's propagation policy, [`process`] never returns `Err` for
//! `InputError`, `PatternInvariantViolation`, `SchemaMismatch`,
//! `LLMFailure`, or `JudgeFailure` — those are folded into the record's
//! `issues`/metadata. The function signature still returns
//! [`crate::error::Result`] because a future `RepositoryFailure`-raising
//! caller step composes naturally with `?`; today it is always `Ok`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::ai_gap_filler::{self, GapRequest, LlmProvider};
use crate::catalog::PatternCatalog;
use crate::classifier::{self, Classification};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::judge::{self, JudgeProvider};
use crate::kinds::{FieldKind, Method, PartyRole, Strategy};
use crate::merger::{self, MergeInput, MergeOutput};
use crate::record::{ExtractionRecord, FieldSlot, Issue, Metadata, RecordState, Severity};
use crate::regex_extractor::{self, RegexExtractorInput};
use crate::schema::{self, schemas_data::SCHEMA_SET_VERSION};

/// The input record the core consumes (§6 "Input format"). All fields are
/// plain text; no HTML, no binary, no attachments.
#[derive(Debug, Clone, Default)]
pub struct EngineInput {
    pub source_ref: String,
    pub subject: String,
    pub body_text: String,
    pub pdf_text: Option<String>,
    pub sender_identity: Option<String>,
    pub original_sender_identity: Option<String>,
    pub carrier_hint: Option<String>,
    pub document_type: Option<String>,
}

impl EngineInput {
    /// The combined text C3/C5/C6/C8 all operate over: subject first (so
    /// `subject_len` marks the subject region), then body, then any PDF
    /// text, truncated to `max_chars` (§6 "Maximum combined text length").
    fn combined_text(&self, max_chars: usize) -> (String, usize) {
        let mut combined = self.subject.clone();
        let subject_len = combined.len();
        combined.push('\n');
        combined.push_str(&self.body_text);
        if let Some(pdf) = &self.pdf_text {
            combined.push('\n');
            combined.push_str(pdf);
        }
        let truncated: String = combined.chars().take(max_chars).collect();
        let subject_len = subject_len.min(truncated.len());
        (truncated, subject_len)
    }
}

/// Runs the full pipeline for one input (§4.9 steps 1-7).
pub async fn process(
    input: &EngineInput,
    catalog: &PatternCatalog,
    config: &EngineConfig,
    llm: &dyn LlmProvider,
    judge_provider: &dyn JudgeProvider,
    today: NaiveDate,
) -> Result<ExtractionRecord> {
    match prepare(input, catalog, config, today) {
        Prepared::Done(record) => Ok(record),
        Prepared::NeedsFinish(prepared) => Ok(finish(prepared, config, llm, judge_provider, today).await),
    }
}

/// The CPU-bound half of §4.9 (steps 1-4): classification, C3/C5 extraction,
/// the first merge, and the gap-decision ladder. Contains no `.await` point,
/// so [`crate::batch`] can run it for a whole batch unbounded before the
/// AI-call concurrency cap applies to only the half that needs it.
pub(crate) fn prepare(input: &EngineInput, catalog: &PatternCatalog, config: &EngineConfig, today: NaiveDate) -> Prepared {
    let start = Instant::now();
    let deadline = Duration::from_millis(config.record_deadline_ms);

    let mut issues = Vec::new();

    if input.subject.trim().is_empty() && input.body_text.trim().is_empty() && input.pdf_text.as_deref().unwrap_or("").trim().is_empty() {
        return Prepared::Done(empty_record(input, config, today, "input text was empty"));
    }

    let (text, subject_len) = input.combined_text(config.max_text_chars);
    if text.chars().count() >= config.max_text_chars {
        issues.push(Issue {
            severity: Severity::Warning,
            field: None,
            description: "input text exceeded the configured maximum and was truncated".to_string(),
            impact: "fields beyond the truncation point cannot be extracted".to_string(),
        });
    }

    // Step 1: sender/carrier classification.
    let Classification { sender_category, carrier } =
        classifier::classify(input.sender_identity.as_deref(), input.original_sender_identity.as_deref());
    let carrier = input.carrier_hint.clone().or(carrier);

    info!(
        source_ref = %input.source_ref,
        sender_category = ?sender_category,
        carrier = ?carrier,
        document_type = ?input.document_type,
        "processing extraction input"
    );

    // Step 2: C3 and C5 run over the full text (may run concurrently; here
    // sequentially since both are CPU-bound and sub-millisecond for inputs
    // of this size — see SPEC_FULL §10.5 for the rayon-backed pairing used
    // by the batch façade when many records run at once).
    let regex_start = Instant::now();
    let regex_input = RegexExtractorInput { text: &text, subject_len, carrier_hint: carrier.as_deref() };
    let (regex_fields, dropped_candidates) = regex_extractor::extract(&regex_input, catalog, config, today);
    let regex_time_ms = regex_start.elapsed().as_millis() as u64;

    let schema = input.document_type.as_deref().and_then(schema::schema_for_document_type);
    if input.document_type.is_some() && schema.is_none() {
        warn!(document_type = ?input.document_type, "unrecognized document type, schema engine skipped");
        issues.push(Issue {
            severity: Severity::Info,
            field: None,
            description: format!("document type '{}' has no known schema", input.document_type.as_deref().unwrap_or("")),
            impact: "schema-derived fields, party blocks, and tables are unavailable for this record".to_string(),
        });
    }

    let schema_extraction = schema.map(|s| schema::extract(&text, s, carrier.as_deref(), config, today));
    let schema_fields = schema_extraction.as_ref().map(|e| e.fields.clone()).unwrap_or_default();
    let schema_parties = schema_extraction.as_ref().map(|e| e.parties.clone()).unwrap_or_default();
    let schema_tables = schema_extraction.map(|e| e.tables).unwrap_or_default();

    // Step 3 + 4: merge, then decide whether to call C6.
    let merged = merger::merge(MergeInput {
        regex_fields: regex_fields.clone(),
        schema_fields: schema_fields.clone(),
        ai_fields: BTreeMap::new(),
        schema_parties: schema_parties.clone(),
        ai_parties: BTreeMap::new(),
        schema_tables: schema_tables.clone(),
    });

    let regex_field_count = count_fields(&regex_fields);
    let schema_field_count = count_fields(&schema_fields);
    let regex_confidence = weighted_confidence(&merged.fields, config);

    let (gaps, ai_reason) = decide_gaps(input, &merged, merged_parties_present(&merged), config);
    let ai_enabled = config.ai_enabled && !gaps.is_empty();

    Prepared::NeedsFinish(PreparedRecord {
        start,
        deadline,
        source_ref: input.source_ref.clone(),
        document_type: input.document_type.clone(),
        text,
        issues,
        sender_category,
        carrier,
        regex_fields,
        schema_fields,
        schema_parties,
        schema_tables,
        merged,
        regex_field_count,
        schema_field_count,
        regex_confidence,
        regex_time_ms,
        gaps,
        ai_reason,
        ai_enabled,
        catalog_version: catalog.version,
        dropped_candidates,
    })
}

/// Everything [`prepare`] produced for one input, carried across the
/// await boundary into [`finish`].
pub(crate) struct PreparedRecord {
    start: Instant,
    deadline: Duration,
    source_ref: String,
    document_type: Option<String>,
    text: String,
    issues: Vec<Issue>,
    sender_category: crate::kinds::SenderCategory,
    carrier: Option<String>,
    regex_fields: BTreeMap<FieldKind, Vec<crate::record::FieldExtraction>>,
    schema_fields: BTreeMap<FieldKind, Vec<crate::record::FieldExtraction>>,
    schema_parties: BTreeMap<PartyRole, crate::record::PartyBlock>,
    schema_tables: BTreeMap<String, Vec<crate::record::TableRow>>,
    merged: MergeOutput,
    regex_field_count: u32,
    schema_field_count: u32,
    regex_confidence: u8,
    regex_time_ms: u64,
    gaps: Vec<GapRequest>,
    ai_reason: Option<String>,
    ai_enabled: bool,
    catalog_version: u32,
    dropped_candidates: Vec<regex_extractor::DroppedCandidate>,
}

impl PreparedRecord {
    pub(crate) fn source_ref(&self) -> &str {
        &self.source_ref
    }
}

/// Output of [`prepare`]: either a record that short-circuited before any
/// extraction ran, or one ready for the AI/judge phase.
pub(crate) enum Prepared {
    Done(ExtractionRecord),
    NeedsFinish(PreparedRecord),
}

/// The awaiting half of §4.9 (steps 5-7): the gated AI gap-fill call, the
/// second merge, metadata assembly, and the gated quality-judge call. This
/// is the portion [`crate::batch`] bounds with its concurrency semaphore.
pub(crate) async fn finish(
    prepared: PreparedRecord,
    config: &EngineConfig,
    llm: &dyn LlmProvider,
    judge_provider: &dyn JudgeProvider,
    today: NaiveDate,
) -> ExtractionRecord {
    let PreparedRecord {
        start,
        deadline,
        source_ref,
        document_type,
        text,
        mut issues,
        sender_category,
        carrier,
        regex_fields,
        schema_fields,
        schema_parties,
        schema_tables,
        merged,
        regex_field_count,
        schema_field_count,
        regex_confidence,
        regex_time_ms,
        gaps,
        ai_reason,
        ai_enabled,
        catalog_version,
        dropped_candidates,
    } = prepared;

    let crashed_regex_and_schema = false; // no panic boundary in this pure core; kept for strategy bookkeeping below.

    let mut ai_time_ms = 0u64;
    let (final_merged, ai_called) = if ai_enabled {
        let ai_start = Instant::now();
        let remaining = deadline.saturating_sub(start.elapsed());
        let capped_deadline = Duration::from_millis(config.ai_call_deadline_ms.min(remaining.as_millis() as u64));
        let gap_result = if remaining.is_zero() {
            ai_gap_filler::GapFillResult::default()
        } else {
            run_with_deadline(capped_deadline, ai_gap_filler::fill_gaps(llm, &text, &gaps, config, today)).await.unwrap_or_default()
        };
        ai_time_ms = ai_start.elapsed().as_millis() as u64;

        let remerged = merger::merge(MergeInput {
            regex_fields,
            schema_fields,
            ai_fields: gap_result.fields,
            schema_parties,
            ai_parties: gap_result.parties,
            schema_tables,
        });
        (remerged, true)
    } else {
        (merged, false)
    };

    let ai_field_count = final_merged
        .fields
        .values()
        .flat_map(slot_items)
        .filter(|f| f.method == Method::Ai)
        .count() as u32;
    let total_field_count = count_merged_fields(&final_merged.fields);
    let overall_confidence = weighted_confidence(&final_merged.fields, config);

    let strategy = if crashed_regex_and_schema {
        Strategy::AiFallback
    } else if ai_called {
        Strategy::RegexPlusAi
    } else {
        Strategy::RegexOnly
    };

    let mut field_sources = BTreeMap::new();
    for (kind, slot) in &final_merged.fields {
        if let FieldSlot::Single(f) = slot {
            field_sources.insert(*kind, f.method);
        } else if let FieldSlot::Multi(items) = slot {
            if let Some(first) = items.first() {
                field_sources.insert(*kind, first.method);
            }
        }
    }

    let processing_time_ms = start.elapsed().as_millis() as u64;

    let metadata = Metadata {
        processing_time_ms,
        regex_time_ms,
        ai_time_ms,
        regex_field_count,
        ai_field_count,
        schema_field_count,
        total_field_count,
        regex_confidence,
        overall_confidence,
        strategy,
        field_sources,
        party_sources: final_merged.party_sources.clone(),
        ai_called,
        ai_reason: ai_reason.clone(),
        catalog_version,
        schema_set_version: SCHEMA_SET_VERSION,
    };

    if metadata.schema_set_version != config.schema_set_version {
        issues.push(Issue {
            severity: Severity::Info,
            field: None,
            description: format!(
                "pinned schema_set_version {} does not match loaded schema set version {}",
                config.schema_set_version, metadata.schema_set_version
            ),
            impact: "schema-derived fields may differ from the configuration the caller expected".to_string(),
        });
    }

    let mut record = ExtractionRecord {
        id: uuid::Uuid::new_v4(),
        source_ref,
        sender_category: Some(sender_category),
        carrier,
        document_type,
        fields: final_merged.fields,
        parties: final_merged.parties,
        tables: final_merged.tables,
        metadata,
        judgement: None,
        state: RecordState::Created,
        corrected_from: None,
        corrections_applied: Vec::new(),
    };

    attach_pattern_invariant_issues(&mut issues, &dropped_candidates);
    if !issues.is_empty() {
        // The judge, if it runs, replaces `judgement`; these record-level
        // issues are preserved there, or stand alone if the judge never runs.
        for issue in &issues {
            debug!(?issue, "record issue recorded");
        }
    }

    // Step 6: quality judge invocation policy.
    if judge::should_invoke_judge(&record, config) {
        let remaining = deadline.saturating_sub(start.elapsed());
        let capped_deadline = Duration::from_millis(config.judge_call_deadline_ms.min(remaining.as_millis() as u64));
        let mut judgement = if remaining.is_zero() {
            fallback_needs_review(&record)
        } else {
            run_with_deadline(capped_deadline, judge::judge(judge_provider, &text, &record, config)).await.unwrap_or_else(|| fallback_needs_review(&record))
        };
        judgement.issues.splice(0..0, issues.clone());
        record.judgement = Some(judgement);
        record.state = RecordState::Judged;

        let corrections = judge::corrections_from_judgement(&record, record.judgement.as_ref().unwrap());
        if !corrections.is_empty() {
            record = record.with_corrections(corrections);
        }
    } else if !issues.is_empty() {
        record.judgement = Some(crate::record::Judgement {
            field_judgements: Vec::new(),
            issues,
            score: record.metadata.overall_confidence,
            verdict: crate::kinds::RecordVerdict::NeedsReview,
        });
    }

    info!(
        source_ref = %record.source_ref,
        strategy = ?record.metadata.strategy,
        ai_called = record.metadata.ai_called,
        overall_confidence = record.metadata.overall_confidence,
        verdict = ?record.judgement.as_ref().map(|j| j.verdict),
        "extraction complete"
    );

    record
}

/// Races `future` against `deadline`; `None` on expiry (§5 "On deadline
/// expiry the offending call returns 'empty' and the pipeline continues").
async fn run_with_deadline<F, T>(deadline: Duration, future: F) -> Option<T>
where
    F: std::future::Future<Output = T>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("call exceeded its per-call deadline, treating as empty result");
            None
        }
    }
}

fn empty_record(input: &EngineInput, config: &EngineConfig, today: NaiveDate, reason: &str) -> ExtractionRecord {
    let _ = today;
    ExtractionRecord {
        id: uuid::Uuid::new_v4(),
        source_ref: input.source_ref.clone(),
        sender_category: None,
        carrier: None,
        document_type: input.document_type.clone(),
        fields: BTreeMap::new(),
        parties: BTreeMap::new(),
        tables: BTreeMap::new(),
        metadata: Metadata {
            processing_time_ms: 0,
            regex_time_ms: 0,
            ai_time_ms: 0,
            regex_field_count: 0,
            ai_field_count: 0,
            schema_field_count: 0,
            total_field_count: 0,
            regex_confidence: 0,
            overall_confidence: 0,
            strategy: Strategy::AiFallback,
            field_sources: BTreeMap::new(),
            party_sources: BTreeMap::new(),
            ai_called: false,
            ai_reason: None,
            catalog_version: config.catalog_version,
            schema_set_version: config.schema_set_version,
        },
        judgement: Some(crate::record::Judgement {
            field_judgements: Vec::new(),
            issues: vec![Issue { severity: Severity::Warning, field: None, description: reason.to_string(), impact: "no fields could be extracted".to_string() }],
            score: 0,
            verdict: crate::kinds::RecordVerdict::Rejected,
        }),
        state: RecordState::Judged,
        corrected_from: None,
        corrections_applied: Vec::new(),
    }
}

fn slot_items(slot: &FieldSlot) -> Vec<&crate::record::FieldExtraction> {
    match slot {
        FieldSlot::Single(f) => vec![f],
        FieldSlot::Multi(items) => items.iter().collect(),
    }
}

fn count_fields(by_kind: &BTreeMap<FieldKind, Vec<crate::record::FieldExtraction>>) -> u32 {
    by_kind.values().map(|v| v.len() as u32).sum()
}

fn count_merged_fields(fields: &BTreeMap<FieldKind, FieldSlot>) -> u32 {
    fields
        .values()
        .map(|slot| match slot {
            FieldSlot::Single(_) => 1,
            FieldSlot::Multi(items) => items.len() as u32,
        })
        .sum()
}

/// §4.9 step 3: weighted average over winning single-valued fields, weight
/// 3/2/1 per `config.field_weight`. Multi-valued kinds contribute via their
/// highest-confidence member so a long container list doesn't dominate the
/// average by sheer count.
fn weighted_confidence(fields: &BTreeMap<FieldKind, FieldSlot>, config: &EngineConfig) -> u8 {
    let mut weighted_sum: u64 = 0;
    let mut weight_total: u64 = 0;
    for (kind, slot) in fields {
        let confidence = match slot {
            FieldSlot::Single(f) => f.confidence,
            FieldSlot::Multi(items) => items.iter().map(|f| f.confidence).max().unwrap_or(0),
        };
        let weight = config.field_weight(*kind) as u64;
        weighted_sum += confidence as u64 * weight;
        weight_total += weight;
    }
    if weight_total == 0 {
        0
    } else {
        (weighted_sum / weight_total) as u8
    }
}

fn merged_parties_present(merged: &MergeOutput) -> bool {
    !merged.parties.is_empty()
}

/// §4.9 step 4: ordered rule ladder, first match wins. Returns the gap
/// requests to send to C6 and the `ai_reason` string recorded in metadata.
fn decide_gaps(input: &EngineInput, merged: &MergeOutput, parties_present: bool, config: &EngineConfig) -> (Vec<GapRequest>, Option<String>) {
    if !config.ai_enabled {
        return (Vec::new(), None);
    }

    let missing_or_low_critical: Vec<FieldKind> = config
        .critical_fields
        .iter()
        .copied()
        .filter(|kind| match merged.fields.get(kind) {
            None => true,
            Some(FieldSlot::Single(f)) => f.confidence < config.confidence_thresholds.medium,
            Some(FieldSlot::Multi(items)) => items.iter().all(|f| f.confidence < config.confidence_thresholds.medium),
        })
        .collect();

    let requires_parties = input.document_type.as_deref().is_some_and(|dt| config.party_required_doc_types.iter().any(|d| d == dt));

    let overall_confidence = weighted_confidence(&merged.fields, config);

    // rule (a)
    if missing_or_low_critical.len() >= 3 {
        return (build_gap_requests(&missing_or_low_critical, &[]), Some("three or more critical fields are missing or low-confidence".to_string()));
    }

    // rule (b)
    if requires_parties && !parties_present {
        let reason = format!("Document type {} requires party extraction", input.document_type.as_deref().unwrap_or(""));
        return (build_gap_requests(&[], &[PartyRole::Shipper, PartyRole::Consignee, PartyRole::NotifyParty]), Some(reason));
    }

    // rule (c)
    if overall_confidence < config.confidence_thresholds.medium {
        return (
            build_gap_requests(&missing_or_low_critical, &[]),
            Some("overall confidence is below the medium threshold".to_string()),
        );
    }

    let gap_count = missing_or_low_critical.len();

    // rule (d)
    if gap_count <= 2 && overall_confidence >= config.confidence_thresholds.medium_high {
        return (Vec::new(), None);
    }

    // rule (e)
    if gap_count > 3 {
        return (build_gap_requests(&missing_or_low_critical, &[]), Some("more than three gap fields remain".to_string()));
    }

    if gap_count > 0 {
        return (
            build_gap_requests(&missing_or_low_critical, &[]),
            Some(format!("{gap_count} critical field(s) remain below threshold")),
        );
    }

    (Vec::new(), None)
}

fn build_gap_requests(kinds: &[FieldKind], party_roles: &[PartyRole]) -> Vec<GapRequest> {
    let mut requests: Vec<GapRequest> = kinds.iter().map(|k| GapRequest { name: k.to_string(), kind: *k, party_role: None }).collect();
    requests.extend(party_roles.iter().map(|role| GapRequest {
        name: role.to_string(),
        kind: party_kind_placeholder(*role),
        party_role: Some(*role),
    }));
    requests
}

/// Parties are keyed by [`PartyRole`], not [`FieldKind`]; [`GapRequest`]
/// still carries a `kind` field for uniformity with field gaps, so party
/// gaps get a nominal placeholder kind that the gap-filler's party branch
/// never consults (it switches on `party_role` first).
fn party_kind_placeholder(_role: PartyRole) -> FieldKind {
    FieldKind::CommodityDescription
}

fn fallback_needs_review(record: &ExtractionRecord) -> crate::record::Judgement {
    crate::record::Judgement {
        field_judgements: Vec::new(),
        issues: vec![Issue {
            severity: Severity::Warning,
            field: None,
            description: "judge deadline exhausted before record deadline".to_string(),
            impact: "record was not independently reviewed; treat as unverified".to_string(),
        }],
        score: record.metadata.overall_confidence,
        verdict: crate::kinds::RecordVerdict::NeedsReview,
    }
}

/// Promotes C3's dropped critical-identifier candidates (bad check digit,
/// etc.) into record-level `info` issues, per §7 and scenario S3. The
/// candidate itself is already gone from `by_kind`; this only records that
/// it was seen and rejected.
fn attach_pattern_invariant_issues(issues: &mut Vec<Issue>, dropped: &[regex_extractor::DroppedCandidate]) {
    for candidate in dropped {
        issues.push(Issue {
            severity: Severity::Info,
            field: Some(candidate.kind),
            description: format!(
                "candidate '{}' for {} matched pattern '{}' but failed its validator and was dropped",
                candidate.raw_span, candidate.kind, candidate.pattern_id
            ),
            impact: "this candidate is absent from the record; a differently-formatted value may be present instead".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_gap_filler::LlmProvider;
    use crate::catalog_data::CATALOG;
    use crate::judge::JudgeProvider;
    use crate::record::FieldValue;
    use async_trait::async_trait;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 30).unwrap()
    }

    struct NeverCalledProvider;

    #[async_trait]
    impl LlmProvider for NeverCalledProvider {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> std::result::Result<String, String> {
            panic!("LLM should not be called for this scenario");
        }
    }

    #[async_trait]
    impl JudgeProvider for NeverCalledProvider {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> std::result::Result<String, String> {
            panic!("judge should not be called for this scenario");
        }
    }

    struct StubAi {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for StubAi {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> std::result::Result<String, String> {
            Ok(self.response.clone())
        }
    }

    struct StubJudge {
        response: String,
    }

    #[async_trait]
    impl JudgeProvider for StubJudge {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32, _deadline: Duration) -> std::result::Result<String, String> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn s1_subject_only_booking_no_ai_call_regex_only_strategy() {
        let config = EngineConfig::default();
        let input = EngineInput {
            source_ref: "msg-1".to_string(),
            subject: "Booking Confirmation - BKG#234567890".to_string(),
            body_text: String::new(),
            pdf_text: None,
            sender_identity: Some("booking@maersk.com".to_string()),
            original_sender_identity: None,
            carrier_hint: None,
            document_type: None,
        };
        let record = process(&input, &CATALOG, &config, &NeverCalledProvider, &NeverCalledProvider, today()).await.unwrap();

        let booking = record.field(FieldKind::BookingNumber).expect("booking field present");
        assert_eq!(booking.value, FieldValue::Number(234567890));
        assert_eq!(booking.method, Method::RegexSubject);
        assert!(booking.confidence >= 90);
        assert!(!record.metadata.ai_called);
        assert_eq!(record.metadata.strategy, Strategy::RegexOnly);
    }

    #[tokio::test]
    async fn s2_phone_signature_trap_no_booking_and_low_confidence() {
        let mut config = EngineConfig::default();
        config.ai_enabled = false;
        let input = EngineInput {
            source_ref: "msg-2".to_string(),
            subject: String::new(),
            body_text: "Regards, Ops. Ph: +91 8810432530".to_string(),
            pdf_text: None,
            sender_identity: None,
            original_sender_identity: None,
            carrier_hint: None,
            document_type: None,
        };
        let record = process(&input, &CATALOG, &config, &NeverCalledProvider, &NeverCalledProvider, today()).await.unwrap();

        assert!(record.field(FieldKind::BookingNumber).is_none());
        assert_eq!(record.metadata.overall_confidence, 0);
        // The judge invocation policy (§4.8) does not key off "confidence
        // below low" alone; a record with zero surviving fields and no
        // declared high-value document type never meets any of its triggers,
        // so no judgement is attached here.
        assert!(record.judgement.is_none());
    }

    #[tokio::test]
    async fn s3_container_list_drops_bad_check_digit_end_to_end() {
        let mut config = EngineConfig::default();
        config.ai_enabled = false;
        let input = EngineInput {
            source_ref: "msg-3".to_string(),
            subject: String::new(),
            body_text: "Containers: MSKU1234565 MSKU1234566".to_string(),
            pdf_text: None,
            sender_identity: None,
            original_sender_identity: None,
            carrier_hint: None,
            document_type: None,
        };
        let record = process(&input, &CATALOG, &config, &NeverCalledProvider, &NeverCalledProvider, today()).await.unwrap();

        let containers = record.field_values(FieldKind::ContainerNumber);
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].value, FieldValue::Text("MSKU1234565".to_string()));

        let issues = &record.judgement.as_ref().expect("issues surface via judgement").issues;
        assert!(issues.iter().any(|issue| {
            issue.severity == Severity::Info
                && issue.field == Some(FieldKind::ContainerNumber)
                && issue.description.contains("MSKU1234566")
        }));
    }

    #[tokio::test]
    async fn s4_carrier_variant_vessel_voyage_via_schema() {
        let mut config = EngineConfig::default();
        config.ai_enabled = false;
        let input = EngineInput {
            source_ref: "msg-4".to_string(),
            subject: String::new(),
            body_text: "Booking Number: BN998877\nCMA CGM VERDI / 0INLRW1MA Vessel/Voyage:\n".to_string(),
            pdf_text: None,
            sender_identity: Some("notify@cma-cgm.com".to_string()),
            original_sender_identity: None,
            carrier_hint: None,
            document_type: Some("booking_confirmation".to_string()),
        };
        let record = process(&input, &CATALOG, &config, &NeverCalledProvider, &NeverCalledProvider, today()).await.unwrap();

        let vessel = record.field(FieldKind::VesselName).expect("vessel field");
        assert_eq!(vessel.value, FieldValue::Text("CMA CGM VERDI".to_string()));
        assert_eq!(vessel.method, Method::Schema);
        assert!(vessel.confidence >= 85);

        let voyage = record.field(FieldKind::VoyageNumber).expect("voyage field");
        assert_eq!(voyage.value, FieldValue::Text("0INLRW1MA".to_string()));
        assert!(voyage.confidence >= 85);
    }

    #[tokio::test]
    async fn s5_schema_unknown_document_falls_back_to_regex_only() {
        let mut config = EngineConfig::default();
        config.ai_enabled = false;
        let input = EngineInput {
            source_ref: "msg-5".to_string(),
            subject: String::new(),
            body_text: "Arrival Notice\nB/L Number: HLCU998877\nETA: 2026-08-01\nLast Free Day: 2026-08-10\n".to_string(),
            pdf_text: None,
            sender_identity: None,
            original_sender_identity: None,
            carrier_hint: None,
            document_type: None,
        };
        let record = process(&input, &CATALOG, &config, &NeverCalledProvider, &NeverCalledProvider, today()).await.unwrap();

        assert!(record.field(FieldKind::BlNumber).is_some());
        assert!(record.field(FieldKind::Eta).is_some());
        assert_eq!(record.metadata.schema_field_count, 0);
    }

    #[tokio::test]
    async fn s6_ai_fills_parties_only_for_hbl() {
        let config = EngineConfig::default();
        let body = "House B/L Number: HBLX998877\n\
                    Booking Number: BKG123456\n\
                    B/L Number: MAEU9988776\n\
                    Container: MSKU1234565\n\
                    Port of Loading: Shanghai, China\n\
                    Port of Discharge: Los Angeles\n\
                    ETD: 2026-08-01\n\
                    ETA: 2026-08-15\n\
                    Vessel: EVER GIVEN\n\
                    Description of Goods: General Cargo\n\
                    Shipper line mentions Acme Exports Inc as the exporting party.\n\
                    Consignee section names Beta Imports Ltd as the receiving party.\n\
                    Notify party on file is Gamma Logistics Co for arrival alerts.\n";
        let ai_response = serde_json::json!({
            "shipper": "Acme Exports Inc",
            "consignee": "Beta Imports Ltd",
            "notify_party": "Gamma Logistics Co",
        })
        .to_string();
        let input = EngineInput {
            source_ref: "msg-6".to_string(),
            subject: String::new(),
            body_text: body.to_string(),
            pdf_text: None,
            sender_identity: None,
            original_sender_identity: None,
            carrier_hint: None,
            document_type: Some("hbl".to_string()),
        };
        let ai = StubAi { response: ai_response };
        let approved_judge = StubJudge { response: r#"{"field_judgements": [], "issues": [], "score": 90, "verdict": "approved"}"#.to_string() };
        let record = process(&input, &CATALOG, &config, &ai, &approved_judge, today()).await.unwrap();

        assert!(record.metadata.ai_called);
        assert_eq!(record.metadata.ai_reason.as_deref(), Some("Document type hbl requires party extraction"));
        assert!(record.parties.contains_key(&PartyRole::Shipper));
        assert_eq!(record.metadata.field_sources.get(&FieldKind::HblNumber), Some(&Method::Schema));
        assert_eq!(record.metadata.party_sources.get(&PartyRole::Shipper), Some(&Method::Ai));
    }

    #[tokio::test]
    async fn empty_input_short_circuits_to_rejected() {
        let config = EngineConfig::default();
        let input = EngineInput { source_ref: "msg-empty".to_string(), ..EngineInput::default() };
        let record = process(&input, &CATALOG, &config, &NeverCalledProvider, &NeverCalledProvider, today()).await.unwrap();
        assert_eq!(record.judgement.as_ref().unwrap().verdict, crate::kinds::RecordVerdict::Rejected);
        assert!(record.fields.is_empty());
    }
}
