//! The data model (§3): field extraction records, party blocks, the top-level
//! `ExtractionRecord`, and the judge/metadata/correction shapes that travel
//! with it through the pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kinds::{FieldKind, FieldVerdict, Method, PartyRole, RecordVerdict, Severity, Strategy};

/// A canonicalized field value (§3: "string, number, date, array-of-string
/// for multi-valued kinds ... or party block").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Date(NaiveDate),
    StringList(Vec<String>),
    Party(Box<PartyBlock>),
    /// §6: amounts as `{currency: ISO-4217, value: decimal}`.
    Money { currency: String, value: f64 },
    /// §6: weights in kilograms with three decimals.
    WeightKg(f64),
    /// §6: volumes in cubic meters.
    VolumeCbm(f64),
}

impl FieldValue {
    /// The text this value was rendered from, used for canonical-form
    /// dedup (§3 invariant 5) and display. Lists use their joined form.
    pub fn canonical_form(&self) -> String {
        match self {
            FieldValue::Text(s) => s.trim().to_uppercase(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::StringList(items) => {
                let mut sorted: Vec<String> = items.iter().map(|s| s.trim().to_uppercase()).collect();
                sorted.sort();
                sorted.join(",")
            }
            FieldValue::Party(p) => p.name.clone().unwrap_or_default().trim().to_uppercase(),
            FieldValue::Money { currency, value } => format!("{currency}:{value:.2}"),
            FieldValue::WeightKg(kg) => format!("{kg:.3}"),
            FieldValue::VolumeCbm(cbm) => format!("{cbm:.3}"),
        }
    }
}

/// A labeled multi-line block (§3 Parties).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyBlock {
    pub name: Option<String>,
    pub address_lines: Vec<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

/// The atomic result produced by any extractor (§3 "Field extraction record").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExtraction {
    pub kind: FieldKind,
    pub value: FieldValue,
    /// The literal substring that produced the value. Required; underpins
    /// the no-fabrication invariant (§8 item 1).
    pub raw_span: String,
    /// 0-100.
    pub confidence: u8,
    pub method: Method,
    /// Absent for `ai` (§3).
    pub pattern_id: Option<String>,
}

impl FieldExtraction {
    /// Canonical-form key used for dedup and merge comparisons.
    pub fn canonical_key(&self) -> String {
        format!("{}:{}", self.kind, self.value.canonical_form())
    }
}

/// A single field value on an [`ExtractionRecord`] — one value, or (for
/// multi-valued kinds) several merged by canonical-form union (§3 invariant 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSlot {
    Single(FieldExtraction),
    Multi(Vec<FieldExtraction>),
}

/// A row of a declared table, keyed by column name (§3 Tables).
pub type TableRow = BTreeMap<String, FieldExtraction>;

/// `{kind, previous_value, new_value, reason}` (SPEC_FULL §10.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub kind: FieldKind,
    pub previous_value: FieldValue,
    pub new_value: FieldValue,
    pub reason: String,
}

/// Record-level issue (§4.8, §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    /// The field the issue concerns, if any (record-wide issues use `None`).
    pub field: Option<FieldKind>,
    pub description: String,
    pub impact: String,
}

/// Per-field judge evaluation (§4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldJudgement {
    pub kind: FieldKind,
    pub verdict: FieldVerdict,
    pub reason: String,
    pub suggested_value: Option<FieldValue>,
}

/// The quality verdict and per-field evaluations from C8 (§3, §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub field_judgements: Vec<FieldJudgement>,
    pub issues: Vec<Issue>,
    pub score: u8,
    pub verdict: RecordVerdict,
}

/// Timing, strategy, and provenance metadata (§4.9 step 7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub processing_time_ms: u64,
    pub regex_time_ms: u64,
    pub ai_time_ms: u64,
    pub regex_field_count: u32,
    pub ai_field_count: u32,
    pub schema_field_count: u32,
    pub total_field_count: u32,
    pub regex_confidence: u8,
    pub overall_confidence: u8,
    pub strategy: Strategy,
    pub field_sources: BTreeMap<FieldKind, Method>,
    /// Per-role analogue of `field_sources` for parties (§8 S6), since a
    /// party block carries no confidence of its own to derive a method from.
    pub party_sources: BTreeMap<PartyRole, Method>,
    pub ai_called: bool,
    pub ai_reason: Option<String>,
    pub catalog_version: u32,
    pub schema_set_version: u32,
}

/// Lifecycle position of a record (§3 Lifecycle, SPEC_FULL §10.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Created,
    Judged,
    Corrected,
}

/// One record per input (§3 "Extraction record", the output of C9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: Uuid,
    pub source_ref: String,
    pub sender_category: Option<crate::kinds::SenderCategory>,
    pub carrier: Option<String>,
    pub document_type: Option<String>,
    pub fields: BTreeMap<FieldKind, FieldSlot>,
    pub parties: BTreeMap<PartyRole, PartyBlock>,
    pub tables: BTreeMap<String, Vec<TableRow>>,
    pub metadata: Metadata,
    pub judgement: Option<Judgement>,
    pub state: RecordState,
    /// Back-reference to the pre-correction record (§3 Lifecycle).
    pub corrected_from: Option<Uuid>,
    pub corrections_applied: Vec<Correction>,
}

impl ExtractionRecord {
    /// A single field's winning extraction, if present and single-valued.
    pub fn field(&self, kind: FieldKind) -> Option<&FieldExtraction> {
        match self.fields.get(&kind)? {
            FieldSlot::Single(f) => Some(f),
            FieldSlot::Multi(items) => items.first(),
        }
    }

    /// All extractions stored under `kind` (one for `Single`, all for `Multi`).
    pub fn field_values(&self, kind: FieldKind) -> &[FieldExtraction] {
        match self.fields.get(&kind) {
            Some(FieldSlot::Single(f)) => std::slice::from_ref(f),
            Some(FieldSlot::Multi(items)) => items,
            None => &[],
        }
    }

    /// Applies judge-suggested corrections, producing a new record in state
    /// `Corrected` with a `corrected_from` back-reference (§4.8, §3 Lifecycle).
    /// Per §8 item 8, no field's confidence increases; the original record
    /// is left untouched (it is `self`, consumed by value here).
    pub fn with_corrections(mut self, corrections: Vec<Correction>) -> ExtractionRecord {
        let original_id = self.id;
        for correction in &corrections {
            if let Some(slot) = self.fields.get_mut(&correction.kind) {
                if let FieldSlot::Single(extraction) = slot {
                    extraction.value = correction.new_value.clone();
                }
            }
        }
        self.corrections_applied.extend(corrections);
        self.corrected_from = Some(original_id);
        self.state = RecordState::Corrected;
        // A fresh identity for the corrected record; the old one stays
        // immutable and retrievable via `corrected_from`.
        self.id = Uuid::new_v4();
        self
    }
}
