//! Engine configuration (§6, SPEC_FULL §10.3). A plain, `serde`-deserializable
//! struct loadable from TOML, with a `Default` impl matching the documented
//! defaults. Construction is infallible data, not environment/CLI driven —
//! per §6, the core accepts `EngineConfig` by value; no CLI/env/disk-state
//! lives in this crate.

use serde::{Deserialize, Serialize};

use crate::kinds::FieldKind;

/// `{low, medium, medium_high, high}`, integers, defaults 55/70/82/90 (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub low: u8,
    pub medium: u8,
    pub medium_high: u8,
    pub high: u8,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        ConfidenceThresholds { low: 55, medium: 70, medium_high: 82, high: 90 }
    }
}

/// Date plausibility window (§3 invariant 3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub min_offset: i32,
    pub max_offset: i32,
}

impl Default for YearWindow {
    fn default() -> Self {
        YearWindow { min_offset: -2, max_offset: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub confidence_thresholds: ConfidenceThresholds,
    /// Declares weighting for the orchestrator (§4.9 step 3: weight 3).
    pub critical_fields: Vec<FieldKind>,
    /// Declares weighting for the orchestrator (§4.9 step 3: weight 2).
    pub important_fields: Vec<FieldKind>,
    /// If false, C6 is never called.
    pub ai_enabled: bool,
    pub judge_enabled: bool,
    /// Document types that always invoke the judge (§4.8).
    pub judge_high_value_doc_types: Vec<String>,
    pub max_text_chars: usize,
    pub ai_max_text_chars: usize,
    pub judge_max_text_chars: usize,
    pub year_window: YearWindow,
    pub catalog_version: u32,
    pub schema_set_version: u32,
    /// Bounded concurrency for the batch façade (SPEC_FULL §10.5).
    pub max_concurrent_ai_calls: usize,
    /// Per-record overall deadline, in milliseconds (§5).
    pub record_deadline_ms: u64,
    /// Per-call deadline for C6 (shorter than the judge's, §5).
    pub ai_call_deadline_ms: u64,
    /// Per-call deadline for C8 (longer than C6's, §5).
    pub judge_call_deadline_ms: u64,
    /// Document types that require party extraction (§4.6 rule b, S6).
    pub party_required_doc_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            confidence_thresholds: ConfidenceThresholds::default(),
            critical_fields: vec![
                FieldKind::BookingNumber,
                FieldKind::BlNumber,
                FieldKind::ContainerNumber,
                FieldKind::PortOfLoading,
                FieldKind::PortOfDischarge,
                FieldKind::Etd,
                FieldKind::Eta,
            ],
            important_fields: vec![
                FieldKind::VesselName,
                FieldKind::VoyageNumber,
                FieldKind::Carrier,
                FieldKind::GrossWeight,
                FieldKind::PackageCount,
            ],
            ai_enabled: true,
            judge_enabled: true,
            judge_high_value_doc_types: vec![
                "hbl".to_string(),
                "mbl".to_string(),
                "arrival_notice".to_string(),
                "customs_entry".to_string(),
            ],
            max_text_chars: 10_000,
            ai_max_text_chars: 10_000,
            judge_max_text_chars: 10_000,
            year_window: YearWindow::default(),
            catalog_version: crate::catalog_data::CATALOG_VERSION,
            schema_set_version: crate::schema::schemas_data::SCHEMA_SET_VERSION,
            max_concurrent_ai_calls: 3,
            record_deadline_ms: 8_000,
            ai_call_deadline_ms: 2_500,
            judge_call_deadline_ms: 4_000,
            party_required_doc_types: vec!["hbl".to_string(), "si".to_string()],
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document into a config, falling back to [`Default`] for
    /// any field the document omits (`#[serde(default)]` semantics applied
    /// manually here since the whole struct is typically provided at once
    /// by embedding applications rather than partially overridden).
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn is_critical(&self, kind: FieldKind) -> bool {
        self.critical_fields.contains(&kind)
    }

    pub fn is_important(&self, kind: FieldKind) -> bool {
        self.important_fields.contains(&kind)
    }

    /// Weight used in §4.9 step 3's weighted average: 3 for critical, 2 for
    /// important, 1 for other.
    pub fn field_weight(&self, kind: FieldKind) -> u8 {
        if self.is_critical(kind) {
            3
        } else if self.is_important(kind) {
            2
        } else {
            1
        }
    }
}
