//! Pattern Catalog (C1, §4.1). Static, versioned, immutable: an ordered list
//! of labeled regex entries per entity kind, each carrying a confidence
//! weight and optional validator/normalizer/carrier-scope/negative-context.
//!
//! Concrete entries live in [`crate::catalog_data`]; this module defines the
//! shape and the lookup/compilation machinery.

use std::collections::HashMap;

use regex::Regex;

use crate::kinds::FieldKind;

/// Identifies which pure function in [`crate::validators`] a catalog entry
/// delegates shape/semantic validation to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorId {
    ContainerCheckDigit,
    UnLocode,
    VoyageNumber,
    VesselName,
    PortName,
    Date,
    Currency,
    /// Rejects a seal candidate whose first four letters collide with a
    /// known container owner-code (§4.2).
    SealNumber,
    None,
}

/// Identifies which normalizer a catalog entry applies to a raw capture
/// before it becomes a canonical [`crate::record::FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerId {
    UppercaseTrim,
    Date,
    WeightKg,
    VolumeCbm,
    Money,
    DigitsOnly,
    None,
}

/// One catalog entry (§3 "Pattern Catalog entries").
pub struct PatternCatalogEntry {
    pub pattern_id: &'static str,
    pub kind: FieldKind,
    /// Compiled lazily by [`PatternCatalog::new`]; the literal source lives
    /// in the matching data tables so the catalog stays data-authored.
    pub regex: Regex,
    pub confidence_weight: u8,
    pub validator_id: ValidatorId,
    pub normalizer_id: NormalizerId,
    /// Carriers this entry is scoped to; empty means "applies to all".
    pub carrier_scope: &'static [&'static str],
    /// A regex that, if it matches in a short window before the candidate,
    /// invalidates it (e.g. phone-signature context before a booking
    /// number). `None` means no exclusion context is defined.
    pub negative_context: Option<Regex>,
}

impl PatternCatalogEntry {
    pub fn applies_to_carrier(&self, carrier: Option<&str>) -> bool {
        if self.carrier_scope.is_empty() {
            return true;
        }
        match carrier {
            Some(c) => self.carrier_scope.iter().any(|scoped| scoped.eq_ignore_ascii_case(c)),
            None => false,
        }
    }
}

/// Source literal for one catalog entry, compiled once into a
/// [`PatternCatalogEntry`] by [`PatternCatalog::new`]. Kept separate from
/// the compiled form so the data tables in `catalog_data.rs` stay plain data
/// (§9 "Pattern authoring data-only").
pub struct PatternSpec {
    pub pattern_id: &'static str,
    pub kind: FieldKind,
    pub regex: &'static str,
    pub confidence_weight: u8,
    pub validator_id: ValidatorId,
    pub normalizer_id: NormalizerId,
    pub carrier_scope: &'static [&'static str],
    pub negative_context: Option<&'static str>,
}

/// The compiled, versioned catalog (§4.1 "Versioning").
pub struct PatternCatalog {
    pub version: u32,
    entries_by_kind: HashMap<FieldKind, Vec<PatternCatalogEntry>>,
}

impl PatternCatalog {
    /// Compiles a catalog from its data-only specs. Panics only on a
    /// malformed regex literal — a compile-time-constant authoring error,
    /// not a runtime condition (SPEC_FULL §10.2).
    pub fn compile(version: u32, specs: &'static [PatternSpec]) -> Self {
        let mut entries_by_kind: HashMap<FieldKind, Vec<PatternCatalogEntry>> = HashMap::new();
        for spec in specs {
            let regex = Regex::new(spec.regex)
                .unwrap_or_else(|e| panic!("catalog entry {} has invalid regex: {e}", spec.pattern_id));
            let negative_context = spec.negative_context.map(|pattern| {
                Regex::new(pattern)
                    .unwrap_or_else(|e| panic!("catalog entry {} has invalid negative_context: {e}", spec.pattern_id))
            });
            entries_by_kind.entry(spec.kind).or_default().push(PatternCatalogEntry {
                pattern_id: spec.pattern_id,
                kind: spec.kind,
                regex,
                confidence_weight: spec.confidence_weight,
                validator_id: spec.validator_id,
                normalizer_id: spec.normalizer_id,
                carrier_scope: spec.carrier_scope,
                negative_context,
            });
        }
        PatternCatalog { version, entries_by_kind }
    }

    /// Entries for `kind`, in authored preference order (§4.1: "order
    /// expresses preference among equally confident matches").
    pub fn entries_for(&self, kind: FieldKind) -> &[PatternCatalogEntry] {
        self.entries_by_kind.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn kinds(&self) -> impl Iterator<Item = &FieldKind> {
        self.entries_by_kind.keys()
    }
}
