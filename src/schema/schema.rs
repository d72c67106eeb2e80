//! Document Schema (C5, §3) data shapes: the data-only specs authored in
//! [`crate::schema::schemas_data`], and their compiled (regex-built) form
//! used by [`crate::schema::engine`].

use std::collections::HashMap;

use regex::Regex;

use crate::catalog::{NormalizerId, ValidatorId};
use crate::kinds::{FieldKind, PartyRole};

// --- Data-only specs (authored) ---

pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub label_patterns: &'static [&'static str],
    pub value_patterns: &'static [&'static str],
    /// Restricts the search to a declared section, by name.
    pub section: Option<&'static str>,
    pub validator_id: ValidatorId,
    pub normalizer_id: NormalizerId,
}

pub struct PartyFieldSpec {
    pub role: PartyRole,
    pub label_patterns: &'static [&'static str],
    pub section: Option<&'static str>,
}

pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub header_patterns: &'static [&'static str],
}

pub struct TableSpec {
    pub name: &'static str,
    pub header_patterns: &'static [&'static str],
    pub columns: &'static [ColumnSpec],
}

pub struct SectionSpec {
    pub name: &'static str,
    pub start_markers: &'static [&'static str],
    pub end_markers: &'static [&'static str],
}

/// Overlay of fields/party_fields keyed by carrier (§3 "carrier_variations").
/// An overridden field inherits defaults for unspecified attributes by
/// being a fully-specified [`FieldSpec`] that replaces the base entry of the
/// same `name`; entries with a new `name` extend the base set.
pub struct CarrierVariationSpec {
    pub carrier: &'static str,
    pub fields: &'static [FieldSpec],
    pub party_fields: &'static [PartyFieldSpec],
}

pub struct DocumentSchemaSpec {
    pub document_type: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub sections: &'static [SectionSpec],
    pub fields: &'static [FieldSpec],
    pub party_fields: &'static [PartyFieldSpec],
    pub tables: &'static [TableSpec],
    pub carrier_variations: &'static [CarrierVariationSpec],
}

// --- Compiled form ---

pub struct CompiledField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub label_patterns: Vec<Regex>,
    pub value_patterns: Vec<Regex>,
    pub section: Option<String>,
    pub validator_id: ValidatorId,
    pub normalizer_id: NormalizerId,
}

pub struct CompiledPartyField {
    pub role: PartyRole,
    pub label_patterns: Vec<Regex>,
    pub section: Option<String>,
}

pub struct CompiledColumn {
    pub name: String,
    pub kind: FieldKind,
    pub header_patterns: Vec<Regex>,
}

pub struct CompiledTable {
    pub name: String,
    pub header_patterns: Vec<Regex>,
    pub columns: Vec<CompiledColumn>,
}

pub struct CompiledSection {
    pub name: String,
    pub start_markers: Vec<Regex>,
    pub end_markers: Vec<Regex>,
}

pub struct CompiledCarrierVariation {
    pub fields: Vec<CompiledField>,
    pub party_fields: Vec<CompiledPartyField>,
}

pub struct CompiledDocumentSchema {
    pub document_type: String,
    pub display_name: String,
    pub category: String,
    pub sections: Vec<CompiledSection>,
    pub fields: Vec<CompiledField>,
    pub party_fields: Vec<CompiledPartyField>,
    pub tables: Vec<CompiledTable>,
    pub carrier_variations: HashMap<String, CompiledCarrierVariation>,
}

fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid schema pattern {p:?}: {e}")))
        .collect()
}

fn compile_field(spec: &FieldSpec) -> CompiledField {
    CompiledField {
        name: spec.name.to_string(),
        kind: spec.kind,
        required: spec.required,
        label_patterns: compile_patterns(spec.label_patterns),
        value_patterns: compile_patterns(spec.value_patterns),
        section: spec.section.map(|s| s.to_string()),
        validator_id: spec.validator_id,
        normalizer_id: spec.normalizer_id,
    }
}

fn compile_party_field(spec: &PartyFieldSpec) -> CompiledPartyField {
    CompiledPartyField {
        role: spec.role,
        label_patterns: compile_patterns(spec.label_patterns),
        section: spec.section.map(|s| s.to_string()),
    }
}

impl CompiledDocumentSchema {
    pub fn compile(spec: &'static DocumentSchemaSpec) -> Self {
        let sections = spec
            .sections
            .iter()
            .map(|s| CompiledSection {
                name: s.name.to_string(),
                start_markers: compile_patterns(s.start_markers),
                end_markers: compile_patterns(s.end_markers),
            })
            .collect();
        let fields = spec.fields.iter().map(compile_field).collect();
        let party_fields = spec.party_fields.iter().map(compile_party_field).collect();
        let tables = spec
            .tables
            .iter()
            .map(|t| CompiledTable {
                name: t.name.to_string(),
                header_patterns: compile_patterns(t.header_patterns),
                columns: t
                    .columns
                    .iter()
                    .map(|c| CompiledColumn {
                        name: c.name.to_string(),
                        kind: c.kind,
                        header_patterns: compile_patterns(c.header_patterns),
                    })
                    .collect(),
            })
            .collect();
        let carrier_variations = spec
            .carrier_variations
            .iter()
            .map(|v| {
                (
                    v.carrier.to_string(),
                    CompiledCarrierVariation {
                        fields: v.fields.iter().map(compile_field).collect(),
                        party_fields: v.party_fields.iter().map(compile_party_field).collect(),
                    },
                )
            })
            .collect();

        CompiledDocumentSchema {
            document_type: spec.document_type.to_string(),
            display_name: spec.display_name.to_string(),
            category: spec.category.to_string(),
            sections,
            fields,
            party_fields,
            tables,
            carrier_variations,
        }
    }

    /// Resolves the effective field list for `carrier`, applying the
    /// carrier's overlay field-by-field (§4.5 "Schema carrier variations
    /// override or extend the base schema field-by-field").
    pub fn resolve_fields(&self, carrier: Option<&str>) -> Vec<&CompiledField> {
        let mut by_name: Vec<&CompiledField> = self.fields.iter().collect();
        if let Some(carrier) = carrier {
            if let Some(variation) = self.carrier_variations.get(carrier) {
                for overridden in &variation.fields {
                    if let Some(slot) = by_name.iter_mut().find(|f| f.name == overridden.name) {
                        *slot = overridden;
                    } else {
                        by_name.push(overridden);
                    }
                }
            }
        }
        by_name
    }

    pub fn resolve_party_fields(&self, carrier: Option<&str>) -> Vec<&CompiledPartyField> {
        let mut roles: Vec<&CompiledPartyField> = self.party_fields.iter().collect();
        if let Some(carrier) = carrier {
            if let Some(variation) = self.carrier_variations.get(carrier) {
                for overridden in &variation.party_fields {
                    if let Some(slot) = roles.iter_mut().find(|f| f.role == overridden.role) {
                        *slot = overridden;
                    } else {
                        roles.push(overridden);
                    }
                }
            }
        }
        roles
    }
}
