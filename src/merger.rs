//! Confidence Merger (C7, §3 invariant 4, §4.7). A pure function over the
//! three extractor outputs (regex, schema, AI) that picks one winner per
//! single-valued kind and a canonical-form union for multi-valued kinds.
//! Deterministic and idempotent by construction: same inputs, same output,
//! and merging an already-merged set again changes nothing (§8 items 5, 6).

use std::collections::BTreeMap;

use crate::kinds::{FieldKind, Method, PartyRole};
use crate::record::{FieldExtraction, FieldSlot, PartyBlock, TableRow};

pub struct MergeInput {
    pub regex_fields: BTreeMap<FieldKind, Vec<FieldExtraction>>,
    pub schema_fields: BTreeMap<FieldKind, Vec<FieldExtraction>>,
    pub ai_fields: BTreeMap<FieldKind, FieldExtraction>,
    pub schema_parties: BTreeMap<PartyRole, PartyBlock>,
    pub ai_parties: BTreeMap<PartyRole, PartyBlock>,
    pub schema_tables: BTreeMap<String, Vec<TableRow>>,
}

pub struct MergeOutput {
    pub fields: BTreeMap<FieldKind, FieldSlot>,
    pub parties: BTreeMap<PartyRole, PartyBlock>,
    /// Which extractor contributed each party role's surviving block (§8 S6:
    /// `field_sources[shipper] = ai`). Parties carry no confidence of their
    /// own in the record model, so this is the party-level analogue of
    /// [`MergeOutput::fields`]'s per-kind `method`.
    pub party_sources: BTreeMap<PartyRole, Method>,
    pub tables: BTreeMap<String, Vec<TableRow>>,
}

/// Runs C7 over `input`.
pub fn merge(input: MergeInput) -> MergeOutput {
    let mut by_kind: BTreeMap<FieldKind, Vec<FieldExtraction>> = BTreeMap::new();

    for (kind, candidates) in input.regex_fields {
        by_kind.entry(kind).or_default().extend(candidates);
    }
    for (kind, candidates) in input.schema_fields {
        by_kind.entry(kind).or_default().extend(candidates);
    }
    for (kind, candidate) in input.ai_fields {
        by_kind.entry(kind).or_default().push(candidate);
    }

    let mut fields = BTreeMap::new();
    for (kind, mut candidates) in by_kind {
        if candidates.is_empty() {
            continue;
        }
        if kind.is_multi_valued() {
            fields.insert(kind, FieldSlot::Multi(dedup_by_canonical_form(candidates)));
        } else {
            let winner = pick_winner(&mut candidates);
            fields.insert(kind, FieldSlot::Single(winner));
        }
    }

    // Parties: schema (structured, higher fidelity) wins over AI per role;
    // AI only fills a role schema parsing left empty (§4.6 rule: AI covers
    // gaps, never overrides a structured hit).
    let mut party_sources: BTreeMap<PartyRole, Method> = input.schema_parties.keys().map(|role| (*role, Method::Schema)).collect();
    let mut parties = input.schema_parties;
    for (role, block) in input.ai_parties {
        if let std::collections::btree_map::Entry::Vacant(entry) = parties.entry(role) {
            entry.insert(block);
            party_sources.insert(role, Method::Ai);
        }
    }

    MergeOutput { fields, parties, party_sources, tables: input.schema_tables }
}

/// Highest confidence wins; ties broken by [`crate::kinds::Method::priority_rank`],
/// then by earliest position in `raw_span`'s appearance order (stable sort
/// over the candidates as supplied, which already lists regex candidates in
/// position order per kind — §3 invariant 4).
fn pick_winner(candidates: &mut [FieldExtraction]) -> FieldExtraction {
    candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(a.method.priority_rank().cmp(&b.method.priority_rank())));
    candidates[0].clone()
}

/// Array-valued kinds deduplicate by canonical form, keeping the
/// highest-confidence (then highest-priority-method) extraction per distinct
/// value (§3 invariant 5), sorted by confidence descending for stable output.
fn dedup_by_canonical_form(candidates: Vec<FieldExtraction>) -> Vec<FieldExtraction> {
    let mut best: BTreeMap<String, FieldExtraction> = BTreeMap::new();
    for candidate in candidates {
        let key = candidate.canonical_key();
        match best.get(&key) {
            Some(existing)
                if existing.confidence > candidate.confidence
                    || (existing.confidence == candidate.confidence && existing.method.priority_rank() <= candidate.method.priority_rank()) => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }
    let mut merged: Vec<FieldExtraction> = best.into_values().collect();
    merged.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::Method;
    use crate::record::FieldValue;
    use crate::record::PartyBlock;

    fn extraction(kind: FieldKind, value: &str, confidence: u8, method: Method) -> FieldExtraction {
        FieldExtraction { kind, value: FieldValue::Text(value.to_string()), raw_span: value.to_string(), confidence, method, pattern_id: None }
    }

    #[test]
    fn highest_confidence_wins_for_single_valued_kind() {
        let mut regex_fields = BTreeMap::new();
        regex_fields.insert(
            FieldKind::BookingNumber,
            vec![
                extraction(FieldKind::BookingNumber, "111", 70, Method::Regex),
                extraction(FieldKind::BookingNumber, "222", 92, Method::RegexSubject),
            ],
        );
        let input = MergeInput {
            regex_fields,
            schema_fields: BTreeMap::new(),
            ai_fields: BTreeMap::new(),
            schema_parties: BTreeMap::new(),
            ai_parties: BTreeMap::new(),
            schema_tables: BTreeMap::new(),
        };
        let output = merge(input);
        let FieldSlot::Single(winner) = output.fields.get(&FieldKind::BookingNumber).unwrap() else { panic!("expected single") };
        assert_eq!(winner.value, FieldValue::Text("222".to_string()));
    }

    #[test]
    fn ties_are_broken_by_method_priority() {
        let mut regex_fields = BTreeMap::new();
        regex_fields.insert(FieldKind::BookingNumber, vec![extraction(FieldKind::BookingNumber, "111", 90, Method::Regex)]);
        let mut schema_fields = BTreeMap::new();
        schema_fields.insert(FieldKind::BookingNumber, vec![extraction(FieldKind::BookingNumber, "222", 90, Method::Schema)]);
        let input = MergeInput {
            regex_fields,
            schema_fields,
            ai_fields: BTreeMap::new(),
            schema_parties: BTreeMap::new(),
            ai_parties: BTreeMap::new(),
            schema_tables: BTreeMap::new(),
        };
        let output = merge(input);
        let FieldSlot::Single(winner) = output.fields.get(&FieldKind::BookingNumber).unwrap() else { panic!("expected single") };
        assert_eq!(winner.method, Method::Schema);
    }

    #[test]
    fn multi_valued_kind_dedups_by_canonical_form_keeping_best() {
        let mut regex_fields = BTreeMap::new();
        regex_fields.insert(
            FieldKind::ContainerNumber,
            vec![
                extraction(FieldKind::ContainerNumber, "msku1234565", 60, Method::Regex),
                extraction(FieldKind::ContainerNumber, "MSKU1234565", 85, Method::RegexSubject),
                extraction(FieldKind::ContainerNumber, "APLU4812000", 70, Method::Regex),
            ],
        );
        let input = MergeInput {
            regex_fields,
            schema_fields: BTreeMap::new(),
            ai_fields: BTreeMap::new(),
            schema_parties: BTreeMap::new(),
            ai_parties: BTreeMap::new(),
            schema_tables: BTreeMap::new(),
        };
        let output = merge(input);
        let FieldSlot::Multi(items) = output.fields.get(&FieldKind::ContainerNumber).unwrap() else { panic!("expected multi") };
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|f| f.confidence == 85));
    }

    #[test]
    fn merge_is_idempotent_on_an_already_merged_single_candidate() {
        let mut regex_fields = BTreeMap::new();
        regex_fields.insert(FieldKind::BookingNumber, vec![extraction(FieldKind::BookingNumber, "111", 90, Method::RegexSubject)]);
        let input = MergeInput {
            regex_fields: regex_fields.clone(),
            schema_fields: BTreeMap::new(),
            ai_fields: BTreeMap::new(),
            schema_parties: BTreeMap::new(),
            ai_parties: BTreeMap::new(),
            schema_tables: BTreeMap::new(),
        };
        let first = merge(input);
        let rerun_input = MergeInput {
            regex_fields,
            schema_fields: BTreeMap::new(),
            ai_fields: BTreeMap::new(),
            schema_parties: BTreeMap::new(),
            ai_parties: BTreeMap::new(),
            schema_tables: BTreeMap::new(),
        };
        let second = merge(rerun_input);
        assert_eq!(first.fields, second.fields);
    }

    #[test]
    fn ai_party_fills_a_gap_and_is_recorded_in_party_sources() {
        let mut schema_parties = BTreeMap::new();
        schema_parties.insert(PartyRole::Shipper, PartyBlock { name: Some("Acme Exports".to_string()), ..PartyBlock::default() });
        let mut ai_parties = BTreeMap::new();
        ai_parties.insert(PartyRole::Shipper, PartyBlock { name: Some("Should Not Win".to_string()), ..PartyBlock::default() });
        ai_parties.insert(PartyRole::Consignee, PartyBlock { name: Some("Beta Imports".to_string()), ..PartyBlock::default() });

        let output = merge(MergeInput {
            regex_fields: BTreeMap::new(),
            schema_fields: BTreeMap::new(),
            ai_fields: BTreeMap::new(),
            schema_parties,
            ai_parties,
            schema_tables: BTreeMap::new(),
        });

        assert_eq!(output.parties.get(&PartyRole::Shipper).unwrap().name.as_deref(), Some("Acme Exports"));
        assert_eq!(output.party_sources.get(&PartyRole::Shipper), Some(&Method::Schema));
        assert_eq!(output.party_sources.get(&PartyRole::Consignee), Some(&Method::Ai));
    }
}
