//! Regex Extractor (C3, §4.3). Applies the pattern catalog (C1) and
//! validators/normalizers (C2) to raw text and returns ranked candidates per
//! field kind, with confidence and provenance. Never raises; a kind with no
//! surviving candidates is simply absent from the output.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::catalog::{NormalizerId, PatternCatalog, ValidatorId};
use crate::config::{EngineConfig, YearWindow};
use crate::data;
use crate::kinds::{FieldKind, Method};
use crate::record::{FieldExtraction, FieldValue};
use crate::validators;

/// How far before a match we look for a `negative_context` hit (§4.3: "a
/// short window before the candidate").
const NEGATIVE_CONTEXT_WINDOW: usize = 40;

pub struct RegexExtractorInput<'a> {
    pub text: &'a str,
    /// Byte length of the subject line at the start of `text`, if the
    /// caller supplied one as a distinct region (§4.3 "subject region
    /// marker"). `0` means no subject region.
    pub subject_len: usize,
    pub carrier_hint: Option<&'a str>,
}

/// A critical-identifier candidate that matched a pattern but was dropped
/// because its validator failed (§7 "logged as an info issue on the
/// record"; S3 the bad-check-digit container rejection). Surfaced as a side
/// channel alongside [`extract`]'s normal ranked-candidate return so the
/// orchestrator can attach a record-level issue without C3 knowing about
/// `Issue` or the record shape.
#[derive(Debug, Clone)]
pub(crate) struct DroppedCandidate {
    pub kind: FieldKind,
    pub raw_span: String,
    pub pattern_id: String,
}

/// Runs C3 over `input` using `catalog`, returning ranked candidates per
/// kind plus the critical-identifier candidates dropped for validator
/// failure.
pub fn extract(
    input: &RegexExtractorInput<'_>,
    catalog: &PatternCatalog,
    config: &EngineConfig,
    today: NaiveDate,
) -> (BTreeMap<FieldKind, Vec<FieldExtraction>>, Vec<DroppedCandidate>) {
    let mut by_kind: BTreeMap<FieldKind, Vec<FieldExtraction>> = BTreeMap::new();
    let mut dropped = Vec::new();

    for kind in catalog.kinds().copied().collect::<Vec<_>>() {
        let mut candidates = Vec::new();
        for entry in catalog.entries_for(kind) {
            if !entry.applies_to_carrier(input.carrier_hint) {
                continue;
            }
            for captures in entry.regex.captures_iter(input.text) {
                let matched = captures.get(1).or_else(|| captures.get(0)).unwrap();
                let raw_span = matched.as_str().to_string();
                let match_start = matched.start();

                let exclusion_hit = entry.negative_context.as_ref().is_some_and(|neg| {
                    let mut window_start = match_start.saturating_sub(NEGATIVE_CONTEXT_WINDOW);
                    while window_start < match_start && !input.text.is_char_boundary(window_start) {
                        window_start += 1;
                    }
                    match input.text.get(window_start..match_start) {
                        Some(window) => neg.is_match(window),
                        None => false,
                    }
                });

                if exclusion_hit && kind.is_critical_identifier() {
                    debug!(pattern_id = entry.pattern_id, "dropped: exclusion context on critical identifier");
                    continue;
                }

                let (value, weak) =
                    match normalize_and_validate(kind, entry.validator_id, entry.normalizer_id, &raw_span, today, config.year_window)
                    {
                        Some(result) => result,
                        None => {
                            debug!(pattern_id = entry.pattern_id, "dropped: failed validator");
                            if kind.is_critical_identifier() {
                                dropped.push(DroppedCandidate {
                                    kind,
                                    raw_span: raw_span.clone(),
                                    pattern_id: entry.pattern_id.to_string(),
                                });
                            }
                            continue;
                        }
                    };

                let in_subject = match_start < input.subject_len;
                let mut confidence: i32 = entry.confidence_weight as i32;
                if in_subject {
                    confidence += 5;
                }
                if weak {
                    confidence -= 10;
                }
                if exclusion_hit {
                    confidence -= 20;
                }
                let confidence = confidence.clamp(0, 100) as u8;
                let confidence = if weak { confidence.min(60) } else { confidence };

                let method = if in_subject { Method::RegexSubject } else { Method::Regex };

                debug!(
                    pattern_id = entry.pattern_id,
                    kind = %kind,
                    confidence,
                    method = %method,
                    "candidate scored"
                );

                candidates.push((
                    match_start,
                    FieldExtraction {
                        kind,
                        value,
                        raw_span,
                        confidence,
                        method,
                        pattern_id: Some(entry.pattern_id.to_string()),
                    },
                ));
            }
        }

        if candidates.is_empty() {
            continue;
        }

        // Dedup by canonical form, keeping the highest confidence per value.
        let mut best: BTreeMap<String, (usize, FieldExtraction)> = BTreeMap::new();
        for (pos, candidate) in candidates {
            let key = candidate.canonical_key();
            match best.get(&key) {
                Some((_, existing)) if existing.confidence >= candidate.confidence => {}
                _ => {
                    best.insert(key, (pos, candidate));
                }
            }
        }
        let mut ranked: Vec<(usize, FieldExtraction)> = best.into_values().collect();
        ranked.sort_by(|a, b| b.1.confidence.cmp(&a.1.confidence).then(a.0.cmp(&b.0)));
        by_kind.insert(kind, ranked.into_iter().map(|(_, f)| f).collect());
    }

    (by_kind, dropped)
}

/// Applies the entry's validator then normalizer. Returns `None` if the
/// validator fails (candidate dropped, §4.2 "fails closed"), or
/// `Some((value, weak))` where `weak` marks a date-outside-window pass
/// (§3 invariant 3, §4.3 "-10 if validator passes only weakly").
pub(crate) fn normalize_and_validate(
    kind: FieldKind,
    validator_id: ValidatorId,
    normalizer_id: NormalizerId,
    raw: &str,
    today: NaiveDate,
    year_window: YearWindow,
) -> Option<(FieldValue, bool)> {
    // §4.2 exclusion check: common-word garbage ("TBD", "N/A", "Pending", ...)
    // is rejected before any per-kind validator runs, regardless of kind.
    if validators::is_stop_word(raw, data::STOP_WORDS) {
        return None;
    }

    let mut weak = false;

    match validator_id {
        ValidatorId::SealNumber => {
            if validators::seal_collides_with_container_owner_code(raw, data::CONTAINER_OWNER_CODES) {
                return None;
            }
        }
        ValidatorId::ContainerCheckDigit => {
            let normalized = raw.to_ascii_uppercase();
            if !validators::validate_container_check_digit(&normalized) {
                return None;
            }
        }
        ValidatorId::UnLocode => {
            if !validators::validate_un_locode(&raw.to_ascii_uppercase()) {
                return None;
            }
        }
        ValidatorId::VoyageNumber => {
            if !validators::validate_voyage_number(raw) {
                return None;
            }
        }
        ValidatorId::VesselName => {
            if !validators::validate_vessel_name(raw) {
                return None;
            }
        }
        ValidatorId::PortName => {
            if !validators::validate_port_name(raw) {
                return None;
            }
        }
        ValidatorId::Date => {
            let Some(date) = parse_iso_date(raw) else { return None };
            let outcome = validators::validate_and_classify_date(date, today, year_window);
            if !outcome.passed {
                return None;
            }
            weak = outcome.weak;
        }
        ValidatorId::Currency => {
            let Some(currency) = extract_currency_code(raw) else { return None };
            if !validators::validate_currency_code(&currency) {
                return None;
            }
        }
        ValidatorId::None => {}
    }

    let value = match normalizer_id {
        NormalizerId::UppercaseTrim => FieldValue::Text(raw.trim().to_uppercase()),
        NormalizerId::DigitsOnly => {
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            let parsed = digits.parse::<i64>().ok()?;
            FieldValue::Number(parsed)
        }
        NormalizerId::Date => {
            let date = parse_iso_date(raw)?;
            FieldValue::Date(date)
        }
        NormalizerId::WeightKg => {
            let (number, unit) = split_number_and_unit(raw)?;
            let kg = validators::normalize_weight_kg(number, &unit)?;
            FieldValue::WeightKg(kg)
        }
        NormalizerId::VolumeCbm => {
            let (number, unit) = split_number_and_unit(raw)?;
            let cbm = validators::normalize_volume_cbm(number, &unit)?;
            FieldValue::VolumeCbm(cbm)
        }
        NormalizerId::Money => {
            let currency = extract_currency_code(raw).unwrap_or_else(|| "USD".to_string());
            let digits_and_dot: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            let value = digits_and_dot.parse::<f64>().ok()?;
            FieldValue::Money { currency, value }
        }
        NormalizerId::None => FieldValue::Text(raw.trim().to_string()),
    };

    // kind is only used by callers that need type context when extending
    // this match in the future; referenced here to keep the parameter live.
    let _ = kind;
    Some((value, weak))
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn extract_currency_code(raw: &str) -> Option<String> {
    let upper = raw.to_ascii_uppercase();
    upper
        .split_whitespace()
        .find(|tok| tok.len() == 3 && tok.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|s| s.to_string())
}

fn split_number_and_unit(raw: &str) -> Option<(f64, String)> {
    let trimmed = raw.trim();
    let split_at = trimmed.find(|c: char| c.is_alphabetic())?;
    let (number_part, unit_part) = trimmed.split_at(split_at);
    let cleaned_number: String = number_part.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let number = cleaned_number.parse::<f64>().ok()?;
    Some((number, unit_part.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_data::CATALOG;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 30).unwrap()
    }

    #[test]
    fn s1_subject_only_booking_extracts_with_regex_subject_method() {
        let config = EngineConfig::default();
        let subject = "Booking Confirmation - BKG#234567890";
        let input = RegexExtractorInput { text: subject, subject_len: subject.len(), carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        let candidates = result.get(&FieldKind::BookingNumber).expect("booking candidates");
        let winner = &candidates[0];
        assert_eq!(winner.value, FieldValue::Number(234567890));
        assert_eq!(winner.method, Method::RegexSubject);
        assert!(winner.confidence >= 90);
    }

    #[test]
    fn s2_phone_signature_does_not_produce_a_booking_number() {
        let config = EngineConfig::default();
        let body = "Regards, Ops. Ph: +91 8810432530";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        assert!(result.get(&FieldKind::BookingNumber).is_none());
    }

    #[test]
    fn s3_container_list_drops_bad_check_digit() {
        let config = EngineConfig::default();
        let body = "Containers: MSKU1234565 MSKU1234566";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, dropped) = extract(&input, &CATALOG, &config, today());
        let containers = result.get(&FieldKind::ContainerNumber).expect("container candidates");
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].value, FieldValue::Text("MSKU1234565".to_string()));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].kind, FieldKind::ContainerNumber);
        assert_eq!(dropped[0].raw_span, "MSKU1234566");
    }

    #[test]
    fn negative_context_window_does_not_panic_on_a_multibyte_boundary() {
        let config = EngineConfig::default();
        // "M³" sits 39 bytes before the booking number match, so a raw
        // `match_start - 40` byte offset lands inside the 2-byte `³`.
        let body = "Volume 12 M³, regards, ops team. BKG#234567890";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        assert!(result.get(&FieldKind::BookingNumber).is_some());
    }

    #[test]
    fn date_outside_year_window_is_capped_at_sixty() {
        let config = EngineConfig::default();
        let body = "ETD: 2099-01-01";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        let etd = &result.get(&FieldKind::Etd).unwrap()[0];
        assert!(etd.confidence <= 60);
    }

    #[test]
    fn stop_word_candidate_is_dropped_regardless_of_kind() {
        let config = EngineConfig::default();
        let body = "Commodity: TBD";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        assert!(result.get(&FieldKind::CommodityDescription).is_none());
    }

    #[test]
    fn seal_colliding_with_a_container_owner_code_is_dropped() {
        let config = EngineConfig::default();
        let body = "Seal Number: MSKU1234";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        assert!(result.get(&FieldKind::SealNumber).is_none());
    }

    #[test]
    fn weight_normalizes_to_kilograms() {
        let config = EngineConfig::default();
        let body = "Gross Weight: 2.5 MT";
        let input = RegexExtractorInput { text: body, subject_len: 0, carrier_hint: None };
        let (result, _dropped) = extract(&input, &CATALOG, &config, today());
        let weight = &result.get(&FieldKind::GrossWeight).unwrap()[0];
        assert_eq!(weight.value, FieldValue::WeightKg(2500.0));
    }
}
