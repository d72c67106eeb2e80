//! Field validators and normalizers (C2, §4.2). Pure, side-effect-free
//! functions keyed by `validator_id` / `normalizer_id`. A failing validator
//! drops the candidate; the caller considers the next one (§4.2 "fails
//! closed").

use chrono::{Datelike, NaiveDate};

use crate::config::YearWindow;

/// Result of running a field's validators: pass/fail plus an optional
/// confidence penalty for a "weak pass" (§4.3: "-10 if validator passes
/// only weakly, e.g. date outside the year window").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub weak: bool,
}

impl ValidationOutcome {
    pub const STRONG_PASS: ValidationOutcome = ValidationOutcome { passed: true, weak: false };
    pub const WEAK_PASS: ValidationOutcome = ValidationOutcome { passed: true, weak: true };
    pub const FAIL: ValidationOutcome = ValidationOutcome { passed: false, weak: false };
}

/// ISO-6346 container number check digit (§3 invariant 2, §8 item 3).
///
/// Four letters (owner code + category identifier), six digits, one check
/// digit. Letter values: each of the 11 consonant-vowel-skipping letter
/// values per the ISO table (no 11, 22, 33 multiples), digits keep their
/// face value. Weighted sum by increasing powers of 2, mod 11, mod 10.
pub fn validate_container_check_digit(container: &str) -> bool {
    let chars: Vec<char> = container.chars().collect();
    if chars.len() != 11 {
        return false;
    }
    if !chars[0..4].iter().all(|c| c.is_ascii_uppercase()) {
        return false;
    }
    if !chars[4..11].iter().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // ISO-6346 table 1: A=10, B=12, C=13, ... skipping every multiple of 11
    // (11, 22, 33) as the alphabet is walked.
    let letter_value = |c: char| -> Option<u32> {
        let idx = (c as u32).checked_sub('A' as u32)?;
        let mut value = idx + 10;
        if value >= 11 {
            value += 1;
        }
        if value >= 22 {
            value += 1;
        }
        if value >= 33 {
            value += 1;
        }
        Some(value)
    };
    let digits: Vec<u32> = chars[4..10].iter().map(|c| c.to_digit(10).unwrap()).collect();
    let check_digit = chars[10].to_digit(10).unwrap();

    let mut sum: u32 = 0;
    for (i, c) in chars[0..4].iter().enumerate() {
        let Some(v) = letter_value(*c) else { return false };
        sum += v * (1 << i);
    }
    for (i, d) in digits.iter().enumerate() {
        sum += d * (1 << (i + 4));
    }
    let computed = (sum % 11) % 10;
    computed == check_digit
}

/// UN/LOCODE: exactly 5 uppercase letters (§4.2).
pub fn validate_un_locode(code: &str) -> bool {
    code.len() == 5 && code.chars().all(|c| c.is_ascii_uppercase() && c.is_ascii_alphabetic())
}

/// Voyage number must contain at least one digit (§4.2).
pub fn validate_voyage_number(voyage: &str) -> bool {
    !voyage.is_empty() && voyage.chars().any(|c| c.is_ascii_digit())
}

/// Vessel name must be >=70% letters (§4.2).
pub fn validate_vessel_name(name: &str) -> bool {
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    let total = name.chars().filter(|c| !c.is_whitespace()).count();
    total > 0 && (letters as f64 / total as f64) >= 0.70
}

/// Port name must begin with a capital letter and be >=3 chars (§4.2).
pub fn validate_port_name(name: &str) -> bool {
    name.len() >= 3 && name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// Validates and parses a date, then classifies it against the configured
/// year window (§3 invariant 3, §4.2, §8 item 4). Returns `None` if the
/// text does not parse as an ISO date; otherwise a weak pass (confidence
/// capped at 60 by the caller) if it falls outside the window.
pub fn validate_and_classify_date(date: NaiveDate, today: NaiveDate, window: YearWindow) -> ValidationOutcome {
    let year = date.year();
    let min_year = today.year() + window.min_offset;
    let max_year = today.year() + window.max_offset;
    if year >= min_year && year <= max_year {
        ValidationOutcome::STRONG_PASS
    } else {
        ValidationOutcome::WEAK_PASS
    }
}

/// Weight normalization: KG, MT (metric ton), LB -> kilograms, 3 decimals.
pub fn normalize_weight_kg(value: f64, unit: &str) -> Option<f64> {
    let kg = match unit.to_ascii_uppercase().as_str() {
        "KG" | "KGS" => value,
        "MT" | "MTS" | "TON" | "TONS" => value * 1000.0,
        "LB" | "LBS" => value * 0.45359237,
        _ => return None,
    };
    Some((kg * 1000.0).round() / 1000.0)
}

/// Volume normalization: CBM, M3 -> cubic meters, 3 decimals.
pub fn normalize_volume_cbm(value: f64, unit: &str) -> Option<f64> {
    let normalized_unit = unit.to_ascii_uppercase().replace('\u{b3}', "3");
    match normalized_unit.as_str() {
        "CBM" | "M3" | "CUM" => Some((value * 1000.0).round() / 1000.0),
        _ => None,
    }
}

/// Currency tag lookup: accepts any ISO-4217 alphabetic 3-letter code.
/// The engine does not ship a full currency table (out of scope per §1);
/// it validates shape only, which is all C2's contract requires.
pub fn validate_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

/// Exclusion check: rejects values that are common-word garbage (§4.2).
/// `stop_words` is matched case-insensitively against the whole candidate.
pub fn is_stop_word(candidate: &str, stop_words: &[&str]) -> bool {
    let lowered = candidate.to_ascii_lowercase();
    stop_words.iter().any(|w| w.eq_ignore_ascii_case(&lowered))
}

/// Seal-number exclusion: a candidate whose first four letters match a
/// known container owner-code prefix is rejected, since it is more likely
/// a mis-scanned container number than a seal (§4.2).
pub fn seal_collides_with_container_owner_code(seal: &str, known_owner_codes: &[&str]) -> bool {
    if seal.len() < 4 {
        return false;
    }
    let prefix = seal[0..4].to_ascii_uppercase();
    known_owner_codes.iter().any(|code| code.eq_ignore_ascii_case(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msku1234565_passes_check_digit() {
        assert!(validate_container_check_digit("MSKU1234565"));
    }

    #[test]
    fn msku1234566_fails_check_digit() {
        assert!(!validate_container_check_digit("MSKU1234566"));
    }

    #[test]
    fn wrong_length_fails() {
        assert!(!validate_container_check_digit("MSKU123456"));
    }

    #[test]
    fn un_locode_requires_five_uppercase_letters() {
        assert!(validate_un_locode("USLAX"));
        assert!(!validate_un_locode("usla"));
        assert!(!validate_un_locode("US1AX"));
    }

    #[test]
    fn voyage_requires_a_digit() {
        assert!(validate_voyage_number("0INLRW1MA"));
        assert!(!validate_voyage_number("NOVOYAGE"));
    }

    #[test]
    fn vessel_name_letter_ratio() {
        assert!(validate_vessel_name("CMA CGM VERDI"));
        assert!(!validate_vessel_name("12345 67"));
    }

    #[test]
    fn date_outside_window_is_weak_pass() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
        let window = YearWindow { min_offset: -2, max_offset: 3 };
        let far_future = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
        let outcome = validate_and_classify_date(far_future, today, window);
        assert!(outcome.passed);
        assert!(outcome.weak);

        let in_window = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let outcome = validate_and_classify_date(in_window, today, window);
        assert!(outcome.passed);
        assert!(!outcome.weak);
    }

    #[test]
    fn weight_normalization_converts_to_kilograms() {
        assert_eq!(normalize_weight_kg(2.5, "MT"), Some(2500.0));
        assert_eq!(normalize_weight_kg(10.0, "KG"), Some(10.0));
        assert!((normalize_weight_kg(100.0, "LB").unwrap() - 45.359).abs() < 0.001);
        assert_eq!(normalize_weight_kg(1.0, "stone"), None);
    }

    #[test]
    fn volume_normalization_converts_to_cubic_meters() {
        assert_eq!(normalize_volume_cbm(12.3456, "CBM"), Some(12.346));
        assert_eq!(normalize_volume_cbm(1.0, "gallons"), None);
    }

    #[test]
    fn seal_collision_with_owner_code_is_rejected() {
        let owner_codes = ["MSKU", "APLU"];
        assert!(seal_collides_with_container_owner_code("MSKU998877", &owner_codes));
        assert!(!seal_collides_with_container_owner_code("SL99887766", &owner_codes));
    }
}
