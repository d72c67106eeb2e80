//! Static reference data shipped with the engine: the country list used by
//! party-block address-termination detection (§4.5 step 3) and the
//! stop-word list used by C2's exclusion checks (§4.2). Loaded once, never
//! rewritten at runtime (§9 "Pattern authoring data-only").

/// A representative set of country names recognized as address terminators.
/// Not exhaustive of the ISO-3166 list; sufficient for the correspondence
/// this engine parses (ocean freight moves between a bounded set of trading
/// nations).
pub static COUNTRY_NAMES: &[&str] = &[
    "United States",
    "USA",
    "Canada",
    "Mexico",
    "China",
    "Hong Kong",
    "Singapore",
    "Japan",
    "South Korea",
    "Taiwan",
    "Vietnam",
    "Thailand",
    "Malaysia",
    "Indonesia",
    "India",
    "Germany",
    "Netherlands",
    "Belgium",
    "France",
    "United Kingdom",
    "Spain",
    "Italy",
    "Brazil",
    "Australia",
    "United Arab Emirates",
    "Panama",
    "Chile",
    "Colombia",
    "Peru",
    "Turkey",
    "Egypt",
    "South Africa",
];

/// Common-word garbage rejected by C2's exclusion check (§4.2). Candidates
/// matching (case-insensitively) one of these whole-string are dropped
/// rather than emitted as a low-confidence field.
pub static STOP_WORDS: &[&str] = &[
    "none", "n/a", "na", "tbd", "tba", "pending", "unknown", "various", "see attached", "as above",
    "same as above", "confidential", "draft",
];

/// Known container owner-codes used by the seal/container collision check
/// (§4.2: "a seal candidate whose first four letters match any known
/// container owner-code is rejected").
pub static CONTAINER_OWNER_CODES: &[&str] = &[
    "MSKU", "MSCU", "CMAU", "HLXU", "APLU", "OOLU", "COSU", "EGHU", "ONEU", "YMLU", "HDMU", "PONU",
];
