//! Document Schema Engine (C5, §4.5). Region detection, label-anchored
//! field lookup, party block parsing, and table extraction against a single
//! schema selected by `document_type`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::config::{EngineConfig, YearWindow};
use crate::data::COUNTRY_NAMES;
use crate::kinds::{FieldKind, Method, PartyRole};
use crate::record::{FieldExtraction, FieldValue, PartyBlock, TableRow};
use crate::regex_extractor::normalize_and_validate;
use crate::schema::schema::CompiledDocumentSchema;

/// Maximum fallback "next tokens" window, in characters (§4.5 step 2: "a
/// reasonable window — 160 chars").
const FALLBACK_WINDOW_CHARS: usize = 160;

const BASE_LABELED_CONFIDENCE: u8 = 90;
const BASE_TABLE_CONFIDENCE: u8 = 80;
const OUTSIDE_SECTION_PENALTY: i32 = 10;
const FALLBACK_PENALTY: i32 = 15;

pub struct SchemaExtraction {
    pub fields: BTreeMap<FieldKind, Vec<FieldExtraction>>,
    pub parties: BTreeMap<PartyRole, PartyBlock>,
    pub tables: BTreeMap<String, Vec<TableRow>>,
}

struct SectionRange {
    name: String,
    start: usize,
    end: usize,
}

/// Step 1: region detection (§4.5). Walks start markers top-to-bottom;
/// each section's content begins where its start marker ends and closes at
/// the next section's start, an explicit end marker, or the document end.
fn detect_sections(text: &str, schema: &CompiledDocumentSchema) -> Vec<SectionRange> {
    let mut starts: Vec<(usize, usize, &str)> = Vec::new(); // (match_start, content_start, name)
    for section in &schema.sections {
        if let Some(m) = section.start_markers.iter().filter_map(|r| r.find(text)).min_by_key(|m| m.start()) {
            starts.push((m.start(), m.end(), section.name.as_str()));
        }
    }
    starts.sort_by_key(|s| s.0);

    let mut ranges = Vec::new();
    for (idx, (_, content_start, name)) in starts.iter().enumerate() {
        let next_start = starts.get(idx + 1).map(|s| s.0).unwrap_or(text.len());
        let section = schema.sections.iter().find(|s| s.name == *name).unwrap();
        let window = &text[*content_start..next_start];
        let end_marker_offset = section.end_markers.iter().filter_map(|r| r.find(window)).map(|m| m.start()).min();
        let end = end_marker_offset.map(|offset| content_start + offset).unwrap_or(next_start);
        ranges.push(SectionRange { name: name.to_string(), start: *content_start, end });
    }
    ranges
}

fn section_range<'a>(ranges: &'a [SectionRange], name: &str) -> Option<&'a SectionRange> {
    ranges.iter().find(|r| r.name == name)
}

fn earliest_match(text: &str, patterns: &[Regex]) -> Option<regex::Match<'_>> {
    patterns.iter().filter_map(|r| r.find(text)).min_by_key(|m| m.start())
}

/// A label hit: where the whole match ends (used for fallback/section
/// bookkeeping) and, if the label pattern itself carried a capture group,
/// the value captured alongside the label (§4.5's CMA-CGM-style combined
/// "value / value Label:" patterns, where the label regex captures both
/// sides of the slash in one match).
struct LabelHit {
    match_start: usize,
    match_end: usize,
    inline_value: Option<String>,
}

fn earliest_label_hit(text: &str, patterns: &[Regex]) -> Option<LabelHit> {
    patterns
        .iter()
        .filter_map(|r| r.captures(text))
        .min_by_key(|c| c.get(0).unwrap().start())
        .map(|captures| {
            let whole = captures.get(0).unwrap();
            let inline_value = captures.get(1).map(|g| g.as_str().trim().to_string());
            LabelHit { match_start: whole.start(), match_end: whole.end(), inline_value }
        })
}

/// Runs C5 against `text` using `schema`, optionally overlaid by `carrier`.
pub fn extract(
    text: &str,
    schema: &CompiledDocumentSchema,
    carrier: Option<&str>,
    config: &EngineConfig,
    today: NaiveDate,
) -> SchemaExtraction {
    let sections = detect_sections(text, schema);
    let resolved_fields = schema.resolve_fields(carrier);
    let resolved_party_fields = schema.resolve_party_fields(carrier);

    let all_label_patterns: Vec<Regex> = resolved_fields
        .iter()
        .flat_map(|f| f.label_patterns.iter().cloned())
        .chain(resolved_party_fields.iter().flat_map(|f| f.label_patterns.iter().cloned()))
        .collect();

    let mut fields: BTreeMap<FieldKind, Vec<FieldExtraction>> = BTreeMap::new();

    for field in &resolved_fields {
        let declared_range = field.section.as_deref().and_then(|name| section_range(&sections, name));

        let hit_in_section = declared_range.and_then(|range| {
            if range.start < range.end && range.end <= text.len() {
                earliest_label_hit(&text[range.start..range.end], &field.label_patterns).map(|hit| LabelHit {
                    match_start: range.start + hit.match_start,
                    match_end: range.start + hit.match_end,
                    inline_value: hit.inline_value,
                })
            } else {
                None
            }
        });

        let (hit, outside_section) = match hit_in_section {
            Some(hit) => (Some(hit), false),
            None if declared_range.is_some() => {
                // Fall back to a whole-text search; found outside its
                // declared section incurs a penalty (§4.5 step 6).
                (earliest_label_hit(text, &field.label_patterns), true)
            }
            None => (earliest_label_hit(text, &field.label_patterns), false),
        };

        let Some(hit) = hit else { continue };
        let label_end = hit.match_end;

        let (raw_value, used_fallback) = if let Some(inline) = hit.inline_value {
            (Some(inline), false)
        } else {
            let line_end = text[label_end..].find('\n').map(|i| label_end + i).unwrap_or(text.len());
            let same_line = &text[label_end..line_end];
            if !field.value_patterns.is_empty() {
                match earliest_match(same_line, &field.value_patterns) {
                    Some(m) => (Some(m.as_str().trim().to_string()), false),
                    None => (fallback_window(text, label_end, &all_label_patterns), true),
                }
            } else {
                (fallback_window(text, label_end, &all_label_patterns), true)
            }
        };

        let Some(raw_value) = raw_value else { continue };
        if raw_value.trim().is_empty() {
            continue;
        }

        let Some((value, weak)) =
            normalize_and_validate(field.kind, field.validator_id, field.normalizer_id, raw_value.trim(), today, year_window(config))
        else {
            debug!(field = field.name, "schema field dropped by validator");
            continue;
        };

        let mut confidence: i32 = BASE_LABELED_CONFIDENCE as i32;
        if outside_section {
            confidence -= OUTSIDE_SECTION_PENALTY;
        }
        if used_fallback {
            confidence -= FALLBACK_PENALTY;
        }
        let confidence = confidence.clamp(0, 100) as u8;
        let confidence = if weak { confidence.min(60) } else { confidence };

        fields.entry(field.kind).or_default().push(FieldExtraction {
            kind: field.kind,
            value,
            raw_span: raw_value,
            confidence,
            method: Method::Schema,
            pattern_id: Some(format!("schema:{}:{}", schema.document_type, field.name)),
        });
    }

    let parties = parse_parties(text, &sections, &resolved_party_fields, &all_label_patterns);
    let tables = extract_tables(text, schema, config, today);

    SchemaExtraction { fields, parties, tables }
}

fn year_window(config: &EngineConfig) -> YearWindow {
    config.year_window
}

/// Step 2 fallback: next non-empty tokens up to 160 chars, stopping at the
/// next known label (§4.5 step 2).
fn fallback_window(text: &str, from: usize, all_labels: &[Regex]) -> Option<String> {
    let upper_bound = (from + FALLBACK_WINDOW_CHARS).min(text.len());
    if from >= upper_bound {
        return None;
    }
    let mut window_end = upper_bound;
    if let Some(next_label) = earliest_match(&text[from..upper_bound], all_labels) {
        window_end = from + next_label.start();
    }
    if let Some(blank_line) = text[from..window_end].find("\n\n") {
        window_end = from + blank_line;
    }
    let candidate = text[from..window_end].trim();
    if candidate.is_empty() {
        None
    } else {
        // Take up to the first line only; multi-line fallback tokens are
        // rare and the spec's window is a safety net, not a parser.
        Some(candidate.lines().next().unwrap_or(candidate).trim().to_string())
    }
}

/// Step 3: party block parsing (§4.5).
fn parse_parties(
    text: &str,
    sections: &[SectionRange],
    party_fields: &[&crate::schema::schema::CompiledPartyField],
    all_labels: &[Regex],
) -> BTreeMap<PartyRole, PartyBlock> {
    let mut parties = BTreeMap::new();
    for field in party_fields {
        let declared_range = field.section.as_deref().and_then(|name| section_range(sections, name));
        let (start, end) = declared_range.map(|r| (r.start, r.end)).unwrap_or((0, text.len()));
        if start >= end || end > text.len() {
            continue;
        }
        let Some(label_match) = earliest_match(&text[start..end], &field.label_patterns) else { continue };
        let block_start = start + label_match.end();
        let (block, _raw) = parse_party_block(text, block_start, all_labels);
        if block.name.is_some() || !block.address_lines.is_empty() {
            parties.insert(field.role, block);
        }
    }
    parties
}

fn parse_party_block(text: &str, start: usize, all_labels: &[Regex]) -> (PartyBlock, String) {
    let mut block = PartyBlock::default();
    let mut consumed_lines: Vec<&str> = Vec::new();
    let mut offset = start;

    for line in text[start..].split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n').trim();
        if trimmed.is_empty() {
            break;
        }
        if earliest_match(trimmed, all_labels).is_some() && !consumed_lines.is_empty() {
            break;
        }
        consumed_lines.push(trimmed);
        offset += line.len();
        if COUNTRY_NAMES.iter().any(|c| trimmed.eq_ignore_ascii_case(c)) {
            break;
        }
    }

    let raw_span = text[start..offset].to_string();

    for (idx, line) in consumed_lines.iter().enumerate() {
        if idx == 0 {
            block.name = Some(line.to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("Phone:").or_else(|| line.strip_prefix("Tel:")) {
            block.phone = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Email:") {
            block.email = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Tax ID:").or_else(|| line.strip_prefix("EIN:")) {
            block.tax_id = Some(rest.trim().to_string());
        } else if COUNTRY_NAMES.iter().any(|c| line.eq_ignore_ascii_case(c)) {
            block.country = Some(line.to_string());
        } else if let Some((city, state, postal)) = parse_city_state_postal(line) {
            block.city = Some(city);
            block.state = Some(state);
            block.postal_code = Some(postal);
        } else {
            block.address_lines.push(line.to_string());
        }
    }

    (block, raw_span)
}

fn parse_city_state_postal(line: &str) -> Option<(String, String, String)> {
    let regex = Regex::new(r"^([A-Za-z][A-Za-z .]+),\s*([A-Z]{2})\s+(\d{5}(?:-\d{4})?)$").ok()?;
    let caps = regex.captures(line)?;
    Some((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
}

/// Step 4: table extraction (§4.5).
fn extract_tables(
    text: &str,
    schema: &CompiledDocumentSchema,
    config: &EngineConfig,
    today: NaiveDate,
) -> BTreeMap<String, Vec<TableRow>> {
    let mut tables = BTreeMap::new();
    for table in &schema.tables {
        let Some(header_match) = earliest_match(text, &table.header_patterns) else { continue };
        let header_line_end = text[header_match.end()..].find('\n').map(|i| header_match.end() + i).unwrap_or(text.len());
        let body_start = header_line_end + 1;
        if body_start >= text.len() {
            continue;
        }

        let mut rows = Vec::new();
        for line in text[body_start..].lines() {
            if line.trim().is_empty() {
                break;
            }
            let cells: Vec<&str> = line.split("  ").map(|c| c.trim()).filter(|c| !c.is_empty()).collect();
            if cells.is_empty() {
                break;
            }
            let mut row: TableRow = TableRow::new();
            for (column, cell_text) in table.columns.iter().zip(cells.iter()) {
                if let Some((value, weak)) = normalize_and_validate(
                    column.kind,
                    crate::catalog::ValidatorId::None,
                    default_normalizer_for(column.kind),
                    cell_text,
                    today,
                    config.year_window,
                ) {
                    let confidence = if weak { BASE_TABLE_CONFIDENCE.min(60) } else { BASE_TABLE_CONFIDENCE };
                    row.insert(
                        column.name.clone(),
                        FieldExtraction {
                            kind: column.kind,
                            value,
                            raw_span: cell_text.to_string(),
                            confidence,
                            method: Method::SchemaTable,
                            pattern_id: Some(format!("schema_table:{}:{}", table.name, column.name)),
                        },
                    );
                }
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }
        if !rows.is_empty() {
            tables.insert(table.name.clone(), rows);
        }
    }
    tables
}

fn default_normalizer_for(kind: FieldKind) -> crate::catalog::NormalizerId {
    use crate::catalog::NormalizerId;
    if kind.is_date() {
        NormalizerId::Date
    } else {
        NormalizerId::UppercaseTrim
    }
}
