//! Attribute extraction: logical lines plus raw text into a [`FieldRecord`].
//!
//! Each logical line is offered to the line rules in `LINE_RULES` order and
//! the first rule that accepts it wins. `label: value` lines are dispatched a
//! second time through `LABEL_RULES`. After every line has been seen, a
//! whole-document fallback pass fills keys that are still open.
//!
//! Extraction never fails. Unparseable dates leave a key absent, or mark it
//! null when a rule had already claimed it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::dates::{find_numeric_date, find_spelled_date, parse_day_first, parse_month_first};
use super::labels::{canonical_label, is_birth_composite, resolve};
use super::normalize::{normalize, LogicalLine};
use super::record::{FieldKey, FieldRecord, FieldValue};

static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^:]+?)\s*:\s*(.+)$").unwrap());

static TABLE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*town\s+country\s+date\s*$").unwrap());

static NUMBERED_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*(\S+)\s+(\S+)\s+(.+)$").unwrap());

static LETTERS_AND_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").unwrap());

static WIDE_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

static DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[-–]\s*").unwrap());

static DOCUMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Passport|Visa|ID)\b[^\d\n\r]*(\d[\d\s№]+)").unwrap()
});

static FILE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)file\s*(?:no|number)\s*[:#]?\s*([\d/]+)").unwrap()
});

static BIRTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)date\s*of\s*birth[^\d]*(\d{1,2}[/-]\d{1,2}[/-]\d{4})").unwrap()
});

/// What a line rule did with the line at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Not applicable; offer the line to the next rule.
    Pass,
    /// Handled; advance past this many lines.
    Consumed(usize),
}

type LineRule = fn(&mut Extraction<'_>, &[LogicalLine], usize) -> Outcome;

/// Line rules in priority order.
const LINE_RULES: &[(&str, LineRule)] = &[
    ("table_row", table_row),
    ("type_number_pipe", type_number_pipe),
    ("numbered_nationality", numbered_nationality),
    ("key_value", key_value),
];

/// Which `label: value` lines a label rule handles.
#[derive(Debug, Clone, Copy)]
enum LabelMatch {
    BirthComposite,
    FileNumber,
    Exactly(&'static str),
    Any,
}

impl LabelMatch {
    fn matches(&self, label: &str) -> bool {
        match self {
            LabelMatch::BirthComposite => is_birth_composite(label),
            LabelMatch::FileNumber => label.contains("file") && label.contains("no"),
            LabelMatch::Exactly(expected) => label == *expected,
            LabelMatch::Any => true,
        }
    }
}

type LabelRule = fn(&mut Extraction<'_>, &str, &str);

/// Label rules in priority order; the last entry catches everything else.
const LABEL_RULES: &[(LabelMatch, LabelRule)] = &[
    (LabelMatch::BirthComposite, birth_composite),
    (LabelMatch::FileNumber, file_number),
    (LabelMatch::Exactly("date"), bare_date),
    (LabelMatch::Exactly("place"), bare_place),
    (LabelMatch::Any, generic),
];

/// Normalize `raw_text` and extract its fields.
pub fn extract_fields(raw_text: &str) -> FieldRecord {
    let lines = normalize(raw_text);
    extract_from_lines(&lines, raw_text)
}

/// Extract fields from already-normalized lines.
///
/// `raw_text` is only consulted by date recovery and the fallback pass.
pub fn extract_from_lines(lines: &[LogicalLine], raw_text: &str) -> FieldRecord {
    let mut extraction = Extraction {
        record: FieldRecord::new(),
        raw_text,
    };

    let mut idx = 0;
    while idx < lines.len() {
        let line = &lines[idx];
        if line.is_blank() || line.is_page_break() {
            idx += 1;
            continue;
        }
        debug!("line {}: {:?}", idx, line.as_str());

        let mut step = 1;
        for (name, rule) in LINE_RULES {
            if let Outcome::Consumed(n) = rule(&mut extraction, lines, idx) {
                debug!("  handled by {}", name);
                step = n;
                break;
            }
        }
        idx += step.max(1);
    }

    fallbacks(&mut extraction);
    extraction.record
}

struct Extraction<'a> {
    record: FieldRecord,
    raw_text: &'a str,
}

/// `Town  Country  Date` header; the next line holds the values.
fn table_row(ex: &mut Extraction<'_>, lines: &[LogicalLine], idx: usize) -> Outcome {
    if !TABLE_HEADER.is_match(lines[idx].as_str()) {
        return Outcome::Pass;
    }
    let Some(row) = lines.get(idx + 1) else {
        return Outcome::Consumed(1);
    };

    let cells: Vec<&str> = WIDE_GAP.split(row.as_str().trim()).map(str::trim).collect();
    if cells.len() < 3 {
        return Outcome::Consumed(1);
    }

    ex.record.claim_text(FieldKey::Casetown, cells[0]);
    ex.record.claim_text(FieldKey::Casecountry, cells[1]);
    if let Some(token) = find_spelled_date(cells[2]) {
        ex.record
            .claim(FieldKey::Casedate, parse_day_first(token).into());
    }
    Outcome::Consumed(2)
}

/// `Passport | 12345678`
fn type_number_pipe(ex: &mut Extraction<'_>, lines: &[LogicalLine], idx: usize) -> Outcome {
    let Some((left, right)) = lines[idx].as_str().split_once('|') else {
        return Outcome::Pass;
    };
    let (left, right) = (left.trim(), right.trim());
    if !LETTERS_AND_SPACES.is_match(left) || !right.starts_with(|c: char| c.is_ascii_digit())
    {
        return Outcome::Pass;
    }

    ex.record.claim_text(FieldKey::Type, left);
    ex.record.claim_text(FieldKey::Number, right);
    Outcome::Consumed(1)
}

/// `1. TURKISH  Since 1990 ...`: first list entry names the nationality.
fn numbered_nationality(ex: &mut Extraction<'_>, lines: &[LogicalLine], idx: usize) -> Outcome {
    if !ex.record.is_open(FieldKey::Nationality) {
        return Outcome::Pass;
    }
    let Some(caps) = NUMBERED_ENTRY.captures(lines[idx].as_str()) else {
        return Outcome::Pass;
    };

    ex.record.claim_text(FieldKey::Nationality, &caps[1]);
    Outcome::Consumed(1)
}

fn key_value(ex: &mut Extraction<'_>, lines: &[LogicalLine], idx: usize) -> Outcome {
    let Some(caps) = KEY_VALUE.captures(lines[idx].as_str()) else {
        return Outcome::Pass;
    };
    let label = canonical_label(&caps[1]);
    let value = caps[2].trim();
    debug!("  key={:?} value={:?}", label, value);

    if let Some((_, rule)) = LABEL_RULES.iter().find(|(m, _)| m.matches(&label)) {
        rule(ex, &label, value);
    }
    Outcome::Consumed(1)
}

fn birth_composite(ex: &mut Extraction<'_>, _label: &str, value: &str) {
    // Layout A: `16-06-2006    Istanbul`
    let mut gap = WIDE_GAP.splitn(value, 2);
    if let (Some(date_part), Some(place)) = (gap.next(), gap.next()) {
        let first_token = date_part.split_whitespace().next().unwrap_or_default();
        if let Some(date) = parse_day_first(date_part).or_else(|| parse_day_first(first_token))
        {
            ex.record.claim(FieldKey::DateOfBirth, FieldValue::Date(date));
            let place = place.trim();
            if !place.is_empty() {
                ex.record.claim_text(FieldKey::PlaceOfBirth, place);
            }
            return;
        }
    }

    // Layout B: `16 June 2006 - Istanbul - Turkey`
    let parts: Vec<&str> = DASH.split(value).map(str::trim).collect();
    ex.record
        .claim(FieldKey::DateOfBirth, parse_month_first(parts[0]).into());
    let place = parts[1..]
        .iter()
        .copied()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if !place.is_empty() {
        ex.record.claim_text(FieldKey::PlaceOfBirth, place);
    }
}

fn file_number(ex: &mut Extraction<'_>, _label: &str, value: &str) {
    ex.record.claim_text(FieldKey::FileNo, value);
}

fn bare_date(ex: &mut Extraction<'_>, _label: &str, value: &str) {
    let date = find_numeric_date(value).and_then(parse_day_first);
    ex.record.claim(FieldKey::Casedate, date.into());
}

fn bare_place(ex: &mut Extraction<'_>, _label: &str, value: &str) {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.split_last() {
        Some((country, town)) if !town.is_empty() => {
            ex.record.claim_text(FieldKey::Casetown, town.join(", "));
            ex.record.claim_text(FieldKey::Casecountry, *country);
        }
        _ => {
            ex.record.claim_text(FieldKey::Casetown, value);
        }
    }
}

fn generic(ex: &mut Extraction<'_>, label: &str, value: &str) {
    let Some(key) = resolve(label) else {
        return;
    };
    // A second column after a wide gap is noise.
    let value = WIDE_GAP.split(value).next().unwrap_or_default().trim();

    if key.is_date() {
        let date = parse_day_first(value).or_else(|| {
            find_numeric_date(ex.raw_text).and_then(parse_day_first)
        });
        ex.record.claim(key, date.into());
    } else {
        ex.record.claim_text(key, value);
    }
}

/// Whole-document searches for keys no line rule claimed.
///
/// A key a line rule marked null stays null here.
fn fallbacks(ex: &mut Extraction<'_>) {
    let raw = ex.raw_text;

    if !ex.record.contains(FieldKey::Type) || !ex.record.contains(FieldKey::Number) {
        if let Some(caps) = DOCUMENT_ID.captures(raw) {
            ex.record.claim_text(FieldKey::Type, &caps[1]);
            ex.record.claim_text(FieldKey::Number, caps[2].trim());
        }
    }

    if !ex.record.contains(FieldKey::FileNo) {
        if let Some(caps) = FILE_NUMBER.captures(raw) {
            ex.record.claim_text(FieldKey::FileNo, &caps[1]);
        }
    }

    if !ex.record.contains(FieldKey::DateOfBirth) {
        if let Some(caps) = BIRTH_DATE.captures(raw) {
            ex.record
                .claim(FieldKey::DateOfBirth, parse_day_first(&caps[1]).into());
        }
    }
}
