//! Field labels as printed on the documents, and how labels map to keys.

use std::sync::LazyLock;

use regex::Regex;

use super::record::FieldKey;

/// Printed label (lowercase) to canonical key.
pub const LABELS: &[(&str, FieldKey)] = &[
    ("file no", FieldKey::FileNo),
    ("date of birth", FieldKey::DateOfBirth),
    ("date of birth(dd-mm-yyyy)", FieldKey::DateOfBirth),
    ("place of birth", FieldKey::PlaceOfBirth),
    ("sex", FieldKey::Sex),
    ("forename", FieldKey::Forenames),
    ("forenames", FieldKey::Forenames),
    ("forename(s)", FieldKey::Forenames),
    ("family name", FieldKey::FamilyName),
    ("nationality", FieldKey::Nationality),
    ("nationalities", FieldKey::Nationality),
    ("casetown", FieldKey::Casetown),
    ("case town", FieldKey::Casetown),
    ("casecountry", FieldKey::Casecountry),
    ("case country", FieldKey::Casecountry),
    ("casedate", FieldKey::Casedate),
    ("case date", FieldKey::Casedate),
    ("case date(dd-mm-yyyy)", FieldKey::Casedate),
];

/// Spellings of the combined date-and-place-of-birth label.
pub const BIRTH_COMPOSITE_LABELS: &[&str] = &["date and place of birth", "date & place of birth"];

/// How a label is tested when the exact table lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPredicate {
    Contains(&'static str),
}

impl LabelPredicate {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelPredicate::Contains(needle) => label.contains(needle),
        }
    }
}

/// Fallback key heuristics, evaluated top to bottom; first match wins.
pub const KEY_HEURISTICS: &[(LabelPredicate, FieldKey)] = &[
    (LabelPredicate::Contains("forename"), FieldKey::Forenames),
    (LabelPredicate::Contains("type"), FieldKey::Type),
    (LabelPredicate::Contains("number"), FieldKey::Number),
];

/// Any known label, with an optional `(qualifier)`, followed by a colon.
///
/// Longer labels are tried first so a composite label is consumed whole
/// instead of splitting at a shorter label nested inside it.
pub static LABEL_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    let mut labels: Vec<&str> = LABELS
        .iter()
        .map(|(label, _)| *label)
        .chain(BIRTH_COMPOSITE_LABELS.iter().copied())
        .collect();
    labels.sort_by_key(|l| std::cmp::Reverse(l.len()));
    labels.dedup();

    let alternation = labels
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})(?:\s*\([^)]*\))?\s*:", alternation)).unwrap()
});

/// Lowercase a raw label and collapse internal whitespace.
pub fn canonical_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Exact table lookup, retried without a trailing `(qualifier)`.
pub fn lookup(label: &str) -> Option<FieldKey> {
    let exact = |l: &str| LABELS.iter().find(|(known, _)| *known == l).map(|(_, k)| *k);
    exact(label).or_else(|| {
        let (head, tail) = label.rsplit_once('(')?;
        if !tail.ends_with(')') {
            return None;
        }
        exact(head.trim_end())
    })
}

/// Resolve a label to a canonical key: table first, then heuristics in order.
pub fn resolve(label: &str) -> Option<FieldKey> {
    lookup(label).or_else(|| {
        KEY_HEURISTICS
            .iter()
            .find(|(predicate, _)| predicate.matches(label))
            .map(|(_, key)| *key)
    })
}

pub fn is_birth_composite(label: &str) -> bool {
    BIRTH_COMPOSITE_LABELS.iter().any(|l| label.starts_with(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        assert_eq!(resolve("family name"), Some(FieldKey::FamilyName));
        assert_eq!(resolve("forename(s)"), Some(FieldKey::Forenames));
        assert_eq!(resolve("case date(dd-mm-yyyy)"), Some(FieldKey::Casedate));
    }

    #[test]
    fn test_qualifier_is_stripped_for_lookup() {
        assert_eq!(resolve("date of birth (dd/mm/yyyy)"), Some(FieldKey::DateOfBirth));
        assert_eq!(resolve("nationality (current)"), Some(FieldKey::Nationality));
    }

    #[test]
    fn test_heuristics_apply_in_order() {
        assert_eq!(resolve("other forenames"), Some(FieldKey::Forenames));
        assert_eq!(resolve("document type"), Some(FieldKey::Type));
        assert_eq!(resolve("passport number"), Some(FieldKey::Number));
        // "type" is checked before "number".
        assert_eq!(resolve("type number"), Some(FieldKey::Type));
        assert_eq!(resolve("remarks"), None);
    }

    #[test]
    fn test_canonical_label() {
        assert_eq!(canonical_label("  Family   Name "), "family name");
    }

    #[test]
    fn test_anchor_prefers_composite_label() {
        let m = LABEL_ANCHOR
            .find("x Date and place of birth: 16 June 2006")
            .unwrap();
        assert_eq!(m.as_str(), "Date and place of birth:");
    }

    #[test]
    fn test_anchor_takes_qualifier() {
        let m = LABEL_ANCHOR.find("DOB date of birth (dd-mm-yyyy) : 01-02-1990").unwrap();
        assert_eq!(m.as_str(), "date of birth (dd-mm-yyyy) :");
    }

    #[test]
    fn test_anchor_requires_colon_and_word_boundary() {
        assert!(LABEL_ANCHOR.find("Sex M").is_none());
        assert!(LABEL_ANCHOR.find("Essex: UK").is_none());
    }
}
