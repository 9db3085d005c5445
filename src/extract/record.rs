//! Canonical field keys and the record the extraction engine produces.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// The closed set of fields extraction rules may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    FileNo,
    DateOfBirth,
    PlaceOfBirth,
    Sex,
    Forenames,
    FamilyName,
    Nationality,
    Casetown,
    Casecountry,
    Casedate,
    Type,
    Number,
}

impl FieldKey {
    pub const ALL: [FieldKey; 12] = [
        FieldKey::FileNo,
        FieldKey::DateOfBirth,
        FieldKey::PlaceOfBirth,
        FieldKey::Sex,
        FieldKey::Forenames,
        FieldKey::FamilyName,
        FieldKey::Nationality,
        FieldKey::Casetown,
        FieldKey::Casecountry,
        FieldKey::Casedate,
        FieldKey::Type,
        FieldKey::Number,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::FileNo => "file_no",
            FieldKey::DateOfBirth => "date_of_birth",
            FieldKey::PlaceOfBirth => "place_of_birth",
            FieldKey::Sex => "sex",
            FieldKey::Forenames => "forenames",
            FieldKey::FamilyName => "family_name",
            FieldKey::Nationality => "nationality",
            FieldKey::Casetown => "casetown",
            FieldKey::Casecountry => "casecountry",
            FieldKey::Casedate => "casedate",
            FieldKey::Type => "type",
            FieldKey::Number => "number",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        FieldKey::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Whether values for this key are calendar dates.
    pub fn is_date(&self) -> bool {
        matches!(self, FieldKey::DateOfBirth | FieldKey::Casedate)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted value.
///
/// `Null` marks a key a rule claimed but could not parse a date for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Column representation: text verbatim, dates as ISO `YYYY-MM-DD`.
    pub fn to_column(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Null => None,
        }
    }
}

impl From<Option<NaiveDate>> for FieldValue {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map(FieldValue::Date).unwrap_or(FieldValue::Null)
    }
}

/// Mapping from canonical keys to extracted values.
///
/// Keys that were never populated are absent. Every write goes through
/// [`FieldRecord::claim`], so the first real value for a key wins; a `Null`
/// placeholder may still be replaced by a later rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldRecord {
    fields: BTreeMap<FieldKey, FieldValue>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` unless it already holds a non-null value.
    ///
    /// Returns true if the value was stored.
    pub fn claim(&mut self, key: FieldKey, value: FieldValue) -> bool {
        match self.fields.get(&key) {
            Some(existing) if !existing.is_null() => false,
            // Never downgrade a placeholder to another placeholder.
            Some(_) if value.is_null() => false,
            _ => {
                self.fields.insert(key, value);
                true
            }
        }
    }

    pub fn claim_text(&mut self, key: FieldKey, value: impl Into<String>) -> bool {
        self.claim(key, FieldValue::Text(value.into()))
    }

    /// Whether `key` still needs a value (absent or only a placeholder).
    pub fn is_open(&self, key: FieldKey) -> bool {
        self.fields.get(&key).map_or(true, FieldValue::is_null)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.fields.get(&key)
    }

    pub fn text(&self, key: FieldKey) -> Option<&str> {
        match self.fields.get(&key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn date(&self, key: FieldKey) -> Option<NaiveDate> {
        match self.fields.get(&key) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Column value for `key`; absent keys and placeholders both map to `None`.
    pub fn column(&self, key: FieldKey) -> Option<String> {
        self.fields.get(&key).and_then(FieldValue::to_column)
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_first_value_wins() {
        let mut record = FieldRecord::new();
        assert!(record.claim_text(FieldKey::Sex, "M"));
        assert!(!record.claim_text(FieldKey::Sex, "F"));
        assert_eq!(record.text(FieldKey::Sex), Some("M"));
    }

    #[test]
    fn test_null_placeholder_is_replaceable() {
        let mut record = FieldRecord::new();
        assert!(record.claim(FieldKey::Casedate, FieldValue::Null));
        assert!(record.contains(FieldKey::Casedate));
        assert!(record.is_open(FieldKey::Casedate));
        assert!(!record.claim(FieldKey::Casedate, FieldValue::Null));

        let date = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        assert!(record.claim(FieldKey::Casedate, FieldValue::Date(date)));
        assert_eq!(record.date(FieldKey::Casedate), Some(date));
        assert_eq!(record.column(FieldKey::Casedate).as_deref(), Some("2020-05-01"));
    }

    #[test]
    fn test_serializes_present_keys_only() {
        let mut record = FieldRecord::new();
        record.claim_text(FieldKey::FileNo, "123/45");
        record.claim(
            FieldKey::DateOfBirth,
            FieldValue::Date(NaiveDate::from_ymd_opt(1990, 2, 1).unwrap()),
        );
        record.claim(FieldKey::Casedate, FieldValue::Null);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "file_no": "123/45",
                "date_of_birth": "1990-02-01",
                "casedate": null,
            })
        );
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in FieldKey::ALL {
            assert_eq!(FieldKey::from_str(key.as_str()), Some(key));
        }
        assert_eq!(FieldKey::from_str("raw_text"), None);
    }
}
