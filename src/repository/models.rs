//! Diesel ORM models for the records table.

use diesel::prelude::*;

use crate::extract::{FieldKey, FieldRecord};
use crate::schema;

/// Stored row from `pdf_common_datas`.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::pdf_common_datas)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecordRow {
    pub id: i32,
    pub file_no: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub sex: Option<String>,
    pub forenames: Option<String>,
    pub family_name: Option<String>,
    pub nationality: Option<String>,
    pub casetown: Option<String>,
    pub casecountry: Option<String>,
    pub casedate: Option<String>,
    pub doc_type: Option<String>,
    pub number: Option<String>,
    pub raw_text: String,
    pub created_at: String,
}

impl RecordRow {
    /// Column value for a canonical key.
    pub fn column(&self, key: FieldKey) -> Option<&str> {
        let value = match key {
            FieldKey::FileNo => &self.file_no,
            FieldKey::DateOfBirth => &self.date_of_birth,
            FieldKey::PlaceOfBirth => &self.place_of_birth,
            FieldKey::Sex => &self.sex,
            FieldKey::Forenames => &self.forenames,
            FieldKey::FamilyName => &self.family_name,
            FieldKey::Nationality => &self.nationality,
            FieldKey::Casetown => &self.casetown,
            FieldKey::Casecountry => &self.casecountry,
            FieldKey::Casedate => &self.casedate,
            FieldKey::Type => &self.doc_type,
            FieldKey::Number => &self.number,
        };
        value.as_deref()
    }
}

/// New record for insertion.
///
/// Every canonical column is always part of the INSERT; absent keys are
/// written as NULL rather than left out.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::pdf_common_datas)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewRecord<'a> {
    pub file_no: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub sex: Option<String>,
    pub forenames: Option<String>,
    pub family_name: Option<String>,
    pub nationality: Option<String>,
    pub casetown: Option<String>,
    pub casecountry: Option<String>,
    pub casedate: Option<String>,
    pub doc_type: Option<String>,
    pub number: Option<String>,
    pub raw_text: &'a str,
    pub created_at: String,
}

impl<'a> NewRecord<'a> {
    pub fn new(record: &FieldRecord, raw_text: &'a str, created_at: String) -> Self {
        Self {
            file_no: record.column(FieldKey::FileNo),
            date_of_birth: record.column(FieldKey::DateOfBirth),
            place_of_birth: record.column(FieldKey::PlaceOfBirth),
            sex: record.column(FieldKey::Sex),
            forenames: record.column(FieldKey::Forenames),
            family_name: record.column(FieldKey::FamilyName),
            nationality: record.column(FieldKey::Nationality),
            casetown: record.column(FieldKey::Casetown),
            casecountry: record.column(FieldKey::Casecountry),
            casedate: record.column(FieldKey::Casedate),
            doc_type: record.column(FieldKey::Type),
            number: record.column(FieldKey::Number),
            raw_text,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldValue;
    use chrono::NaiveDate;

    #[test]
    fn test_new_record_columns() {
        let mut record = FieldRecord::new();
        record.claim_text(FieldKey::Type, "Passport");
        record.claim(
            FieldKey::DateOfBirth,
            FieldValue::Date(NaiveDate::from_ymd_opt(1990, 2, 1).unwrap()),
        );
        record.claim(FieldKey::Casedate, FieldValue::Null);

        let row = NewRecord::new(&record, "raw", "2026-01-01T00:00:00+00:00".to_string());
        assert_eq!(row.doc_type.as_deref(), Some("Passport"));
        assert_eq!(row.date_of_birth.as_deref(), Some("1990-02-01"));
        assert_eq!(row.casedate, None);
        assert_eq!(row.file_no, None);
        assert_eq!(row.raw_text, "raw");
    }

    #[test]
    fn test_insert_lists_every_column() {
        use crate::schema::pdf_common_datas;
        use diesel::sqlite::Sqlite;

        let mut record = FieldRecord::new();
        record.claim_text(FieldKey::FileNo, "123/45");
        let row = NewRecord::new(&record, "raw", "2026-01-01T00:00:00+00:00".to_string());

        let query = diesel::insert_into(pdf_common_datas::table).values(&row);
        let sql = diesel::debug_query::<Sqlite, _>(&query).to_string();
        let columns = sql.split("VALUES").next().unwrap();

        for key in FieldKey::ALL {
            assert!(columns.contains(key.as_str()), "{} missing from {}", key, sql);
        }
        assert!(columns.contains("raw_text"));
        assert!(columns.contains("created_at"));
    }
}
