//! Diesel-based record repository for SQLite.
//!
//! Each save is a single independent INSERT on a freshly opened connection,
//! so concurrent sessions need no application-level locking.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use serde::Serialize;

use super::models::{NewRecord, RecordRow};
use super::pool::{AsyncSqlitePool, DieselError};
use crate::extract::{FieldKey, FieldRecord, FieldValue};
use crate::schema::pdf_common_datas;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS pdf_common_datas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_no TEXT,
        date_of_birth TEXT,
        place_of_birth TEXT,
        sex TEXT,
        forenames TEXT,
        family_name TEXT,
        nationality TEXT,
        casetown TEXT,
        casecountry TEXT,
        casedate TEXT,
        "type" TEXT,
        number TEXT,
        raw_text TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_pdf_common_datas_file_no ON pdf_common_datas(file_no);
"#;

/// Destination for extracted records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one record together with the raw text it was extracted from.
    async fn save(&self, record: &FieldRecord, raw_text: &str) -> Result<(), DieselError>;
}

/// A record as read back from the database.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub id: i32,
    pub fields: FieldRecord,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<RecordRow> for StoredRecord {
    fn from(row: RecordRow) -> Self {
        let mut fields = FieldRecord::new();
        for key in FieldKey::ALL {
            let Some(column) = row.column(key) else {
                continue;
            };
            let value = if key.is_date() {
                NaiveDate::parse_from_str(column, "%Y-%m-%d")
                    .map(FieldValue::Date)
                    .unwrap_or_else(|_| FieldValue::Text(column.to_string()))
            } else {
                FieldValue::Text(column.to_string())
            };
            fields.claim(key, value);
        }

        StoredRecord {
            id: row.id,
            fields,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            raw_text: row.raw_text,
        }
    }
}

/// Diesel-based record repository with compile-time query checking.
#[derive(Debug, Clone)]
pub struct DieselRecordRepository {
    pool: AsyncSqlitePool,
}

impl DieselRecordRepository {
    /// Create a new Diesel record repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create the records table if it doesn't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(CREATE_TABLE).await
    }

    /// Insert one record.
    pub async fn insert(&self, record: &FieldRecord, raw_text: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let row = NewRecord::new(record, raw_text, Utc::now().to_rfc3339());

        diesel::insert_into(pdf_common_datas::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Count stored records.
    pub async fn count(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = pdf_common_datas::table
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Most recently stored records, newest first.
    pub async fn latest(&self, limit: u32) -> Result<Vec<StoredRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        pdf_common_datas::table
            .order(pdf_common_datas::id.desc())
            .limit(i64::from(limit))
            .select(RecordRow::as_select())
            .load::<RecordRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(StoredRecord::from).collect())
    }
}

#[async_trait]
impl RecordStore for DieselRecordRepository {
    async fn save(&self, record: &FieldRecord, raw_text: &str) -> Result<(), DieselError> {
        self.insert(record, raw_text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record() -> FieldRecord {
        let mut record = FieldRecord::new();
        record.claim_text(FieldKey::FileNo, "123/45");
        record.claim_text(FieldKey::FamilyName, "DOE");
        record.claim(
            FieldKey::DateOfBirth,
            FieldValue::Date(NaiveDate::from_ymd_opt(1990, 2, 1).unwrap()),
        );
        record
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let dir = tempdir().unwrap();
        let repo = DieselRecordRepository::new(AsyncSqlitePool::from_path(
            &dir.path().join("records.db"),
        ));
        repo.init_schema().await.unwrap();
        // Schema creation is idempotent.
        repo.init_schema().await.unwrap();

        repo.save(&sample_record(), "File No: 123/45").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        let stored = repo.latest(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].fields, sample_record());
        assert_eq!(stored[0].raw_text, "File No: 123/45");
    }

    #[tokio::test]
    async fn test_latest_is_newest_first() {
        let dir = tempdir().unwrap();
        let repo = DieselRecordRepository::new(AsyncSqlitePool::from_path(
            &dir.path().join("records.db"),
        ));
        repo.init_schema().await.unwrap();

        for name in ["FIRST", "SECOND", "THIRD"] {
            let mut record = FieldRecord::new();
            record.claim_text(FieldKey::FamilyName, name);
            repo.save(&record, name).await.unwrap();
        }

        let stored = repo.latest(2).await.unwrap();
        let names: Vec<_> = stored
            .iter()
            .map(|r| r.fields.text(FieldKey::FamilyName).unwrap())
            .collect();
        assert_eq!(names, vec!["THIRD", "SECOND"]);
    }

    #[tokio::test]
    async fn test_save_without_schema_fails() {
        let dir = tempdir().unwrap();
        let repo = DieselRecordRepository::new(AsyncSqlitePool::from_path(
            &dir.path().join("records.db"),
        ));
        assert!(repo.save(&sample_record(), "text").await.is_err());
    }
}
