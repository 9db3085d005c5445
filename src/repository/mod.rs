//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking,
//! on SQLite through diesel-async's `SyncConnectionWrapper`.

pub mod models;
pub mod pool;
pub mod records;
pub mod util;

pub use pool::{AsyncSqlitePool, DieselError};
pub use records::{DieselRecordRepository, RecordStore, StoredRecord};
