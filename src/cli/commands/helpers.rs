//! Shared helper functions for CLI commands.

use serde::Serialize;

use crate::config::Settings;
use crate::repository::{AsyncSqlitePool, DieselRecordRepository};

/// Open the record repository, creating the schema if needed.
pub async fn open_repository(settings: &Settings) -> anyhow::Result<DieselRecordRepository> {
    settings.ensure_directories()?;
    let repo = DieselRecordRepository::new(AsyncSqlitePool::new(&settings.database_url()));
    repo.init_schema().await?;
    Ok(repo)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
