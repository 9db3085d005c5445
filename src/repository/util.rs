//! Repository utilities.

use diesel::result::DatabaseErrorInformation;

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
pub fn to_diesel_error(e: impl std::fmt::Display) -> diesel::result::Error {
    diesel::result::Error::DatabaseError(
        diesel::result::DatabaseErrorKind::Unknown,
        Box::new(DbErrorInfo(e.to_string())),
    )
}

/// Turn a database URL or path into the filesystem path diesel expects.
///
/// Accepts `sqlite:path`, `sqlite://path` and bare paths; `~` is expanded.
pub fn sqlite_path(database_url: &str) -> String {
    let url = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    shellexpand::tilde(url).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_path_prefixes() {
        assert_eq!(sqlite_path("sqlite:records.db"), "records.db");
        assert_eq!(sqlite_path("sqlite:///tmp/records.db"), "/tmp/records.db");
        assert_eq!(sqlite_path("/var/lib/records.db"), "/var/lib/records.db");
        assert_eq!(sqlite_path(":memory:"), ":memory:");
    }

    #[test]
    fn test_to_diesel_error_keeps_message() {
        let err = to_diesel_error("disk full");
        assert!(err.to_string().contains("disk full"));
    }
}
