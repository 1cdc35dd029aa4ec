//! Row identifiers
//!
//! Ids are UUIDv4 stored as hyphenated TEXT.

use uuid::Uuid;

use crate::{Error, Result};

/// New random row id
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a UUID read back from a TEXT column
///
/// A malformed value means the row was written outside this crate, so it is
/// reported as an internal error naming the column.
pub fn parse_column(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("corrupt {} '{}': {}", column, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_round_trips_text() {
        let id = generate();
        assert_eq!(parse_column("id", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_column_names_bad_column() {
        let err = parse_column("case_id", "not-a-uuid").unwrap_err();
        assert!(err.to_string().contains("case_id"));
    }
}
