//! Database schema and queries
//!
//! Everything is stored as TEXT: UUIDs as hyphenated strings, dates as
//! `YYYY-MM-DD`, timestamps as RFC 3339 with millisecond precision and `Z`.
//! Every query is scoped to the owning user; a row owned by someone else is
//! reported as [`crate::Error::NotFound`].

pub mod cases;
pub mod init;
pub mod orders;
pub mod profiles;
pub mod seed;

pub use cases::*;
pub use init::*;
pub use orders::*;
pub use profiles::*;
pub use seed::*;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

/// Fixed-width timestamp text so `ORDER BY` on the column sorts correctly
pub(crate) fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("corrupt {} '{}': {}", column, value, e)))
}

pub(crate) fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("corrupt {} '{}': {}", column, value, e)))
}

pub(crate) fn parse_optional_date(column: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    value.as_deref().map(|v| parse_date(column, v)).transpose()
}

pub(crate) fn date_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_text_is_fixed_width() {
        let at = Utc.with_ymd_and_hms(2025, 8, 12, 9, 30, 0).unwrap();
        let text = timestamp_text(at);
        assert_eq!(text, "2025-08-12T09:30:00.000Z");
        assert_eq!(parse_timestamp("created_at", &text).unwrap(), at);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("deadline", "15/08/2025"),
            Err(Error::Internal(_))
        ));
        assert_eq!(
            parse_optional_date("deadline", Some("2025-08-15".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 15)
        );
        assert_eq!(parse_optional_date("deadline", None).unwrap(), None);
    }
}
