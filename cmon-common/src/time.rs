//! Timestamp utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// RFC 3339 timestamp made safe for file names (`:` and `.` become `-`)
///
/// `2025-08-12T09:30:15.123Z` → `2025-08-12T09-30-15-123Z`
pub fn file_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_today_matches_now() {
        assert_eq!(today(), now().date_naive());
    }

    #[test]
    fn test_file_stamp_replaces_separators() {
        let at = Utc.with_ymd_and_hms(2025, 8, 12, 9, 30, 15).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(file_stamp(at), "2025-08-12T09-30-15-123Z");
    }
}
