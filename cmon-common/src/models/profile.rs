//! Professional profile, one per user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    /// Unique: one profile per authenticated identity
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub firm_name: Option<String>,
    pub bar_registration: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub practice_areas: Vec<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form submission for the profile settings page
///
/// Blank strings are stored as NULL. `practice_areas` is the comma-separated
/// form value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub firm_name: String,
    #[serde(default)]
    pub bar_registration: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub practice_areas: String,
}

/// Blank → None
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a comma-separated list, trimming entries and dropping empties
pub fn parse_practice_areas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|area| !area.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_practice_areas() {
        assert_eq!(
            parse_practice_areas("Land Revenue,  Writs , ,PIL"),
            vec!["Land Revenue", "Writs", "PIL"]
        );
        assert!(parse_practice_areas("").is_empty());
        assert!(parse_practice_areas(" , ,").is_empty());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" Test Officer "), Some("Test Officer".to_string()));
    }
}
