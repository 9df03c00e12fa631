use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSexError(String);

impl fmt::Display for ParseSexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sex {:?}, expected Male or Female", self.0)
    }
}

impl std::error::Error for ParseSexError {}

impl FromStr for Sex {
    type Err = ParseSexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(ParseSexError(s.to_string())),
        }
    }
}

/// A stored user as returned by every read and write of the api.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub sex: Sex,
    /// UTC, serialized as RFC 3339 with a `Z` suffix.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a user. `sex` falls back to [`Sex::Male`] when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub sex: Sex,
}

/// Partial update. Fields left as `None` keep their stored value and are
/// omitted from the serialized body.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.sex.is_none()
    }
}

/// Equality filter for looking a user up by any combination of fields.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl UserFilter {
    pub fn by_name(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            phone: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_user_defaults_to_male() {
        let user: NewUser = serde_json::from_str(
            r#"{"firstName":"Ada","lastName":"Lovelace","phone":"555-0100"}"#,
        )
        .unwrap();
        assert_eq!(user.sex, Sex::Male);
    }

    #[test]
    fn test_user_timestamps_serialize_as_utc() {
        let created_at = DateTime::parse_from_rfc3339("2025-03-01T09:30:00.250+02:00")
            .unwrap()
            .with_timezone(&Utc);
        let user = User {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: "555-0100".to_string(),
            sex: Sex::Female,
            created_at,
            updated_at: created_at,
        };

        let body = serde_json::to_value(&user).unwrap();
        assert_eq!(body["createdAt"], "2025-03-01T07:30:00.250Z");
        assert_eq!(serde_json::from_value::<User>(body).unwrap(), user);
    }

    #[test]
    fn test_changes_serialize_only_provided_fields() {
        let changes = UserChanges {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        let body = serde_json::to_value(&changes).unwrap();
        assert_eq!(body, serde_json::json!({ "phone": "555-0199" }));
        assert!(!changes.is_empty());
        assert!(UserChanges::default().is_empty());
    }

    #[test]
    fn test_changes_ignore_unknown_fields() {
        let changes: UserChanges =
            serde_json::from_str(r#"{"id":4,"sex":"Female","createdAt":"x"}"#).unwrap();
        assert_eq!(changes.sex, Some(Sex::Female));
        assert!(changes.first_name.is_none());
    }

    #[test]
    fn test_sex_parses_case_insensitively() {
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("MALE".parse::<Sex>().unwrap(), Sex::Male);
        assert!("other".parse::<Sex>().is_err());
        assert!(serde_json::from_str::<Sex>(r#""Other""#).is_err());
    }
}
