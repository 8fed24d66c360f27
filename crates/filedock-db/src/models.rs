//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
///
/// Closed set: the permission table in `filedock-auth` matches on this
/// exhaustively, so new roles must be threaded through there as well.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Editor,
    Viewer,
    ExternalViewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::Viewer => "viewer",
            UserRole::ExternalViewer => "external_viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            "viewer" => Ok(UserRole::Viewer),
            "external_viewer" => Ok(UserRole::ExternalViewer),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Login key, stored case-sensitively
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    /// Storage-key subtree this user is confined to.
    /// `None` or empty means unrestricted.
    pub allowed_path_prefix: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Effective path restriction: empty strings collapse to no restriction
    pub fn path_restriction(&self) -> Option<&str> {
        self.allowed_path_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub allowed_path_prefix: Option<String>,
}

/// Update user (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// `Some(None)` clears the restriction, `Some(Some(p))` replaces it
    pub allowed_path_prefix: Option<Option<String>>,
}

/// Refresh-token session model
///
/// The `refresh_token` string is the session's identity: lookups go by
/// exact token match, and rotation overwrites the token in place so a
/// lineage never occupies more than one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// New session (for insertion)
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        let last_login: Option<String> = row.try_get("last_login_at")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            full_name: row.try_get("full_name")?,
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::ExternalViewer),
            is_active: row.try_get("is_active")?,
            allowed_path_prefix: row.try_get("allowed_path_prefix")?,
            last_login_at: last_login.map(|s| parse_datetime_or_now(&s)),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Session {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            refresh_token: row.try_get("refresh_token")?,
            expires_at: parse_datetime_or_now(&row.try_get::<String, _>("expires_at")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::Admin,
            UserRole::Editor,
            UserRole::Viewer,
            UserRole::ExternalViewer,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn test_path_restriction_collapses_empty() {
        let mut user = User {
            id: 1,
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            role: UserRole::Viewer,
            is_active: true,
            allowed_path_prefix: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.path_restriction(), None);
        user.allowed_path_prefix = Some("  ".to_string());
        assert_eq!(user.path_restriction(), None);
        user.allowed_path_prefix = Some("team/alpha".to_string());
        assert_eq!(user.path_restriction(), Some("team/alpha"));
    }
}
