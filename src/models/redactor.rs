//! Redactor model
//!
//! Redactors are the staff accounts of the agency. They log in, manage topics
//! and newspapers, and are linked to the newspapers they publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a username, in characters
pub const USERNAME_MAX_LEN: usize = 150;

/// Redactor entity representing a staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redactor {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Email address, empty when not given
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Years of professional experience
    pub years_of_experience: i64,
    /// Account creation timestamp
    pub date_joined: DateTime<Utc>,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
}

impl Redactor {
    /// Create a new Redactor.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash,
            years_of_experience: 0,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    /// First and last name joined by a space, trimmed when either is empty
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Renders as `"{first_name} {last_name} ({username})"`.
impl fmt::Display for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.first_name, self.last_name, self.username
        )
    }
}

/// Input for creating a redactor
#[derive(Debug, Clone)]
pub struct CreateRedactorInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Password hash (argon2), never the plaintext
    pub password_hash: String,
    pub years_of_experience: i64,
}

/// Input for updating a redactor's profile
#[derive(Debug, Clone)]
pub struct UpdateRedactorInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub years_of_experience: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let mut redactor = Redactor::new("jdoe".to_string(), "hash".to_string());
        redactor.first_name = "John".to_string();
        redactor.last_name = "Doe".to_string();

        assert_eq!(redactor.to_string(), "John Doe (jdoe)");
        assert_eq!(redactor.full_name(), "John Doe");
    }

    #[test]
    fn test_full_name_without_names() {
        let redactor = Redactor::new("jdoe".to_string(), "hash".to_string());
        assert_eq!(redactor.full_name(), "");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let redactor = Redactor::new("jdoe".to_string(), "secret-hash".to_string());
        let json = serde_json::to_string(&redactor).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
