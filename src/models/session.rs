//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side session addressed by the cookie token.
///
/// Anonymous visitors get a session too, so the visit counter survives
/// between requests; `redactor_id` is set once they log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Logged-in redactor, if any
    pub redactor_id: Option<i64>,
    /// Dashboard visits counted in this session
    pub num_visits: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh anonymous session with a random token
    pub fn new(expiration_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            redactor_id: None,
            num_visits: 0,
            expires_at: now + Duration::days(expiration_days),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    pub fn is_authenticated(&self) -> bool {
        self.redactor_id.is_some()
    }
}
