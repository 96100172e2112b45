//! Session service
//!
//! Server-side sessions addressed by a random cookie token. A session exists
//! for anonymous visitors too, so the dashboard visit counter works before
//! login. Logging in cycles the token and carries the counter over.

use crate::db::repositories::SessionRepository;
use crate::models::Session;
use anyhow::Context;
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

/// Error types for session service operations
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
    expiration_days: i64,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_expiration(repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    pub fn with_expiration(repo: Arc<dyn SessionRepository>, expiration_days: i64) -> Self {
        Self {
            repo,
            expiration_days,
        }
    }

    pub fn expiration_days(&self) -> i64 {
        self.expiration_days
    }

    /// Look up the session for a cookie token
    ///
    /// Expired sessions are deleted and reported as absent.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, SessionServiceError> {
        let Some(session) = self
            .repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            tracing::debug!("Dropping expired session");
            self.repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Create a fresh anonymous session
    pub async fn start(&self) -> Result<Session, SessionServiceError> {
        let session = self
            .repo
            .create(&Session::new(self.expiration_days))
            .await
            .context("Failed to create session")?;
        Ok(session)
    }

    /// Count a dashboard visit, returning the total including this one
    pub async fn record_visit(&self, session_id: &str) -> Result<i64, SessionServiceError> {
        let visits = self
            .repo
            .increment_visits(session_id)
            .await
            .context("Failed to record visit")?;
        Ok(visits)
    }

    /// Bind a redactor to a new session token
    ///
    /// The previous session, if any, is removed and its visit counter is
    /// carried over to the new one.
    pub async fn login(
        &self,
        previous: Option<&Session>,
        redactor_id: i64,
    ) -> Result<Session, SessionServiceError> {
        let mut session = Session::new(self.expiration_days);
        session.redactor_id = Some(redactor_id);
        session.num_visits = previous.map(|s| s.num_visits).unwrap_or(0);

        let created = self
            .repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        if let Some(previous) = previous {
            self.repo
                .delete(&previous.id)
                .await
                .context("Failed to delete previous session")?;
        }

        tracing::info!(redactor_id, "Redactor logged in");
        Ok(created)
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), SessionServiceError> {
        self.repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Delete every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> Result<i64, SessionServiceError> {
        let count = self
            .repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}
