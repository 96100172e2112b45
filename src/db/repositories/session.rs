//! Session repository
//!
//! Database operations for visitor sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Increment the visit counter and return the new value
    async fn increment_visits(&self, id: &str) -> Result<i64>;

    /// Delete all sessions for a redactor
    async fn delete_by_redactor(&self, redactor_id: i64) -> Result<()>;

    /// Delete expired sessions
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_session_sqlite(self.pool.sqlite()?, session).await
            }
            DatabaseDriver::Mysql => {
                create_session_mysql(self.pool.mysql()?, session).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_by_id_sqlite(self.pool.sqlite()?, id).await
            }
            DatabaseDriver::Mysql => {
                get_session_by_id_mysql(self.pool.mysql()?, id).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_session_sqlite(self.pool.sqlite()?, id).await
            }
            DatabaseDriver::Mysql => delete_session_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn increment_visits(&self, id: &str) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => increment_visits_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => increment_visits_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn delete_by_redactor(&self, redactor_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_sessions_by_redactor_sqlite(self.pool.sqlite()?, redactor_id).await
            }
            DatabaseDriver::Mysql => {
                delete_sessions_by_redactor_mysql(self.pool.mysql()?, redactor_id).await
            }
        }
    }

    async fn delete_expired(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_expired_sessions_sqlite(self.pool.sqlite()?).await
            }
            DatabaseDriver::Mysql => {
                delete_expired_sessions_mysql(self.pool.mysql()?).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, redactor_id, num_visits, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.redactor_id)
    .bind(session.num_visits)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, redactor_id, num_visits, expires_at, created_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_session_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn delete_session_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn increment_visits_sqlite(pool: &SqlitePool, id: &str) -> Result<i64> {
    sqlx::query("UPDATE sessions SET num_visits = num_visits + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment session visits")?;

    let row = sqlx::query("SELECT num_visits FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read session visits")?
        .ok_or_else(|| anyhow::anyhow!("Session not found"))?;

    Ok(row.get("num_visits"))
}

async fn delete_sessions_by_redactor_sqlite(pool: &SqlitePool, redactor_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE redactor_id = ?")
        .bind(redactor_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by redactor")?;

    Ok(())
}

async fn delete_expired_sessions_sqlite(pool: &SqlitePool) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected() as i64)
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    Ok(Session {
        id: row.get("id"),
        redactor_id: row.get("redactor_id"),
        num_visits: row.get("num_visits"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, redactor_id, num_visits, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.redactor_id)
    .bind(session.num_visits)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, redactor_id, num_visits, expires_at, created_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_session_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn delete_session_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn increment_visits_mysql(pool: &MySqlPool, id: &str) -> Result<i64> {
    sqlx::query("UPDATE sessions SET num_visits = num_visits + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment session visits")?;

    let row = sqlx::query("SELECT num_visits FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read session visits")?
        .ok_or_else(|| anyhow::anyhow!("Session not found"))?;

    Ok(row.get("num_visits"))
}

async fn delete_sessions_by_redactor_mysql(pool: &MySqlPool, redactor_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE redactor_id = ?")
        .bind(redactor_id)
        .execute(pool)
        .await
        .context("Failed to delete sessions by redactor")?;

    Ok(())
}

async fn delete_expired_sessions_mysql(pool: &MySqlPool) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected() as i64)
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Session> {
    Ok(Session {
        id: row.get("id"),
        redactor_id: row.get("redactor_id"),
        num_visits: row.get("num_visits"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    })
}
