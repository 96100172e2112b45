//! Redactor repository
//!
//! Database operations for redactor accounts.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateRedactorInput, Redactor, UpdateRedactorInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::placeholders;

pub(super) const REDACTOR_COLUMNS: &str = "id, username, first_name, last_name, email, password_hash, years_of_experience, date_joined, last_login";

/// Redactor repository trait
#[async_trait]
pub trait RedactorRepository: Send + Sync {
    /// Create a new redactor
    async fn create(&self, input: &CreateRedactorInput) -> Result<Redactor>;

    /// Get redactor by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Redactor>>;

    /// Get redactor by username
    async fn get_by_username(&self, username: &str) -> Result<Option<Redactor>>;

    /// Get every redactor whose id is in `ids`, ordered by username
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Redactor>>;

    /// List one page of redactors ordered by username
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Redactor>>;

    /// List all redactors ordered by username
    async fn list_all(&self) -> Result<Vec<Redactor>>;

    /// Count all redactors
    async fn count(&self) -> Result<i64>;

    /// Update profile fields
    async fn update(&self, id: i64, input: &UpdateRedactorInput) -> Result<Redactor>;

    /// Stamp the last successful login
    async fn update_last_login(&self, id: i64) -> Result<()>;

    /// Delete a redactor, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if another redactor already uses `username`
    async fn exists_by_username_excluding(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool>;
}

/// SQLx-based redactor repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxRedactorRepository {
    pool: DynDatabasePool,
}

impl SqlxRedactorRepository {
    /// Create a new SQLx redactor repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RedactorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RedactorRepository for SqlxRedactorRepository {
    async fn create(&self, input: &CreateRedactorInput) -> Result<Redactor> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_redactor_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_redactor_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Redactor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_redactor_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_redactor_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Redactor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_redactor_by_username_sqlite(self.pool.sqlite()?, username).await
            }
            DatabaseDriver::Mysql => {
                get_redactor_by_username_mysql(self.pool.mysql()?, username).await
            }
        }
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Redactor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_redactors_by_ids_sqlite(self.pool.sqlite()?, ids).await,
            DatabaseDriver::Mysql => get_redactors_by_ids_mysql(self.pool.mysql()?, ids).await,
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Redactor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_redactors_sqlite(self.pool.sqlite()?, Some((offset, limit))).await
            }
            DatabaseDriver::Mysql => {
                list_redactors_mysql(self.pool.mysql()?, Some((offset, limit))).await
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<Redactor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_redactors_sqlite(self.pool.sqlite()?, None).await,
            DatabaseDriver::Mysql => list_redactors_mysql(self.pool.mysql()?, None).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_redactors_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => count_redactors_mysql(self.pool.mysql()?).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateRedactorInput) -> Result<Redactor> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_redactor_sqlite(self.pool.sqlite()?, id, input).await,
            DatabaseDriver::Mysql => update_redactor_mysql(self.pool.mysql()?, id, input).await,
        }
    }

    async fn update_last_login(&self, id: i64) -> Result<()> {
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("UPDATE redactors SET last_login = ? WHERE id = ?")
                    .bind(now)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update last login")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("UPDATE redactors SET last_login = ? WHERE id = ?")
                    .bind(now)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update last login")?;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_redactor_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_redactor_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_username_excluding(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_username_excluding_sqlite(self.pool.sqlite()?, username, exclude_id).await
            }
            DatabaseDriver::Mysql => {
                exists_by_username_excluding_mysql(self.pool.mysql()?, username, exclude_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_redactor_sqlite(pool: &SqlitePool, input: &CreateRedactorInput) -> Result<Redactor> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO redactors (username, first_name, last_name, email, password_hash, years_of_experience, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.username)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(input.years_of_experience)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create redactor")?;

    Ok(redactor_from_input(result.last_insert_rowid(), input, now))
}

async fn get_redactor_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE id = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by ID")?;

    row.map(|row| row_to_redactor_sqlite(&row)).transpose()
}

async fn get_redactor_by_username_sqlite(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE username = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by username")?;

    row.map(|row| row_to_redactor_sqlite(&row)).transpose()
}

async fn get_redactors_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Redactor>> {
    let sql = format!(
        "SELECT {} FROM redactors WHERE id IN ({}) ORDER BY username",
        REDACTOR_COLUMNS,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get redactors by IDs")?;

    rows.iter().map(row_to_redactor_sqlite).collect()
}

async fn list_redactors_sqlite(
    pool: &SqlitePool,
    page: Option<(i64, i64)>,
) -> Result<Vec<Redactor>> {
    let rows = match page {
        Some((offset, limit)) => {
            let sql = format!(
                "SELECT {} FROM redactors ORDER BY username LIMIT ? OFFSET ?",
                REDACTOR_COLUMNS
            );
            sqlx::query(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!("SELECT {} FROM redactors ORDER BY username", REDACTOR_COLUMNS);
            sqlx::query(&sql).fetch_all(pool).await
        }
    }
    .context("Failed to list redactors")?;

    rows.iter().map(row_to_redactor_sqlite).collect()
}

async fn count_redactors_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM redactors")
        .fetch_one(pool)
        .await
        .context("Failed to count redactors")?;

    Ok(row.get("count"))
}

async fn update_redactor_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateRedactorInput,
) -> Result<Redactor> {
    sqlx::query(
        r#"
        UPDATE redactors
        SET username = ?, first_name = ?, last_name = ?, years_of_experience = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.username)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(input.years_of_experience)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update redactor")?;

    get_redactor_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Redactor not found after update"))
}

async fn delete_redactor_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // Sessions and newspaper_publishers rows cascade
    let result = sqlx::query("DELETE FROM redactors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete redactor")?;

    Ok(result.rows_affected() > 0)
}

async fn exists_by_username_excluding_sqlite(
    pool: &SqlitePool,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM redactors WHERE username = ? AND id != ?")
        .bind(username)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(pool)
        .await
        .context("Failed to check username")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

pub(super) fn row_to_redactor_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Redactor> {
    Ok(Redactor {
        id: row.get("id"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        years_of_experience: row.get("years_of_experience"),
        date_joined: row.get("date_joined"),
        last_login: row.get("last_login"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_redactor_mysql(pool: &MySqlPool, input: &CreateRedactorInput) -> Result<Redactor> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO redactors (username, first_name, last_name, email, password_hash, years_of_experience, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.username)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(input.years_of_experience)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create redactor")?;

    Ok(redactor_from_input(result.last_insert_id() as i64, input, now))
}

async fn get_redactor_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE id = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by ID")?;

    row.map(|row| row_to_redactor_mysql(&row)).transpose()
}

async fn get_redactor_by_username_mysql(
    pool: &MySqlPool,
    username: &str,
) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE username = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by username")?;

    row.map(|row| row_to_redactor_mysql(&row)).transpose()
}

async fn get_redactors_by_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<Redactor>> {
    let sql = format!(
        "SELECT {} FROM redactors WHERE id IN ({}) ORDER BY username",
        REDACTOR_COLUMNS,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get redactors by IDs")?;

    rows.iter().map(row_to_redactor_mysql).collect()
}

async fn list_redactors_mysql(pool: &MySqlPool, page: Option<(i64, i64)>) -> Result<Vec<Redactor>> {
    let rows = match page {
        Some((offset, limit)) => {
            let sql = format!(
                "SELECT {} FROM redactors ORDER BY username LIMIT ? OFFSET ?",
                REDACTOR_COLUMNS
            );
            sqlx::query(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!("SELECT {} FROM redactors ORDER BY username", REDACTOR_COLUMNS);
            sqlx::query(&sql).fetch_all(pool).await
        }
    }
    .context("Failed to list redactors")?;

    rows.iter().map(row_to_redactor_mysql).collect()
}

async fn count_redactors_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM redactors")
        .fetch_one(pool)
        .await
        .context("Failed to count redactors")?;

    Ok(row.get("count"))
}

async fn update_redactor_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateRedactorInput,
) -> Result<Redactor> {
    sqlx::query(
        r#"
        UPDATE redactors
        SET username = ?, first_name = ?, last_name = ?, years_of_experience = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.username)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(input.years_of_experience)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update redactor")?;

    get_redactor_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Redactor not found after update"))
}

async fn delete_redactor_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM redactors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete redactor")?;

    Ok(result.rows_affected() > 0)
}

async fn exists_by_username_excluding_mysql(
    pool: &MySqlPool,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM redactors WHERE username = ? AND id != ?")
        .bind(username)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(pool)
        .await
        .context("Failed to check username")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

pub(super) fn row_to_redactor_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Redactor> {
    Ok(Redactor {
        id: row.get("id"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        years_of_experience: row.get("years_of_experience"),
        date_joined: row.get("date_joined"),
        last_login: row.get("last_login"),
    })
}

fn redactor_from_input(
    id: i64,
    input: &CreateRedactorInput,
    date_joined: chrono::DateTime<Utc>,
) -> Redactor {
    Redactor {
        id,
        username: input.username.clone(),
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        email: input.email.clone(),
        password_hash: input.password_hash.clone(),
        years_of_experience: input.years_of_experience,
        date_joined,
        last_login: None,
    }
}
