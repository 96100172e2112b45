//! Topic repository
//!
//! Database operations for topics.
//!
//! This module provides:
//! - `TopicRepository` trait defining the interface for topic data access
//! - `SqlxTopicRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Topic;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::placeholders;

/// Topic repository trait
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Create a new topic
    async fn create(&self, topic: &Topic) -> Result<Topic>;

    /// Get topic by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>>;

    /// Get topic by exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<Topic>>;

    /// Get every topic whose id is in `ids`, ordered by name
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Topic>>;

    /// List one page of topics ordered by name
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Topic>>;

    /// List all topics ordered by name
    async fn list_all(&self) -> Result<Vec<Topic>>;

    /// Count all topics
    async fn count(&self) -> Result<i64>;

    /// Rename a topic
    async fn update(&self, id: i64, name: &str) -> Result<Topic>;

    /// Delete a topic, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if another topic already uses `name`
    async fn exists_by_name_excluding(&self, name: &str, exclude_id: Option<i64>) -> Result<bool>;
}

/// SQLx-based topic repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTopicRepository {
    pool: DynDatabasePool,
}

impl SqlxTopicRepository {
    /// Create a new SQLx topic repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TopicRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TopicRepository for SqlxTopicRepository {
    async fn create(&self, topic: &Topic) -> Result<Topic> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_topic_sqlite(self.pool.sqlite()?, topic).await,
            DatabaseDriver::Mysql => create_topic_mysql(self.pool.mysql()?, topic).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_topic_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_topic_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_topic_by_name_sqlite(self.pool.sqlite()?, name).await,
            DatabaseDriver::Mysql => get_topic_by_name_mysql(self.pool.mysql()?, name).await,
        }
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Topic>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_topics_by_ids_sqlite(self.pool.sqlite()?, ids).await,
            DatabaseDriver::Mysql => get_topics_by_ids_mysql(self.pool.mysql()?, ids).await,
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_topics_sqlite(self.pool.sqlite()?, offset, limit).await,
            DatabaseDriver::Mysql => list_topics_mysql(self.pool.mysql()?, offset, limit).await,
        }
    }

    async fn list_all(&self) -> Result<Vec<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_all_topics_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_all_topics_mysql(self.pool.mysql()?).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_topics_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => count_topics_mysql(self.pool.mysql()?).await,
        }
    }

    async fn update(&self, id: i64, name: &str) -> Result<Topic> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_topic_sqlite(self.pool.sqlite()?, id, name).await,
            DatabaseDriver::Mysql => update_topic_mysql(self.pool.mysql()?, id, name).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_topic_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_topic_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_name_excluding(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_name_excluding_sqlite(self.pool.sqlite()?, name, exclude_id).await
            }
            DatabaseDriver::Mysql => {
                exists_by_name_excluding_mysql(self.pool.mysql()?, name, exclude_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_topic_sqlite(pool: &SqlitePool, topic: &Topic) -> Result<Topic> {
    let result = sqlx::query("INSERT INTO topics (name) VALUES (?)")
        .bind(&topic.name)
        .execute(pool)
        .await
        .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_rowid(),
        name: topic.name.clone(),
    })
}

async fn get_topic_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    row.map(|row| row_to_topic_sqlite(&row)).transpose()
}

async fn get_topic_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by name")?;

    row.map(|row| row_to_topic_sqlite(&row)).transpose()
}

async fn get_topics_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Topic>> {
    let sql = format!(
        "SELECT id, name FROM topics WHERE id IN ({}) ORDER BY name",
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get topics by IDs")?;

    rows.iter().map(row_to_topic_sqlite).collect()
}

async fn list_topics_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Topic>> {
    let rows = sqlx::query("SELECT id, name FROM topics ORDER BY name, id LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list topics")?;

    rows.iter().map(row_to_topic_sqlite).collect()
}

async fn list_all_topics_sqlite(pool: &SqlitePool) -> Result<Vec<Topic>> {
    let rows = sqlx::query("SELECT id, name FROM topics ORDER BY name, id")
        .fetch_all(pool)
        .await
        .context("Failed to list all topics")?;

    rows.iter().map(row_to_topic_sqlite).collect()
}

async fn count_topics_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM topics")
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;

    Ok(row.get("count"))
}

async fn update_topic_sqlite(pool: &SqlitePool, id: i64, name: &str) -> Result<Topic> {
    sqlx::query("UPDATE topics SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update topic")?;

    get_topic_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Topic not found after update"))
}

async fn delete_topic_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // newspaper_topics rows go with it (ON DELETE CASCADE)
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete topic")?;

    Ok(result.rows_affected() > 0)
}

async fn exists_by_name_excluding_sqlite(
    pool: &SqlitePool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM topics WHERE name = ? AND id != ?")
        .bind(name)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(pool)
        .await
        .context("Failed to check topic name")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

pub(super) fn row_to_topic_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Topic> {
    Ok(Topic {
        id: row.get("id"),
        name: row.get("name"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_topic_mysql(pool: &MySqlPool, topic: &Topic) -> Result<Topic> {
    let result = sqlx::query("INSERT INTO topics (name) VALUES (?)")
        .bind(&topic.name)
        .execute(pool)
        .await
        .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_id() as i64,
        name: topic.name.clone(),
    })
}

async fn get_topic_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    row.map(|row| row_to_topic_mysql(&row)).transpose()
}

async fn get_topic_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by name")?;

    row.map(|row| row_to_topic_mysql(&row)).transpose()
}

async fn get_topics_by_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<Topic>> {
    let sql = format!(
        "SELECT id, name FROM topics WHERE id IN ({}) ORDER BY name",
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get topics by IDs")?;

    rows.iter().map(row_to_topic_mysql).collect()
}

async fn list_topics_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Topic>> {
    let rows = sqlx::query("SELECT id, name FROM topics ORDER BY name, id LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list topics")?;

    rows.iter().map(row_to_topic_mysql).collect()
}

async fn list_all_topics_mysql(pool: &MySqlPool) -> Result<Vec<Topic>> {
    let rows = sqlx::query("SELECT id, name FROM topics ORDER BY name, id")
        .fetch_all(pool)
        .await
        .context("Failed to list all topics")?;

    rows.iter().map(row_to_topic_mysql).collect()
}

async fn count_topics_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM topics")
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;

    Ok(row.get("count"))
}

async fn update_topic_mysql(pool: &MySqlPool, id: i64, name: &str) -> Result<Topic> {
    sqlx::query("UPDATE topics SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update topic")?;

    get_topic_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Topic not found after update"))
}

async fn delete_topic_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete topic")?;

    Ok(result.rows_affected() > 0)
}

async fn exists_by_name_excluding_mysql(
    pool: &MySqlPool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM topics WHERE name = ? AND id != ?")
        .bind(name)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(pool)
        .await
        .context("Failed to check topic name")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

pub(super) fn row_to_topic_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Topic> {
    Ok(Topic {
        id: row.get("id"),
        name: row.get("name"),
    })
}
