//! Newspaper repository
//!
//! Database operations for newspapers and their topic / publisher links.
//!
//! Newspaper rows and their junction rows are always written together inside
//! one transaction. Relations for a whole page of newspapers are loaded with a
//! single `IN (...)` query per relation (`topics_for` / `publishers_for`).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Newspaper, NewspaperInput, Redactor, Topic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::placeholders;
use super::redactor::{row_to_redactor_mysql, row_to_redactor_sqlite};
use super::topic::{row_to_topic_mysql, row_to_topic_sqlite};

const PUBLISHER_COLUMNS: &str = "np.newspaper_id, r.id, r.username, r.first_name, r.last_name, r.email, r.password_hash, r.years_of_experience, r.date_joined, r.last_login";

/// Newspaper repository trait
#[async_trait]
pub trait NewspaperRepository: Send + Sync {
    /// Create a newspaper together with its topic and publisher links
    async fn create(&self, input: &NewspaperInput) -> Result<Newspaper>;

    /// Get newspaper by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Newspaper>>;

    /// List one page, newest `published_date` first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Newspaper>>;

    /// Count all newspapers
    async fn count(&self) -> Result<i64>;

    /// Replace fields and both link sets
    async fn update(&self, id: i64, input: &NewspaperInput) -> Result<Newspaper>;

    /// Delete a newspaper, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Up to `limit` newspapers picked at random by the database
    async fn random(&self, limit: i64) -> Result<Vec<Newspaper>>;

    /// Newspapers filed under a topic, newest first
    async fn list_by_topic(&self, topic_id: i64) -> Result<Vec<Newspaper>>;

    /// Newspapers published by a redactor, newest first
    async fn list_by_publisher(&self, redactor_id: i64) -> Result<Vec<Newspaper>>;

    /// Topics of every listed newspaper as `(newspaper_id, topic)` pairs
    async fn topics_for(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Topic)>>;

    /// Publishers of every listed newspaper as `(newspaper_id, redactor)` pairs
    async fn publishers_for(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Redactor)>>;
}

/// SQLx-based newspaper repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxNewspaperRepository {
    pool: DynDatabasePool,
}

impl SqlxNewspaperRepository {
    /// Create a new SQLx newspaper repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewspaperRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewspaperRepository for SqlxNewspaperRepository {
    async fn create(&self, input: &NewspaperInput) -> Result<Newspaper> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_newspaper_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_newspaper_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Newspaper>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_newspaper_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_newspaper_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Newspaper>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_newspapers_sqlite(self.pool.sqlite()?, offset, limit).await
            }
            DatabaseDriver::Mysql => list_newspapers_mysql(self.pool.mysql()?, offset, limit).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_newspapers_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => count_newspapers_mysql(self.pool.mysql()?).await,
        }
    }

    async fn update(&self, id: i64, input: &NewspaperInput) -> Result<Newspaper> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_newspaper_sqlite(self.pool.sqlite()?, id, input).await,
            DatabaseDriver::Mysql => update_newspaper_mysql(self.pool.mysql()?, id, input).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_newspaper_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_newspaper_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn random(&self, limit: i64) -> Result<Vec<Newspaper>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => random_newspapers_sqlite(self.pool.sqlite()?, limit).await,
            DatabaseDriver::Mysql => random_newspapers_mysql(self.pool.mysql()?, limit).await,
        }
    }

    async fn list_by_topic(&self, topic_id: i64) -> Result<Vec<Newspaper>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_newspapers_by_topic_sqlite(self.pool.sqlite()?, topic_id).await
            }
            DatabaseDriver::Mysql => {
                list_newspapers_by_topic_mysql(self.pool.mysql()?, topic_id).await
            }
        }
    }

    async fn list_by_publisher(&self, redactor_id: i64) -> Result<Vec<Newspaper>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_newspapers_by_publisher_sqlite(self.pool.sqlite()?, redactor_id).await
            }
            DatabaseDriver::Mysql => {
                list_newspapers_by_publisher_mysql(self.pool.mysql()?, redactor_id).await
            }
        }
    }

    async fn topics_for(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Topic)>> {
        if newspaper_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => topics_for_sqlite(self.pool.sqlite()?, newspaper_ids).await,
            DatabaseDriver::Mysql => topics_for_mysql(self.pool.mysql()?, newspaper_ids).await,
        }
    }

    async fn publishers_for(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Redactor)>> {
        if newspaper_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                publishers_for_sqlite(self.pool.sqlite()?, newspaper_ids).await
            }
            DatabaseDriver::Mysql => publishers_for_mysql(self.pool.mysql()?, newspaper_ids).await,
        }
    }
}

/// Links are stored once each even if the form repeats an id
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_newspaper_sqlite(pool: &SqlitePool, input: &NewspaperInput) -> Result<Newspaper> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        "INSERT INTO newspapers (title, content, published_date) VALUES (?, ?, ?)",
    )
    .bind(&input.title)
    .bind(&input.content)
    .bind(input.published_date)
    .execute(&mut *tx)
    .await
    .context("Failed to create newspaper")?;

    let id = result.last_insert_rowid();
    insert_links_sqlite(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper")?;

    Ok(Newspaper {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        published_date: input.published_date,
    })
}

async fn insert_links_sqlite(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    newspaper_id: i64,
    input: &NewspaperInput,
) -> Result<()> {
    for topic_id in dedup_ids(&input.topic_ids) {
        sqlx::query("INSERT INTO newspaper_topics (newspaper_id, topic_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(topic_id)
            .execute(&mut **tx)
            .await
            .context("Failed to link topic to newspaper")?;
    }
    for redactor_id in dedup_ids(&input.publisher_ids) {
        sqlx::query("INSERT INTO newspaper_publishers (newspaper_id, redactor_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(redactor_id)
            .execute(&mut **tx)
            .await
            .context("Failed to link publisher to newspaper")?;
    }
    Ok(())
}

async fn get_newspaper_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Newspaper>> {
    let row = sqlx::query("SELECT id, title, content, published_date FROM newspapers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get newspaper by ID")?;

    row.map(|row| row_to_newspaper_sqlite(&row)).transpose()
}

async fn list_newspapers_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, published_date
        FROM newspapers
        ORDER BY published_date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers")?;

    rows.iter().map(row_to_newspaper_sqlite).collect()
}

async fn count_newspapers_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM newspapers")
        .fetch_one(pool)
        .await
        .context("Failed to count newspapers")?;

    Ok(row.get("count"))
}

async fn update_newspaper_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &NewspaperInput,
) -> Result<Newspaper> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        "UPDATE newspapers SET title = ?, content = ?, published_date = ? WHERE id = ?",
    )
    .bind(&input.title)
    .bind(&input.content)
    .bind(input.published_date)
    .bind(id)
    .execute(&mut *tx)
    .await
    .context("Failed to update newspaper")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Newspaper not found");
    }

    sqlx::query("DELETE FROM newspaper_topics WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper topics")?;
    sqlx::query("DELETE FROM newspaper_publishers WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper publishers")?;
    insert_links_sqlite(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper update")?;

    Ok(Newspaper {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        published_date: input.published_date,
    })
}

async fn delete_newspaper_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // Junction rows cascade
    let result = sqlx::query("DELETE FROM newspapers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete newspaper")?;

    Ok(result.rows_affected() > 0)
}

async fn random_newspapers_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        "SELECT id, title, content, published_date FROM newspapers ORDER BY RANDOM() LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to sample newspapers")?;

    rows.iter().map(row_to_newspaper_sqlite).collect()
}

async fn list_newspapers_by_topic_sqlite(pool: &SqlitePool, topic_id: i64) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.title, n.content, n.published_date
        FROM newspapers n
        INNER JOIN newspaper_topics nt ON n.id = nt.newspaper_id
        WHERE nt.topic_id = ?
        ORDER BY n.published_date DESC, n.id DESC
        "#,
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers by topic")?;

    rows.iter().map(row_to_newspaper_sqlite).collect()
}

async fn list_newspapers_by_publisher_sqlite(
    pool: &SqlitePool,
    redactor_id: i64,
) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.title, n.content, n.published_date
        FROM newspapers n
        INNER JOIN newspaper_publishers np ON n.id = np.newspaper_id
        WHERE np.redactor_id = ?
        ORDER BY n.published_date DESC, n.id DESC
        "#,
    )
    .bind(redactor_id)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers by publisher")?;

    rows.iter().map(row_to_newspaper_sqlite).collect()
}

async fn topics_for_sqlite(pool: &SqlitePool, newspaper_ids: &[i64]) -> Result<Vec<(i64, Topic)>> {
    let sql = format!(
        r#"
        SELECT nt.newspaper_id, t.id, t.name
        FROM newspaper_topics nt
        INNER JOIN topics t ON t.id = nt.topic_id
        WHERE nt.newspaper_id IN ({})
        ORDER BY t.name
        "#,
        placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load newspaper topics")?;

    rows.iter()
        .map(|row| -> Result<(i64, Topic)> {
            Ok((row.get("newspaper_id"), row_to_topic_sqlite(row)?))
        })
        .collect()
}

async fn publishers_for_sqlite(
    pool: &SqlitePool,
    newspaper_ids: &[i64],
) -> Result<Vec<(i64, Redactor)>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM newspaper_publishers np
        INNER JOIN redactors r ON r.id = np.redactor_id
        WHERE np.newspaper_id IN ({})
        ORDER BY r.username
        "#,
        PUBLISHER_COLUMNS,
        placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load newspaper publishers")?;

    rows.iter()
        .map(|row| -> Result<(i64, Redactor)> {
            Ok((row.get("newspaper_id"), row_to_redactor_sqlite(row)?))
        })
        .collect()
}

fn row_to_newspaper_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Newspaper> {
    Ok(Newspaper {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published_date: row.get("published_date"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_newspaper_mysql(pool: &MySqlPool, input: &NewspaperInput) -> Result<Newspaper> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        "INSERT INTO newspapers (title, content, published_date) VALUES (?, ?, ?)",
    )
    .bind(&input.title)
    .bind(&input.content)
    .bind(input.published_date)
    .execute(&mut *tx)
    .await
    .context("Failed to create newspaper")?;

    let id = result.last_insert_id() as i64;
    insert_links_mysql(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper")?;

    Ok(Newspaper {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        published_date: input.published_date,
    })
}

async fn insert_links_mysql(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    newspaper_id: i64,
    input: &NewspaperInput,
) -> Result<()> {
    for topic_id in dedup_ids(&input.topic_ids) {
        sqlx::query("INSERT INTO newspaper_topics (newspaper_id, topic_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(topic_id)
            .execute(&mut **tx)
            .await
            .context("Failed to link topic to newspaper")?;
    }
    for redactor_id in dedup_ids(&input.publisher_ids) {
        sqlx::query("INSERT INTO newspaper_publishers (newspaper_id, redactor_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(redactor_id)
            .execute(&mut **tx)
            .await
            .context("Failed to link publisher to newspaper")?;
    }
    Ok(())
}

async fn get_newspaper_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Newspaper>> {
    let row = sqlx::query("SELECT id, title, content, published_date FROM newspapers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get newspaper by ID")?;

    row.map(|row| row_to_newspaper_mysql(&row)).transpose()
}

async fn list_newspapers_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, published_date
        FROM newspapers
        ORDER BY published_date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers")?;

    rows.iter().map(row_to_newspaper_mysql).collect()
}

async fn count_newspapers_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM newspapers")
        .fetch_one(pool)
        .await
        .context("Failed to count newspapers")?;

    Ok(row.get("count"))
}

async fn update_newspaper_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &NewspaperInput,
) -> Result<Newspaper> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // MySQL reports matched-but-unchanged rows as 0 affected, so check existence first
    let exists = sqlx::query("SELECT id FROM newspapers WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock newspaper")?;
    if exists.is_none() {
        anyhow::bail!("Newspaper not found");
    }

    sqlx::query("UPDATE newspapers SET title = ?, content = ?, published_date = ? WHERE id = ?")
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published_date)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update newspaper")?;

    sqlx::query("DELETE FROM newspaper_topics WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper topics")?;
    sqlx::query("DELETE FROM newspaper_publishers WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper publishers")?;
    insert_links_mysql(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper update")?;

    Ok(Newspaper {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        published_date: input.published_date,
    })
}

async fn delete_newspaper_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM newspapers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete newspaper")?;

    Ok(result.rows_affected() > 0)
}

async fn random_newspapers_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        "SELECT id, title, content, published_date FROM newspapers ORDER BY RAND() LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to sample newspapers")?;

    rows.iter().map(row_to_newspaper_mysql).collect()
}

async fn list_newspapers_by_topic_mysql(pool: &MySqlPool, topic_id: i64) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.title, n.content, n.published_date
        FROM newspapers n
        INNER JOIN newspaper_topics nt ON n.id = nt.newspaper_id
        WHERE nt.topic_id = ?
        ORDER BY n.published_date DESC, n.id DESC
        "#,
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers by topic")?;

    rows.iter().map(row_to_newspaper_mysql).collect()
}

async fn list_newspapers_by_publisher_mysql(
    pool: &MySqlPool,
    redactor_id: i64,
) -> Result<Vec<Newspaper>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.title, n.content, n.published_date
        FROM newspapers n
        INNER JOIN newspaper_publishers np ON n.id = np.newspaper_id
        WHERE np.redactor_id = ?
        ORDER BY n.published_date DESC, n.id DESC
        "#,
    )
    .bind(redactor_id)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers by publisher")?;

    rows.iter().map(row_to_newspaper_mysql).collect()
}

async fn topics_for_mysql(pool: &MySqlPool, newspaper_ids: &[i64]) -> Result<Vec<(i64, Topic)>> {
    let sql = format!(
        r#"
        SELECT nt.newspaper_id, t.id, t.name
        FROM newspaper_topics nt
        INNER JOIN topics t ON t.id = nt.topic_id
        WHERE nt.newspaper_id IN ({})
        ORDER BY t.name
        "#,
        placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load newspaper topics")?;

    rows.iter()
        .map(|row| -> Result<(i64, Topic)> {
            Ok((row.get("newspaper_id"), row_to_topic_mysql(row)?))
        })
        .collect()
}

async fn publishers_for_mysql(
    pool: &MySqlPool,
    newspaper_ids: &[i64],
) -> Result<Vec<(i64, Redactor)>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM newspaper_publishers np
        INNER JOIN redactors r ON r.id = np.redactor_id
        WHERE np.newspaper_id IN ({})
        ORDER BY r.username
        "#,
        PUBLISHER_COLUMNS,
        placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load newspaper publishers")?;

    rows.iter()
        .map(|row| -> Result<(i64, Redactor)> {
            Ok((row.get("newspaper_id"), row_to_redactor_mysql(row)?))
        })
        .collect()
}

fn row_to_newspaper_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Newspaper> {
    Ok(Newspaper {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published_date: row.get("published_date"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        RedactorRepository, SqlxRedactorRepository, SqlxTopicRepository, TopicRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateRedactorInput;
    use chrono::NaiveDate;

    struct Fixture {
        repo: SqlxNewspaperRepository,
        topics: SqlxTopicRepository,
        redactors: SqlxRedactorRepository,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Fixture {
            repo: SqlxNewspaperRepository::new(pool.clone()),
            topics: SqlxTopicRepository::new(pool.clone()),
            redactors: SqlxRedactorRepository::new(pool),
        }
    }

    async fn topic(f: &Fixture, name: &str) -> Topic {
        f.topics.create(&Topic::new(name.to_string())).await.unwrap()
    }

    async fn redactor(f: &Fixture, username: &str) -> Redactor {
        f.redactors
            .create(&CreateRedactorInput {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: "hash".to_string(),
                years_of_experience: 0,
            })
            .await
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn input(title: &str, day: u32, topic_ids: Vec<i64>, publisher_ids: Vec<i64>) -> NewspaperInput {
        NewspaperInput {
            title: title.to_string(),
            content: format!("{} body", title),
            published_date: date(day),
            topic_ids,
            publisher_ids,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_newspaper() {
        let f = setup().await;
        let t = topic(&f, "Politics").await;
        let r = redactor(&f, "alice").await;

        let created = f
            .repo
            .create(&input("Election", 1, vec![t.id], vec![r.id]))
            .await
            .unwrap();

        let fetched = f.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.published_date, date(1));
    }

    #[tokio::test]
    async fn test_relations_visible_from_both_sides() {
        let f = setup().await;
        let t = topic(&f, "Politics").await;
        let r = redactor(&f, "alice").await;

        let created = f
            .repo
            .create(&input("Election", 1, vec![t.id], vec![r.id]))
            .await
            .unwrap();

        let by_topic = f.repo.list_by_topic(t.id).await.unwrap();
        assert_eq!(by_topic, vec![created.clone()]);

        let by_publisher = f.repo.list_by_publisher(r.id).await.unwrap();
        assert_eq!(by_publisher, vec![created]);
    }

    #[tokio::test]
    async fn test_unknown_topic_rolls_back() {
        let f = setup().await;
        let r = redactor(&f, "alice").await;

        let result = f.repo.create(&input("Orphan", 1, vec![999], vec![r.id])).await;

        assert!(result.is_err());
        assert_eq!(f.repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let f = setup().await;
        let t = topic(&f, "General").await;
        let r = redactor(&f, "alice").await;

        f.repo.create(&input("Old", 1, vec![t.id], vec![r.id])).await.unwrap();
        f.repo.create(&input("New", 20, vec![t.id], vec![r.id])).await.unwrap();
        f.repo.create(&input("Mid", 10, vec![t.id], vec![r.id])).await.unwrap();

        let page = f.repo.list(0, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Mid"]);

        let rest = f.repo.list(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "Old");
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let f = setup().await;
        let politics = topic(&f, "Politics").await;
        let sport = topic(&f, "Sport").await;
        let alice = redactor(&f, "alice").await;
        let bob = redactor(&f, "bob").await;

        let created = f
            .repo
            .create(&input("Draft", 1, vec![politics.id], vec![alice.id]))
            .await
            .unwrap();

        let updated = f
            .repo
            .update(
                created.id,
                &input("Final", 2, vec![sport.id, sport.id], vec![alice.id, bob.id]),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Final");

        let topics = f.repo.topics_for(&[created.id]).await.unwrap();
        assert_eq!(topics, vec![(created.id, sport)]);

        let publishers = f.repo.publishers_for(&[created.id]).await.unwrap();
        let names: Vec<_> = publishers.iter().map(|(_, r)| r.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(f.repo.list_by_topic(politics.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_newspaper_fails() {
        let f = setup().await;
        let result = f.repo.update(42, &input("Ghost", 1, vec![], vec![])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prefetch_groups_by_newspaper() {
        let f = setup().await;
        let a = topic(&f, "A").await;
        let b = topic(&f, "B").await;
        let r = redactor(&f, "alice").await;

        let first = f.repo.create(&input("One", 1, vec![a.id, b.id], vec![r.id])).await.unwrap();
        let second = f.repo.create(&input("Two", 2, vec![b.id], vec![r.id])).await.unwrap();

        let pairs = f.repo.topics_for(&[first.id, second.id]).await.unwrap();
        let first_count = pairs.iter().filter(|(id, _)| *id == first.id).count();
        let second_count = pairs.iter().filter(|(id, _)| *id == second.id).count();
        assert_eq!(first_count, 2);
        assert_eq!(second_count, 1);

        let publishers = f.repo.publishers_for(&[first.id, second.id]).await.unwrap();
        assert_eq!(publishers.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_keeps_topics_and_redactors() {
        let f = setup().await;
        let t = topic(&f, "Politics").await;
        let r = redactor(&f, "alice").await;
        let created = f
            .repo
            .create(&input("Election", 1, vec![t.id], vec![r.id]))
            .await
            .unwrap();

        assert!(f.repo.delete(created.id).await.unwrap());
        assert!(f.repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(f.repo.topics_for(&[created.id]).await.unwrap().is_empty());
        assert_eq!(f.topics.count().await.unwrap(), 1);
        assert_eq!(f.redactors.count().await.unwrap(), 1);
        assert!(!f.repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_random_never_exceeds_limit_or_total() {
        let f = setup().await;
        assert!(f.repo.random(3).await.unwrap().is_empty());

        let t = topic(&f, "General").await;
        let r = redactor(&f, "alice").await;
        for day in 1..=2 {
            f.repo
                .create(&input(&format!("Issue {}", day), day, vec![t.id], vec![r.id]))
                .await
                .unwrap();
        }
        assert_eq!(f.repo.random(3).await.unwrap().len(), 2);

        for day in 3..=6 {
            f.repo
                .create(&input(&format!("Issue {}", day), day, vec![t.id], vec![r.id]))
                .await
                .unwrap();
        }
        let sample = f.repo.random(3).await.unwrap();
        assert_eq!(sample.len(), 3);

        let mut ids: Vec<_> = sample.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }
}
