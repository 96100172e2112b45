//! Connection pools for the newsroom database
//!
//! Repositories hold a [`DynDatabasePool`] and match on [`DatabasePool::driver`]
//! to pick the SQLite or MySQL flavour of each query.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows; yields the affected row count
    async fn execute(&self, query: &str) -> Result<u64>;

    fn driver(&self) -> DatabaseDriver;

    /// The SQLite pool, or an error on a MySQL connection
    fn sqlite(&self) -> Result<&SqlitePool>;

    /// The MySQL pool, or an error on a SQLite connection
    fn mysql(&self) -> Result<&MySqlPool>;
}

pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Turn the configured SQLite location into an sqlx URL.
///
/// Plain file paths get `mode=rwc` so the file is created on first start.
fn sqlite_url(url: &str) -> String {
    if url == ":memory:" || url == SQLITE_MEMORY_URL {
        SQLITE_MEMORY_URL.to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    }
}

/// Directory that has to exist before a file database can be opened
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    if url == ":memory:" || url.starts_with(SQLITE_MEMORY_URL) {
        return None;
    }
    let path = url.trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    async fn connect(url: &str) -> Result<Self> {
        if let Some(dir) = sqlite_parent_dir(url) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database directory: {:?}", dir))?;
        }

        let connection_url = sqlite_url(url);
        // Each connection to an in-memory database gets its own copy, so the
        // pool keeps exactly one connection alive.
        let options = if connection_url == SQLITE_MEMORY_URL {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(20)
        };

        let pool = options
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        // Junction rows and sessions rely on ON DELETE CASCADE
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        Ok(&self.pool)
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        anyhow::bail!("Database pool is SQLite, not MySQL")
    }
}

struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    async fn connect(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        anyhow::bail!("Database pool is MySQL, not SQLite")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        Ok(&self.pool)
    }
}

/// Open the pool selected by `database.driver`
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    Ok(match config.driver {
        DatabaseDriver::Sqlite => Arc::new(SqliteDatabase::connect(&config.url).await?),
        DatabaseDriver::Mysql => Arc::new(MysqlDatabase::connect(&config.url).await?),
    })
}

/// In-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url() {
        assert_eq!(sqlite_url(":memory:"), "sqlite::memory:");
        assert_eq!(
            sqlite_url("data/newspaper_agency.db"),
            "sqlite:data/newspaper_agency.db?mode=rwc"
        );
        assert_eq!(sqlite_url("sqlite:news.db"), "sqlite:news.db?mode=rwc");
        assert_eq!(sqlite_url("sqlite:news.db?mode=ro"), "sqlite:news.db?mode=ro");
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(sqlite_parent_dir(":memory:"), None);
        assert_eq!(sqlite_parent_dir("news.db"), None);
        assert_eq!(
            sqlite_parent_dir("sqlite:data/news.db?mode=rwc"),
            Some(Path::new("data"))
        );
    }

    #[tokio::test]
    async fn test_test_pool_is_sqlite() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.sqlite().is_ok());
        assert!(pool.mysql().is_err());
    }

    #[tokio::test]
    async fn test_memory_pool_shares_one_database() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.execute("CREATE TABLE shared (id INTEGER PRIMARY KEY)")
            .await
            .expect("Failed to create table");
        assert_eq!(
            pool.execute("INSERT INTO shared (id) VALUES (1)").await.unwrap(),
            1
        );

        let sqlite = pool.sqlite().unwrap();
        let (a, b) = tokio::join!(
            sqlx::query("SELECT COUNT(*) FROM shared").fetch_one(sqlite),
            sqlx::query("SELECT COUNT(*) FROM shared").fetch_one(sqlite),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_file_database_creates_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("news.db");

        create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
        })
        .await
        .expect("Failed to create pool");

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.unwrap();
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(pool.sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }
}
