//! Database migrations module
//!
//! Code-based migrations for the newspaper agency schema. All migrations are
//! embedded as SQL strings for both SQLite and MySQL, so the binary carries
//! its own schema.
//!
//! # Usage
//!
//! ```ignore
//! use newspaper_agency::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All schema migrations, applied in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_redactors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS redactors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                years_of_experience INTEGER NOT NULL DEFAULT 0 CHECK (years_of_experience >= 0),
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                last_login TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS redactors (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                years_of_experience BIGINT NOT NULL DEFAULT 0 CHECK (years_of_experience >= 0),
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                last_login TIMESTAMP NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                redactor_id INTEGER,
                num_visits INTEGER NOT NULL DEFAULT 0,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_redactor_id ON sessions(redactor_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                redactor_id BIGINT NULL,
                num_visits BIGINT NOT NULL DEFAULT 0,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_redactor_id ON sessions(redactor_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_topics",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_newspapers",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newspapers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                published_date DATE NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_newspapers_published_date ON newspapers(published_date);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newspapers (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                published_date DATE NOT NULL
            );
            CREATE INDEX idx_newspapers_published_date ON newspapers(published_date);
        "#,
    },
    Migration {
        version: 5,
        name: "create_newspaper_topics",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newspaper_topics (
                newspaper_id INTEGER NOT NULL,
                topic_id INTEGER NOT NULL,
                PRIMARY KEY (newspaper_id, topic_id),
                FOREIGN KEY (newspaper_id) REFERENCES newspapers(id) ON DELETE CASCADE,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_newspaper_topics_topic_id ON newspaper_topics(topic_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newspaper_topics (
                newspaper_id BIGINT NOT NULL,
                topic_id BIGINT NOT NULL,
                PRIMARY KEY (newspaper_id, topic_id),
                FOREIGN KEY (newspaper_id) REFERENCES newspapers(id) ON DELETE CASCADE,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_newspaper_topics_topic_id ON newspaper_topics(topic_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_newspaper_publishers",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newspaper_publishers (
                newspaper_id INTEGER NOT NULL,
                redactor_id INTEGER NOT NULL,
                PRIMARY KEY (newspaper_id, redactor_id),
                FOREIGN KEY (newspaper_id) REFERENCES newspapers(id) ON DELETE CASCADE,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_newspaper_publishers_redactor_id ON newspaper_publishers(redactor_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newspaper_publishers (
                newspaper_id BIGINT NOT NULL,
                redactor_id BIGINT NOT NULL,
                PRIMARY KEY (newspaper_id, redactor_id),
                FOREIGN KEY (newspaper_id) REFERENCES newspapers(id) ON DELETE CASCADE,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_newspaper_publishers_redactor_id ON newspaper_publishers(redactor_id);
        "#,
    },
];

/// Run all pending migrations
///
/// This function:
/// 1. Creates the migrations tracking table if it doesn't exist
/// 2. Checks which migrations have already been applied
/// 3. Runs any pending migrations in order
///
/// # Arguments
///
/// * `pool` - Database connection pool
///
/// # Returns
///
/// Number of migrations applied
///
/// # Errors
///
/// Returns an error if any migration fails to apply
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    // Create migrations table
    create_migrations_table(pool).await?;

    // Get applied migrations
    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.sqlite()?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows =
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows =
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            apply_migration_sqlite(pool.sqlite()?, migration).await
        }
        DatabaseDriver::Mysql => {
            apply_migration_mysql(pool.mysql()?, migration).await
        }
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // SQLite DDL is transactional, so a failed migration leaves no partial schema
    let mut tx = pool.begin().await.context("Failed to begin migration transaction")?;

    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.context("Failed to commit migration")?;
    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    // MySQL commits DDL implicitly, statements run one by one
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    // Try to create migrations table (in case it doesn't exist)
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    // Try to create migrations table (in case it doesn't exist)
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_redactor(pool: &SqlitePool, username: &str) -> i64 {
        sqlx::query("INSERT INTO redactors (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind("hash")
            .execute(pool)
            .await
            .expect("Failed to create redactor")
            .last_insert_rowid()
    }

    async fn insert_newspaper(pool: &SqlitePool, title: &str) -> i64 {
        sqlx::query("INSERT INTO newspapers (title, content, published_date) VALUES (?, ?, ?)")
            .bind(title)
            .bind("Body")
            .bind("2024-01-15")
            .execute(pool)
            .await
            .expect("Failed to create newspaper")
            .last_insert_rowid()
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {}", table))
            .fetch_one(pool)
            .await
            .expect("Failed to count rows");
        row.get("count")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.expect("Failed to check"));

        run_migrations(&pool).await.expect("Failed to run migrations");
        assert!(is_up_to_date(&pool).await.expect("Failed to check"));
    }

    #[tokio::test]
    async fn test_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let pending = pending_count(&pool).await.expect("Failed to check");
        assert_eq!(pending, MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");
        let pending = pending_count(&pool).await.expect("Failed to check");
        assert_eq!(pending, 0);
    }

    #[tokio::test]
    async fn test_topic_name_unique() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.sqlite().unwrap();

        sqlx::query("INSERT INTO topics (name) VALUES (?)")
            .bind("Politics")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create topic");

        let result = sqlx::query("INSERT INTO topics (name) VALUES (?)")
            .bind("Politics")
            .execute(sqlite_pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_redactor_years_cannot_be_negative() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.sqlite().unwrap();

        let result = sqlx::query(
            "INSERT INTO redactors (username, password_hash, years_of_experience) VALUES (?, ?, ?)",
        )
        .bind("alice")
        .bind("hash")
        .bind(-1i64)
        .execute(sqlite_pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_anonymous_session_allowed() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.sqlite().unwrap();

        let result = sqlx::query(
            "INSERT INTO sessions (id, redactor_id, expires_at) VALUES (?, NULL, datetime('now', '+1 day'))",
        )
        .bind("anon")
        .execute(sqlite_pool)
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_session_requires_existing_redactor() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.sqlite().unwrap();

        let result = sqlx::query(
            "INSERT INTO sessions (id, redactor_id, expires_at) VALUES (?, ?, datetime('now', '+1 day'))",
        )
        .bind("session123")
        .bind(999i64)
        .execute(sqlite_pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deleting_topic_keeps_newspaper() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.sqlite().unwrap();

        let topic_id = sqlx::query("INSERT INTO topics (name) VALUES ('Sport')")
            .execute(sqlite_pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let newspaper_id = insert_newspaper(sqlite_pool, "Final score").await;

        sqlx::query("INSERT INTO newspaper_topics (newspaper_id, topic_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(topic_id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(topic_id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        assert_eq!(count(sqlite_pool, "newspaper_topics").await, 0);
        assert_eq!(count(sqlite_pool, "newspapers").await, 1);
    }

    #[tokio::test]
    async fn test_deleting_redactor_cascades_links_and_sessions() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.sqlite().unwrap();

        let redactor_id = insert_redactor(sqlite_pool, "bob").await;
        let newspaper_id = insert_newspaper(sqlite_pool, "Morning edition").await;

        sqlx::query("INSERT INTO newspaper_publishers (newspaper_id, redactor_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(redactor_id)
            .execute(sqlite_pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO sessions (id, redactor_id, expires_at) VALUES ('s1', ?, datetime('now', '+1 day'))",
        )
        .bind(redactor_id)
        .execute(sqlite_pool)
        .await
        .unwrap();

        sqlx::query("DELETE FROM redactors WHERE id = ?")
            .bind(redactor_id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        assert_eq!(count(sqlite_pool, "newspaper_publishers").await, 0);
        assert_eq!(count(sqlite_pool, "sessions").await, 0);
        assert_eq!(count(sqlite_pool, "newspapers").await, 1);
    }

    #[tokio::test]
    async fn test_get_migration() {
        let migration = get_migration(1);
        assert_eq!(migration.map(|m| m.name), Some("create_redactors"));

        assert!(get_migration(999).is_none());
    }

    #[test]
    fn test_total_migrations() {
        assert_eq!(total_migrations(), 6);
    }

    #[test]
    fn test_migration_versions_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, i as i32 + 1);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);";
        let statements = split_sql_statements(sql_with_comments);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }

    #[test]
    fn test_truncate_sql_respects_char_boundaries() {
        let sql = "é".repeat(150);
        let truncated = truncate_sql(&sql);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 103);
    }
}
