//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod newspaper;
pub mod redactor;
pub mod session;
pub mod topic;

pub use newspaper::{NewspaperRepository, SqlxNewspaperRepository};
pub use redactor::{RedactorRepository, SqlxRedactorRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use topic::{SqlxTopicRepository, TopicRepository};

/// Comma-separated `?` placeholders for an `IN (...)` clause
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
