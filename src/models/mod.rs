//! Data models
//!
//! This module contains all data structures used throughout the newspaper agency.
//! Models represent:
//! - Database entities (Topic, Redactor, Newspaper, Session)
//! - Repository inputs
//! - Pagination containers

mod newspaper;
mod pagination;
mod redactor;
mod session;
mod topic;

pub use newspaper::{Newspaper, NewspaperInput, NewspaperWithRelations, TITLE_MAX_LEN};
pub use pagination::{ListParams, PagedResult, MAX_PER_PAGE};
pub use redactor::{CreateRedactorInput, Redactor, UpdateRedactorInput, USERNAME_MAX_LEN};
pub use session::Session;
pub use topic::{Topic, TopicInput, TOPIC_NAME_MAX_LEN};
