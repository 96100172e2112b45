//! Newspaper model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Redactor, Topic};

/// Maximum length of a newspaper title, in characters
pub const TITLE_MAX_LEN: usize = 255;

/// A newspaper article record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Newspaper {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Publication date (`YYYY-MM-DD`)
    pub published_date: NaiveDate,
}

/// A newspaper together with its topics and publishers.
#[derive(Debug, Clone, Serialize)]
pub struct NewspaperWithRelations {
    #[serde(flatten)]
    pub newspaper: Newspaper,
    pub topics: Vec<Topic>,
    pub publishers: Vec<Redactor>,
}

impl NewspaperWithRelations {
    pub fn id(&self) -> i64 {
        self.newspaper.id
    }

    /// Topic names joined for display
    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Input for creating or updating a newspaper.
///
/// Topic and publisher ids are expected to reference existing rows; the
/// repository replaces the full link sets on update.
#[derive(Debug, Clone)]
pub struct NewspaperInput {
    pub title: String,
    pub content: String,
    pub published_date: NaiveDate,
    pub topic_ids: Vec<i64>,
    pub publisher_ids: Vec<i64>,
}
