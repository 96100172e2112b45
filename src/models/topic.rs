//! Topic model

use serde::{Deserialize, Serialize};

/// Maximum length of a topic name, in characters
pub const TOPIC_NAME_MAX_LEN: usize = 255;

/// A named subject that newspapers can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique identifier
    pub id: i64,
    /// Topic name (unique)
    pub name: String,
}

impl Topic {
    pub fn new(name: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
        }
    }
}

/// Input for creating or renaming a topic
#[derive(Debug, Clone, Deserialize)]
pub struct TopicInput {
    pub name: String,
}
