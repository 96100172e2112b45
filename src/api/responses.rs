//! Shared API response types
//!
//! Response structures used across the JSON endpoints so every resource is
//! rendered the same way wherever it appears.

use serde::Serialize;

use crate::models::{NewspaperWithRelations, PagedResult, Redactor, Topic};

// ============================================================================
// Topic Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub id: i64,
    pub name: String,
}

impl From<Topic> for TopicResponse {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            name: topic.name,
        }
    }
}

// ============================================================================
// Redactor Response Types
// ============================================================================

/// Redactor profile. Email and password hash are never exposed.
#[derive(Debug, Serialize)]
pub struct RedactorResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub years_of_experience: i64,
}

impl From<Redactor> for RedactorResponse {
    fn from(redactor: Redactor) -> Self {
        Self {
            id: redactor.id,
            username: redactor.username,
            first_name: redactor.first_name,
            last_name: redactor.last_name,
            years_of_experience: redactor.years_of_experience,
        }
    }
}

/// Publisher info embedded in newspaper responses
#[derive(Debug, Serialize, Clone)]
pub struct PublisherInfo {
    pub id: i64,
    pub name: String,
    pub username: String,
}

impl From<&Redactor> for PublisherInfo {
    fn from(redactor: &Redactor) -> Self {
        Self {
            id: redactor.id,
            name: redactor.full_name(),
            username: redactor.username.clone(),
        }
    }
}

// ============================================================================
// Newspaper Response Types
// ============================================================================

/// Newspaper as shown in listings
#[derive(Debug, Serialize)]
pub struct NewspaperSummary {
    pub id: i64,
    pub title: String,
    /// `YYYY-MM-DD`
    pub published_date: String,
    pub topics: Vec<String>,
    pub publishers: Vec<PublisherInfo>,
}

impl From<NewspaperWithRelations> for NewspaperSummary {
    fn from(item: NewspaperWithRelations) -> Self {
        Self {
            id: item.newspaper.id,
            title: item.newspaper.title,
            published_date: item.newspaper.published_date.to_string(),
            topics: item.topics.into_iter().map(|t| t.name).collect(),
            publishers: item.publishers.iter().map(PublisherInfo::from).collect(),
        }
    }
}

/// Full newspaper including its content
#[derive(Debug, Serialize)]
pub struct NewspaperResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published_date: String,
    pub topics: Vec<TopicResponse>,
    pub publishers: Vec<PublisherInfo>,
}

impl From<NewspaperWithRelations> for NewspaperResponse {
    fn from(item: NewspaperWithRelations) -> Self {
        Self {
            id: item.newspaper.id,
            title: item.newspaper.title,
            content: item.newspaper.content,
            published_date: item.newspaper.published_date.to_string(),
            topics: item.topics.into_iter().map(TopicResponse::from).collect(),
            publishers: item.publishers.iter().map(PublisherInfo::from).collect(),
        }
    }
}

// ============================================================================
// Pagination Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PaginatedNewspapersResponse {
    pub newspapers: Vec<NewspaperSummary>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl From<PagedResult<NewspaperWithRelations>> for PaginatedNewspapersResponse {
    fn from(result: PagedResult<NewspaperWithRelations>) -> Self {
        let total_pages = result.total_pages();
        Self {
            total: result.total,
            page: result.page,
            page_size: result.per_page,
            total_pages,
            newspapers: result.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Newspapers of one topic or one publisher, unpaged
pub fn newspaper_summaries(items: Vec<NewspaperWithRelations>) -> Vec<NewspaperSummary> {
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Newspaper;
    use chrono::NaiveDate;

    fn sample() -> NewspaperWithRelations {
        let mut publisher = Redactor::new("jdoe".to_string(), "secret-hash".to_string());
        publisher.id = 7;
        publisher.first_name = "John".to_string();
        publisher.last_name = "Doe".to_string();
        publisher.email = "john@example.com".to_string();

        NewspaperWithRelations {
            newspaper: Newspaper {
                id: 3,
                title: "Morning Edition".to_string(),
                content: "Body".to_string(),
                published_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            },
            topics: vec![Topic {
                id: 1,
                name: "Politics".to_string(),
            }],
            publishers: vec![publisher],
        }
    }

    #[test]
    fn test_summary_shape() {
        let json = serde_json::to_value(NewspaperSummary::from(sample())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "title": "Morning Edition",
                "published_date": "2024-02-29",
                "topics": ["Politics"],
                "publishers": [{"id": 7, "name": "John Doe", "username": "jdoe"}]
            })
        );
    }

    #[test]
    fn test_detail_never_leaks_credentials() {
        let json = serde_json::to_string(&NewspaperResponse::from(sample())).unwrap();
        assert!(json.contains("\"content\":\"Body\""));
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("john@example.com"));
    }
}
