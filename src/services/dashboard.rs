//! Dashboard service
//!
//! Entity counts and the random newspaper sample shown on the home page.

use crate::db::repositories::{NewspaperRepository, RedactorRepository, TopicRepository};
use crate::models::Newspaper;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Number of newspapers sampled for the home page
pub const DASHBOARD_SAMPLE_SIZE: i64 = 3;

/// Error types for dashboard operations
#[derive(Debug, thiserror::Error)]
pub enum DashboardServiceError {
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub num_topics: i64,
    pub num_redactors: i64,
    pub num_newspapers: i64,
}

/// Everything the home page shows apart from the visit counter
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub stats: Stats,
    pub random_newspapers: Vec<Newspaper>,
}

pub struct DashboardService {
    topic_repo: Arc<dyn TopicRepository>,
    redactor_repo: Arc<dyn RedactorRepository>,
    newspaper_repo: Arc<dyn NewspaperRepository>,
}

impl DashboardService {
    pub fn new(
        topic_repo: Arc<dyn TopicRepository>,
        redactor_repo: Arc<dyn RedactorRepository>,
        newspaper_repo: Arc<dyn NewspaperRepository>,
    ) -> Self {
        Self {
            topic_repo,
            redactor_repo,
            newspaper_repo,
        }
    }

    pub async fn stats(&self) -> Result<Stats, DashboardServiceError> {
        let (num_topics, num_redactors, num_newspapers) = tokio::try_join!(
            self.topic_repo.count(),
            self.redactor_repo.count(),
            self.newspaper_repo.count(),
        )
        .context("Failed to count entities")?;

        Ok(Stats {
            num_topics,
            num_redactors,
            num_newspapers,
        })
    }

    pub async fn overview(&self) -> Result<Dashboard, DashboardServiceError> {
        let stats = self.stats().await?;
        let random_newspapers = self
            .newspaper_repo
            .random(DASHBOARD_SAMPLE_SIZE)
            .await
            .context("Failed to sample newspapers")?;

        Ok(Dashboard {
            stats,
            random_newspapers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxNewspaperRepository, SqlxRedactorRepository, SqlxTopicRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateRedactorInput, NewspaperInput, Topic};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_overview_counts_and_sample() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let topics = SqlxTopicRepository::boxed(pool.clone());
        let redactors = SqlxRedactorRepository::boxed(pool.clone());
        let newspapers = SqlxNewspaperRepository::boxed(pool);
        let service = DashboardService::new(topics.clone(), redactors.clone(), newspapers.clone());

        let empty = service.overview().await.unwrap();
        assert_eq!(
            empty.stats,
            Stats {
                num_topics: 0,
                num_redactors: 0,
                num_newspapers: 0
            }
        );
        assert!(empty.random_newspapers.is_empty());

        let topic = topics.create(&Topic::new("World".to_string())).await.unwrap();
        let redactor = redactors
            .create(&CreateRedactorInput {
                username: "ada".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: "hash".to_string(),
                years_of_experience: 0,
            })
            .await
            .unwrap();
        for day in 1..=5 {
            newspapers
                .create(&NewspaperInput {
                    title: format!("Issue {day}"),
                    content: "Body".to_string(),
                    published_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                    topic_ids: vec![topic.id],
                    publisher_ids: vec![redactor.id],
                })
                .await
                .unwrap();
        }

        let full = service.overview().await.unwrap();
        assert_eq!(full.stats.num_topics, 1);
        assert_eq!(full.stats.num_redactors, 1);
        assert_eq!(full.stats.num_newspapers, 5);
        assert_eq!(full.random_newspapers.len(), 3);
    }
}
