//! Newspaper service
//!
//! Implements business logic for newspapers:
//! - Validation of titles, content and linked topic / publisher ids
//! - Paginated listing with topics and publishers prefetched per page
//! - Relation queries by topic and by publisher
//! - Random sampling for the dashboard

use crate::db::repositories::{NewspaperRepository, RedactorRepository, TopicRepository};
use crate::models::{
    ListParams, Newspaper, NewspaperInput, NewspaperWithRelations, PagedResult, TITLE_MAX_LEN,
};
use crate::services::validation::{self, FieldErrors};
use anyhow::Context;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Error types for newspaper service operations
#[derive(Debug, thiserror::Error)]
pub enum NewspaperServiceError {
    #[error("Newspaper not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct NewspaperService {
    repo: Arc<dyn NewspaperRepository>,
    topic_repo: Arc<dyn TopicRepository>,
    redactor_repo: Arc<dyn RedactorRepository>,
}

impl NewspaperService {
    pub fn new(
        repo: Arc<dyn NewspaperRepository>,
        topic_repo: Arc<dyn TopicRepository>,
        redactor_repo: Arc<dyn RedactorRepository>,
    ) -> Self {
        Self {
            repo,
            topic_repo,
            redactor_repo,
        }
    }

    /// One page of newspapers, newest first, with relations attached
    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<NewspaperWithRelations>, NewspaperServiceError> {
        let total = self
            .repo
            .count()
            .await
            .context("Failed to count newspapers")?;
        let newspapers = self
            .repo
            .list(params.offset(), params.limit())
            .await
            .context("Failed to list newspapers")?;

        let items = self.attach_relations(newspapers).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<NewspaperWithRelations, NewspaperServiceError> {
        let newspaper = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get newspaper")?
            .ok_or(NewspaperServiceError::NotFound(id))?;

        let mut items = self.attach_relations(vec![newspaper]).await?;
        items.pop().ok_or(NewspaperServiceError::NotFound(id))
    }

    pub async fn count(&self) -> Result<i64, NewspaperServiceError> {
        Ok(self
            .repo
            .count()
            .await
            .context("Failed to count newspapers")?)
    }

    /// Newspapers tagged with a topic, newest first
    pub async fn by_topic(
        &self,
        topic_id: i64,
    ) -> Result<Vec<NewspaperWithRelations>, NewspaperServiceError> {
        let newspapers = self
            .repo
            .list_by_topic(topic_id)
            .await
            .context("Failed to list newspapers by topic")?;
        self.attach_relations(newspapers).await
    }

    /// Newspapers a redactor publishes, newest first
    pub async fn by_publisher(
        &self,
        redactor_id: i64,
    ) -> Result<Vec<NewspaperWithRelations>, NewspaperServiceError> {
        let newspapers = self
            .repo
            .list_by_publisher(redactor_id)
            .await
            .context("Failed to list newspapers by publisher")?;
        self.attach_relations(newspapers).await
    }

    /// Up to `limit` newspapers picked at random by the database
    pub async fn random(&self, limit: i64) -> Result<Vec<Newspaper>, NewspaperServiceError> {
        Ok(self
            .repo
            .random(limit)
            .await
            .context("Failed to sample newspapers")?)
    }

    /// Create a newspaper and its topic / publisher links in one transaction
    ///
    /// # Errors
    /// - `ValidationError` for blank fields, an over-long title, an empty
    ///   topic or publisher set, or ids that do not exist
    pub async fn create(&self, input: NewspaperInput) -> Result<Newspaper, NewspaperServiceError> {
        let input = self.validate(input).await?;

        let newspaper = self
            .repo
            .create(&input)
            .await
            .context("Failed to create newspaper")?;

        tracing::info!(newspaper_id = newspaper.id, title = %newspaper.title, "Newspaper created");
        Ok(newspaper)
    }

    /// Update a newspaper, replacing both link sets atomically
    pub async fn update(
        &self,
        id: i64,
        input: NewspaperInput,
    ) -> Result<Newspaper, NewspaperServiceError> {
        let exists = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get newspaper")?
            .is_some();
        if !exists {
            return Err(NewspaperServiceError::NotFound(id));
        }

        let input = self.validate(input).await?;
        let newspaper = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update newspaper")?;

        tracing::info!(newspaper_id = id, "Newspaper updated");
        Ok(newspaper)
    }

    pub async fn delete(&self, id: i64) -> Result<(), NewspaperServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete newspaper")?;

        if !deleted {
            return Err(NewspaperServiceError::NotFound(id));
        }

        tracing::info!(newspaper_id = id, "Newspaper deleted");
        Ok(())
    }

    /// Fetch topics and publishers for all `newspapers` with one query each
    async fn attach_relations(
        &self,
        newspapers: Vec<Newspaper>,
    ) -> Result<Vec<NewspaperWithRelations>, NewspaperServiceError> {
        if newspapers.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = newspapers.iter().map(|n| n.id).collect();

        let mut topics: HashMap<i64, Vec<_>> = HashMap::new();
        for (newspaper_id, topic) in self
            .repo
            .topics_for(&ids)
            .await
            .context("Failed to load newspaper topics")?
        {
            topics.entry(newspaper_id).or_default().push(topic);
        }

        let mut publishers: HashMap<i64, Vec<_>> = HashMap::new();
        for (newspaper_id, redactor) in self
            .repo
            .publishers_for(&ids)
            .await
            .context("Failed to load newspaper publishers")?
        {
            publishers.entry(newspaper_id).or_default().push(redactor);
        }

        Ok(newspapers
            .into_iter()
            .map(|newspaper| NewspaperWithRelations {
                topics: topics.remove(&newspaper.id).unwrap_or_default(),
                publishers: publishers.remove(&newspaper.id).unwrap_or_default(),
                newspaper,
            })
            .collect())
    }

    /// Trim text fields and check every rule that needs the database
    async fn validate(&self, input: NewspaperInput) -> Result<NewspaperInput, NewspaperServiceError> {
        let title = input.title.trim().to_string();
        let mut errors = FieldErrors::new();

        errors.check("title", validation::check_required(&title));
        if !errors.has("title") {
            errors.check("title", validation::check_max_len(&title, TITLE_MAX_LEN));
        }
        errors.check("content", validation::check_required(&input.content));

        let topic_ids: BTreeSet<i64> = input.topic_ids.iter().copied().collect();
        if topic_ids.is_empty() {
            errors.add("topics", validation::REQUIRED);
        } else {
            let ids: Vec<i64> = topic_ids.iter().copied().collect();
            let found: BTreeSet<i64> = self
                .topic_repo
                .get_by_ids(&ids)
                .await
                .context("Failed to load topics")?
                .into_iter()
                .map(|t| t.id)
                .collect();
            if let Some(missing) = topic_ids.difference(&found).next() {
                errors.add("topics", validation::invalid_choice(missing));
            }
        }

        let publisher_ids: BTreeSet<i64> = input.publisher_ids.iter().copied().collect();
        if publisher_ids.is_empty() {
            errors.add("publishers", validation::REQUIRED);
        } else {
            let ids: Vec<i64> = publisher_ids.iter().copied().collect();
            let found: BTreeSet<i64> = self
                .redactor_repo
                .get_by_ids(&ids)
                .await
                .context("Failed to load redactors")?
                .into_iter()
                .map(|r| r.id)
                .collect();
            if let Some(missing) = publisher_ids.difference(&found).next() {
                errors.add("publishers", validation::invalid_choice(missing));
            }
        }

        errors
            .into_result(NewspaperInput {
                title,
                content: input.content,
                published_date: input.published_date,
                topic_ids: topic_ids.into_iter().collect(),
                publisher_ids: publisher_ids.into_iter().collect(),
            })
            .map_err(NewspaperServiceError::ValidationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxNewspaperRepository, SqlxRedactorRepository, SqlxTopicRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateRedactorInput, Topic};
    use chrono::NaiveDate;

    struct Fixture {
        service: NewspaperService,
        topics: Arc<dyn TopicRepository>,
        redactors: Arc<dyn RedactorRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let topics = SqlxTopicRepository::boxed(pool.clone());
        let redactors = SqlxRedactorRepository::boxed(pool.clone());
        let service = NewspaperService::new(
            SqlxNewspaperRepository::boxed(pool),
            topics.clone(),
            redactors.clone(),
        );

        Fixture {
            service,
            topics,
            redactors,
        }
    }

    impl Fixture {
        async fn topic(&self, name: &str) -> i64 {
            self.topics
                .create(&Topic::new(name.to_string()))
                .await
                .unwrap()
                .id
        }

        async fn redactor(&self, username: &str) -> i64 {
            self.redactors
                .create(&CreateRedactorInput {
                    username: username.to_string(),
                    first_name: "First".to_string(),
                    last_name: "Last".to_string(),
                    email: String::new(),
                    password_hash: "hash".to_string(),
                    years_of_experience: 1,
                })
                .await
                .unwrap()
                .id
        }
    }

    fn input(title: &str, day: u32, topic_ids: Vec<i64>, publisher_ids: Vec<i64>) -> NewspaperInput {
        NewspaperInput {
            title: title.to_string(),
            content: "Body text".to_string(),
            published_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            topic_ids,
            publisher_ids,
        }
    }

    fn field_errors(err: NewspaperServiceError) -> FieldErrors {
        match err {
            NewspaperServiceError::ValidationError(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_created_newspaper_visible_from_topic_and_publisher() {
        let fx = setup().await;
        let topic = fx.topic("Politics").await;
        let redactor = fx.redactor("ada").await;

        let created = fx
            .service
            .create(input("Election night", 1, vec![topic], vec![redactor]))
            .await
            .unwrap();

        let by_topic = fx.service.by_topic(topic).await.unwrap();
        assert_eq!(by_topic.len(), 1);
        assert_eq!(by_topic[0].id(), created.id);

        let by_publisher = fx.service.by_publisher(redactor).await.unwrap();
        assert_eq!(by_publisher.len(), 1);
        assert_eq!(by_publisher[0].publishers[0].username, "ada");
    }

    #[tokio::test]
    async fn test_unknown_publisher_is_inline_error_and_no_row() {
        let fx = setup().await;
        let topic = fx.topic("Politics").await;

        let err = fx
            .service
            .create(input("Ghost", 1, vec![topic], vec![999]))
            .await
            .unwrap_err();
        assert_eq!(
            field_errors(err).get("publishers"),
            [validation::invalid_choice(999)]
        );
        assert_eq!(fx.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_are_reported_together() {
        let fx = setup().await;

        let mut bad = input("  ", 1, vec![], vec![]);
        bad.content = String::new();
        let errors = field_errors(fx.service.create(bad).await.unwrap_err());

        for field in ["title", "content", "topics", "publishers"] {
            assert_eq!(errors.get(field), [validation::REQUIRED.to_string()], "{field}");
        }
    }

    #[tokio::test]
    async fn test_list_prefetches_relations_newest_first() {
        let fx = setup().await;
        let politics = fx.topic("Politics").await;
        let sports = fx.topic("Sports").await;
        let ada = fx.redactor("ada").await;
        let grace = fx.redactor("grace").await;

        fx.service
            .create(input("Older", 1, vec![politics], vec![ada]))
            .await
            .unwrap();
        fx.service
            .create(input("Newer", 9, vec![politics, sports], vec![ada, grace]))
            .await
            .unwrap();

        let page = fx.service.list(&ListParams::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].newspaper.title, "Newer");
        assert_eq!(page.items[0].topic_names(), ["Politics", "Sports"]);
        assert_eq!(page.items[0].publishers.len(), 2);
        assert_eq!(page.items[1].newspaper.title, "Older");
        assert_eq!(page.items[1].topics.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let fx = setup().await;
        let politics = fx.topic("Politics").await;
        let sports = fx.topic("Sports").await;
        let ada = fx.redactor("ada").await;
        let grace = fx.redactor("grace").await;

        let created = fx
            .service
            .create(input("Match", 2, vec![politics], vec![ada]))
            .await
            .unwrap();
        fx.service
            .update(created.id, input("Match report", 3, vec![sports], vec![grace]))
            .await
            .unwrap();

        let detail = fx.service.get(created.id).await.unwrap();
        assert_eq!(detail.newspaper.title, "Match report");
        assert_eq!(detail.topic_names(), ["Sports"]);
        assert_eq!(detail.publishers[0].id, grace);
        assert!(fx.service.by_topic(politics).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let fx = setup().await;
        let topic = fx.topic("Politics").await;
        let ada = fx.redactor("ada").await;

        assert!(matches!(
            fx.service.update(77, input("X", 1, vec![topic], vec![ada])).await,
            Err(NewspaperServiceError::NotFound(77))
        ));
        assert!(matches!(
            fx.service.delete(77).await,
            Err(NewspaperServiceError::NotFound(77))
        ));
        assert!(matches!(
            fx.service.get(77).await,
            Err(NewspaperServiceError::NotFound(77))
        ));
    }

    #[tokio::test]
    async fn test_random_is_bounded() {
        let fx = setup().await;
        let topic = fx.topic("Politics").await;
        let ada = fx.redactor("ada").await;

        assert!(fx.service.random(3).await.unwrap().is_empty());

        for day in 1..=2 {
            fx.service
                .create(input(&format!("Issue {day}"), day, vec![topic], vec![ada]))
                .await
                .unwrap();
        }
        assert_eq!(fx.service.random(3).await.unwrap().len(), 2);

        for day in 3..=6 {
            fx.service
                .create(input(&format!("Issue {day}"), day, vec![topic], vec![ada]))
                .await
                .unwrap();
        }
        assert_eq!(fx.service.random(3).await.unwrap().len(), 3);
    }
}
