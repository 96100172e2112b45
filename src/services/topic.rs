//! Topic service
//!
//! Business rules for topics: name validation, uniqueness and paginated
//! listing.

use crate::db::repositories::TopicRepository;
use crate::models::{ListParams, PagedResult, Topic, TopicInput, TOPIC_NAME_MAX_LEN};
use crate::services::validation::{self, FieldErrors};
use anyhow::Context;
use std::sync::Arc;

/// Error types for topic service operations
#[derive(Debug, thiserror::Error)]
pub enum TopicServiceError {
    #[error("Topic not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct TopicService {
    repo: Arc<dyn TopicRepository>,
}

impl TopicService {
    pub fn new(repo: Arc<dyn TopicRepository>) -> Self {
        Self { repo }
    }

    /// One page of topics ordered by name
    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<Topic>, TopicServiceError> {
        let total = self.repo.count().await.context("Failed to count topics")?;
        let items = self
            .repo
            .list(params.offset(), params.limit())
            .await
            .context("Failed to list topics")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Every topic, for select widgets
    pub async fn list_all(&self) -> Result<Vec<Topic>, TopicServiceError> {
        Ok(self.repo.list_all().await.context("Failed to list topics")?)
    }

    pub async fn get(&self, id: i64) -> Result<Topic, TopicServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get topic")?
            .ok_or(TopicServiceError::NotFound(id))
    }

    pub async fn count(&self) -> Result<i64, TopicServiceError> {
        Ok(self.repo.count().await.context("Failed to count topics")?)
    }

    /// Create a topic
    ///
    /// # Errors
    /// - `ValidationError` if the name is blank, too long or already taken
    pub async fn create(&self, input: TopicInput) -> Result<Topic, TopicServiceError> {
        let name = self.validate(&input, None).await?;

        let topic = self
            .repo
            .create(&Topic::new(name))
            .await
            .context("Failed to create topic")?;

        tracing::info!(topic_id = topic.id, name = %topic.name, "Topic created");
        Ok(topic)
    }

    /// Rename a topic. Keeping the current name is not a conflict.
    pub async fn update(&self, id: i64, input: TopicInput) -> Result<Topic, TopicServiceError> {
        self.get(id).await?;
        let name = self.validate(&input, Some(id)).await?;

        let topic = self
            .repo
            .update(id, &name)
            .await
            .context("Failed to update topic")?;

        tracing::info!(topic_id = id, name = %topic.name, "Topic updated");
        Ok(topic)
    }

    /// Delete a topic. Newspapers tagged with it are kept.
    pub async fn delete(&self, id: i64) -> Result<(), TopicServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete topic")?;

        if !deleted {
            return Err(TopicServiceError::NotFound(id));
        }

        tracing::info!(topic_id = id, "Topic deleted");
        Ok(())
    }

    /// Returns the trimmed name on success
    async fn validate(
        &self,
        input: &TopicInput,
        exclude_id: Option<i64>,
    ) -> Result<String, TopicServiceError> {
        let name = input.name.trim();
        let mut errors = FieldErrors::new();

        errors.check("name", validation::check_required(name));
        if errors.is_empty() {
            errors.check("name", validation::check_max_len(name, TOPIC_NAME_MAX_LEN));
        }
        if errors.is_empty() {
            let taken = self
                .repo
                .exists_by_name_excluding(name, exclude_id)
                .await
                .context("Failed to check topic name")?;
            if taken {
                errors.add("name", validation::DUPLICATE_TOPIC);
            }
        }

        errors
            .into_result(name.to_string())
            .map_err(TopicServiceError::ValidationError)
    }
}
