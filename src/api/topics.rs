//! Topic API endpoints
//!
//! - GET /api/v1/topics - All topics, alphabetical
//! - GET /api/v1/topics/{id} - One topic
//! - GET /api/v1/topics/{id}/newspapers - Newspapers filed under a topic

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::common::parse_id;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{newspaper_summaries, NewspaperSummary, TopicResponse};

/// Build the topics router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_topics))
        .route("/{id}", get(get_topic))
        .route("/{id}/newspapers", get(get_topic_newspapers))
}

async fn list_topics(State(state): State<AppState>) -> Result<Json<Vec<TopicResponse>>, ApiError> {
    let topics = state.topic_service.list_all().await?;
    Ok(Json(topics.into_iter().map(Into::into).collect()))
}

async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TopicResponse>, ApiError> {
    let id = parse_id(&id, "Topic")?;
    let topic = state.topic_service.get(id).await?;
    Ok(Json(topic.into()))
}

async fn get_topic_newspapers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NewspaperSummary>>, ApiError> {
    let id = parse_id(&id, "Topic")?;
    // 404 for unknown topics rather than an empty list
    let topic = state.topic_service.get(id).await?;
    let newspapers = state.newspaper_service.by_topic(topic.id).await?;
    Ok(Json(newspaper_summaries(newspapers)))
}
