//! Redactor API endpoints
//!
//! - GET /api/v1/redactors - All redactors
//! - GET /api/v1/redactors/{id} - One redactor
//! - GET /api/v1/redactors/{id}/newspapers - Newspapers a redactor published

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::common::parse_id;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{newspaper_summaries, NewspaperSummary, RedactorResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_redactors))
        .route("/{id}", get(get_redactor))
        .route("/{id}/newspapers", get(get_redactor_newspapers))
}

async fn list_redactors(
    State(state): State<AppState>,
) -> Result<Json<Vec<RedactorResponse>>, ApiError> {
    let redactors = state.redactor_service.list_all().await?;
    Ok(Json(redactors.into_iter().map(Into::into).collect()))
}

async fn get_redactor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RedactorResponse>, ApiError> {
    let id = parse_id(&id, "Redactor")?;
    let redactor = state.redactor_service.get(id).await?;
    Ok(Json(redactor.into()))
}

async fn get_redactor_newspapers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NewspaperSummary>>, ApiError> {
    let id = parse_id(&id, "Redactor")?;
    let redactor = state.redactor_service.get(id).await?;
    let newspapers = state.newspaper_service.by_publisher(redactor.id).await?;
    Ok(Json(newspaper_summaries(newspapers)))
}
